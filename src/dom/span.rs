//! Span - offset and length into the shared input buffer
//!
//! Zero-copy reference to a portion of the caller's buffer. Every string
//! field of a node (tag, identifier, payload text) is a span; no character
//! data is copied out of the buffer.

/// A span referencing a portion of the input buffer.
///
/// An empty span doubles as "no value" (identifiers cannot be empty in any
/// dialect, so the sentinel is unambiguous).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Byte offset into the input buffer
    pub start: u32,
    /// Length in bytes
    pub len: u32,
}

impl Span {
    /// Create a new span
    #[inline]
    pub const fn new(start: u32, len: u32) -> Self {
        Self { start, len }
    }

    /// Create an empty span (used for "no value")
    #[inline]
    pub const fn empty() -> Self {
        Self { start: 0, len: 0 }
    }

    /// Check if this span is empty
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the end offset (exclusive)
    #[inline]
    pub const fn end(&self) -> u32 {
        self.start.saturating_add(self.len)
    }

    /// Extract the byte slice from the input buffer
    #[inline]
    pub fn slice<'a>(&self, input: &'a [u8]) -> &'a [u8] {
        let start = self.start as usize;
        let end = start.saturating_add(self.len as usize);
        if end <= input.len() {
            &input[start..end]
        } else {
            &[]
        }
    }

    /// Extract as UTF-8 string from the input buffer
    #[inline]
    pub fn as_str<'a>(&self, input: &'a [u8]) -> Option<&'a str> {
        std::str::from_utf8(self.slice(input)).ok()
    }
}
