//! SIMD-accelerated byte scanning using memchr
//!
//! Shared helpers for the dialect grammar rules:
//! - line-break search (the hot path: one search per payload and eol)
//! - multi-byte trivia sequences (NBSP, BOM)

use memchr::{memchr2, memchr3};

/// UTF-8 no-break space (U+00A0)
pub const NBSP: [u8; 2] = [0xc2, 0xa0];
/// UTF-8 byte order mark (U+FEFF)
pub const BOM: [u8; 3] = [0xef, 0xbb, 0xbf];

/// Position of the first CR or LF at or after `pos`, or `buf.len()`
#[inline]
pub fn find_line_break(buf: &[u8], pos: usize) -> usize {
    match memchr2(b'\n', b'\r', &buf[pos..]) {
        Some(i) => pos + i,
        None => buf.len(),
    }
}

/// Position of the first `@`, CR, or LF at or after `pos`, or `buf.len()`
///
/// Used by the forgiving identifier rule, which runs to the closing `@`.
#[inline]
pub fn find_at_or_break(buf: &[u8], pos: usize) -> usize {
    match memchr3(b'@', b'\n', b'\r', &buf[pos..]) {
        Some(i) => pos + i,
        None => buf.len(),
    }
}

/// Check for a byte sequence at `pos` without slicing out of bounds
#[inline]
pub fn starts_with_at(buf: &[u8], pos: usize, needle: &[u8]) -> bool {
    buf.get(pos..).is_some_and(|rest| rest.starts_with(needle))
}

/// Length of the line break at `pos`: CRLF and LFCR count as one break
#[inline]
pub fn line_break_len(buf: &[u8], pos: usize) -> usize {
    match buf.get(pos) {
        Some(b'\n') => {
            if buf.get(pos + 1) == Some(&b'\r') {
                2
            } else {
                1
            }
        }
        Some(b'\r') => {
            if buf.get(pos + 1) == Some(&b'\n') {
                2
            } else {
                1
            }
        }
        _ => 0,
    }
}
