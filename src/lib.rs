//! rustyged - Fast GEDCOM parsing over a mutable byte buffer
//!
//! Parses GEDCOM 5.x and 7 transmissions into an arena-allocated forest of
//! nodes holding byte spans into the caller's buffer. The buffer is consumed
//! destructively: identifier case folding, escape collapsing, and continuation
//! merging all rewrite bytes in place, so after parsing the buffer is only
//! meaningful through the returned document.
//!
//! Three dialect profiles select the grammar:
//! - [`Dialect::Legacy`]: permissive, for GEDCOM 5.x files from old tooling
//! - [`Dialect::Mid`]: delimiter-checked with case-insensitive identifiers
//! - [`Dialect::Strict`]: byte-exact GEDCOM 7
//!
//! ```
//! use rustyged::{parse, Dialect, PayloadRef};
//!
//! let mut buf = b"0 @I1@ INDI\n1 NAME Ada\n".to_vec();
//! let doc = parse(&mut buf, Dialect::Strict).unwrap();
//! let indi = doc.head().unwrap();
//! assert_eq!(doc.tag(indi), Some("INDI"));
//! let name = doc.node(indi).unwrap().first_child.unwrap();
//! assert_eq!(doc.payload(name), Some(PayloadRef::Text(b"Ada")));
//! ```

mod core;
mod dom;
mod error;

pub use crate::core::profile::Dialect;
pub use crate::dom::document::{
    DescendantsIter, DocumentOrderIter, GedDocument, PayloadRef, SiblingIter,
};
pub use crate::dom::node::{GedNode, NodeId, Payload};
pub use crate::dom::span::Span;
pub use crate::error::{ErrorKind, ParseError};

/// Parse a GEDCOM transmission, failing on the first violation.
///
/// Error line numbers are exact and 1-based for tokenizer and assembly
/// failures; for duplicate-identifier and dangling-pointer failures the line
/// is the document-order ordinal of the offending node.
pub fn parse(buf: &mut [u8], dialect: Dialect) -> Result<GedDocument<'_>, ParseError> {
    GedDocument::parse(buf, dialect)
}

/// Parse a GEDCOM transmission, salvaging whatever is well-formed.
///
/// Never fails: malformed lines are dropped, later duplicate definitions are
/// ignored, dangling pointers resolve to no target, and malformed
/// continuations stay in the tree unfolded.
pub fn parse_recover(buf: &mut [u8], dialect: Dialect) -> GedDocument<'_> {
    GedDocument::parse_recover(buf, dialect)
}
