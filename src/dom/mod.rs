//! DOM Module - Arena-based GEDCOM Forest
//!
//! Implements an efficient forest representation using:
//! - Arena allocation for nodes
//! - NodeId (u32) indices for cache-friendly traversal
//! - Byte spans into the parse buffer instead of owned strings
//! - Post-assembly passes for pointer resolution and continuation folding

pub mod continuation;
pub mod document;
pub mod node;
pub mod resolve;
pub mod span;

pub use document::{GedDocument, PayloadRef};
pub use node::{GedNode, NodeId, Payload};
pub use span::Span;
