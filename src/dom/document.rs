//! GEDCOM Document - arena-based forest representation
//!
//! Efficient storage with:
//! - Arena allocation for nodes (one `Vec`, freed as one aggregate)
//! - NodeId indices for traversal
//! - Zero-copy tags, identifiers, and payloads via spans into the caller's
//!   buffer; the document holds the borrow so spans cannot outlive it
//!
//! Also home of the tree assembler: the level-indexed open-ancestor stack
//! that links tokenized lines into the first-child/next-sibling forest.

use super::continuation;
use super::node::{next_in_document_order, GedNode, NodeId, Payload};
use super::resolve;
use super::span::Span;
use crate::core::profile::Dialect;
use crate::core::tokenizer::{LineTokenizer, RawLine, RawPayload};
use crate::error::{ErrorKind, ParseError};

/// Logging macro - no-op when the logging feature is disabled
#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

/// Logging macro - forwards to the log crate when the feature is enabled
#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

/// A parsed GEDCOM forest over a caller-owned buffer
#[derive(Debug)]
pub struct GedDocument<'a> {
    /// The input buffer, as mutated by parsing (case folds, merged payloads)
    input: &'a [u8],
    /// Arena of nodes; folded continuation slots stay allocated but unlinked
    nodes: Vec<GedNode>,
    /// First record of the forest
    head: Option<NodeId>,
}

/// A node's payload as seen through the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadRef<'a> {
    /// Text payload; embedded `\n` marks merged continuation lines
    Text(&'a [u8]),
    /// Pointer payload: the target record, or `None` for `@VOID@`
    Pointer(Option<NodeId>),
}

/// Assembler state: the open-ancestor stack encoded as (depth, parent,
/// pending sibling), exactly one step per accepted line.
struct Assembler {
    nodes: Vec<GedNode>,
    head: Option<NodeId>,
    depth: i64,
    parent: Option<NodeId>,
    sibling: Option<NodeId>,
}

impl Assembler {
    fn new() -> Self {
        Assembler {
            nodes: Vec::with_capacity(256),
            head: None,
            depth: -1,
            parent: None,
            sibling: None,
        }
    }

    /// Link one tokenized line into the forest. `id_is_void` is whether the
    /// identifier is the literal `VOID` (checked here, after the depth rule,
    /// so nested `@VOID@` definitions report the depth violation first).
    fn accept(
        &mut self,
        raw: &RawLine,
        id_is_void: bool,
        dialect: Dialect,
    ) -> Result<(), ParseError> {
        let level = i64::from(raw.level);
        if level > self.depth + 1 {
            return Err(ParseError::new(ErrorKind::LevelSkip, raw.line));
        }
        if raw.xref.is_some() && dialect.records_only_ids() && raw.level > 0 {
            return Err(ParseError::new(ErrorKind::XrefOnRecordOnly, raw.line));
        }
        if id_is_void && dialect.rejects_void_definition() {
            return Err(ParseError::new(ErrorKind::VoidReserved, raw.line));
        }

        while level < self.depth + 1 {
            self.sibling = self.parent;
            self.parent = self.parent.and_then(|p| self.nodes[p as usize].parent);
            self.depth -= 1;
        }
        self.depth = level;

        let payload = match raw.payload {
            RawPayload::None => Payload::None,
            RawPayload::Text(s) => Payload::Text(s),
            RawPayload::Pointer(s) => Payload::Pointer(s),
        };
        let id = self.nodes.len() as NodeId;
        self.nodes.push(GedNode::new(
            raw.tag,
            raw.xref.unwrap_or_else(Span::empty),
            payload,
            self.parent,
        ));
        if let Some(s) = self.sibling {
            self.nodes[s as usize].next_sibling = Some(id);
        } else if let Some(p) = self.parent {
            self.nodes[p as usize].first_child = Some(id);
        }
        self.parent = Some(id);
        self.sibling = None;
        if self.head.is_none() {
            self.head = Some(id);
        }
        Ok(())
    }
}

impl<'a> GedDocument<'a> {
    /// Parse a GEDCOM document from a caller-owned mutable buffer.
    ///
    /// The buffer is mutated destructively and must stay alive (and
    /// unmodified by the caller) for the lifetime of the returned document;
    /// the borrow enforces both. On error nothing built survives.
    pub fn parse(buf: &'a mut [u8], dialect: Dialect) -> Result<Self, ParseError> {
        let mut tok = LineTokenizer::new(buf, dialect);
        let mut asm = Assembler::new();
        while let Some(raw) = tok.next_line()? {
            let id_is_void = raw.xref.is_some_and(|s| tok.slice(s) == b"VOID");
            asm.accept(&raw, id_is_void, dialect)?;
        }
        let buf = tok.into_buf();
        let Assembler {
            mut nodes, head, ..
        } = asm;

        resolve::resolve(&mut nodes, buf, head, dialect)?;
        continuation::merge(&mut nodes, buf, head, dialect)?;

        log_debug!("parsed {} nodes ({:?})", nodes.len(), dialect);
        Ok(GedDocument {
            input: buf,
            nodes,
            head,
        })
    }

    /// Parse, discarding malformed lines instead of failing.
    ///
    /// Grammar violations drop the offending line; duplicate identifiers
    /// keep their first definition; dangling pointers resolve to no target;
    /// malformed continuation structures are left unfolded. The output may
    /// therefore contain out-of-grammar constructs the strict entry point
    /// would reject, but the node-graph contract is the same.
    pub fn parse_recover(buf: &'a mut [u8], dialect: Dialect) -> Self {
        let mut tok = LineTokenizer::new(buf, dialect);
        let mut asm = Assembler::new();
        let mut dropped = 0usize;
        loop {
            match tok.next_line() {
                Ok(None) => break,
                Ok(Some(raw)) => {
                    let id_is_void = raw.xref.is_some_and(|s| tok.slice(s) == b"VOID");
                    if asm.accept(&raw, id_is_void, dialect).is_err() {
                        dropped += 1;
                    }
                }
                Err(_) => {
                    dropped += 1;
                    tok.skip_to_next_line();
                }
            }
        }
        let buf = tok.into_buf();
        let Assembler {
            mut nodes, head, ..
        } = asm;

        resolve::resolve_lenient(&mut nodes, buf, head, dialect);
        continuation::merge_lenient(&mut nodes, buf, head, dialect);

        log_debug!(
            "recovered {} nodes, dropped {} lines ({:?})",
            nodes.len(),
            dropped,
            dialect
        );
        let _ = dropped;
        GedDocument {
            input: buf,
            nodes,
            head,
        }
    }

    /// First record, or None for an empty document
    #[inline]
    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    /// Get a node by ID
    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&GedNode> {
        self.nodes.get(id as usize)
    }

    /// Tag bytes of a node
    pub fn tag_bytes(&self, id: NodeId) -> Option<&[u8]> {
        self.node(id).map(|n| n.tag.slice(self.input))
    }

    /// Tag of a node as a string
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.node(id).and_then(|n| n.tag.as_str(self.input))
    }

    /// Cross-reference identifier of a node, if it defines one
    pub fn xref_id(&self, id: NodeId) -> Option<&str> {
        let node = self.node(id)?;
        if node.has_id() {
            node.id.as_str(self.input)
        } else {
            None
        }
    }

    /// Payload of a node, or None when the line had no value
    pub fn payload(&self, id: NodeId) -> Option<PayloadRef<'_>> {
        match self.node(id)?.payload {
            Payload::None => None,
            Payload::Text(s) => Some(PayloadRef::Text(s.slice(self.input))),
            Payload::Resolved(target) => Some(PayloadRef::Pointer(target)),
            // unresolved pointers cannot escape a completed parse
            Payload::Pointer(_) => Some(PayloadRef::Pointer(None)),
        }
    }

    /// Text payload of a node as a string, if it has one
    pub fn payload_text(&self, id: NodeId) -> Option<&str> {
        match self.node(id)?.payload {
            Payload::Text(s) => s.as_str(self.input),
            _ => None,
        }
    }

    /// Iterate over the level-0 records
    pub fn roots(&self) -> SiblingIter<'_, 'a> {
        SiblingIter {
            doc: self,
            next: self.head,
        }
    }

    /// Iterate over the children of a node
    pub fn children(&self, id: NodeId) -> SiblingIter<'_, 'a> {
        SiblingIter {
            doc: self,
            next: self.node(id).and_then(|n| n.first_child),
        }
    }

    /// Iterate over all nodes reachable from the head, in document order
    pub fn iter(&self) -> DocumentOrderIter<'_, 'a> {
        DocumentOrderIter {
            doc: self,
            next: self.head,
        }
    }

    /// Iterate over the subtree below a node in document order, excluding
    /// the node itself
    pub fn descendants(&self, id: NodeId) -> DescendantsIter<'_, 'a> {
        DescendantsIter {
            doc: self,
            root: id,
            next: self.node(id).and_then(|n| n.first_child),
        }
    }

    /// Number of nodes reachable from the head (merged-away continuation
    /// slots are not counted)
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Find the record defining the given cross-reference identifier
    pub fn find_root(&self, xref: &str) -> Option<NodeId> {
        self.roots().find(|&id| {
            let node = &self.nodes[id as usize];
            node.has_id() && node.id.slice(self.input) == xref.as_bytes()
        })
    }
}

/// Iterator over a next-sibling chain
pub struct SiblingIter<'d, 'a> {
    doc: &'d GedDocument<'a>,
    next: Option<NodeId>,
}

impl<'d, 'a> Iterator for SiblingIter<'d, 'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}

/// Document-order iterator over one subtree
pub struct DescendantsIter<'d, 'a> {
    doc: &'d GedDocument<'a>,
    root: NodeId,
    next: Option<NodeId>,
}

impl<'d, 'a> Iterator for DescendantsIter<'d, 'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = if let Some(child) = self.doc.node(current).and_then(|n| n.first_child) {
            Some(child)
        } else {
            // climb toward the subtree root looking for a next sibling
            let mut cur = Some(current);
            let mut found = None;
            while let Some(c) = cur {
                if c == self.root {
                    break;
                }
                let node = self.doc.node(c)?;
                if let Some(sib) = node.next_sibling {
                    found = Some(sib);
                    break;
                }
                cur = node.parent;
            }
            found
        };
        Some(current)
    }
}

/// Document-order iterator over the whole forest
pub struct DocumentOrderIter<'d, 'a> {
    doc: &'d GedDocument<'a>,
    next: Option<NodeId>,
}

impl<'d, 'a> Iterator for DocumentOrderIter<'d, 'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = next_in_document_order(&self.doc.nodes, current);
        Some(current)
    }
}
