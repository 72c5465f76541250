//! GEDCOM structure (node) representation
//!
//! Uses NodeId (u32) for compact, cache-friendly node references. The forest
//! is encoded first-child/next-sibling: a node's children form a singly
//! linked list via `next_sibling`, rooted at `first_child`, and the level-0
//! records are themselves a `next_sibling` chain with no parent.

use super::span::Span;

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// Payload of one line: absent, free text, or a pointer to another node.
///
/// `Pointer` holds the raw identifier span only until the resolver pass has
/// run; after that every pointer is `Resolved`, where `None` is the `VOID`
/// sentinel. Re-running resolution on a resolved forest is a no-op by
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// No line value
    None,
    /// Free text; may contain embedded line breaks after continuation merging
    Text(Span),
    /// Unresolved pointer: the identifier between the `@` signs
    Pointer(Span),
    /// Resolved pointer: the target node, or `None` for `@VOID@`
    Resolved(Option<NodeId>),
}

/// One parsed line and its subtree
#[derive(Debug, Clone)]
pub struct GedNode {
    /// Tag span, case-normalized per profile
    pub tag: Span,
    /// Cross-reference identifier span; empty when the line had none
    pub id: Span,
    /// The line value
    pub payload: Payload,
    /// Enclosing structure (None for records)
    pub parent: Option<NodeId>,
    /// First substructure
    pub first_child: Option<NodeId>,
    /// Next structure at the same level
    pub next_sibling: Option<NodeId>,
}

impl GedNode {
    /// Create a node not yet linked to children or siblings
    pub fn new(tag: Span, id: Span, payload: Payload, parent: Option<NodeId>) -> Self {
        GedNode {
            tag,
            id,
            payload,
            parent,
            first_child: None,
            next_sibling: None,
        }
    }

    /// Check if this node has substructures
    #[inline]
    pub fn has_children(&self) -> bool {
        self.first_child.is_some()
    }

    /// Check if this node defines a cross-reference identifier
    #[inline]
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }
}

/// Successor of `id` in document order: first child, else the next sibling
/// of the nearest ancestor (including `id` itself) that has one.
pub(crate) fn next_in_document_order(nodes: &[GedNode], id: NodeId) -> Option<NodeId> {
    let node = &nodes[id as usize];
    if let Some(child) = node.first_child {
        return Some(child);
    }
    let mut cur = Some(id);
    while let Some(c) = cur {
        let n = &nodes[c as usize];
        if let Some(sib) = n.next_sibling {
            return Some(sib);
        }
        cur = n.parent;
    }
    None
}

/// 1-based document-order ordinal of `target`, counted from the head.
/// Linear walk; runs at most once, on the first post-pass error.
pub(crate) fn line_of_node(nodes: &[GedNode], head: Option<NodeId>, target: NodeId) -> usize {
    let mut line = 1;
    let mut cur = head;
    while let Some(id) = cur {
        if id == target {
            return line;
        }
        line += 1;
        cur = next_in_document_order(nodes, id);
    }
    0
}
