//! Cross-reference resolver
//!
//! Two passes over the completed forest: collect every node defining an
//! identifier into a sorted table (duplicates are fatal), then rewrite each
//! pointer payload to a direct node reference by binary search. The literal
//! `VOID` target resolves to no target and is never an error.
//!
//! Error lines are recomputed by counting nodes from the head in document
//! order; no per-node line is retained after tokenization. O(n), but it runs
//! at most once, on the first detected failure.

use super::node::{line_of_node, next_in_document_order, GedNode, NodeId, Payload};
use crate::core::profile::Dialect;
use crate::error::{ErrorKind, ParseError};

/// Resolve all pointer payloads, failing on duplicate or dangling ids
pub(crate) fn resolve(
    nodes: &mut [GedNode],
    buf: &[u8],
    head: Option<NodeId>,
    dialect: Dialect,
) -> Result<(), ParseError> {
    let table = collect(nodes, buf, head, dialect);
    for w in 1..table.len() {
        let prev = nodes[table[w - 1] as usize].id.slice(buf);
        let here = nodes[table[w] as usize].id.slice(buf);
        if prev == here {
            // stable sort keeps document order among equals, so table[w] is
            // the later definition
            let line = line_of_node(nodes, head, table[w]);
            return Err(ParseError::new(ErrorKind::DuplicateId, line));
        }
    }
    fixup(nodes, buf, head, &table, false)
}

/// Recovery variant: first definition wins, dangling pointers become VOID
pub(crate) fn resolve_lenient(
    nodes: &mut [GedNode],
    buf: &[u8],
    head: Option<NodeId>,
    dialect: Dialect,
) {
    let mut table = collect(nodes, buf, head, dialect);
    table.dedup_by(|a, b| nodes[*a as usize].id.slice(buf) == nodes[*b as usize].id.slice(buf));
    // infallible with lenient set
    let _ = fixup(nodes, buf, head, &table, true);
}

/// Gather defining nodes and sort by identifier bytes. Profiles that allow
/// identifiers at any depth walk the whole forest in document order; the
/// strict profile registers records only (identifiers cannot legally occur
/// deeper, but tolerated malformed input must not register them either).
fn collect(nodes: &[GedNode], buf: &[u8], head: Option<NodeId>, dialect: Dialect) -> Vec<NodeId> {
    let mut table = Vec::new();
    if dialect.ids_at_any_depth() {
        let mut cur = head;
        while let Some(id) = cur {
            if nodes[id as usize].has_id() {
                table.push(id);
            }
            cur = next_in_document_order(nodes, id);
        }
    } else {
        let mut cur = head;
        while let Some(id) = cur {
            if nodes[id as usize].has_id() {
                table.push(id);
            }
            cur = nodes[id as usize].next_sibling;
        }
    }
    table.sort_by(|&a, &b| {
        nodes[a as usize]
            .id
            .slice(buf)
            .cmp(nodes[b as usize].id.slice(buf))
    });
    table
}

/// Rewrite pointer payloads to resolved references, counting document-order
/// lines as it goes for error reporting
fn fixup(
    nodes: &mut [GedNode],
    buf: &[u8],
    head: Option<NodeId>,
    table: &[NodeId],
    lenient: bool,
) -> Result<(), ParseError> {
    let mut line = 0;
    let mut cur = head;
    while let Some(id) = cur {
        line += 1;
        if let Payload::Pointer(span) = nodes[id as usize].payload {
            let target = span.slice(buf);
            if target == b"VOID" {
                nodes[id as usize].payload = Payload::Resolved(None);
            } else {
                let found = table
                    .binary_search_by(|&t| nodes[t as usize].id.slice(buf).cmp(target))
                    .ok();
                match found {
                    Some(i) => nodes[id as usize].payload = Payload::Resolved(Some(table[i])),
                    None if lenient => nodes[id as usize].payload = Payload::Resolved(None),
                    None => return Err(ParseError::new(ErrorKind::DanglingPointer, line)),
                }
            }
        }
        cur = next_in_document_order(nodes, id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tokenizer::{LineTokenizer, RawPayload};
    use crate::dom::span::Span;

    // build a forest through the tokenizer so spans are real
    fn build(input: &[u8], dialect: Dialect) -> (Vec<u8>, Vec<GedNode>, Option<NodeId>) {
        let mut buf = input.to_vec();
        let mut nodes: Vec<GedNode> = Vec::new();
        let mut head = None;
        {
            let mut tok = LineTokenizer::new(&mut buf, dialect);
            let mut depth: i64 = -1;
            let mut parent: Option<NodeId> = None;
            let mut sibling: Option<NodeId> = None;
            while let Some(raw) = tok.next_line().unwrap() {
                let level = i64::from(raw.level);
                assert!(level <= depth + 1);
                while level < depth + 1 {
                    sibling = parent;
                    parent = parent.and_then(|p| nodes[p as usize].parent);
                    depth -= 1;
                }
                depth = level;
                let payload = match raw.payload {
                    RawPayload::None => Payload::None,
                    RawPayload::Text(s) => Payload::Text(s),
                    RawPayload::Pointer(s) => Payload::Pointer(s),
                };
                let id = nodes.len() as NodeId;
                nodes.push(GedNode::new(
                    raw.tag,
                    raw.xref.unwrap_or_else(Span::empty),
                    payload,
                    parent,
                ));
                if let Some(s) = sibling {
                    nodes[s as usize].next_sibling = Some(id);
                } else if let Some(p) = parent {
                    nodes[p as usize].first_child = Some(id);
                }
                parent = Some(id);
                sibling = None;
                if head.is_none() {
                    head = Some(id);
                }
            }
        }
        (buf, nodes, head)
    }

    #[test]
    fn test_duplicate_reports_later_line() {
        let (buf, mut nodes, head) =
            build(b"0 @A@ X\n0 @B@ X\n0 @A@ X\n", Dialect::Strict);
        let e = resolve(&mut nodes, &buf, head, Dialect::Strict).unwrap_err();
        assert_eq!(e.kind, ErrorKind::DuplicateId);
        assert_eq!(e.line, 3);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let (buf, mut nodes, head) =
            build(b"0 @A@ X\n1 PTR @A@\n1 NIL @VOID@\n", Dialect::Strict);
        resolve(&mut nodes, &buf, head, Dialect::Strict).unwrap();
        assert_eq!(nodes[1].payload, Payload::Resolved(Some(0)));
        assert_eq!(nodes[2].payload, Payload::Resolved(None));
        let snapshot: Vec<Payload> = nodes.iter().map(|n| n.payload).collect();
        resolve(&mut nodes, &buf, head, Dialect::Strict).unwrap();
        let after: Vec<Payload> = nodes.iter().map(|n| n.payload).collect();
        assert_eq!(snapshot, after);
    }

    #[test]
    fn test_nested_ids_register_for_mid() {
        let (buf, mut nodes, head) = build(b"0 A\n1 @N1@ B\n0 PTR @N1@\n", Dialect::Mid);
        resolve(&mut nodes, &buf, head, Dialect::Mid).unwrap();
        assert_eq!(nodes[2].payload, Payload::Resolved(Some(1)));
    }

    #[test]
    fn test_dangling_line_is_node_ordinal() {
        let (buf, mut nodes, head) =
            build(b"0 @A@ X\n1 SUB Y\n1 PTR @MISSING@\n", Dialect::Strict);
        let e = resolve(&mut nodes, &buf, head, Dialect::Strict).unwrap_err();
        assert_eq!(e.kind, ErrorKind::DanglingPointer);
        assert_eq!(e.line, 3);
    }

    #[test]
    fn test_lenient_dedup_and_void() {
        let (buf, mut nodes, head) =
            build(b"0 @A@ X\n0 @A@ Y\n0 P1 @A@\n0 P2 @GONE@\n", Dialect::Legacy);
        resolve_lenient(&mut nodes, &buf, head, Dialect::Legacy);
        assert_eq!(nodes[2].payload, Payload::Resolved(Some(0)));
        assert_eq!(nodes[3].payload, Payload::Resolved(None));
    }
}
