//! Continuation folding
//!
//! Merges `CONT` and `CONC` children into their parent's payload, in place.
//! `CONT` contributes a line break before its text, `CONC` splices bytes with
//! no separator. Folding reuses the input buffer: each appended fragment moves
//! left into bytes vacated by the consumed line prefix, so the destination
//! never overruns the source.
//!
//! The strict profile folds `CONT` only; `CONC` is an ordinary tag there.

use super::node::{next_in_document_order, GedNode, NodeId, Payload};
use super::span::Span;
use crate::core::profile::Dialect;
use crate::error::{ErrorKind, ParseError};

/// Fold all continuation children, failing on any malformed use
pub(crate) fn merge(
    nodes: &mut [GedNode],
    buf: &mut [u8],
    head: Option<NodeId>,
    dialect: Dialect,
) -> Result<(), ParseError> {
    run(nodes, buf, head, dialect, false)
}

/// Recovery variant: malformed continuations are left in the tree as-is
pub(crate) fn merge_lenient(
    nodes: &mut [GedNode],
    buf: &mut [u8],
    head: Option<NodeId>,
    dialect: Dialect,
) {
    // infallible when lenient
    let _ = run(nodes, buf, head, dialect, true);
}

fn is_continuation(nodes: &[GedNode], buf: &[u8], id: NodeId, dialect: Dialect) -> bool {
    let tag = nodes[id as usize].tag.slice(buf);
    tag == b"CONT" || (dialect.folds_conc() && tag == b"CONC")
}

fn run(
    nodes: &mut [GedNode],
    buf: &mut [u8],
    head: Option<NodeId>,
    dialect: Dialect,
    lenient: bool,
) -> Result<(), ParseError> {
    let mut line = 0;
    let mut cur = head;
    while let Some(id) = cur {
        line += 1;
        // a continuation tag reached by the walk was not a leading child of
        // anything, so it continues nothing
        if is_continuation(nodes, buf, id, dialect) && !lenient {
            return Err(ParseError::new(ErrorKind::InvalidContinuation, line));
        }
        while let Some(child) = nodes[id as usize].first_child {
            if !is_continuation(nodes, buf, child, dialect) {
                break;
            }
            line += 1;
            let malformed = matches!(
                nodes[id as usize].payload,
                Payload::Pointer(_) | Payload::Resolved(_)
            ) || nodes[child as usize].has_id()
                || matches!(
                    nodes[child as usize].payload,
                    Payload::Pointer(_) | Payload::Resolved(_)
                )
                || nodes[child as usize].has_children();
            if malformed {
                if lenient {
                    break;
                }
                return Err(ParseError::new(ErrorKind::InvalidContinuation, line));
            }
            let breaks = nodes[child as usize].tag.slice(buf) == b"CONT";
            fold(nodes, buf, id, child, breaks);
        }
        cur = next_in_document_order(nodes, id);
    }
    Ok(())
}

/// Splice one continuation child into its parent and unlink it
fn fold(nodes: &mut [GedNode], buf: &mut [u8], parent: NodeId, child: NodeId, breaks: bool) {
    debug_assert!(!matches!(
        nodes[parent as usize].payload,
        Payload::Pointer(_) | Payload::Resolved(_)
    ));
    let child_text = match nodes[child as usize].payload {
        Payload::Text(s) => Some(s),
        _ => None,
    };
    match (nodes[parent as usize].payload, child_text, breaks) {
        (Payload::None, None, true) => {
            // a lone break; reuse the first byte of the child's tag
            let at = nodes[child as usize].tag.start;
            buf[at as usize] = b'\n';
            nodes[parent as usize].payload = Payload::Text(Span::new(at, 1));
        }
        (Payload::None, None, false) => {}
        (Payload::None, Some(cs), true) => {
            // the delimiter byte before the child's text becomes the break
            buf[cs.start as usize - 1] = b'\n';
            nodes[parent as usize].payload = Payload::Text(Span::new(cs.start - 1, cs.len + 1));
        }
        (Payload::None, Some(cs), false) => {
            nodes[parent as usize].payload = Payload::Text(cs);
        }
        (Payload::Text(ps), None, true) => {
            buf[ps.end() as usize] = b'\n';
            nodes[parent as usize].payload = Payload::Text(Span::new(ps.start, ps.len + 1));
        }
        (Payload::Text(_), None, false) => {}
        (Payload::Text(ps), Some(cs), _) => {
            let mut end = ps.end() as usize;
            let mut len = ps.len + cs.len;
            if breaks {
                buf[end] = b'\n';
                end += 1;
                len += 1;
            }
            // line-prefix bytes consumed ahead of the child's text guarantee
            // the destination sits at or left of the source
            buf.copy_within(cs.start as usize..cs.end() as usize, end);
            nodes[parent as usize].payload = Payload::Text(Span::new(ps.start, len));
        }
        (Payload::Pointer(_) | Payload::Resolved(_), ..) => {}
    }
    nodes[parent as usize].first_child = nodes[child as usize].next_sibling;
    nodes[child as usize].parent = None;
    nodes[child as usize].next_sibling = None;
    nodes[child as usize].payload = Payload::None;
}
