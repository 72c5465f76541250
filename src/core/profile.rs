//! Dialect profiles
//!
//! Three generations of the GEDCOM line grammar, unified behind seven rules:
//! line-start trivia, level integer, delimiter, cross-reference identifier,
//! tag, payload text, end of line. The engine threads one `Dialect` through
//! the tokenizer and never branches on which profile is active beyond the
//! capability predicates below.
//!
//! Each rule is a recognizer over `(buffer, position)` returning the number
//! of bytes consumed (0 = no match). The identifier and tag rules of the Mid
//! profile case-fold to uppercase in place, so the buffer cannot be
//! re-tokenized afterward.

use crate::core::scanner;

/// Which generation of the line grammar to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Most forgiving parse possible: any delimiter runs, free-form tags and
    /// identifiers, blank lines and indentation
    Legacy,
    /// 5.5-generation rules: alphanumeric tags and identifiers case-folded to
    /// uppercase, delimiters required but multi-byte runs tolerated
    Mid,
    /// Version 7 rules enforced exactly: single-space delimiters, uppercase
    /// tags, identifiers only on records
    Strict,
}

impl Dialect {
    /// Level and identifier tokens must be followed by a delimiter
    #[inline]
    pub fn requires_delimiters(&self) -> bool {
        !matches!(self, Dialect::Legacy)
    }

    /// Identifiers are legal only on level-0 lines
    #[inline]
    pub fn records_only_ids(&self) -> bool {
        matches!(self, Dialect::Strict)
    }

    /// `@VOID@` is rejected as a definition identifier
    #[inline]
    pub fn rejects_void_definition(&self) -> bool {
        matches!(self, Dialect::Strict)
    }

    /// The continuation merger folds `CONC` in addition to `CONT`
    #[inline]
    pub fn folds_conc(&self) -> bool {
        !matches!(self, Dialect::Strict)
    }

    /// The resolver registers identifiers found at any depth
    #[inline]
    pub fn ids_at_any_depth(&self) -> bool {
        !matches!(self, Dialect::Strict)
    }

    /// Whether payload text may begin with a lone (undoubled) `@`
    #[inline]
    pub fn allows_leading_at(&self) -> bool {
        !matches!(self, Dialect::Strict)
    }

    /// Rule 1: trivia tolerated before the level integer
    pub fn line_start(&self, buf: &[u8], pos: usize) -> usize {
        match self {
            // One BOM, nothing else
            Dialect::Strict => {
                if scanner::starts_with_at(buf, pos, &scanner::BOM) {
                    scanner::BOM.len()
                } else {
                    0
                }
            }
            Dialect::Legacy | Dialect::Mid => {
                let mut i = pos;
                loop {
                    match buf.get(i) {
                        Some(b' ') | Some(b'\t') | Some(b'\r') => i += 1,
                        _ if scanner::starts_with_at(buf, i, &scanner::NBSP) => i += 2,
                        _ if scanner::starts_with_at(buf, i, &scanner::BOM) => i += 3,
                        _ => break,
                    }
                }
                i - pos
            }
        }
    }

    /// Rule 2: the level integer. Strict permits a leading zero only for the
    /// literal level 0 (a following digit then fails the delimiter rule).
    pub fn level(&self, buf: &[u8], pos: usize) -> (usize, u32) {
        if matches!(self, Dialect::Strict) && buf.get(pos) == Some(&b'0') {
            return (1, 0);
        }
        let mut i = pos;
        let mut value: u32 = 0;
        while i < buf.len() && buf[i].is_ascii_digit() {
            value = value.saturating_mul(10).saturating_add(u32::from(buf[i] - b'0'));
            i += 1;
        }
        (i - pos, value)
    }

    /// Rule 3: the inter-token delimiter
    pub fn delim(&self, buf: &[u8], pos: usize) -> usize {
        match self {
            Dialect::Strict => {
                if buf.get(pos) == Some(&b' ') {
                    1
                } else {
                    0
                }
            }
            Dialect::Legacy | Dialect::Mid => {
                let mut i = pos;
                loop {
                    match buf.get(i) {
                        Some(b' ') | Some(b'\t') => i += 1,
                        _ if scanner::starts_with_at(buf, i, &scanner::NBSP) => i += 2,
                        _ if scanner::starts_with_at(buf, i, &scanner::BOM) => i += 3,
                        _ => break,
                    }
                }
                i - pos
            }
        }
    }

    /// Rule 4: a cross-reference identifier or pointer token `@…@`.
    /// Consumed length includes both `@` signs; 0 means "not one".
    pub fn xref(&self, buf: &mut [u8], pos: usize) -> usize {
        if buf.get(pos) != Some(&b'@') {
            return 0;
        }
        match self {
            Dialect::Legacy => {
                let first = match buf.get(pos + 1) {
                    Some(&b) => b,
                    None => return 0,
                };
                // `@@` never opens an identifier and `@#` opens an escape
                if first == b'@' || first == b'#' {
                    return 0;
                }
                let end = scanner::find_at_or_break(buf, pos + 1);
                if buf.get(end) != Some(&b'@') {
                    return 0;
                }
                end + 1 - pos
            }
            Dialect::Mid => {
                let mut i = pos + 1;
                while i < buf.len() && (buf[i].is_ascii_alphanumeric() || buf[i] == b'_') {
                    buf[i] = buf[i].to_ascii_uppercase();
                    i += 1;
                }
                if i == pos + 1 || buf.get(i) != Some(&b'@') {
                    return 0;
                }
                i + 1 - pos
            }
            Dialect::Strict => {
                let mut i = pos + 1;
                while i < buf.len() && matches!(buf[i], b'A'..=b'Z' | b'0'..=b'9' | b'_') {
                    i += 1;
                }
                if i == pos + 1 || buf.get(i) != Some(&b'@') {
                    return 0;
                }
                i + 1 - pos
            }
        }
    }

    /// Rule 5: the tag
    pub fn tag(&self, buf: &mut [u8], pos: usize) -> usize {
        match self {
            Dialect::Legacy => {
                if buf.get(pos) == Some(&b'@') {
                    return 0;
                }
                let mut i = pos;
                while i < buf.len() && !matches!(buf[i], b' ' | b'\t' | b'\r' | b'\n') {
                    i += 1;
                }
                i - pos
            }
            Dialect::Mid => {
                let mut i = pos;
                while i < buf.len() && (buf[i].is_ascii_alphanumeric() || buf[i] == b'_') {
                    buf[i] = buf[i].to_ascii_uppercase();
                    i += 1;
                }
                i - pos
            }
            Dialect::Strict => {
                let mut i = pos;
                while i < buf.len() {
                    let ok = match buf[i] {
                        b'_' | b'A'..=b'Z' => true,
                        b'0'..=b'9' => i > pos,
                        _ => false,
                    };
                    if !ok {
                        break;
                    }
                    i += 1;
                }
                i - pos
            }
        }
    }

    /// Rule 6: payload text, up to the line break
    #[inline]
    pub fn text(&self, buf: &[u8], pos: usize) -> usize {
        scanner::find_line_break(buf, pos) - pos
    }

    /// Rule 7: end of line, advancing the 1-based line counter once per
    /// break. Legacy tolerates trailing junk before the break; Legacy and Mid
    /// swallow blank lines (counting each) and indentation of the next line.
    /// Returns 0 when no break was found short of end of input.
    pub fn eol(&self, buf: &[u8], pos: usize, line: &mut usize) -> usize {
        match self {
            Dialect::Strict => match buf.get(pos) {
                Some(b'\r') => {
                    *line += 1;
                    if buf.get(pos + 1) == Some(&b'\n') {
                        2
                    } else {
                        1
                    }
                }
                Some(b'\n') => {
                    *line += 1;
                    1
                }
                _ => 0,
            },
            Dialect::Legacy | Dialect::Mid => {
                let mut i = if matches!(self, Dialect::Legacy) {
                    scanner::find_line_break(buf, pos)
                } else {
                    let mut i = pos;
                    while i < buf.len() && matches!(buf[i], b' ' | b'\t') {
                        i += 1;
                    }
                    i
                };
                let mut had_break = false;
                loop {
                    let n = scanner::line_break_len(buf, i);
                    if n == 0 {
                        break;
                    }
                    had_break = true;
                    *line += 1;
                    i += n;
                    while i < buf.len() && matches!(buf[i], b' ' | b'\t') {
                        i += 1;
                    }
                }
                if !had_break && i < buf.len() {
                    return 0;
                }
                i - pos
            }
        }
    }
}
