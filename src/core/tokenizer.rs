//! Line tokenizer - pull-parser over the mutable input buffer
//!
//! Consumes one logical GEDCOM line per call through the active dialect's
//! seven grammar rules, producing a `RawLine` of spans or the first grammar
//! failure with its 1-based line number. The buffer is consumed
//! destructively (case folding happens in place) and cannot be re-tokenized.

use crate::core::profile::Dialect;
use crate::core::scanner;
use crate::dom::span::Span;
use crate::error::{ErrorKind, ParseError};

/// Payload token of one raw line, before resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawPayload {
    /// No delimiter after the tag, or an empty tolerated payload
    None,
    /// Free text up to the line break
    Text(Span),
    /// A pointer token; the span excludes the `@` signs
    Pointer(Span),
}

/// One tokenized line
#[derive(Debug, Clone, Copy)]
pub struct RawLine {
    /// 1-based source line this record started on
    pub line: usize,
    /// The level integer
    pub level: u32,
    /// Cross-reference identifier, excluding the `@` signs
    pub xref: Option<Span>,
    /// The tag
    pub tag: Span,
    /// The line value
    pub payload: RawPayload,
}

/// Pull-tokenizer over a caller-owned mutable buffer
pub struct LineTokenizer<'a> {
    buf: &'a mut [u8],
    pos: usize,
    line: usize,
    dialect: Dialect,
}

impl<'a> LineTokenizer<'a> {
    /// Create a tokenizer for the given buffer and dialect
    pub fn new(buf: &'a mut [u8], dialect: Dialect) -> Self {
        LineTokenizer {
            buf,
            pos: 0,
            line: 1,
            dialect,
        }
    }

    /// Current 1-based line number
    #[inline]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Check if the whole buffer has been consumed
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Bytes of a previously returned span
    #[inline]
    pub fn slice(&self, span: Span) -> &[u8] {
        span.slice(self.buf)
    }

    /// Give the buffer back for the post-processing passes
    pub fn into_buf(self) -> &'a mut [u8] {
        self.buf
    }

    fn err(&self, kind: ErrorKind) -> ParseError {
        ParseError::new(kind, self.line)
    }

    /// Tokenize the next line, or `Ok(None)` at end of input
    pub fn next_line(&mut self) -> Result<Option<RawLine>, ParseError> {
        if self.is_eof() {
            return Ok(None);
        }
        let d = self.dialect;
        let line = self.line;
        self.pos += d.line_start(self.buf, self.pos);

        let (n, level) = d.level(self.buf, self.pos);
        if n == 0 {
            return Err(self.err(ErrorKind::MissingLevel));
        }
        self.pos += n;

        let n = d.delim(self.buf, self.pos);
        if n == 0 && d.requires_delimiters() {
            return Err(self.err(ErrorKind::MissingLevelDelimiter));
        }
        self.pos += n;

        let mut xref = None;
        let n = d.xref(self.buf, self.pos);
        if n > 0 {
            xref = Some(Span::new(self.pos as u32 + 1, n as u32 - 2));
            self.pos += n;
            let n = d.delim(self.buf, self.pos);
            if n == 0 && d.requires_delimiters() {
                return Err(self.err(ErrorKind::MissingXrefDelimiter));
            }
            self.pos += n;
        } else if self.buf.get(self.pos) == Some(&b'@') {
            return Err(self.err(ErrorKind::InvalidXrefId));
        }

        let n = d.tag(self.buf, self.pos);
        if n == 0 {
            return Err(self.err(ErrorKind::MissingTag));
        }
        if matches!(d, Dialect::Strict) && n == 1 && self.buf[self.pos] == b'_' {
            // extension tags need at least one character after the underscore
            return Err(self.err(ErrorKind::InvalidTag));
        }
        let tag = Span::new(self.pos as u32, n as u32);
        self.pos += n;

        let mut payload = RawPayload::None;
        let n = d.delim(self.buf, self.pos);
        if n > 0 {
            self.pos += n;
            let n = d.xref(self.buf, self.pos);
            if n > 0 {
                payload = RawPayload::Pointer(Span::new(self.pos as u32 + 1, n as u32 - 2));
                self.pos += n;
            } else {
                let mut n = d.text(self.buf, self.pos);
                if n > 0 {
                    if self.buf[self.pos] == b'@' {
                        let next = self.buf.get(self.pos + 1).copied();
                        if next == Some(b'@') {
                            // doubled @ collapses to a literal one
                            self.pos += 1;
                            n -= 1;
                        } else if !d.allows_leading_at() {
                            let text = &self.buf[self.pos..self.pos + n];
                            let kind = if n >= 2 && text.ends_with(b"@") {
                                ErrorKind::InvalidPointerSyntax
                            } else {
                                ErrorKind::UnescapedLeadingAt
                            };
                            return Err(self.err(kind));
                        }
                    }
                    payload = RawPayload::Text(Span::new(self.pos as u32, n as u32));
                    self.pos += n;
                } else if matches!(d, Dialect::Strict) {
                    return Err(self.err(ErrorKind::EmptyPayloadNotPermitted));
                }
            }
        }

        let n = d.eol(self.buf, self.pos, &mut self.line);
        if n == 0 && !self.is_eof() {
            return Err(self.err(ErrorKind::MissingLineBreak));
        }
        self.pos += n;

        Ok(Some(RawLine {
            line,
            level,
            xref,
            tag,
            payload,
        }))
    }

    /// Recovery support: drop the rest of the current (malformed) line and
    /// position the tokenizer after the next line break.
    pub fn skip_to_next_line(&mut self) {
        let at = scanner::find_line_break(self.buf, self.pos);
        let n = scanner::line_break_len(self.buf, at);
        if n == 0 {
            self.pos = self.buf.len();
        } else {
            self.line += 1;
            self.pos = at + n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize_one(input: &[u8], dialect: Dialect) -> Result<(Vec<u8>, RawLine), ParseError> {
        let mut buf = input.to_vec();
        let mut tok = LineTokenizer::new(&mut buf, dialect);
        let raw = tok.next_line()?.expect("input had a line");
        Ok((buf.clone(), raw))
    }

    fn err_of(input: &[u8], dialect: Dialect) -> ParseError {
        let mut buf = input.to_vec();
        let mut tok = LineTokenizer::new(&mut buf, dialect);
        loop {
            match tok.next_line() {
                Ok(Some(_)) => continue,
                Ok(None) => panic!("expected an error"),
                Err(e) => return e,
            }
        }
    }

    #[test]
    fn test_record_line_strict() {
        let (buf, raw) = tokenize_one(b"0 @I1@ INDI\n", Dialect::Strict).unwrap();
        assert_eq!(raw.level, 0);
        assert_eq!(raw.xref.unwrap().slice(&buf), b"I1");
        assert_eq!(raw.tag.slice(&buf), b"INDI");
        assert_eq!(raw.payload, RawPayload::None);
        assert_eq!(raw.line, 1);
    }

    #[test]
    fn test_text_payload() {
        let (buf, raw) = tokenize_one(b"1 NAME John /Doe/\n", Dialect::Strict).unwrap();
        match raw.payload {
            RawPayload::Text(s) => assert_eq!(s.slice(&buf), b"John /Doe/"),
            other => panic!("expected text payload, got {other:?}"),
        }
    }

    #[test]
    fn test_pointer_payload() {
        let (buf, raw) = tokenize_one(b"1 FAMS @F1@\n", Dialect::Strict).unwrap();
        match raw.payload {
            RawPayload::Pointer(s) => assert_eq!(s.slice(&buf), b"F1"),
            other => panic!("expected pointer payload, got {other:?}"),
        }
    }

    #[test]
    fn test_doubled_at_collapses() {
        let (buf, raw) = tokenize_one(b"1 NOTE @@home\n", Dialect::Strict).unwrap();
        match raw.payload {
            RawPayload::Text(s) => assert_eq!(s.slice(&buf), b"@home"),
            other => panic!("expected text payload, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_level() {
        assert_eq!(err_of(b"HEAD\n", Dialect::Strict).kind, ErrorKind::MissingLevel);
        assert_eq!(err_of(b"HEAD\n", Dialect::Legacy).kind, ErrorKind::MissingLevel);
    }

    #[test]
    fn test_level_delimiter() {
        // legacy tolerates the missing delimiter, strict does not
        let (buf, raw) = tokenize_one(b"0HEAD\n", Dialect::Legacy).unwrap();
        assert_eq!(raw.tag.slice(&buf), b"HEAD");
        let e = err_of(b"0HEAD\n", Dialect::Strict);
        assert_eq!(e.kind, ErrorKind::MissingLevelDelimiter);
        // strict leading zero surfaces as a delimiter failure on "07"
        let e = err_of(b"07 X\n", Dialect::Strict);
        assert_eq!(e.kind, ErrorKind::MissingLevelDelimiter);
    }

    #[test]
    fn test_invalid_xref() {
        let e = err_of(b"0 @@ HEAD\n", Dialect::Strict);
        assert_eq!(e.kind, ErrorKind::InvalidXrefId);
        let e = err_of(b"0 @a b@ X\n", Dialect::Mid);
        assert_eq!(e.kind, ErrorKind::InvalidXrefId);
    }

    #[test]
    fn test_missing_tag() {
        let e = err_of(b"0 \n", Dialect::Strict);
        assert_eq!(e.kind, ErrorKind::MissingTag);
        let e = err_of(b"0 _\n", Dialect::Strict);
        assert_eq!(e.kind, ErrorKind::InvalidTag);
    }

    #[test]
    fn test_empty_payload() {
        let e = err_of(b"0 NOTE \n", Dialect::Strict);
        assert_eq!(e.kind, ErrorKind::EmptyPayloadNotPermitted);
        // mid tolerates it as "no payload"
        let (_, raw) = tokenize_one(b"0 NOTE \n", Dialect::Mid).unwrap();
        assert_eq!(raw.payload, RawPayload::None);
    }

    #[test]
    fn test_leading_at_policies() {
        // legacy and mid pass a lone @ through
        let (buf, raw) = tokenize_one(b"0 NOTE @home\n", Dialect::Legacy).unwrap();
        match raw.payload {
            RawPayload::Text(s) => assert_eq!(s.slice(&buf), b"@home"),
            other => panic!("expected text payload, got {other:?}"),
        }
        let (buf, raw) = tokenize_one(b"0 NOTE @home\n", Dialect::Mid).unwrap();
        match raw.payload {
            RawPayload::Text(s) => assert_eq!(s.slice(&buf), b"@home"),
            other => panic!("expected text payload, got {other:?}"),
        }
        // the 5.x escape form is ordinary text under the same policy
        let (_, raw) = tokenize_one(b"0 DATE @#DJULIAN@ 1752\n", Dialect::Mid).unwrap();
        assert!(matches!(raw.payload, RawPayload::Text(_)));
        // strict rejects; pointer-shaped rejects name the pointer syntax
        let e = err_of(b"0 NOTE @home\n", Dialect::Strict);
        assert_eq!(e.kind, ErrorKind::UnescapedLeadingAt);
        let e = err_of(b"0 FAMS @f1@\n", Dialect::Strict);
        assert_eq!(e.kind, ErrorKind::InvalidPointerSyntax);
    }

    #[test]
    fn test_missing_line_break() {
        let e = err_of(b"0 PTR @X@!\n", Dialect::Strict);
        assert_eq!(e.kind, ErrorKind::MissingLineBreak);
        // end of input is an acceptable terminator
        let (buf, raw) = tokenize_one(b"0 TRLR", Dialect::Strict).unwrap();
        assert_eq!(raw.tag.slice(&buf), b"TRLR");
    }

    #[test]
    fn test_line_numbers_advance() {
        let mut buf = b"0 HEAD\n1 GEDC\njunk\n".to_vec();
        let mut tok = LineTokenizer::new(&mut buf, Dialect::Strict);
        assert_eq!(tok.next_line().unwrap().unwrap().line, 1);
        assert_eq!(tok.next_line().unwrap().unwrap().line, 2);
        let e = tok.next_line().unwrap_err();
        assert_eq!(e.kind, ErrorKind::MissingLevel);
        assert_eq!(e.line, 3);
    }

    #[test]
    fn test_skip_to_next_line() {
        let mut buf = b"junk line\n0 HEAD\n".to_vec();
        let mut tok = LineTokenizer::new(&mut buf, Dialect::Strict);
        assert!(tok.next_line().is_err());
        tok.skip_to_next_line();
        assert_eq!(tok.line(), 2);
        let raw = tok.next_line().unwrap().unwrap();
        assert_eq!(raw.line, 2);
        assert_eq!(raw.level, 0);
    }

    #[test]
    fn test_mid_blank_lines_and_indent() {
        let mut buf = b"0 HEAD\n\n  1 GEDC\n".to_vec();
        let mut tok = LineTokenizer::new(&mut buf, Dialect::Mid);
        assert!(tok.next_line().unwrap().is_some());
        let raw = tok.next_line().unwrap().unwrap();
        assert_eq!(raw.level, 1);
        assert_eq!(raw.line, 3);
        assert!(tok.next_line().unwrap().is_none());
    }
}
