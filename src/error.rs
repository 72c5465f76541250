//! Parse error taxonomy
//!
//! Every failure is fatal to the parse call and carries the 1-based line
//! number of the offending construct. Lexical failures use the live line
//! counter; post-pass failures (duplicate id, dangling pointer, bad
//! continuation) use a line recomputed by re-walking the forest.

use std::fmt;

/// What went wrong, independent of where
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Line does not begin with a level integer
    MissingLevel,
    /// Level is more than one greater than the enclosing level
    LevelSkip,
    /// Level must be followed by a delimiter (Mid/Strict)
    MissingLevelDelimiter,
    /// Cross-reference identifier must be followed by a delimiter (Mid/Strict)
    MissingXrefDelimiter,
    /// A leading `@` committed the parser to an identifier that is malformed
    InvalidXrefId,
    /// `@VOID@` used as a definition identifier (Strict)
    VoidReserved,
    /// Identifier on a substructure line (Strict allows them only at level 0)
    XrefOnRecordOnly,
    /// No tag where one is required
    MissingTag,
    /// Tag recognized but not permitted (Strict: lone underscore)
    InvalidTag,
    /// Strict forbids a delimiter followed by an empty payload
    EmptyPayloadNotPermitted,
    /// Payload looks like a pointer token but is not a valid one
    InvalidPointerSyntax,
    /// Payload text begins with an undoubled `@`
    UnescapedLeadingAt,
    /// Expected a line break and found neither one nor end of input
    MissingLineBreak,
    /// The same cross-reference identifier is defined twice
    DuplicateId,
    /// Pointer payload names an identifier defined nowhere in the document
    DanglingPointer,
    /// Continuation tag with an id, children, a pointer payload, or no parent
    InvalidContinuation,
}

impl ErrorKind {
    /// Human-readable description of the failure
    pub fn message(&self) -> &'static str {
        match self {
            ErrorKind::MissingLevel => "missing level",
            ErrorKind::LevelSkip => "levels cannot skip values",
            ErrorKind::MissingLevelDelimiter => "level must be followed by a delimiter",
            ErrorKind::MissingXrefDelimiter => "xref id must be followed by a delimiter",
            ErrorKind::InvalidXrefId => "invalid xref id",
            ErrorKind::VoidReserved => "@VOID@ is not allowed as an xref id",
            ErrorKind::XrefOnRecordOnly => "xref id only allowed on records, not substructures",
            ErrorKind::MissingTag => "line without a permitted tag",
            ErrorKind::InvalidTag => "tag is not permitted in this dialect",
            ErrorKind::EmptyPayloadNotPermitted => "empty payloads must be encoded as no line value",
            ErrorKind::InvalidPointerSyntax => "malformed pointer payload",
            ErrorKind::UnescapedLeadingAt => "leading @ must be doubled or be part of a valid pointer",
            ErrorKind::MissingLineBreak => "expected line break not found",
            ErrorKind::DuplicateId => "duplicate id",
            ErrorKind::DanglingPointer => "pointer with no target",
            ErrorKind::InvalidContinuation => "incorrect use of CONT or CONC",
        }
    }
}

/// A parse failure: the kind plus the 1-based line it was detected on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ErrorKind,
    pub line: usize,
}

impl ParseError {
    pub(crate) fn new(kind: ErrorKind, line: usize) -> Self {
        ParseError { kind, line }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind.message())
    }
}

impl std::error::Error for ParseError {}
