//! Core line parsing primitives
//!
//! This module contains the fundamental building blocks for GEDCOM parsing:
//! - Scanner: SIMD-accelerated delimiter detection using memchr
//! - Profile: per-dialect grammar rules and capability predicates
//! - Tokenizer: splits the raw buffer into structured lines

pub mod profile;
pub mod scanner;
pub mod tokenizer;

pub use profile::Dialect;
