//! Redaction of classified spans into an abstracted document.
//!
//! This module provides:
//! - The session-scoped mapping store (placeholder ↔ original text)
//! - Approximate scope tracking for shadowing-aware placeholder reuse
//! - The redaction pass itself
//!
//! The mapping store never leaves the process: the redactor creates it and
//! the restorer is its only reader.

mod mapping;
mod redact;
mod scope;

pub use mapping::*;
pub use redact::*;
pub use scope::BlockStyle;
