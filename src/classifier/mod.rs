//! Sensitivity classification of scanned spans.
//!
//! This module provides:
//! - Credential and PII pattern matching with entropy analysis
//! - Keyword and builtin tables that stay readable in abstracted code
//! - The [`Classifier`] combining both with the configured allow-lists

mod keywords;
mod secrets;
mod sensitivity;

pub use keywords::*;
pub use secrets::*;
pub use sensitivity::*;
