//! Source intake: unified diff extraction and the lexical scanner.

mod diff;
mod lexer;

pub use diff::*;
pub use lexer::*;
