//! Data models shared by the abstraction pipeline.

mod document;
mod finding;
mod language;
mod placeholder;
mod span;

pub use document::*;
pub use finding::*;
pub use language::*;
pub use placeholder::*;
pub use span::*;
