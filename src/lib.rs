//! zk_abstractor - Reversible Zero-Knowledge Code Abstraction
//!
//! Lets a remote service review source code without ever seeing proprietary
//! names, literals or secrets. Sensitive spans are replaced by opaque
//! placeholders such as `⟪VAR_1⟧`, the abstracted text is analyzed remotely,
//! and the response is restored locally from a mapping that never leaves the
//! process.
//!
//! # Pipeline
//!
//! - **Scanner**: lossless lexical spans for a changed file or a unified diff
//! - **Classifier**: PUBLIC / PROPRIETARY / SECRET per span
//! - **Redactor**: scope-aware placeholder allocation into a `MappingStore`
//! - **Remote**: job submission with retries and a fail-closed boundary check
//! - **Restorer**: placeholder substitution and finding relocation
//! - **Reporter**: text, JSON or a markdown review comment
//!
//! # Example Usage
//!
//! ```no_run
//! use zk_abstractor::{scanner::parse_unified_diff, Config, Session};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let diff = std::fs::read_to_string("change.diff")?;
//!     let session = Session::with_http(Config::default())?;
//!
//!     let outcome = session
//!         .run(&parse_unified_diff(&diff), CancellationToken::new())
//!         .await;
//!     println!("{:?}: {} findings", outcome.status, outcome.findings().count());
//!
//!     Ok(())
//! }
//! ```

pub mod classifier;
pub mod config;
pub mod error;
pub mod models;
pub mod redactor;
pub mod remote;
pub mod reporter;
pub mod restorer;
pub mod scanner;
pub mod session;

// Re-export commonly used types
pub use config::{Config, OutputFormat};
pub use error::{AbstractionError, Result};
pub use models::{AbstractedDocument, Finding, Placeholder, Severity, SessionId};
pub use session::{Session, SessionOutcome, SessionStatus};
