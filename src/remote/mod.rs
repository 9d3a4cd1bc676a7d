//! Remote analysis boundary.
//!
//! Everything that leaves the process goes through an [`AnalysisClient`].
//! The HTTP implementation submits a job and polls for its result, retrying
//! transient failures with bounded exponential backoff. Responses are checked
//! by [`BoundaryGuard`] before the session restores anything from them.

mod client;
mod guard;
mod http;
pub mod retry;

pub use client::*;
pub use guard::BoundaryGuard;
pub use http::HttpAnalysisClient;
pub use retry::RetryPolicy;
