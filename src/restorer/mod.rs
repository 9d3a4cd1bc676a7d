//! Restoration of abstracted documents returned by the remote service.
//!
//! Placeholders are substituted back by exact match against the session's
//! mapping store. Tokens the store does not know are never guessed: they
//! stay visible as `⟪UNRESOLVED:...⟧` markers and are reported as
//! [`RestorationError`] values so a partial result can still be delivered.

mod restore;

pub use restore::*;
