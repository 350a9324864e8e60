//! Per-type validation of extracted submission members.
//!
//! Every member flows through the same contract: a [`Handler`] inspects the
//! bytes and produces a [`ValidationOutcome`] with a status, format-specific
//! metadata, and diagnostic messages. Handlers never fail on malformed
//! input; malformed content is an `invalid` outcome, and a handler error is
//! reserved for environment problems (a decoding capability that is not
//! available), which dispatch downgrades to a `warning` outcome so one
//! member can never abort the batch.
//!
//! [`HandlerRegistry`] maps coarse file kinds to handlers. Registration is
//! last-write-wins so a handler can be overridden during testing without
//! touching dispatch logic.

pub mod error;
mod handler;
pub mod handlers;
mod outcome;

pub use crate::handler::{Handler, HandlerRegistry};
pub use crate::outcome::{Status, ValidationOutcome};
