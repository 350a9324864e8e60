//! Orchestration: archive in, registry entries and a report out.
//!
//! [`Pipeline`] drives one archive through extraction, classification,
//! handler dispatch, hashing and catalog upserts with a bounded pool of
//! blocking workers. [`run_batch`] lifts that over a sequence of archives
//! supplied by an [`ArchiveSource`], yielding progress events and ending
//! with the aggregated [`Report`](arxcat_registry::Report). Failure scope
//! is deliberate: a member failure marks that member, an archive failure
//! marks that archive, and only cancellation or a broken catalog ends a
//! batch.

mod batch;
mod cancel;
pub mod error;
mod run;

pub use crate::batch::{ArchiveSource, BatchEvent, run_batch};
pub use crate::cancel::CancelToken;
pub use crate::run::{ArchiveSummary, Pipeline, PipelineOptions};
