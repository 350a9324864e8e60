//! Content-addressed catalog of validated submission artifacts.
//!
//! Every validated byte payload gets a [`ContentIdentity`] derived from its
//! bytes alone; the catalog keys entries on the strong digest, so identical
//! content reaching the pipeline from different archives or paths collapses
//! into one entry. Updates are controlled: an entry is only ever inserted,
//! refined, or contested — a status contradiction produces a
//! [`ConflictRecord`] and leaves the stored entry authoritative. Nothing is
//! deleted within a run.

mod conflict;
mod entry;
pub mod error;
mod identity;
mod persist;
mod registry;
mod report;

pub use crate::conflict::{ConflictReason, ConflictRecord};
pub use crate::entry::{RegistryEntry, SourceRef};
pub use crate::identity::{ContentIdentity, IdentityScreen, identify};
pub use crate::persist::{load_entries, save_entries};
pub use crate::registry::{Catalog, Upsert};
pub use crate::report::Report;
