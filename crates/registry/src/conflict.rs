//! Conflict records: contested updates kept for diagnostics.

use crate::entry::{RegistryEntry, SourceRef};
use crate::identity::ContentIdentity;
use arxcat_validate::ValidationOutcome;
use serde::{Deserialize, Serialize};

/// Why an upsert was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictReason {
    /// The incoming status contradicts the stored status for the same
    /// identity.
    StatusContradiction,
}

/// A refused upsert, retained in full so diagnostics can show both sides.
/// Never silently dropped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub identity: ContentIdentity,
    /// Snapshot of the stored entry at the time of the contested upsert.
    pub existing: RegistryEntry,
    pub incoming: ValidationOutcome,
    pub incoming_source: SourceRef,
    pub reason: ConflictReason,
}
