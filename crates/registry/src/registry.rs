//! The catalog and its controlled upsert state machine.

use crate::conflict::{ConflictReason, ConflictRecord};
use crate::entry::{RegistryEntry, SourceRef};
use crate::error::{ErrorKind, Result};
use crate::identity::ContentIdentity;
use arxcat_validate::ValidationOutcome;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::instrument;

/// Result of one upsert attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Upsert {
    /// The identity was absent; a new entry was created.
    Inserted,
    /// The identity was present and the incoming outcome carried the same
    /// status; the stored outcome was replaced and the update count bumped.
    Updated,
    /// The incoming outcome is identical to the stored one. No state
    /// change, which keeps replays of a persisted catalog silent.
    Unchanged,
    /// The incoming status contradicts the stored status. The stored entry
    /// stays authoritative and a [`ConflictRecord`] was appended.
    Conflict,
}

/// The content-addressed catalog.
///
/// All mutation goes through [`upsert`](Self::upsert), serialized by a
/// single lock: concurrent workers hashing identical content from
/// different archives must resolve to one inserted entry plus unchanged
/// replays, never a duplicate or a lost update.
#[derive(Default)]
pub struct Catalog {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, RegistryEntry>,
    conflicts: Vec<ConflictRecord>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a catalog from previously persisted entries. Upserts
    /// replayed against the result are idempotent: an unchanged outcome
    /// reports [`Upsert::Unchanged`] and creates no conflict.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = RegistryEntry>) -> Self {
        let entries = entries.into_iter().map(|entry| (entry.identity.strong.clone(), entry)).collect();
        Self { inner: Mutex::new(Inner { entries, conflicts: Vec::new() }) }
    }

    /// Insert or update the entry for `identity`.
    ///
    /// State machine per entry: absent becomes present on insert; present
    /// entries accept same-status replacements (refinements and
    /// re-validations) and refuse status contradictions, which are
    /// recorded as conflicts with the stored entry kept authoritative.
    #[instrument(skip_all, fields(identity = %identity, status = %outcome.status))]
    pub fn upsert(&self, identity: ContentIdentity, source: SourceRef, outcome: ValidationOutcome) -> Result<Upsert> {
        let Ok(mut inner) = self.inner.lock() else {
            exn::bail!(ErrorKind::Poisoned);
        };
        let Some(existing) = inner.entries.get_mut(identity.key()) else {
            let key = identity.strong.clone();
            inner.entries.insert(key, RegistryEntry::new(identity, source, outcome));
            return Ok(Upsert::Inserted);
        };

        if existing.outcome == outcome {
            return Ok(Upsert::Unchanged);
        }
        if existing.outcome.status == outcome.status {
            if !outcome.is_refinement_of(&existing.outcome) {
                tracing::debug!("same-status re-validation replaced stored metadata");
            }
            existing.outcome = outcome;
            existing.update_count += 1;
            return Ok(Upsert::Updated);
        }

        tracing::warn!(
            stored = %existing.outcome.status,
            incoming = %outcome.status,
            "status contradiction, keeping stored entry"
        );
        let record = ConflictRecord {
            identity,
            existing: existing.clone(),
            incoming: outcome,
            incoming_source: source,
            reason: ConflictReason::StatusContradiction,
        };
        inner.conflicts.push(record);
        Ok(Upsert::Conflict)
    }

    /// Snapshot of all entries, unordered.
    pub fn entries(&self) -> Result<Vec<RegistryEntry>> {
        let Ok(inner) = self.inner.lock() else {
            exn::bail!(ErrorKind::Poisoned);
        };
        Ok(inner.entries.values().cloned().collect())
    }

    /// Snapshot of all conflicts recorded so far, in order of occurrence.
    pub fn conflicts(&self) -> Result<Vec<ConflictRecord>> {
        let Ok(inner) = self.inner.lock() else {
            exn::bail!(ErrorKind::Poisoned);
        };
        Ok(inner.conflicts.clone())
    }

    pub fn len(&self) -> Result<usize> {
        let Ok(inner) = self.inner.lock() else {
            exn::bail!(ErrorKind::Poisoned);
        };
        Ok(inner.entries.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
