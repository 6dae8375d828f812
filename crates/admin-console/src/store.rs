//! Persistence boundary. Mutations hand their full change set to the store
//! before committing it in memory; a rejected change set commits nothing.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// One field-level change to entitlement state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntitlementChange {
    GlobalEnabled {
        module_id: String,
        enabled: bool,
    },
    ModuleAccess {
        module_id: String,
        subject_id: String,
        enabled: bool,
    },
    AccountActive {
        subject_id: String,
        active: bool,
    },
}

/// Durable backing for entitlement state, supplied by the host.
pub trait EntitlementStore: Send + Sync {
    /// Persist a change set. Either all of `changes` are durable on `Ok`,
    /// or none are.
    fn persist(&self, changes: &[EntitlementChange]) -> anyhow::Result<()>;
}

/// Store that keeps nothing beyond the engine's own memory. Never fails.
#[derive(Debug, Default)]
pub struct InMemoryStore;

impl EntitlementStore for InMemoryStore {
    fn persist(&self, _changes: &[EntitlementChange]) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Store that records every accepted change set, for hosts that replay
/// changes elsewhere and for tests.
#[derive(Debug, Default)]
pub struct RecordingStore {
    batches: Mutex<Vec<Vec<EntitlementChange>>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> Vec<Vec<EntitlementChange>> {
        self.batches.lock().clone()
    }
}

impl EntitlementStore for RecordingStore {
    fn persist(&self, changes: &[EntitlementChange]) -> anyhow::Result<()> {
        self.batches.lock().push(changes.to_vec());
        Ok(())
    }
}
