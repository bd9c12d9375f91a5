//! Concurrent record store.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;

use dashboard_core::types::Record;

#[derive(Default)]
struct StoreState {
    /// Live entries: uid → record
    live: HashMap<String, Record>,
    /// Static entries emitted ahead of live ones
    statics: Vec<Record>,
}

/// In-memory store of enriched records.
///
/// Thread-safe: writers exclude everyone, snapshots may overlap each other.
/// No method performs I/O while holding the lock.
pub struct RecordStore {
    state: RwLock<StoreState>,
}

impl RecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Inserts or replaces a record by uid.
    ///
    /// A discovered logo survives updates that carry none. The certificate
    /// expiry is carried forward for TLS records, since only the TLS loop
    /// computes it. Returns true if the uid was not present before.
    pub fn upsert(&self, mut record: Record) -> bool {
        let mut state = self.state.write();
        let previous = state.live.get(&record.uid);

        if let Some(old) = previous {
            if record.logo_url.is_empty() && !old.logo_url.is_empty() {
                record.logo_url = old.logo_url.clone();
            }
            if record.tls && record.tls_expiration.is_none() {
                record.tls_expiration = old.tls_expiration;
            }
        }
        if !record.tls {
            record.tls_expiration = None;
        }

        let created = previous.is_none();
        debug!(uid = %record.uid, id = %record.id, created, "Upserting record");
        state.live.insert(record.uid.clone(), record);
        created
    }

    /// Removes a record. Returns the removed record, if any.
    pub fn delete(&self, uid: &str) -> Option<Record> {
        let removed = self.state.write().live.remove(uid);
        if let Some(record) = &removed {
            debug!(uid, id = %record.id, "Deleted record");
        }
        removed
    }

    /// Sets the logo of a record that has none yet.
    ///
    /// Other fields are left alone so a concurrent update is never clobbered.
    /// Returns false if the record is gone or already has a logo.
    pub fn set_logo(&self, uid: &str, logo_url: &str) -> bool {
        let mut state = self.state.write();
        match state.live.get_mut(uid) {
            Some(record) if record.logo_url.is_empty() && !logo_url.is_empty() => {
                record.logo_url = logo_url.to_string();
                true
            }
            _ => false,
        }
    }

    /// Overwrites the certificate expiry of a record.
    ///
    /// Returns false if the record is gone.
    pub fn set_tls_expiration(&self, uid: &str, expires_at: DateTime<Utc>) -> bool {
        let mut state = self.state.write();
        match state.live.get_mut(uid) {
            Some(record) => {
                record.tls_expiration = Some(expires_at);
                true
            }
            None => false,
        }
    }

    /// Replaces the static entries emitted ahead of live ones.
    pub fn prepend(&self, statics: Vec<Record>) {
        debug!(count = statics.len(), "Installing static entries");
        self.state.write().statics = statics;
    }

    /// Returns a live record by uid.
    pub fn get(&self, uid: &str) -> Option<Record> {
        self.state.read().live.get(uid).cloned()
    }

    /// Independent copy of every entry: statics first, then live entries
    /// sorted by sort key.
    pub fn snapshot(&self) -> Vec<Record> {
        let state = self.state.read();
        let mut out = Vec::with_capacity(state.statics.len() + state.live.len());
        out.extend(state.statics.iter().cloned());
        out.extend(sorted(&state.live));
        out
    }

    /// Independent copy of live entries only, sorted by sort key.
    ///
    /// This is what the enrichment loops scan.
    pub fn records(&self) -> Vec<Record> {
        sorted(&self.state.read().live)
    }

    /// Returns the number of live records.
    pub fn len(&self) -> usize {
        self.state.read().live.len()
    }

    /// Returns true if there are no live records.
    pub fn is_empty(&self) -> bool {
        self.state.read().live.is_empty()
    }

    /// Returns store statistics.
    pub fn stats(&self) -> StoreStats {
        let state = self.state.read();
        StoreStats {
            live_entries: state.live.len(),
            static_entries: state.statics.len(),
            with_logo: state.live.values().filter(|r| !r.logo_url.is_empty()).count(),
            with_tls_expiration: state
                .live
                .values()
                .filter(|r| r.tls_expiration.is_some())
                .count(),
        }
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

fn sorted(live: &HashMap<String, Record>) -> Vec<Record> {
    let mut out: Vec<Record> = live.values().cloned().collect();
    out.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.uid.cmp(&b.uid)));
    out
}

/// Store statistics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreStats {
    /// Records derived from observed resources
    pub live_entries: usize,
    /// Records from static definitions
    pub static_entries: usize,
    /// Live records with a logo
    pub with_logo: usize,
    /// Live records with a known certificate expiry
    pub with_tls_expiration: usize,
}
