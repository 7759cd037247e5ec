//! Report recipients and their registration lifecycle
//!
//! INVARIANTS:
//! - The active consumer set changes only at an epoch boundary
//! - Pending changes are applied exactly once, unregistrations first

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// An authorized report recipient
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Consumer {
    /// Consumer identifier (`pkc`), used as the key in the epoch report
    pub id: String,
    /// Serialized public key material (`serializedPkc`) passed to the
    /// encryption service
    pub public_key: String,
}

impl Consumer {
    pub fn new(id: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            public_key: public_key.into(),
        }
    }
}

/// Registration changes accumulated during one epoch
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PendingChanges {
    pub registrations: BTreeSet<Consumer>,
    pub unregistrations: BTreeSet<Consumer>,
}

impl PendingChanges {
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty() && self.unregistrations.is_empty()
    }
}

/// Consumers currently receiving reports, keyed by id
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConsumerSet {
    by_id: BTreeMap<String, String>,
}

impl ConsumerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Consumers ordered by id
    pub fn to_vec(&self) -> Vec<Consumer> {
        self.by_id
            .iter()
            .map(|(id, key)| Consumer::new(id.clone(), key.clone()))
            .collect()
    }

    /// Apply one epoch's pending changes: unregister, then register
    ///
    /// An unregistration must carry the key the consumer registered with;
    /// otherwise it is ignored. Registering an existing id replaces its key.
    pub fn apply(&mut self, pending: PendingChanges) {
        for consumer in pending.unregistrations {
            match self.by_id.get(&consumer.id) {
                Some(key) if *key == consumer.public_key => {
                    self.by_id.remove(&consumer.id);
                    debug!(consumer_id = %consumer.id, "Consumer unregistered");
                }
                Some(_) => {
                    warn!(
                        consumer_id = %consumer.id,
                        "Ignoring unregistration with a key that does not match the registered key"
                    );
                }
                None => {
                    debug!(consumer_id = %consumer.id, "Ignoring unregistration of unknown consumer");
                }
            }
        }

        for consumer in pending.registrations {
            match self.by_id.insert(consumer.id.clone(), consumer.public_key) {
                Some(_) => debug!(consumer_id = %consumer.id, "Consumer key replaced"),
                None => debug!(consumer_id = %consumer.id, "Consumer registered"),
            }
        }
    }
}
