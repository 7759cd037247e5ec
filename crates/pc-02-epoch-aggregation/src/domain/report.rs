//! Epoch report sent to the collection server

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::epoch::EpochWindow;

/// Opaque ciphertext returned by the encryption service
pub type Ciphertext = String;

/// One epoch's encrypted presence summary
///
/// Carries no cleartext identifiers: only the window, the sensor id and one
/// encrypted copy of the filter per consumer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochReport {
    pub epoch_start_timestamp: i64,
    pub epoch_end_timestamp: i64,
    pub sensor_id: String,
    /// consumer id -> ciphertext
    pub encrypted_bloom_filters: BTreeMap<String, Ciphertext>,
}

impl EpochReport {
    /// Report with no encrypted entries yet
    pub fn new(sensor_id: impl Into<String>, window: EpochWindow) -> Self {
        Self {
            epoch_start_timestamp: window.start,
            epoch_end_timestamp: window.end,
            sensor_id: sensor_id.into(),
            encrypted_bloom_filters: BTreeMap::new(),
        }
    }

    pub fn window(&self) -> EpochWindow {
        EpochWindow {
            start: self.epoch_start_timestamp,
            end: self.epoch_end_timestamp,
        }
    }
}
