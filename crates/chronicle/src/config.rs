use serde::{Deserialize, Serialize};

use crate::codec::MAX_SEQ_LEN;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    pub map_name: String,
    pub capture_wheels: bool,
    /// Larger batches are split across several packets.
    pub max_records_per_packet: usize,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            map_name: String::new(),
            capture_wheels: true,
            max_records_per_packet: MAX_SEQ_LEN,
        }
    }
}

impl RecorderConfig {
    pub fn records_per_packet(&self) -> usize {
        self.max_records_per_packet.clamp(1, MAX_SEQ_LEN)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// When false, sensors are neither respawned nor restored.
    pub replay_sensors: bool,
    /// Stop at the first frame whose elapsed time exceeds this.
    pub time_limit: Option<f64>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            replay_sensors: true,
            time_limit: None,
        }
    }
}
