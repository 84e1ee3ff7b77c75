use serde::{Deserialize, Serialize};

/// Opaque handle of the data stream a sensor publishes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamToken(pub u64);

/// Sensors record only their kinematics. The stream is carried across a
/// capture/restore pair in memory and never reaches the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SensorData {
    #[serde(skip)]
    pub stream: Option<StreamToken>,
}
