use std::fmt;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::codec::{self, CodecError, Decode, Encode};

use super::SpawnClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum TrafficLightState {
    #[default]
    Red = 0,
    Yellow = 1,
    Green = 2,
    Off = 3,
    Unknown = 4,
}

codec::wire_enum!(TrafficLightState as u8 {
    Red,
    Yellow,
    Green,
    Off,
    Unknown,
});

/// Key of a traffic-light controller in the episode's registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ControllerId(pub String);

impl ControllerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Encode for ControllerId {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.0.encode(w)
    }
}

impl Decode for ControllerId {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        Ok(Self(String::decode(r)?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrafficSignData {
    pub sign_id: String,
    /// Class spawned for the physical actor.
    pub model: SpawnClass,
    /// Class of the visual sign mesh attached to it.
    pub sign_model: SpawnClass,
}

impl Encode for TrafficSignData {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.sign_id.encode(w)?;
        self.model.encode(w)?;
        self.sign_model.encode(w)
    }
}

impl Decode for TrafficSignData {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        Ok(Self {
            sign_id: String::decode(r)?,
            model: SpawnClass::decode(r)?,
            sign_model: SpawnClass::decode(r)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrafficLightData {
    pub controller: Option<ControllerId>,
    pub light_state: TrafficLightState,
    pub sign_id: String,
    pub model: SpawnClass,
    /// Distinguishes signal heads sharing one pole position.
    pub pole_index: i32,
}

impl Encode for TrafficLightData {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.controller.encode(w)?;
        self.light_state.encode(w)?;
        self.sign_id.encode(w)?;
        self.model.encode(w)?;
        self.pole_index.encode(w)
    }
}

impl Decode for TrafficLightData {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        Ok(Self {
            controller: Option::decode(r)?,
            light_state: TrafficLightState::decode(r)?,
            sign_id: String::decode(r)?,
            model: SpawnClass::decode(r)?,
            pole_index: i32::decode(r)?,
        })
    }
}
