use std::io::{Read, Write};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::codec::{CodecError, Decode, Encode};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WalkerControl {
    pub direction: Vec3,
    pub speed: f32,
    pub jump: bool,
}

impl Default for WalkerControl {
    fn default() -> Self {
        Self {
            direction: Vec3::X,
            speed: 0.0,
            jump: false,
        }
    }
}

impl Encode for WalkerControl {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.direction.encode(w)?;
        self.speed.encode(w)?;
        self.jump.encode(w)
    }
}

impl Decode for WalkerControl {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        Ok(Self {
            direction: Vec3::decode(r)?,
            speed: f32::decode(r)?,
            jump: bool::decode(r)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WalkerData {
    pub control: WalkerControl,
    pub alive: bool,
}

impl Default for WalkerData {
    fn default() -> Self {
        Self {
            control: WalkerControl::default(),
            alive: true,
        }
    }
}

impl Encode for WalkerData {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.control.encode(w)?;
        self.alive.encode(w)
    }
}

impl Decode for WalkerData {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        Ok(Self {
            control: WalkerControl::decode(r)?,
            alive: bool::decode(r)?,
        })
    }
}
