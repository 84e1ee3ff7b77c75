mod sensor;
mod snapshot;
mod traffic;
mod vehicle;
mod walker;

use std::fmt;
use std::io::{Read, Write};

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::codec::{self, CodecError, Decode, Encode};

pub use sensor::{SensorData, StreamToken};
pub use snapshot::{ActorData, ActorSnapshot, Kinematics};
pub use traffic::{ControllerId, TrafficLightData, TrafficLightState, TrafficSignData};
pub use vehicle::{
    AckermannControllerSettings, GearPhysicsControl, VehicleAckermannControl, VehicleControl,
    VehicleData, VehicleFailureState, VehicleLightState, VehiclePhysicsControl, VehicleWheels,
    WheelLocation, WheelPhysicsControl, WheelSample,
};
pub use walker::{WalkerControl, WalkerData};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct ActorId(pub u32);

impl ActorId {
    pub fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Spawn class (blueprint) name handed to the spawn callback.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct SpawnClass(pub String);

impl SpawnClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SpawnClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Encode for SpawnClass {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.0.encode(w)
    }
}

impl Decode for SpawnClass {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        Ok(Self(String::decode(r)?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActorInfo {
    pub class: SpawnClass,
    pub role_name: String,
}

impl ActorInfo {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: SpawnClass::new(class),
            role_name: String::new(),
        }
    }

    pub fn with_role(mut self, role_name: impl Into<String>) -> Self {
        self.role_name = role_name.into();
        self
    }
}

impl Encode for ActorInfo {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.class.encode(w)?;
        self.role_name.encode(w)
    }
}

impl Decode for ActorInfo {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        Ok(Self {
            class: SpawnClass::decode(r)?,
            role_name: String::decode(r)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ActorKind {
    #[default]
    Actor = 0,
    Vehicle = 1,
    Walker = 2,
    TrafficSign = 3,
    TrafficLight = 4,
    Sensor = 5,
}

impl ActorKind {
    pub const ALL: [ActorKind; 6] = [
        Self::Actor,
        Self::Vehicle,
        Self::Walker,
        Self::TrafficSign,
        Self::TrafficLight,
        Self::Sensor,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Actor => "actor",
            Self::Vehicle => "vehicle",
            Self::Walker => "walker",
            Self::TrafficSign => "traffic sign",
            Self::TrafficLight => "traffic light",
            Self::Sensor => "sensor",
        }
    }
}

codec::wire_enum!(ActorKind as u8 {
    Actor,
    Vehicle,
    Walker,
    TrafficSign,
    TrafficLight,
    Sensor,
});

/// Engine-space transform of a live actor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.translation + self.rotation * (self.scale * point)
    }
}
