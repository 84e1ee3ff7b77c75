use std::io::{Read, Write};

use glam::{DVec3, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::codec::{CodecError, Decode, Encode};
use crate::episode::{Episode, LiveActor};
use crate::error::{RestoreError, SpawnError};

use super::{
    ActorId, ActorInfo, ActorKind, SensorData, TrafficLightData, TrafficSignData, Transform,
    VehicleData, WalkerData,
};

/// State every recorded actor carries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    /// Global position, i.e. world origin plus engine translation.
    pub position: DVec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub simulate_physics: bool,
}

impl Default for Kinematics {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            simulate_physics: false,
        }
    }
}

impl Kinematics {
    pub const ENCODED_LEN: usize = 24 + 16 + 12 + 12 + 12 + 1;

    pub fn capture(actor: &dyn LiveActor, origin: DVec3) -> Self {
        let transform = actor.transform();
        Self {
            position: origin + transform.translation.as_dvec3(),
            rotation: transform.rotation.normalize(),
            scale: transform.scale,
            velocity: actor.velocity(),
            angular_velocity: actor.angular_velocity(),
            simulate_physics: actor.simulate_physics(),
        }
    }

    pub fn local_transform(&self, origin: DVec3) -> Transform {
        Transform {
            translation: (self.position - origin).as_vec3(),
            rotation: self.rotation,
            scale: self.scale,
        }
    }

    pub fn apply(&self, actor: &mut dyn LiveActor, origin: DVec3) {
        actor.set_transform(self.local_transform(origin));
        actor.set_velocity(self.velocity);
        actor.set_angular_velocity(self.angular_velocity);
        actor.set_simulate_physics(self.simulate_physics);
    }
}

impl Encode for Kinematics {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.position.encode(w)?;
        self.rotation.encode(w)?;
        self.scale.encode(w)?;
        self.velocity.encode(w)?;
        self.angular_velocity.encode(w)?;
        self.simulate_physics.encode(w)
    }
}

impl Decode for Kinematics {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        Ok(Self {
            position: DVec3::decode(r)?,
            rotation: Quat::decode(r)?,
            scale: Vec3::decode(r)?,
            velocity: Vec3::decode(r)?,
            angular_velocity: Vec3::decode(r)?,
            simulate_physics: bool::decode(r)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActorData {
    Actor,
    Vehicle(VehicleData),
    Walker(WalkerData),
    TrafficSign(TrafficSignData),
    TrafficLight(TrafficLightData),
    Sensor(SensorData),
}

impl ActorData {
    pub fn kind(&self) -> ActorKind {
        match self {
            Self::Actor => ActorKind::Actor,
            Self::Vehicle(_) => ActorKind::Vehicle,
            Self::Walker(_) => ActorKind::Walker,
            Self::TrafficSign(_) => ActorKind::TrafficSign,
            Self::TrafficLight(_) => ActorKind::TrafficLight,
            Self::Sensor(_) => ActorKind::Sensor,
        }
    }

    pub fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        match self {
            Self::Actor | Self::Sensor(_) => Ok(()),
            Self::Vehicle(data) => data.encode(w),
            Self::Walker(data) => data.encode(w),
            Self::TrafficSign(data) => data.encode(w),
            Self::TrafficLight(data) => data.encode(w),
        }
    }

    /// Reads the kind-specific fields; the kind itself comes from the
    /// packet tag or the preceding kind byte.
    pub fn decode(kind: ActorKind, r: &mut dyn Read) -> Result<Self, CodecError> {
        Ok(match kind {
            ActorKind::Actor => Self::Actor,
            ActorKind::Vehicle => Self::Vehicle(VehicleData::decode(r)?),
            ActorKind::Walker => Self::Walker(WalkerData::decode(r)?),
            ActorKind::TrafficSign => Self::TrafficSign(TrafficSignData::decode(r)?),
            ActorKind::TrafficLight => Self::TrafficLight(TrafficLightData::decode(r)?),
            ActorKind::Sensor => Self::Sensor(SensorData::default()),
        })
    }

    fn capture(episode: &dyn Episode, id: ActorId, actor: &dyn LiveActor) -> Self {
        if let Some(vehicle) = actor.vehicle() {
            return Self::Vehicle(VehicleData {
                physics_control: vehicle.physics_control(),
                control: vehicle.control(),
                ackermann_control: vehicle.ackermann_control(),
                ackermann_control_active: vehicle.ackermann_control_active(),
                ackermann_settings: vehicle.ackermann_settings(),
                light_state: vehicle.light_state(),
                speed_limit: vehicle.speed_limit(),
                failure_state: vehicle.failure_state(),
            });
        }
        if let Some(walker) = actor.walker() {
            return Self::Walker(WalkerData {
                control: walker.control(),
                alive: walker.is_alive(),
            });
        }
        if let Some(light) = actor.traffic_light() {
            return Self::TrafficLight(TrafficLightData {
                controller: episode.controllers().controller_of(id).cloned(),
                light_state: light.light_state(),
                sign_id: light.sign_id(),
                model: light.model(),
                pole_index: light.pole_index(),
            });
        }
        if let Some(sign) = actor.traffic_sign() {
            return Self::TrafficSign(TrafficSignData {
                sign_id: sign.sign_id(),
                model: sign.model(),
                sign_model: sign.sign_model(),
            });
        }
        if let Some(sensor) = actor.sensor() {
            return Self::Sensor(SensorData {
                stream: sensor.stream(),
            });
        }
        Self::Actor
    }

    fn fits(&self, actor: &dyn LiveActor) -> bool {
        match self {
            Self::Actor => true,
            Self::Vehicle(_) => actor.vehicle().is_some(),
            Self::Walker(_) => actor.walker().is_some(),
            Self::TrafficSign(_) => actor.traffic_sign().is_some(),
            Self::TrafficLight(_) => actor.traffic_light().is_some(),
            Self::Sensor(_) => actor.sensor().is_some(),
        }
    }

    fn apply(&self, actor: &mut dyn LiveActor) {
        match self {
            Self::Actor => {}
            Self::Vehicle(data) => {
                if let Some(vehicle) = actor.vehicle_mut() {
                    vehicle.set_physics_control(&data.physics_control);
                    if data.ackermann_control_active {
                        vehicle.apply_ackermann_control(data.ackermann_control);
                    } else {
                        vehicle.apply_control(data.control);
                    }
                    vehicle.set_ackermann_settings(data.ackermann_settings);
                    vehicle.set_light_state(data.light_state);
                    vehicle.set_speed_limit(data.speed_limit);
                    vehicle.set_failure_state(data.failure_state);
                }
            }
            Self::Walker(data) => {
                if let Some(walker) = actor.walker_mut() {
                    walker.apply_control(data.control);
                    walker.set_alive(data.alive);
                }
            }
            Self::TrafficSign(data) => {
                if let Some(sign) = actor.traffic_sign_mut() {
                    sign.set_sign_id(&data.sign_id);
                    sign.set_sign_model(&data.sign_model);
                }
            }
            Self::TrafficLight(data) => {
                if let Some(light) = actor.traffic_light_mut() {
                    light.set_light_state(data.light_state);
                    light.set_sign_id(&data.sign_id);
                    light.set_pole_index(data.pole_index);
                }
            }
            Self::Sensor(data) => {
                if let (Some(stream), Some(sensor)) = (data.stream, actor.sensor_mut()) {
                    sensor.attach_stream(stream);
                }
            }
        }
    }
}

/// Captured state of one actor at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    pub kinematics: Kinematics,
    pub data: ActorData,
}

impl ActorSnapshot {
    pub fn new(kinematics: Kinematics, data: ActorData) -> Self {
        Self { kinematics, data }
    }

    pub fn kind(&self) -> ActorKind {
        self.data.kind()
    }

    /// Captures the actor behind `id`, or `None` when it is not live.
    pub fn record(episode: &dyn Episode, id: ActorId) -> Option<Self> {
        let actor = episode.actor(id)?;
        Some(Self {
            kinematics: Kinematics::capture(actor, episode.world_origin()),
            data: ActorData::capture(episode, id, actor),
        })
    }

    /// Writes the snapshot back onto a live actor.
    ///
    /// Every precondition is checked before the first setter runs, so a
    /// failed restore leaves the actor untouched. Restoring the same
    /// snapshot twice yields the same state as restoring it once.
    pub fn restore(&self, episode: &mut dyn Episode, id: ActorId) -> Result<(), RestoreError> {
        let controller = match &self.data {
            ActorData::TrafficLight(TrafficLightData {
                controller: Some(controller),
                ..
            }) => {
                if !episode.controllers().contains(controller) {
                    return Err(RestoreError::UnknownController {
                        controller: controller.clone(),
                    });
                }
                Some(controller)
            }
            _ => None,
        };

        let origin = episode.world_origin();
        let actor = episode
            .actor_mut(id)
            .ok_or(RestoreError::MissingEntity { id })?;
        if !self.data.fits(&*actor) {
            return Err(RestoreError::kind_mismatch(id, self.kind()));
        }
        self.kinematics.apply(actor, origin);
        self.data.apply(actor);

        if let Some(controller) = controller {
            episode.controllers_mut().attach(controller, id);
        }
        Ok(())
    }

    /// Spawns a new actor for this snapshot.
    ///
    /// Signs and lights spawn from their recorded model and get their
    /// identity fields set right away; everything else spawns `info.class`.
    pub fn respawn(&self, episode: &mut dyn Episode, info: &ActorInfo) -> Result<ActorId, SpawnError> {
        let transform = self.local_transform(&*episode);
        match &self.data {
            ActorData::TrafficSign(sign) => {
                let class = if sign.model.is_empty() { &info.class } else { &sign.model };
                let id = episode.spawn(class, &transform)?;
                if let Some(surface) = episode.actor_mut(id).and_then(|a| a.traffic_sign_mut()) {
                    surface.set_sign_id(&sign.sign_id);
                    surface.set_sign_model(&sign.sign_model);
                }
                Ok(id)
            }
            ActorData::TrafficLight(light) => {
                let class = if light.model.is_empty() { &info.class } else { &light.model };
                let id = episode.spawn(class, &transform)?;
                if let Some(surface) = episode.actor_mut(id).and_then(|a| a.traffic_light_mut()) {
                    surface.set_sign_id(&light.sign_id);
                    surface.set_light_state(light.light_state);
                    surface.set_pole_index(light.pole_index);
                }
                if let Some(controller) = &light.controller {
                    if !episode.controllers_mut().attach(controller, id) {
                        log::warn!("respawned light {id} refers to unknown controller {controller}");
                    }
                }
                Ok(id)
            }
            _ => episode.spawn(&info.class, &transform),
        }
    }

    pub fn local_transform(&self, episode: &dyn Episode) -> Transform {
        self.kinematics.local_transform(episode.world_origin())
    }

    /// Record body inside a per-kind packet, where the tag implies the kind.
    pub fn encode_body(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.kinematics.encode(w)?;
        self.data.encode(w)
    }

    pub fn decode_body(kind: ActorKind, r: &mut dyn Read) -> Result<Self, CodecError> {
        let kinematics = Kinematics::decode(r)?;
        let data = ActorData::decode(kind, r)?;
        Ok(Self { kinematics, data })
    }
}

/// Self-describing form: a kind byte, then the body.
impl Encode for ActorSnapshot {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.kind().encode(w)?;
        self.encode_body(w)
    }
}

impl Decode for ActorSnapshot {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        let kind = ActorKind::decode(r)?;
        Self::decode_body(kind, r)
    }
}
