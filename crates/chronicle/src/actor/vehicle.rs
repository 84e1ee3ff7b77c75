use std::io::{Read, Write};

use bitflags::bitflags;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::codec::{self, CodecError, Decode, Encode};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VehicleControl {
    pub throttle: f32,
    pub steer: f32,
    pub brake: f32,
    pub hand_brake: bool,
    pub reverse: bool,
    pub manual_gear_shift: bool,
    pub gear: i32,
}

impl Encode for VehicleControl {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.throttle.encode(w)?;
        self.steer.encode(w)?;
        self.brake.encode(w)?;
        self.hand_brake.encode(w)?;
        self.reverse.encode(w)?;
        self.manual_gear_shift.encode(w)?;
        self.gear.encode(w)
    }
}

impl Decode for VehicleControl {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        Ok(Self {
            throttle: f32::decode(r)?,
            steer: f32::decode(r)?,
            brake: f32::decode(r)?,
            hand_brake: bool::decode(r)?,
            reverse: bool::decode(r)?,
            manual_gear_shift: bool::decode(r)?,
            gear: i32::decode(r)?,
        })
    }
}

/// Steering by curvature and speed targets instead of raw pedal inputs.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VehicleAckermannControl {
    pub steer: f32,
    pub steer_speed: f32,
    pub speed: f32,
    pub acceleration: f32,
    pub jerk: f32,
}

impl Encode for VehicleAckermannControl {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.steer.encode(w)?;
        self.steer_speed.encode(w)?;
        self.speed.encode(w)?;
        self.acceleration.encode(w)?;
        self.jerk.encode(w)
    }
}

impl Decode for VehicleAckermannControl {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        Ok(Self {
            steer: f32::decode(r)?,
            steer_speed: f32::decode(r)?,
            speed: f32::decode(r)?,
            acceleration: f32::decode(r)?,
            jerk: f32::decode(r)?,
        })
    }
}

/// PID gains of the Ackermann speed and acceleration loops.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AckermannControllerSettings {
    pub speed_kp: f32,
    pub speed_ki: f32,
    pub speed_kd: f32,
    pub accel_kp: f32,
    pub accel_ki: f32,
    pub accel_kd: f32,
}

impl Default for AckermannControllerSettings {
    fn default() -> Self {
        Self {
            speed_kp: 0.15,
            speed_ki: 0.0,
            speed_kd: 0.25,
            accel_kp: 0.01,
            accel_ki: 0.0,
            accel_kd: 0.01,
        }
    }
}

impl Encode for AckermannControllerSettings {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.speed_kp.encode(w)?;
        self.speed_ki.encode(w)?;
        self.speed_kd.encode(w)?;
        self.accel_kp.encode(w)?;
        self.accel_ki.encode(w)?;
        self.accel_kd.encode(w)
    }
}

impl Decode for AckermannControllerSettings {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        Ok(Self {
            speed_kp: f32::decode(r)?,
            speed_ki: f32::decode(r)?,
            speed_kd: f32::decode(r)?,
            accel_kp: f32::decode(r)?,
            accel_ki: f32::decode(r)?,
            accel_kd: f32::decode(r)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GearPhysicsControl {
    pub ratio: f32,
    pub down_ratio: f32,
    pub up_ratio: f32,
}

impl Default for GearPhysicsControl {
    fn default() -> Self {
        Self {
            ratio: 1.0,
            down_ratio: 0.5,
            up_ratio: 0.65,
        }
    }
}

impl Encode for GearPhysicsControl {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.ratio.encode(w)?;
        self.down_ratio.encode(w)?;
        self.up_ratio.encode(w)
    }
}

impl Decode for GearPhysicsControl {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        Ok(Self {
            ratio: f32::decode(r)?,
            down_ratio: f32::decode(r)?,
            up_ratio: f32::decode(r)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelPhysicsControl {
    pub tire_friction: f32,
    pub damping_rate: f32,
    pub max_steer_angle: f32,
    pub radius: f32,
    pub max_brake_torque: f32,
    pub max_handbrake_torque: f32,
    pub position: Vec3,
}

impl Default for WheelPhysicsControl {
    fn default() -> Self {
        Self {
            tire_friction: 3.5,
            damping_rate: 0.25,
            max_steer_angle: 70.0,
            radius: 30.0,
            max_brake_torque: 1500.0,
            max_handbrake_torque: 3000.0,
            position: Vec3::ZERO,
        }
    }
}

impl Encode for WheelPhysicsControl {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.tire_friction.encode(w)?;
        self.damping_rate.encode(w)?;
        self.max_steer_angle.encode(w)?;
        self.radius.encode(w)?;
        self.max_brake_torque.encode(w)?;
        self.max_handbrake_torque.encode(w)?;
        self.position.encode(w)
    }
}

impl Decode for WheelPhysicsControl {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        Ok(Self {
            tire_friction: f32::decode(r)?,
            damping_rate: f32::decode(r)?,
            max_steer_angle: f32::decode(r)?,
            radius: f32::decode(r)?,
            max_brake_torque: f32::decode(r)?,
            max_handbrake_torque: f32::decode(r)?,
            position: Vec3::decode(r)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehiclePhysicsControl {
    pub torque_curve: Vec<Vec2>,
    pub max_rpm: f32,
    pub moi: f32,
    pub damping_rate_full_throttle: f32,
    pub damping_rate_zero_throttle_clutch_engaged: f32,
    pub damping_rate_zero_throttle_clutch_disengaged: f32,
    pub use_gear_autobox: bool,
    pub gear_switch_time: f32,
    pub clutch_strength: f32,
    pub final_ratio: f32,
    pub forward_gears: Vec<GearPhysicsControl>,
    pub mass: f32,
    pub drag_coefficient: f32,
    pub center_of_mass: Vec3,
    pub steering_curve: Vec<Vec2>,
    pub wheels: Vec<WheelPhysicsControl>,
    pub use_sweep_wheel_collision: bool,
}

impl Default for VehiclePhysicsControl {
    fn default() -> Self {
        Self {
            torque_curve: vec![Vec2::new(0.0, 500.0), Vec2::new(5000.0, 500.0)],
            max_rpm: 5000.0,
            moi: 1.0,
            damping_rate_full_throttle: 0.15,
            damping_rate_zero_throttle_clutch_engaged: 2.0,
            damping_rate_zero_throttle_clutch_disengaged: 0.35,
            use_gear_autobox: true,
            gear_switch_time: 0.5,
            clutch_strength: 10.0,
            final_ratio: 4.0,
            forward_gears: Vec::new(),
            mass: 1000.0,
            drag_coefficient: 0.3,
            center_of_mass: Vec3::ZERO,
            steering_curve: vec![Vec2::new(0.0, 1.0), Vec2::new(10.0, 0.5)],
            wheels: Vec::new(),
            use_sweep_wheel_collision: false,
        }
    }
}

impl Encode for VehiclePhysicsControl {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.torque_curve.encode(w)?;
        self.max_rpm.encode(w)?;
        self.moi.encode(w)?;
        self.damping_rate_full_throttle.encode(w)?;
        self.damping_rate_zero_throttle_clutch_engaged.encode(w)?;
        self.damping_rate_zero_throttle_clutch_disengaged.encode(w)?;
        self.use_gear_autobox.encode(w)?;
        self.gear_switch_time.encode(w)?;
        self.clutch_strength.encode(w)?;
        self.final_ratio.encode(w)?;
        self.forward_gears.encode(w)?;
        self.mass.encode(w)?;
        self.drag_coefficient.encode(w)?;
        self.center_of_mass.encode(w)?;
        self.steering_curve.encode(w)?;
        self.wheels.encode(w)?;
        self.use_sweep_wheel_collision.encode(w)
    }
}

impl Decode for VehiclePhysicsControl {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        Ok(Self {
            torque_curve: Vec::decode(r)?,
            max_rpm: f32::decode(r)?,
            moi: f32::decode(r)?,
            damping_rate_full_throttle: f32::decode(r)?,
            damping_rate_zero_throttle_clutch_engaged: f32::decode(r)?,
            damping_rate_zero_throttle_clutch_disengaged: f32::decode(r)?,
            use_gear_autobox: bool::decode(r)?,
            gear_switch_time: f32::decode(r)?,
            clutch_strength: f32::decode(r)?,
            final_ratio: f32::decode(r)?,
            forward_gears: Vec::decode(r)?,
            mass: f32::decode(r)?,
            drag_coefficient: f32::decode(r)?,
            center_of_mass: Vec3::decode(r)?,
            steering_curve: Vec::decode(r)?,
            wheels: Vec::decode(r)?,
            use_sweep_wheel_collision: bool::decode(r)?,
        })
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct VehicleLightState: u32 {
        const POSITION = 1 << 0;
        const LOW_BEAM = 1 << 1;
        const HIGH_BEAM = 1 << 2;
        const BRAKE = 1 << 3;
        const RIGHT_BLINKER = 1 << 4;
        const LEFT_BLINKER = 1 << 5;
        const REVERSE = 1 << 6;
        const FOG = 1 << 7;
        const INTERIOR = 1 << 8;
        const SPECIAL1 = 1 << 9;
        const SPECIAL2 = 1 << 10;
    }
}

// Unknown bits are kept so newer writers' lights survive a rewrite.
impl Encode for VehicleLightState {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.bits().encode(w)
    }
}

impl Decode for VehicleLightState {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        Ok(Self::from_bits_retain(u32::decode(r)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum VehicleFailureState {
    #[default]
    None = 0,
    Rollover = 1,
    Engine = 2,
    TirePuncture = 3,
}

codec::wire_enum!(VehicleFailureState as u8 {
    None,
    Rollover,
    Engine,
    TirePuncture,
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleData {
    pub physics_control: VehiclePhysicsControl,
    pub control: VehicleControl,
    pub ackermann_control: VehicleAckermannControl,
    pub ackermann_control_active: bool,
    pub ackermann_settings: AckermannControllerSettings,
    pub light_state: VehicleLightState,
    pub speed_limit: f32,
    pub failure_state: VehicleFailureState,
}

impl VehicleData {
    pub const DEFAULT_SPEED_LIMIT: f32 = 30.0;
}

impl Default for VehicleData {
    fn default() -> Self {
        Self {
            physics_control: VehiclePhysicsControl::default(),
            control: VehicleControl::default(),
            ackermann_control: VehicleAckermannControl::default(),
            ackermann_control_active: false,
            ackermann_settings: AckermannControllerSettings::default(),
            light_state: VehicleLightState::empty(),
            speed_limit: Self::DEFAULT_SPEED_LIMIT,
            failure_state: VehicleFailureState::None,
        }
    }
}

impl Encode for VehicleData {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.physics_control.encode(w)?;
        self.control.encode(w)?;
        self.ackermann_control.encode(w)?;
        self.ackermann_control_active.encode(w)?;
        self.ackermann_settings.encode(w)?;
        self.light_state.encode(w)?;
        self.speed_limit.encode(w)?;
        self.failure_state.encode(w)
    }
}

impl Decode for VehicleData {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        Ok(Self {
            physics_control: VehiclePhysicsControl::decode(r)?,
            control: VehicleControl::decode(r)?,
            ackermann_control: VehicleAckermannControl::decode(r)?,
            ackermann_control_active: bool::decode(r)?,
            ackermann_settings: AckermannControllerSettings::decode(r)?,
            light_state: VehicleLightState::decode(r)?,
            speed_limit: f32::decode(r)?,
            failure_state: VehicleFailureState::decode(r)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum WheelLocation {
    #[default]
    FrontLeft = 0,
    FrontRight = 1,
    BackLeft = 2,
    BackRight = 3,
    /// Single front wheel of a two-wheeler.
    Front = 4,
    Back = 5,
}

codec::wire_enum!(WheelLocation as u32 {
    FrontLeft,
    FrontRight,
    BackLeft,
    BackRight,
    Front,
    Back,
});

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WheelSample {
    pub location: WheelLocation,
    pub steering_angle: f32,
    pub tire_rotation: f32,
}

impl WheelSample {
    /// Bytes per sample on the wire.
    pub const ENCODED_LEN: usize = 12;

    pub fn new(location: WheelLocation, steering_angle: f32, tire_rotation: f32) -> Self {
        Self {
            location,
            steering_angle,
            tire_rotation,
        }
    }
}

impl Encode for WheelSample {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.location.encode(w)?;
        self.steering_angle.encode(w)?;
        self.tire_rotation.encode(w)
    }
}

impl Decode for WheelSample {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        Ok(Self {
            location: WheelLocation::decode(r)?,
            steering_angle: f32::decode(r)?,
            tire_rotation: f32::decode(r)?,
        })
    }
}

/// Wheel animation of one vehicle for one frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VehicleWheels {
    pub database_id: u32,
    pub wheels: Vec<WheelSample>,
}

impl Encode for VehicleWheels {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.database_id.encode(w)?;
        codec::write_seq(w, &self.wheels)
    }
}

impl Decode for VehicleWheels {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        Ok(Self {
            database_id: u32::decode(r)?,
            wheels: codec::read_seq(r)?,
        })
    }
}
