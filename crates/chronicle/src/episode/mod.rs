mod controller;
mod world;

use glam::{DVec3, Vec3};

use crate::actor::{
    AckermannControllerSettings, ActorId, ActorInfo, SpawnClass, StreamToken, TrafficLightState,
    Transform, VehicleAckermannControl, VehicleControl, VehicleFailureState, VehicleLightState,
    VehiclePhysicsControl, WalkerControl, WheelSample,
};
use crate::error::SpawnError;

pub use controller::{ControllerRegistry, TrafficLightController};
pub use world::{
    Actor, LightState, SensorState, SignState, Surface, VehicleState, WalkerState, World,
};

pub trait Episode {
    /// Offset of the engine origin inside the global double-precision frame.
    fn world_origin(&self) -> DVec3 {
        DVec3::ZERO
    }

    fn spawn(&mut self, class: &SpawnClass, transform: &Transform) -> Result<ActorId, SpawnError>;

    fn destroy(&mut self, id: ActorId) -> bool;

    fn actor(&self, id: ActorId) -> Option<&dyn LiveActor>;

    fn actor_mut(&mut self, id: ActorId) -> Option<&mut dyn LiveActor>;

    fn actor_ids(&self) -> Vec<ActorId>;

    fn controllers(&self) -> &ControllerRegistry;

    fn controllers_mut(&mut self) -> &mut ControllerRegistry;
}

pub trait LiveActor {
    fn info(&self) -> ActorInfo;

    fn transform(&self) -> Transform;
    fn set_transform(&mut self, transform: Transform);

    fn velocity(&self) -> Vec3;
    fn set_velocity(&mut self, velocity: Vec3);

    fn angular_velocity(&self) -> Vec3;
    fn set_angular_velocity(&mut self, velocity: Vec3);

    fn simulate_physics(&self) -> bool;
    fn set_simulate_physics(&mut self, enabled: bool);

    fn vehicle(&self) -> Option<&dyn VehicleSurface> {
        None
    }
    fn vehicle_mut(&mut self) -> Option<&mut dyn VehicleSurface> {
        None
    }

    fn walker(&self) -> Option<&dyn WalkerSurface> {
        None
    }
    fn walker_mut(&mut self) -> Option<&mut dyn WalkerSurface> {
        None
    }

    fn traffic_sign(&self) -> Option<&dyn TrafficSignSurface> {
        None
    }
    fn traffic_sign_mut(&mut self) -> Option<&mut dyn TrafficSignSurface> {
        None
    }

    fn traffic_light(&self) -> Option<&dyn TrafficLightSurface> {
        None
    }
    fn traffic_light_mut(&mut self) -> Option<&mut dyn TrafficLightSurface> {
        None
    }

    fn sensor(&self) -> Option<&dyn SensorSurface> {
        None
    }
    fn sensor_mut(&mut self) -> Option<&mut dyn SensorSurface> {
        None
    }
}

pub trait VehicleSurface {
    fn physics_control(&self) -> VehiclePhysicsControl;
    fn set_physics_control(&mut self, control: &VehiclePhysicsControl);

    fn control(&self) -> VehicleControl;
    /// Drives the vehicle with pedal inputs and leaves Ackermann mode.
    fn apply_control(&mut self, control: VehicleControl);

    fn ackermann_control(&self) -> VehicleAckermannControl;
    /// Drives the vehicle with the Ackermann law and enters Ackermann mode.
    fn apply_ackermann_control(&mut self, control: VehicleAckermannControl);
    fn ackermann_control_active(&self) -> bool;

    fn ackermann_settings(&self) -> AckermannControllerSettings;
    fn set_ackermann_settings(&mut self, settings: AckermannControllerSettings);

    fn light_state(&self) -> VehicleLightState;
    fn set_light_state(&mut self, state: VehicleLightState);

    fn speed_limit(&self) -> f32;
    fn set_speed_limit(&mut self, limit: f32);

    fn failure_state(&self) -> VehicleFailureState;
    fn set_failure_state(&mut self, state: VehicleFailureState);

    fn wheels(&self) -> Vec<WheelSample> {
        Vec::new()
    }
    fn pose_wheels(&mut self, _wheels: &[WheelSample]) {}
}

pub trait WalkerSurface {
    fn control(&self) -> WalkerControl;
    fn apply_control(&mut self, control: WalkerControl);

    fn is_alive(&self) -> bool;
    fn set_alive(&mut self, alive: bool);
}

pub trait TrafficSignSurface {
    fn sign_id(&self) -> String;
    fn set_sign_id(&mut self, sign_id: &str);

    fn model(&self) -> SpawnClass;

    fn sign_model(&self) -> SpawnClass;
    fn set_sign_model(&mut self, model: &SpawnClass);
}

pub trait TrafficLightSurface {
    fn light_state(&self) -> TrafficLightState;
    fn set_light_state(&mut self, state: TrafficLightState);

    fn sign_id(&self) -> String;
    fn set_sign_id(&mut self, sign_id: &str);

    fn model(&self) -> SpawnClass;

    fn pole_index(&self) -> i32;
    fn set_pole_index(&mut self, index: i32);
}

pub trait SensorSurface {
    fn stream(&self) -> Option<StreamToken>;
    fn attach_stream(&mut self, stream: StreamToken);
}
