use std::collections::{HashMap, HashSet};

use glam::{DVec3, Vec3};

use crate::actor::{
    AckermannControllerSettings, ActorId, ActorInfo, SpawnClass, StreamToken, TrafficLightState,
    Transform, VehicleAckermannControl, VehicleControl, VehicleData, VehicleFailureState,
    VehicleLightState, VehiclePhysicsControl, WalkerControl, WheelLocation, WheelSample,
};
use crate::error::SpawnError;

use super::{
    ControllerRegistry, Episode, LiveActor, SensorSurface, TrafficLightSurface,
    TrafficSignSurface, VehicleSurface, WalkerSurface,
};

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleState {
    pub physics_control: VehiclePhysicsControl,
    pub control: VehicleControl,
    pub ackermann_control: VehicleAckermannControl,
    pub ackermann_active: bool,
    pub ackermann_settings: AckermannControllerSettings,
    pub light_state: VehicleLightState,
    pub speed_limit: f32,
    pub failure_state: VehicleFailureState,
    pub wheels: Vec<WheelSample>,
}

impl Default for VehicleState {
    fn default() -> Self {
        let wheels = [
            WheelLocation::FrontLeft,
            WheelLocation::FrontRight,
            WheelLocation::BackLeft,
            WheelLocation::BackRight,
        ]
        .into_iter()
        .map(|location| WheelSample::new(location, 0.0, 0.0))
        .collect();

        Self {
            physics_control: VehiclePhysicsControl::default(),
            control: VehicleControl::default(),
            ackermann_control: VehicleAckermannControl::default(),
            ackermann_active: false,
            ackermann_settings: AckermannControllerSettings::default(),
            light_state: VehicleLightState::empty(),
            speed_limit: VehicleData::DEFAULT_SPEED_LIMIT,
            failure_state: VehicleFailureState::None,
            wheels,
        }
    }
}

impl VehicleSurface for VehicleState {
    fn physics_control(&self) -> VehiclePhysicsControl {
        self.physics_control.clone()
    }

    fn set_physics_control(&mut self, control: &VehiclePhysicsControl) {
        self.physics_control = control.clone();
    }

    fn control(&self) -> VehicleControl {
        self.control
    }

    fn apply_control(&mut self, control: VehicleControl) {
        self.control = control;
        self.ackermann_active = false;
    }

    fn ackermann_control(&self) -> VehicleAckermannControl {
        self.ackermann_control
    }

    fn apply_ackermann_control(&mut self, control: VehicleAckermannControl) {
        self.ackermann_control = control;
        self.ackermann_active = true;
    }

    fn ackermann_control_active(&self) -> bool {
        self.ackermann_active
    }

    fn ackermann_settings(&self) -> AckermannControllerSettings {
        self.ackermann_settings
    }

    fn set_ackermann_settings(&mut self, settings: AckermannControllerSettings) {
        self.ackermann_settings = settings;
    }

    fn light_state(&self) -> VehicleLightState {
        self.light_state
    }

    fn set_light_state(&mut self, state: VehicleLightState) {
        self.light_state = state;
    }

    fn speed_limit(&self) -> f32 {
        self.speed_limit
    }

    fn set_speed_limit(&mut self, limit: f32) {
        self.speed_limit = limit;
    }

    fn failure_state(&self) -> VehicleFailureState {
        self.failure_state
    }

    fn set_failure_state(&mut self, state: VehicleFailureState) {
        self.failure_state = state;
    }

    fn wheels(&self) -> Vec<WheelSample> {
        self.wheels.clone()
    }

    fn pose_wheels(&mut self, wheels: &[WheelSample]) {
        for sample in wheels {
            match self.wheels.iter_mut().find(|w| w.location == sample.location) {
                Some(wheel) => *wheel = *sample,
                None => self.wheels.push(*sample),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkerState {
    pub control: WalkerControl,
    pub alive: bool,
}

impl Default for WalkerState {
    fn default() -> Self {
        Self {
            control: WalkerControl::default(),
            alive: true,
        }
    }
}

impl WalkerSurface for WalkerState {
    fn control(&self) -> WalkerControl {
        self.control
    }

    fn apply_control(&mut self, control: WalkerControl) {
        self.control = control;
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn set_alive(&mut self, alive: bool) {
        self.alive = alive;
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignState {
    pub sign_id: String,
    pub model: SpawnClass,
    pub sign_model: SpawnClass,
}

impl TrafficSignSurface for SignState {
    fn sign_id(&self) -> String {
        self.sign_id.clone()
    }

    fn set_sign_id(&mut self, sign_id: &str) {
        self.sign_id = sign_id.to_string();
    }

    fn model(&self) -> SpawnClass {
        self.model.clone()
    }

    fn sign_model(&self) -> SpawnClass {
        self.sign_model.clone()
    }

    fn set_sign_model(&mut self, model: &SpawnClass) {
        self.sign_model = model.clone();
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LightState {
    pub state: TrafficLightState,
    pub sign_id: String,
    pub model: SpawnClass,
    pub pole_index: i32,
}

impl TrafficLightSurface for LightState {
    fn light_state(&self) -> TrafficLightState {
        self.state
    }

    fn set_light_state(&mut self, state: TrafficLightState) {
        self.state = state;
    }

    fn sign_id(&self) -> String {
        self.sign_id.clone()
    }

    fn set_sign_id(&mut self, sign_id: &str) {
        self.sign_id = sign_id.to_string();
    }

    fn model(&self) -> SpawnClass {
        self.model.clone()
    }

    fn pole_index(&self) -> i32 {
        self.pole_index
    }

    fn set_pole_index(&mut self, index: i32) {
        self.pole_index = index;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorState {
    pub stream: Option<StreamToken>,
}

impl SensorSurface for SensorState {
    fn stream(&self) -> Option<StreamToken> {
        self.stream
    }

    fn attach_stream(&mut self, stream: StreamToken) {
        self.stream = Some(stream);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Surface {
    #[default]
    None,
    Vehicle(VehicleState),
    Walker(WalkerState),
    TrafficSign(SignState),
    TrafficLight(LightState),
    Sensor(SensorState),
}

impl Surface {
    /// Picks the control surface from the spawn class prefix.
    pub fn for_class(class: &SpawnClass) -> Self {
        let name = class.as_str();
        if name.starts_with("vehicle.") {
            Self::Vehicle(VehicleState::default())
        } else if name.starts_with("walker.") {
            Self::Walker(WalkerState::default())
        } else if name.starts_with("traffic.traffic_light") {
            Self::TrafficLight(LightState {
                model: class.clone(),
                ..LightState::default()
            })
        } else if name.starts_with("traffic.") || name.starts_with("static.prop.sign") {
            Self::TrafficSign(SignState {
                model: class.clone(),
                ..SignState::default()
            })
        } else if name.starts_with("sensor.") {
            Self::Sensor(SensorState::default())
        } else {
            Self::None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub id: ActorId,
    pub info: ActorInfo,
    pub transform: Transform,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub simulate_physics: bool,
    pub surface: Surface,
}

impl Actor {
    pub fn new(id: ActorId, info: ActorInfo, transform: Transform) -> Self {
        let surface = Surface::for_class(&info.class);
        Self {
            id,
            info,
            transform,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            simulate_physics: false,
            surface,
        }
    }
}

impl LiveActor for Actor {
    fn info(&self) -> ActorInfo {
        self.info.clone()
    }

    fn transform(&self) -> Transform {
        self.transform
    }

    fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    fn set_angular_velocity(&mut self, velocity: Vec3) {
        self.angular_velocity = velocity;
    }

    fn simulate_physics(&self) -> bool {
        self.simulate_physics
    }

    fn set_simulate_physics(&mut self, enabled: bool) {
        self.simulate_physics = enabled;
    }

    fn vehicle(&self) -> Option<&dyn VehicleSurface> {
        match &self.surface {
            Surface::Vehicle(state) => Some(state),
            _ => None,
        }
    }

    fn vehicle_mut(&mut self) -> Option<&mut dyn VehicleSurface> {
        match &mut self.surface {
            Surface::Vehicle(state) => Some(state),
            _ => None,
        }
    }

    fn walker(&self) -> Option<&dyn WalkerSurface> {
        match &self.surface {
            Surface::Walker(state) => Some(state),
            _ => None,
        }
    }

    fn walker_mut(&mut self) -> Option<&mut dyn WalkerSurface> {
        match &mut self.surface {
            Surface::Walker(state) => Some(state),
            _ => None,
        }
    }

    fn traffic_sign(&self) -> Option<&dyn TrafficSignSurface> {
        match &self.surface {
            Surface::TrafficSign(state) => Some(state),
            _ => None,
        }
    }

    fn traffic_sign_mut(&mut self) -> Option<&mut dyn TrafficSignSurface> {
        match &mut self.surface {
            Surface::TrafficSign(state) => Some(state),
            _ => None,
        }
    }

    fn traffic_light(&self) -> Option<&dyn TrafficLightSurface> {
        match &self.surface {
            Surface::TrafficLight(state) => Some(state),
            _ => None,
        }
    }

    fn traffic_light_mut(&mut self) -> Option<&mut dyn TrafficLightSurface> {
        match &mut self.surface {
            Surface::TrafficLight(state) => Some(state),
            _ => None,
        }
    }

    fn sensor(&self) -> Option<&dyn SensorSurface> {
        match &self.surface {
            Surface::Sensor(state) => Some(state),
            _ => None,
        }
    }

    fn sensor_mut(&mut self) -> Option<&mut dyn SensorSurface> {
        match &mut self.surface {
            Surface::Sensor(state) => Some(state),
            _ => None,
        }
    }
}

/// Headless in-memory episode.
///
/// Spawning classifies actors by spawn class prefix (`vehicle.`, `walker.`,
/// `traffic.traffic_light`, `traffic.`, `sensor.`); every other class gets
/// a plain kinematic actor. Sensors receive a fresh stream on spawn.
#[derive(Debug, Clone)]
pub struct World {
    actors: HashMap<u32, Actor>,
    next_actor_id: u32,
    next_stream: u64,
    origin: DVec3,
    controllers: ControllerRegistry,
    rejected: HashSet<SpawnClass>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self {
            actors: HashMap::new(),
            next_actor_id: 1,
            next_stream: 1,
            origin: DVec3::ZERO,
            controllers: ControllerRegistry::new(),
            rejected: HashSet::new(),
        }
    }

    pub fn with_origin(origin: DVec3) -> Self {
        Self {
            origin,
            ..Self::new()
        }
    }

    pub fn set_world_origin(&mut self, origin: DVec3) {
        self.origin = origin;
    }

    /// Makes every later spawn of `class` fail.
    pub fn reject_class(&mut self, class: impl Into<String>) {
        self.rejected.insert(SpawnClass::new(class));
    }

    pub fn spawn_actor(&mut self, info: ActorInfo, transform: Transform) -> Result<ActorId, SpawnError> {
        self.check_spawnable(&info.class)?;
        let id = self.allocate_id();
        let mut actor = Actor::new(id, info, transform);
        if let Surface::Sensor(sensor) = &mut actor.surface {
            sensor.stream = Some(StreamToken(self.next_stream));
            self.next_stream += 1;
        }
        log::debug!("spawned {} as {}", actor.info.class, id);
        self.actors.insert(id.0, actor);
        Ok(id)
    }

    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id.0)
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id.0)
    }

    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    fn check_spawnable(&self, class: &SpawnClass) -> Result<(), SpawnError> {
        if class.is_empty() {
            return Err(SpawnError::EmptyClass);
        }
        if self.rejected.contains(class) {
            return Err(SpawnError::Rejected {
                class: class.clone(),
                reason: "class is not spawnable in this world".to_string(),
            });
        }
        Ok(())
    }

    fn allocate_id(&mut self) -> ActorId {
        let id = self.next_actor_id;
        self.next_actor_id += 1;
        ActorId(id)
    }
}

impl Episode for World {
    fn world_origin(&self) -> DVec3 {
        self.origin
    }

    fn spawn(&mut self, class: &SpawnClass, transform: &Transform) -> Result<ActorId, SpawnError> {
        self.spawn_actor(
            ActorInfo {
                class: class.clone(),
                role_name: String::new(),
            },
            *transform,
        )
    }

    fn destroy(&mut self, id: ActorId) -> bool {
        self.controllers.detach(id);
        self.actors.remove(&id.0).is_some()
    }

    fn actor(&self, id: ActorId) -> Option<&dyn LiveActor> {
        self.actors.get(&id.0).map(|a| a as &dyn LiveActor)
    }

    fn actor_mut(&mut self, id: ActorId) -> Option<&mut dyn LiveActor> {
        self.actors.get_mut(&id.0).map(|a| a as &mut dyn LiveActor)
    }

    fn actor_ids(&self) -> Vec<ActorId> {
        let mut ids: Vec<ActorId> = self.actors.keys().map(|&id| ActorId(id)).collect();
        ids.sort_unstable();
        ids
    }

    fn controllers(&self) -> &ControllerRegistry {
        &self.controllers
    }

    fn controllers_mut(&mut self) -> &mut ControllerRegistry {
        &mut self.controllers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ControllerId;

    #[test]
    fn spawn_classifies_by_class() {
        let mut world = World::new();
        let car = world
            .spawn(&SpawnClass::new("vehicle.audi.tt"), &Transform::IDENTITY)
            .unwrap();
        let walker = world
            .spawn(&SpawnClass::new("walker.pedestrian.0001"), &Transform::IDENTITY)
            .unwrap();
        let light = world
            .spawn(&SpawnClass::new("traffic.traffic_light"), &Transform::IDENTITY)
            .unwrap();
        let sign = world
            .spawn(&SpawnClass::new("traffic.stop"), &Transform::IDENTITY)
            .unwrap();
        let camera = world
            .spawn(&SpawnClass::new("sensor.camera.rgb"), &Transform::IDENTITY)
            .unwrap();
        let prop = world
            .spawn(&SpawnClass::new("static.prop.bench"), &Transform::IDENTITY)
            .unwrap();

        assert!(world.actor(car).unwrap().vehicle().is_some());
        assert!(world.actor(walker).unwrap().walker().is_some());
        assert!(world.actor(light).unwrap().traffic_light().is_some());
        assert_eq!(
            world.actor(sign).unwrap().traffic_sign().unwrap().model(),
            SpawnClass::new("traffic.stop")
        );
        assert!(world.actor(camera).unwrap().sensor().unwrap().stream().is_some());
        assert_eq!(world.get(prop).unwrap().surface, Surface::None);
        assert_eq!(world.actor_ids(), vec![car, walker, light, sign, camera, prop]);
    }

    #[test]
    fn rejected_and_empty_classes_fail() {
        let mut world = World::new();
        world.reject_class("vehicle.tank");

        assert_eq!(
            world.spawn(&SpawnClass::default(), &Transform::IDENTITY),
            Err(SpawnError::EmptyClass)
        );
        assert!(matches!(
            world.spawn(&SpawnClass::new("vehicle.tank"), &Transform::IDENTITY),
            Err(SpawnError::Rejected { .. })
        ));
        assert_eq!(world.actor_count(), 0);
    }

    #[test]
    fn ackermann_mode_follows_last_applied_control() {
        let mut vehicle = VehicleState::default();
        vehicle.apply_ackermann_control(VehicleAckermannControl {
            speed: 5.0,
            ..Default::default()
        });
        assert!(vehicle.ackermann_control_active());

        vehicle.apply_control(VehicleControl {
            throttle: 1.0,
            ..Default::default()
        });
        assert!(!vehicle.ackermann_control_active());
        assert_eq!(vehicle.ackermann_control().speed, 5.0);
    }

    #[test]
    fn destroy_detaches_from_controller() {
        let mut world = World::new();
        let controller = ControllerId::new("j1");
        world.controllers_mut().insert(controller.clone());
        let light = world
            .spawn(&SpawnClass::new("traffic.traffic_light"), &Transform::IDENTITY)
            .unwrap();
        world.controllers_mut().attach(&controller, light);

        assert!(world.destroy(light));
        assert!(!world.destroy(light));
        assert!(world.controllers().controller_of(light).is_none());
    }
}
