use std::collections::BTreeMap;

use crate::actor::{ActorId, ControllerId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficLightController {
    id: ControllerId,
    lights: Vec<ActorId>,
}

impl TrafficLightController {
    pub fn new(id: ControllerId) -> Self {
        Self {
            id,
            lights: Vec::new(),
        }
    }

    pub fn id(&self) -> &ControllerId {
        &self.id
    }

    pub fn lights(&self) -> &[ActorId] {
        &self.lights
    }

    pub fn contains(&self, light: ActorId) -> bool {
        self.lights.contains(&light)
    }
}

/// Traffic-light controllers of an episode, keyed by id.
///
/// Lights refer to their controller by [`ControllerId`] and are resolved
/// here; the registry is the only owner of the association.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerRegistry {
    controllers: BTreeMap<ControllerId, TrafficLightController>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: ControllerId) -> &mut TrafficLightController {
        self.controllers
            .entry(id.clone())
            .or_insert_with(|| TrafficLightController::new(id))
    }

    pub fn get(&self, id: &ControllerId) -> Option<&TrafficLightController> {
        self.controllers.get(id)
    }

    pub fn contains(&self, id: &ControllerId) -> bool {
        self.controllers.contains_key(id)
    }

    /// Moves `light` under `controller`. Attaching a light that is already
    /// there is a no-op. Returns false when the controller is unknown.
    pub fn attach(&mut self, controller: &ControllerId, light: ActorId) -> bool {
        if !self.controllers.contains_key(controller) {
            return false;
        }
        for (id, other) in &mut self.controllers {
            if id != controller {
                other.lights.retain(|&l| l != light);
            }
        }
        if let Some(target) = self.controllers.get_mut(controller) {
            if !target.lights.contains(&light) {
                target.lights.push(light);
            }
        }
        true
    }

    pub fn detach(&mut self, light: ActorId) {
        for controller in self.controllers.values_mut() {
            controller.lights.retain(|&l| l != light);
        }
    }

    pub fn controller_of(&self, light: ActorId) -> Option<&ControllerId> {
        self.controllers
            .values()
            .find(|c| c.contains(light))
            .map(|c| &c.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrafficLightController> {
        self.controllers.values()
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_is_idempotent() {
        let mut registry = ControllerRegistry::new();
        let id = ControllerId::new("j1");
        registry.insert(id.clone());

        assert!(registry.attach(&id, ActorId(4)));
        assert!(registry.attach(&id, ActorId(4)));
        assert_eq!(registry.get(&id).unwrap().lights(), &[ActorId(4)]);
        assert_eq!(registry.controller_of(ActorId(4)), Some(&id));
    }

    #[test]
    fn attach_moves_between_controllers() {
        let mut registry = ControllerRegistry::new();
        let a = ControllerId::new("a");
        let b = ControllerId::new("b");
        registry.insert(a.clone());
        registry.insert(b.clone());

        registry.attach(&a, ActorId(1));
        registry.attach(&b, ActorId(1));

        assert!(registry.get(&a).unwrap().lights().is_empty());
        assert_eq!(registry.controller_of(ActorId(1)), Some(&b));
    }

    #[test]
    fn unknown_controller_is_refused() {
        let mut registry = ControllerRegistry::new();
        assert!(!registry.attach(&ControllerId::new("nope"), ActorId(1)));
        assert!(registry.controller_of(ActorId(1)).is_none());
    }
}
