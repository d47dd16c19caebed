//! Scene nodes and the component dispatch machinery.
//!
//! An [`Entity`] is a positioned node in the scene: a spatial state
//! (position, rotation, cached transform) plus an ordered list of owned
//! [`Component`]s. Components are polymorphic behaviours with optional
//! `start`/`update`/`upload`/`draw` hooks; the entity dispatches to them in
//! insertion order.
//!
//! The spatial state lives in [`EntityState`], separate from the component
//! list, so a component can mutate its owning entity during `update` without
//! aliasing the component storage.

use std::any::Any;

use cgmath::{Matrix4, One, Quaternion, Rad, Rotation3, Vector3};
use instant::Duration;

use crate::{
    components::MeshRenderer,
    context::Context,
    pipelines::scene::{ScenePipeline, TargetKind},
};

/// Type tag for the concrete components shipped with the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentType {
    AnimationClip,
    Camera,
    Light,
    MeshRenderer,
}

/// A polymorphic behaviour attached to exactly one entity.
///
/// All hooks default to no-ops; concrete components override the ones they
/// need:
///
/// - `start` runs once when the component is attached
/// - `update` advances simulation state with the current world time
/// - `upload` pushes GPU-visible data (uniforms, instance buffers); it is the
///   only hook with access to the [`Context`]
/// - `draw` records draw calls into the current render pass
pub trait Component: Any {
    fn component_type(&self) -> ComponentType;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn start(&mut self, _state: &mut EntityState) {}

    fn update(&mut self, _state: &mut EntityState, _time: Duration) {}

    fn upload(&mut self, _state: &EntityState, _ctx: &Context) {}

    fn draw<'pass>(
        &'pass self,
        _state: &EntityState,
        _render_pass: &mut wgpu::RenderPass<'pass>,
        _target: TargetKind,
    ) {
    }
}

/// Spatial state of an entity: position, rotation and the cached transform.
///
/// Setters mark the state dirty; the transform is recomputed lazily on read.
#[derive(Debug)]
pub struct EntityState {
    position: Vector3<f32>,
    rotation: Quaternion<f32>,
    transform: Matrix4<f32>,
    dirty: bool,
    cast_shadow: bool,
}

impl EntityState {
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::one(),
            transform: Matrix4::one(),
            dirty: false,
            cast_shadow: false,
        }
    }

    pub fn x(&self) -> f32 {
        self.position.x
    }

    pub fn set_x(&mut self, x: f32) {
        self.position.x = x;
        self.dirty = true;
    }

    pub fn y(&self) -> f32 {
        self.position.y
    }

    pub fn set_y(&mut self, y: f32) {
        self.position.y = y;
        self.dirty = true;
    }

    pub fn z(&self) -> f32 {
        self.position.z
    }

    pub fn set_z(&mut self, z: f32) {
        self.position.z = z;
        self.dirty = true;
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.position = position;
        self.dirty = true;
    }

    pub fn rotation(&self) -> Quaternion<f32> {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Quaternion<f32>) {
        self.rotation = rotation;
        self.dirty = true;
    }

    pub fn translate(&mut self, tx: f32, ty: f32, tz: f32) {
        self.position += Vector3::new(tx, ty, tz);
        self.dirty = true;
    }

    /// Post-multiplies a rotation around the entity's local x axis.
    pub fn rotate_x_axis<A: Into<Rad<f32>>>(&mut self, angle: A) {
        self.rotation = self.rotation * Quaternion::from_angle_x(angle);
        self.dirty = true;
    }

    pub fn rotate_y_axis<A: Into<Rad<f32>>>(&mut self, angle: A) {
        self.rotation = self.rotation * Quaternion::from_angle_y(angle);
        self.dirty = true;
    }

    pub fn rotate_z_axis<A: Into<Rad<f32>>>(&mut self, angle: A) {
        self.rotation = self.rotation * Quaternion::from_angle_z(angle);
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn cast_shadow(&self) -> bool {
        self.cast_shadow
    }

    pub fn set_cast_shadow(&mut self, cast_shadow: bool) {
        self.cast_shadow = cast_shadow;
    }

    /// The world transform, recomputing and caching it when dirty.
    pub fn transform(&mut self) -> Matrix4<f32> {
        if self.dirty {
            self.transform = self.compose();
            self.dirty = false;
        }
        self.transform
    }

    /// The world transform without touching the cache.
    ///
    /// Returns the cached matrix when clean, a freshly composed one when
    /// dirty, so the result is always consistent with the current state.
    pub fn current_transform(&self) -> Matrix4<f32> {
        if self.dirty {
            self.compose()
        } else {
            self.transform
        }
    }

    fn compose(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position) * Matrix4::from(self.rotation)
    }
}

impl Default for EntityState {
    fn default() -> Self {
        Self::new()
    }
}

/// A positioned scene node owning an ordered list of components.
pub struct Entity {
    state: EntityState,
    components: Vec<Box<dyn Component>>,
}

impl Entity {
    pub fn new() -> Self {
        Self {
            state: EntityState::new(),
            components: Vec::new(),
        }
    }

    pub fn state(&self) -> &EntityState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut EntityState {
        &mut self.state
    }

    /// Attaches a component, running its `start` hook.
    pub fn add_component(&mut self, mut component: Box<dyn Component>) {
        component.start(&mut self.state);
        self.components.push(component);
    }

    /// Dispatches `update` to all components in insertion order, then
    /// refreshes the cached transform so later consumers read a clean one.
    pub fn update(&mut self, time: Duration) {
        for component in self.components.iter_mut() {
            component.update(&mut self.state, time);
        }
        self.state.transform();
    }

    pub fn upload(&mut self, ctx: &Context) {
        for component in self.components.iter_mut() {
            component.upload(&self.state, ctx);
        }
    }

    pub fn draw<'pass>(
        &'pass self,
        render_pass: &mut wgpu::RenderPass<'pass>,
        target: TargetKind,
    ) {
        for component in self.components.iter() {
            component.draw(&self.state, render_pass, target);
        }
    }

    pub fn components(&self) -> impl Iterator<Item = &dyn Component> {
        self.components.iter().map(|c| c.as_ref())
    }

    /// The first component with the given type tag.
    pub fn find_component(&self, component_type: ComponentType) -> Option<&dyn Component> {
        self.components
            .iter()
            .find(|c| c.component_type() == component_type)
            .map(|c| c.as_ref())
    }

    /// The first component of concrete type `T`.
    pub fn component<T: Component>(&self) -> Option<&T> {
        self.components
            .iter()
            .find_map(|c| c.as_any().downcast_ref::<T>())
    }

    pub fn component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components
            .iter_mut()
            .find_map(|c| c.as_any_mut().downcast_mut::<T>())
    }

    /// The shading pipeline of the first mesh renderer, if any.
    pub fn pipeline(&self) -> Option<&ScenePipeline> {
        self.component::<MeshRenderer>().map(|m| m.pipeline())
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, InnerSpace, Point3, Transform};

    fn close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-5, "{} != {}", a, b);
    }

    #[test]
    fn setters_mark_dirty_and_transform_clears_it() {
        let mut state = EntityState::new();
        assert!(!state.is_dirty());

        state.set_x(3.0);
        assert!(state.is_dirty());

        let transform = state.transform();
        assert!(!state.is_dirty());
        close(transform.w.x, 3.0);
    }

    #[test]
    fn current_transform_is_consistent_while_dirty() {
        let mut state = EntityState::new();
        state.set_position(Vector3::new(1.0, 2.0, 3.0));

        // Still dirty, but the read must reflect the latest state.
        assert!(state.is_dirty());
        let fresh = state.current_transform();
        close(fresh.w.x, 1.0);
        close(fresh.w.y, 2.0);
        close(fresh.w.z, 3.0);
        assert!(state.is_dirty());
    }

    #[test]
    fn translate_accumulates() {
        let mut state = EntityState::new();
        state.translate(1.0, 0.0, -1.0);
        state.translate(0.5, 2.0, 0.0);
        close(state.x(), 1.5);
        close(state.y(), 2.0);
        close(state.z(), -1.0);
    }

    #[test]
    fn rotation_composes_with_translation() {
        let mut state = EntityState::new();
        state.set_position(Vector3::new(0.0, 0.0, 5.0));
        state.rotate_y_axis(Deg(90.0));

        // Translation applies after rotation: a point on the local x axis
        // ends up rotated about the entity origin, then offset.
        let transformed = state
            .current_transform()
            .transform_point(Point3::new(1.0, 0.0, 0.0));
        close(transformed.x, 0.0);
        close(transformed.y, 0.0);
        close(transformed.z, 4.0);
    }

    #[test]
    fn axis_rotations_post_multiply() {
        let mut a = EntityState::new();
        a.rotate_x_axis(Deg(30.0));
        a.rotate_y_axis(Deg(45.0));

        let expected = Quaternion::from_angle_x(Deg(30.0)) * Quaternion::from_angle_y(Deg(45.0));
        close(a.rotation().dot(expected).abs(), 1.0);
    }

    struct CountingComponent {
        started: u32,
        updated: u32,
    }

    impl Component for CountingComponent {
        fn component_type(&self) -> ComponentType {
            ComponentType::AnimationClip
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }

        fn start(&mut self, _state: &mut EntityState) {
            self.started += 1;
        }

        fn update(&mut self, state: &mut EntityState, _time: Duration) {
            self.updated += 1;
            state.translate(1.0, 0.0, 0.0);
        }
    }

    #[test]
    fn components_dispatch_in_insertion_order() {
        let mut entity = Entity::new();
        entity.add_component(Box::new(CountingComponent {
            started: 0,
            updated: 0,
        }));
        entity.add_component(Box::new(CountingComponent {
            started: 0,
            updated: 0,
        }));

        entity.update(Duration::from_millis(16));
        entity.update(Duration::from_millis(32));

        // Both components ran on both frames and mutated the shared state.
        close(entity.state().x(), 4.0);
        assert!(
            entity
                .find_component(ComponentType::AnimationClip)
                .is_some()
        );
        let counter = entity.component::<CountingComponent>().unwrap();
        assert_eq!(counter.started, 1);
        assert_eq!(counter.updated, 2);
        // The update left the transform cache clean.
        assert!(!entity.state().is_dirty());
    }
}
