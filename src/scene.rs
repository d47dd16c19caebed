//! The entity container rendered as one unit.
//!
//! A scene owns its entities, an optional shadow map binding and the debug
//! overlay quads. Updating a scene dispatches the world time to every
//! entity; uploading pushes all GPU-visible state.

use std::sync::Arc;

use instant::Duration;

use crate::{
    components::Camera,
    context::Context,
    entity::Entity,
    pipelines::{
        debug::DebugQuad,
        shadow::{OffscreenTarget, ShadowBinding},
    },
};

/// Handle to an entity inside its scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityId(usize);

pub struct Scene {
    entities: Vec<Entity>,
    shadow: Option<ShadowBinding>,
    overlays: Vec<DebugQuad>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            shadow: None,
            overlays: Vec::new(),
        }
    }

    pub fn add_entity(&mut self, entity: Entity) -> EntityId {
        self.entities.push(entity);
        EntityId(self.entities.len() - 1)
    }

    /// Panics when the id does not belong to this scene.
    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id.0]
    }

    pub fn entity_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.entities[id.0]
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    /// Dispatches the current world time to every entity in order.
    pub fn update(&mut self, time: Duration) {
        for entity in self.entities.iter_mut() {
            entity.update(time);
        }
    }

    /// Pushes all GPU-visible state: instance buffers, light uniforms,
    /// camera projections.
    pub fn upload(&mut self, ctx: &Context) {
        for entity in self.entities.iter_mut() {
            entity.upload(ctx);
        }
    }

    /// Declares `target` as this scene's shadow map. Cameras rendering into
    /// it become shadow passes, and the main pass samples its depth side.
    pub fn set_shadow_map(
        &mut self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        target: Arc<OffscreenTarget>,
    ) {
        self.shadow = Some(ShadowBinding::new(device, layout, target));
    }

    pub fn shadow_map(&self) -> Option<&Arc<OffscreenTarget>> {
        self.shadow.as_ref().map(|binding| &binding.target)
    }

    pub(crate) fn shadow(&self) -> Option<&ShadowBinding> {
        self.shadow.as_ref()
    }

    pub fn add_overlay(&mut self, quad: DebugQuad) {
        self.overlays.push(quad);
    }

    pub(crate) fn overlays(&self) -> &[DebugQuad] {
        &self.overlays
    }

    /// Marks every camera projection dirty, e.g. after a surface resize.
    pub fn invalidate_projections(&mut self) {
        for entity in self.entities.iter_mut() {
            if let Some(camera) = entity.component_mut::<Camera>() {
                camera.invalidate_projection();
            }
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
