//! Camera component: projection parameters and a render target.
//!
//! A camera projects the scene onto its target, either the window surface or
//! an offscreen framebuffer (the shadow map is rendered through an
//! orthographic camera targeting one). Parameter setters mark the projection
//! dirty; the matrix is rebuilt during the upload step where the target's
//! dimensions are known.

use std::{any::Any, sync::Arc};

use cgmath::{Deg, Matrix4, SquareMatrix, ortho, perspective};

use crate::{
    context::Context,
    entity::{Component, ComponentType, EntityState},
    pipelines::shadow::OffscreenTarget,
};

/// wgpu clip space covers z in [0, 1] while cgmath produces OpenGL-style
/// [-1, 1]; this matrix maps between the two.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Projection {
    Perspective,
    Orthographic,
}

/// Where a camera renders to.
#[derive(Clone, Debug)]
pub enum CameraTarget {
    /// The window surface.
    Onscreen,
    /// An offscreen framebuffer (color + depth), shared by reference.
    Offscreen(Arc<OffscreenTarget>),
}

pub struct Camera {
    target: CameraTarget,
    projection: Projection,
    background: wgpu::Color,
    /// Vertical field of view in degrees (perspective).
    fov: f32,
    /// Half extent of the view box (orthographic).
    size: f32,
    z_near: f32,
    z_far: f32,
    projection_dirty: bool,
    matrix: Matrix4<f32>,
}

impl Camera {
    pub fn new(target: CameraTarget) -> Self {
        Self {
            target,
            projection: Projection::Perspective,
            background: wgpu::Color::BLACK,
            fov: 60.0,
            size: 1.0,
            z_near: 0.1,
            z_far: 100.0,
            projection_dirty: true,
            matrix: Matrix4::identity(),
        }
    }

    pub fn target(&self) -> &CameraTarget {
        &self.target
    }

    pub fn set_target(&mut self, target: CameraTarget) {
        self.target = target;
        self.projection_dirty = true;
    }

    /// Whether this camera renders into the given offscreen framebuffer.
    pub fn targets(&self, target: &Arc<OffscreenTarget>) -> bool {
        match &self.target {
            CameraTarget::Offscreen(own) => Arc::ptr_eq(own, target),
            CameraTarget::Onscreen => false,
        }
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
        self.projection_dirty = true;
    }

    pub fn set_field_of_view(&mut self, fov: f32) {
        self.fov = fov;
        self.projection_dirty = true;
    }

    pub fn set_size_of_view(&mut self, size: f32) {
        self.size = size;
        self.projection_dirty = true;
    }

    pub fn set_near_plane(&mut self, z_near: f32) {
        self.z_near = z_near;
        self.projection_dirty = true;
    }

    pub fn set_far_plane(&mut self, z_far: f32) {
        self.z_far = z_far;
        self.projection_dirty = true;
    }

    pub fn background(&self) -> wgpu::Color {
        self.background
    }

    pub fn set_background_color(&mut self, background: wgpu::Color) {
        self.background = background;
    }

    /// Forces a projection rebuild on the next upload, e.g. after the
    /// target surface was resized.
    pub fn invalidate_projection(&mut self) {
        self.projection_dirty = true;
    }

    pub fn is_projection_dirty(&self) -> bool {
        self.projection_dirty
    }

    /// The cached projection matrix. Valid once the camera was uploaded.
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.matrix
    }

    fn rebuild(&mut self, width: u32, height: u32) {
        self.matrix = match self.projection {
            Projection::Perspective => {
                let aspect = width as f32 / height as f32;
                OPENGL_TO_WGPU_MATRIX * perspective(Deg(self.fov), aspect, self.z_near, self.z_far)
            }
            Projection::Orthographic => {
                OPENGL_TO_WGPU_MATRIX
                    * ortho(
                        -self.size,
                        self.size,
                        -self.size,
                        self.size,
                        self.z_near,
                        self.z_far,
                    )
            }
        };
        self.projection_dirty = false;
    }
}

impl Component for Camera {
    fn component_type(&self) -> ComponentType {
        ComponentType::Camera
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn upload(&mut self, _state: &EntityState, ctx: &Context) {
        if !self.projection_dirty {
            return;
        }
        let (width, height) = match &self.target {
            CameraTarget::Onscreen => (ctx.config.width, ctx.config.height),
            CameraTarget::Offscreen(target) => (target.width, target.height),
        };
        self.rebuild(width.max(1), height.max(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_mark_projection_dirty() {
        let mut camera = Camera::new(CameraTarget::Onscreen);
        camera.rebuild(800, 600);
        assert!(!camera.is_projection_dirty());

        camera.set_field_of_view(45.0);
        assert!(camera.is_projection_dirty());

        camera.rebuild(800, 600);
        camera.set_near_plane(1.0);
        assert!(camera.is_projection_dirty());
    }

    #[test]
    fn perspective_and_orthographic_differ() {
        let mut camera = Camera::new(CameraTarget::Onscreen);
        camera.rebuild(512, 512);
        let perspective = camera.projection_matrix();

        camera.set_projection(Projection::Orthographic);
        camera.set_size_of_view(3.0);
        camera.rebuild(512, 512);
        let orthographic = camera.projection_matrix();

        assert!(perspective != orthographic);
        // Orthographic projections have no perspective divide.
        assert_eq!(orthographic.w.w, 1.0);
        assert_eq!(perspective.w.w, 0.0);
    }
}
