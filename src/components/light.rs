//! Directional light component.
//!
//! The light's direction is derived from the owning entity's position: the
//! shading pipeline expects a unit vector pointing towards the light, which
//! is exactly the normalized position of a directional light source.

use std::any::Any;

use cgmath::{InnerSpace, Vector3};

use crate::{
    context::Context,
    entity::{Component, ComponentType, EntityState},
};

/// GPU representation of the light, 16-byte aligned per uniform rules.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    /// Unit direction towards the light in xyz, w unused.
    pub direction: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
}

impl Default for LightUniform {
    fn default() -> Self {
        Self {
            direction: [0.0, 1.0, 0.0, 0.0],
            ambient: [1.0, 1.0, 1.0, 1.0],
            diffuse: [1.0, 1.0, 1.0, 1.0],
            specular: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

fn color_array(color: wgpu::Color) -> [f32; 4] {
    [
        color.r as f32,
        color.g as f32,
        color.b as f32,
        color.a as f32,
    ]
}

pub struct Light {
    ambient: wgpu::Color,
    diffuse: wgpu::Color,
    specular: wgpu::Color,
}

impl Light {
    pub fn new() -> Self {
        Self {
            ambient: wgpu::Color::WHITE,
            diffuse: wgpu::Color::WHITE,
            specular: wgpu::Color::WHITE,
        }
    }

    pub fn set_ambient(&mut self, ambient: wgpu::Color) {
        self.ambient = ambient;
    }

    pub fn set_diffuse(&mut self, diffuse: wgpu::Color) {
        self.diffuse = diffuse;
    }

    pub fn set_specular(&mut self, specular: wgpu::Color) {
        self.specular = specular;
    }

    /// Builds the uniform for a light owned by an entity at `position`.
    pub fn uniform(&self, position: Vector3<f32>) -> LightUniform {
        let direction = if position.magnitude2() > 0.0 {
            position.normalize()
        } else {
            Vector3::unit_y()
        };
        LightUniform {
            direction: [direction.x, direction.y, direction.z, 0.0],
            ambient: color_array(self.ambient),
            diffuse: color_array(self.diffuse),
            specular: color_array(self.specular),
        }
    }
}

impl Default for Light {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Light {
    fn component_type(&self) -> ComponentType {
        ComponentType::Light
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn upload(&mut self, state: &EntityState, ctx: &Context) {
        let uniform = self.uniform(state.position());
        ctx.queue
            .write_buffer(&ctx.light.buffer, 0, bytemuck::cast_slice(&[uniform]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_is_normalized_entity_position() {
        let light = Light::new();
        let uniform = light.uniform(Vector3::new(0.0, 3.0, -4.0));
        assert!((uniform.direction[1] - 0.6).abs() < 1e-6);
        assert!((uniform.direction[2] + 0.8).abs() < 1e-6);
        let len = uniform
            .direction
            .iter()
            .take(3)
            .map(|d| d * d)
            .sum::<f32>()
            .sqrt();
        assert!((len - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_position_falls_back_to_up() {
        let light = Light::new();
        let uniform = light.uniform(Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(uniform.direction, [0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn colors_are_carried_into_the_uniform() {
        let mut light = Light::new();
        light.set_ambient(wgpu::Color {
            r: 0.2,
            g: 0.2,
            b: 0.2,
            a: 1.0,
        });
        light.set_diffuse(wgpu::Color {
            r: 0.6,
            g: 0.6,
            b: 0.6,
            a: 1.0,
        });
        let uniform = light.uniform(Vector3::unit_x());
        assert!((uniform.ambient[0] - 0.2).abs() < 1e-6);
        assert!((uniform.diffuse[0] - 0.6).abs() < 1e-6);
        assert_eq!(uniform.specular, [1.0, 1.0, 1.0, 1.0]);
    }
}
