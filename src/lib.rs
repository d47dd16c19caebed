//! sheep-ngin
//!
//! A small entity-component scene engine built directly on wgpu. Scene nodes
//! (`Entity`) own a list of polymorphic components (camera, light, mesh
//! renderer, animation clip) that compose updatable and drawable behaviour.
//! The renderer sequences a directional-light shadow pass into an offscreen
//! framebuffer before the main pass, so any entity flagged as a shadow
//! caster ends up in the shadow map.
//!
//! High-level modules
//! - `entity`: scene nodes, the `Component` trait and spatial state
//! - `components`: the concrete components (camera, light, mesh renderer,
//!   animation clip)
//! - `context`: central GPU and window context that owns device/queue,
//!   shared uniform resources and the pipeline set
//! - `data_structures`: engine data models (primitives, instances, textures)
//! - `flow`: high level flow control (scenes / update loops)
//! - `pipelines`: render pipeline definitions and shadow/debug resources
//! - `renderer`: per-frame pass sequencing (shadow pass, main pass, overlay)
//! - `resources`: helpers to load meshes/textures from external files
//! - `scene`: the entity container rendered as one unit
//!

pub mod components;
pub mod context;
pub mod data_structures;
pub mod entity;
pub mod flow;
pub mod pipelines;
pub mod renderer;
pub mod resources;
pub mod scene;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use winit::event::DeviceEvent;
pub use winit::event::ElementState;
pub use winit::event::KeyEvent;
pub use winit::event::WindowEvent;
pub use winit::keyboard::KeyCode;
pub use winit::keyboard::PhysicalKey;
pub use wgpu::*;
