//! wgpu render backend for the starfield.
//!
//! Star points are drawn as instanced quads of constant pixel size; text
//! meshes are lit by the scene's ambient and directional lights.
//!
//! # Invariants
//! - The renderer reads the scene and camera; it never mutates them.
//! - GPU buffers for a text geometry live only while the geometry is live in
//!   the scene's resource registry.
//! - After dispose, no GPU object is held.

mod frame;
mod gpu;
mod shaders;

pub use gpu::WgpuRenderer;
