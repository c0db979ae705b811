//! Rendering adapter: the engine surface the starfield view draws through.
//!
//! # Invariants
//! - Renderers read the scene and camera; they never mutate them.
//! - Every geometry and material lives in the scene's [`Resources`]
//!   registry and is released explicitly.
//!
//! # Workaround
//! Provides a trait-based renderer interface with a headless renderer for
//! the CLI and tests. The wgpu backend lives in `starscape-render-wgpu` and
//! implements the same trait.

mod camera;
mod renderer;
mod resources;
mod scene;
pub mod text;
pub mod triangulate;
pub mod typeface;

pub use camera::PerspectiveCamera;
pub use renderer::{FrameStats, HeadlessRenderer, RenderError, Renderer, RendererOptions};
pub use resources::{
    Aabb, Geometry, GeometryId, Material, MaterialId, MeshData, ResourceStats, Resources,
};
pub use scene::{DisposeReport, Node, NodeKind, Scene};
pub use text::{TextGeometryOptions, build_text_geometry};
pub use typeface::{Typeface, TypefaceError};

pub fn crate_info() -> &'static str {
    "starscape-render v0.1.0"
}
