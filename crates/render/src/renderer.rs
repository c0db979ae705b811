use crate::camera::PerspectiveCamera;
use crate::scene::{NodeKind, Scene};
use std::fmt::Write as _;

/// Construction options shared by every renderer backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererOptions {
    /// Multisample the color target.
    pub antialias: bool,
    /// Clear to a fully transparent background instead of opaque black.
    pub alpha: bool,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            antialias: true,
            alpha: true,
        }
    }
}

/// Errors from renderer operations.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("renderer used after dispose")]
    Disposed,
    #[error("surface error: {0}")]
    Surface(String),
    #[error("device error: {0}")]
    Device(String),
}

/// Renderer-agnostic interface. All backends implement this trait.
///
/// A renderer reads the scene and camera and never mutates them. Once
/// [`dispose`](Renderer::dispose) has run, further renders fail with
/// [`RenderError::Disposed`].
pub trait Renderer {
    /// Draw one frame of `scene` as seen from `camera`.
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<(), RenderError>;

    /// Resize the drawing buffer.
    fn set_size(&mut self, width: u32, height: u32);

    /// Current drawing-buffer size in pixels.
    fn drawing_buffer_size(&self) -> (u32, u32);

    /// Release the GPU context and any buffers held on behalf of the scene.
    fn dispose(&mut self);

    fn is_disposed(&self) -> bool;
}

/// What the most recent frame drew.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub points: usize,
    pub meshes: usize,
    pub lights: usize,
}

/// Headless renderer that records what it would have drawn.
///
/// Used for the CLI and for exercising the render interface in tests.
#[derive(Debug)]
pub struct HeadlessRenderer {
    options: RendererOptions,
    size: (u32, u32),
    frames: u64,
    last_frame: FrameStats,
    disposed: bool,
}

impl HeadlessRenderer {
    pub fn new(options: RendererOptions, width: u32, height: u32) -> Self {
        Self {
            options,
            size: (width, height),
            frames: 0,
            last_frame: FrameStats::default(),
            disposed: false,
        }
    }

    pub fn options(&self) -> RendererOptions {
        self.options
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn last_frame(&self) -> FrameStats {
        self.last_frame
    }

    /// Human-readable summary of a scene as this renderer sees it.
    pub fn describe(&self, scene: &Scene, camera: &PerspectiveCamera) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Scene (frames={}, buffer={}x{}) ===",
            self.frames, self.size.0, self.size.1
        );
        let _ = writeln!(
            out,
            "Camera: pos=({:.1}, {:.1}, {:.1}) fov={:.0} aspect={:.3}",
            camera.position.x,
            camera.position.y,
            camera.position.z,
            camera.fov_degrees,
            camera.aspect
        );
        let stats = count(scene);
        let _ = writeln!(
            out,
            "Nodes: {} (points={}, meshes={}, lights={})",
            scene.len(),
            stats.points,
            stats.meshes,
            stats.lights
        );
        let res = scene.resources().stats();
        let _ = writeln!(
            out,
            "Resources: geometries={}/{} materials={}/{} (live/created)",
            res.live_geometries(),
            res.geometries_created,
            res.live_materials(),
            res.materials_created
        );

        for node in scene.nodes() {
            if let NodeKind::Mesh { geometry, .. } = node.kind {
                let p = node.transform.position;
                let r = node.transform.rotation;
                let verts = scene
                    .resources()
                    .geometry(geometry)
                    .map(|g| g.vertex_count())
                    .unwrap_or(0);
                let _ = writeln!(
                    out,
                    "  [{}] {} pos=({:.2}, {:.2}, {:.2}) rot=({:.3}, {:.3}) verts={}",
                    node.id.short(),
                    node.name,
                    p.x,
                    p.y,
                    p.z,
                    r.x,
                    r.y,
                    verts
                );
            }
        }

        out
    }
}

impl Renderer for HeadlessRenderer {
    fn render(&mut self, scene: &Scene, _camera: &PerspectiveCamera) -> Result<(), RenderError> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }
        self.last_frame = count(scene);
        self.frames += 1;
        Ok(())
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn drawing_buffer_size(&self) -> (u32, u32) {
        self.size
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

fn count(scene: &Scene) -> FrameStats {
    let mut stats = FrameStats::default();
    for node in scene.nodes() {
        match node.kind {
            NodeKind::Points { .. } => stats.points += 1,
            NodeKind::Mesh { .. } => stats.meshes += 1,
            NodeKind::AmbientLight { .. } | NodeKind::DirectionalLight { .. } => stats.lights += 1,
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{Geometry, Material};
    use crate::scene::Node;
    use starscape_common::Color;

    fn small_scene() -> Scene {
        let mut scene = Scene::new();
        scene.add(Node::new(
            "ambient",
            NodeKind::AmbientLight {
                color: Color::WHITE,
                intensity: 0.4,
            },
        ));
        let material = scene.resources_mut().create_material(Material::Points {
            color: Color::WHITE,
            size: 2.0,
        });
        let geometry = scene.resources_mut().create_geometry(Geometry::single_point());
        scene.add(Node::new("star", NodeKind::Points { geometry, material }));
        scene
    }

    #[test]
    fn headless_counts_frames_and_nodes() {
        let scene = small_scene();
        let camera = PerspectiveCamera::default();
        let mut renderer = HeadlessRenderer::new(RendererOptions::default(), 800, 600);

        renderer.render(&scene, &camera).unwrap();
        renderer.render(&scene, &camera).unwrap();

        assert_eq!(renderer.frames_rendered(), 2);
        assert_eq!(
            renderer.last_frame(),
            FrameStats {
                points: 1,
                meshes: 0,
                lights: 1
            }
        );
    }

    #[test]
    fn render_after_dispose_fails() {
        let scene = small_scene();
        let camera = PerspectiveCamera::default();
        let mut renderer = HeadlessRenderer::new(RendererOptions::default(), 800, 600);
        renderer.dispose();
        assert!(renderer.is_disposed());
        assert!(matches!(
            renderer.render(&scene, &camera),
            Err(RenderError::Disposed)
        ));
    }

    #[test]
    fn set_size_updates_drawing_buffer() {
        let mut renderer = HeadlessRenderer::new(RendererOptions::default(), 800, 600);
        renderer.set_size(1920, 1080);
        assert_eq!(renderer.drawing_buffer_size(), (1920, 1080));
    }

    #[test]
    fn describe_mentions_counts() {
        let scene = small_scene();
        let renderer = HeadlessRenderer::new(RendererOptions::default(), 800, 600);
        let out = renderer.describe(&scene, &PerspectiveCamera::default());
        assert!(out.contains("points=1"));
        assert!(out.contains("buffer=800x600"));
    }
}
