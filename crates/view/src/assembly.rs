use crate::config::StarfieldConfig;
use crate::host::Host;
use glam::Vec3;
use starscape_render::{Node, NodeKind, PerspectiveCamera, RenderError, Scene};

/// The rendering context owned by one mounted view.
#[derive(Debug)]
pub struct SceneContext<R> {
    pub scene: Scene,
    pub camera: PerspectiveCamera,
    pub renderer: R,
}

/// One-time construction of scene, camera, renderer and lights.
///
/// The renderer's surface is attached to the host's mount point. Calling
/// this twice for the same host without releasing the first renderer leaves
/// two surfaces attached.
pub fn assemble<H: Host>(
    config: &StarfieldConfig,
    host: &mut H,
) -> Result<SceneContext<H::Renderer>, RenderError> {
    let viewport = host.viewport();

    let cam = &config.camera;
    let mut camera = PerspectiveCamera::new(cam.fov_degrees, viewport.aspect(), cam.near, cam.far);
    camera.position = Vec3::new(0.0, 0.0, cam.z);

    let renderer = host.create_renderer(config.renderer.options())?;

    let lights = &config.lights;
    let mut scene = Scene::new();
    scene.add(Node::new(
        "ambient-light",
        NodeKind::AmbientLight {
            color: lights.ambient_color,
            intensity: lights.ambient_intensity,
        },
    ));
    scene.add(Node::new(
        "directional-light",
        NodeKind::DirectionalLight {
            color: lights.directional_color,
            intensity: lights.directional_intensity,
            direction: lights.directional_direction.normalize_or(Vec3::NEG_Z),
        },
    ));

    tracing::debug!(
        width = viewport.width,
        height = viewport.height,
        aspect = camera.aspect,
        "scene assembled"
    );

    Ok(SceneContext {
        scene,
        camera,
        renderer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessHost;
    use starscape_common::Viewport;
    use starscape_render::Renderer;

    #[test]
    fn assembles_camera_lights_and_renderer() {
        let mut host = HeadlessHost::new(Viewport::new(800, 600));
        let ctx = assemble(&StarfieldConfig::default(), &mut host).unwrap();

        assert_eq!(ctx.camera.fov_degrees, 75.0);
        assert_eq!(ctx.camera.near, 0.1);
        assert_eq!(ctx.camera.far, 10_000.0);
        assert_eq!(ctx.camera.aspect, 800.0 / 600.0);

        let lights: Vec<&str> = ctx.scene.nodes().map(|n| n.name.as_str()).collect();
        assert_eq!(lights, vec!["ambient-light", "directional-light"]);

        assert_eq!(ctx.renderer.drawing_buffer_size(), (800, 600));
        assert!(ctx.renderer.options().antialias);
        assert!(ctx.renderer.options().alpha);
        assert_eq!(host.attached_surfaces(), 1);
    }
}
