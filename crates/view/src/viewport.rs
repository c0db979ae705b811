use crate::host::{ListenerId, ResizeSource};
use starscape_common::Viewport;
use starscape_render::{PerspectiveCamera, Renderer};

/// Keeps camera aspect and drawing-buffer size in step with the mount point.
///
/// Holds at most one resize registration. Events delivered while
/// unregistered are dropped.
#[derive(Debug, Default)]
pub struct ViewportAdapter {
    listener: Option<ListenerId>,
}

impl ViewportAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, source: &mut impl ResizeSource) {
        if self.listener.is_none() {
            self.listener = Some(source.add_resize_listener());
        }
    }

    pub fn deregister(&mut self, source: &mut impl ResizeSource) {
        if let Some(id) = self.listener.take() {
            source.remove_resize_listener(id);
        }
    }

    pub fn is_registered(&self) -> bool {
        self.listener.is_some()
    }

    /// Apply a new mount-point size. Returns `false` if the event was dropped.
    ///
    /// An empty viewport (a minimized window) is dropped so the camera keeps
    /// its last usable aspect.
    pub fn on_resize(
        &self,
        viewport: Viewport,
        camera: &mut PerspectiveCamera,
        renderer: &mut impl Renderer,
    ) -> bool {
        if !self.is_registered() {
            return false;
        }
        if viewport.is_empty() {
            tracing::debug!(
                width = viewport.width,
                height = viewport.height,
                "ignoring empty viewport"
            );
            return false;
        }
        camera.aspect = viewport.aspect();
        camera.update_projection_matrix();
        renderer.set_size(viewport.width, viewport.height);
        tracing::debug!(
            width = viewport.width,
            height = viewport.height,
            aspect = camera.aspect,
            "viewport resized"
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessHost;
    use starscape_render::{HeadlessRenderer, RendererOptions};

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(75.0, 800.0 / 600.0, 0.1, 10_000.0)
    }

    #[test]
    fn resize_updates_aspect_and_buffer() {
        let mut host = HeadlessHost::new(Viewport::new(800, 600));
        let mut adapter = ViewportAdapter::new();
        adapter.register(&mut host);

        let mut cam = camera();
        let mut renderer = HeadlessRenderer::new(RendererOptions::default(), 800, 600);
        let before = cam.projection_matrix();

        assert!(adapter.on_resize(Viewport::new(1920, 1080), &mut cam, &mut renderer));
        assert_eq!(cam.aspect, 1920.0 / 1080.0);
        assert_ne!(cam.projection_matrix(), before);
        assert_eq!(renderer.drawing_buffer_size(), (1920, 1080));
    }

    #[test]
    fn empty_viewport_does_not_poison_projection() {
        let mut host = HeadlessHost::new(Viewport::new(800, 600));
        let mut adapter = ViewportAdapter::new();
        adapter.register(&mut host);

        let mut cam = camera();
        let mut renderer = HeadlessRenderer::new(RendererOptions::default(), 800, 600);
        let aspect = cam.aspect;
        let empties = [
            Viewport::new(640, 0),
            Viewport::new(0, 480),
            Viewport::new(0, 0),
        ];
        for empty in empties {
            assert!(!adapter.on_resize(empty, &mut cam, &mut renderer));
            assert_eq!(cam.aspect, aspect);
            assert!(cam.projection_matrix().is_finite());
            assert!(cam.view_projection().is_finite());
        }
        assert_eq!(renderer.drawing_buffer_size(), (800, 600));

        assert!(adapter.on_resize(Viewport::new(1024, 512), &mut cam, &mut renderer));
        assert_eq!(cam.aspect, 2.0);
    }

    #[test]
    fn unregistered_adapter_ignores_events() {
        let mut host = HeadlessHost::new(Viewport::new(800, 600));
        let mut adapter = ViewportAdapter::new();
        adapter.register(&mut host);
        adapter.register(&mut host);
        assert_eq!(host.resize_listeners(), 1);

        adapter.deregister(&mut host);
        assert_eq!(host.resize_listeners(), 0);

        let mut cam = camera();
        let mut renderer = HeadlessRenderer::new(RendererOptions::default(), 800, 600);
        assert!(!adapter.on_resize(Viewport::new(100, 100), &mut cam, &mut renderer));
        assert_eq!(cam.aspect, 800.0 / 600.0);
        assert_eq!(renderer.drawing_buffer_size(), (800, 600));
    }
}
