use crate::assembly::{SceneContext, assemble};
use crate::config::StarfieldConfig;
use crate::error::ViewError;
use crate::font::FontLoader;
use crate::host::{FrameHandle, Host};
use crate::label::LabelBuilder;
use crate::render_loop::RenderLoop;
use crate::stars::StarPool;
use crate::viewport::ViewportAdapter;
use rand::SeedableRng;
use rand::rngs::StdRng;
use starscape_common::Viewport;
use starscape_render::{DisposeReport, PerspectiveCamera, Renderer, Scene};

/// What [`StarfieldView::unmount`] released.
#[derive(Debug)]
pub struct TeardownReport {
    /// The scene after every attached node was disposed. Its resource
    /// registry still answers disposal queries for the ids it handed out.
    pub scene: Scene,
    pub disposed: DisposeReport,
    /// Ticks the render loop ran while mounted.
    pub frames: u64,
}

/// One mounted starfield: owns the scene context and every component that
/// acts on it.
///
/// Mounting and unmounting run in a fixed order so that nothing is
/// scheduled against a renderer or camera that has already been released.
pub struct StarfieldView<H: Host> {
    ctx: SceneContext<H::Renderer>,
    rng: StdRng,
    stars: StarPool,
    label: LabelBuilder,
    render_loop: RenderLoop,
    viewport: ViewportAdapter,
}

impl<H: Host> StarfieldView<H> {
    /// Mount a view into `host`.
    ///
    /// Order: assemble the scene, start the font load, hand the initial text
    /// to the label builder (queued until the font arrives), populate the
    /// stars, start the render loop, register for resizes.
    pub fn mount(
        config: StarfieldConfig,
        host: &mut H,
        fonts: &dyn FontLoader,
        text: Option<&str>,
    ) -> Result<Self, ViewError> {
        config.validate()?;
        let _span = tracing::info_span!("mount").entered();

        let mut ctx = assemble(&config, host)?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut label = LabelBuilder::new(config.label.clone());
        label.load_font(fonts, &config.label.font);
        label.rebuild(&mut ctx.scene, text);

        let mut stars = StarPool::new(config.stars.clone());
        stars.populate(&mut ctx.scene, &mut rng, config.stars.count);

        let mut render_loop = RenderLoop::new();
        render_loop.start(host);

        let mut viewport = ViewportAdapter::new();
        viewport.register(host);

        tracing::info!(
            stars = stars.len(),
            nodes = ctx.scene.len(),
            font = %config.label.font,
            "starfield mounted"
        );

        Ok(Self {
            ctx,
            rng,
            stars,
            label,
            render_loop,
            viewport,
        })
    }

    /// The text input changed.
    pub fn set_text(&mut self, text: Option<&str>) {
        self.label.rebuild(&mut self.ctx.scene, text);
    }

    /// Pick up the typeface if its load has finished. Also runs at the start
    /// of every tick.
    pub fn poll_font(&mut self) {
        self.label.poll(&mut self.ctx.scene);
    }

    /// Run one tick for the frame callback `handle`, then request the next
    /// frame. Returns `false` without doing anything when `handle` is not
    /// the loop's pending request.
    pub fn on_frame(&mut self, handle: FrameHandle, host: &mut H) -> bool {
        if !self.render_loop.accept(handle) {
            return false;
        }
        let _span = tracing::trace_span!("tick", frame = self.render_loop.ticks()).entered();

        self.label.poll(&mut self.ctx.scene);
        self.stars.advance(&mut self.ctx.scene, &mut self.rng);
        self.label.advance(&mut self.ctx.scene, &mut self.rng);
        if let Err(e) = self.ctx.renderer.render(&self.ctx.scene, &self.ctx.camera) {
            tracing::error!("render failed: {e}");
        }

        self.render_loop.reschedule(host);
        true
    }

    /// The mount point changed size.
    pub fn on_resize(&mut self, viewport: Viewport) -> bool {
        self.viewport
            .on_resize(viewport, &mut self.ctx.camera, &mut self.ctx.renderer)
    }

    pub fn scene(&self) -> &Scene {
        &self.ctx.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.ctx.camera
    }

    pub fn renderer(&self) -> &H::Renderer {
        &self.ctx.renderer
    }

    pub fn label(&self) -> &LabelBuilder {
        &self.label
    }

    pub fn stars(&self) -> &StarPool {
        &self.stars
    }

    pub fn is_running(&self) -> bool {
        self.render_loop.is_running()
    }

    /// Tear the view down.
    ///
    /// Order: stop listening for resizes, cancel the pending frame, release
    /// the renderer and its surface, dispose every geometry and material
    /// still attached to the scene. A font load still in flight is
    /// abandoned; its result is discarded when it arrives.
    pub fn unmount(mut self, host: &mut H) -> TeardownReport {
        let _span = tracing::info_span!("unmount").entered();

        self.viewport.deregister(host);
        self.render_loop.stop(host);

        let SceneContext {
            mut scene,
            renderer,
            ..
        } = self.ctx;
        host.release_renderer(renderer);
        let disposed = scene.dispose_attached();

        let frames = self.render_loop.ticks();
        tracing::info!(
            frames,
            nodes = disposed.nodes,
            geometries = disposed.geometries,
            materials = disposed.materials,
            "starfield unmounted"
        );

        TeardownReport {
            scene,
            disposed,
            frames,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::ManualFontLoader;
    use crate::headless::HeadlessHost;
    use crate::testing::test_typeface;
    use starscape_assets::FontError;
    use starscape_render::{GeometryId, MaterialId};

    fn config() -> StarfieldConfig {
        StarfieldConfig {
            seed: Some(1234),
            ..StarfieldConfig::default()
        }
    }

    fn mount(
        host: &mut HeadlessHost,
        fonts: &ManualFontLoader,
        text: Option<&str>,
    ) -> StarfieldView<HeadlessHost> {
        StarfieldView::mount(config(), host, fonts, text).unwrap()
    }

    fn resolve_font(fonts: &ManualFontLoader) {
        let (_, resolver) = fonts.take_resolver().unwrap();
        assert!(resolver.resolve(test_typeface()));
    }

    fn run_frames(view: &mut StarfieldView<HeadlessHost>, host: &mut HeadlessHost, n: usize) {
        for _ in 0..n {
            let handle = host.take_due_frame().unwrap();
            assert!(view.on_frame(handle, host));
        }
    }

    #[test]
    fn mount_wires_every_component() {
        let mut host = HeadlessHost::new(Viewport::new(800, 600));
        let fonts = ManualFontLoader::new();
        let view = mount(&mut host, &fonts, None);

        assert_eq!(view.stars().len(), 1000);
        // Two lights plus one node per star.
        assert_eq!(view.scene().len(), 1002);
        assert!(view.is_running());
        assert_eq!(host.pending_frames(), 1);
        assert_eq!(host.resize_listeners(), 1);
        assert_eq!(host.attached_surfaces(), 1);
        assert_eq!(fonts.pending(), 1);
        assert!(view.label().font_state().is_pending());
    }

    #[test]
    fn invalid_config_is_rejected_before_assembly() {
        let mut host = HeadlessHost::new(Viewport::default());
        let fonts = ManualFontLoader::new();
        let mut bad = config();
        bad.stars.min_speed = 20.0;

        let result = StarfieldView::mount(bad, &mut host, &fonts, None);
        assert!(matches!(result, Err(ViewError::Config(_))));
        assert_eq!(host.attached_surfaces(), 0);
        assert_eq!(host.pending_frames(), 0);
    }

    #[test]
    fn frames_tick_and_render() {
        let mut host = HeadlessHost::new(Viewport::default());
        let fonts = ManualFontLoader::new();
        let mut view = mount(&mut host, &fonts, None);

        run_frames(&mut view, &mut host, 10);
        assert_eq!(view.renderer().frames_rendered(), 10);
        assert_eq!(view.renderer().last_frame().points, 1000);
        assert_eq!(host.pending_frames(), 1);
    }

    #[test]
    fn stale_frame_is_ignored() {
        let mut host = HeadlessHost::new(Viewport::default());
        let fonts = ManualFontLoader::new();
        let mut view = mount(&mut host, &fonts, None);

        let handle = host.take_due_frame().unwrap();
        assert!(view.on_frame(handle, &mut host));
        assert!(!view.on_frame(handle, &mut host));
        assert_eq!(view.renderer().frames_rendered(), 1);
        assert_eq!(host.pending_frames(), 1);
    }

    #[test]
    fn resize_updates_camera_and_buffer() {
        let mut host = HeadlessHost::new(Viewport::new(800, 600));
        let fonts = ManualFontLoader::new();
        let mut view = mount(&mut host, &fonts, None);
        assert_eq!(view.camera().aspect, 800.0 / 600.0);

        let viewport = host.resize(1920, 1080).unwrap();
        assert!(view.on_resize(viewport));
        assert_eq!(view.camera().aspect, 1920.0 / 1080.0);
        assert_eq!(view.renderer().drawing_buffer_size(), (1920, 1080));
    }

    #[test]
    fn teardown_releases_everything() {
        let mut host = HeadlessHost::new(Viewport::default());
        let fonts = ManualFontLoader::new();
        let mut view = mount(&mut host, &fonts, Some("HI"));
        resolve_font(&fonts);
        run_frames(&mut view, &mut host, 3);
        assert!(view.label().label().is_some());

        let held: Vec<(GeometryId, MaterialId)> = view
            .scene()
            .nodes()
            .filter_map(|node| node.kind.resources())
            .collect();
        assert_eq!(held.len(), 1001);

        let report = view.unmount(&mut host);
        assert_eq!(host.pending_frames(), 0);
        assert_eq!(host.resize_listeners(), 0);
        assert_eq!(host.attached_surfaces(), 0);
        assert_eq!(report.frames, 3);

        let resources = report.scene.resources();
        for (geometry, material) in held {
            assert!(resources.is_geometry_disposed(geometry));
            assert!(resources.is_material_disposed(material));
        }
        let stats = resources.stats();
        assert_eq!(stats.live_geometries(), 0);
        assert_eq!(stats.live_materials(), 0);
        assert!(report.scene.is_empty());
        assert_eq!(report.disposed.nodes, 1003);
    }

    #[test]
    fn font_failure_leaves_starfield_running() {
        let mut host = HeadlessHost::new(Viewport::default());
        let fonts = ManualFontLoader::new();
        let mut view = mount(&mut host, &fonts, Some("HI"));

        let (_, resolver) = fonts.take_resolver().unwrap();
        resolver.reject(FontError::Canceled);
        run_frames(&mut view, &mut host, 5);

        assert_eq!(view.stars().len(), 1000);
        assert!(view.is_running());
        assert!(view.label().label().is_none());
        assert_eq!(view.renderer().last_frame().meshes, 0);

        view.set_text(Some("HIH"));
        run_frames(&mut view, &mut host, 1);
        assert!(view.label().label().is_none());
    }

    #[test]
    fn text_given_at_mount_appears_when_font_resolves() {
        let mut host = HeadlessHost::new(Viewport::default());
        let fonts = ManualFontLoader::new();
        let mut view = mount(&mut host, &fonts, Some("HI"));
        assert!(view.label().label().is_none());
        assert_eq!(view.label().queued_text(), Some("HI"));

        resolve_font(&fonts);
        view.poll_font();

        let label = view.label().label().unwrap().clone();
        assert_eq!(label.text, "HI");
        let meshes = view
            .scene()
            .nodes()
            .filter(|node| node.name.starts_with("label:"))
            .count();
        assert_eq!(meshes, 1);

        let node = view.scene().get(label.node).unwrap();
        let bounds = view
            .scene()
            .resources()
            .geometry(label.geometry)
            .and_then(|g| g.compute_bounding_box())
            .unwrap();
        assert_eq!(node.transform.position.x, -0.5 * (bounds.max.x - bounds.min.x));
        assert_eq!(node.transform.position.z, -2500.0);

        run_frames(&mut view, &mut host, 1);
        let node = view.scene().get(label.node).unwrap();
        assert_eq!(node.transform.position.z, -2498.0);
        assert_eq!(view.renderer().last_frame().meshes, 1);
    }

    #[test]
    fn only_latest_early_text_is_replayed() {
        let mut host = HeadlessHost::new(Viewport::default());
        let fonts = ManualFontLoader::new();
        let mut view = mount(&mut host, &fonts, Some("HI"));
        view.set_text(Some("OH"));

        resolve_font(&fonts);
        view.poll_font();

        assert_eq!(view.label().label().unwrap().text, "OH");
        let stats = view.scene().resources().stats();
        // 1000 star geometries plus exactly one label geometry.
        assert_eq!(stats.geometries_created, 1001);
    }

    #[test]
    fn repeated_text_changes_do_not_leak() {
        let mut host = HeadlessHost::new(Viewport::default());
        let fonts = ManualFontLoader::new();
        let mut view = mount(&mut host, &fonts, None);
        resolve_font(&fonts);
        view.poll_font();

        view.set_text(Some("HI"));
        view.set_text(Some("HO"));
        view.set_text(Some(""));
        view.set_text(None);

        let stats = view.scene().resources().stats();
        assert_eq!(stats.geometries_created - 1000, 2);
        assert_eq!(stats.geometries_disposed, 1);
        // One shared star material plus the label materials.
        assert_eq!(stats.materials_created - 1, 2);
        assert_eq!(stats.materials_disposed, 1);
        assert_eq!(view.label().label().unwrap().text, "HO");
    }

    #[test]
    fn late_font_after_unmount_is_dropped() {
        let mut host = HeadlessHost::new(Viewport::default());
        let fonts = ManualFontLoader::new();
        let view = mount(&mut host, &fonts, Some("HI"));

        let (_, resolver) = fonts.take_resolver().unwrap();
        let report = view.unmount(&mut host);
        assert!(!resolver.resolve(test_typeface()));
        assert_eq!(report.scene.resources().stats().geometries_created, 1000);
    }
}
