use crate::config::LabelConfig;
use crate::font::{FontLoader, FontPoll, FontRequest};
use glam::Vec3;
use rand::Rng;
use starscape_assets::FontSource;
use starscape_common::{NodeId, Transform};
use starscape_render::{
    Geometry, GeometryId, Material, MaterialId, Node, NodeKind, Scene, Typeface,
    build_text_geometry,
};
use std::sync::Arc;

/// Where the typeface load stands.
#[derive(Debug, Default)]
pub enum FontState {
    /// No load started yet.
    #[default]
    Idle,
    Pending(FontRequest),
    Ready(Arc<Typeface>),
    /// The load failed; no label will be shown for the rest of the session.
    Failed,
}

impl FontState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

/// The live text mesh and the resources it exclusively owns.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub node: NodeId,
    pub geometry: GeometryId,
    pub material: MaterialId,
}

/// Builds, animates and disposes the floating text label.
///
/// At most one label exists. It is only built once the typeface is ready and
/// the requested text is non-empty. Text requested while the typeface is
/// still loading is remembered and applied when it arrives; only the latest
/// request is kept.
#[derive(Debug)]
pub struct LabelBuilder {
    config: LabelConfig,
    font: FontState,
    queued: Option<String>,
    label: Option<Label>,
}

impl LabelBuilder {
    pub fn new(config: LabelConfig) -> Self {
        Self {
            config,
            font: FontState::Idle,
            queued: None,
            label: None,
        }
    }

    /// Start loading the typeface. Returns immediately.
    pub fn load_font(&mut self, loader: &dyn FontLoader, source: &FontSource) {
        if !matches!(self.font, FontState::Idle) {
            tracing::warn!(%source, "font load already started; ignoring");
            return;
        }
        tracing::debug!(%source, "requesting typeface");
        self.font = FontState::Pending(loader.load(source));
    }

    /// Install an already-loaded typeface.
    pub fn set_typeface(&mut self, scene: &mut Scene, typeface: Arc<Typeface>) {
        self.font = FontState::Ready(typeface);
        if let Some(text) = self.queued.take() {
            self.rebuild(scene, Some(&text));
        }
    }

    /// Check on a pending typeface load. Call once per frame.
    ///
    /// On success the queued text, if any, is built. On failure the error is
    /// logged and the builder gives up for the session.
    pub fn poll(&mut self, scene: &mut Scene) {
        let FontState::Pending(request) = &mut self.font else {
            return;
        };
        match request.poll() {
            FontPoll::Pending => {}
            FontPoll::Ready(Ok(typeface)) => {
                tracing::info!(family = typeface.family(), "label typeface ready");
                self.set_typeface(scene, Arc::new(typeface));
            }
            FontPoll::Ready(Err(e)) => {
                tracing::error!("failed to load label typeface: {e}");
                self.font = FontState::Failed;
                self.queued = None;
            }
        }
    }

    /// Replace the label with one showing `text`.
    ///
    /// Empty or absent text leaves any existing label untouched. Before the
    /// typeface is ready the text is queued instead.
    pub fn rebuild(&mut self, scene: &mut Scene, text: Option<&str>) {
        let Some(text) = text.filter(|t| !t.is_empty()) else {
            return;
        };

        let typeface = match &self.font {
            FontState::Ready(typeface) => Arc::clone(typeface),
            FontState::Idle | FontState::Pending(_) => {
                tracing::debug!(text, "typeface not ready; queueing label text");
                self.queued = Some(text.to_string());
                return;
            }
            FontState::Failed => return,
        };

        self.dispose(scene);

        let mesh = build_text_geometry(&typeface, text, &self.config.geometry_options());
        let width = mesh
            .compute_bounding_box()
            .map(|bounds| bounds.max.x - bounds.min.x)
            .unwrap_or(0.0);

        let geometry = scene.resources_mut().create_geometry(Geometry::Mesh(mesh));
        let material = scene.resources_mut().create_material(Material::Lit {
            color: self.config.color,
        });
        let position = Vec3::new(-0.5 * width, 0.0, self.config.start_z);
        let node = scene.add(
            Node::new(format!("label:{text}"), NodeKind::Mesh { geometry, material })
                .with_transform(Transform::from_position(position)),
        );

        tracing::debug!(text, width, "label rebuilt");
        self.label = Some(Label {
            text: text.to_string(),
            node,
            geometry,
            material,
        });
    }

    /// Drift the label towards the camera and tumble it slightly. Does
    /// nothing when there is no label.
    ///
    /// Rotation increments are never negative, so both angles grow without
    /// bound.
    pub fn advance(&mut self, scene: &mut Scene, rng: &mut impl Rng) {
        let Some(label) = &self.label else {
            return;
        };
        let Some(node) = scene.get_mut(label.node) else {
            return;
        };

        let cfg = &self.config;
        let t = &mut node.transform;
        t.position.z += cfg.step;
        t.rotation.x += rng.random_range(0.0..cfg.max_rotation_step);
        t.rotation.y += rng.random_range(0.0..cfg.max_rotation_step);

        if t.position.z > cfg.recycle_z {
            t.position.z = cfg.start_z;
            t.position.x = rng.random_range(-cfg.spread_x..cfg.spread_x);
            t.position.y = rng.random_range(-cfg.spread_y..cfg.spread_y);
            tracing::trace!(x = t.position.x, y = t.position.y, "label recycled");
        }
    }

    /// Detach the label and release its geometry and material.
    pub fn dispose(&mut self, scene: &mut Scene) {
        let Some(label) = self.label.take() else {
            return;
        };
        scene.remove(label.node);
        let resources = scene.resources_mut();
        resources.dispose_geometry(label.geometry);
        resources.dispose_material(label.material);
    }

    pub fn label(&self) -> Option<&Label> {
        self.label.as_ref()
    }

    pub fn font_state(&self) -> &FontState {
        &self.font
    }

    /// Text waiting for the typeface.
    pub fn queued_text(&self) -> Option<&str> {
        self.queued.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontRequest;
    use crate::testing::test_typeface;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use starscape_assets::FontError;

    fn ready_builder(scene: &mut Scene) -> LabelBuilder {
        let mut builder = LabelBuilder::new(LabelConfig::default());
        builder.set_typeface(scene, Arc::new(test_typeface()));
        builder
    }

    #[test]
    fn empty_or_absent_text_never_builds() {
        let mut scene = Scene::new();
        let mut builder = ready_builder(&mut scene);
        builder.rebuild(&mut scene, Some(""));
        builder.rebuild(&mut scene, None);
        assert!(builder.label().is_none());
        assert!(scene.is_empty());
        assert_eq!(scene.resources().stats().geometries_created, 0);
    }

    #[test]
    fn empty_text_keeps_existing_label() {
        let mut scene = Scene::new();
        let mut builder = ready_builder(&mut scene);
        builder.rebuild(&mut scene, Some("HI"));
        let before = builder.label().cloned();
        builder.rebuild(&mut scene, Some(""));
        assert_eq!(builder.label().cloned(), before);
    }

    #[test]
    fn label_is_centered_and_starts_far_away() {
        let mut scene = Scene::new();
        let mut builder = ready_builder(&mut scene);
        builder.rebuild(&mut scene, Some("HI"));

        let label = builder.label().unwrap();
        let node = scene.get(label.node).unwrap();
        let bounds = scene
            .resources()
            .geometry(label.geometry)
            .and_then(|g| g.compute_bounding_box())
            .unwrap();
        assert_eq!(node.transform.position.z, -2500.0);
        assert!((node.transform.position.x + 0.5 * (bounds.max.x - bounds.min.x)).abs() < 1e-4);
        assert_eq!(node.transform.position.y, 0.0);
    }

    #[test]
    fn repeated_rebuild_disposes_previous_pair() {
        let mut scene = Scene::new();
        let mut builder = ready_builder(&mut scene);
        let mut previous = Vec::new();
        for text in ["A", "HI", "HIH", "I"] {
            if let Some(label) = builder.label() {
                previous.push(label.clone());
            }
            builder.rebuild(&mut scene, Some(text));
        }

        let stats = scene.resources().stats();
        assert_eq!(stats.geometries_created, 4);
        assert_eq!(stats.geometries_disposed, stats.geometries_created - 1);
        assert_eq!(stats.materials_disposed, stats.materials_created - 1);
        for old in &previous {
            assert!(scene.resources().is_geometry_disposed(old.geometry));
            assert!(scene.resources().is_material_disposed(old.material));
            assert!(!scene.contains(old.node));
        }
        assert_eq!(scene.len(), 1);
        assert_eq!(builder.label().unwrap().text, "I");
    }

    #[test]
    fn text_before_font_is_replayed_once_ready() {
        let mut scene = Scene::new();
        let mut builder = LabelBuilder::new(LabelConfig::default());
        let (resolver, request) = FontRequest::channel();
        builder.font = FontState::Pending(request);

        builder.rebuild(&mut scene, Some("HI"));
        builder.rebuild(&mut scene, Some("IH"));
        assert!(builder.label().is_none());
        assert_eq!(builder.queued_text(), Some("IH"));

        builder.poll(&mut scene);
        assert!(builder.label().is_none());

        resolver.resolve(test_typeface());
        builder.poll(&mut scene);
        assert!(builder.font_state().is_ready());
        assert_eq!(builder.label().unwrap().text, "IH");
        assert_eq!(scene.resources().stats().geometries_created, 1);
        assert!(builder.queued_text().is_none());
    }

    #[test]
    fn font_failure_leaves_label_absent_for_good() {
        let mut scene = Scene::new();
        let mut builder = LabelBuilder::new(LabelConfig::default());
        let (resolver, request) = FontRequest::channel();
        builder.font = FontState::Pending(request);
        builder.rebuild(&mut scene, Some("HI"));

        resolver.reject(FontError::Status(500));
        builder.poll(&mut scene);
        assert!(matches!(builder.font_state(), FontState::Failed));

        builder.rebuild(&mut scene, Some("HI"));
        assert!(builder.label().is_none());
        assert!(scene.is_empty());
    }

    #[test]
    fn advance_without_label_is_noop() {
        let mut scene = Scene::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut builder = ready_builder(&mut scene);
        builder.advance(&mut scene, &mut rng);
        assert!(scene.is_empty());
    }

    #[test]
    fn advance_keeps_depth_in_range_and_recycles() {
        let mut scene = Scene::new();
        let mut rng = StdRng::seed_from_u64(9);
        let mut builder = ready_builder(&mut scene);
        builder.rebuild(&mut scene, Some("HI"));
        let id = builder.label().unwrap().node;

        let mut recycles = 0;
        let mut last_z = scene.get(id).unwrap().transform.position.z;
        let mut last_rotation = scene.get(id).unwrap().transform.rotation;
        for _ in 0..5000 {
            builder.advance(&mut scene, &mut rng);
            let t = scene.get(id).unwrap().transform;
            assert!((-2500.0..=500.0).contains(&t.position.z));
            assert!(t.rotation.x >= last_rotation.x && t.rotation.y >= last_rotation.y);
            if t.position.z < last_z {
                recycles += 1;
                assert_eq!(t.position.z, -2500.0);
                assert!((-500.0..500.0).contains(&t.position.x));
                assert!((-300.0..300.0).contains(&t.position.y));
            } else {
                assert_eq!(t.position.z, last_z + 2.0);
            }
            last_z = t.position.z;
            last_rotation = t.rotation;
        }
        // 1501 steps per pass from -2500 through 500.
        assert_eq!(recycles, 3);
    }

    #[test]
    fn dispose_releases_everything() {
        let mut scene = Scene::new();
        let mut builder = ready_builder(&mut scene);
        builder.rebuild(&mut scene, Some("HI"));
        let label = builder.label().cloned().unwrap();

        builder.dispose(&mut scene);
        assert!(builder.label().is_none());
        assert!(!scene.contains(label.node));
        assert!(scene.resources().is_geometry_disposed(label.geometry));
        assert!(scene.resources().is_material_disposed(label.material));
    }
}
