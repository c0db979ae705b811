use crate::resources::{GeometryId, MaterialId, Resources};
use glam::Vec3;
use starscape_common::{Color, NodeId, Transform};
use std::collections::BTreeMap;

/// What a scene node draws or contributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    Points {
        geometry: GeometryId,
        material: MaterialId,
    },
    Mesh {
        geometry: GeometryId,
        material: MaterialId,
    },
    AmbientLight {
        color: Color,
        intensity: f32,
    },
    /// Light arriving from `direction` (pointing from the light towards the origin).
    DirectionalLight {
        color: Color,
        intensity: f32,
        direction: Vec3,
    },
}

impl NodeKind {
    /// Geometry and material referenced by this node, if any.
    pub fn resources(&self) -> Option<(GeometryId, MaterialId)> {
        match *self {
            Self::Points { geometry, material } | Self::Mesh { geometry, material } => {
                Some((geometry, material))
            }
            Self::AmbientLight { .. } | Self::DirectionalLight { .. } => None,
        }
    }
}

/// A child of the scene root.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub transform: Transform,
    pub kind: NodeKind,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: NodeId::new(),
            name: name.into(),
            transform: Transform::default(),
            kind,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// Counts from [`Scene::dispose_attached`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisposeReport {
    pub nodes: usize,
    pub geometries: usize,
    pub materials: usize,
}

/// Scene graph root: a flat list of children in insertion order plus the
/// registry that owns their geometries and materials.
#[derive(Debug, Default)]
pub struct Scene {
    nodes: BTreeMap<NodeId, Node>,
    order: Vec<NodeId>,
    resources: Resources,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a node to the root and return its id.
    pub fn add(&mut self, node: Node) -> NodeId {
        let id = node.id;
        if self.nodes.insert(id, node).is_none() {
            self.order.push(id);
        }
        id
    }

    /// Detach a node. Its resources stay allocated; the caller owns them.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(&id)?;
        self.order.retain(|n| *n != id);
        Some(node)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Children in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut Resources {
        &mut self.resources
    }

    /// Walk every child, release its geometry and material, then detach it.
    ///
    /// Resources shared by several nodes are released once.
    pub fn dispose_attached(&mut self) -> DisposeReport {
        let mut report = DisposeReport::default();
        for id in std::mem::take(&mut self.order) {
            let Some(node) = self.nodes.remove(&id) else {
                continue;
            };
            report.nodes += 1;
            if let Some((geometry, material)) = node.kind.resources() {
                if self.resources.dispose_geometry(geometry) {
                    report.geometries += 1;
                }
                if self.resources.dispose_material(material) {
                    report.materials += 1;
                }
            }
        }
        tracing::debug!(
            nodes = report.nodes,
            geometries = report.geometries,
            materials = report.materials,
            "scene disposed"
        );
        report
    }
}
