use glam::Vec3;
use starscape_common::Color;
use std::collections::BTreeMap;

/// Handle to a geometry owned by a [`Resources`] registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(pub u64);

/// Handle to a material owned by a [`Resources`] registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u64);

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Smallest box containing every point, or `None` for an empty set.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let first = *points.first()?;
        let (min, max) = points
            .iter()
            .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
        Some(Self { min, max })
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// Indexed triangle mesh with per-vertex normals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn compute_bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(&self.positions)
    }
}

/// Vertex data that a node can draw.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Free-standing points rendered as screen-space dots.
    Points { positions: Vec<Vec3> },
    /// Lit triangle mesh.
    Mesh(MeshData),
}

impl Geometry {
    pub fn single_point() -> Self {
        Self::Points {
            positions: vec![Vec3::ZERO],
        }
    }

    pub fn vertex_count(&self) -> usize {
        match self {
            Self::Points { positions } => positions.len(),
            Self::Mesh(mesh) => mesh.vertex_count(),
        }
    }

    pub fn compute_bounding_box(&self) -> Option<Aabb> {
        match self {
            Self::Points { positions } => Aabb::from_points(positions),
            Self::Mesh(mesh) => mesh.compute_bounding_box(),
        }
    }
}

/// Surface description for a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    /// Unlit dots of a fixed pixel size.
    Points { color: Color, size: f32 },
    /// Mesh shaded by the scene's ambient and directional lights.
    Lit { color: Color },
}

/// Running totals of allocations and releases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceStats {
    pub geometries_created: u64,
    pub geometries_disposed: u64,
    pub materials_created: u64,
    pub materials_disposed: u64,
}

impl ResourceStats {
    pub fn live_geometries(&self) -> u64 {
        self.geometries_created - self.geometries_disposed
    }

    pub fn live_materials(&self) -> u64 {
        self.materials_created - self.materials_disposed
    }
}

/// Registry of geometries and materials.
///
/// Resources are released explicitly through `dispose_*`. Handles come from
/// one counter and are never reused, so a handle this registry issued that is
/// no longer live has been released; no record of past releases is kept.
/// Releasing the same handle twice is a no-op.
#[derive(Debug, Default)]
pub struct Resources {
    geometries: BTreeMap<GeometryId, Geometry>,
    materials: BTreeMap<MaterialId, Material>,
    next_id: u64,
    stats: ResourceStats,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_geometry(&mut self, geometry: Geometry) -> GeometryId {
        let id = GeometryId(self.allocate_id());
        self.geometries.insert(id, geometry);
        self.stats.geometries_created += 1;
        id
    }

    pub fn create_material(&mut self, material: Material) -> MaterialId {
        let id = MaterialId(self.allocate_id());
        self.materials.insert(id, material);
        self.stats.materials_created += 1;
        id
    }

    /// Release a geometry. Returns `true` if it was live.
    pub fn dispose_geometry(&mut self, id: GeometryId) -> bool {
        if self.geometries.remove(&id).is_some() {
            self.stats.geometries_disposed += 1;
            true
        } else {
            false
        }
    }

    /// Release a material. Returns `true` if it was live.
    pub fn dispose_material(&mut self, id: MaterialId) -> bool {
        if self.materials.remove(&id).is_some() {
            self.stats.materials_disposed += 1;
            true
        } else {
            false
        }
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&Geometry> {
        self.geometries.get(&id)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(&id)
    }

    pub fn geometries(&self) -> impl Iterator<Item = (&GeometryId, &Geometry)> {
        self.geometries.iter()
    }

    pub fn is_geometry_disposed(&self, id: GeometryId) -> bool {
        self.was_issued(id.0) && !self.geometries.contains_key(&id)
    }

    pub fn is_material_disposed(&self, id: MaterialId) -> bool {
        self.was_issued(id.0) && !self.materials.contains_key(&id)
    }

    pub fn stats(&self) -> ResourceStats {
        self.stats
    }

    fn was_issued(&self, raw: u64) -> bool {
        (1..=self.next_id).contains(&raw)
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_dispose_geometry() {
        let mut res = Resources::new();
        let id = res.create_geometry(Geometry::single_point());
        assert!(res.geometry(id).is_some());
        assert!(!res.is_geometry_disposed(id));

        assert!(res.dispose_geometry(id));
        assert!(res.geometry(id).is_none());
        assert!(res.is_geometry_disposed(id));
        assert_eq!(res.stats().live_geometries(), 0);
    }

    #[test]
    fn double_dispose_counts_once() {
        let mut res = Resources::new();
        let id = res.create_material(Material::Lit {
            color: Color::WHITE,
        });
        assert!(res.dispose_material(id));
        assert!(!res.dispose_material(id));
        assert_eq!(res.stats().materials_disposed, 1);
    }

    #[test]
    fn disposed_status_survives_many_releases() {
        let mut res = Resources::new();
        let ids: Vec<GeometryId> = (0..1000)
            .map(|_| res.create_geometry(Geometry::single_point()))
            .collect();
        let live = res.create_geometry(Geometry::single_point());
        for id in &ids {
            assert!(res.dispose_geometry(*id));
        }

        assert!(ids.iter().all(|id| res.is_geometry_disposed(*id)));
        assert!(!res.is_geometry_disposed(live));
        assert!(!res.is_geometry_disposed(GeometryId(0)));
        assert!(!res.is_geometry_disposed(GeometryId(live.0 + 1)));
        assert_eq!(res.stats().geometries_disposed, 1000);
        assert!(!res.dispose_geometry(ids[0]));
    }

    #[test]
    fn ids_are_unique_across_kinds() {
        let mut res = Resources::new();
        let g = res.create_geometry(Geometry::single_point());
        let m = res.create_material(Material::Points {
            color: Color::WHITE,
            size: 2.0,
        });
        assert_ne!(g.0, m.0);
    }

    #[test]
    fn aabb_from_points() {
        let aabb = Aabb::from_points(&[
            Vec3::new(-1.0, 2.0, 0.0),
            Vec3::new(3.0, -2.0, 1.0),
        ])
        .unwrap();
        assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(3.0, 2.0, 1.0));
        assert_eq!(aabb.size(), Vec3::new(4.0, 4.0, 1.0));
        assert!(Aabb::from_points(&[]).is_none());
    }
}
