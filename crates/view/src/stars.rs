use crate::config::StarConfig;
use glam::Vec3;
use rand::Rng;
use starscape_common::{NodeId, Transform};
use starscape_render::{Geometry, Material, MaterialId, Node, NodeKind, Scene};

/// One point-particle drifting towards the viewer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    pub position: Vec3,
    pub speed: f32,
    pub node: NodeId,
}

/// Fixed-size pool of stars scattered through a cube of side `2 * extent`.
///
/// Stars are never destroyed individually. A star reaching the far bound is
/// recycled: it jumps back to the near bound at a fresh lateral position and
/// speed.
#[derive(Debug)]
pub struct StarPool {
    config: StarConfig,
    stars: Vec<Star>,
    material: Option<MaterialId>,
}

impl StarPool {
    pub fn new(config: StarConfig) -> Self {
        Self {
            config,
            stars: Vec::new(),
            material: None,
        }
    }

    /// Allocate `count` stars and attach them to the scene.
    ///
    /// Each star gets its own single-vertex geometry; all stars share one
    /// points material.
    pub fn populate(&mut self, scene: &mut Scene, rng: &mut impl Rng, count: usize) {
        let material = *self.material.get_or_insert_with(|| {
            scene.resources_mut().create_material(Material::Points {
                color: self.config.color,
                size: self.config.size,
            })
        });

        self.stars.reserve(count);
        for _ in 0..count {
            let extent = self.config.extent;
            let position = Vec3::new(
                rng.random_range(-extent..extent),
                rng.random_range(-extent..extent),
                rng.random_range(-extent..extent),
            );
            let speed = self.random_speed(rng);
            let geometry = scene.resources_mut().create_geometry(Geometry::single_point());
            let node = scene.add(
                Node::new("star", NodeKind::Points { geometry, material })
                    .with_transform(Transform::from_position(position)),
            );
            self.stars.push(Star {
                position,
                speed,
                node,
            });
        }

        tracing::debug!(count, total = self.stars.len(), "star pool populated");
    }

    /// Move every star forward by its speed, recycling those that reach the
    /// far bound, and write the new positions into the scene.
    pub fn advance(&mut self, scene: &mut Scene, rng: &mut impl Rng) {
        let extent = self.config.extent;
        let (min_speed, max_speed) = (self.config.min_speed, self.config.max_speed);
        let mut recycled = 0usize;

        for star in &mut self.stars {
            star.position.z += star.speed;
            if star.position.z >= extent {
                star.position = Vec3::new(
                    rng.random_range(-extent..extent),
                    rng.random_range(-extent..extent),
                    -extent,
                );
                star.speed = rng.random_range(min_speed..max_speed);
                recycled += 1;
            }
            if let Some(node) = scene.get_mut(star.node) {
                node.transform.position = star.position;
            }
        }

        tracing::trace!(recycled, "stars advanced");
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    fn random_speed(&self, rng: &mut impl Rng) -> f32 {
        rng.random_range(self.config.min_speed..self.config.max_speed)
    }
}
