//! Extruded, bevelled text geometry built from a [`Typeface`].

use crate::resources::MeshData;
use crate::triangulate::{contains_point, signed_area, triangulate};
use crate::typeface::{PathCommand, Typeface};
use glam::{Vec2, Vec3};
use std::f32::consts::FRAC_PI_2;

/// Parameters for [`build_text_geometry`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextGeometryOptions {
    /// Em size in world units.
    pub size: f32,
    /// Extrusion depth along +Z.
    pub depth: f32,
    /// Line segments per curve command.
    pub curve_segments: u32,
    pub bevel_enabled: bool,
    /// How far the bevel extends beyond the front and back faces.
    pub bevel_thickness: f32,
    /// How far the bevel pushes the outline outwards.
    pub bevel_size: f32,
    pub bevel_segments: u32,
}

impl Default for TextGeometryOptions {
    fn default() -> Self {
        Self {
            size: 50.0,
            depth: 2.0,
            curve_segments: 12,
            bevel_enabled: true,
            bevel_thickness: 1.0,
            bevel_size: 0.5,
            bevel_segments: 3,
        }
    }
}

/// A filled region: counter-clockwise outer contour plus clockwise holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub outer: Vec<Vec2>,
    pub holes: Vec<Vec<Vec2>>,
}

/// Lay out `text` and flatten every glyph outline into shapes.
///
/// `\n` starts a new line. Characters missing from the typeface fall back
/// to `?` when available and are skipped otherwise.
pub fn text_shapes(typeface: &Typeface, text: &str, size: f32, curve_segments: u32) -> Vec<Shape> {
    let scale = size / typeface.resolution();
    let line_height = typeface.line_height(size);
    let mut offset = Vec2::ZERO;
    let mut shapes = Vec::new();

    for ch in text.chars() {
        if ch == '\n' {
            offset.x = 0.0;
            offset.y -= line_height;
            continue;
        }
        let Some(glyph) = typeface.glyph(ch).or_else(|| typeface.glyph('?')) else {
            tracing::warn!(?ch, family = typeface.family(), "glyph missing from typeface");
            continue;
        };

        let contours = flatten(&glyph.commands, scale, offset, curve_segments.max(1));
        shapes.extend(group_contours(contours));
        offset.x += glyph.advance * scale;
    }

    shapes
}

/// Build the extruded mesh for `text`. Returns an empty mesh for text with
/// no drawable glyphs.
pub fn build_text_geometry(
    typeface: &Typeface,
    text: &str,
    options: &TextGeometryOptions,
) -> MeshData {
    let shapes = text_shapes(typeface, text, options.size, options.curve_segments);
    let rings = bevel_rings(options);
    let mut mesh = MeshData::default();
    for shape in &shapes {
        extrude_shape(&mut mesh, shape, &rings);
    }
    mesh
}

fn flatten(commands: &[PathCommand], scale: f32, offset: Vec2, segments: u32) -> Vec<Vec<Vec2>> {
    let map = |p: Vec2| p * scale + offset;
    let mut contours = Vec::new();
    let mut current: Vec<Vec2> = Vec::new();
    let mut cursor = Vec2::ZERO;

    for command in commands {
        match *command {
            PathCommand::MoveTo(p) => {
                if !current.is_empty() {
                    contours.push(std::mem::take(&mut current));
                }
                cursor = map(p);
                current.push(cursor);
            }
            PathCommand::LineTo(p) => {
                cursor = map(p);
                current.push(cursor);
            }
            PathCommand::QuadTo { ctrl, to } => {
                let (c, end) = (map(ctrl), map(to));
                for i in 1..=segments {
                    let t = i as f32 / segments as f32;
                    let u = 1.0 - t;
                    current.push(cursor * (u * u) + c * (2.0 * u * t) + end * (t * t));
                }
                cursor = end;
            }
            PathCommand::CubicTo { ctrl1, ctrl2, to } => {
                let (c1, c2, end) = (map(ctrl1), map(ctrl2), map(to));
                for i in 1..=segments {
                    let t = i as f32 / segments as f32;
                    let u = 1.0 - t;
                    current.push(
                        cursor * (u * u * u)
                            + c1 * (3.0 * u * u * t)
                            + c2 * (3.0 * u * t * t)
                            + end * (t * t * t),
                    );
                }
                cursor = end;
            }
        }
    }
    if !current.is_empty() {
        contours.push(current);
    }

    contours
        .into_iter()
        .map(clean_contour)
        .filter(|c| c.len() >= 3 && signed_area(c).abs() > 1e-6)
        .collect()
}

/// Drop consecutive duplicates and the closing point that repeats the first.
fn clean_contour(points: Vec<Vec2>) -> Vec<Vec2> {
    let mut out: Vec<Vec2> = Vec::with_capacity(points.len());
    for p in points {
        if out.last().is_none_or(|last| last.distance_squared(p) > 1e-10) {
            out.push(p);
        }
    }
    while out.len() > 1 && out[0].distance_squared(out[out.len() - 1]) <= 1e-10 {
        out.pop();
    }
    out
}

/// Split one glyph's contours into solids and holes.
///
/// The largest contour's winding defines "solid"; contours wound the other
/// way are holes and attach to the smallest solid that contains them.
fn group_contours(contours: Vec<Vec<Vec2>>) -> Vec<Shape> {
    let Some(solid_sign) = contours
        .iter()
        .map(|c| signed_area(c))
        .max_by(|a, b| a.abs().total_cmp(&b.abs()))
        .map(f32::signum)
    else {
        return Vec::new();
    };

    let mut shapes: Vec<Shape> = Vec::new();
    let mut holes: Vec<Vec<Vec2>> = Vec::new();
    for mut contour in contours {
        let area = signed_area(&contour);
        if area.signum() == solid_sign {
            if area < 0.0 {
                contour.reverse();
            }
            shapes.push(Shape {
                outer: contour,
                holes: Vec::new(),
            });
        } else {
            if area > 0.0 {
                contour.reverse();
            }
            holes.push(contour);
        }
    }

    for hole in holes {
        let owner = shapes
            .iter_mut()
            .filter(|s| contains_point(&s.outer, hole[0]))
            .min_by(|a, b| signed_area(&a.outer).total_cmp(&signed_area(&b.outer)));
        match owner {
            Some(shape) => shape.holes.push(hole),
            None => tracing::debug!("dropping hole outside every solid contour"),
        }
    }

    shapes
}

/// `(outline offset, z)` for each ring of the extrusion, front to back.
fn bevel_rings(options: &TextGeometryOptions) -> Vec<(f32, f32)> {
    let depth = options.depth;
    if !options.bevel_enabled || options.bevel_segments == 0 {
        return vec![(0.0, 0.0), (0.0, depth)];
    }

    let segments = options.bevel_segments;
    let ring = |b: u32| {
        let t = b as f32 / segments as f32 * FRAC_PI_2;
        (options.bevel_size * t.sin(), options.bevel_thickness * t.cos())
    };

    let mut rings = Vec::with_capacity(2 * segments as usize + 2);
    for b in 0..segments {
        let (offset, z) = ring(b);
        rings.push((offset, -z));
    }
    rings.push((options.bevel_size, 0.0));
    rings.push((options.bevel_size, depth));
    for b in (0..segments).rev() {
        let (offset, z) = ring(b);
        rings.push((offset, depth + z));
    }
    rings
}

/// Per-vertex miter directions pointing to the right of travel, which is
/// outside the material for both outer contours and holes.
fn bevel_vectors(contour: &[Vec2]) -> Vec<Vec2> {
    let n = contour.len();
    let right = |a: Vec2, b: Vec2| {
        let d = (b - a).normalize_or_zero();
        Vec2::new(d.y, -d.x)
    };
    (0..n)
        .map(|i| {
            let prev = contour[(i + n - 1) % n];
            let here = contour[i];
            let next = contour[(i + 1) % n];
            let n1 = right(prev, here);
            let n2 = right(here, next);
            let miter = (n1 + n2).normalize_or_zero();
            if miter == Vec2::ZERO {
                return n1;
            }
            let cos = miter.dot(n1).max(1.0 / 3.0);
            miter / cos
        })
        .collect()
}

fn extrude_shape(mesh: &mut MeshData, shape: &Shape, rings: &[(f32, f32)]) {
    let Some((&first, &last)) = rings.first().zip(rings.last()) else {
        return;
    };
    let triangles = triangulate(&shape.outer, &shape.holes);
    let cap: Vec<Vec2> = shape
        .outer
        .iter()
        .chain(shape.holes.iter().flatten())
        .copied()
        .collect();

    // Front cap faces -Z, back cap faces +Z.
    push_cap(mesh, &cap, &triangles, first.1, Vec3::NEG_Z, true);
    push_cap(mesh, &cap, &triangles, last.1, Vec3::Z, false);

    for contour in std::iter::once(&shape.outer).chain(shape.holes.iter()) {
        let bevel = bevel_vectors(contour);
        let at = |i: usize, ring: (f32, f32)| {
            let p = contour[i] + bevel[i] * ring.0;
            Vec3::new(p.x, p.y, ring.1)
        };
        let n = contour.len();
        for pair in rings.windows(2) {
            for i in 0..n {
                let j = (i + 1) % n;
                let quad = [at(i, pair[0]), at(j, pair[0]), at(j, pair[1]), at(i, pair[1])];
                push_quad(mesh, quad, contour[i], contour[j]);
            }
        }
    }
}

fn push_cap(
    mesh: &mut MeshData,
    cap: &[Vec2],
    triangles: &[[u32; 3]],
    z: f32,
    normal: Vec3,
    flip: bool,
) {
    let base = mesh.positions.len() as u32;
    for p in cap {
        mesh.positions.push(Vec3::new(p.x, p.y, z));
        mesh.normals.push(normal);
    }
    for t in triangles {
        if flip {
            mesh.indices.extend([base + t[0], base + t[2], base + t[1]]);
        } else {
            mesh.indices.extend([base + t[0], base + t[1], base + t[2]]);
        }
    }
}

fn push_quad(mesh: &mut MeshData, quad: [Vec3; 4], edge_start: Vec2, edge_end: Vec2) {
    let normal = (quad[1] - quad[0])
        .cross(quad[2] - quad[0])
        .try_normalize()
        .unwrap_or_else(|| {
            let d = (edge_end - edge_start).normalize_or_zero();
            Vec3::new(d.y, -d.x, 0.0)
        });
    let base = mesh.positions.len() as u32;
    for p in quad {
        mesh.positions.push(p);
        mesh.normals.push(normal);
    }
    mesh.indices
        .extend([base, base + 1, base + 2, base, base + 2, base + 3]);
}
