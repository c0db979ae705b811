//! Ear-clipping triangulation of polygons with holes.
//!
//! The outer contour must be counter-clockwise and every hole clockwise.
//! Holes are merged into the outer contour through bridge edges, then the
//! resulting simple polygon is clipped ear by ear.

use glam::Vec2;

const EPSILON: f32 = 1e-7;

/// Signed area of a closed contour. Positive for counter-clockwise.
pub fn signed_area(contour: &[Vec2]) -> f32 {
    let n = contour.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = contour[i];
        let b = contour[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum * 0.5
}

/// Even-odd point-in-polygon test.
pub fn contains_point(contour: &[Vec2], p: Vec2) -> bool {
    let n = contour.len();
    let mut inside = false;
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let (a, b) = (contour[i], contour[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Triangulate `outer` with `holes`.
///
/// Returned indices address the concatenation of `outer` followed by each
/// hole in order. Triangles are counter-clockwise.
pub fn triangulate(outer: &[Vec2], holes: &[Vec<Vec2>]) -> Vec<[u32; 3]> {
    let mut points: Vec<Vec2> = outer.to_vec();
    let mut hole_rings: Vec<Vec<usize>> = Vec::with_capacity(holes.len());
    for hole in holes {
        let start = points.len();
        points.extend_from_slice(hole);
        hole_rings.push((start..points.len()).collect());
    }

    let mut polygon: Vec<usize> = (0..outer.len()).collect();
    if polygon.len() < 3 {
        return Vec::new();
    }

    // Merge holes right to left so earlier bridges never cross later holes.
    hole_rings.retain(|ring| ring.len() >= 3);
    hole_rings.sort_by(|a, b| max_x(&points, b).total_cmp(&max_x(&points, a)));
    for k in 0..hole_rings.len() {
        let (ring, pending) = {
            let (head, tail) = hole_rings.split_at(k + 1);
            (&head[k], tail)
        };
        polygon = bridge_hole(&points, &polygon, ring, pending);
    }

    clip_ears(&points, polygon)
}

fn max_x(points: &[Vec2], ring: &[usize]) -> f32 {
    ring.iter()
        .map(|i| points[*i].x)
        .fold(f32::NEG_INFINITY, f32::max)
}

fn bridge_hole(
    points: &[Vec2],
    polygon: &[usize],
    ring: &[usize],
    pending: &[Vec<usize>],
) -> Vec<usize> {
    let Some((m_pos, _)) = ring
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| points[**a].x.total_cmp(&points[**b].x))
    else {
        return polygon.to_vec();
    };
    let m = points[ring[m_pos]];

    let mut candidates: Vec<usize> = (0..polygon.len()).collect();
    candidates.sort_by(|a, b| {
        let da = points[polygon[*a]].distance_squared(m);
        let db = points[polygon[*b]].distance_squared(m);
        da.total_cmp(&db)
    });

    let visible = |pi: usize| {
        let p = points[polygon[pi]];
        let blocked_by = |ring: &[usize]| {
            (0..ring.len()).any(|i| {
                let a = points[ring[i]];
                let b = points[ring[(i + 1) % ring.len()]];
                segments_cross(m, p, a, b)
            })
        };
        !blocked_by(polygon) && !blocked_by(ring) && !pending.iter().any(|r| blocked_by(r))
    };

    let bridge = candidates
        .iter()
        .copied()
        .find(|pi| visible(*pi))
        .unwrap_or_else(|| {
            tracing::warn!("no visible bridge vertex for hole; using nearest");
            candidates[0]
        });

    let mut merged = Vec::with_capacity(polygon.len() + ring.len() + 2);
    merged.extend_from_slice(&polygon[..=bridge]);
    for i in 0..ring.len() {
        merged.push(ring[(m_pos + i) % ring.len()]);
    }
    merged.push(ring[m_pos]);
    merged.push(polygon[bridge]);
    merged.extend_from_slice(&polygon[bridge + 1..]);
    merged
}

/// Proper intersection of segments `p1p2` and `q1q2`. Segments that merely
/// share an endpoint position do not count.
fn segments_cross(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2) -> bool {
    let shares = |a: Vec2, b: Vec2| a.distance_squared(b) <= EPSILON;
    if shares(p1, q1) || shares(p1, q2) || shares(p2, q1) || shares(p2, q2) {
        return false;
    }
    let d1 = cross(q2 - q1, p1 - q1);
    let d2 = cross(q2 - q1, p2 - q1);
    let d3 = cross(p2 - p1, q1 - p1);
    let d4 = cross(p2 - p1, q2 - p1);
    (d1 > EPSILON && d2 < -EPSILON || d1 < -EPSILON && d2 > EPSILON)
        && (d3 > EPSILON && d4 < -EPSILON || d3 < -EPSILON && d4 > EPSILON)
}

fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

fn in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    cross(b - a, p - a) >= -EPSILON
        && cross(c - b, p - b) >= -EPSILON
        && cross(a - c, p - c) >= -EPSILON
}

fn clip_ears(points: &[Vec2], mut polygon: Vec<usize>) -> Vec<[u32; 3]> {
    let mut triangles = Vec::with_capacity(polygon.len().saturating_sub(2));

    while polygon.len() > 3 {
        let n = polygon.len();
        let ear = (0..n).find(|&i| {
            let ia = polygon[(i + n - 1) % n];
            let ib = polygon[i];
            let ic = polygon[(i + 1) % n];
            let (a, b, c) = (points[ia], points[ib], points[ic]);
            if cross(b - a, c - b) <= EPSILON {
                return false;
            }
            !polygon.iter().any(|&j| {
                let p = points[j];
                let coincident = p.distance_squared(a) <= EPSILON
                    || p.distance_squared(b) <= EPSILON
                    || p.distance_squared(c) <= EPSILON;
                !coincident && in_triangle(p, a, b, c)
            })
        });

        let Some(i) = ear else {
            tracing::warn!(remaining = n, "ear clipping stalled; closing with a fan");
            for k in 1..n - 1 {
                triangles.push([polygon[0] as u32, polygon[k] as u32, polygon[k + 1] as u32]);
            }
            return triangles;
        };

        triangles.push([
            polygon[(i + n - 1) % n] as u32,
            polygon[i] as u32,
            polygon[(i + 1) % n] as u32,
        ]);
        polygon.remove(i);
    }

    if polygon.len() == 3 {
        triangles.push([polygon[0] as u32, polygon[1] as u32, polygon[2] as u32]);
    }
    triangles
}
