//! Incremental 3D convex hull.
//!
//! Small and deterministic: the hull is grown one point at a time in input
//! order, which is plenty for the few dozen direction vectors a genome has.

use std::collections::HashSet;

use glam::DVec3;

/// Relative tolerance for visibility and flatness tests.
const EPSILON: f64 = 1e-10;

/// Reasons a hull cannot be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HullError {
    #[error("Convex hull needs at least 4 points, got {0}")]
    TooFewPoints(usize),
    #[error("Points are coincident, collinear or coplanar")]
    Flat,
    #[error("Hull faces do not form a closed surface")]
    NotClosed,
}

/// Hull facet with an outward plane.
struct Facet {
    vertices: [usize; 3],
    normal: DVec3,
    offset: f64,
    alive: bool,
}

impl Facet {
    fn new(points: &[DVec3], vertices: [usize; 3]) -> Self {
        let [a, b, c] = vertices;
        let normal = (points[b] - points[a])
            .cross(points[c] - points[a])
            .normalize_or_zero();
        Self {
            vertices,
            normal,
            offset: normal.dot(points[a]),
            alive: true,
        }
    }

    /// Signed distance of `point` above the facet plane.
    #[inline]
    fn distance(&self, point: DVec3) -> f64 {
        self.normal.dot(point) - self.offset
    }

    fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.vertices;
        [(a, b), (b, c), (c, a)]
    }
}

/// Compute the convex hull of `points`.
///
/// Returns triangles as index triples into `points`, wound counter-clockwise
/// when seen from outside. Points strictly inside the hull, or lying on it
/// without being needed as a corner, are not referenced.
pub fn convex_hull(points: &[DVec3]) -> Result<Vec<[usize; 3]>, HullError> {
    let scale = points
        .iter()
        .map(|p| p.abs().max_element())
        .fold(0.0f64, f64::max)
        .max(1.0);
    convex_hull_with_tolerance(points, EPSILON * scale)
}

/// [`convex_hull`] with an absolute distance tolerance.
///
/// Points within `tolerance` of the current hull are treated as lying on it.
/// Inputs snapped to a grid should pass about half the grid spacing. The
/// result is checked to be a closed surface; [`HullError::NotClosed`] is
/// returned otherwise.
pub fn convex_hull_with_tolerance(
    points: &[DVec3],
    tolerance: f64,
) -> Result<Vec<[usize; 3]>, HullError> {
    if points.len() < 4 {
        return Err(HullError::TooFewPoints(points.len()));
    }

    let simplex = initial_simplex(points, tolerance)?;
    let interior = simplex.iter().map(|&i| points[i]).sum::<DVec3>() / 4.0;

    let [i0, i1, i2, i3] = simplex;
    let mut facets: Vec<Facet> = [[i0, i1, i2], [i0, i1, i3], [i0, i2, i3], [i1, i2, i3]]
        .into_iter()
        .map(|tri| {
            let facet = Facet::new(points, tri);
            if facet.distance(interior) > 0.0 {
                Facet::new(points, [tri[0], tri[2], tri[1]])
            } else {
                facet
            }
        })
        .collect();

    for (index, &point) in points.iter().enumerate() {
        if simplex.contains(&index) {
            continue;
        }

        let visible: Vec<usize> = facets
            .iter()
            .enumerate()
            .filter(|(_, f)| f.alive && f.distance(point) > tolerance)
            .map(|(i, _)| i)
            .collect();

        if visible.is_empty() {
            continue;
        }

        let visible_edges: HashSet<(usize, usize)> =
            visible.iter().flat_map(|&f| facets[f].edges()).collect();

        for &f in &visible {
            facets[f].alive = false;
        }

        // Horizon edges keep the winding of the facet being replaced.
        for &f in &visible {
            for (a, b) in facets[f].edges() {
                if !visible_edges.contains(&(b, a)) {
                    facets.push(Facet::new(points, [a, b, index]));
                }
            }
        }
    }

    let faces: Vec<[usize; 3]> = facets
        .into_iter()
        .filter(|f| f.alive)
        .map(|f| f.vertices)
        .collect();

    if !is_closed(&faces) {
        return Err(HullError::NotClosed);
    }
    Ok(faces)
}

/// Whether `faces` form a closed, consistently wound surface of genus zero:
/// every directed edge appears once with its reverse present, and
/// `V - E + F == 2`.
pub fn is_closed(faces: &[[usize; 3]]) -> bool {
    if faces.len() < 4 {
        return false;
    }

    let mut edges = HashSet::with_capacity(faces.len() * 3);
    let mut vertices = HashSet::new();
    for &[a, b, c] in faces {
        if a == b || b == c || c == a {
            return false;
        }
        for edge in [(a, b), (b, c), (c, a)] {
            if !edges.insert(edge) {
                return false;
            }
        }
        vertices.extend([a, b, c]);
    }

    if !edges.iter().all(|&(a, b)| edges.contains(&(b, a))) {
        return false;
    }

    let euler = vertices.len() as i64 - (edges.len() / 2) as i64 + faces.len() as i64;
    euler == 2
}

/// Pick four affinely independent points, spreading them as far as possible.
fn initial_simplex(points: &[DVec3], tolerance: f64) -> Result<[usize; 4], HullError> {
    let i0 = points
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.x.total_cmp(&b.1.x))
        .map(|(i, _)| i)
        .ok_or(HullError::TooFewPoints(0))?;
    let p0 = points[i0];

    let (i1, d1) = farthest(points, |p| p.distance(p0));
    if d1 <= tolerance {
        return Err(HullError::Flat);
    }
    let axis = (points[i1] - p0).normalize();

    let (i2, d2) = farthest(points, |p| (p - p0).cross(axis).length());
    if d2 <= tolerance {
        return Err(HullError::Flat);
    }
    let normal = (points[i1] - p0).cross(points[i2] - p0).normalize();

    let (i3, d3) = farthest(points, |p| (p - p0).dot(normal).abs());
    if d3 <= tolerance {
        return Err(HullError::Flat);
    }

    Ok([i0, i1, i2, i3])
}

/// Index and value of the point maximising `measure`; first wins on ties.
fn farthest(points: &[DVec3], measure: impl Fn(DVec3) -> f64) -> (usize, f64) {
    points
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &p)| {
            let value = measure(p);
            if value > best.1 { (i, value) } else { best }
        })
}
