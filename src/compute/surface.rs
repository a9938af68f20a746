//! Surface reconstruction: vertex cloud to closed triangle mesh.
//!
//! # Spherical hull
//!
//! Each point is projected onto the unit sphere around a center. The convex
//! hull of those directions triangulates the sphere, and reusing that
//! connectivity on the original points gives a star-shaped surface around
//! the center. It approximates a spherical Delaunay triangulation closely
//! enough for evolved shapes.

use std::collections::HashMap;

use glam::DVec3;

use super::convex_hull_with_tolerance;

/// Reconstructed mesh. `points` always equals the input cloud.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Surface {
    /// Input points, unchanged.
    pub points: Vec<DVec3>,
    /// Triangles indexing into `points`. Empty when no surface exists.
    pub faces: Vec<[usize; 3]>,
}

impl Surface {
    /// Surface with no faces.
    pub fn degenerate(points: &[DVec3]) -> Self {
        Self {
            points: points.to_vec(),
            faces: Vec::new(),
        }
    }

    /// Whether reconstruction produced no faces.
    pub fn is_degenerate(&self) -> bool {
        self.faces.is_empty()
    }
}

/// Strategy turning a vertex cloud into a surface.
///
/// Implementations must return the input points unchanged, in order, so
/// index-based genome operators remain valid. Faces must index into those
/// points and be wound counter-clockwise seen from outside; the drop test
/// orients its panels by winding.
pub trait SurfaceBuilder: Send + Sync {
    fn build(&self, points: &[DVec3]) -> Surface;
}

impl<F> SurfaceBuilder for F
where
    F: Fn(&[DVec3]) -> Surface + Send + Sync,
{
    fn build(&self, points: &[DVec3]) -> Surface {
        self(points)
    }
}

/// Star-shaped surface from the convex hull of center-relative directions.
#[derive(Debug, Clone, PartialEq)]
pub struct SphericalHullSurface {
    /// Projection center. `None` uses the centroid of the cloud.
    pub center: Option<DVec3>,
    /// Decimal places directions are rounded to before deduplication.
    pub rounding_decimals: i32,
    /// Points closer than this to the center are ignored.
    pub tolerance: f64,
}

impl Default for SphericalHullSurface {
    fn default() -> Self {
        Self {
            center: None,
            rounding_decimals: 6,
            tolerance: 1e-12,
        }
    }
}

impl SphericalHullSurface {
    /// Builder with an explicit center. Clouds should be star-shaped around
    /// it, otherwise the face winding does not point away from the body.
    pub fn with_center(center: DVec3) -> Self {
        Self {
            center: Some(center),
            ..Default::default()
        }
    }

    /// Half a rounding step: directions closer than this to the hull count
    /// as lying on it.
    fn hull_tolerance(&self) -> f64 {
        (0.5 * 10f64.powi(-self.rounding_decimals)).max(1e-10)
    }

    /// Unique rounded directions and, for each, the first point index it came from.
    fn unique_directions(&self, points: &[DVec3], center: DVec3) -> (Vec<DVec3>, Vec<usize>) {
        let scale = 10f64.powi(self.rounding_decimals);
        let mut seen: HashMap<[i64; 3], usize> = HashMap::new();
        let mut directions = Vec::new();
        let mut sources = Vec::new();

        for (index, &point) in points.iter().enumerate() {
            let offset = point - center;
            let norm = offset.length();
            if !(norm > self.tolerance) {
                continue;
            }

            let rounded = (offset / norm * scale).round();
            let key = [rounded.x as i64, rounded.y as i64, rounded.z as i64];
            if seen.contains_key(&key) {
                continue;
            }

            seen.insert(key, directions.len());
            directions.push(rounded / scale);
            sources.push(index);
        }

        (directions, sources)
    }
}

impl SurfaceBuilder for SphericalHullSurface {
    fn build(&self, points: &[DVec3]) -> Surface {
        if points.len() < 4 {
            return Surface::degenerate(points);
        }

        let center = self
            .center
            .unwrap_or_else(|| points.iter().sum::<DVec3>() / points.len() as f64);

        let (directions, sources) = self.unique_directions(points, center);
        if directions.len() < 4 {
            log::debug!(
                "Only {} distinct directions from {} points, no surface",
                directions.len(),
                points.len()
            );
            return Surface::degenerate(points);
        }

        match convex_hull_with_tolerance(&directions, self.hull_tolerance()) {
            Ok(hull) => Surface {
                points: points.to_vec(),
                faces: hull
                    .into_iter()
                    .map(|[a, b, c]| [sources[a], sources[b], sources[c]])
                    .collect(),
            },
            Err(err) => {
                log::debug!("Direction hull failed ({}), no surface", err);
                Surface::degenerate(points)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::is_closed;
    use proptest::prelude::*;

    fn cube(half: f64) -> Vec<DVec3> {
        let mut corners = Vec::new();
        for x in [-half, half] {
            for y in [-half, half] {
                for z in [-half, half] {
                    corners.push(DVec3::new(x, y, z));
                }
            }
        }
        corners
    }

    #[test]
    fn test_three_points_degenerate() {
        let points = vec![DVec3::ZERO, DVec3::X, DVec3::Y];
        let surface = SphericalHullSurface::default().build(&points);
        assert!(surface.faces.is_empty());
        assert_eq!(surface.points, points);
    }

    #[test]
    fn test_cube_surface() {
        let points = cube(0.5);
        let surface = SphericalHullSurface::default().build(&points);
        assert_eq!(surface.points, points);
        assert_eq!(surface.faces.len(), 12);
    }

    #[test]
    fn test_points_at_center_ignored() {
        // Two points at the centroid plus three distinct directions.
        let points = vec![
            DVec3::ZERO,
            DVec3::ZERO,
            DVec3::X,
            DVec3::Y,
            DVec3::new(-1.0, -1.0, 0.0),
        ];
        let surface = SphericalHullSurface::with_center(DVec3::ZERO).build(&points);
        assert!(surface.is_degenerate());
        assert_eq!(surface.points, points);
    }

    #[test]
    fn test_duplicate_directions_collapse() {
        // Points along the same rays collapse to four directions.
        let mut points = vec![
            DVec3::new(1.0, 1.0, 1.0),
            DVec3::new(1.0, -1.0, -1.0),
            DVec3::new(-1.0, 1.0, -1.0),
            DVec3::new(-1.0, -1.0, 1.0),
        ];
        points.extend(points.clone().iter().map(|p| *p * 2.0));

        let surface = SphericalHullSurface::with_center(DVec3::ZERO).build(&points);
        assert_eq!(surface.faces.len(), 4);
        assert!(surface.faces.iter().flatten().all(|&i| i < 4));
    }

    #[test]
    fn test_star_shaped_cloud_uses_every_point() {
        // A non-convex star: alternating radii still project to distinct directions.
        let points: Vec<DVec3> = vec![
            DVec3::new(2.0, 0.0, 0.0),
            DVec3::new(-0.5, 0.0, 0.0),
            DVec3::new(0.0, 2.0, 0.0),
            DVec3::new(0.0, -0.5, 0.0),
            DVec3::new(0.0, 0.0, 2.0),
            DVec3::new(0.0, 0.0, -0.5),
        ];
        let surface = SphericalHullSurface::with_center(DVec3::ZERO).build(&points);
        assert_eq!(surface.faces.len(), 8);
        for i in 0..points.len() {
            assert!(surface.faces.iter().flatten().any(|&f| f == i));
        }
    }

    #[test]
    fn test_closure_builder() {
        let builder = |points: &[DVec3]| Surface::degenerate(points);
        let surface = builder.build(&cube(1.0));
        assert!(surface.is_degenerate());
    }

    fn cloud() -> impl Strategy<Value = Vec<DVec3>> {
        prop::collection::vec(
            (-5.0f64..5.0, -5.0f64..5.0, -5.0f64..5.0).prop_map(|(x, y, z)| DVec3::new(x, y, z)),
            0..24,
        )
    }

    proptest! {
        #[test]
        fn prop_points_preserved_and_faces_in_range(points in cloud()) {
            let surface = SphericalHullSurface::default().build(&points);
            prop_assert_eq!(&surface.points, &points);
            for face in &surface.faces {
                for &i in face {
                    prop_assert!(i < points.len());
                }
            }
            if points.len() < 4 {
                prop_assert!(surface.faces.is_empty());
            }
        }

        #[test]
        fn prop_surface_is_closed(points in cloud()) {
            let surface = SphericalHullSurface::default().build(&points);
            prop_assert!(surface.is_degenerate() || is_closed(&surface.faces));
        }

        #[test]
        fn prop_near_duplicate_clouds_stay_closed(
            base in prop::collection::vec(
                (-5.0f64..5.0, -5.0f64..5.0, -5.0f64..5.0).prop_map(|(x, y, z)| DVec3::new(x, y, z)),
                4..12,
            ),
            scale in prop::sample::select(vec![1e-6, 3e-6, 1e-5]),
            signs in prop::collection::vec(any::<bool>(), 36),
        ) {
            let mut points = base.clone();
            points.extend(base.iter().enumerate().map(|(i, p)| {
                let sign = |k: usize| if signs[(3 * i + k) % signs.len()] { scale } else { -scale };
                *p + DVec3::new(sign(0), sign(1), sign(2))
            }));

            let surface = SphericalHullSurface::default().build(&points);
            prop_assert_eq!(&surface.points, &points);
            prop_assert!(surface.is_degenerate() || is_closed(&surface.faces));
        }

        #[test]
        fn prop_deterministic(points in cloud()) {
            let builder = SphericalHullSurface::default();
            prop_assert_eq!(builder.build(&points), builder.build(&points));
        }
    }
}
