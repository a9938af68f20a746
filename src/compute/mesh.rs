//! Mesh measurements used by fitness shaping and the drop test.

use glam::DVec3;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: DVec3,
    pub max: DVec3,
}

impl BoundingBox {
    /// Bounding box of a point set, `None` when empty.
    pub fn from_points(points: &[DVec3]) -> Option<Self> {
        let first = *points.first()?;
        Some(points.iter().fold(
            Self {
                min: first,
                max: first,
            },
            |bb, &p| Self {
                min: bb.min.min(p),
                max: bb.max.max(p),
            },
        ))
    }

    /// Edge lengths along each axis.
    #[inline]
    pub fn extents(&self) -> DVec3 {
        self.max - self.min
    }
}

/// Smallest over largest bounding-box extent, in `[0, 1]`.
///
/// Flat plates approach 0 and cubes are 1. Empty or single-point clouds
/// have no extent and report 0.
pub fn thinness_ratio(points: &[DVec3]) -> f64 {
    let Some(bb) = BoundingBox::from_points(points) else {
        return 0.0;
    };
    let extents = bb.extents();
    let largest = extents.max_element();
    if largest <= 0.0 {
        return 0.0;
    }
    extents.min_element() / largest
}

/// Signed enclosed volume of a closed triangle mesh (divergence theorem).
/// Positive when faces are wound counter-clockwise seen from outside.
pub fn signed_volume(points: &[DVec3], faces: &[[usize; 3]]) -> f64 {
    faces
        .iter()
        .map(|&[a, b, c]| points[a].dot(points[b].cross(points[c])))
        .sum::<f64>()
        / 6.0
}

/// Total triangle area.
pub fn surface_area(points: &[DVec3], faces: &[[usize; 3]]) -> f64 {
    faces
        .iter()
        .map(|&[a, b, c]| 0.5 * (points[b] - points[a]).cross(points[c] - points[a]).length())
        .sum()
}

/// A flat surface element for the pressure model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Panel {
    /// Unit normal pointing away from the body.
    pub normal: DVec3,
    /// Area (m^2).
    pub area: f64,
}

/// One panel per triangle. Normals follow the winding, so faces wound
/// counter-clockwise seen from outside give outward panels. Zero-area
/// triangles are skipped.
pub fn outward_panels(points: &[DVec3], faces: &[[usize; 3]]) -> Vec<Panel> {
    faces
        .iter()
        .filter_map(|&[a, b, c]| {
            let cross = (points[b] - points[a]).cross(points[c] - points[a]);
            let double_area = cross.length();
            if double_area <= f64::EPSILON {
                return None;
            }
            Some(Panel {
                normal: cross / double_area,
                area: 0.5 * double_area,
            })
        })
        .collect()
}

/// Panels of an axis-aligned box centered at the origin.
pub fn box_panels(half_extents: DVec3) -> Vec<Panel> {
    let h = half_extents;
    let areas = [4.0 * h.y * h.z, 4.0 * h.x * h.z, 4.0 * h.x * h.y];
    [DVec3::X, DVec3::Y, DVec3::Z]
        .into_iter()
        .zip(areas)
        .flat_map(|(axis, area)| {
            [
                Panel { normal: axis, area },
                Panel {
                    normal: -axis,
                    area,
                },
            ]
        })
        .collect()
}

/// Corners of an axis-aligned box centered at the origin.
pub fn box_corners(half_extents: DVec3) -> [DVec3; 8] {
    let mut corners = [DVec3::ZERO; 8];
    for (i, corner) in corners.iter_mut().enumerate() {
        let sign = |bit: usize| if i & bit == 0 { -1.0 } else { 1.0 };
        *corner = half_extents * DVec3::new(sign(1), sign(2), sign(4));
    }
    corners
}
