//! Vehicle (genome) data types.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// An evolvable airframe: a fixed-length vertex cloud plus physical attributes.
///
/// The vertices are the genes. `faces` is derived from them by a
/// [`SurfaceBuilder`](crate::compute::SurfaceBuilder) and may be empty for
/// degenerate clouds. This type is also the serialized form reported in
/// generation results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Vertex cloud (m).
    pub vertices: Vec<DVec3>,
    /// Triangles indexing into `vertices`.
    #[serde(default)]
    pub faces: Vec<[usize; 3]>,
    /// Envelope for random sampling and mutation magnitude (m).
    pub max_dim_m: f64,
    /// Wing mass override (kg).
    #[serde(default)]
    pub mass_kg: Option<f64>,
    /// Drop orientation as XYZ Euler angles (degrees).
    #[serde(default)]
    pub orientation: Option<[f64; 3]>,
    /// Wing material density (kg/m^3).
    pub wing_density: f64,
    /// Whether the pilot body is attached.
    #[serde(default)]
    pub pilot: bool,
}

impl Vehicle {
    /// Whether a surface has been reconstructed.
    pub fn has_surface(&self) -> bool {
        !self.faces.is_empty()
    }

    /// A vehicle with new genes and the same scalar attributes.
    /// The face list is dropped since it no longer matches the genes.
    pub fn with_vertices(&self, vertices: Vec<DVec3>) -> Self {
        Self {
            vertices,
            faces: Vec::new(),
            max_dim_m: self.max_dim_m,
            mass_kg: self.mass_kg,
            orientation: self.orientation,
            wing_density: self.wing_density,
            pilot: self.pilot,
        }
    }
}

/// Attributes used to create vehicles from scratch.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleTemplate {
    /// Genes per vehicle.
    pub num_vertices: usize,
    /// Sampling envelope (m).
    pub max_dim_m: f64,
    /// Wing mass override (kg).
    pub mass_kg: Option<f64>,
    /// Wing material density (kg/m^3).
    pub wing_density: f64,
    /// Whether the pilot body is attached.
    pub pilot: bool,
}

impl VehicleTemplate {
    /// Build a vehicle from this template and the given genes.
    pub fn instantiate(&self, vertices: Vec<DVec3>) -> Vehicle {
        Vehicle {
            vertices,
            faces: Vec::new(),
            max_dim_m: self.max_dim_m,
            mass_kg: self.mass_kg,
            orientation: None,
            wing_density: self.wing_density,
            pilot: self.pilot,
        }
    }
}
