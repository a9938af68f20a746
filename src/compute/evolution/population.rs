//! Ordered vehicle population.

use crate::schema::{Vehicle, VehicleTemplate};

use super::genome::{GenomeRng, vertex_distance};

/// An ordered collection of vehicles. Order is significant: ties in
/// ranking fall back to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Population {
    vehicles: Vec<Vehicle>,
}

impl Population {
    /// Wrap existing vehicles.
    pub fn from_vehicles(vehicles: Vec<Vehicle>) -> Self {
        Self { vehicles }
    }

    /// `size` freshly sampled vehicles.
    pub fn random(size: usize, rng: &mut GenomeRng, template: &VehicleTemplate) -> Self {
        Self {
            vehicles: (0..size).map(|_| rng.random_vehicle(template)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.iter()
    }

    /// Mean pairwise vertex distance.
    pub fn diversity(&self) -> f64 {
        let n = self.vehicles.len();
        if n < 2 {
            return 0.0;
        }

        let mut total = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                total += vertex_distance(&self.vehicles[i], &self.vehicles[j]);
            }
        }
        total / (n * (n - 1) / 2) as f64
    }
}
