//! Genome manipulation utilities for evolutionary search.
//!
//! Provides random generation, crossover, and mutation of vehicle vertex
//! clouds. Every operation draws from an explicit, seedable generator.

use glam::DVec3;
use rand::prelude::*;
use rand_distr::Normal;

use crate::schema::{MutationConfig, MutationDistribution, Vehicle, VehicleTemplate};

/// Genome operator errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenomeError {
    #[error("Crossover parents have {left} and {right} vertices")]
    VertexCountMismatch { left: usize, right: usize },
}

/// Random number generator wrapper for genome operations.
pub struct GenomeRng {
    rng: StdRng,
}

impl GenomeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform point in the cube `[0, max_dim_m)^3`.
    pub fn random_point(&mut self, max_dim_m: f64) -> DVec3 {
        DVec3::new(
            self.rng.r#gen::<f64>(),
            self.rng.r#gen::<f64>(),
            self.rng.r#gen::<f64>(),
        ) * max_dim_m
    }

    /// Generate a random vehicle from a template.
    pub fn random_vehicle(&mut self, template: &VehicleTemplate) -> Vehicle {
        let vertices = (0..template.num_vertices)
            .map(|_| self.random_point(template.max_dim_m))
            .collect();
        template.instantiate(vertices)
    }

    /// Perturbation for one coordinate.
    fn perturbation(&mut self, magnitude: f64, distribution: MutationDistribution) -> f64 {
        if !(magnitude > 0.0 && magnitude.is_finite()) {
            return 0.0;
        }
        match distribution {
            MutationDistribution::Uniform => self.rng.gen_range(-magnitude..=magnitude),
            MutationDistribution::Gaussian => match Normal::new(0.0, magnitude) {
                Ok(normal) => self.rng.sample(normal),
                Err(_) => 0.0,
            },
        }
    }

    /// Mutated copy of a vehicle's vertices.
    ///
    /// Each vertex is perturbed with probability `config.chance`; a perturbed
    /// vertex moves on every axis by up to `config.ratio * max_dim_m`.
    /// The vertex count never changes. A non-finite chance or magnitude
    /// leaves every vertex in place.
    pub fn mutate(&mut self, vehicle: &Vehicle, config: &MutationConfig) -> Vec<DVec3> {
        let magnitude = config.ratio * vehicle.max_dim_m;
        let chance = if config.chance.is_finite() {
            config.chance.clamp(0.0, 1.0)
        } else {
            0.0
        };
        vehicle
            .vertices
            .iter()
            .map(|&vertex| {
                if self.rng.gen_bool(chance) {
                    vertex
                        + DVec3::new(
                            self.perturbation(magnitude, config.distribution),
                            self.perturbation(magnitude, config.distribution),
                            self.perturbation(magnitude, config.distribution),
                        )
                } else {
                    vertex
                }
            })
            .collect()
    }

    /// New vehicle from a mutated survivor, keeping its scalar attributes.
    pub fn clone_mutant(&mut self, survivor: &Vehicle, config: &MutationConfig) -> Vehicle {
        let vertices = self.mutate(survivor, config);
        survivor.with_vertices(vertices)
    }

    /// Per-vertex coin-flip crossover of two parents' vertices.
    pub fn crossover(
        &mut self,
        parent1: &Vehicle,
        parent2: &Vehicle,
    ) -> Result<Vec<DVec3>, GenomeError> {
        if parent1.vertices.len() != parent2.vertices.len() {
            return Err(GenomeError::VertexCountMismatch {
                left: parent1.vertices.len(),
                right: parent2.vertices.len(),
            });
        }

        Ok(parent1
            .vertices
            .iter()
            .zip(&parent2.vertices)
            .map(|(&a, &b)| if self.rng.gen_bool(0.5) { a } else { b })
            .collect())
    }
}

/// Mean distance between corresponding vertices of two vehicles.
/// Extra vertices of the longer cloud are ignored.
pub fn vertex_distance(a: &Vehicle, b: &Vehicle) -> f64 {
    let count = a.vertices.len().min(b.vertices.len());
    if count == 0 {
        return 0.0;
    }
    a.vertices
        .iter()
        .zip(&b.vertices)
        .map(|(p, q)| p.distance(*q))
        .sum::<f64>()
        / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn template(num_vertices: usize) -> VehicleTemplate {
        VehicleTemplate {
            num_vertices,
            max_dim_m: 4.5,
            mass_kg: None,
            wing_density: 23.0,
            pilot: false,
        }
    }

    #[test]
    fn test_random_vehicle() {
        let mut rng = GenomeRng::new(42);
        let vehicle = rng.random_vehicle(&template(12));

        assert_eq!(vehicle.vertices.len(), 12);
        assert!(vehicle.faces.is_empty());
        for v in &vehicle.vertices {
            assert!(v.cmpge(DVec3::ZERO).all());
            assert!(v.cmplt(DVec3::splat(4.5)).all());
        }
    }

    #[test]
    fn test_same_seed_same_vehicle() {
        let a = GenomeRng::new(7).random_vehicle(&template(12));
        let b = GenomeRng::new(7).random_vehicle(&template(12));
        let c = GenomeRng::new(8).random_vehicle(&template(12));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_mutation_bounded() {
        let mut rng = GenomeRng::new(42);
        let vehicle = rng.random_vehicle(&template(12));
        let config = MutationConfig {
            chance: 1.0,
            ..Default::default()
        };

        let mutated = rng.mutate(&vehicle, &config);
        assert_eq!(mutated.len(), vehicle.vertices.len());

        let limit = config.ratio * vehicle.max_dim_m + 1e-12;
        for (before, after) in vehicle.vertices.iter().zip(&mutated) {
            assert!((*after - *before).abs().max_element() <= limit);
        }
        assert_ne!(mutated, vehicle.vertices);
    }

    #[test]
    fn test_zero_chance_is_identity() {
        let mut rng = GenomeRng::new(3);
        let vehicle = rng.random_vehicle(&template(8));
        let config = MutationConfig {
            chance: 0.0,
            ..Default::default()
        };
        assert_eq!(rng.mutate(&vehicle, &config), vehicle.vertices);
    }

    #[test]
    fn test_non_finite_settings_are_identity() {
        let mut rng = GenomeRng::new(9);
        let vehicle = rng.random_vehicle(&template(8));

        let nan_chance = MutationConfig {
            chance: f64::NAN,
            ..Default::default()
        };
        assert_eq!(rng.mutate(&vehicle, &nan_chance), vehicle.vertices);

        for distribution in [MutationDistribution::Uniform, MutationDistribution::Gaussian] {
            let bad_ratio = MutationConfig {
                chance: 1.0,
                ratio: f64::INFINITY,
                distribution,
            };
            assert_eq!(rng.mutate(&vehicle, &bad_ratio), vehicle.vertices);
        }
    }

    #[test]
    fn test_gaussian_mutation() {
        let mut rng = GenomeRng::new(11);
        let vehicle = rng.random_vehicle(&template(12));
        let config = MutationConfig {
            chance: 1.0,
            ratio: 0.05,
            distribution: MutationDistribution::Gaussian,
        };
        let mutated = rng.mutate(&vehicle, &config);
        assert_eq!(mutated.len(), 12);
        assert_ne!(mutated, vehicle.vertices);
    }

    #[test]
    fn test_clone_mutant_inherits_attributes() {
        let mut rng = GenomeRng::new(5);
        let mut survivor = rng.random_vehicle(&template(6));
        survivor.pilot = true;
        survivor.mass_kg = Some(40.0);
        survivor.faces = vec![[0, 1, 2]];

        let child = rng.clone_mutant(&survivor, &MutationConfig::default());
        assert_eq!(child.vertices.len(), 6);
        assert!(child.pilot);
        assert_eq!(child.mass_kg, Some(40.0));
        assert!(child.faces.is_empty());
    }

    #[test]
    fn test_crossover() {
        let mut rng = GenomeRng::new(42);
        let g1 = rng.random_vehicle(&template(12));
        let g2 = rng.random_vehicle(&template(12));

        let child = rng.crossover(&g1, &g2).unwrap();
        assert_eq!(child.len(), 12);
        for (i, v) in child.iter().enumerate() {
            assert!(*v == g1.vertices[i] || *v == g2.vertices[i]);
        }
    }

    #[test]
    fn test_crossover_mismatch() {
        let mut rng = GenomeRng::new(42);
        let g1 = rng.random_vehicle(&template(12));
        let g2 = rng.random_vehicle(&template(10));
        assert_eq!(
            rng.crossover(&g1, &g2),
            Err(GenomeError::VertexCountMismatch {
                left: 12,
                right: 10
            })
        );
    }

    #[test]
    fn test_vertex_distance() {
        let mut rng = GenomeRng::new(42);
        let g1 = rng.random_vehicle(&template(12));
        let g2 = g1.clone();
        let g3 = rng.random_vehicle(&template(12));

        assert!(vertex_distance(&g1, &g2).abs() < 1e-12);
        assert!(vertex_distance(&g1, &g3) > 0.0);
    }

    proptest! {
        #[test]
        fn prop_mutation_preserves_length(seed in any::<u64>(), n in 0usize..40, chance in 0.0f64..=1.0) {
            let mut rng = GenomeRng::new(seed);
            let vehicle = rng.random_vehicle(&template(n));
            let config = MutationConfig { chance, ..Default::default() };
            prop_assert_eq!(rng.mutate(&vehicle, &config).len(), n);
        }
    }
}
