//! Drop test simulation.
//!
//! The [`Simulator`] trait is the boundary the fitness evaluator depends on:
//! a scene goes in, the wing body's trajectory up to first ground contact
//! comes out. [`DropTestSimulator`] is the built-in implementation.

use glam::{DQuat, DVec3, EulerRot};

use crate::schema::DropTestConfig;

use super::mesh::{Panel, box_corners, box_panels, outward_panels, signed_volume, surface_area};

/// Wing material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WingMaterial {
    /// Density (kg/m^3).
    pub density: f64,
    /// Mass override (kg); replaces `density * volume` when set.
    pub mass_kg: Option<f64>,
}

/// Auxiliary box rigidly attached to the wing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PilotBody {
    /// Box half extents (m).
    pub half_extents: DVec3,
    /// Mass (kg).
    pub mass_kg: f64,
    /// Box center relative to the wing reference point, in the wing frame (m).
    pub offset: DVec3,
}

/// Everything a drop test needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Wing vertices in the wing frame (m).
    pub vertices: Vec<DVec3>,
    /// Closed triangle mesh over `vertices`.
    pub faces: Vec<[usize; 3]>,
    /// Wing material.
    pub wing: WingMaterial,
    /// Optional pilot body.
    pub pilot: Option<PilotBody>,
    /// Release height of the wing reference point (m).
    pub drop_height_m: f64,
    /// XYZ Euler angles applied to the whole body (degrees).
    pub orientation_deg: DVec3,
}

/// Result of a drop that reached the ground.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropOutcome {
    /// Integration steps taken before contact.
    pub steps: u64,
    /// Simulated time at contact (s).
    pub time_s: f64,
    /// Wing reference point at release.
    pub start_position: DVec3,
    /// Wing reference point at contact.
    pub final_position: DVec3,
    /// Velocity at contact.
    pub final_velocity: DVec3,
}

impl DropOutcome {
    /// Signed displacement of the wing along x, the glide axis.
    pub fn horizontal_displacement(&self) -> f64 {
        self.final_position.x - self.start_position.x
    }
}

/// Drop test failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    #[error("Scene has no faces")]
    EmptyMesh,
    #[error("Face index {index} out of range for {vertices} vertices")]
    FaceOutOfRange { index: usize, vertices: usize },
    #[error("Body mass must be positive, got {0} kg")]
    NonPositiveMass(f64),
    #[error("No ground contact within {max_steps} steps")]
    NoContact { max_steps: u64 },
    #[error("State became non-finite at step {step}")]
    Diverged { step: u64 },
}

/// Rigid-body drop test collaborator.
///
/// Implementations must be deterministic for identical scenes and must
/// bound their own run time.
pub trait Simulator: Send + Sync {
    fn drop_test(&self, scene: &Scene) -> Result<DropOutcome, SimulationError>;
}

/// Translational rigid-body drop with a pressure drag model.
///
/// The body keeps its release orientation. Windward panels (`v . n > 0`)
/// push back with `rho * A * (v . n)^2` along `-n`, which deflects tilted
/// shapes sideways, and a Stokes term damps the rest. Contact is the first
/// step where the lowest body point reaches `z = 0`.
#[derive(Debug, Clone)]
pub struct DropTestSimulator {
    config: DropTestConfig,
}

/// Body prepared for integration.
struct DropBody {
    mass: f64,
    panels: Vec<Panel>,
    lowest_offset: f64,
    stokes_coefficient: f64,
}

impl DropTestSimulator {
    /// Create a simulator.
    pub fn new(config: DropTestConfig) -> Self {
        Self { config }
    }

    /// Physics settings.
    pub fn config(&self) -> &DropTestConfig {
        &self.config
    }

    fn prepare(&self, scene: &Scene) -> Result<DropBody, SimulationError> {
        if scene.faces.is_empty() {
            return Err(SimulationError::EmptyMesh);
        }
        let vertices = scene.vertices.len();
        if let Some(&index) = scene.faces.iter().flatten().find(|&&i| i >= vertices) {
            return Err(SimulationError::FaceOutOfRange { index, vertices });
        }

        let o = scene.orientation_deg;
        let rotation = DQuat::from_euler(
            EulerRot::XYZ,
            o.x.to_radians(),
            o.y.to_radians(),
            o.z.to_radians(),
        );

        // Wing frame origin is the vertex centroid. Panels orient by winding.
        let centroid = scene.vertices.iter().sum::<DVec3>() / scene.vertices.len() as f64;
        let local: Vec<DVec3> = scene
            .vertices
            .iter()
            .map(|&v| rotation * (v - centroid))
            .collect();

        let volume = signed_volume(&local, &scene.faces).abs();
        let mut mass = scene
            .wing
            .mass_kg
            .unwrap_or(scene.wing.density * volume);
        let mut panels = outward_panels(&local, &scene.faces);
        let mut area = surface_area(&local, &scene.faces);
        let mut lowest_offset = local.iter().map(|v| v.z).fold(f64::INFINITY, f64::min);

        if let Some(pilot) = &scene.pilot {
            mass += pilot.mass_kg;
            let center = rotation * pilot.offset;
            for panel in box_panels(pilot.half_extents) {
                area += panel.area;
                panels.push(Panel {
                    normal: rotation * panel.normal,
                    area: panel.area,
                });
            }
            for corner in box_corners(pilot.half_extents) {
                lowest_offset = lowest_offset.min((center + rotation * corner).z);
            }
        }

        if !(mass > 0.0) || !mass.is_finite() {
            return Err(SimulationError::NonPositiveMass(mass));
        }

        let equivalent_radius = (area / (4.0 * std::f64::consts::PI)).sqrt();
        let stokes_coefficient =
            6.0 * std::f64::consts::PI * self.config.air_viscosity * equivalent_radius;

        Ok(DropBody {
            mass,
            panels,
            lowest_offset,
            stokes_coefficient,
        })
    }

    /// Aerodynamic acceleration at velocity `v`.
    fn drag_acceleration(&self, body: &DropBody, v: DVec3) -> DVec3 {
        let rho = self.config.air_density;
        let pressure: DVec3 = body
            .panels
            .iter()
            .filter_map(|panel| {
                let vn = v.dot(panel.normal);
                (vn > 0.0).then(|| -panel.normal * (rho * panel.area * vn * vn))
            })
            .sum();
        (pressure - v * body.stokes_coefficient) / body.mass
    }
}

impl Simulator for DropTestSimulator {
    fn drop_test(&self, scene: &Scene) -> Result<DropOutcome, SimulationError> {
        let body = self.prepare(scene)?;
        let dt = self.config.time_step;
        let gravity = DVec3::new(0.0, 0.0, -self.config.gravity);

        let start_position = DVec3::new(0.0, 0.0, scene.drop_height_m);
        let mut position = start_position;
        let mut velocity = DVec3::ZERO;

        for step in 0..=self.config.max_steps {
            if position.z + body.lowest_offset <= 0.0 {
                return Ok(DropOutcome {
                    steps: step,
                    time_s: step as f64 * dt,
                    start_position,
                    final_position: position,
                    final_velocity: velocity,
                });
            }
            if step == self.config.max_steps {
                break;
            }

            // Drag may slow the body to rest within a step but not reverse it.
            let mut drag = self.drag_acceleration(&body, velocity);
            let speed = velocity.length();
            let drag_change = drag.length() * dt;
            if drag_change > speed && drag_change > 0.0 {
                drag *= speed / drag_change;
            }

            velocity += (gravity + drag) * dt;
            position += velocity * dt;

            if !position.is_finite() || !velocity.is_finite() {
                return Err(SimulationError::Diverged { step });
            }
        }

        Err(SimulationError::NoContact {
            max_steps: self.config.max_steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{SphericalHullSurface, SurfaceBuilder};

    fn box_scene(half_extents: DVec3, orientation_deg: DVec3, height: f64) -> Scene {
        let vertices = box_corners(half_extents).to_vec();
        let surface = SphericalHullSurface::default().build(&vertices);
        Scene {
            vertices: surface.points,
            faces: surface.faces,
            wing: WingMaterial {
                density: 23.0,
                mass_kg: None,
            },
            pilot: None,
            drop_height_m: height,
            orientation_deg,
        }
    }

    fn simulator() -> DropTestSimulator {
        DropTestSimulator::new(DropTestConfig::default())
    }

    #[test]
    fn test_level_cube_falls_straight() {
        let scene = box_scene(DVec3::splat(0.5), DVec3::ZERO, 10.0);
        let outcome = simulator().drop_test(&scene).unwrap();

        assert!(outcome.steps > 0);
        assert!(outcome.horizontal_displacement().abs() < 1e-9);
        assert!(outcome.final_position.z <= 0.5 + 1e-9);
        assert!(outcome.final_velocity.z < 0.0);
    }

    #[test]
    fn test_tilted_plate_glides() {
        let scene = box_scene(
            DVec3::new(1.0, 1.0, 0.05),
            DVec3::new(0.0, 30.0, 0.0),
            10.0,
        );
        let outcome = simulator().drop_test(&scene).unwrap();
        assert!(outcome.horizontal_displacement().abs() > 1e-3);
    }

    #[test]
    fn test_deterministic() {
        let scene = box_scene(
            DVec3::new(1.5, 0.7, 0.2),
            DVec3::new(10.0, 20.0, 5.0),
            20.0,
        );
        let sim = simulator();
        assert_eq!(sim.drop_test(&scene), sim.drop_test(&scene));
    }

    #[test]
    fn test_step_budget_bounds_run() {
        let scene = box_scene(DVec3::splat(0.5), DVec3::ZERO, 50.0);
        let sim = DropTestSimulator::new(DropTestConfig {
            max_steps: 10,
            ..Default::default()
        });
        assert_eq!(
            sim.drop_test(&scene),
            Err(SimulationError::NoContact { max_steps: 10 })
        );
    }

    #[test]
    fn test_release_below_ground_contacts_immediately() {
        let scene = box_scene(DVec3::splat(0.5), DVec3::ZERO, 0.25);
        let outcome = simulator().drop_test(&scene).unwrap();
        assert_eq!(outcome.steps, 0);
        assert_eq!(outcome.horizontal_displacement(), 0.0);
    }

    #[test]
    fn test_pilot_adds_mass_and_lowers_contact() {
        let mut scene = box_scene(DVec3::splat(0.5), DVec3::ZERO, 3.0);
        let without = simulator().drop_test(&scene).unwrap();

        scene.pilot = Some(PilotBody {
            half_extents: DVec3::new(1.8, 0.3, 0.6),
            mass_kg: 68.0,
            offset: DVec3::new(0.0, 0.0, -0.3),
        });
        let with = simulator().drop_test(&scene).unwrap();

        // Pilot hangs 0.4 m below the wing, so contact happens higher up.
        assert!(with.final_position.z > without.final_position.z);
    }

    #[test]
    fn test_invalid_scenes() {
        let mut scene = box_scene(DVec3::splat(0.5), DVec3::ZERO, 10.0);
        scene.wing.mass_kg = Some(0.0);
        assert_eq!(
            simulator().drop_test(&scene),
            Err(SimulationError::NonPositiveMass(0.0))
        );

        scene.wing.mass_kg = None;
        scene.faces.push([0, 1, 8]);
        assert_eq!(
            simulator().drop_test(&scene),
            Err(SimulationError::FaceOutOfRange {
                index: 8,
                vertices: 8
            })
        );

        scene.faces.clear();
        assert_eq!(simulator().drop_test(&scene), Err(SimulationError::EmptyMesh));
    }
}
