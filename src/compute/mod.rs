//! Compute module - Geometry, surface reconstruction and drop testing.

mod hull;
mod simulator;
mod surface;

pub mod evolution;
pub mod mesh;

pub use hull::*;
pub use simulator::*;
pub use surface::*;
