//! Schema module - Configuration, vehicle and result types for glider evolution.

mod config;
mod result;
mod vehicle;

pub use config::*;
pub use result::*;
pub use vehicle::*;
