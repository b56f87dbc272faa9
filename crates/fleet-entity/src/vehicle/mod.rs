//! Vehicle entity.

pub mod model;

pub use model::{Vehicle, VehicleStatus};
