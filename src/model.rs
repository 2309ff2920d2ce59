//! Core data model for Helpline.
//!
//! Everything here is transient: coordinates live in the map screen
//! and are dropped when it goes away.

mod coordinate;
mod map_view;

pub use coordinate::{Coordinate, CoordinateError, Fix};
pub use map_view::{DEFAULT_DELTA, MapView};
