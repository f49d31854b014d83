//! Common types shared across the GPV cloud animation services.

pub mod bbox;
pub mod cycle;
pub mod error;

pub use bbox::BoundingBox;
pub use cycle::{ForecastCycleTime, DEFAULT_CYCLE_HOURS};
pub use error::{GpvError, GpvResult};
