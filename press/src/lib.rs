//! Fan-out compensation service for a three-folder plate conveyor.
//!
//! Plates arrive in the intake folder, are compensated in the processing
//! folder and handed to the plate setter through the delivery folder.

pub mod background;
pub mod bootstrap;
pub mod config;
pub mod conveyor;
pub mod error;
pub mod plate_name;
pub mod services;

pub use bootstrap::{build_press_line, init_foundation, init_tracing};
pub use error::{PressError, Severity};
