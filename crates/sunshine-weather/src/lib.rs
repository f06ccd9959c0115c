//! Weather data shared by the phone sender and the watch face.
//!
//! Holds the summary carried over the sync channel, temperature
//! formatting, and the condition-code to icon mapping.

pub mod format;
pub mod types;

pub use format::format_temperature;
pub use sunshine_core::TemperatureUnit;
pub use types::*;
