//! Configuration data structures for simulation setups.

mod parameters;
mod settings;
mod timer;

pub use parameters::{ModelParameters, Priors};
pub use settings::Settings;
pub use timer::{Timer, TimerConfig};
