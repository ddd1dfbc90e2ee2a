//! This module contains the core datatypes of the library.
//!
//! A simulation step runs in three stages: the transmission update, the infection passing over
//! the contact graph and the infection sampler. Each stage carries forward-mode tangents with
//! respect to the transmission rates, see [`dual`].

pub mod betas;
pub mod clock;
pub mod dual;
pub mod graph;
pub mod model;
pub mod passing;
pub mod sampler;
pub mod state;
pub mod transmission;

pub use betas::BetaParameters;
pub use clock::Clock;
pub use dual::{Dual, DualArray};
pub use graph::{ContactGraph, EdgeIndex, GraphBuilder, VenueType};
pub use model::{Model, StepReport};
pub use passing::{InfectionPassing, OutcomeProbabilities};
pub use sampler::InfectionSampler;
pub use state::AgentState;
pub use transmission::{InfectiousnessProfile, TransmissionUpdater};
