//! The clock driving a simulation.

/// Source of simulated time and of the venue types active in the current step.
///
/// Times and durations are measured in days.
pub trait Clock {
    /// Start of the current step.
    fn now(&self) -> f64;

    /// Length of the current step.
    fn duration(&self) -> f64;

    /// Venue types that are active during the current step.
    fn activities(&self) -> &[String];

    /// Whether the final date has been reached.
    fn is_finished(&self) -> bool;

    /// Move on to the next step.
    fn advance(&mut self);
}
