//! Infectiousness of agents as a function of the time since infection.

use serde::{Deserialize, Serialize};

use super::dual::DualArray;
use super::state::AgentState;
use crate::errors::{DiffJuneError, Result};

/// Temporal infectiousness profile.
///
/// The profile maps the days elapsed since infection to an infectiousness value. It is zero for
/// negative or non-finite elapsed times.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum InfectiousnessProfile {
    /// The same infectiousness from the moment of infection on.
    Constant { value: f64 },

    /// Gamma shaped curve with peak `max_infectiousness`, starting `shift` days after infection.
    ///
    /// The curve is `max * (x / mode)^(shape - 1) * exp(-(x - mode) / scale)` with
    /// `x = elapsed - shift` and `mode = (shape - 1) * scale`.
    Gamma {
        max_infectiousness: f64,
        shape: f64,
        scale: f64,
        #[serde(default)]
        shift: f64,
    },
}

impl Default for InfectiousnessProfile {
    fn default() -> Self {
        InfectiousnessProfile::Gamma {
            max_infectiousness: 1.,
            shape: 2.,
            scale: 1.,
            shift: 0.,
        }
    }
}

impl InfectiousnessProfile {
    pub fn validate(&self) -> Result<()> {
        match *self {
            InfectiousnessProfile::Constant { value } if !(value >= 0. && value.is_finite()) => {
                Err(DiffJuneError::ParameterError(format!(
                    "invalid constant infectiousness {value}"
                )))
            }
            InfectiousnessProfile::Gamma {
                max_infectiousness,
                shape,
                scale,
                shift,
            } if !(max_infectiousness >= 0.
                && max_infectiousness.is_finite()
                && shape >= 1.
                && shape.is_finite()
                && scale > 0.
                && scale.is_finite()
                && shift.is_finite()) =>
            {
                Err(DiffJuneError::ParameterError(format!(
                    "invalid gamma infectiousness: max={max_infectiousness}, shape={shape}, \
                     scale={scale}, shift={shift}"
                )))
            }
            _ => Ok(()),
        }
    }

    pub fn infectiousness(&self, elapsed: f64) -> f64 {
        if !elapsed.is_finite() || elapsed < 0. {
            return 0.;
        }
        match *self {
            InfectiousnessProfile::Constant { value } => value,
            InfectiousnessProfile::Gamma {
                max_infectiousness,
                shape,
                scale,
                shift,
            } => {
                let x = elapsed - shift;
                if x < 0. {
                    return 0.;
                }
                let mode = (shape - 1.) * scale;
                if mode == 0. {
                    // pure exponential decay from the onset
                    return max_infectiousness * (-x / scale).exp();
                }
                max_infectiousness * (x / mode).powf(shape - 1.) * (-(x - mode) / scale).exp()
            }
        }
    }
}

/// Computes the `transmission` field from infection status and time.
#[derive(Clone, Debug)]
pub struct TransmissionUpdater {
    profile: InfectiousnessProfile,
}

impl TransmissionUpdater {
    pub fn new(profile: InfectiousnessProfile) -> Result<Self> {
        profile.validate()?;
        Ok(Self { profile })
    }

    /// Infectiousness of every agent at time `now`.
    ///
    /// `transmission = is_infected * profile(now - infection_time)`, so that the tangents of the
    /// infection indicators carry over to the transmission.
    pub fn compute(&self, state: &AgentState, now: f64) -> DualArray {
        let profile = state
            .infection_time
            .mapv(|time| self.profile.infectiousness(now - time));
        state.is_infected.mul_constant(&profile)
    }

    /// Recompute and store the `transmission` field.
    pub fn update(&self, state: &mut AgentState, now: f64) {
        state.transmission = self.compute(state, now);
    }
}
