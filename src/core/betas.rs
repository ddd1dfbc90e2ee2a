//! Learnable per-venue-type transmission rates.
//!
//! Rates are stored as `log10(beta)`, which keeps the realized rate positive for any stored
//! value and gives gradient steps a scale that does not depend on the magnitude of the rate.

use std::collections::HashMap;

use super::dual::Dual;
use crate::errors::{DiffJuneError, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct BetaParameters {
    names: Vec<String>,
    index: HashMap<String, usize>,
    log_values: Vec<f64>,
}

impl BetaParameters {
    /// Build the parameters from `(venue type, prior rate)` pairs, keeping their order.
    pub fn from_priors(priors: &[(String, f64)]) -> Result<Self> {
        let mut names = Vec::with_capacity(priors.len());
        let mut index = HashMap::with_capacity(priors.len());
        let mut log_values = Vec::with_capacity(priors.len());

        for (name, prior) in priors {
            if !(prior.is_finite() && *prior > 0.) {
                return Err(DiffJuneError::ParameterError(format!(
                    "prior rate for `{name}` must be positive, got {prior}"
                )));
            }
            if index.insert(name.clone(), names.len()).is_some() {
                return Err(DiffJuneError::ParameterError(format!(
                    "duplicate prior for `{name}`"
                )));
            }
            names.push(name.clone());
            log_values.push(prior.log10());
        }

        Ok(Self {
            names,
            index,
            log_values,
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// The stored (log10) values in insertion order.
    pub fn as_slice(&self) -> &[f64] {
        &self.log_values
    }

    /// Mutable access to the stored values for an external optimizer.
    pub fn as_slice_mut(&mut self) -> &mut [f64] {
        &mut self.log_values
    }

    /// Overwrite all stored values.
    pub fn set(&mut self, log_values: &[f64]) -> Result<()> {
        if log_values.len() != self.len() {
            return Err(DiffJuneError::ParameterError(format!(
                "expected {} parameter values, got {}",
                self.len(),
                log_values.len()
            )));
        }
        self.as_slice_mut().copy_from_slice(log_values);
        Ok(())
    }

    /// Realized rates `10^stored` in insertion order.
    pub fn rates(&self) -> Vec<f64> {
        self.log_values.iter().map(|v| 10f64.powf(*v)).collect()
    }

    /// Realized rate of parameter `index` with its derivative `beta * ln(10)`.
    pub fn beta(&self, index: usize) -> Dual {
        let beta = 10f64.powf(self.log_values[index]);
        Dual::variable(beta, beta * std::f64::consts::LN_10, index, self.len())
    }
}
