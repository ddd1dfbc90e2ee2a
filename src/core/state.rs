//! Mutable per-agent epidemic state.

use ndarray::Array1;

use super::dual::{Dual, DualArray};
use crate::errors::{DiffJuneError, Result};

/// Infection time of agents that have not been infected yet.
pub const NOT_INFECTED: f64 = f64::INFINITY;

/// Per-agent fields that are updated by every simulation step.
///
/// `susceptibility`, `is_infected` and `transmission` carry tangents with respect to the model
/// parameters. `infection_time` is set through a mask and has no tangent.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentState {
    pub susceptibility: DualArray,
    pub is_infected: DualArray,
    pub infection_time: Array1<f64>,
    pub transmission: DualArray,
    initial_susceptibility: Array1<f64>,
    initial_infection_time: Array1<f64>,
}

impl AgentState {
    /// A fully susceptible population of `n_agents`.
    pub fn new(n_agents: usize, n_params: usize) -> Self {
        Self::from_values(
            Array1::ones(n_agents),
            Array1::from_elem(n_agents, NOT_INFECTED),
            n_params,
        )
    }

    /// Build a state from initial susceptibilities and infection times.
    ///
    /// Agents with a finite infection time start infected; their susceptibility is reset to
    /// zero.
    pub fn from_values(
        susceptibility: Array1<f64>,
        infection_time: Array1<f64>,
        n_params: usize,
    ) -> Self {
        let is_infected = infection_time.mapv(|time| if time.is_finite() { 1. } else { 0. });
        let susceptibility = susceptibility * is_infected.mapv(|infected| 1. - infected);
        let n_agents = susceptibility.len();
        Self {
            susceptibility: DualArray::constant(susceptibility.clone(), n_params),
            is_infected: DualArray::constant(is_infected, n_params),
            infection_time: infection_time.clone(),
            transmission: DualArray::zeros(n_agents, n_params),
            initial_susceptibility: susceptibility,
            initial_infection_time: infection_time,
        }
    }

    pub fn n_agents(&self) -> usize {
        self.is_infected.len()
    }

    pub fn n_params(&self) -> usize {
        self.is_infected.n_params()
    }

    /// Mark `agents` as infected at `time` before the run starts.
    pub fn seed_infections(&mut self, agents: &[usize], time: f64) -> Result<()> {
        let n_agents = self.n_agents();
        if let Some(agent) = agents.iter().find(|&&agent| agent >= n_agents) {
            return Err(DiffJuneError::StateError(format!(
                "cannot seed agent {agent} of {n_agents}"
            )));
        }
        for &agent in agents {
            self.susceptibility.value[agent] = 0.;
            self.is_infected.value[agent] = 1.;
            self.infection_time[agent] = time;
            self.initial_susceptibility[agent] = 0.;
            self.initial_infection_time[agent] = time;
        }
        Ok(())
    }

    /// Restore the state the run started from, dropping all tangents.
    pub fn reset(&mut self) {
        *self = Self::from_values(
            self.initial_susceptibility.clone(),
            self.initial_infection_time.clone(),
            self.n_params(),
        );
    }

    /// Total number of infected agents as a differentiable outcome.
    pub fn cases(&self) -> Dual {
        self.is_infected.sum()
    }

    /// Infection indicator of a single agent as a differentiable outcome.
    pub fn infected(&self, agent: usize) -> Dual {
        self.is_infected.get(agent)
    }

    pub fn n_infected(&self) -> usize {
        self.is_infected.value.iter().filter(|&&v| v > 0.5).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_agents_are_infected() {
        let mut state = AgentState::new(10, 2);
        state.seed_infections(&[0, 5], 0.).unwrap();
        assert_eq!(state.n_infected(), 2);
        assert_eq!(state.susceptibility.value[5], 0.);
        assert_eq!(state.infection_time[5], 0.);
        assert_eq!(state.infection_time[1], NOT_INFECTED);
        assert_eq!(state.cases().value, 2.);
    }

    #[test]
    fn seeding_outside_population_fails() {
        let mut state = AgentState::new(3, 1);
        assert!(state.seed_infections(&[3], 0.).is_err());
        assert_eq!(state.n_infected(), 0);
    }

    #[test]
    fn reset_restores_seeds() {
        let mut state = AgentState::new(4, 1);
        state.seed_infections(&[1], 0.).unwrap();
        let initial = state.clone();

        state.is_infected.value[2] = 1.;
        state.susceptibility.value[2] = 0.;
        state.infection_time[2] = 3.;
        state.is_infected.tangent[[2, 0]] = 0.5;
        state.reset();

        assert_eq!(state, initial);
    }

    #[test]
    fn finite_infection_times_start_infected() {
        let state = AgentState::from_values(
            Array1::from(vec![1., 0.5, 1.]),
            Array1::from(vec![NOT_INFECTED, NOT_INFECTED, -2.]),
            1,
        );
        assert_eq!(state.is_infected.value.to_vec(), vec![0., 0., 1.]);
        assert_eq!(state.susceptibility.value.to_vec(), vec![1., 0.5, 0.]);
    }
}
