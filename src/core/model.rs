//! The simulation step
//!
//! The model owns the learnable transmission rates and composes one simulation step out of the
//! transmission update, the infection passing and the infection sampler. A step is evaluated
//! into fresh arrays first and only written back to the agent state once nothing can fail
//! anymore, so a failed step leaves the state untouched.

use ndarray::Zip;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::betas::BetaParameters;
use super::clock::Clock;
use super::dual::Dual;
use super::graph::{ContactGraph, VenueType};
use super::passing::InfectionPassing;
use super::sampler::InfectionSampler;
use super::state::AgentState;
use super::transmission::TransmissionUpdater;
use crate::config::ModelParameters;
use crate::errors::{DiffJuneError, Result};

/// Summary of a single simulation step.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StepReport {
    pub time: f64,
    pub duration: f64,
    pub new_infections: usize,
    pub total_infected: usize,
}

pub struct Model {
    betas: BetaParameters,
    updater: TransmissionUpdater,
    passing: InfectionPassing,
    sampler: InfectionSampler,
    participating: Vec<bool>,
    rng: StdRng,
}

impl Model {
    pub fn new(parameters: &ModelParameters) -> Result<Self> {
        let betas = BetaParameters::from_priors(parameters.priors.as_slice())?;
        let updater = TransmissionUpdater::new(parameters.infectiousness.clone())?;
        let passing = InfectionPassing::new(parameters.max_contacts)?;
        let sampler = InfectionSampler::new(parameters.temperature, parameters.epsilon)?;
        log::debug!(
            "Created model with venue types {:?} and rates {:?}",
            betas.names(),
            betas.rates()
        );
        Ok(Self {
            participating: vec![false; betas.len()],
            betas,
            updater,
            passing,
            sampler,
            rng: StdRng::seed_from_u64(parameters.seed),
        })
    }

    /// The learnable parameters, stored as `log10` of the rates.
    pub fn parameters(&self) -> &BetaParameters {
        &self.betas
    }

    pub fn parameters_mut(&mut self) -> &mut BetaParameters {
        &mut self.betas
    }

    pub fn n_params(&self) -> usize {
        self.betas.len()
    }

    /// A fully susceptible state for the agents of `graph`.
    pub fn initial_state(&self, graph: &ContactGraph) -> AgentState {
        AgentState::new(graph.n_agents(), self.n_params())
    }

    /// Forget which parameters took part in earlier runs.
    pub fn reset_participation(&mut self) {
        self.participating.fill(false);
    }

    /// Derivatives of `outcome` with respect to the stored parameters.
    ///
    /// Parameters whose venue type had no active edges during the run so far have no gradient
    /// and yield `None`.
    pub fn gradient(&self, outcome: &Dual) -> Vec<Option<f64>> {
        outcome
            .tangent
            .iter()
            .zip(self.participating.iter())
            .map(|(&derivative, &participating)| participating.then_some(derivative))
            .collect()
    }

    fn check_state(&self, graph: &ContactGraph, state: &AgentState) -> Result<()> {
        if state.n_agents() != graph.n_agents() {
            return Err(DiffJuneError::StateError(format!(
                "state has {} agents but graph has {}",
                state.n_agents(),
                graph.n_agents()
            )));
        }
        if state.n_params() != self.n_params() {
            return Err(DiffJuneError::StateError(format!(
                "state tracks {} parameters but model has {}",
                state.n_params(),
                self.n_params()
            )));
        }
        Ok(())
    }

    fn resolve_activities<'g>(
        &self,
        graph: &'g ContactGraph,
        activities: &[String],
    ) -> Result<Vec<(&'g VenueType, usize)>> {
        activities
            .iter()
            .map(|activity| {
                let venue_type = graph.venue_type(activity).ok_or_else(|| {
                    DiffJuneError::ScheduleError(format!(
                        "activity `{activity}` has no venues in the contact graph"
                    ))
                })?;
                let index = self.betas.index_of(activity).ok_or_else(|| {
                    DiffJuneError::ParameterError(format!(
                        "activity `{activity}` has no transmission rate"
                    ))
                })?;
                Ok::<_, DiffJuneError>((venue_type, index))
            })
            .collect()
    }

    /// Advance the agent state by the clock's current step.
    pub fn step<C: Clock + ?Sized>(
        &mut self,
        graph: &ContactGraph,
        state: &mut AgentState,
        clock: &C,
    ) -> Result<StepReport> {
        self.check_state(graph, state)?;
        let now = clock.now();
        let duration = clock.duration();
        if !(duration.is_finite() && duration > 0.) {
            return Err(DiffJuneError::ScheduleError(format!(
                "step duration must be positive, got {duration}"
            )));
        }
        let active = self.resolve_activities(graph, clock.activities())?;

        let transmission = self.updater.compute(state, now);
        let probabilities = self.passing.forward(
            active
                .iter()
                .map(|&(venue_type, index)| (venue_type, self.betas.beta(index))),
            &transmission,
            &state.susceptibility,
            duration,
        );
        let sampled = self.sampler.sample(&probabilities, &mut self.rng);

        // agents are infected at most once
        let susceptible = state.is_infected.value.mapv(|v| if v > 0.5 { 0. } else { 1. });
        let new_infected = sampled.mul_constant(&susceptible);

        state.transmission = transmission;
        state.susceptibility = state.susceptibility.mul(&new_infected.complement());
        state.is_infected.add_assign(&new_infected);
        Zip::from(&mut state.infection_time)
            .and(&new_infected.value)
            .for_each(|time, &infected| {
                if infected == 1. {
                    *time = now;
                }
            });

        for &(venue_type, index) in &active {
            if !venue_type.attends().is_empty() {
                self.participating[index] = true;
            }
        }

        let report = StepReport {
            time: now,
            duration,
            new_infections: new_infected.value.iter().filter(|&&v| v == 1.).count(),
            total_infected: state.n_infected(),
        };
        log::debug!(
            "time={:.3} activities={:?} new_infections={} total_infected={}",
            report.time,
            clock.activities(),
            report.new_infections,
            report.total_infected
        );
        Ok(report)
    }

    /// Step until the clock is exhausted, returning a report per step.
    pub fn run<C: Clock + ?Sized>(
        &mut self,
        graph: &ContactGraph,
        state: &mut AgentState,
        clock: &mut C,
    ) -> Result<Vec<StepReport>> {
        self.run_with(graph, state, clock, |_, _| {})
    }

    /// Like [`Model::run`], calling `on_step` with the advanced clock after every step.
    pub fn run_with<C, F>(
        &mut self,
        graph: &ContactGraph,
        state: &mut AgentState,
        clock: &mut C,
        mut on_step: F,
    ) -> Result<Vec<StepReport>>
    where
        C: Clock + ?Sized,
        F: FnMut(&C, &StepReport),
    {
        let mut reports = Vec::new();
        while !clock.is_finished() {
            let report = self.step(graph, state, clock)?;
            clock.advance();
            on_step(clock, &report);
            reports.push(report);
        }
        log::info!(
            "Finished {} steps with {} infected agents",
            reports.len(),
            state.n_infected()
        );
        Ok(reports)
    }
}
