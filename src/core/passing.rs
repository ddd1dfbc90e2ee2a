//! Two-hop infection message passing
//!
//! For every active venue type, the transmissions of the attending agents are summed into their
//! venues (agent → venue), weighted with the venue type's rate and the venue's contact factor.
//! The aggregated venue transmission is then handed back to every attendee (venue → agent),
//! weighted with the attendee's susceptibility, and accumulated into the agent's exposure.
//! Both hops are single passes over the edge lists; the exposure of all active venue types is
//! converted into a probability of not being infected with a Poisson hazard.

use ndarray::{Array1, Axis};

use super::dual::{Dual, DualArray};
use super::graph::VenueType;
use crate::errors::{DiffJuneError, Result};

/// Default maximum number of effective contacts per agent and step.
pub const DEFAULT_MAX_CONTACTS: f64 = 5.;

/// Per-agent probabilities of the two outcomes of a step.
#[derive(Clone, Debug, PartialEq)]
pub struct OutcomeProbabilities {
    pub infected: DualArray,
    pub not_infected: DualArray,
}

#[derive(Clone, Debug)]
pub struct InfectionPassing {
    max_contacts: f64,
}

impl Default for InfectionPassing {
    fn default() -> Self {
        Self {
            max_contacts: DEFAULT_MAX_CONTACTS,
        }
    }
}

impl InfectionPassing {
    pub fn new(max_contacts: f64) -> Result<Self> {
        if !(max_contacts.is_finite() && max_contacts > 0.) {
            return Err(DiffJuneError::ParameterError(format!(
                "maximum number of contacts must be positive, got {max_contacts}"
            )));
        }
        Ok(Self { max_contacts })
    }

    pub fn max_contacts(&self) -> f64 {
        self.max_contacts
    }

    /// Agent → venue hop: transmission arriving at each venue of `venue_type`.
    pub fn aggregate(
        &self,
        venue_type: &VenueType,
        beta: &Dual,
        transmission: &DualArray,
    ) -> DualArray {
        let mut incoming = DualArray::zeros(venue_type.n_venues(), transmission.n_params());
        for (agent, venue) in venue_type.attends().iter() {
            incoming.value[venue] += transmission.value[agent];
            incoming
                .tangent
                .row_mut(venue)
                .scaled_add(1., &transmission.tangent.row(agent));
        }

        let contact_factors = Array1::from(venue_type.contact_factors(self.max_contacts));
        incoming.mul_constant(&contact_factors).scale(beta)
    }

    /// Venue → agent hop: add the venue transmission times susceptibility to each attendee.
    pub fn broadcast(
        &self,
        venue_type: &VenueType,
        venue_transmission: &DualArray,
        susceptibility: &DualArray,
        exposure: &mut DualArray,
    ) {
        for (venue, agent) in venue_type.rev_attends().iter() {
            let incoming = venue_transmission.value[venue];
            let susceptible = susceptibility.value[agent];
            exposure.value[agent] += incoming * susceptible;

            let mut row = exposure.tangent.row_mut(agent);
            row.scaled_add(susceptible, &venue_transmission.tangent.row(venue));
            row.scaled_add(incoming, &susceptibility.tangent.row(agent));
        }
    }

    /// Exposure of every agent, summed over the given venue types and their rates.
    pub fn exposure<'a>(
        &self,
        active: impl IntoIterator<Item = (&'a VenueType, Dual)>,
        transmission: &DualArray,
        susceptibility: &DualArray,
    ) -> DualArray {
        let mut exposure = DualArray::zeros(transmission.len(), transmission.n_params());
        for (venue_type, beta) in active {
            let venue_transmission = self.aggregate(venue_type, &beta, transmission);
            self.broadcast(
                venue_type,
                &venue_transmission,
                susceptibility,
                &mut exposure,
            );
            log::trace!(
                "Venue type `{}`: total venue transmission {:.4}",
                venue_type.name(),
                venue_transmission.value.sum()
            );
        }
        exposure
    }

    /// Poisson hazard: `P(not infected) = exp(-exposure * duration)`.
    ///
    /// `P(infected)` is evaluated as `-expm1(-exposure * duration)` so that it keeps its
    /// precision for small exposures.
    pub fn outcome_probabilities(exposure: &DualArray, duration: f64) -> OutcomeProbabilities {
        let hazard = exposure.value.mapv(|e| -e * duration);
        let not_infected = hazard.mapv(f64::exp);
        let infected = hazard.mapv(|h| -h.exp_m1());

        let slope = not_infected.mapv(|p| duration * p);
        let column = slope.view().insert_axis(Axis(1));
        let infected_tangent = &exposure.tangent * &column;
        let not_infected_tangent = -&infected_tangent;
        OutcomeProbabilities {
            infected: DualArray {
                value: infected,
                tangent: infected_tangent,
            },
            not_infected: DualArray {
                value: not_infected,
                tangent: not_infected_tangent,
            },
        }
    }

    /// Probabilities of every agent to get infected or stay uninfected during a step of
    /// `duration`.
    pub fn forward<'a>(
        &self,
        active: impl IntoIterator<Item = (&'a VenueType, Dual)>,
        transmission: &DualArray,
        susceptibility: &DualArray,
        duration: f64,
    ) -> OutcomeProbabilities {
        let exposure = self.exposure(active, transmission, susceptibility);
        Self::outcome_probabilities(&exposure, duration)
    }
}
