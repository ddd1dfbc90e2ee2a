//! Heterogeneous contact graph
//!
//! The contact graph consists of one agent node collection and one venue node collection per
//! venue type (school, company, household, ...). Agents are connected to venues through the
//! directed edge collection `attends_<type>` and venues are connected back to their attendees
//! through `rev_attends_<type>`. The topology is immutable once built: all validation happens in
//! `GraphBuilder::build`, so that a malformed graph is never discovered mid-simulation.

use itertools::Itertools;
use std::collections::HashMap;

use crate::errors::{DiffJuneError, Result};

pub const ATTENDS_PREFIX: &str = "attends_";
pub const REV_ATTENDS_PREFIX: &str = "rev_attends_";

/// A directed edge collection given as two equal-length index sequences.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgeIndex {
    pub source: Vec<usize>,
    pub destination: Vec<usize>,
}

impl EdgeIndex {
    pub fn new(source: Vec<usize>, destination: Vec<usize>) -> Self {
        Self {
            source,
            destination,
        }
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// The same edges with source and destination swapped.
    pub fn reversed(&self) -> Self {
        Self {
            source: self.destination.clone(),
            destination: self.source.clone(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.source
            .iter()
            .copied()
            .zip(self.destination.iter().copied())
    }
}

/// All venues of one type together with their attendance edges.
#[derive(Clone, Debug, PartialEq)]
pub struct VenueType {
    name: String,
    people: Vec<u32>,
    attends: EdgeIndex,
    rev_attends: EdgeIndex,
}

impl VenueType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn n_venues(&self) -> usize {
        self.people.len()
    }

    /// Attendance count of each venue.
    pub fn people(&self) -> &[u32] {
        &self.people
    }

    /// Agent → venue edges.
    pub fn attends(&self) -> &EdgeIndex {
        &self.attends
    }

    /// Venue → agent edges.
    pub fn rev_attends(&self) -> &EdgeIndex {
        &self.rev_attends
    }

    /// Per-venue dilution factor `min(max_contacts / people, 1)`.
    ///
    /// Empty venues get a factor of zero, so they never contribute exposure.
    pub fn contact_factors(&self, max_contacts: f64) -> Vec<f64> {
        self.people
            .iter()
            .map(|&people| match people {
                0 => 0.,
                people => (max_contacts / people as f64).min(1.),
            })
            .collect()
    }
}

/// The immutable contact graph.
#[derive(Clone, Debug, PartialEq)]
pub struct ContactGraph {
    n_agents: usize,
    venue_types: Vec<VenueType>,
    index: HashMap<String, usize>,
}

impl ContactGraph {
    pub fn builder(n_agents: usize) -> GraphBuilder {
        GraphBuilder::new(n_agents)
    }

    pub fn n_agents(&self) -> usize {
        self.n_agents
    }

    pub fn venue_types(&self) -> &[VenueType] {
        &self.venue_types
    }

    pub fn venue_type(&self, name: &str) -> Option<&VenueType> {
        self.index.get(name).map(|&idx| &self.venue_types[idx])
    }

    /// Look up an edge collection by its name, e.g. `attends_school` or `rev_attends_school`.
    pub fn edges(&self, edge_type: &str) -> Option<&EdgeIndex> {
        if let Some(name) = edge_type.strip_prefix(REV_ATTENDS_PREFIX) {
            return self.venue_type(name).map(VenueType::rev_attends);
        }
        edge_type
            .strip_prefix(ATTENDS_PREFIX)
            .and_then(|name| self.venue_type(name))
            .map(VenueType::attends)
    }

    /// Names of all forward edge collections.
    pub fn edge_types(&self) -> Vec<String> {
        self.venue_types
            .iter()
            .map(|venue_type| format!("{ATTENDS_PREFIX}{}", venue_type.name))
            .collect()
    }
}

struct PendingVenueType {
    name: String,
    people: Option<Vec<u32>>,
    n_venues: Option<usize>,
    attends: EdgeIndex,
    rev_attends: Option<EdgeIndex>,
}

/// Builder collecting node and edge collections before validation.
pub struct GraphBuilder {
    n_agents: usize,
    pending: Vec<PendingVenueType>,
}

impl GraphBuilder {
    pub fn new(n_agents: usize) -> Self {
        Self {
            n_agents,
            pending: Vec::new(),
        }
    }

    fn entry(&mut self, name: &str) -> &mut PendingVenueType {
        let position = match self.pending.iter().position(|p| p.name == name) {
            Some(position) => position,
            None => {
                self.pending.push(PendingVenueType {
                    name: name.to_string(),
                    people: None,
                    n_venues: None,
                    attends: EdgeIndex::default(),
                    rev_attends: None,
                });
                self.pending.len() - 1
            }
        };
        &mut self.pending[position]
    }

    /// Add a venue type with an explicit attendance count per venue.
    pub fn venues(mut self, name: &str, people: Vec<u32>) -> Self {
        self.entry(name).people = Some(people);
        self
    }

    /// Add a venue type whose attendance counts are derived from its `attends` edges.
    pub fn counted_venues(mut self, name: &str, n_venues: usize) -> Self {
        self.entry(name).n_venues = Some(n_venues);
        self
    }

    /// Append agent → venue edges. Repeated calls extend the collection.
    pub fn attends(mut self, name: &str, agents: Vec<usize>, venues: Vec<usize>) -> Self {
        let entry = self.entry(name);
        entry.attends.source.extend(agents);
        entry.attends.destination.extend(venues);
        self
    }

    /// Provide the venue → agent edges explicitly instead of deriving them.
    pub fn rev_attends(mut self, name: &str, venues: Vec<usize>, agents: Vec<usize>) -> Self {
        self.entry(name).rev_attends = Some(EdgeIndex::new(venues, agents));
        self
    }

    /// Validate all collections and build the graph.
    pub fn build(self) -> Result<ContactGraph> {
        let n_agents = self.n_agents;
        let mut venue_types = Vec::with_capacity(self.pending.len());
        let mut index = HashMap::new();

        for pending in self.pending {
            let name = pending.name;
            let attends = pending.attends;

            if attends.source.len() != attends.destination.len() {
                return Err(DiffJuneError::GraphError(format!(
                    "`{ATTENDS_PREFIX}{name}` has {} sources but {} destinations",
                    attends.source.len(),
                    attends.destination.len()
                )));
            }

            let people = match (pending.people, pending.n_venues) {
                (Some(people), None) => people,
                (None, Some(n_venues)) => {
                    let mut people = vec![0u32; n_venues];
                    for &venue in attends.destination.iter().filter(|&&v| v < n_venues) {
                        people[venue] += 1;
                    }
                    people
                }
                (Some(_), Some(_)) => {
                    return Err(DiffJuneError::GraphError(format!(
                        "venue type `{name}` has both explicit and counted attendance"
                    )));
                }
                (None, None) => {
                    return Err(DiffJuneError::GraphError(format!(
                        "edges reference unknown venue type `{name}`"
                    )));
                }
            };
            let n_venues = people.len();

            if let Some(agent) = attends.source.iter().find(|&&a| a >= n_agents) {
                return Err(DiffJuneError::GraphError(format!(
                    "`{ATTENDS_PREFIX}{name}` references agent {agent} of {n_agents}"
                )));
            }
            if let Some(venue) = attends.destination.iter().find(|&&v| v >= n_venues) {
                return Err(DiffJuneError::GraphError(format!(
                    "`{ATTENDS_PREFIX}{name}` references venue {venue} of {n_venues}"
                )));
            }

            let rev_attends = match pending.rev_attends {
                Some(rev_attends) => {
                    check_reverse(&name, &attends, &rev_attends)?;
                    rev_attends
                }
                None => attends.reversed(),
            };

            log::debug!(
                "Venue type `{name}`: {n_venues} venues, {} attendance edges",
                attends.len()
            );
            index.insert(name.clone(), venue_types.len());
            venue_types.push(VenueType {
                name,
                people,
                attends,
                rev_attends,
            });
        }

        Ok(ContactGraph {
            n_agents,
            venue_types,
            index,
        })
    }
}

/// The reverse collection must contain exactly the forward edges with swapped endpoints,
/// including duplicates.
fn check_reverse(name: &str, attends: &EdgeIndex, rev_attends: &EdgeIndex) -> Result<()> {
    if rev_attends.source.len() != rev_attends.destination.len() {
        return Err(DiffJuneError::GraphError(format!(
            "`{REV_ATTENDS_PREFIX}{name}` has {} sources but {} destinations",
            rev_attends.source.len(),
            rev_attends.destination.len()
        )));
    }

    let forward = attends.iter().counts();
    let backward = rev_attends
        .iter()
        .map(|(venue, agent)| (agent, venue))
        .counts();

    if forward != backward {
        return Err(DiffJuneError::GraphError(format!(
            "`{REV_ATTENDS_PREFIX}{name}` is inconsistent with `{ATTENDS_PREFIX}{name}`"
        )));
    }
    Ok(())
}
