use ndarray::Array1;
use serde::Deserialize;

use crate::core::AgentState;
use crate::core::state::NOT_INFECTED;
use crate::errors::{DiffJuneError, Result};

pub trait AgentStateIO: Sized {
    fn read(path: &str, n_params: usize) -> Result<Self>;
    fn read_from(reader: impl std::io::Read, n_params: usize) -> Result<Self>;
}

#[derive(Debug, Deserialize)]
struct AgentRecord {
    agent: usize,
    susceptibility: f64,
    infected: u8,
}

impl AgentStateIO for AgentState {
    /// Reads a CSV file with one `agent,susceptibility,infected` row per agent.
    ///
    /// Agents must be numbered `0..n` with every index present exactly once. Rows with
    /// `infected = 1` start infected at time zero.
    fn read(path: &str, n_params: usize) -> Result<AgentState> {
        let file = std::fs::File::open(path)
            .map_err(|_err| DiffJuneError::ReadError(format!("Failed to read from {path}")))?;
        Self::read_from(std::io::BufReader::new(file), n_params)
    }

    fn read_from(reader: impl std::io::Read, n_params: usize) -> Result<AgentState> {
        let mut reader = csv::Reader::from_reader(reader);
        let records = reader
            .deserialize()
            .collect::<std::result::Result<Vec<AgentRecord>, csv::Error>>()
            .map_err(|err| DiffJuneError::ReadError(format!("Failed to parse agents: {err}")))?;

        let n_agents = records.len();
        let mut susceptibility = Array1::from_elem(n_agents, f64::NAN);
        let mut infection_time = Array1::from_elem(n_agents, NOT_INFECTED);
        for record in records {
            if record.agent >= n_agents || !susceptibility[record.agent].is_nan() {
                return Err(DiffJuneError::ReadError(format!(
                    "Agent {} is duplicated or out of range for {n_agents} agents",
                    record.agent
                )));
            }
            if !(0. ..=1.).contains(&record.susceptibility) {
                return Err(DiffJuneError::ReadError(format!(
                    "Susceptibility of agent {} must lie in [0, 1], got {}",
                    record.agent, record.susceptibility
                )));
            }
            susceptibility[record.agent] = record.susceptibility;
            infection_time[record.agent] = match record.infected {
                0 => NOT_INFECTED,
                1 => 0.,
                other => {
                    return Err(DiffJuneError::ReadError(format!(
                        "Infection flag of agent {} must be 0 or 1, got {other}",
                        record.agent
                    )));
                }
            };
        }

        let state = AgentState::from_values(susceptibility, infection_time, n_params);
        log::info!(
            "Read {n_agents} agents, {} initially infected",
            state.n_infected()
        );
        Ok(state)
    }
}
