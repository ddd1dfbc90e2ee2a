use serde::Deserialize;
use std::collections::HashMap;

use crate::core::ContactGraph;
use crate::errors::{DiffJuneError, Result};

pub trait ContactGraphIO: Sized {
    fn read(path: &str, n_agents: usize) -> Result<Self>;
    fn read_from(reader: impl std::io::Read, n_agents: usize) -> Result<Self>;
}

#[derive(Debug, Deserialize)]
struct AttendanceRecord {
    agent: usize,
    venue_type: String,
    venue: usize,
}

/// Edges of a single venue type, collected in file order.
#[derive(Default)]
struct Attendance {
    agents: Vec<usize>,
    venues: Vec<usize>,
}

impl ContactGraphIO for ContactGraph {
    /// Reads a CSV file with one `agent,venue_type,venue` row per attendance edge.
    ///
    /// Venue types are numbered in order of first appearance, each with as many venues as its
    /// largest venue index requires. Repeated rows are kept as duplicate edges.
    fn read(path: &str, n_agents: usize) -> Result<ContactGraph> {
        let file = std::fs::File::open(path)
            .map_err(|_err| DiffJuneError::ReadError(format!("Failed to read from {path}")))?;
        Self::read_from(std::io::BufReader::new(file), n_agents)
    }

    fn read_from(reader: impl std::io::Read, n_agents: usize) -> Result<ContactGraph> {
        let mut reader = csv::Reader::from_reader(reader);
        let mut names: Vec<String> = Vec::new();
        let mut attendance: HashMap<String, Attendance> = HashMap::new();

        for (line, record) in reader.deserialize().enumerate() {
            let record: AttendanceRecord = record.map_err(|err| {
                DiffJuneError::ReadError(format!("Failed to parse attendance record {line}: {err}"))
            })?;
            let entry = attendance
                .entry(record.venue_type.clone())
                .or_insert_with(|| {
                    names.push(record.venue_type.clone());
                    Attendance::default()
                });
            entry.agents.push(record.agent);
            entry.venues.push(record.venue);
        }

        let mut builder = ContactGraph::builder(n_agents);
        for name in &names {
            if let Some(Attendance { agents, venues }) = attendance.remove(name) {
                let n_venues = venues.iter().max().map_or(0, |&max| max + 1);
                builder = builder
                    .counted_venues(name, n_venues)
                    .attends(name, agents, venues);
            }
        }
        log::info!(
            "Read attendance of {} venue types for {n_agents} agents",
            names.len()
        );
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ATTENDANCE: &str = "\
agent,venue_type,venue
0,school,0
1,school,0
2,school,1
2,company,0
3,company,0
3,company,0
";

    #[test]
    fn read_attendance() {
        let graph = ContactGraph::read_from(ATTENDANCE.as_bytes(), 4).unwrap();
        assert_eq!(graph.n_agents(), 4);

        let names: Vec<&str> = graph.venue_types().iter().map(|v| v.name()).collect();
        assert_eq!(names, vec!["school", "company"]);

        let school = graph.venue_type("school").unwrap();
        assert_eq!(school.people(), &[2, 1]);
        assert_eq!(school.attends().source, vec![0, 1, 2]);
        assert_eq!(school.rev_attends().source, vec![0, 0, 1]);

        // duplicate rows stay duplicate edges
        let company = graph.venue_type("company").unwrap();
        assert_eq!(company.people(), &[3]);
        assert_eq!(company.attends().len(), 3);
    }

    #[test]
    fn agent_outside_population_fails() {
        let result = ContactGraph::read_from(ATTENDANCE.as_bytes(), 3);
        assert!(matches!(result, Err(DiffJuneError::GraphError(_))));
    }

    #[test]
    fn malformed_record_fails() {
        let csv = "agent,venue_type,venue\n0,school,first\n";
        let result = ContactGraph::read_from(csv.as_bytes(), 1);
        assert!(matches!(result, Err(DiffJuneError::ReadError(_))));
    }

    #[test]
    #[serial]
    fn read_attendance_file() {
        let tmp_path = std::env::temp_dir().join("diffjune_test_attendance.csv");
        let path = tmp_path.to_str().unwrap();
        std::fs::write(path, ATTENDANCE).unwrap();
        let graph = ContactGraph::read(path, 4).unwrap();
        assert_eq!(graph.venue_types().len(), 2);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_file_fails() {
        assert!(ContactGraph::read("/nonexistent/attendance.csv", 1).is_err());
    }
}
