//! IO traits for reading contact graphs and agents, and writing case reports.

mod agents;
mod graph;
mod report;

pub use agents::AgentStateIO;
pub use graph::ContactGraphIO;
pub use report::ReportWriter;
