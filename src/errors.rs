//! All errors that can occur in the diffjune library.

use derive_more::{Display, Error, From};

#[derive(Debug, Display, Error, From)]
pub enum DiffJuneError {
    #[display("GraphError: {_0}")]
    #[from(ignore)]
    GraphError(#[error(not(source))] String),

    #[display("ParameterError: {_0}")]
    #[from(ignore)]
    ParameterError(#[error(not(source))] String),

    #[display("StateError: {_0}")]
    #[from(ignore)]
    StateError(#[error(not(source))] String),

    #[display("ScheduleError: {_0}")]
    #[from(ignore)]
    ScheduleError(#[error(not(source))] String),

    #[display("ConfigError: {_0}")]
    ConfigError(serde_yaml::Error),

    #[display("ReadError: {_0}")]
    #[from(ignore)]
    ReadError(#[error(not(source))] String),

    #[display("WriteError: {_0}")]
    WriteError(csv::Error),

    #[display("IoError: {_0}")]
    IoError(std::io::Error),
}

pub type Result<T> = std::result::Result<T, DiffJuneError>;
