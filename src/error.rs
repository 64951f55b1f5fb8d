use std::time::Duration;

use thiserror::Error;

/// [Result] alias for return types of the crate API
pub type Result<T> = std::result::Result<T, Error>;

/// Error enum type
#[derive(Debug, Error)]
pub enum Error {
    /// Error returned by the Crazyflie library.
    #[error("Crazyflie error: {0:?}")]
    Crazyflie(crazyflie_lib::Error),
    /// Crazyflie link error. Returns the [error from the Link](crazyflie_link::Error).
    #[error("Link error: {0:?}")]
    Link(crazyflie_link::Error),
    /// Configuration or flight plan could not be loaded.
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),
    /// Filesystem error, from the TOC cache or a flight plan file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The log period cannot be represented by the Crazyflie log subsystem (10ms to 2550ms).
    #[error("Invalid log period {0:?}")]
    InvalidLogPeriod(Duration),
    /// A log packet did not carry the expected variable.
    #[error("Log variable {0} missing from log data")]
    MissingLogVariable(String),
    /// The position estimator did not converge in the configured time.
    #[error("Position estimator did not converge within {0:?}")]
    EstimatorTimeout(Duration),
    /// The Crazyflie link is closed.
    #[error("The Crazyflie is disconnected")]
    Disconnected,
}

impl From<crazyflie_lib::Error> for Error {
    fn from(error: crazyflie_lib::Error) -> Self {
        Self::Crazyflie(error)
    }
}

impl From<crazyflie_link::Error> for Error {
    fn from(error: crazyflie_link::Error) -> Self {
        Self::Link(error)
    }
}

impl From<figment::Error> for Error {
    fn from(error: figment::Error) -> Self {
        Self::Config(Box::new(error))
    }
}
