//! Error types of the race simulator.

use crate::core::driver::DriverStatus;
use crate::core::events::WeatherCondition;
use crate::core::tireset::Compound;
use thiserror::Error;

/// Result type alias using [`RaceSimError`].
pub type Result<T> = std::result::Result<T, RaceSimError>;

/// Why a manual strategy override was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverrideRejection {
    #[error("driver is not part of this race")]
    UnknownDriver,

    #[error("driver is already {0}")]
    DriverNotRunning(DriverStatus),

    #[error("compound {compound} is not allowed in {weather} conditions")]
    CompoundNotAllowed {
        compound: Compound,
        weather: WeatherCondition,
    },

    #[error("the active pit decider does not accept manual overrides")]
    NotAccepted,
}

/// Top-level error type of the engine.
#[derive(Debug, Error)]
pub enum RaceSimError {
    /// Unknown circuit id or malformed circuit data.
    #[error("Invalid circuit '{circuit_id}': {reason}")]
    InvalidCircuit { circuit_id: String, reason: String },

    /// Missing or out-of-range driver/team ratings.
    #[error("Invalid driver roster (driver '{driver_id}'): {reason}")]
    InvalidDriverRoster { driver_id: String, reason: String },

    /// Override rejected; the race falls back to the default policy for that lap.
    #[error("Illegal strategy override for driver '{driver_id}': {reason}")]
    IllegalStrategyOverride {
        driver_id: String,
        reason: OverrideRejection,
    },

    /// Malformed simulation constants.
    #[error("Invalid simulation constants: {0}")]
    InvalidConstants(String),

    /// Results were requested before the final lap was simulated.
    #[error("Race incomplete: {completed_laps} of {total_laps} laps simulated")]
    RaceIncomplete { completed_laps: u32, total_laps: u32 },

    /// Embedded or supplied data could not be decoded.
    #[error("Failed to parse {source_name}: {message}")]
    DataParse { source_name: String, message: String },
}

impl RaceSimError {
    pub(crate) fn circuit(circuit_id: &str, reason: impl Into<String>) -> Self {
        RaceSimError::InvalidCircuit {
            circuit_id: circuit_id.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn roster(driver_id: &str, reason: impl Into<String>) -> Self {
        RaceSimError::InvalidDriverRoster {
            driver_id: driver_id.to_owned(),
            reason: reason.into(),
        }
    }
}
