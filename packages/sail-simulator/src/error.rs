//! error.rs — Error taxonomy for the simulator core
//!
//! - `ConfigValidation`: fatal to the Simulation being constructed
//! - `MalformedFoilData`: fatal at foil load time
//! - `InvalidInput`: recoverable; the simulation state is left untouched
//!
//! Numerical safeguards (angular clamp, relative-speed clamp) are NOT errors —
//! they are flagged in `ForceBreakdown` and show up in the state log.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: `{field}` {reason}")]
    ConfigValidation { field: String, reason: String },

    #[error("malformed foil data for `{foil}`: {reason}")]
    MalformedFoilData { foil: String, reason: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SimError {
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigValidation { field: field.into(), reason: reason.into() }
    }

    pub fn foil(foil: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedFoilData { foil: foil.into(), reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
