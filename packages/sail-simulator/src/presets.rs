//! presets.rs — Ready-made boat and environment configurations
//!
//! Each environment preset stresses a different part of the model:
//! steady wind for controller tuning, gusts for robustness, dead calm as
//! the no-flow baseline. Selectable from the CLI with `--preset`.

use serde::{Deserialize, Serialize};

use crate::config::{BoatConfig, EnvironmentConfig};
use crate::foil::{FoilLibrary, FoilTable};

pub const FLAT_PLATE: &str = "flat_plate";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvironmentPreset {
    /// Light, slowly varying wind from the North, no current, no gusts
    Steady,
    /// Moderate wind with frequent gust episodes and a weak current
    Gusty,
    /// No wind, no current
    DeadCalm,
}

impl EnvironmentPreset {
    pub fn to_config(self) -> EnvironmentConfig {
        match self {
            Self::Steady => steady_environment(),
            Self::Gusty => gusty_environment(),
            Self::DeadCalm => dead_calm_environment(),
        }
    }
}

/// 2 m training dinghy: 30 kg, 1 m² sail, flat-plate foils throughout
pub fn sample_boat() -> BoatConfig {
    BoatConfig {
        name: "sample_boat".into(),
        length: 2.0,
        mass: 30.0,
        com_length: 1.0,
        sail_area: 1.0,
        sail_foil: FLAT_PLATE.into(),
        rudder_area: 0.05,
        rudder_foil: FLAT_PLATE.into(),
        keel_span: 0.5,
        keel_chord: 0.1,
        keel_area: 0.05,
        keel_distance_from_com: 0.1,
        keel_foil: FLAT_PLATE.into(),
        hull_area: 0.2,
        hull_friction_coefficient: 0.01,
        hull_rotation_resistance: 0.05,
        moment_of_inertia: 10.0,
        max_angular_speed: 90.0,
    }
}

pub fn steady_environment() -> EnvironmentConfig {
    EnvironmentConfig {
        name: "steady".into(),
        wind_min_speed: 3.0,
        wind_max_speed: 5.0,
        wind_max_delta_percent: 2.0,
        wind_direction: 90.0,
        wind_gust_probability: 0.0,
        wind_gust_min_duration: 0.0,
        wind_gust_max_duration: 0.0,
        wind_gust_min_speed: 5.0,
        wind_gust_max_speed: 5.0,
        wind_gust_max_delta_percent: 0.0,
        current_speed: 0.0,
        current_direction: 0.0,
    }
}

pub fn gusty_environment() -> EnvironmentConfig {
    EnvironmentConfig {
        name: "gusty".into(),
        wind_min_speed: 4.0,
        wind_max_speed: 6.0,
        wind_max_delta_percent: 5.0,
        wind_direction: 90.0,
        wind_gust_probability: 0.01,
        wind_gust_min_duration: 2.0,
        wind_gust_max_duration: 6.0,
        wind_gust_min_speed: 7.0,
        wind_gust_max_speed: 10.0,
        wind_gust_max_delta_percent: 15.0,
        current_speed: 0.2,
        current_direction: 0.0,
    }
}

pub fn dead_calm_environment() -> EnvironmentConfig {
    EnvironmentConfig {
        name: "dead_calm".into(),
        wind_min_speed: 0.0,
        wind_max_speed: 0.0,
        wind_max_delta_percent: 10.0,
        wind_direction: 90.0,
        wind_gust_probability: 0.0,
        wind_gust_min_duration: 0.0,
        wind_gust_max_duration: 0.0,
        wind_gust_min_speed: 0.0,
        wind_gust_max_speed: 0.0,
        wind_gust_max_delta_percent: 0.0,
        current_speed: 0.0,
        current_direction: 0.0,
    }
}

/// Library holding the analytic flat-plate profile under `FLAT_PLATE`
pub fn flat_plate_library() -> FoilLibrary {
    FoilLibrary::new().with(FoilTable::flat_plate(FLAT_PLATE))
}
