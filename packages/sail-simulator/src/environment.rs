//! environment.rs — True wind and water current generator
//!
//! Wind speed follows a bounded random walk: each tick the previous speed is
//! perturbed by at most ±wind_max_delta_percent and clamped into the active
//! bounds. A two-state gust process (Calm ↔ Gust) switches those bounds:
//!
//!   Calm ──(p = wind_gust_probability per tick)──▶ Gust { remaining_s }
//!   Gust ──(remaining_s −= dt, reaches ≤ 0)──────▶ Calm
//!
//! Direction is constant ("blows from"), and so is the current ("flows to").
//! The random source is always passed in, never ambient.

use rand::Rng;
use rand_distr::{Distribution, Uniform};
use tracing::debug;

use sail_types::{CurrentVector, GustState, WindSample};

use crate::config::EnvironmentConfig;

/// Speed bounds and per-tick change limit in effect for one draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedBounds {
    pub min: f64,
    pub max: f64,
    pub max_delta_percent: f64,
}

impl SpeedBounds {
    pub fn contains(&self, speed: f64) -> bool {
        speed >= self.min && speed <= self.max
    }
}

#[derive(Debug, Clone)]
pub struct Environment {
    config: EnvironmentConfig,
    wind: WindSample,
    gust: GustState,
    current: CurrentVector,
    time_s: f64,
}

impl Environment {
    /// `config` must already be validated
    pub fn new(config: EnvironmentConfig) -> Self {
        let wind = WindSample {
            speed: (config.wind_min_speed + config.wind_max_speed) / 2.0,
            direction: config.wind_direction,
            gusting: false,
        };
        let current = CurrentVector {
            speed: config.current_speed,
            direction: config.current_direction,
        };
        Self { config, wind, gust: GustState::Calm, current, time_s: 0.0 }
    }

    /// Most recent wind sample (the initial midpoint before the first tick)
    pub fn wind(&self) -> WindSample { self.wind }

    pub fn current(&self) -> CurrentVector { self.current }

    pub fn gust(&self) -> GustState { self.gust }

    pub fn time_s(&self) -> f64 { self.time_s }

    /// Bounds the next draw will use
    pub fn active_bounds(&self) -> SpeedBounds {
        let c = &self.config;
        if self.gust.is_active() {
            SpeedBounds {
                min: c.wind_gust_min_speed,
                max: c.wind_gust_max_speed,
                max_delta_percent: c.wind_gust_max_delta_percent,
            }
        } else {
            SpeedBounds {
                min: c.wind_min_speed,
                max: c.wind_max_speed,
                max_delta_percent: c.wind_max_delta_percent,
            }
        }
    }

    /// Advance one tick of `dt` seconds
    pub fn advance(&mut self, dt: f64, rng: &mut impl Rng) -> (WindSample, CurrentVector) {
        self.time_s += dt;

        // 1-2. Perturb the previous speed within the active bounds
        let bounds = self.active_bounds();
        let span = self.wind.speed * bounds.max_delta_percent / 100.0;
        let delta = if span > 0.0 {
            Uniform::new_inclusive(-span, span).sample(rng)
        } else {
            0.0
        };
        let speed = (self.wind.speed + delta).clamp(bounds.min, bounds.max);
        debug_assert!(
            bounds.contains(speed),
            "wind speed {speed} escaped bounds [{}, {}]", bounds.min, bounds.max
        );

        self.wind = WindSample {
            speed,
            direction: self.config.wind_direction,
            gusting: self.gust.is_active(),
        };

        // 3. Gust transition
        self.gust = match self.gust {
            GustState::Calm => {
                if rng.gen::<f64>() < self.config.wind_gust_probability {
                    let duration = Uniform::new_inclusive(
                        self.config.wind_gust_min_duration,
                        self.config.wind_gust_max_duration,
                    ).sample(rng);
                    debug!("💨 Gust starts at t={:.1}s for {:.1}s", self.time_s, duration);
                    GustState::Gust { remaining_s: duration }
                } else {
                    GustState::Calm
                }
            }
            GustState::Gust { remaining_s } => {
                let remaining_s = remaining_s - dt;
                if remaining_s <= 0.0 {
                    debug!("Gust ends at t={:.1}s", self.time_s);
                    GustState::Calm
                } else {
                    GustState::Gust { remaining_s }
                }
            }
        };

        (self.wind, self.current)
    }
}
