//! sail-simulator — 2D sailboat dynamics on a fixed timestep
//!
//! A `Simulation` couples a stochastic wind/current `Environment` to a rigid
//! `Boat` through foil-table lookups for sail, keel and rudder. Callers drive
//! it with integer sail/rudder commands and read back a full `SimSnapshot` or
//! the reduced `AgentState` a control algorithm needs.
//!
//! ```no_run
//! use sail_simulator::{presets, PhysicsConfig, SimConfig, Simulation, Vec2};
//!
//! let config = SimConfig {
//!     boat: presets::sample_boat(),
//!     environment: presets::gusty_environment(),
//!     physics: PhysicsConfig::default(),
//! };
//! let mut sim = Simulation::seeded(config, &presets::flat_plate_library(), 0.0, Vec2::zero(), 7)?;
//! for _ in 0..100 {
//!     sim.step(30, 0);
//! }
//! println!("{:?}", sim.agent_state());
//! # Ok::<(), sail_simulator::SimError>(())
//! ```

pub mod boat;
pub mod config;
pub mod environment;
pub mod error;
pub mod foil;
pub mod forces;
pub mod presets;
pub mod simulation;
pub mod state_log;

pub use config::{BoatConfig, EnvironmentConfig, PhysicsConfig};
pub use environment::Environment;
pub use error::{Result, SimError};
pub use foil::{FoilLibrary, FoilTable};
pub use simulation::{SimConfig, Simulation};
pub use state_log::StateLog;

pub use sail_types;
pub use sail_types::{AgentState, BoatState, ForceBreakdown, SimSnapshot, StepRecord, Vec2};
