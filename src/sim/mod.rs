//! Deterministic simulation module
//!
//! All simulation logic lives here. This module must be pure and deterministic:
//! - Time advances only through `tick`
//! - Seeded RNG only
//! - Stable iteration order (kind declaration order, then insertion order)
//! - No rendering or platform dependencies

pub mod agent;
pub mod collision;
pub mod env;
pub mod interaction;
pub mod population;
pub mod scenario;
pub mod state;
pub mod tick;
pub mod tsunami;
pub mod waves;

pub use agent::{Agent, AgentKind, BoundaryPolicy, KindClass, KindState, PlasticMaterial, current_speed};
pub use env::{Conditions, Control, ControlSpec, Environment, OilGrade, SeaState};
pub use interaction::{Counters, Effect, InteractionRule, Reach};
pub use population::{AgentRef, Population, Populations};
pub use scenario::{Action, ActionSpec, Scenario};
pub use state::{Clock, DeployOutcome, SimEvent, SimState, deploy_cost};
pub use tick::{TickInput, apply_input, tick};
pub use tsunami::{Tsunami, TsunamiReport, TsunamiStage};
pub use waves::WaveReport;
