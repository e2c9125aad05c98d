//! Ocean Sim - agent-based ocean phenomenon simulations
//!
//! Core modules:
//! - `sim`: Deterministic simulation (agents, populations, interactions, tick)
//! - `stats`: Read-only projection of simulation state for info panels
//! - `render`: Per-agent draw list handed to the canvas collaborator
//! - `platform`: Frame scheduling seam between host and simulation
//! - `settings`: Persisted preferences (quality preset, population ceilings)

pub mod platform;
pub mod render;
pub mod settings;
pub mod sim;
pub mod stats;

pub use platform::{Driver, FrameScheduler, LoopState, ManualScheduler};
pub use settings::{QualityPreset, Settings, SettingsError};

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Frame rate the per-frame tuning constants are written against
    pub const REFERENCE_FPS: f32 = 60.0;
    /// Duration of one reference frame in seconds
    pub const FRAME_DT: f32 = 1.0 / REFERENCE_FPS;
    /// Longest elapsed time a single tick will integrate (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Arena dimensions (canvas pixels)
    pub const ARENA_WIDTH: f32 = 800.0;
    pub const ARENA_HEIGHT: f32 = 600.0;

    /// Health ceiling shared by every organism kind
    pub const MAX_HEALTH: f32 = 100.0;
    /// Energy ceiling for energy-metabolising fish
    pub const MAX_ENERGY: f32 = 300.0;
    /// Starting energy for newly spawned fish
    pub const START_ENERGY: f32 = 100.0;

    /// Number of microplastics an expired plastic particle breaks into
    pub const MICROPLASTICS_PER_SPLIT: usize = 5;
    /// Undrained events kept before the oldest are dropped
    pub const MAX_PENDING_EVENTS: usize = 256;
}

/// Axis-aligned arena the agents live in, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width: consts::ARENA_WIDTH,
            height: consts::ARENA_HEIGHT,
        }
    }
}

impl Arena {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Clamp a point into the arena
    #[inline]
    pub fn clamp(&self, pos: Vec2) -> Vec2 {
        Vec2::new(pos.x.clamp(0.0, self.width), pos.y.clamp(0.0, self.height))
    }
}

/// Unit vector for a compass heading given in degrees
#[inline]
pub fn heading_vector(degrees: f32) -> Vec2 {
    let rad = degrees.to_radians();
    Vec2::new(rad.cos(), rad.sin())
}

/// Unit vector for an angle in radians
#[inline]
pub fn direction(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Wrap an angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}
