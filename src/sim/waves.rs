//! Wind-driven wave field
//!
//! The wave scenario has no agents. Its surface is sampled on a square
//! grid each tick and summarised into a report.

use serde::Serialize;

use super::env::Environment;

/// Grid segments per side (the grid has `GRID_SEGMENTS + 1` vertices per side)
pub const GRID_SEGMENTS: usize = 128;
/// Side length of the sampled patch
pub const PATCH_SIZE: f32 = 100.0;
/// Wave height at the reference wind speed
pub const BASE_HEIGHT: f32 = 2.0;
/// Wind speed at which waves reach `BASE_HEIGHT`
pub const REFERENCE_WIND: f32 = 30.0;

const GRAVITY: f32 = 9.8;
const WATER_DENSITY: f32 = 1000.0;

/// Surface elevation at patch coordinates `(x, y)` and time `t` seconds
pub fn surface_height(x: f32, y: f32, t: f32, env: &Environment) -> f32 {
    let frequency = env.sea_state.frequency();
    let scale = BASE_HEIGHT * (env.wind_speed / REFERENCE_WIND) * env.sea_state.factor();
    let along = (x * frequency + t + env.wind_direction.to_radians()).sin();
    let across = (y * frequency + t).cos();
    (along + across) * scale
}

/// Summary of the wave field
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WaveReport {
    /// Largest absolute elevation on the grid (m)
    pub height: f32,
    /// m
    pub length: f32,
    /// s
    pub period: f32,
    /// J/m²
    pub energy: f32,
}

/// Sample the grid at time `t` and derive the report
pub fn sample(env: &Environment, t: f32) -> WaveReport {
    let step = PATCH_SIZE / GRID_SEGMENTS as f32;
    let half = PATCH_SIZE / 2.0;

    let mut height = 0.0f32;
    for row in 0..=GRID_SEGMENTS {
        let y = row as f32 * step - half;
        for col in 0..=GRID_SEGMENTS {
            let x = col as f32 * step - half;
            height = height.max(surface_height(x, y, t, env).abs());
        }
    }

    let length = std::f32::consts::PI / env.sea_state.frequency();
    WaveReport {
        height,
        length,
        period: (std::f32::consts::TAU * length / GRAVITY).sqrt(),
        energy: WATER_DENSITY * GRAVITY * height * height / 8.0,
    }
}

/// Elevations along the middle row, for drawing a side profile
pub fn profile(env: &Environment, t: f32, columns: usize) -> Vec<f32> {
    if columns < 2 {
        return vec![surface_height(0.0, 0.0, t, env); columns];
    }
    let step = PATCH_SIZE / (columns - 1) as f32;
    (0..columns)
        .map(|i| surface_height(i as f32 * step - PATCH_SIZE / 2.0, 0.0, t, env))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::env::SeaState;

    #[test]
    fn test_calm_sea_is_flat() {
        let mut env = Environment::default();
        env.wind_speed = 0.0;
        let report = sample(&env, 3.0);
        assert_eq!(report.height, 0.0);
        assert_eq!(report.energy, 0.0);
    }

    #[test]
    fn test_wave_length_and_period() {
        let mut env = Environment::default();
        env.sea_state = SeaState::DeepOcean;
        let report = sample(&env, 0.0);
        assert!((report.length - 31.4159).abs() < 1e-3);
        assert!((report.period - 4.4880).abs() < 1e-3);
    }

    #[test]
    fn test_stronger_wind_bigger_waves() {
        let mut env = Environment::default();
        env.wind_speed = 10.0;
        let low = sample(&env, 1.0);
        env.wind_speed = 30.0;
        let high = sample(&env, 1.0);
        assert!(high.height > low.height);
        assert!(high.height <= 2.0 * BASE_HEIGHT + 1e-4);
    }

    #[test]
    fn test_shallow_water_damps() {
        let mut env = Environment::default();
        env.wind_speed = 30.0;
        let deep = sample(&env, 1.0);
        env.sea_state = SeaState::ShallowWater;
        let shallow = sample(&env, 1.0);
        assert!(shallow.height < deep.height);
    }

    #[test]
    fn test_profile_length() {
        let env = Environment::default();
        assert_eq!(profile(&env, 0.0, 64).len(), 64);
        assert_eq!(profile(&env, 0.0, 1).len(), 1);
    }
}
