//! Staged tsunami progression
//!
//! Stages advance on accumulated simulated seconds, never on wall-clock time.

use serde::{Deserialize, Serialize};

use super::env::Environment;

/// Seconds after the trigger when the sea starts to recede
pub const RECESSION_AT: f32 = 5.0;
/// Seconds after the trigger when the wave arrives
pub const WAVE_AT: f32 = 15.0;
/// Seconds after the trigger when the event is over
pub const FINISHED_AT: f32 = 200.0;
/// Wave height above which evacuation is ordered (m)
pub const EVACUATION_HEIGHT: f32 = 5.0;

const GRAVITY: f32 = 9.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TsunamiStage {
    #[default]
    Ready,
    Earthquake,
    WaterRecession,
    TsunamiWave,
}

impl TsunamiStage {
    pub fn label(&self) -> &'static str {
        match self {
            TsunamiStage::Ready => "Ready",
            TsunamiStage::Earthquake => "Earthquake",
            TsunamiStage::WaterRecession => "Water Recession",
            TsunamiStage::TsunamiWave => "Tsunami Wave",
        }
    }
}

/// Shallow-water wave speed (m/s) for an ocean depth (m)
pub fn wave_speed(depth: f32) -> f32 {
    (GRAVITY * depth.max(0.0)).sqrt()
}

/// Open-ocean amplitude (m) for a magnitude and epicentre distance (km)
pub fn wave_amplitude(magnitude: f32, distance: f32) -> f32 {
    10f32.powf(magnitude - 5.0) * 2.0 * (-distance / 1000.0).exp()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tsunami {
    pub stage: TsunamiStage,
    /// Simulated seconds since the trigger
    pub time: f32,
    pub max_wave_height: f32,
}

impl Tsunami {
    /// Start a new event from the top, whatever stage we were in
    pub fn trigger(&mut self) {
        self.stage = TsunamiStage::Earthquake;
        self.time = 0.0;
        self.max_wave_height = 0.0;
        log::info!("Tsunami triggered");
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.stage != TsunamiStage::Ready
    }

    /// Advance by `seconds` of simulated time. Returns the new stage on change.
    pub fn advance(&mut self, seconds: f32, env: &Environment) -> Option<TsunamiStage> {
        if !self.is_active() {
            return None;
        }
        let before = self.stage;
        self.time += seconds;

        match self.stage {
            TsunamiStage::Earthquake if self.time > RECESSION_AT => self.stage = TsunamiStage::WaterRecession,
            TsunamiStage::WaterRecession if self.time > WAVE_AT => self.stage = TsunamiStage::TsunamiWave,
            _ => {}
        }

        let amplitude = wave_amplitude(env.magnitude, env.epicenter_distance);
        self.max_wave_height = self.max_wave_height.max(amplitude);

        if self.time > FINISHED_AT {
            self.stage = TsunamiStage::Ready;
        }

        (self.stage != before).then(|| {
            log::info!("Tsunami stage: {}", self.stage.label());
            self.stage
        })
    }

    /// Surface displacement (m) at `distance` metres from the epicentre
    pub fn wave_height_at(&self, distance: f32, env: &Environment) -> f32 {
        let phase = distance - wave_speed(env.water_depth) * self.time;
        wave_amplitude(env.magnitude, env.epicenter_distance) * (-0.0001 * distance).exp() * (0.1 * phase).sin()
    }

    pub fn report(&self, env: &Environment) -> TsunamiReport {
        let speed = wave_speed(env.water_depth);
        let arrival_minutes = if speed > 0.0 {
            (env.epicenter_distance / speed).ceil().max(0.0)
        } else {
            0.0
        };
        let evacuate = self.max_wave_height > EVACUATION_HEIGHT;
        TsunamiReport {
            stage: self.stage,
            time: self.time,
            wave_speed: speed,
            max_wave_height: self.max_wave_height,
            arrival_minutes,
            evacuate,
            evacuation_status: if evacuate { "EVACUATE IMMEDIATELY" } else { "Stay Alert" },
        }
    }
}

/// Info-panel values for the tsunami scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TsunamiReport {
    pub stage: TsunamiStage,
    pub time: f32,
    /// m/s
    pub wave_speed: f32,
    /// m
    pub max_wave_height: f32,
    pub arrival_minutes: f32,
    pub evacuate: bool,
    pub evacuation_status: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(tsunami: &mut Tsunami, env: &Environment, seconds: f32) {
        let steps = (seconds / 0.1).round() as usize;
        for _ in 0..steps {
            tsunami.advance(0.1, env);
        }
    }

    #[test]
    fn test_idle_until_triggered() {
        let env = Environment::default();
        let mut tsunami = Tsunami::default();
        assert_eq!(tsunami.advance(10.0, &env), None);
        assert_eq!(tsunami.time, 0.0);
    }

    #[test]
    fn test_stage_progression() {
        let env = Environment::default();
        let mut tsunami = Tsunami::default();
        tsunami.trigger();
        assert_eq!(tsunami.stage, TsunamiStage::Earthquake);

        run(&mut tsunami, &env, 5.5);
        assert_eq!(tsunami.stage, TsunamiStage::WaterRecession);
        run(&mut tsunami, &env, 10.0);
        assert_eq!(tsunami.stage, TsunamiStage::TsunamiWave);
        run(&mut tsunami, &env, 190.0);
        assert_eq!(tsunami.stage, TsunamiStage::Ready);
    }

    #[test]
    fn test_retrigger_restarts() {
        let env = Environment::default();
        let mut tsunami = Tsunami::default();
        tsunami.trigger();
        run(&mut tsunami, &env, 20.0);
        tsunami.trigger();
        assert_eq!(tsunami.stage, TsunamiStage::Earthquake);
        assert_eq!(tsunami.time, 0.0);
        assert_eq!(tsunami.max_wave_height, 0.0);
    }

    #[test]
    fn test_report_values() {
        let mut env = Environment::default();
        env.water_depth = 4000.0;
        env.magnitude = 9.0;
        env.epicenter_distance = 200.0;
        let mut tsunami = Tsunami::default();
        tsunami.trigger();
        tsunami.advance(0.1, &env);

        let report = tsunami.report(&env);
        assert!((report.wave_speed - 197.99).abs() < 0.01);
        assert_eq!(report.arrival_minutes, 2.0);
        assert!(report.evacuate);
        assert_eq!(report.evacuation_status, "EVACUATE IMMEDIATELY");
    }

    #[test]
    fn test_small_quake_stays_alert() {
        let mut env = Environment::default();
        env.magnitude = 5.0;
        let mut tsunami = Tsunami::default();
        tsunami.trigger();
        tsunami.advance(0.1, &env);
        assert!(!tsunami.report(&env).evacuate);
    }
}
