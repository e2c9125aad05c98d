//! Environment state mutated by the control surface
//!
//! Every numeric field is bound to one slider. Values are clamped to the
//! slider's declared range on the way in, so the tick never sees an
//! out-of-range parameter.

use serde::{Deserialize, Serialize};

/// One numeric control on a scenario's control surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Control {
    Temperature,
    Co2,
    Salinity,
    WindSpeed,
    WindDirection,
    CurrentStrength,
    CurrentDirection,
    PollutionRate,
    CleanupEffort,
    FishingRate,
    PollutionLevel,
    ObjectDensity,
    TimeScale,
    Magnitude,
    WaterDepth,
    EpicenterDistance,
}

impl Control {
    /// DOM id of the slider bound to this control
    pub fn dom_id(&self) -> &'static str {
        match self {
            Control::Temperature => "temperature",
            Control::Co2 => "co2-level",
            Control::Salinity => "salinity",
            Control::WindSpeed => "wind-speed",
            Control::WindDirection => "wind-direction",
            Control::CurrentStrength => "current-strength",
            Control::CurrentDirection => "current-direction",
            Control::PollutionRate => "pollution-rate",
            Control::CleanupEffort => "cleanup-effort",
            Control::FishingRate => "fishing-rate",
            Control::PollutionLevel => "pollution-level",
            Control::ObjectDensity => "object-density",
            Control::TimeScale => "time-scale",
            Control::Magnitude => "earthquake-magnitude",
            Control::WaterDepth => "water-depth",
            Control::EpicenterDistance => "epicenter-distance",
        }
    }
}

/// Declared range and default of one control
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSpec {
    pub control: Control,
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl ControlSpec {
    pub const fn new(control: Control, min: f32, max: f32, default: f32) -> Self {
        Self {
            control,
            min,
            max,
            default,
        }
    }

    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

/// Crude oil grade for a spill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OilGrade {
    #[default]
    Light,
    Heavy,
}

impl OilGrade {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "light" => Some(OilGrade::Light),
            "heavy" => Some(OilGrade::Heavy),
            _ => None,
        }
    }

    /// Age (reference frames) at which a particle is fully weathered
    pub fn weathering_frames(&self) -> f32 {
        match self {
            OilGrade::Light => 1000.0,
            OilGrade::Heavy => 2000.0,
        }
    }

    /// Amplitude of the random velocity kick per frame
    pub fn drift_jitter(&self) -> f32 {
        match self {
            OilGrade::Light => 0.1,
            OilGrade::Heavy => 0.05,
        }
    }
}

/// Wave environment selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SeaState {
    #[default]
    DeepOcean,
    Coastline,
    ShallowWater,
}

impl SeaState {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "deep-ocean" => Some(SeaState::DeepOcean),
            "coastline" => Some(SeaState::Coastline),
            "shallow-water" => Some(SeaState::ShallowWater),
            _ => None,
        }
    }

    /// Amplitude multiplier
    pub fn factor(&self) -> f32 {
        match self {
            SeaState::DeepOcean => 1.0,
            SeaState::Coastline => 0.8,
            SeaState::ShallowWater => 0.6,
        }
    }

    /// Spatial wave frequency
    pub fn frequency(&self) -> f32 {
        match self {
            SeaState::DeepOcean => 0.1,
            SeaState::Coastline => 0.15,
            SeaState::ShallowWater => 0.2,
        }
    }
}

/// Scalar parameter bag read by every agent update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub temperature: f32,
    pub co2_ppm: f32,
    pub salinity: f32,
    pub wind_speed: f32,
    /// Degrees, 0 = +x
    pub wind_direction: f32,
    pub current_strength: f32,
    /// Degrees, 0 = +x
    pub current_direction: f32,
    pub pollution_rate: f32,
    pub cleanup_effort: f32,
    pub fishing_rate: f32,
    pub pollution_level: f32,
    pub object_density: f32,
    pub time_scale: f32,
    pub magnitude: f32,
    pub water_depth: f32,
    pub epicenter_distance: f32,
    pub oil_grade: OilGrade,
    pub sea_state: SeaState,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            temperature: 15.0,
            co2_ppm: 400.0,
            salinity: 35.0,
            wind_speed: 0.0,
            wind_direction: 0.0,
            current_strength: 0.0,
            current_direction: 0.0,
            pollution_rate: 1.0,
            cleanup_effort: 0.0,
            fishing_rate: 1.0,
            pollution_level: 0.0,
            object_density: 1000.0,
            time_scale: 1.0,
            magnitude: 7.0,
            water_depth: 4000.0,
            epicenter_distance: 200.0,
            oil_grade: OilGrade::Light,
            sea_state: SeaState::DeepOcean,
        }
    }
}

impl Environment {
    /// Environment with every declared control at its default
    pub fn from_controls(specs: &[ControlSpec]) -> Self {
        let mut env = Self::default();
        for spec in specs {
            *env.field_mut(spec.control) = spec.default;
        }
        env
    }

    pub fn get(&self, control: Control) -> f32 {
        match control {
            Control::Temperature => self.temperature,
            Control::Co2 => self.co2_ppm,
            Control::Salinity => self.salinity,
            Control::WindSpeed => self.wind_speed,
            Control::WindDirection => self.wind_direction,
            Control::CurrentStrength => self.current_strength,
            Control::CurrentDirection => self.current_direction,
            Control::PollutionRate => self.pollution_rate,
            Control::CleanupEffort => self.cleanup_effort,
            Control::FishingRate => self.fishing_rate,
            Control::PollutionLevel => self.pollution_level,
            Control::ObjectDensity => self.object_density,
            Control::TimeScale => self.time_scale,
            Control::Magnitude => self.magnitude,
            Control::WaterDepth => self.water_depth,
            Control::EpicenterDistance => self.epicenter_distance,
        }
    }

    fn field_mut(&mut self, control: Control) -> &mut f32 {
        match control {
            Control::Temperature => &mut self.temperature,
            Control::Co2 => &mut self.co2_ppm,
            Control::Salinity => &mut self.salinity,
            Control::WindSpeed => &mut self.wind_speed,
            Control::WindDirection => &mut self.wind_direction,
            Control::CurrentStrength => &mut self.current_strength,
            Control::CurrentDirection => &mut self.current_direction,
            Control::PollutionRate => &mut self.pollution_rate,
            Control::CleanupEffort => &mut self.cleanup_effort,
            Control::FishingRate => &mut self.fishing_rate,
            Control::PollutionLevel => &mut self.pollution_level,
            Control::ObjectDensity => &mut self.object_density,
            Control::TimeScale => &mut self.time_scale,
            Control::Magnitude => &mut self.magnitude,
            Control::WaterDepth => &mut self.water_depth,
            Control::EpicenterDistance => &mut self.epicenter_distance,
        }
    }

    /// Apply a slider value, clamped to its declared range.
    ///
    /// NaN keeps the previous value. Returns the value actually stored.
    pub fn set(&mut self, spec: &ControlSpec, value: f32) -> f32 {
        let field = self.field_mut(spec.control);
        if !value.is_nan() {
            *field = spec.clamp(value);
        }
        *field
    }

    /// Nudge a value by `delta` while keeping it inside `[lo, hi]`
    pub(crate) fn drift(&mut self, control: Control, delta: f32, lo: f32, hi: f32) {
        let field = self.field_mut(control);
        *field = (*field + delta).clamp(lo, hi);
    }

    /// Derive the per-tick scalars
    pub fn conditions(&self, temperature_from_co2: bool) -> Conditions {
        let temperature = if temperature_from_co2 {
            co2_temperature(self.co2_ppm)
        } else {
            self.temperature
        };
        Conditions {
            ph: ph_from_co2(self.co2_ppm),
            temperature,
            water_density: water_density(self.salinity, temperature),
        }
    }
}

/// Scalars derived from the environment once per tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conditions {
    pub ph: f32,
    pub temperature: f32,
    /// kg/m³
    pub water_density: f32,
}

/// Seawater pH for an atmospheric CO2 level (ppm)
pub fn ph_from_co2(co2_ppm: f32) -> f32 {
    8.1 - (co2_ppm.max(1.0) / 400.0).ln() * 0.3
}

/// Surface temperature implied by a CO2 level (°C)
pub fn co2_temperature(co2_ppm: f32) -> f32 {
    15.0 + (co2_ppm - 400.0) * 0.01
}

/// Water density for salinity (ppt) and temperature (°C)
pub fn water_density(salinity: f32, temperature: f32) -> f32 {
    1000.0 + 0.8 * salinity - 0.2 * temperature
}
