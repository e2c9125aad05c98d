//! Simulation settings and preferences
//!
//! Persisted separately from simulation state (which is never saved) in LocalStorage.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Arena;
use crate::consts::REFERENCE_FPS;
use crate::sim::AgentKind;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Maximum live agents per kind for this preset
    pub fn max_agents_per_kind(&self) -> usize {
        match self {
            QualityPreset::Low => 300,
            QualityPreset::Medium => 1500,
            QualityPreset::High => 4000,
        }
    }
}

/// Invalid settings values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("population ceiling for {kind:?} must be at least 1")]
    ZeroCeiling { kind: AgentKind },
    #[error("arena must have finite positive dimensions, got {width}x{height}")]
    InvalidArena { width: f32, height: f32 },
    #[error("reference frame rate must be finite and positive, got {0}")]
    InvalidFrameRate(f32),
}

/// Simulation settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Quality preset (drives default population ceilings)
    pub quality: QualityPreset,
    /// Per-kind ceiling overrides
    pub ceilings: BTreeMap<AgentKind, usize>,
    /// Arena size in canvas pixels
    pub arena: Arena,
    /// Frame rate the per-frame tuning constants assume
    pub reference_fps: f32,
    /// Fixed seed; `None` seeds from the clock on each scenario load
    pub seed: Option<u64>,
    /// Show the per-agent health bars
    pub health_bars: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            ceilings: BTreeMap::new(),
            arena: Arena::default(),
            reference_fps: REFERENCE_FPS,
            seed: None,
            health_bars: true,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Population ceiling for one kind (override, else preset default)
    pub fn ceiling(&self, kind: AgentKind) -> usize {
        self.ceilings
            .get(&kind)
            .copied()
            .unwrap_or_else(|| self.quality.max_agents_per_kind())
    }

    pub fn with_ceiling(mut self, kind: AgentKind, ceiling: usize) -> Self {
        self.ceilings.insert(kind, ceiling);
        self
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some((&kind, _)) = self.ceilings.iter().find(|(_, c)| **c == 0) {
            return Err(SettingsError::ZeroCeiling { kind });
        }
        let Arena { width, height } = self.arena;
        if !(width.is_finite() && width > 0.0 && height.is_finite() && height > 0.0) {
            return Err(SettingsError::InvalidArena { width, height });
        }
        if !(self.reference_fps.is_finite() && self.reference_fps > 0.0) {
            return Err(SettingsError::InvalidFrameRate(self.reference_fps));
        }
        Ok(())
    }

    /// Parse stored JSON, falling back to defaults on any problem
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<Settings>(json) {
            Ok(settings) => match settings.validate() {
                Ok(()) => settings,
                Err(e) => {
                    log::warn!("Stored settings rejected ({e}), using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Stored settings unreadable ({e}), using defaults");
                Self::default()
            }
        }
    }

    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "ocean_sim_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                log::info!("Loaded settings from LocalStorage");
                return Self::from_json(&json);
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
