//! Info-panel projection
//!
//! A pure read of [`SimState`]; nothing here feeds back into the simulation.

use serde::Serialize;

use crate::consts::MAX_HEALTH;
use crate::sim::agent::{KindClass, KindState, StressRule};
use crate::sim::{AgentKind, Conditions, Counters, Scenario, SimState, TsunamiReport, WaveReport};

/// Three-tier organism condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthLabel {
    Healthy,
    ModerateStress,
    SevereStress,
}

impl HealthLabel {
    pub fn label(&self) -> &'static str {
        match self {
            HealthLabel::Healthy => "Healthy",
            HealthLabel::ModerateStress => "Moderate stress",
            HealthLabel::SevereStress => "Severe stress",
        }
    }
}

/// Outer band sits 0.2 pH / 2 °C past the critical value
pub fn health_label(stress: &StressRule, cond: &Conditions) -> HealthLabel {
    if cond.ph < stress.critical_ph - 0.2 || cond.temperature > stress.critical_temp + 2.0 {
        HealthLabel::SevereStress
    } else if cond.ph < stress.critical_ph || cond.temperature > stress.critical_temp {
        HealthLabel::ModerateStress
    } else {
        HealthLabel::Healthy
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KindStats {
    pub kind: AgentKind,
    pub count: usize,
    pub ceiling: usize,
    /// Spawns refused by the ceiling so far
    pub dropped: u64,
}

/// Everything the info panel shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub scenario: Scenario,
    pub kinds: Vec<KindStats>,
    pub total: usize,
    /// Mean organism health; 100 when there are no organisms
    pub mean_health: f32,
    /// Mean energy of energy-metabolising fish, if any are alive
    pub mean_energy: Option<f32>,
    pub stress: Vec<(AgentKind, HealthLabel)>,
    pub ph: f32,
    pub temperature: f32,
    pub water_density: f32,
    /// Whole calendar year, for scenarios that keep one
    pub year: Option<i32>,
    pub elapsed: f32,
    pub counters: Counters,
    /// Animals currently carrying oil
    pub contaminated: usize,
    /// Spill budget left, in the oil spill scenario
    pub budget: Option<u32>,
    pub salinity_note: Option<String>,
    pub waves: Option<WaveReport>,
    pub tsunami: Option<TsunamiReport>,
}

impl Stats {
    pub fn count(&self, kind: AgentKind) -> usize {
        self.kinds.iter().find(|k| k.kind == kind).map_or(0, |k| k.count)
    }
}

fn mean(values: impl Iterator<Item = f32>) -> Option<f32> {
    let (sum, n) = values.fold((0.0f32, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f32)
}

/// Project the current state into display values
pub fn project(state: &SimState) -> Stats {
    let cond = state.conditions();
    let pops = &state.populations;

    let kinds: Vec<KindStats> = pops
        .iter()
        .map(|p| KindStats {
            kind: p.kind,
            count: p.len(),
            ceiling: p.ceiling(),
            dropped: p.dropped(),
        })
        .collect();

    let organisms = || pops.all_agents().filter(|a| a.kind.class() == KindClass::Organism);
    let mean_health = mean(organisms().map(|a| a.health)).unwrap_or(MAX_HEALTH);
    let mean_energy = mean(organisms().filter(|a| a.kind.uses_energy()).map(|a| a.energy));
    let contaminated = organisms()
        .filter(|a| matches!(a.state, KindState::Animal { contaminated: true, .. }))
        .count();

    let stress = state
        .scenario
        .kinds()
        .iter()
        .filter_map(|&kind| kind.rules().stress.map(|s| (kind, health_label(&s, &cond))))
        .collect();

    Stats {
        scenario: state.scenario,
        total: pops.total(),
        kinds,
        mean_health,
        mean_energy,
        stress,
        ph: cond.ph,
        temperature: cond.temperature,
        water_density: cond.water_density,
        year: state.clock.year.map(|y| y.floor() as i32),
        elapsed: state.clock.elapsed,
        counters: state.counters.clone(),
        contaminated,
        budget: (state.scenario == Scenario::OilSpill).then_some(state.budget),
        salinity_note: (state.scenario == Scenario::Salinity)
            .then(|| Scenario::salinity_note(state.env.salinity, cond.temperature)),
        waves: (state.scenario == Scenario::Waves).then_some(state.waves),
        tsunami: (state.scenario == Scenario::Tsunami).then(|| state.tsunami.report(&state.env)),
    }
}
