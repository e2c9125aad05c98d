//! Simulation context
//!
//! Everything one tick reads or writes lives in [`SimState`]. Nothing here
//! is persisted; switching scenario builds a fresh state.

use std::collections::VecDeque;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use super::agent::{Agent, AgentKind};
use super::env::{Conditions, Control, Environment, OilGrade, SeaState};
use super::interaction::Counters;
use super::population::Populations;
use super::scenario::{Scenario, SPILL_BUDGET};
use super::tsunami::{Tsunami, TsunamiStage};
use super::waves::WaveReport;
use crate::consts::MAX_PENDING_EVENTS;
use crate::{Arena, Settings};

/// Simulated time bookkeeping
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Clock {
    pub ticks: u64,
    /// Simulated seconds (time scale applied)
    pub elapsed: f32,
    /// Scenario calendar year, if the scenario keeps one
    pub year: Option<f32>,
}

/// Something the host may want to show or log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SimEvent {
    Added { kind: AgentKind },
    /// A spawn the population ceiling refused
    Refused { kind: AgentKind },
    Deployed { kind: AgentKind, cost: u32, remaining: u32 },
    DeployRefused { kind: AgentKind, cost: u32, budget: u32 },
    SpillStarted,
    TsunamiStage(TsunamiStage),
    TimeLapse(bool),
    Reset,
}

/// Result of trying to buy spill response gear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeployOutcome {
    Deployed { remaining: u32 },
    /// Not enough budget; nothing was spent
    Refused { cost: u32, budget: u32 },
    /// This scenario has nothing to buy
    Unavailable,
}

/// Price of one piece of spill response gear
pub fn deploy_cost(kind: AgentKind) -> Option<u32> {
    match kind {
        AgentKind::Skimmer => Some(500),
        AgentKind::Boom => Some(200),
        AgentKind::Dispersant => Some(1000),
        _ => None,
    }
}

/// Complete simulation state for one loaded scenario
#[derive(Debug, Clone)]
pub struct SimState {
    /// Seed the RNG was built from
    pub seed: u64,
    pub rng: Pcg32,
    pub scenario: Scenario,
    pub settings: Settings,
    pub env: Environment,
    pub populations: Populations,
    pub counters: Counters,
    pub clock: Clock,
    pub budget: u32,
    pub spill_active: bool,
    /// Seconds accumulated toward the next time-lapse year, when running
    pub time_lapse: Option<f32>,
    pub tsunami: Tsunami,
    pub waves: WaveReport,
    /// Events since the host last drained them, oldest first
    events: VecDeque<SimEvent>,
    next_id: u32,
}

impl SimState {
    /// Load a scenario with its default controls and initial population
    pub fn new(scenario: Scenario, settings: Settings, seed: u64) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            scenario,
            env: scenario.environment(),
            populations: Populations::new(scenario.kinds(), &settings),
            settings,
            counters: Counters::default(),
            clock: Clock {
                year: scenario.start_year(),
                ..Clock::default()
            },
            budget: SPILL_BUDGET,
            spill_active: false,
            time_lapse: None,
            tsunami: Tsunami::default(),
            waves: WaveReport::default(),
            events: VecDeque::new(),
            next_id: 1,
        };
        scenario.populate(&mut state);
        log::info!(
            "Loaded {} ({} agents, seed {})",
            scenario.title(),
            state.populations.total(),
            seed
        );
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    #[inline]
    pub fn arena(&self) -> Arena {
        self.settings.arena
    }

    pub fn random_position(&mut self) -> Vec2 {
        let arena = self.arena();
        Vec2::new(
            self.rng.random_range(0.0..arena.width),
            self.rng.random_range(0.0..arena.height),
        )
    }

    /// Scalars derived from the current environment
    pub fn conditions(&self) -> Conditions {
        self.env.conditions(self.scenario.temperature_from_co2())
    }

    /// Spawn a randomised agent at `pos`. Returns false if the ceiling refused it.
    pub fn spawn(&mut self, kind: AgentKind, pos: Vec2) -> bool {
        let id = self.next_entity_id();
        let agent = Agent::spawn(id, kind, pos, &mut self.rng);
        self.populations.push(agent)
    }

    /// Apply a slider value. Returns the stored value, or `None` if this
    /// scenario has no such control.
    pub fn set_control(&mut self, control: Control, value: f32) -> Option<f32> {
        let spec = self.scenario.control(control)?;
        Some(self.env.set(spec, value))
    }

    pub fn set_oil_grade(&mut self, grade: OilGrade) {
        self.env.oil_grade = grade;
    }

    pub fn set_sea_state(&mut self, sea_state: SeaState) {
        self.env.sea_state = sea_state;
    }

    /// Add one agent where the scenario puts new arrivals
    pub fn add(&mut self, kind: AgentKind) -> bool {
        let scenario = self.scenario;
        let agent = scenario.place(kind, self);
        let kept = self.populations.push(agent);
        self.record(if kept {
            SimEvent::Added { kind }
        } else {
            SimEvent::Refused { kind }
        });
        log::debug!("Add {}: {}", kind.label(), if kept { "ok" } else { "refused" });
        kept
    }

    /// Buy and place spill response gear if the budget covers it
    pub fn deploy(&mut self, kind: AgentKind) -> DeployOutcome {
        let Some(cost) = deploy_cost(kind).filter(|_| self.scenario == Scenario::OilSpill) else {
            return DeployOutcome::Unavailable;
        };
        if self.budget < cost {
            log::warn!("Cannot afford {} (${cost}, budget ${})", kind.label(), self.budget);
            self.record(SimEvent::DeployRefused {
                kind,
                cost,
                budget: self.budget,
            });
            return DeployOutcome::Refused { cost, budget: self.budget };
        }
        let scenario = self.scenario;
        let agent = scenario.place(kind, self);
        if !self.populations.push(agent) {
            self.record(SimEvent::Refused { kind });
            return DeployOutcome::Refused { cost, budget: self.budget };
        }
        self.budget -= cost;
        log::debug!("Deployed {} for ${cost}, ${} left", kind.label(), self.budget);
        self.record(SimEvent::Deployed {
            kind,
            cost,
            remaining: self.budget,
        });
        DeployOutcome::Deployed { remaining: self.budget }
    }

    /// Release the spill. Does nothing while one is already active.
    pub fn start_spill(&mut self) -> bool {
        if self.scenario != Scenario::OilSpill || self.spill_active {
            return false;
        }
        self.spill_active = true;
        self.clock.elapsed = 0.0;
        self.counters.environmental_impact = 0.0;
        let scenario = self.scenario;
        scenario.release_spill(self);
        log::info!("Oil spill started ({:?} crude)", self.env.oil_grade);
        self.record(SimEvent::SpillStarted);
        true
    }

    pub fn toggle_time_lapse(&mut self) -> bool {
        self.time_lapse = match self.time_lapse {
            Some(_) => None,
            None => Some(0.0),
        };
        let on = self.time_lapse.is_some();
        log::info!("Time-lapse {}", if on { "started" } else { "stopped" });
        self.record(SimEvent::TimeLapse(on));
        on
    }

    /// Restore control defaults and clear every population
    pub fn reset(&mut self) {
        let (grade, sea_state) = (self.env.oil_grade, self.env.sea_state);
        self.env = self.scenario.environment();
        self.env.oil_grade = grade;
        self.env.sea_state = sea_state;
        self.populations.clear();
        log::info!("{} reset", self.scenario.title());
        self.record(SimEvent::Reset);
    }

    /// Queue an event for the host; past the cap the oldest is dropped
    pub(crate) fn record(&mut self, event: SimEvent) {
        if self.events.len() >= MAX_PENDING_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Events recorded and not yet drained
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Take the events recorded since the last call
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_populations() {
        let state = SimState::new(Scenario::Acidification, Settings::default(), 1);
        assert_eq!(state.populations.count(AgentKind::Bubble), 20);
        assert_eq!(state.populations.count(AgentKind::Shellfish), 5);
        assert_eq!(state.clock.year, Some(2024.0));

        let state = SimState::new(Scenario::Ecosystem, Settings::default(), 1);
        let fish = state.populations.count(AgentKind::PreyFish) + state.populations.count(AgentKind::PredatorFish);
        assert_eq!(fish, 100);
        assert_eq!(state.populations.count(AgentKind::Plankton), 1000);
    }

    #[test]
    fn test_event_queue_drops_oldest() {
        let mut state = SimState::new(Scenario::Currents, Settings::default(), 1);
        for _ in 0..MAX_PENDING_EVENTS {
            state.toggle_time_lapse();
        }
        state.reset();
        assert_eq!(state.pending_events(), MAX_PENDING_EVENTS);
        let events = state.drain_events();
        // The first toggle fell off the front
        assert_eq!(events[0], SimEvent::TimeLapse(false));
        assert_eq!(events.last(), Some(&SimEvent::Reset));
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_same_seed_same_state() {
        let a = SimState::new(Scenario::Ecosystem, Settings::default(), 77);
        let b = SimState::new(Scenario::Ecosystem, Settings::default(), 77);
        let pa: Vec<Vec2> = a.populations.all_agents().map(|x| x.pos).collect();
        let pb: Vec<Vec2> = b.populations.all_agents().map(|x| x.pos).collect();
        assert_eq!(pa, pb);
    }

    #[test]
    fn test_set_control_clamps_and_rejects_foreign_controls() {
        let mut state = SimState::new(Scenario::Acidification, Settings::default(), 1);
        assert_eq!(state.set_control(Control::Co2, 5000.0), Some(1000.0));
        assert_eq!(state.set_control(Control::FishingRate, 2.0), None);
    }

    #[test]
    fn test_deploy_spends_budget_until_refused() {
        let mut state = SimState::new(Scenario::OilSpill, Settings::default(), 1);
        for _ in 0..10 {
            assert!(matches!(state.deploy(AgentKind::Dispersant), DeployOutcome::Deployed { .. }));
        }
        assert_eq!(state.budget, 0);
        assert_eq!(
            state.deploy(AgentKind::Boom),
            DeployOutcome::Refused { cost: 200, budget: 0 }
        );
        assert_eq!(state.populations.count(AgentKind::Boom), 0);
    }

    #[test]
    fn test_deploy_unavailable_elsewhere() {
        let mut state = SimState::new(Scenario::PlasticPollution, Settings::default(), 1);
        assert_eq!(state.deploy(AgentKind::Skimmer), DeployOutcome::Unavailable);
    }

    #[test]
    fn test_spill_starts_once() {
        let mut state = SimState::new(Scenario::OilSpill, Settings::default(), 1);
        assert!(state.start_spill());
        assert_eq!(state.populations.count(AgentKind::OilParticle), 1000);
        let wildlife = state.populations.count(AgentKind::Fish) + state.populations.count(AgentKind::Seabird);
        assert_eq!(wildlife, 20);
        assert!(!state.start_spill());
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut state = SimState::new(Scenario::Salinity, Settings::default(), 1);
        state.set_control(Control::Salinity, 10.0);
        state.add(AgentKind::FloatingObject);
        state.reset();
        assert_eq!(state.env.salinity, 35.0);
        assert_eq!(state.populations.total(), 0);
    }
}
