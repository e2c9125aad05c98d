//! Scenario tables
//!
//! A scenario is data: which controls it exposes, which kinds it hosts (in
//! update order), which interaction rules apply, and how agents are placed
//! and spawned. The engine in `tick` is the same for all of them.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::agent::{Agent, AgentKind, KindState, chance, spawn_count};
use super::env::{Control, ControlSpec, Environment};
use super::interaction::{Effect, InteractionRule, Reach};
use super::state::SimState;

/// Bearing (degrees, screen space) of the Gulf Stream's first leg
pub const GULF_STREAM_BEARING: f32 = 296.6;
/// Starting budget for the spill response
pub const SPILL_BUDGET: u32 = 10_000;
/// Oil particles released when a spill starts
pub const SPILL_PARTICLES: usize = 1000;
/// Animals exposed to a spill
pub const SPILL_WILDLIFE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Scenario {
    #[default]
    Acidification,
    Waves,
    Currents,
    PlasticPollution,
    Tsunami,
    Ecosystem,
    OilSpill,
    Salinity,
}

/// A user action bound to one button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Add one agent of a kind at a scenario-chosen spot
    Add(AgentKind),
    /// Add a random whale, turtle or fish
    AddMarineLife,
    /// Buy and deploy spill response gear
    Deploy(AgentKind),
    StartSpill,
    TriggerTsunami,
    ToggleTimeLapse,
    /// Restore control defaults and clear all agents
    Reset,
}

/// Button id and the action it fires
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionSpec {
    pub dom_id: &'static str,
    pub action: Action,
}

const fn button(dom_id: &'static str, action: Action) -> ActionSpec {
    ActionSpec { dom_id, action }
}

const ACIDIFICATION_CONTROLS: &[ControlSpec] = &[
    ControlSpec::new(Control::Co2, 300.0, 1000.0, 400.0),
    ControlSpec::new(Control::TimeScale, 1.0, 100.0, 1.0),
];
const WAVES_CONTROLS: &[ControlSpec] = &[
    ControlSpec::new(Control::WindSpeed, 0.0, 30.0, 10.0),
    ControlSpec::new(Control::WindDirection, 0.0, 359.0, 0.0),
];
const CURRENTS_CONTROLS: &[ControlSpec] = &[
    ControlSpec::new(Control::Temperature, 0.0, 30.0, 15.0),
    ControlSpec::new(Control::Salinity, 30.0, 40.0, 35.0),
    ControlSpec::new(Control::WindSpeed, 0.0, 20.0, 5.0),
];
const PLASTIC_CONTROLS: &[ControlSpec] = &[
    ControlSpec::new(Control::PollutionRate, 0.0, 5.0, 1.0),
    ControlSpec::new(Control::CleanupEffort, 0.0, 100.0, 0.0),
    ControlSpec::new(Control::WindSpeed, 0.0, 50.0, 0.0),
    ControlSpec::new(Control::CurrentStrength, 0.0, 10.0, 0.0),
];
const TSUNAMI_CONTROLS: &[ControlSpec] = &[
    ControlSpec::new(Control::Magnitude, 5.0, 9.0, 7.0),
    ControlSpec::new(Control::WaterDepth, 1000.0, 8000.0, 4000.0),
    ControlSpec::new(Control::EpicenterDistance, 50.0, 500.0, 200.0),
];
const ECOSYSTEM_CONTROLS: &[ControlSpec] = &[
    ControlSpec::new(Control::FishingRate, 0.0, 5.0, 1.0),
    ControlSpec::new(Control::PollutionLevel, 0.0, 100.0, 0.0),
    ControlSpec::new(Control::Temperature, 0.0, 30.0, 15.0),
];
const OIL_SPILL_CONTROLS: &[ControlSpec] = &[
    ControlSpec::new(Control::WindDirection, 0.0, 359.0, 0.0),
    ControlSpec::new(Control::WindSpeed, 0.0, 100.0, 0.0),
    ControlSpec::new(Control::CurrentDirection, 0.0, 359.0, 0.0),
];
const SALINITY_CONTROLS: &[ControlSpec] = &[
    ControlSpec::new(Control::Salinity, 0.0, 50.0, 35.0),
    ControlSpec::new(Control::ObjectDensity, 800.0, 1200.0, 1000.0),
    ControlSpec::new(Control::Temperature, 0.0, 40.0, 20.0),
];

const ACIDIFICATION_ACTIONS: &[ActionSpec] = &[
    button("add-shellfish", Action::Add(AgentKind::Shellfish)),
    button("add-coral", Action::Add(AgentKind::Coral)),
    button("add-phytoplankton", Action::Add(AgentKind::Phytoplankton)),
];
const CURRENTS_ACTIONS: &[ActionSpec] = &[
    button("add-debris", Action::Add(AgentKind::Debris)),
    button("add-marine-life", Action::AddMarineLife),
    button("toggle-time-lapse", Action::ToggleTimeLapse),
];
const PLASTIC_ACTIONS: &[ActionSpec] = &[
    button("add-fish", Action::Add(AgentKind::Fish)),
    button("add-turtle", Action::Add(AgentKind::Turtle)),
    button("add-shark", Action::Add(AgentKind::Shark)),
    button("add-skimmer", Action::Add(AgentKind::Skimmer)),
    button("add-boom", Action::Add(AgentKind::Boom)),
    button("add-drone", Action::Add(AgentKind::Drone)),
];
const TSUNAMI_ACTIONS: &[ActionSpec] = &[button("trigger-tsunami", Action::TriggerTsunami)];
const ECOSYSTEM_ACTIONS: &[ActionSpec] = &[
    button("add-ship", Action::Add(AgentKind::Ship)),
    button("add-oil-spill", Action::Add(AgentKind::OilSlick)),
];
const OIL_SPILL_ACTIONS: &[ActionSpec] = &[
    button("start-spill", Action::StartSpill),
    button("deploy-skimmer", Action::Deploy(AgentKind::Skimmer)),
    button("deploy-boom", Action::Deploy(AgentKind::Boom)),
    button("deploy-dispersant", Action::Deploy(AgentKind::Dispersant)),
];
const SALINITY_ACTIONS: &[ActionSpec] = &[
    button("add-object", Action::Add(AgentKind::FloatingObject)),
    button("reset", Action::Reset),
];

const ORGANISM_PLASTIC: Effect = Effect::Ingestion { multiplier: 5.0 };
const ORGANISM_MICROPLASTIC: Effect = Effect::Ingestion { multiplier: 1.0 };

const PLASTIC_RULES: &[InteractionRule] = &[
    InteractionRule::new(
        AgentKind::Shark,
        AgentKind::Fish,
        Reach::Touch,
        Effect::Predation {
            health_gain: 10.0,
            energy_gain: 0.0,
            inherit_microplastics: true,
        },
    ),
    InteractionRule::new(AgentKind::Fish, AgentKind::PlasticParticle, Reach::Touch, ORGANISM_PLASTIC),
    InteractionRule::new(AgentKind::Fish, AgentKind::Microplastic, Reach::Touch, ORGANISM_MICROPLASTIC),
    InteractionRule::new(AgentKind::Turtle, AgentKind::PlasticParticle, Reach::Touch, ORGANISM_PLASTIC),
    InteractionRule::new(AgentKind::Turtle, AgentKind::Microplastic, Reach::Touch, ORGANISM_MICROPLASTIC),
    InteractionRule::new(AgentKind::Shark, AgentKind::PlasticParticle, Reach::Touch, ORGANISM_PLASTIC),
    InteractionRule::new(AgentKind::Shark, AgentKind::Microplastic, Reach::Touch, ORGANISM_MICROPLASTIC),
    InteractionRule::new(AgentKind::Skimmer, AgentKind::PlasticParticle, Reach::Touch, Effect::Collection),
    InteractionRule::new(AgentKind::Skimmer, AgentKind::Microplastic, Reach::Touch, Effect::Collection),
    InteractionRule::new(AgentKind::Boom, AgentKind::PlasticParticle, Reach::Touch, Effect::Collection),
    InteractionRule::new(AgentKind::Boom, AgentKind::Microplastic, Reach::Touch, Effect::Collection),
    InteractionRule::new(AgentKind::Drone, AgentKind::PlasticParticle, Reach::Touch, Effect::Collection),
    InteractionRule::new(AgentKind::Drone, AgentKind::Microplastic, Reach::Touch, Effect::Collection),
];

const ECOSYSTEM_RULES: &[InteractionRule] = &[
    InteractionRule::new(
        AgentKind::PreyFish,
        AgentKind::Plankton,
        Reach::ActorRadius,
        Effect::Predation {
            health_gain: 0.0,
            energy_gain: 10.0,
            inherit_microplastics: false,
        },
    ),
    InteractionRule::new(
        AgentKind::PredatorFish,
        AgentKind::PreyFish,
        Reach::ActorScaled(2.0),
        Effect::Predation {
            health_gain: 0.0,
            energy_gain: 50.0,
            inherit_microplastics: false,
        },
    ),
    InteractionRule::new(AgentKind::Ship, AgentKind::PreyFish, Reach::FishingRadius(50.0), Effect::Harvest),
    InteractionRule::new(AgentKind::Ship, AgentKind::PredatorFish, Reach::FishingRadius(50.0), Effect::Harvest),
    InteractionRule::new(AgentKind::OilSlick, AgentKind::PreyFish, Reach::ActorRadius, Effect::Drain { energy: 1.0 }),
    InteractionRule::new(AgentKind::OilSlick, AgentKind::PredatorFish, Reach::ActorRadius, Effect::Drain { energy: 1.0 }),
    InteractionRule::new(AgentKind::OilSlick, AgentKind::Plankton, Reach::ActorRadius, Effect::Smother),
];

const OIL_SPILL_RULES: &[InteractionRule] = &[
    InteractionRule::new(AgentKind::Skimmer, AgentKind::OilParticle, Reach::ActorRadius, Effect::Collection),
    InteractionRule::new(AgentKind::Boom, AgentKind::OilParticle, Reach::Touch, Effect::Deflect { factor: -0.5 }),
    InteractionRule::new(AgentKind::Dispersant, AgentKind::OilParticle, Reach::ActorRadius, Effect::Disperse { rate: 0.01 }),
    InteractionRule::new(AgentKind::Fish, AgentKind::OilParticle, Reach::Fixed(10.0), Effect::Contamination { impact: 10.0 }),
    InteractionRule::new(AgentKind::Seabird, AgentKind::OilParticle, Reach::Fixed(10.0), Effect::Contamination { impact: 10.0 }),
];

impl Scenario {
    pub const ALL: [Scenario; 8] = [
        Scenario::Acidification,
        Scenario::Waves,
        Scenario::Currents,
        Scenario::PlasticPollution,
        Scenario::Tsunami,
        Scenario::Ecosystem,
        Scenario::OilSpill,
        Scenario::Salinity,
    ];

    /// Navigation id
    pub fn id(&self) -> &'static str {
        match self {
            Scenario::Acidification => "acidification",
            Scenario::Waves => "waves",
            Scenario::Currents => "currents",
            Scenario::PlasticPollution => "plastic",
            Scenario::Tsunami => "tsunami",
            Scenario::Ecosystem => "ecosystem",
            Scenario::OilSpill => "oilspill",
            Scenario::Salinity => "salinity",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Scenario::Acidification => "Ocean Acidification",
            Scenario::Waves => "Wave Dynamics",
            Scenario::Currents => "Ocean Currents",
            Scenario::PlasticPollution => "Plastic Pollution",
            Scenario::Tsunami => "Tsunami",
            Scenario::Ecosystem => "Marine Ecosystem",
            Scenario::OilSpill => "Oil Spill Cleanup",
            Scenario::Salinity => "Salinity and Density",
        }
    }

    pub fn controls(&self) -> &'static [ControlSpec] {
        match self {
            Scenario::Acidification => ACIDIFICATION_CONTROLS,
            Scenario::Waves => WAVES_CONTROLS,
            Scenario::Currents => CURRENTS_CONTROLS,
            Scenario::PlasticPollution => PLASTIC_CONTROLS,
            Scenario::Tsunami => TSUNAMI_CONTROLS,
            Scenario::Ecosystem => ECOSYSTEM_CONTROLS,
            Scenario::OilSpill => OIL_SPILL_CONTROLS,
            Scenario::Salinity => SALINITY_CONTROLS,
        }
    }

    pub fn control(&self, control: Control) -> Option<&'static ControlSpec> {
        self.controls().iter().find(|spec| spec.control == control)
    }

    /// DOM id of a control's slider in this scenario's markup
    pub fn dom_id(&self, control: Control) -> &'static str {
        match (self, control) {
            (Scenario::Currents, Control::WindSpeed) => "wind-strength",
            _ => control.dom_id(),
        }
    }

    pub fn actions(&self) -> &'static [ActionSpec] {
        match self {
            Scenario::Acidification => ACIDIFICATION_ACTIONS,
            Scenario::Currents => CURRENTS_ACTIONS,
            Scenario::PlasticPollution => PLASTIC_ACTIONS,
            Scenario::Tsunami => TSUNAMI_ACTIONS,
            Scenario::Ecosystem => ECOSYSTEM_ACTIONS,
            Scenario::OilSpill => OIL_SPILL_ACTIONS,
            Scenario::Salinity => SALINITY_ACTIONS,
            Scenario::Waves => &[],
        }
    }

    /// Kinds hosted by this scenario, in update order
    pub fn kinds(&self) -> &'static [AgentKind] {
        match self {
            Scenario::Acidification => &[
                AgentKind::Shellfish,
                AgentKind::Coral,
                AgentKind::Phytoplankton,
                AgentKind::Bubble,
            ],
            Scenario::Currents => &[AgentKind::Debris, AgentKind::Whale, AgentKind::Turtle, AgentKind::Fish],
            Scenario::PlasticPollution => &[
                AgentKind::PlasticParticle,
                AgentKind::Microplastic,
                AgentKind::Fish,
                AgentKind::Turtle,
                AgentKind::Shark,
                AgentKind::Skimmer,
                AgentKind::Boom,
                AgentKind::Drone,
            ],
            Scenario::Ecosystem => &[
                AgentKind::Plankton,
                AgentKind::PreyFish,
                AgentKind::PredatorFish,
                AgentKind::Ship,
                AgentKind::OilSlick,
            ],
            Scenario::OilSpill => &[
                AgentKind::OilParticle,
                AgentKind::Skimmer,
                AgentKind::Boom,
                AgentKind::Dispersant,
                AgentKind::Fish,
                AgentKind::Seabird,
            ],
            Scenario::Salinity => &[AgentKind::FloatingObject],
            Scenario::Waves | Scenario::Tsunami => &[],
        }
    }

    /// Interaction table, evaluated in declaration order
    pub fn rules(&self) -> &'static [InteractionRule] {
        match self {
            Scenario::PlasticPollution => PLASTIC_RULES,
            Scenario::Ecosystem => ECOSYSTEM_RULES,
            Scenario::OilSpill => OIL_SPILL_RULES,
            _ => &[],
        }
    }

    /// Whether the loop runs as soon as the scenario loads
    pub fn auto_start(&self) -> bool {
        !matches!(self, Scenario::Tsunami | Scenario::OilSpill)
    }

    /// Acidification drives temperature from CO2 instead of a slider
    pub fn temperature_from_co2(&self) -> bool {
        matches!(self, Scenario::Acidification)
    }

    /// Year the scenario clock starts at, if it has one
    pub fn start_year(&self) -> Option<f32> {
        match self {
            Scenario::Acidification => Some(2024.0),
            Scenario::Currents => Some(2023.0),
            _ => None,
        }
    }

    /// Environment with every control at its default
    pub fn environment(&self) -> Environment {
        let mut env = Environment::from_controls(self.controls());
        match self {
            Scenario::OilSpill => env.current_strength = 5.0,
            Scenario::Currents => env.current_direction = GULF_STREAM_BEARING,
            _ => {}
        }
        env
    }

    /// Initial population for a fresh load
    pub(crate) fn populate(&self, state: &mut SimState) {
        let arena = state.arena();
        match self {
            Scenario::Acidification => {
                for _ in 0..20 {
                    let pos = Vec2::new(
                        state.rng.random_range(0.0..arena.width),
                        state.rng.random_range(0.0..arena.height),
                    );
                    state.spawn(AgentKind::Bubble, pos);
                }
                for _ in 0..5 {
                    for kind in [AgentKind::Shellfish, AgentKind::Coral, AgentKind::Phytoplankton] {
                        let agent = self.place(kind, state);
                        state.populations.push(agent);
                    }
                }
            }
            Scenario::Ecosystem => {
                for _ in 0..100 {
                    let kind = if state.rng.random_bool(0.2) {
                        AgentKind::PredatorFish
                    } else {
                        AgentKind::PreyFish
                    };
                    let pos = state.random_position();
                    state.spawn(kind, pos);
                }
                for _ in 0..1000 {
                    let pos = state.random_position();
                    state.spawn(AgentKind::Plankton, pos);
                }
            }
            _ => {}
        }
    }

    /// Build one agent of `kind` where this scenario puts new arrivals
    pub(crate) fn place(&self, kind: AgentKind, state: &mut SimState) -> Agent {
        let arena = state.arena();
        let id = state.next_entity_id();
        let rng = &mut state.rng;
        let anywhere = Vec2::new(rng.random_range(0.0..arena.width), rng.random_range(0.0..arena.height));

        match (self, kind) {
            // Bottom-dwellers live in the lower half
            (Scenario::Acidification, _) => {
                let pos = Vec2::new(
                    rng.random_range(0.0..arena.width),
                    rng.random_range(arena.height / 2.0..arena.height),
                );
                Agent::spawn(id, kind, pos, rng)
            }
            (Scenario::PlasticPollution, AgentKind::Boom) => {
                // A boom is a barrier spanning the full water column
                let x = anywhere.x;
                Agent::new(id, kind, Vec2::new(x, 0.0)).with_state(KindState::Boom {
                    end: Vec2::new(x, arena.height),
                    efficiency: 0.9,
                })
            }
            (Scenario::OilSpill, AgentKind::Skimmer) => {
                let mut skimmer = Agent::spawn(id, kind, anywhere, rng)
                    .with_size(30.0)
                    .with_state(KindState::Collector {
                        efficiency: rng.random_range(0.8..=1.0),
                        detection_radius: arena.width.hypot(arena.height),
                        capacity: Some(100),
                        collected: 0,
                    });
                skimmer.speed = 2.0;
                skimmer
            }
            (Scenario::OilSpill, AgentKind::Boom) => {
                let end = Vec2::new(rng.random_range(0.0..arena.width), rng.random_range(0.0..arena.height));
                Agent::new(id, kind, anywhere)
                    .with_size(2.5)
                    .with_state(KindState::Boom { end, efficiency: 0.0 })
            }
            (Scenario::Ecosystem, AgentKind::OilSlick) => Agent::new(id, kind, anywhere),
            (Scenario::Salinity, AgentKind::FloatingObject) => {
                let density = state.env.object_density;
                Agent::new(id, kind, Vec2::new(anywhere.x, arena.height / 2.0))
                    .with_state(KindState::Buoyant { density })
            }
            _ => Agent::spawn(id, kind, anywhere, rng),
        }
    }

    /// Release a spill at the arena centre along with the exposed wildlife
    pub(crate) fn release_spill(&self, state: &mut SimState) {
        let center = state.arena().center();
        let grade = state.env.oil_grade;
        if let Some(pop) = state.populations.get_mut(AgentKind::OilParticle) {
            pop.clear();
        }
        for kind in [AgentKind::Fish, AgentKind::Seabird] {
            if let Some(pop) = state.populations.get_mut(kind) {
                pop.clear();
            }
        }
        for _ in 0..SPILL_PARTICLES {
            let id = state.next_entity_id();
            let oil = Agent::oil(id, center, grade, &mut state.rng);
            state.populations.push(oil);
        }
        for _ in 0..SPILL_WILDLIFE {
            let kind = if state.rng.random_bool(0.5) {
                AgentKind::Fish
            } else {
                AgentKind::Seabird
            };
            let pos = state.random_position();
            let id = state.next_entity_id();
            let animal = Agent::spawn(id, kind, pos, &mut state.rng);
            state.populations.push(animal);
        }
    }

    /// Probabilistic per-tick spawns
    pub(crate) fn spawn(&self, state: &mut SimState, frames: f32) {
        let arena = state.arena();
        match self {
            Scenario::Acidification => {
                let p = 0.1 * state.env.co2_ppm / 400.0;
                for _ in 0..spawn_count(&mut state.rng, p, frames) {
                    let x = state.rng.random_range(0.0..arena.width);
                    state.spawn(AgentKind::Bubble, Vec2::new(x, arena.height));
                }
            }
            Scenario::PlasticPollution => {
                let p = 0.1 * state.env.pollution_rate;
                for _ in 0..spawn_count(&mut state.rng, p, frames) {
                    let x = state.rng.random_range(0.0..arena.width);
                    state.spawn(AgentKind::PlasticParticle, Vec2::new(x, 0.0));
                }
            }
            Scenario::Ecosystem => {
                let comfort = 1.0 - (state.conditions().temperature - 15.0).abs() / 15.0;

                // Well-fed fish breed; the parent pays for it
                for kind in [AgentKind::PreyFish, AgentKind::PredatorFish] {
                    let count = state.populations.count(kind);
                    for i in 0..count {
                        let ready = state.populations.agents(kind)[i].energy > 150.0;
                        if ready && chance(&mut state.rng, 0.01 * comfort, frames) {
                            let pos = state.random_position();
                            if state.spawn(kind, pos) {
                                if let Some(parent) = state.populations.get_mut(kind).map(|p| &mut p.agents_mut()[i]) {
                                    parent.add_energy(-50.0);
                                }
                            }
                        }
                    }
                }

                let growth = 0.1 * (1.0 - state.env.pollution_level / 100.0) * comfort;
                for _ in 0..spawn_count(&mut state.rng, growth, frames) {
                    let pos = state.random_position();
                    state.spawn(AgentKind::Plankton, pos);
                }
            }
            _ => {}
        }
    }

    /// Removals that come from the environment rather than another agent
    pub(crate) fn ambient(&self, state: &mut SimState, frames: f32) {
        if *self != Scenario::PlasticPollution || state.env.cleanup_effort <= 0.0 {
            return;
        }
        let p = state.env.cleanup_effort / 10_000.0;
        let rng = &mut state.rng;
        let mut cleaned = 0;
        if let Some(pop) = state.populations.get_mut(AgentKind::PlasticParticle) {
            for particle in pop.agents_mut() {
                if !particle.is_terminal() && chance(rng, p, frames) {
                    particle.consume();
                    cleaned += 1;
                }
            }
        }
        state.counters.plastic_collected += cleaned;
    }

    /// Educational note for the salinity scenario
    pub fn salinity_note(salinity: f32, temperature: f32) -> String {
        let mut note = if salinity < 5.0 {
            "Low salinity: This represents freshwater environments like rivers and lakes.".to_string()
        } else if salinity < 30.0 {
            "Moderate salinity: This is typical of brackish water in estuaries.".to_string()
        } else {
            "High salinity: This represents typical ocean conditions.".to_string()
        };
        if temperature < 10.0 {
            note.push_str(" The low temperature increases water density.");
        } else if temperature > 30.0 {
            note.push_str(" The high temperature decreases water density.");
        }
        note
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip() {
        for scenario in Scenario::ALL {
            assert_eq!(Scenario::from_id(scenario.id()), Some(scenario));
        }
        assert_eq!(Scenario::from_id("nope"), None);
    }

    #[test]
    fn test_rules_only_reference_hosted_kinds() {
        for scenario in Scenario::ALL {
            let kinds = scenario.kinds();
            for rule in scenario.rules() {
                assert!(kinds.contains(&rule.actor), "{scenario:?} {:?}", rule.actor);
                assert!(kinds.contains(&rule.target), "{scenario:?} {:?}", rule.target);
            }
        }
    }

    #[test]
    fn test_add_actions_reference_hosted_kinds() {
        for scenario in Scenario::ALL {
            for spec in scenario.actions() {
                if let Action::Add(kind) | Action::Deploy(kind) = spec.action {
                    assert!(scenario.kinds().contains(&kind), "{scenario:?} {kind:?}");
                }
            }
        }
    }

    #[test]
    fn test_control_defaults_within_range() {
        for scenario in Scenario::ALL {
            for spec in scenario.controls() {
                assert!(spec.min <= spec.default && spec.default <= spec.max, "{scenario:?} {spec:?}");
            }
        }
    }

    #[test]
    fn test_only_trigger_scenarios_start_idle() {
        let idle: Vec<_> = Scenario::ALL.into_iter().filter(|s| !s.auto_start()).collect();
        assert_eq!(idle, vec![Scenario::Tsunami, Scenario::OilSpill]);
    }

    #[test]
    fn test_spill_wildlife_speeds() {
        let mut state = SimState::new(Scenario::OilSpill, crate::Settings::default(), 6);
        assert!(state.start_spill());
        let base = AgentKind::Fish.rules().base_speed;
        for fish in state.populations.agents(AgentKind::Fish) {
            assert_eq!(fish.speed, base);
        }
        let birds = state.populations.agents(AgentKind::Seabird);
        assert!(!birds.is_empty());
        assert!(birds.iter().all(|b| (1.0..3.0).contains(&b.speed)));
    }

    #[test]
    fn test_salinity_note_bands() {
        assert!(Scenario::salinity_note(2.0, 20.0).starts_with("Low salinity"));
        assert!(Scenario::salinity_note(20.0, 20.0).starts_with("Moderate salinity"));
        assert!(Scenario::salinity_note(35.0, 5.0).ends_with("increases water density."));
        assert!(Scenario::salinity_note(35.0, 35.0).ends_with("decreases water density."));
    }
}
