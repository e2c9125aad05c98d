//! Simulation tick
//!
//! One call advances a scenario by `dt` seconds of host time:
//! input, seek, update, interactions, removals and splits, spawns, clock.

use glam::Vec2;
use rand::Rng;

use super::agent::{Agent, AgentKind, KindState, UpdateContext};
use super::collision::nearest_within;
use super::env::{Control, OilGrade, SeaState};
use super::interaction::{self, Effect};
use super::scenario::{Action, Scenario};
use super::state::{SimEvent, SimState};
use super::tsunami::TsunamiStage;
use super::waves;
use crate::consts::MAX_FRAME_DT;

/// Commands queued by the host between two ticks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Slider changes, applied in order
    pub controls: Vec<(Control, f32)>,
    pub oil_grade: Option<OilGrade>,
    pub sea_state: Option<SeaState>,
    /// Button presses, applied in order after the controls
    pub actions: Vec<Action>,
}

impl TickInput {
    pub fn is_empty(&self) -> bool {
        self.controls.is_empty() && self.oil_grade.is_none() && self.sea_state.is_none() && self.actions.is_empty()
    }

    pub fn control(mut self, control: Control, value: f32) -> Self {
        self.controls.push((control, value));
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Fold a later batch of input into this one
    pub fn merge(&mut self, other: TickInput) {
        self.controls.extend(other.controls);
        self.oil_grade = other.oil_grade.or(self.oil_grade);
        self.sea_state = other.sea_state.or(self.sea_state);
        self.actions.extend(other.actions);
    }
}

/// Advance the simulation by `dt` seconds of host time
pub fn tick(state: &mut SimState, input: &TickInput, dt: f32) {
    apply_input(state, input);

    let dt = if dt.is_finite() { dt.clamp(0.0, MAX_FRAME_DT) } else { 0.0 };
    let seconds = dt * state.env.time_scale;
    let frames = dt * state.settings.reference_fps * state.env.time_scale;

    // Everything below reads this snapshot, so slider moves land between ticks
    let env = state.env.clone();
    let conditions = state.conditions();
    let scenario = state.scenario;

    seek_targets(state);

    let ctx = UpdateContext {
        env: &env,
        conditions,
        arena: state.arena(),
        frames,
    };
    for pop in state.populations.iter_mut() {
        for agent in pop.agents_mut() {
            agent.update(&ctx, &mut state.rng);
        }
    }

    let plan = interaction::plan(&state.populations, scenario.rules(), &env, frames, &mut state.rng);
    interaction::apply(&plan, &mut state.populations, &mut state.counters);
    scenario.ambient(state, frames);

    remove_terminal(state);
    scenario.spawn(state, frames);
    advance_clock(state, seconds, frames);

    match scenario {
        Scenario::Tsunami => {
            if let Some(stage) = state.tsunami.advance(seconds, &env) {
                state.record(SimEvent::TsunamiStage(stage));
            }
        }
        Scenario::Waves => state.waves = waves::sample(&state.env, state.clock.elapsed),
        _ => {}
    }
}

/// Apply queued controls and actions to the state
pub fn apply_input(state: &mut SimState, input: &TickInput) {
    for &(control, value) in &input.controls {
        if state.set_control(control, value).is_none() {
            log::debug!("{:?} is not a {} control", control, state.scenario.title());
        }
    }
    if let Some(grade) = input.oil_grade {
        state.set_oil_grade(grade);
    }
    if let Some(sea_state) = input.sea_state {
        state.set_sea_state(sea_state);
    }

    for &action in &input.actions {
        match action {
            Action::Add(kind) => {
                state.add(kind);
            }
            Action::AddMarineLife => {
                const MARINE_LIFE: [AgentKind; 3] = [AgentKind::Whale, AgentKind::Turtle, AgentKind::Fish];
                let kind = MARINE_LIFE[state.rng.random_range(0..MARINE_LIFE.len())];
                state.add(kind);
            }
            Action::Deploy(kind) => {
                state.deploy(kind);
            }
            Action::StartSpill => {
                state.start_spill();
            }
            Action::TriggerTsunami if state.scenario == Scenario::Tsunami => {
                state.tsunami.trigger();
                state.record(SimEvent::TsunamiStage(TsunamiStage::Earthquake));
            }
            Action::ToggleTimeLapse if state.scenario == Scenario::Currents => {
                state.toggle_time_lapse();
            }
            Action::Reset => state.reset(),
            other => log::debug!("{:?} ignored in {}", other, state.scenario.title()),
        }
    }
}

/// Point each collector at the nearest thing it can collect
fn seek_targets(state: &mut SimState) {
    let rules = state.scenario.rules();
    for seeker in [AgentKind::Skimmer, AgentKind::Drone] {
        let candidates: Vec<Vec2> = rules
            .iter()
            .filter(|r| r.actor == seeker && matches!(r.effect, Effect::Collection))
            .flat_map(|r| state.populations.agents(r.target))
            .filter(|a| !a.is_terminal())
            .map(|a| a.pos)
            .collect();

        let Some(pop) = state.populations.get_mut(seeker) else {
            continue;
        };
        for agent in pop.agents_mut() {
            agent.target = match agent.state {
                KindState::Collector {
                    detection_radius,
                    capacity,
                    collected,
                    ..
                } if capacity.is_none_or(|c| collected < c) => {
                    nearest_within(agent.pos, detection_radius, candidates.iter().copied()).map(|(_, p)| p)
                }
                _ => None,
            };
        }
    }
}

/// Drop terminal agents and put any split products in their place
fn remove_terminal(state: &mut SimState) {
    let mut splits: Vec<Agent> = Vec::new();
    for pop in state.populations.iter_mut() {
        for dead in pop.retain_live() {
            if dead.split_products().is_some() {
                splits.push(dead);
            }
        }
    }

    for parent in &splits {
        let Some((kind, count)) = parent.split_products() else {
            continue;
        };
        for _ in 0..count {
            let id = state.next_entity_id();
            let fragment = Agent::fragment(id, parent, &mut state.rng);
            debug_assert_eq!(fragment.kind, kind);
            state.populations.push(fragment);
        }
    }
}

fn advance_clock(state: &mut SimState, seconds: f32, frames: f32) {
    state.clock.ticks += 1;
    state.clock.elapsed += seconds;

    match state.scenario {
        Scenario::Acidification => {
            if let Some(year) = state.clock.year.as_mut() {
                *year += 0.1 * frames;
            }
        }
        Scenario::Currents => {
            let Some(acc) = state.time_lapse.as_mut() else {
                return;
            };
            *acc += seconds;
            while *acc >= 1.0 {
                *acc -= 1.0;
                if let Some(year) = state.clock.year.as_mut() {
                    *year += 1.0;
                }
                state.env.drift(Control::Temperature, 0.1, 0.0, 30.0);
                state.env.drift(Control::Salinity, -0.05, 30.0, 40.0);
                state.env.drift(Control::WindSpeed, 0.1, 0.0, 20.0);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{FRAME_DT, MAX_ENERGY};
    use crate::sim::agent::PlasticMaterial;
    use crate::Settings;
    use proptest::prelude::*;

    fn empty(scenario: Scenario) -> SimState {
        let mut state = SimState::new(scenario, Settings::default(), 42);
        state.populations.clear();
        state
    }

    fn push(state: &mut SimState, agent: impl FnOnce(u32) -> Agent) {
        let id = state.next_entity_id();
        assert!(state.populations.push(agent(id)));
    }

    fn run(state: &mut SimState, ticks: usize) {
        let input = TickInput::default();
        for _ in 0..ticks {
            tick(state, &input, FRAME_DT);
        }
    }

    #[test]
    fn test_co2_stresses_shellfish() {
        let mut calm = empty(Scenario::Acidification);
        push(&mut calm, |id| Agent::new(id, AgentKind::Shellfish, Vec2::new(100.0, 500.0)));
        let mut acid = calm.clone();

        tick(&mut acid, &TickInput::default().control(Control::Co2, 1000.0), FRAME_DT);
        tick(&mut calm, &TickInput::default(), FRAME_DT);
        run(&mut acid, 9);
        run(&mut calm, 9);

        let health = |s: &SimState| s.populations.agents(AgentKind::Shellfish)[0].health;
        assert_eq!(health(&calm), 100.0);
        assert!(health(&acid) < 100.0);
    }

    #[test]
    fn test_plastic_splits_into_microplastics() {
        let mut state = empty(Scenario::PlasticPollution);
        state.set_control(Control::PollutionRate, 0.0);
        push(&mut state, |id| {
            Agent::new(id, AgentKind::PlasticParticle, Vec2::new(400.0, 300.0))
                .with_state(KindState::Plastic {
                    material: PlasticMaterial::Pvc,
                })
                .with_lifespan(5.0)
        });

        for _ in 0..4 {
            run(&mut state, 1);
            assert_eq!(state.populations.count(AgentKind::PlasticParticle), 1);
            assert_eq!(state.populations.count(AgentKind::Microplastic), 0);
        }
        run(&mut state, 1);
        assert_eq!(state.populations.count(AgentKind::PlasticParticle), 0);
        assert_eq!(state.populations.count(AgentKind::Microplastic), 5);
        for micro in state.populations.agents(AgentKind::Microplastic) {
            assert_eq!(
                micro.state,
                KindState::Plastic {
                    material: PlasticMaterial::Pvc
                }
            );
        }
    }

    #[test]
    fn test_collected_plastic_does_not_split() {
        let mut state = empty(Scenario::PlasticPollution);
        state.set_control(Control::PollutionRate, 0.0);
        let pos = Vec2::new(400.0, 300.0);
        push(&mut state, |id| Agent::new(id, AgentKind::PlasticParticle, pos).with_lifespan(2.0));
        push(&mut state, |id| {
            Agent::new(id, AgentKind::Skimmer, pos).with_state(KindState::Collector {
                efficiency: 1.0,
                detection_radius: 200.0,
                capacity: None,
                collected: 0,
            })
        });

        run(&mut state, 1);
        assert_eq!(state.populations.count(AgentKind::PlasticParticle), 0);
        assert_eq!(state.populations.count(AgentKind::Microplastic), 0);
        assert_eq!(state.counters.plastic_collected, 1);
    }

    #[test]
    fn test_perfect_skimmer_collects_in_one_tick() {
        let mut state = empty(Scenario::PlasticPollution);
        state.set_control(Control::PollutionRate, 0.0);
        let pos = Vec2::new(200.0, 200.0);
        push(&mut state, |id| Agent::new(id, AgentKind::PlasticParticle, pos));
        push(&mut state, |id| {
            Agent::new(id, AgentKind::Skimmer, pos).with_state(KindState::Collector {
                efficiency: 1.0,
                detection_radius: 200.0,
                capacity: None,
                collected: 0,
            })
        });

        run(&mut state, 1);
        assert_eq!(state.populations.count(AgentKind::PlasticParticle), 0);
        assert_eq!(state.counters.plastic_collected, 1);
    }

    #[test]
    fn test_skimmer_heads_for_nearest_plastic() {
        let mut state = empty(Scenario::PlasticPollution);
        state.set_control(Control::PollutionRate, 0.0);
        push(&mut state, |id| Agent::new(id, AgentKind::Skimmer, Vec2::new(100.0, 100.0)));
        push(&mut state, |id| Agent::new(id, AgentKind::PlasticParticle, Vec2::new(180.0, 100.0)));
        push(&mut state, |id| Agent::new(id, AgentKind::PlasticParticle, Vec2::new(100.0, 500.0)));

        seek_targets(&mut state);
        let skimmer = &state.populations.agents(AgentKind::Skimmer)[0];
        assert_eq!(skimmer.target, Some(Vec2::new(180.0, 100.0)));
    }

    #[test]
    fn test_dead_organism_removed_next_tick() {
        let mut state = empty(Scenario::PlasticPollution);
        state.set_control(Control::PollutionRate, 0.0);
        push(&mut state, |id| {
            let mut fish = Agent::new(id, AgentKind::Fish, Vec2::new(300.0, 300.0));
            fish.health = 0.0;
            fish
        });
        run(&mut state, 1);
        assert_eq!(state.populations.count(AgentKind::Fish), 0);
    }

    #[test]
    fn test_acidification_year_advances() {
        let mut state = empty(Scenario::Acidification);
        run(&mut state, 10);
        let year = state.clock.year.unwrap_or_default();
        assert!((year - 2025.0).abs() < 1e-2);
    }

    #[test]
    fn test_time_lapse_drifts_currents() {
        let mut state = empty(Scenario::Currents);
        tick(&mut state, &TickInput::default().action(Action::ToggleTimeLapse), FRAME_DT);
        // 0.1 s per tick at the clamp
        for _ in 0..20 {
            tick(&mut state, &TickInput::default(), 0.1);
        }
        assert_eq!(state.clock.year, Some(2025.0));
        assert!((state.env.temperature - 15.2).abs() < 1e-3);
        assert!((state.env.salinity - 34.9).abs() < 1e-3);
    }

    #[test]
    fn test_tsunami_stage_events() {
        let mut state = empty(Scenario::Tsunami);
        tick(&mut state, &TickInput::default().action(Action::TriggerTsunami), 0.1);
        for _ in 0..60 {
            tick(&mut state, &TickInput::default(), 0.1);
        }
        let events = state.drain_events();
        assert!(events.contains(&SimEvent::TsunamiStage(TsunamiStage::Earthquake)));
        assert!(events.contains(&SimEvent::TsunamiStage(TsunamiStage::WaterRecession)));
        assert_eq!(state.tsunami.stage, TsunamiStage::WaterRecession);
    }

    #[test]
    fn test_foreign_actions_ignored() {
        let mut state = empty(Scenario::Waves);
        let input = TickInput::default()
            .action(Action::TriggerTsunami)
            .action(Action::StartSpill)
            .action(Action::ToggleTimeLapse);
        tick(&mut state, &input, FRAME_DT);
        assert!(!state.tsunami.is_active());
        assert!(!state.spill_active);
        assert!(state.time_lapse.is_none());
    }

    #[test]
    fn test_waves_report_refreshed() {
        let mut state = empty(Scenario::Waves);
        run(&mut state, 1);
        assert!(state.waves.height > 0.0);
        assert!(state.waves.length > 0.0);
    }

    #[test]
    fn test_huge_dt_is_clamped() {
        let mut state = empty(Scenario::Acidification);
        tick(&mut state, &TickInput::default(), 10.0);
        assert!((state.clock.elapsed - MAX_FRAME_DT).abs() < 1e-6);
        tick(&mut state, &TickInput::default(), f32::NAN);
        assert!((state.clock.elapsed - MAX_FRAME_DT).abs() < 1e-6);
    }

    #[test]
    fn test_ticks_deterministic() {
        let mut a = SimState::new(Scenario::Ecosystem, Settings::default(), 9);
        let mut b = SimState::new(Scenario::Ecosystem, Settings::default(), 9);
        run(&mut a, 30);
        run(&mut b, 30);
        let pa: Vec<Vec2> = a.populations.all_agents().map(|x| x.pos).collect();
        let pb: Vec<Vec2> = b.populations.all_agents().map(|x| x.pos).collect();
        assert_eq!(pa, pb);
        assert_eq!(a.counters, b.counters);
    }

    /// Plastic particles released over `seconds` of simulated time at a fixed frame length
    fn plastic_released(seed: u64, dt: f32, seconds: f32) -> usize {
        let mut state = SimState::new(Scenario::PlasticPollution, Settings::default(), seed);
        state.populations.clear();
        state.set_control(Control::PollutionRate, 5.0);
        state.set_control(Control::CleanupEffort, 0.0);
        let ticks = (seconds / dt).round() as usize;
        for _ in 0..ticks {
            tick(&mut state, &TickInput::default(), dt);
        }
        state.populations.count(AgentKind::PlasticParticle)
    }

    #[test]
    fn test_spawn_totals_independent_of_frame_rate() {
        // 0.5 per reference frame: three whole spawns every 100 ms tick
        assert_eq!(plastic_released(1, 0.1, 10.0), 300);

        let seeds = 0..5u64;
        let n = seeds.clone().count() as f32;
        let mean = seeds.map(|s| plastic_released(s, FRAME_DT, 10.0) as f32).sum::<f32>() / n;
        assert!((mean - 300.0).abs() < 30.0, "60 fps mean {mean}");
    }

    #[test]
    fn test_input_merge_keeps_order() {
        let mut first = TickInput::default().control(Control::Co2, 500.0);
        first.merge(TickInput::default().control(Control::Co2, 600.0).action(Action::Reset));
        assert_eq!(first.controls, vec![(Control::Co2, 500.0), (Control::Co2, 600.0)]);
        assert_eq!(first.actions, vec![Action::Reset]);
    }

    proptest! {
        #[test]
        fn prop_health_stays_bounded(co2 in 300.0f32..1000.0, scale in 1.0f32..100.0, ticks in 1usize..40) {
            let mut state = SimState::new(Scenario::Acidification, Settings::default(), 3);
            let input = TickInput::default()
                .control(Control::Co2, co2)
                .control(Control::TimeScale, scale);
            tick(&mut state, &input, FRAME_DT);
            run(&mut state, ticks);
            for agent in state.populations.all_agents() {
                prop_assert!(agent.health >= 0.0);
                prop_assert!(agent.health <= agent.rules().max_health);
            }
        }

        #[test]
        fn prop_health_and_energy_bounded(
            seed in any::<u64>(),
            which in 0usize..3,
            health in 0.0f32..=100.0,
            energy in 0.0f32..=MAX_ENERGY,
            knobs in proptest::collection::vec((0usize..8, 0.0f32..=1.0, 0.0f32..=0.1), 1..15),
        ) {
            let scenario = [Scenario::PlasticPollution, Scenario::Ecosystem, Scenario::OilSpill][which];
            let mut state = SimState::new(scenario, Settings::default(), seed);
            if scenario == Scenario::OilSpill {
                tick(&mut state, &TickInput::default().action(Action::StartSpill), FRAME_DT);
            }
            for pop in state.populations.iter_mut() {
                for agent in pop.agents_mut() {
                    agent.health = health.min(agent.rules().max_health);
                    agent.energy = energy;
                }
            }

            let controls = scenario.controls();
            for (pick, t, dt) in knobs {
                let spec = controls[pick % controls.len()];
                let input = TickInput::default().control(spec.control, spec.min + t * (spec.max - spec.min));
                for _ in 0..3 {
                    tick(&mut state, &input, dt);
                    for agent in state.populations.all_agents() {
                        prop_assert!(agent.health >= 0.0, "{:?} health {}", agent.kind, agent.health);
                        prop_assert!(agent.health <= agent.rules().max_health, "{:?} health {}", agent.kind, agent.health);
                        prop_assert!(agent.energy >= 0.0, "{:?} energy {}", agent.kind, agent.energy);
                        prop_assert!(agent.energy <= MAX_ENERGY, "{:?} energy {}", agent.kind, agent.energy);
                    }
                }
            }
        }

        #[test]
        fn prop_ceilings_hold(ceiling in 1usize..50, ticks in 1usize..60) {
            let settings = Settings::default().with_ceiling(AgentKind::Plankton, ceiling);
            let mut state = SimState::new(Scenario::Ecosystem, settings, 5);
            run(&mut state, ticks);
            prop_assert!(state.populations.count(AgentKind::Plankton) <= ceiling);
        }
    }
}
