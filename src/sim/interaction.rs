//! Pairwise proximity interactions
//!
//! Resolution is split in two: [`plan`] reads an immutable snapshot of the
//! populations and produces an [`InteractionPlan`], then [`apply`] writes the
//! consequences back. Rules run in declaration order, and an agent removed
//! earlier in the plan takes no further part in it.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::agent::{Agent, AgentKind, KindState};
use super::env::Environment;
use super::population::{AgentRef, Populations};

/// How close two agents must be for a rule to fire
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reach {
    /// Bodies overlap: distance < actor radius + target radius
    Touch,
    /// Target centre inside the actor's radius
    ActorRadius,
    /// Target centre inside a multiple of the actor's radius
    ActorScaled(f32),
    /// Fixed distance in pixels
    Fixed(f32),
    /// Fixed distance scaled by the fishing-rate control
    FishingRadius(f32),
}

impl Reach {
    pub fn within(&self, actor: &Agent, target: &Agent, env: &Environment) -> bool {
        let distance = actor.distance_to(target);
        let limit = match *self {
            Reach::Touch => actor.radius() + target.radius(),
            Reach::ActorRadius => actor.radius(),
            Reach::ActorScaled(factor) => actor.radius() * factor,
            Reach::Fixed(d) => d,
            Reach::FishingRadius(d) => d * env.fishing_rate,
        };
        distance < limit
    }
}

/// What a rule does to the pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    /// Target eaten; actor gains health/energy
    Predation {
        health_gain: f32,
        energy_gain: f32,
        /// Predator takes on the prey's microplastic load
        inherit_microplastics: bool,
    },
    /// Target swallowed; actor loses `toxicity * multiplier` health
    Ingestion { multiplier: f32 },
    /// Target removed with probability equal to the actor's efficiency
    Collection,
    /// Target caught by a fishing ship
    Harvest,
    /// Actor becomes contaminated (once)
    Contamination { impact: f32 },
    /// Target loses energy every frame it stays in reach
    Drain { energy: f32 },
    /// Target killed outright
    Smother,
    /// Target velocity multiplied by `factor`
    Deflect { factor: f32 },
    /// Target weathers faster
    Disperse { rate: f32 },
}

/// One entry of a scenario's interaction table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionRule {
    pub actor: AgentKind,
    pub target: AgentKind,
    pub reach: Reach,
    pub effect: Effect,
}

impl InteractionRule {
    pub const fn new(actor: AgentKind, target: AgentKind, reach: Reach, effect: Effect) -> Self {
        Self {
            actor,
            target,
            reach,
            effect,
        }
    }
}

/// Simulation-level counters, read only by the stats projection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Counters {
    pub fish_caught: u64,
    pub plastic_collected: u64,
    pub oil_collected: u64,
    pub contaminations: u64,
    pub ingestions: u64,
    pub predations: u64,
    pub environmental_impact: f32,
}

impl Counters {
    pub fn merge(&mut self, other: &Counters) {
        self.fish_caught += other.fish_caught;
        self.plastic_collected += other.plastic_collected;
        self.oil_collected += other.oil_collected;
        self.contaminations += other.contaminations;
        self.ingestions += other.ingestions;
        self.predations += other.predations;
        self.environmental_impact += other.environmental_impact;
    }
}

/// A single planned write
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Consequence {
    Remove(AgentRef),
    Health(AgentRef, f32),
    Energy(AgentRef, f32),
    ScaleVelocity(AgentRef, f32),
    Weather(AgentRef, f32),
    Contaminate(AgentRef),
    Ingest {
        animal: AgentRef,
        plastic: u32,
        microplastic: u32,
    },
    InheritMicroplastics {
        predator: AgentRef,
        amount: u32,
    },
    Collected(AgentRef),
    Caught(AgentRef),
}

/// Everything one resolver pass decided
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionPlan {
    pub consequences: Vec<Consequence>,
    pub counters: Counters,
}

impl InteractionPlan {
    /// Agents the plan removes, in decision order
    pub fn removed(&self) -> impl Iterator<Item = AgentRef> + '_ {
        self.consequences.iter().filter_map(|c| match c {
            Consequence::Remove(r) => Some(*r),
            _ => None,
        })
    }
}

enum Flow {
    Continue,
    /// The actor is done for this rule
    NextActor,
}

#[derive(Default)]
struct Planner {
    plan: InteractionPlan,
    removed: HashSet<AgentRef>,
    contaminated: HashSet<AgentRef>,
    collected: HashMap<AgentRef, u32>,
}

impl Planner {
    fn remove(&mut self, r: AgentRef) {
        self.removed.insert(r);
        self.plan.consequences.push(Consequence::Remove(r));
    }

    fn push(&mut self, c: Consequence) {
        self.plan.consequences.push(c);
    }

    #[allow(clippy::too_many_arguments)]
    fn resolve(
        &mut self,
        effect: Effect,
        actor_ref: AgentRef,
        actor: &Agent,
        target_ref: AgentRef,
        target: &Agent,
        frames: f32,
        rng: &mut Pcg32,
    ) -> Flow {
        match effect {
            Effect::Predation {
                health_gain,
                energy_gain,
                inherit_microplastics,
            } => {
                self.remove(target_ref);
                if health_gain != 0.0 {
                    self.push(Consequence::Health(actor_ref, health_gain));
                }
                if energy_gain != 0.0 {
                    self.push(Consequence::Energy(actor_ref, energy_gain));
                }
                if inherit_microplastics {
                    if let KindState::Animal {
                        microplastics_ingested, ..
                    } = target.state
                    {
                        if microplastics_ingested > 0 {
                            self.push(Consequence::InheritMicroplastics {
                                predator: actor_ref,
                                amount: microplastics_ingested,
                            });
                        }
                    }
                }
                self.plan.counters.predations += 1;
            }
            Effect::Ingestion { multiplier } => {
                self.remove(target_ref);
                self.push(Consequence::Health(actor_ref, -target.toxicity() * multiplier));
                let micro = target.kind == AgentKind::Microplastic;
                self.push(Consequence::Ingest {
                    animal: actor_ref,
                    plastic: u32::from(!micro),
                    microplastic: u32::from(micro),
                });
                self.plan.counters.ingestions += 1;
            }
            Effect::Collection => {
                let (efficiency, capacity, already) = match actor.state {
                    KindState::Collector {
                        efficiency,
                        capacity,
                        collected,
                        ..
                    } => (efficiency, capacity, collected),
                    KindState::Boom { efficiency, .. } => (efficiency, None, 0),
                    _ => return Flow::NextActor,
                };
                let planned = self.collected.get(&actor_ref).copied().unwrap_or(0);
                if capacity.is_some_and(|cap| already + planned >= cap) {
                    return Flow::NextActor;
                }
                // Per-frame probability compounded over the frames in this tick
                let p = 1.0 - (1.0 - efficiency.clamp(0.0, 1.0)).powf(frames);
                if rng.random::<f32>() < p {
                    self.remove(target_ref);
                    if matches!(actor.state, KindState::Collector { .. }) {
                        *self.collected.entry(actor_ref).or_insert(0) += 1;
                        self.push(Consequence::Collected(actor_ref));
                    }
                    match target.kind {
                        AgentKind::OilParticle => self.plan.counters.oil_collected += 1,
                        _ => self.plan.counters.plastic_collected += 1,
                    }
                }
            }
            Effect::Harvest => {
                self.remove(target_ref);
                self.push(Consequence::Caught(actor_ref));
                self.plan.counters.fish_caught += 1;
            }
            Effect::Contamination { impact } => {
                let already = matches!(actor.state, KindState::Animal { contaminated: true, .. });
                if !already && self.contaminated.insert(actor_ref) {
                    self.push(Consequence::Contaminate(actor_ref));
                    self.plan.counters.contaminations += 1;
                    self.plan.counters.environmental_impact += impact;
                }
                return Flow::NextActor;
            }
            Effect::Drain { energy } => {
                self.push(Consequence::Energy(target_ref, -energy * frames));
            }
            Effect::Smother => self.remove(target_ref),
            Effect::Deflect { factor } => {
                self.push(Consequence::ScaleVelocity(target_ref, factor));
            }
            Effect::Disperse { rate } => {
                self.push(Consequence::Weather(target_ref, rate * frames));
            }
        }
        Flow::Continue
    }
}

/// Evaluate every rule against the current populations without mutating them
pub fn plan(
    pops: &Populations,
    rules: &[InteractionRule],
    env: &Environment,
    frames: f32,
    rng: &mut Pcg32,
) -> InteractionPlan {
    let mut planner = Planner::default();

    for rule in rules {
        let actors = pops.agents(rule.actor);
        let targets = pops.agents(rule.target);
        if actors.is_empty() || targets.is_empty() {
            continue;
        }

        for (i, actor) in actors.iter().enumerate() {
            let actor_ref = AgentRef::new(rule.actor, i);
            if actor.is_terminal() || planner.removed.contains(&actor_ref) {
                continue;
            }
            for (j, target) in targets.iter().enumerate() {
                let target_ref = AgentRef::new(rule.target, j);
                if target_ref == actor_ref || target.is_terminal() || planner.removed.contains(&target_ref) {
                    continue;
                }
                if !rule.reach.within(actor, target, env) {
                    continue;
                }
                if let Flow::NextActor = planner.resolve(rule.effect, actor_ref, actor, target_ref, target, frames, rng) {
                    break;
                }
            }
        }
    }

    planner.plan
}

/// Write a plan back into the populations and fold its counters in
pub fn apply(plan: &InteractionPlan, pops: &mut Populations, counters: &mut Counters) {
    for consequence in &plan.consequences {
        match *consequence {
            Consequence::Remove(r) => {
                if let Some(agent) = pops.agent_mut(r) {
                    agent.consume();
                }
            }
            Consequence::Health(r, delta) => {
                if let Some(agent) = pops.agent_mut(r) {
                    agent.add_health(delta);
                }
            }
            Consequence::Energy(r, delta) => {
                if let Some(agent) = pops.agent_mut(r) {
                    agent.add_energy(delta);
                }
            }
            Consequence::ScaleVelocity(r, factor) => {
                if let Some(agent) = pops.agent_mut(r) {
                    agent.vel *= factor;
                }
            }
            Consequence::Weather(r, amount) => {
                if let Some(agent) = pops.agent_mut(r) {
                    if let KindState::Oil {
                        weathering, dispersed, ..
                    } = &mut agent.state
                    {
                        *dispersed += amount;
                        *weathering = (*weathering + amount).min(1.0);
                    }
                }
            }
            Consequence::Contaminate(r) => {
                if let Some(KindState::Animal { contaminated, .. }) = pops.agent_mut(r).map(|a| &mut a.state) {
                    *contaminated = true;
                }
            }
            Consequence::Ingest {
                animal,
                plastic,
                microplastic,
            } => {
                if let Some(KindState::Animal {
                    plastic_ingested,
                    microplastics_ingested,
                    ..
                }) = pops.agent_mut(animal).map(|a| &mut a.state)
                {
                    *plastic_ingested += plastic;
                    *microplastics_ingested += microplastic;
                }
            }
            Consequence::InheritMicroplastics { predator, amount } => {
                if let Some(KindState::Animal {
                    microplastics_ingested, ..
                }) = pops.agent_mut(predator).map(|a| &mut a.state)
                {
                    *microplastics_ingested += amount;
                }
            }
            Consequence::Collected(r) => {
                if let Some(KindState::Collector { collected, .. }) = pops.agent_mut(r).map(|a| &mut a.state) {
                    *collected += 1;
                }
            }
            Consequence::Caught(r) => {
                if let Some(KindState::Ship { fish_caught }) = pops.agent_mut(r).map(|a| &mut a.state) {
                    *fish_caught += 1;
                }
            }
        }
    }
    counters.merge(&plan.counters);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Settings;
    use crate::consts::MAX_HEALTH;
    use glam::Vec2;
    use proptest::prelude::*;
    use rand::SeedableRng;

    const COLLECT: InteractionRule =
        InteractionRule::new(AgentKind::Skimmer, AgentKind::PlasticParticle, Reach::Touch, Effect::Collection);
    const SHARK_EATS_FISH: InteractionRule = InteractionRule::new(
        AgentKind::Shark,
        AgentKind::Fish,
        Reach::Touch,
        Effect::Predation {
            health_gain: 10.0,
            energy_gain: 0.0,
            inherit_microplastics: true,
        },
    );
    const INGEST: InteractionRule =
        InteractionRule::new(AgentKind::Fish, AgentKind::PlasticParticle, Reach::Touch, Effect::Ingestion { multiplier: 5.0 });

    fn pops(kinds: &[AgentKind]) -> Populations {
        Populations::new(kinds, &Settings::default())
    }

    fn skimmer(id: u32, pos: Vec2, efficiency: f32) -> Agent {
        Agent::new(id, AgentKind::Skimmer, pos).with_state(KindState::Collector {
            efficiency,
            detection_radius: 200.0,
            capacity: None,
            collected: 0,
        })
    }

    #[test]
    fn test_full_efficiency_skimmer_always_collects() {
        let mut pops = pops(&[AgentKind::Skimmer, AgentKind::PlasticParticle]);
        pops.push(skimmer(1, Vec2::new(100.0, 100.0), 1.0));
        pops.push(Agent::new(2, AgentKind::PlasticParticle, Vec2::new(100.0, 100.0)));

        let env = Environment::default();
        let mut rng = Pcg32::seed_from_u64(9);
        let plan = plan(&pops, &[COLLECT], &env, 1.0, &mut rng);
        assert_eq!(plan.removed().collect::<Vec<_>>(), vec![AgentRef::new(AgentKind::PlasticParticle, 0)]);
        assert_eq!(plan.counters.plastic_collected, 1);
    }

    #[test]
    fn test_no_double_consumption() {
        // Two sharks overlapping one fish: only the first eats it
        let mut pops = pops(&[AgentKind::Shark, AgentKind::Fish]);
        pops.push(Agent::new(1, AgentKind::Shark, Vec2::new(100.0, 100.0)));
        pops.push(Agent::new(2, AgentKind::Shark, Vec2::new(105.0, 100.0)));
        pops.push(Agent::new(3, AgentKind::Fish, Vec2::new(102.0, 100.0)));

        let env = Environment::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let plan = plan(&pops, &[SHARK_EATS_FISH], &env, 1.0, &mut rng);
        assert_eq!(plan.removed().count(), 1);
        assert_eq!(plan.counters.predations, 1);
        assert!(plan.consequences.contains(&Consequence::Health(AgentRef::new(AgentKind::Shark, 0), 10.0)));
    }

    #[test]
    fn test_ingestion_damages_by_toxicity() {
        let mut pops = pops(&[AgentKind::Fish, AgentKind::PlasticParticle]);
        pops.push(Agent::new(1, AgentKind::Fish, Vec2::new(50.0, 50.0)));
        // Default material is PET (toxicity 2)
        pops.push(Agent::new(2, AgentKind::PlasticParticle, Vec2::new(55.0, 50.0)));

        let env = Environment::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let plan = plan(&pops, &[INGEST], &env, 1.0, &mut rng);
        let mut counters = Counters::default();
        apply(&plan, &mut pops, &mut counters);

        let fish = &pops.agents(AgentKind::Fish)[0];
        assert_eq!(fish.health, MAX_HEALTH - 10.0);
        assert!(matches!(fish.state, KindState::Animal { plastic_ingested: 1, .. }));
        assert!(pops.agents(AgentKind::PlasticParticle)[0].is_terminal());
        assert_eq!(counters.ingestions, 1);
    }

    #[test]
    fn test_capacity_limits_collection() {
        let mut pops = pops(&[AgentKind::Skimmer, AgentKind::PlasticParticle]);
        pops.push(
            Agent::new(1, AgentKind::Skimmer, Vec2::new(100.0, 100.0)).with_state(KindState::Collector {
                efficiency: 1.0,
                detection_radius: 200.0,
                capacity: Some(2),
                collected: 1,
            }),
        );
        for id in 2..6 {
            pops.push(Agent::new(id, AgentKind::PlasticParticle, Vec2::new(100.0, 100.0)));
        }

        let env = Environment::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let plan = plan(&pops, &[COLLECT], &env, 1.0, &mut rng);
        assert_eq!(plan.removed().count(), 1);
    }

    #[test]
    fn test_contamination_counts_once() {
        let rule = InteractionRule::new(
            AgentKind::Seabird,
            AgentKind::OilParticle,
            Reach::Fixed(10.0),
            Effect::Contamination { impact: 10.0 },
        );
        let mut pops = pops(&[AgentKind::Seabird, AgentKind::OilParticle]);
        pops.push(Agent::new(1, AgentKind::Seabird, Vec2::new(10.0, 10.0)));
        for id in 2..5 {
            pops.push(Agent::new(id, AgentKind::OilParticle, Vec2::new(12.0, 10.0)));
        }

        let env = Environment::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut counters = Counters::default();
        let first = plan(&pops, &[rule], &env, 1.0, &mut rng);
        apply(&first, &mut pops, &mut counters);
        let second = plan(&pops, &[rule], &env, 1.0, &mut rng);
        apply(&second, &mut pops, &mut counters);

        assert_eq!(counters.contaminations, 1);
        assert_eq!(counters.environmental_impact, 10.0);
    }

    #[test]
    fn test_boom_measures_to_segment() {
        let rule = InteractionRule::new(AgentKind::Boom, AgentKind::PlasticParticle, Reach::Touch, Effect::Collection);
        let mut pops = pops(&[AgentKind::Boom, AgentKind::PlasticParticle]);
        pops.push(
            Agent::new(1, AgentKind::Boom, Vec2::new(400.0, 0.0))
                .with_size(5.0)
                .with_state(KindState::Boom {
                    end: Vec2::new(400.0, 600.0),
                    efficiency: 1.0,
                }),
        );
        // Far from the boom's anchor but right next to its line
        pops.push(Agent::new(2, AgentKind::PlasticParticle, Vec2::new(402.0, 500.0)));

        let env = Environment::default();
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(plan(&pops, &[rule], &env, 1.0, &mut rng).removed().count(), 1);
    }

    proptest! {
        #[test]
        fn prop_plan_is_idempotent(
            seed in any::<u64>(),
            positions in prop::collection::vec((0.0f32..200.0, 0.0f32..200.0), 1..30),
            efficiency in 0.0f32..=1.0,
        ) {
            let mut pops = pops(&[AgentKind::Skimmer, AgentKind::PlasticParticle]);
            pops.push(skimmer(0, Vec2::new(100.0, 100.0), efficiency));
            for (i, (x, y)) in positions.iter().enumerate() {
                pops.push(Agent::new(i as u32 + 1, AgentKind::PlasticParticle, Vec2::new(*x, *y)));
            }
            let env = Environment::default();

            let rng = Pcg32::seed_from_u64(seed);
            let first = plan(&pops, &[COLLECT], &env, 1.0, &mut rng.clone());
            let second = plan(&pops, &[COLLECT], &env, 1.0, &mut rng.clone());
            prop_assert_eq!(first, second);
        }
    }
}
