//! Agent kinds, the per-kind rule table and per-tick agent updates
//!
//! An agent only ever reads its own state and the tick's environment
//! snapshot. Anything that needs another agent (steering toward a target,
//! eating, collecting) happens in the seek pass or the interaction resolver.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{reflect_velocity, segment_distance};
use super::env::{Conditions, Environment, OilGrade};
use crate::consts::{MAX_ENERGY, MAX_HEALTH, START_ENERGY};
use crate::{Arena, direction, heading_vector, normalize_angle};

/// Broad family of an agent kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KindClass {
    Organism,
    Pollutant,
    Apparatus,
    /// Scenery that never interacts (bubbles, buoyancy probes)
    Inert,
}

/// What happens when an agent reaches the arena edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryPolicy {
    /// Re-enter from the opposite edge
    Wrap,
    /// Bounce off the edge
    Reflect,
    /// Stop at the edge
    Clamp,
    /// Never moves
    Stationary,
}

/// Health loss when pH drops or temperature rises past a critical value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StressRule {
    pub critical_ph: f32,
    pub ph_rate: f32,
    pub critical_temp: f32,
    pub temp_rate: f32,
}

impl StressRule {
    /// Health lost per reference frame under the given conditions
    pub fn damage(&self, cond: &Conditions) -> f32 {
        let mut damage = 0.0;
        if cond.ph < self.critical_ph {
            damage += (self.critical_ph - cond.ph) * self.ph_rate;
        }
        if cond.temperature > self.critical_temp {
            damage += (cond.temperature - self.critical_temp) * self.temp_rate;
        }
        damage
    }
}

/// Per-kind constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindRules {
    pub class: KindClass,
    /// Cruise speed in pixels per reference frame
    pub base_speed: f32,
    /// Default radius in pixels
    pub size: f32,
    pub max_health: f32,
    pub boundary: BoundaryPolicy,
    /// Lifetime in reference frames
    pub lifespan: Option<f32>,
    pub stress: Option<StressRule>,
}

impl KindRules {
    const fn new(class: KindClass, base_speed: f32, size: f32, boundary: BoundaryPolicy) -> Self {
        Self {
            class,
            base_speed,
            size,
            max_health: MAX_HEALTH,
            boundary,
            lifespan: None,
            stress: None,
        }
    }

    const fn with_lifespan(mut self, frames: f32) -> Self {
        self.lifespan = Some(frames);
        self
    }

    const fn with_stress(mut self, critical_ph: f32, ph_rate: f32, critical_temp: f32, temp_rate: f32) -> Self {
        self.stress = Some(StressRule {
            critical_ph,
            ph_rate,
            critical_temp,
            temp_rate,
        });
        self
    }
}

/// Closed set of agent kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    // Organisms
    Shellfish,
    Coral,
    Phytoplankton,
    Fish,
    Turtle,
    Shark,
    Whale,
    Seabird,
    PreyFish,
    PredatorFish,
    Plankton,
    // Pollutants
    PlasticParticle,
    Microplastic,
    OilParticle,
    OilSlick,
    Debris,
    // Apparatus
    Skimmer,
    Boom,
    Drone,
    Ship,
    Dispersant,
    // Scenery
    Bubble,
    FloatingObject,
}

impl AgentKind {
    pub const ALL: [AgentKind; 23] = [
        AgentKind::Shellfish,
        AgentKind::Coral,
        AgentKind::Phytoplankton,
        AgentKind::Fish,
        AgentKind::Turtle,
        AgentKind::Shark,
        AgentKind::Whale,
        AgentKind::Seabird,
        AgentKind::PreyFish,
        AgentKind::PredatorFish,
        AgentKind::Plankton,
        AgentKind::PlasticParticle,
        AgentKind::Microplastic,
        AgentKind::OilParticle,
        AgentKind::OilSlick,
        AgentKind::Debris,
        AgentKind::Skimmer,
        AgentKind::Boom,
        AgentKind::Drone,
        AgentKind::Ship,
        AgentKind::Dispersant,
        AgentKind::Bubble,
        AgentKind::FloatingObject,
    ];

    pub fn rules(&self) -> KindRules {
        use BoundaryPolicy::*;
        use KindClass::*;
        match self {
            AgentKind::Shellfish => KindRules::new(Organism, 0.0, 20.0, Stationary).with_stress(7.8, 0.2, 20.0, 0.1),
            AgentKind::Coral => KindRules::new(Organism, 0.0, 20.0, Stationary).with_stress(8.0, 0.3, 28.0, 0.2),
            AgentKind::Phytoplankton => {
                KindRules::new(Organism, 0.0, 5.0, Stationary).with_stress(7.6, 0.1, 25.0, 0.05)
            }
            AgentKind::Fish => KindRules::new(Organism, 2.0, 15.0, Reflect),
            AgentKind::Turtle => KindRules::new(Organism, 1.0, 30.0, Reflect),
            AgentKind::Shark => KindRules::new(Organism, 1.5, 45.0, Reflect),
            AgentKind::Whale => KindRules::new(Organism, 0.5, 40.0, Wrap),
            AgentKind::Seabird => KindRules::new(Organism, 2.0, 5.0, Wrap),
            AgentKind::PreyFish => KindRules::new(Organism, 2.0, 10.0, Reflect),
            AgentKind::PredatorFish => KindRules::new(Organism, 2.0, 10.0, Reflect),
            AgentKind::Plankton => KindRules::new(Organism, 0.1, 2.5, Wrap),
            AgentKind::PlasticParticle => KindRules::new(Pollutant, 0.35, 4.5, Wrap),
            AgentKind::Microplastic => KindRules::new(Pollutant, 0.15, 1.0, Wrap),
            AgentKind::OilParticle => KindRules::new(Pollutant, 0.0, 2.0, Reflect),
            AgentKind::OilSlick => KindRules::new(Pollutant, 0.0, 0.0, Clamp),
            AgentKind::Debris => KindRules::new(Pollutant, 0.0, 4.5, Wrap),
            AgentKind::Skimmer => KindRules::new(Apparatus, 1.0, 40.0, Reflect),
            AgentKind::Boom => KindRules::new(Apparatus, 0.0, 50.0, Stationary),
            AgentKind::Drone => KindRules::new(Apparatus, 2.0, 20.0, Reflect),
            AgentKind::Ship => KindRules::new(Apparatus, 0.5, 30.0, Reflect),
            AgentKind::Dispersant => KindRules::new(Apparatus, 0.0, 50.0, Clamp).with_lifespan(300.0),
            AgentKind::Bubble => KindRules::new(Inert, 2.0, 4.5, Wrap),
            AgentKind::FloatingObject => KindRules::new(Inert, 0.0, 20.0, Clamp),
        }
    }

    #[inline]
    pub fn class(&self) -> KindClass {
        self.rules().class
    }

    /// Whether this kind runs on energy instead of health
    #[inline]
    pub fn uses_energy(&self) -> bool {
        matches!(self, AgentKind::PreyFish | AgentKind::PredatorFish)
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgentKind::Shellfish => "Shellfish",
            AgentKind::Coral => "Coral",
            AgentKind::Phytoplankton => "Phytoplankton",
            AgentKind::Fish => "Fish",
            AgentKind::Turtle => "Turtle",
            AgentKind::Shark => "Shark",
            AgentKind::Whale => "Whale",
            AgentKind::Seabird => "Seabird",
            AgentKind::PreyFish => "Prey Fish",
            AgentKind::PredatorFish => "Predator Fish",
            AgentKind::Plankton => "Plankton",
            AgentKind::PlasticParticle => "Plastic Particles",
            AgentKind::Microplastic => "Microplastics",
            AgentKind::OilParticle => "Oil Particles",
            AgentKind::OilSlick => "Oil Spills",
            AgentKind::Debris => "Debris",
            AgentKind::Skimmer => "Skimmers",
            AgentKind::Boom => "Booms",
            AgentKind::Drone => "Drones",
            AgentKind::Ship => "Ships",
            AgentKind::Dispersant => "Dispersants",
            AgentKind::Bubble => "Bubbles",
            AgentKind::FloatingObject => "Objects",
        }
    }
}

/// Polymer family of a plastic particle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlasticMaterial {
    #[default]
    Pet,
    Hdpe,
    Pvc,
    Ldpe,
    Pp,
}

impl PlasticMaterial {
    pub const ALL: [PlasticMaterial; 5] = [
        PlasticMaterial::Pet,
        PlasticMaterial::Hdpe,
        PlasticMaterial::Pvc,
        PlasticMaterial::Ldpe,
        PlasticMaterial::Pp,
    ];

    pub fn breakdown_rate(&self) -> f32 {
        match self {
            PlasticMaterial::Pet => 0.001,
            PlasticMaterial::Hdpe => 0.0005,
            PlasticMaterial::Pvc => 0.002,
            PlasticMaterial::Ldpe => 0.0008,
            PlasticMaterial::Pp => 0.0006,
        }
    }

    pub fn toxicity(&self) -> f32 {
        match self {
            PlasticMaterial::Pet => 2.0,
            PlasticMaterial::Hdpe => 1.0,
            PlasticMaterial::Pvc => 3.0,
            PlasticMaterial::Ldpe => 1.0,
            PlasticMaterial::Pp => 2.0,
        }
    }

    /// Reference frames before a particle breaks into microplastics
    pub fn lifespan(&self) -> f32 {
        1000.0 / self.breakdown_rate()
    }
}

/// Kind-specific mutable state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum KindState {
    Plain,
    Plastic {
        material: PlasticMaterial,
    },
    Animal {
        plastic_ingested: u32,
        microplastics_ingested: u32,
        contaminated: bool,
    },
    Oil {
        grade: OilGrade,
        weathering: f32,
        /// Extra weathering applied by dispersants
        dispersed: f32,
    },
    Collector {
        /// Removal probability per contact
        efficiency: f32,
        /// How far away a target is noticed
        detection_radius: f32,
        capacity: Option<u32>,
        collected: u32,
    },
    Boom {
        /// Far end of the boom segment (`pos` is the near end)
        end: Vec2,
        efficiency: f32,
    },
    Ship {
        fish_caught: u32,
    },
    Slick {
        max_radius: f32,
        growth: f32,
    },
    Buoyant {
        /// kg/m³
        density: f32,
    },
}

impl KindState {
    /// Default state for a freshly constructed agent of `kind`
    pub fn default_for(kind: AgentKind) -> Self {
        match kind {
            AgentKind::Fish | AgentKind::Turtle | AgentKind::Shark | AgentKind::Whale | AgentKind::Seabird => {
                KindState::Animal {
                    plastic_ingested: 0,
                    microplastics_ingested: 0,
                    contaminated: false,
                }
            }
            AgentKind::PlasticParticle | AgentKind::Microplastic => KindState::Plastic {
                material: PlasticMaterial::default(),
            },
            AgentKind::OilParticle => KindState::Oil {
                grade: OilGrade::default(),
                weathering: 0.0,
                dispersed: 0.0,
            },
            AgentKind::Skimmer => KindState::Collector {
                efficiency: 0.7,
                detection_radius: 200.0,
                capacity: None,
                collected: 0,
            },
            AgentKind::Drone => KindState::Collector {
                efficiency: 0.5,
                detection_radius: 150.0,
                capacity: None,
                collected: 0,
            },
            AgentKind::Boom => KindState::Boom {
                end: Vec2::ZERO,
                efficiency: 0.9,
            },
            AgentKind::Ship => KindState::Ship { fish_caught: 0 },
            AgentKind::OilSlick => KindState::Slick {
                max_radius: 100.0,
                growth: 0.5,
            },
            AgentKind::FloatingObject => KindState::Buoyant { density: 1000.0 },
            _ => KindState::Plain,
        }
    }
}

/// Inputs shared by every agent update in one tick
#[derive(Debug, Clone, Copy)]
pub struct UpdateContext<'a> {
    pub env: &'a Environment,
    pub conditions: Conditions,
    pub arena: Arena,
    /// Reference frames represented by this tick (already includes time scale)
    pub frames: f32,
}

/// Probability `p` per reference frame, scaled to `frames`
#[inline]
pub(crate) fn chance(rng: &mut Pcg32, p: f32, frames: f32) -> bool {
    let p = (p * frames).min(1.0);
    p > 0.0 && rng.random::<f32>() < p
}

/// Number of events at rate `p` per reference frame over `frames`:
/// the whole part of `p·frames` always happens, the fraction is one more trial
pub(crate) fn spawn_count(rng: &mut Pcg32, p: f32, frames: f32) -> u32 {
    let expected = p * frames;
    if !(expected > 0.0) || !expected.is_finite() {
        return 0;
    }
    let whole = expected.floor();
    let extra = rng.random::<f32>() < expected - whole;
    whole as u32 + u32::from(extra)
}

/// Symmetric random value in `[-amplitude/2, amplitude/2)`
#[inline]
fn jitter(rng: &mut Pcg32, amplitude: f32) -> f32 {
    (rng.random::<f32>() - 0.5) * amplitude
}

/// One simulated entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: u32,
    pub kind: AgentKind,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Swim/cruise direction in radians
    pub heading: f32,
    /// Current cruise speed (pixels per reference frame)
    pub speed: f32,
    pub size: f32,
    pub health: f32,
    pub energy: f32,
    /// Age in reference frames
    pub age: f32,
    pub lifespan: Option<f32>,
    pub state: KindState,
    /// Steering target picked by the seek pass (apparatus only)
    #[serde(skip)]
    pub target: Option<Vec2>,
    #[serde(skip)]
    consumed: bool,
}

impl Agent {
    /// Agent with the kind's default constants and no randomness
    pub fn new(id: u32, kind: AgentKind, pos: Vec2) -> Self {
        let rules = kind.rules();
        let state = KindState::default_for(kind);
        let lifespan = match state {
            KindState::Plastic { material } if kind == AgentKind::PlasticParticle => Some(material.lifespan()),
            _ => rules.lifespan,
        };
        Self {
            id,
            kind,
            pos,
            vel: Vec2::ZERO,
            heading: 0.0,
            speed: rules.base_speed,
            size: rules.size,
            health: rules.max_health,
            energy: START_ENERGY,
            age: 0.0,
            lifespan,
            state,
            target: None,
            consumed: false,
        }
    }

    /// Agent with the randomised size, speed, heading and traits a fresh spawn gets
    pub fn spawn(id: u32, kind: AgentKind, pos: Vec2, rng: &mut Pcg32) -> Self {
        let mut agent = Self::new(id, kind, pos);
        agent.heading = rng.random_range(0.0..TAU);
        match kind {
            AgentKind::PreyFish | AgentKind::PredatorFish => {
                agent.size = rng.random_range(5.0..15.0);
                agent.speed = rng.random_range(1.0..3.0);
            }
            AgentKind::Seabird => agent.speed = rng.random_range(1.0..3.0),
            AgentKind::Plankton => agent.size = rng.random_range(1.0..4.0),
            AgentKind::PlasticParticle => {
                let material = PlasticMaterial::ALL[rng.random_range(0..PlasticMaterial::ALL.len())];
                agent.size = rng.random_range(2.0..7.0);
                agent.speed = rng.random_range(0.1..0.6);
                agent.state = KindState::Plastic { material };
                agent.lifespan = Some(material.lifespan());
            }
            AgentKind::Microplastic => agent.speed = rng.random_range(0.05..0.25),
            AgentKind::OilParticle => {
                agent.vel = Vec2::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0));
            }
            AgentKind::Debris | AgentKind::Bubble => {
                agent.size = rng.random_range(2.0..7.0);
                if kind == AgentKind::Bubble {
                    agent.speed = rng.random_range(1.0..3.0);
                }
            }
            _ => {}
        }
        agent
    }

    /// Microplastic fragment inheriting its parent's material
    pub fn fragment(id: u32, parent: &Agent, rng: &mut Pcg32) -> Self {
        let mut agent = Self::spawn(id, AgentKind::Microplastic, parent.pos, rng);
        if let KindState::Plastic { material } = parent.state {
            agent.state = KindState::Plastic { material };
        }
        agent
    }

    pub fn with_state(mut self, state: KindState) -> Self {
        self.state = state;
        self
    }

    pub fn with_lifespan(mut self, frames: f32) -> Self {
        self.lifespan = Some(frames);
        self
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn with_heading(mut self, heading: f32) -> Self {
        self.heading = heading;
        self
    }

    /// Oil particle of a given grade (heavier oil forms bigger droplets)
    pub fn oil(id: u32, pos: Vec2, grade: OilGrade, rng: &mut Pcg32) -> Self {
        let mut agent = Self::spawn(id, AgentKind::OilParticle, pos, rng);
        agent.size = match grade {
            OilGrade::Light => rng.random_range(1.0..3.0),
            OilGrade::Heavy => rng.random_range(2.0..6.0),
        };
        agent.state = KindState::Oil {
            grade,
            weathering: 0.0,
            dispersed: 0.0,
        };
        agent
    }

    #[inline]
    pub fn rules(&self) -> KindRules {
        self.kind.rules()
    }

    /// Collision radius
    #[inline]
    pub fn radius(&self) -> f32 {
        self.size
    }

    /// Distance from this agent's body to a point (booms measure to their segment)
    pub fn distance_to_point(&self, point: Vec2) -> f32 {
        match self.state {
            KindState::Boom { end, .. } => segment_distance(point, self.pos, end),
            _ => self.pos.distance(point),
        }
    }

    /// Distance between two agents' bodies
    pub fn distance_to(&self, other: &Agent) -> f32 {
        if matches!(other.state, KindState::Boom { .. }) {
            other.distance_to_point(self.pos)
        } else {
            self.distance_to_point(other.pos)
        }
    }

    /// Toxicity carried by a plastic agent
    pub fn toxicity(&self) -> f32 {
        match self.state {
            KindState::Plastic { material } => material.toxicity(),
            _ => 0.0,
        }
    }

    /// Health (or energy) as a fraction of its ceiling, for drawing
    pub fn health_fraction(&self) -> f32 {
        let fraction = match (self.kind.class(), self.state) {
            (KindClass::Organism, _) if self.kind.uses_energy() => self.energy / MAX_ENERGY,
            (KindClass::Organism, _) => self.health / self.rules().max_health,
            (_, KindState::Oil { weathering, .. }) => 1.0 - weathering,
            (_, KindState::Collector { capacity: Some(cap), collected, .. }) if cap > 0 => {
                1.0 - collected as f32 / cap as f32
            }
            _ => match self.lifespan {
                Some(l) if l > 0.0 => 1.0 - self.age / l,
                _ => 1.0,
            },
        };
        fraction.clamp(0.0, 1.0)
    }

    #[inline]
    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    /// Mark as eaten/collected; removed at the end of the tick
    pub fn consume(&mut self) {
        self.consumed = true;
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.lifespan.is_some_and(|l| self.age >= l)
    }

    /// Whether this agent must be removed at the end of the tick
    pub fn is_terminal(&self) -> bool {
        if self.consumed || self.is_expired() {
            return true;
        }
        if self.kind.class() == KindClass::Organism {
            if self.kind.uses_energy() {
                return self.energy <= 0.0;
            }
            return self.health <= 0.0;
        }
        matches!(self.state, KindState::Oil { weathering, .. } if weathering >= 1.0)
    }

    /// Split products released when this agent is removed
    pub fn split_products(&self) -> Option<(AgentKind, usize)> {
        if self.kind == AgentKind::PlasticParticle && self.is_expired() && !self.consumed {
            Some((AgentKind::Microplastic, crate::consts::MICROPLASTICS_PER_SPLIT))
        } else {
            None
        }
    }

    pub fn add_health(&mut self, delta: f32) {
        self.health = (self.health + delta).clamp(0.0, self.rules().max_health);
    }

    pub fn add_energy(&mut self, delta: f32) {
        self.energy = (self.energy + delta).clamp(0.0, MAX_ENERGY);
    }

    /// Advance this agent by one tick
    pub fn update(&mut self, ctx: &UpdateContext, rng: &mut Pcg32) {
        let k = ctx.frames;
        self.age += k;

        match self.kind.class() {
            KindClass::Organism => self.update_organism(ctx, rng),
            KindClass::Pollutant => self.update_pollutant(ctx, rng),
            KindClass::Apparatus => self.update_apparatus(ctx, rng),
            KindClass::Inert => self.update_inert(ctx),
        }

        self.apply_boundary(ctx.arena);
        self.health = self.health.clamp(0.0, self.rules().max_health);
        self.energy = self.energy.clamp(0.0, MAX_ENERGY);
    }

    fn update_organism(&mut self, ctx: &UpdateContext, rng: &mut Pcg32) {
        let k = ctx.frames;
        let rules = self.rules();

        if let Some(stress) = rules.stress {
            self.health -= stress.damage(&ctx.conditions) * k;
        }

        match self.kind {
            AgentKind::Fish | AgentKind::Turtle | AgentKind::Shark => {
                // Sick animals slow down
                self.speed = rules.base_speed * (self.health / rules.max_health).max(0.0);
            }
            AgentKind::Seabird => {
                if chance(rng, 0.02, k) {
                    self.heading += jitter(rng, PI / 2.0);
                }
            }
            AgentKind::PreyFish | AgentKind::PredatorFish => {
                self.heading += jitter(rng, 0.2) * k.min(1.0);
                let temp_stress = (ctx.conditions.temperature - 15.0).abs() / 15.0;
                let drain = 0.1 + 0.1 * ctx.env.pollution_level / 100.0 + 0.1 * temp_stress;
                self.energy -= drain * k;
            }
            AgentKind::Plankton => {
                self.heading += jitter(rng, 0.2) * k.min(1.0);
                self.pos.y += jitter(rng, 1.0) * k;
            }
            AgentKind::Whale => {
                // Rides the current instead of swimming
                let drift = current_speed(ctx.env, ctx.conditions.temperature) * rules.base_speed;
                self.vel = heading_vector(ctx.env.current_direction) * drift;
                self.pos += self.vel * k;
                return;
            }
            _ => {}
        }

        self.heading = normalize_angle(self.heading);
        self.vel = direction(self.heading) * self.speed;
        self.pos += self.vel * k;
    }

    fn update_pollutant(&mut self, ctx: &UpdateContext, rng: &mut Pcg32) {
        let k = ctx.frames;
        let env = ctx.env;

        match self.kind {
            AgentKind::PlasticParticle | AgentKind::Microplastic => {
                // Wind pushes sideways, current pushes down; fragments respond half as much
                let response = if self.kind == AgentKind::Microplastic { 20.0 } else { 10.0 };
                self.vel = Vec2::new(
                    env.wind_speed / response,
                    self.speed + env.current_strength / response,
                );
                self.pos += self.vel * k;
            }
            AgentKind::OilParticle => {
                let KindState::Oil { grade, dispersed, .. } = self.state else {
                    return;
                };
                let wind = heading_vector(env.wind_direction) * env.wind_speed / 10.0;
                let current = heading_vector(env.current_direction) * env.current_strength / 10.0;
                self.vel += (wind + current) * 0.01 * k;
                let kick = grade.drift_jitter() * k.min(1.0);
                self.vel += Vec2::new(jitter(rng, kick), jitter(rng, kick));
                self.pos += self.vel * k;
                self.vel *= 0.99f32.powf(k);
                let weathering = (self.age / grade.weathering_frames() + dispersed).min(1.0);
                self.state = KindState::Oil {
                    grade,
                    weathering,
                    dispersed,
                };
            }
            AgentKind::OilSlick => {
                if let KindState::Slick { max_radius, growth } = self.state {
                    self.size = (self.size + growth * k).min(max_radius);
                }
            }
            AgentKind::Debris => {
                let drift = heading_vector(env.current_direction) * current_speed(env, ctx.conditions.temperature) * 2.0;
                let wind = Vec2::new(env.wind_speed * 0.1, env.wind_speed * 0.05);
                self.vel = drift + wind;
                self.pos += self.vel * k;
            }
            _ => {}
        }
    }

    fn update_apparatus(&mut self, ctx: &UpdateContext, rng: &mut Pcg32) {
        let k = ctx.frames;
        match self.kind {
            AgentKind::Skimmer | AgentKind::Drone => {
                let step = self.speed * k;
                match self.target {
                    Some(target) => {
                        let to_target = target - self.pos;
                        if to_target.length() <= step {
                            self.pos = target;
                            self.vel = Vec2::ZERO;
                        } else {
                            // Zero-length direction means no movement
                            self.vel = to_target.normalize_or_zero() * self.speed;
                            self.pos += self.vel * k;
                        }
                    }
                    None => {
                        self.vel = direction(self.heading) * self.speed;
                        self.pos += self.vel * k;
                    }
                }
                // Spill skimmers get pushed around by the swell
                if matches!(self.state, KindState::Collector { capacity: Some(_), .. }) {
                    self.pos += Vec2::new(jitter(rng, 2.0), jitter(rng, 2.0)) * k;
                }
            }
            AgentKind::Ship => {
                self.heading = normalize_angle(self.heading + jitter(rng, 0.1) * k.min(1.0));
                self.vel = direction(self.heading) * self.speed;
                self.pos += self.vel * k;
            }
            AgentKind::Dispersant => {
                self.pos += Vec2::new(jitter(rng, 2.0), jitter(rng, 2.0)) * k;
            }
            _ => {}
        }
    }

    fn update_inert(&mut self, ctx: &UpdateContext) {
        let k = ctx.frames;
        match self.kind {
            AgentKind::Bubble => {
                self.vel = Vec2::new(0.0, -self.speed);
                self.pos += self.vel * k;
                if self.pos.y + self.size < 0.0 {
                    self.pos.y = ctx.arena.height + self.size;
                }
            }
            AgentKind::FloatingObject => {
                let KindState::Buoyant { density } = self.state else {
                    return;
                };
                let volume = 4.0 / 3.0 * PI * self.size.powi(3);
                let rise = -self.vel.y;
                let buoyancy = (ctx.conditions.water_density - density) * 9.81 * volume;
                let drag = -0.5 * rise * rise.abs();
                let rise = rise + (buoyancy + drag) / (volume * density.max(1.0)) * k;
                self.vel.y = -rise;
                self.pos.y += self.vel.y * k;
                let (top, bottom) = (self.size, ctx.arena.height - self.size);
                if self.pos.y < top || self.pos.y > bottom {
                    self.pos.y = self.pos.y.clamp(top, bottom.max(top));
                    self.vel.y = 0.0;
                }
            }
            _ => {}
        }
    }

    fn apply_boundary(&mut self, arena: Arena) {
        match self.rules().boundary {
            BoundaryPolicy::Stationary => {}
            BoundaryPolicy::Clamp => self.pos = arena.clamp(self.pos),
            BoundaryPolicy::Wrap => {
                // Bubbles handle their own vertical re-entry
                if self.kind != AgentKind::Bubble {
                    self.pos.y = self.pos.y.rem_euclid(arena.height);
                }
                self.pos.x = self.pos.x.rem_euclid(arena.width);
            }
            BoundaryPolicy::Reflect => {
                let mut bounced = false;
                if self.pos.x < 0.0 || self.pos.x > arena.width {
                    let normal = if self.pos.x < 0.0 { Vec2::X } else { Vec2::NEG_X };
                    if self.vel.dot(normal) < 0.0 {
                        self.vel = reflect_velocity(self.vel, normal);
                    }
                    bounced = true;
                }
                if self.pos.y < 0.0 || self.pos.y > arena.height {
                    let normal = if self.pos.y < 0.0 { Vec2::Y } else { Vec2::NEG_Y };
                    if self.vel.dot(normal) < 0.0 {
                        self.vel = reflect_velocity(self.vel, normal);
                    }
                    bounced = true;
                }
                if bounced {
                    self.pos = arena.clamp(self.pos);
                    if self.vel.length_squared() > 0.0 {
                        self.heading = self.vel.y.atan2(self.vel.x);
                    } else {
                        self.heading = normalize_angle(self.heading + PI);
                    }
                }
            }
        }
    }
}

/// Current speed index from temperature, salinity and wind
pub fn current_speed(env: &Environment, temperature: f32) -> f32 {
    (temperature - 15.0) / 15.0 + (env.salinity - 35.0) / 5.0 + env.wind_speed / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FRAME_DT;
    use rand::SeedableRng;

    fn ctx(env: &Environment) -> UpdateContext<'_> {
        UpdateContext {
            env,
            conditions: env.conditions(true),
            arena: Arena::default(),
            frames: 1.0,
        }
    }

    #[test]
    fn test_frame_scale_is_exact_at_reference_rate() {
        assert_eq!(FRAME_DT * crate::consts::REFERENCE_FPS, 1.0);
    }

    #[test]
    fn test_every_kind_has_rules() {
        for kind in AgentKind::ALL {
            let rules = kind.rules();
            assert!(rules.max_health > 0.0, "{kind:?}");
            assert!(rules.base_speed >= 0.0, "{kind:?}");
        }
    }

    #[test]
    fn test_shellfish_stress_under_high_co2() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut env = Environment::default();
        env.co2_ppm = 1000.0;
        let mut shellfish = Agent::new(1, AgentKind::Shellfish, Vec2::new(100.0, 400.0));
        shellfish.update(&ctx(&env), &mut rng);
        assert!(shellfish.health < MAX_HEALTH);
        // Sessile
        assert_eq!(shellfish.pos, Vec2::new(100.0, 400.0));
    }

    #[test]
    fn test_health_never_negative() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut env = Environment::default();
        env.co2_ppm = 1000.0;
        let mut coral = Agent::new(1, AgentKind::Coral, Vec2::new(10.0, 10.0));
        coral.health = 0.01;
        coral.update(&ctx(&env), &mut rng);
        assert_eq!(coral.health, 0.0);
        assert!(coral.is_terminal());
    }

    #[test]
    fn test_plastic_wraps_at_edges() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut env = Environment::default();
        env.wind_speed = 50.0;
        let mut plastic = Agent::new(1, AgentKind::PlasticParticle, Vec2::new(798.0, 10.0));
        plastic.update(&ctx(&env), &mut rng);
        assert!(plastic.pos.x < 10.0, "wrapped to {}", plastic.pos.x);
    }

    #[test]
    fn test_fish_reflects_at_edges() {
        let mut rng = Pcg32::seed_from_u64(1);
        let env = Environment::default();
        let mut fish = Agent::new(1, AgentKind::Fish, Vec2::new(799.5, 300.0)).with_heading(0.0);
        fish.update(&ctx(&env), &mut rng);
        assert!(fish.pos.x <= 800.0);
        assert!(fish.vel.x < 0.0);
    }

    #[test]
    fn test_skimmer_on_target_does_not_move() {
        let mut rng = Pcg32::seed_from_u64(1);
        let env = Environment::default();
        let mut skimmer = Agent::new(1, AgentKind::Skimmer, Vec2::new(200.0, 200.0));
        skimmer.target = Some(skimmer.pos);
        skimmer.update(&ctx(&env), &mut rng);
        assert_eq!(skimmer.pos, Vec2::new(200.0, 200.0));
        assert!(skimmer.pos.is_finite());
    }

    #[test]
    fn test_skimmer_moves_toward_target() {
        let mut rng = Pcg32::seed_from_u64(1);
        let env = Environment::default();
        let mut skimmer = Agent::new(1, AgentKind::Skimmer, Vec2::new(200.0, 200.0));
        skimmer.target = Some(Vec2::new(300.0, 200.0));
        skimmer.update(&ctx(&env), &mut rng);
        assert!((skimmer.pos.x - 201.0).abs() < 1e-4);
    }

    #[test]
    fn test_idle_skimmer_bounces_off_walls() {
        let mut rng = Pcg32::seed_from_u64(1);
        let env = Environment::default();
        let arena = Arena::default();
        let mut skimmer = Agent::new(1, AgentKind::Skimmer, Vec2::new(400.0, 300.0)).with_heading(0.3);
        let mut xs = Vec::new();
        for tick in 0..3000 {
            skimmer.update(&ctx(&env), &mut rng);
            if tick % 500 == 499 {
                xs.push(skimmer.pos.x);
            }
        }
        assert!(arena.clamp(skimmer.pos) == skimmer.pos);
        // Never parked on the wall
        assert!(xs.windows(2).all(|w| w[0] != w[1]), "{xs:?}");
        let corner = Vec2::new(arena.width, arena.height);
        assert!(skimmer.pos.distance(corner) > 1.0);
    }

    #[test]
    fn test_spawn_count_scales_with_frames() {
        let mut rng = Pcg32::seed_from_u64(5);
        // Whole expectations are exact
        assert_eq!(spawn_count(&mut rng, 0.5, 6.0), 3);
        assert_eq!(spawn_count(&mut rng, 0.0, 6.0), 0);
        assert_eq!(spawn_count(&mut rng, f32::NAN, 1.0), 0);

        let total: u32 = (0..6000).map(|_| spawn_count(&mut rng, 0.5, 1.0)).sum();
        assert!((2800..=3200).contains(&total), "{total}");
    }

    #[test]
    fn test_expired_plastic_splits() {
        let mut plastic = Agent::new(1, AgentKind::PlasticParticle, Vec2::ZERO).with_lifespan(3.0);
        assert_eq!(plastic.split_products(), None);
        plastic.age = 3.0;
        assert!(plastic.is_terminal());
        assert_eq!(plastic.split_products(), Some((AgentKind::Microplastic, 5)));
        plastic.consume();
        assert_eq!(plastic.split_products(), None);
    }

    #[test]
    fn test_light_object_rises() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut env = Environment::default();
        env.salinity = 50.0;
        let mut object = Agent::new(1, AgentKind::FloatingObject, Vec2::new(100.0, 300.0))
            .with_state(KindState::Buoyant { density: 900.0 });
        for _ in 0..10 {
            object.update(&ctx(&env), &mut rng);
        }
        assert!(object.pos.y < 300.0);
    }

    #[test]
    fn test_oil_weathers_with_age() {
        let mut rng = Pcg32::seed_from_u64(3);
        let env = Environment::default();
        let mut oil = Agent::oil(1, Vec2::new(400.0, 300.0), OilGrade::Light, &mut rng);
        oil.age = 999.0;
        oil.update(&ctx(&env), &mut rng);
        assert!(oil.is_terminal());
    }
}
