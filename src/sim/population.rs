//! Per-kind population registry
//!
//! Each kind owns one ordered `Vec<Agent>`. Membership only changes between
//! phases of a tick: spawns go through [`Populations::push`] (which enforces
//! the ceiling) and removals happen in [`Populations::retain_live`].

use serde::{Deserialize, Serialize};

use super::agent::{Agent, AgentKind};
use crate::Settings;

/// Stable handle to an agent during one tick (kind + index into its population)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentRef {
    pub kind: AgentKind,
    pub index: usize,
}

impl AgentRef {
    pub fn new(kind: AgentKind, index: usize) -> Self {
        Self { kind, index }
    }
}

/// All live agents of one kind
#[derive(Debug, Clone)]
pub struct Population {
    pub kind: AgentKind,
    agents: Vec<Agent>,
    ceiling: usize,
    /// Spawns refused because the ceiling was reached
    dropped: u64,
}

impl Population {
    pub fn new(kind: AgentKind, ceiling: usize) -> Self {
        Self {
            kind,
            agents: Vec::new(),
            ceiling: ceiling.max(1),
            dropped: 0,
        }
    }

    /// Add an agent unless the ceiling is reached. Returns whether it was kept.
    pub fn push(&mut self, agent: Agent) -> bool {
        debug_assert_eq!(agent.kind, self.kind);
        if self.agents.len() >= self.ceiling {
            if self.dropped == 0 {
                log::warn!("{} population reached its ceiling of {}", self.kind.label(), self.ceiling);
            }
            self.dropped += 1;
            log::debug!("Dropped {} spawn ({} so far)", self.kind.label(), self.dropped);
            return false;
        }
        self.agents.push(agent);
        true
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    #[inline]
    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    #[inline]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    #[inline]
    pub fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Agent> {
        self.agents.iter()
    }

    pub fn clear(&mut self) {
        self.agents.clear();
    }

    /// Remove terminal agents, returning them in their original order
    pub fn retain_live(&mut self) -> Vec<Agent> {
        let (live, dead): (Vec<Agent>, Vec<Agent>) = self.agents.drain(..).partition(|a| !a.is_terminal());
        self.agents = live;
        dead
    }
}

/// The registry: one population per declared kind, in declaration order
#[derive(Debug, Clone, Default)]
pub struct Populations {
    pops: Vec<Population>,
}

impl Populations {
    pub fn new(kinds: &[AgentKind], settings: &Settings) -> Self {
        Self {
            pops: kinds
                .iter()
                .map(|&kind| Population::new(kind, settings.ceiling(kind)))
                .collect(),
        }
    }

    pub fn get(&self, kind: AgentKind) -> Option<&Population> {
        self.pops.iter().find(|p| p.kind == kind)
    }

    pub fn get_mut(&mut self, kind: AgentKind) -> Option<&mut Population> {
        self.pops.iter_mut().find(|p| p.kind == kind)
    }

    /// Agents of one kind (empty if the kind is not declared)
    pub fn agents(&self, kind: AgentKind) -> &[Agent] {
        self.get(kind).map(Population::agents).unwrap_or(&[])
    }

    pub fn agent(&self, r: AgentRef) -> Option<&Agent> {
        self.get(r.kind).and_then(|p| p.agents.get(r.index))
    }

    pub fn agent_mut(&mut self, r: AgentRef) -> Option<&mut Agent> {
        self.get_mut(r.kind).and_then(|p| p.agents.get_mut(r.index))
    }

    /// Route an agent to its population. Undeclared kinds are refused.
    pub fn push(&mut self, agent: Agent) -> bool {
        match self.get_mut(agent.kind) {
            Some(pop) => pop.push(agent),
            None => {
                log::debug!("No {} population in this scenario", agent.kind.label());
                false
            }
        }
    }

    pub fn count(&self, kind: AgentKind) -> usize {
        self.get(kind).map_or(0, Population::len)
    }

    pub fn total(&self) -> usize {
        self.pops.iter().map(Population::len).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Population> {
        self.pops.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Population> {
        self.pops.iter_mut()
    }

    /// Every live agent in declaration order
    pub fn all_agents(&self) -> impl Iterator<Item = &Agent> {
        self.pops.iter().flat_map(|p| p.agents.iter())
    }

    pub fn clear(&mut self) {
        for pop in &mut self.pops {
            pop.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use proptest::prelude::*;

    #[test]
    fn test_push_respects_ceiling() {
        let mut pop = Population::new(AgentKind::Microplastic, 2);
        for id in 0..5 {
            pop.push(Agent::new(id, AgentKind::Microplastic, Vec2::ZERO));
        }
        assert_eq!(pop.len(), 2);
        assert_eq!(pop.dropped(), 3);
    }

    #[test]
    fn test_undeclared_kind_is_refused() {
        let settings = Settings::default();
        let mut pops = Populations::new(&[AgentKind::Coral], &settings);
        assert!(!pops.push(Agent::new(1, AgentKind::Shark, Vec2::ZERO)));
        assert!(pops.push(Agent::new(2, AgentKind::Coral, Vec2::ZERO)));
        assert_eq!(pops.total(), 1);
    }

    #[test]
    fn test_retain_live_keeps_order() {
        let mut pop = Population::new(AgentKind::Coral, 10);
        for id in 0..4 {
            pop.push(Agent::new(id, AgentKind::Coral, Vec2::ZERO));
        }
        pop.agents_mut()[1].health = 0.0;
        let dead = pop.retain_live();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].id, 1);
        let ids: Vec<u32> = pop.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![0, 2, 3]);
    }

    proptest! {
        #[test]
        fn prop_population_never_exceeds_ceiling(ceiling in 1usize..50, spawns in 0usize..200) {
            let mut pop = Population::new(AgentKind::PlasticParticle, ceiling);
            for id in 0..spawns {
                pop.push(Agent::new(id as u32, AgentKind::PlasticParticle, Vec2::ZERO));
                prop_assert!(pop.len() <= ceiling);
            }
            prop_assert_eq!(pop.len() as u64 + pop.dropped(), spawns as u64);
        }
    }
}
