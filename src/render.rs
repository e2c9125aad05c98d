//! Render boundary
//!
//! The core hands the host one [`Sprite`] per live agent. The host owns all
//! drawing; nothing here reads back from it.

use glam::Vec2;
use serde::Serialize;

use crate::sim::agent::KindState;
use crate::sim::{AgentKind, SimState};

/// One agent as the drawing collaborator sees it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sprite {
    pub kind: AgentKind,
    pub pos: Vec2,
    pub size: f32,
    /// 0..=1; health, energy or remaining life depending on the kind
    pub health_fraction: f32,
    /// Far end of a line-shaped agent (booms)
    pub extent: Option<Vec2>,
    pub heading: f32,
    /// Oil-covered animals are drawn darker
    pub contaminated: bool,
}

/// Draw list in update order
pub fn sprites(state: &SimState) -> Vec<Sprite> {
    state
        .populations
        .all_agents()
        .map(|a| Sprite {
            kind: a.kind,
            pos: a.pos,
            size: a.size,
            health_fraction: a.health_fraction(),
            extent: match a.state {
                KindState::Boom { end, .. } => Some(end),
                _ => None,
            },
            heading: a.heading,
            contaminated: matches!(a.state, KindState::Animal { contaminated: true, .. }),
        })
        .collect()
}

/// Base colour for a kind (RGBA, 0..=1)
pub fn kind_color(kind: AgentKind) -> [f32; 4] {
    match kind {
        AgentKind::Shellfish => [1.0, 0.65, 0.0, 1.0],
        AgentKind::Coral => [1.0, 0.5, 0.31, 1.0],
        AgentKind::Phytoplankton | AgentKind::Plankton => [0.0, 1.0, 0.0, 1.0],
        AgentKind::Fish | AgentKind::PreyFish => [0.0, 0.0, 1.0, 1.0],
        AgentKind::PredatorFish => [1.0, 0.0, 0.0, 1.0],
        AgentKind::Turtle => [0.0, 0.5, 0.0, 1.0],
        AgentKind::Shark => [0.5, 0.5, 0.5, 1.0],
        AgentKind::Whale => [0.27, 0.51, 0.71, 1.0],
        AgentKind::Seabird => [1.0, 1.0, 1.0, 1.0],
        AgentKind::PlasticParticle => [1.0, 0.0, 0.0, 0.7],
        AgentKind::Microplastic => [1.0, 0.65, 0.0, 0.7],
        AgentKind::OilParticle | AgentKind::OilSlick => [0.0, 0.0, 0.0, 0.5],
        AgentKind::Debris => [0.55, 0.27, 0.07, 1.0],
        AgentKind::Skimmer => [0.0, 1.0, 0.0, 1.0],
        AgentKind::Boom => [1.0, 1.0, 0.0, 1.0],
        AgentKind::Drone => [0.0, 1.0, 1.0, 1.0],
        AgentKind::Ship => [0.5, 0.5, 0.5, 1.0],
        AgentKind::Dispersant => [0.0, 0.0, 1.0, 0.3],
        AgentKind::Bubble => [1.0, 1.0, 1.0, 0.5],
        AgentKind::FloatingObject => [1.0, 0.84, 0.0, 1.0],
    }
}

/// Health bar colour: green when healthy through yellow to red
pub fn health_color(fraction: f32) -> [f32; 4] {
    let t = fraction.clamp(0.0, 1.0);
    if t > 0.5 {
        let u = (t - 0.5) / 0.5;
        [1.0 - u, 1.0, 0.0, 1.0]
    } else {
        let u = t / 0.5;
        [1.0, u, 0.0, 1.0]
    }
}

/// CSS `rgba()` string for a colour
pub fn css(color: [f32; 4]) -> String {
    let [r, g, b, a] = color;
    format!(
        "rgba({}, {}, {}, {:.2})",
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
        a
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Settings;
    use crate::sim::{Action, Scenario, TickInput, tick};

    #[test]
    fn test_one_sprite_per_agent() {
        let state = SimState::new(Scenario::Acidification, Settings::default(), 4);
        let list = sprites(&state);
        assert_eq!(list.len(), state.populations.total());
        assert!(list.iter().all(|s| (0.0..=1.0).contains(&s.health_fraction)));
    }

    #[test]
    fn test_boom_has_extent() {
        let mut state = SimState::new(Scenario::PlasticPollution, Settings::default(), 4);
        tick(
            &mut state,
            &TickInput::default().action(Action::Add(AgentKind::Boom)),
            crate::consts::FRAME_DT,
        );
        let boom = sprites(&state).into_iter().find(|s| s.kind == AgentKind::Boom);
        assert!(boom.is_some_and(|b| b.extent.is_some()));
    }

    #[test]
    fn test_health_color_ends() {
        assert_eq!(health_color(1.0), [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(health_color(0.0), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(health_color(0.5), [1.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_css_string() {
        assert_eq!(css([1.0, 0.0, 0.0, 0.5]), "rgba(255, 0, 0, 0.50)");
    }
}
