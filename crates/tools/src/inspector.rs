use std::collections::BTreeMap;
use std::fmt;

use meadow_common::{EntityId, Transform};
use meadow_kernel::{InteractionState, Scene, SceneEvent};

/// Scene inspector for developer tooling.
///
/// Read-only queries for debugging and the CLI.
pub struct SceneInspector;

impl SceneInspector {
    pub fn summary(scene: &Scene) -> SceneSummary {
        SceneSummary {
            frame: scene.frame(),
            seed: scene.config().seed,
            agent_spawned: scene.agent().is_some(),
            prop_count: scene.props().count(),
            dragging: scene.props().filter(|p| p.dragging).count(),
            highlighted: scene.props().filter(|p| p.highlighted).count(),
            npc_state: scene.npc().state,
            pending_events: scene.events().len(),
        }
    }

    pub fn inspect_entity(scene: &Scene, id: EntityId) -> Option<EntityInfo> {
        if let Some(agent) = scene.agent().filter(|a| a.id == id) {
            return Some(EntityInfo::new(id, EntityKind::Agent, agent.transform()));
        }
        if scene.npc().id == id {
            return Some(EntityInfo::new(id, EntityKind::Npc, scene.npc().transform()));
        }
        scene
            .prop(id)
            .ok()
            .map(|prop| EntityInfo::new(id, EntityKind::Prop, prop.transform()))
    }

    /// Agent first (when spawned), then props in spawn order, then the NPC.
    pub fn list_entities(scene: &Scene) -> Vec<(EntityId, EntityKind)> {
        let mut out = Vec::new();
        if let Some(agent) = scene.agent() {
            out.push((agent.id, EntityKind::Agent));
        }
        out.extend(scene.props().map(|p| (p.id, EntityKind::Prop)));
        out.push((scene.npc().id, EntityKind::Npc));
        out
    }

    /// Count events by kind.
    pub fn tally(events: &[SceneEvent]) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for event in events {
            let kind = match event {
                SceneEvent::PropPicked { .. } => "prop_picked",
                SceneEvent::PropReleased { .. } => "prop_released",
                SceneEvent::PropBounced { .. } => "prop_bounced",
                SceneEvent::PropLanded { .. } => "prop_landed",
                SceneEvent::PropsReset { .. } => "props_reset",
                SceneEvent::HighlightChanged { .. } => "highlight_changed",
                SceneEvent::AnimationChanged { .. } => "animation_changed",
                SceneEvent::DialogueStarted { .. } => "dialogue_started",
                SceneEvent::DialogueEnded { .. } => "dialogue_ended",
                SceneEvent::Stepped { .. } => "stepped",
            };
            *counts.entry(kind).or_insert(0) += 1;
        }
        counts
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneSummary {
    pub frame: u64,
    pub seed: u64,
    pub agent_spawned: bool,
    pub prop_count: usize,
    pub dragging: usize,
    pub highlighted: usize,
    pub npc_state: InteractionState,
    pub pending_events: usize,
}

impl fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scene: frame={} seed={} agent={} props={} (dragging={} highlighted={}) npc={:?} pending_events={}",
            self.frame,
            self.seed,
            if self.agent_spawned { "spawned" } else { "loading" },
            self.prop_count,
            self.dragging,
            self.highlighted,
            self.npc_state,
            self.pending_events
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Agent,
    Prop,
    Npc,
}

#[derive(Debug, Clone)]
pub struct EntityInfo {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
}

impl EntityInfo {
    fn new(id: EntityId, kind: EntityKind, transform: Transform) -> Self {
        Self {
            id,
            kind,
            position: transform.position.to_array(),
            rotation: transform.rotation.to_array(),
        }
    }
}

impl fmt::Display for EntityInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} [{}] pos=({:.2}, {:.2}, {:.2})",
            self.kind,
            self.id.short(),
            self.position[0],
            self.position[1],
            self.position[2],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meadow_common::SceneConfig;
    use meadow_input::InputState;

    #[test]
    fn summary_fresh_scene() {
        let scene = Scene::new(SceneConfig::default()).unwrap();
        let summary = SceneInspector::summary(&scene);
        assert_eq!(summary.frame, 0);
        assert_eq!(summary.seed, 42);
        assert!(summary.agent_spawned);
        assert_eq!(summary.prop_count, 3);
        assert_eq!(summary.pending_events, 0);
    }

    #[test]
    fn summary_counts_pending_events() {
        let mut scene = Scene::new(SceneConfig::default()).unwrap();
        scene.step(&mut InputState::new(), 1.0 / 60.0);
        let summary = SceneInspector::summary(&scene);
        assert_eq!(summary.frame, 1);
        assert!(summary.pending_events >= 1);
        assert!(format!("{summary}").contains("frame=1"));
    }

    #[test]
    fn inspect_each_kind() {
        let scene = Scene::new(SceneConfig::default()).unwrap();
        let agent = scene.agent().unwrap().id;
        let info = SceneInspector::inspect_entity(&scene, agent).unwrap();
        assert_eq!(info.kind, EntityKind::Agent);
        assert_eq!(info.position, [0.0, 0.1, 0.0]);

        let npc = SceneInspector::inspect_entity(&scene, scene.npc().id).unwrap();
        assert_eq!(npc.kind, EntityKind::Npc);
        assert_eq!(npc.position, [5.0, 0.0, 5.0]);

        let prop = scene.props().next().unwrap().id;
        let info = SceneInspector::inspect_entity(&scene, prop).unwrap();
        assert_eq!(info.kind, EntityKind::Prop);
        assert!(format!("{info}").starts_with("Prop ["));
    }

    #[test]
    fn inspect_unknown_entity() {
        let scene = Scene::new(SceneConfig::default()).unwrap();
        assert!(SceneInspector::inspect_entity(&scene, EntityId::new()).is_none());
    }

    #[test]
    fn list_entities_in_order() {
        let scene = Scene::new(SceneConfig::default()).unwrap();
        let kinds: Vec<_> = SceneInspector::list_entities(&scene)
            .into_iter()
            .map(|(_, k)| k)
            .collect();
        assert_eq!(
            kinds,
            vec![
                EntityKind::Agent,
                EntityKind::Prop,
                EntityKind::Prop,
                EntityKind::Prop,
                EntityKind::Npc
            ]
        );
    }

    #[test]
    fn tally_groups_by_kind() {
        let mut scene = Scene::new(SceneConfig::default()).unwrap();
        let mut input = InputState::new();
        for _ in 0..3 {
            scene.step(&mut input, 1.0 / 60.0);
        }
        let tally = SceneInspector::tally(scene.events());
        assert_eq!(tally.get("stepped"), Some(&3));
        assert!(!tally.contains_key("dialogue_started"));
    }
}
