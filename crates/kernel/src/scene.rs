use glam::{Vec2, Vec3};
use meadow_anim::{ClipPlayer, CrossFade, Transition};
use meadow_common::{Collider, ConfigError, EntityId, SceneConfig, SplitMix64, Transform};
use meadow_input::{Action, BindingError, Bindings, InputState};
use serde::Serialize;

use crate::agent::{Agent, Locomotion, LocomotionState};
use crate::camera::{CameraView, FollowRig, RayProjector};
use crate::npc::{Interaction, InteractionEvent, InteractionState, Npc};
use crate::prop::{ColliderPick, PickTest, PointerRay, Prop, PropEvent, PropPhysics, VisualHandle};

/// Clip names the prop highlight cross-fades between.
pub const HIGHLIGHT_CLIP: &str = "highlighted";
pub const PLAIN_CLIP: &str = "plain";

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("no prop with id {0:?}")]
    PropNotFound(EntityId),
    #[error("the agent has not been spawned")]
    AgentMissing,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Bindings(#[from] BindingError),
}

/// A record of something that happened during [`Scene::step`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SceneEvent {
    PropPicked { id: EntityId },
    PropReleased { id: EntityId, velocity: Vec3 },
    PropBounced { id: EntityId, rebound: f32 },
    PropLanded { id: EntityId, position: Vec3 },
    PropsReset { count: usize },
    HighlightChanged { id: EntityId, highlighted: bool },
    AnimationChanged { entity: EntityId, transition: Transition },
    DialogueStarted { npc: EntityId, line: String },
    DialogueEnded { npc: EntityId },
    Stepped { frame: u64, dt: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentView {
    pub id: EntityId,
    pub transform: Transform,
    pub yaw: f32,
    pub state: LocomotionState,
    pub clip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropView {
    pub id: EntityId,
    pub transform: Transform,
    pub velocity: Vec3,
    pub dragging: bool,
    pub highlighted: bool,
    pub loaded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NpcView {
    pub id: EntityId,
    pub transform: Transform,
    pub state: InteractionState,
    pub opacity: f32,
    pub line: Option<String>,
    pub near: bool,
    pub clip: Option<String>,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub agent: Option<AgentView>,
    pub camera: CameraView,
    pub props: Vec<PropView>,
    pub npc: NpcView,
}

/// Cross-fade state plus the optional clip player it drives.
struct AnimSlot {
    fade: CrossFade,
    player: Option<Box<dyn ClipPlayer>>,
}

impl AnimSlot {
    fn new(blend: f32) -> Self {
        Self {
            fade: CrossFade::new(blend),
            player: None,
        }
    }

    fn attach(&mut self, player: Box<dyn ClipPlayer>) {
        self.player = Some(player);
        self.fade.forget();
    }

    fn request(&mut self, clip: &str) -> Option<Transition> {
        self.fade.request(clip, self.player.as_deref_mut())
    }

    fn advance(&mut self, dt: f32) {
        if let Some(player) = self.player.as_mut() {
            player.advance(dt);
        }
    }
}

struct PropSlot {
    prop: Prop,
    highlight: AnimSlot,
}

/// The meadow scene: one agent, a handful of props, a follow camera and
/// one NPC, advanced together once per rendered frame.
///
/// The scene owns every authoritative transform. Collaborators feed it input
/// and read back [`FrameSnapshot`]s and [`SceneEvent`]s.
pub struct Scene {
    config: SceneConfig,
    bindings: Bindings,
    frame: u64,
    rng: SplitMix64,
    agent: Option<Agent>,
    locomotion: Locomotion,
    agent_anim: AnimSlot,
    props: Vec<PropSlot>,
    physics: PropPhysics,
    picker: Box<dyn PickTest>,
    next_visual: u64,
    camera: FollowRig,
    npc: Npc,
    interaction: Interaction,
    npc_anim: AnimSlot,
    reset_all: bool,
    pending_resets: Vec<EntityId>,
    agent_missing_logged: bool,
    events: Vec<SceneEvent>,
}

impl Scene {
    /// Build the scene and spawn the agent at its configured spawn point.
    pub fn new(config: SceneConfig) -> Result<Self, SceneError> {
        let mut scene = Self::without_agent(config)?;
        scene.spawn_agent();
        Ok(scene)
    }

    /// Build the scene with the agent still absent, as while its model loads.
    pub fn without_agent(config: SceneConfig) -> Result<Self, SceneError> {
        config.validate()?;
        let bindings = Bindings::from_config(&config.input)?;
        let mut scene = Self {
            bindings,
            frame: 0,
            rng: SplitMix64::new(config.seed),
            agent: None,
            locomotion: Locomotion::from_config(&config.agent, &config.world),
            agent_anim: AnimSlot::new(config.agent.blend),
            props: Vec::new(),
            physics: PropPhysics::from_config(&config.props, &config.world),
            picker: Box::new(ColliderPick),
            next_visual: 0,
            camera: FollowRig::from_config(&config.camera),
            npc: Npc::new(config.npc.position, config.npc.yaw),
            interaction: Interaction::from_config(&config.npc),
            npc_anim: AnimSlot::new(config.npc.blend),
            reset_all: false,
            pending_resets: Vec::new(),
            agent_missing_logged: false,
            events: Vec::new(),
            config,
        };
        let collider = Collider::Sphere {
            radius: scene.config.props.collider_radius,
        };
        for spawn in scene.config.props.spawns.clone() {
            scene.add_prop(spawn, collider);
        }
        tracing::debug!(
            props = scene.props.len(),
            seed = scene.config.seed,
            "scene created"
        );
        Ok(scene)
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn bindings_mut(&mut self) -> &mut Bindings {
        &mut self.bindings
    }

    pub fn agent(&self) -> Option<&Agent> {
        self.agent.as_ref()
    }

    /// Spawn (or respawn) the agent at the configured spawn point.
    pub fn spawn_agent(&mut self) -> EntityId {
        let agent = Agent::new(self.config.agent.spawn, self.config.world.floor_y);
        let id = agent.id;
        if self.agent.replace(agent).is_some() {
            tracing::debug!(agent = %id.short(), "agent respawned");
        } else {
            tracing::debug!(agent = %id.short(), "agent spawned");
        }
        self.camera.follow(id);
        self.agent_missing_logged = false;
        id
    }

    /// Teleport the agent. Height is pinned to the floor.
    pub fn place_agent(&mut self, position: Vec3, yaw: f32) -> Result<(), SceneError> {
        let agent = self.agent.as_mut().ok_or(SceneError::AgentMissing)?;
        agent.position = Vec3::new(position.x, agent.floor_y, position.z);
        agent.yaw = yaw;
        agent.target_yaw = yaw;
        Ok(())
    }

    pub fn attach_agent_clips(&mut self, player: Box<dyn ClipPlayer>) {
        self.agent_anim.attach(player);
    }

    pub fn attach_npc_clips(&mut self, player: Box<dyn ClipPlayer>) {
        self.npc_anim.attach(player);
    }

    pub fn attach_prop_player(
        &mut self,
        id: EntityId,
        player: Box<dyn ClipPlayer>,
    ) -> Result<(), SceneError> {
        self.prop_slot_mut(id)?.highlight.attach(player);
        Ok(())
    }

    pub fn agent_clip(&self) -> Option<&str> {
        self.agent_anim.fade.current()
    }

    pub fn npc_clip(&self) -> Option<&str> {
        self.npc_anim.fade.current()
    }

    /// Add a prop with a visual handle already assigned.
    pub fn add_prop(&mut self, spawn: Vec3, collider: Collider) -> EntityId {
        let visual = VisualHandle(self.next_visual);
        self.next_visual += 1;
        let prop = Prop::new(spawn, self.config.world.floor_y, collider).with_visual(visual);
        let id = prop.id;
        self.props.push(PropSlot {
            prop,
            highlight: AnimSlot::new(self.config.props.highlight_blend),
        });
        id
    }

    /// Attach or detach a prop's visual. Props without one are not simulated.
    pub fn set_prop_visual(
        &mut self,
        id: EntityId,
        visual: Option<VisualHandle>,
    ) -> Result<(), SceneError> {
        self.prop_slot_mut(id)?.prop.visual = visual;
        Ok(())
    }

    pub fn set_picker(&mut self, picker: Box<dyn PickTest>) {
        self.picker = picker;
    }

    pub fn props(&self) -> impl Iterator<Item = &Prop> {
        self.props.iter().map(|slot| &slot.prop)
    }

    pub fn prop(&self, id: EntityId) -> Result<&Prop, SceneError> {
        self.props
            .iter()
            .find(|slot| slot.prop.id == id)
            .map(|slot| &slot.prop)
            .ok_or(SceneError::PropNotFound(id))
    }

    fn prop_slot_mut(&mut self, id: EntityId) -> Result<&mut PropSlot, SceneError> {
        self.props
            .iter_mut()
            .find(|slot| slot.prop.id == id)
            .ok_or(SceneError::PropNotFound(id))
    }

    /// Queue a reset of every prop for the start of the next step.
    pub fn request_reset(&mut self) {
        self.reset_all = true;
    }

    /// Queue a reset of one prop for the start of the next step.
    pub fn reset_prop(&mut self, id: EntityId) -> Result<(), SceneError> {
        self.prop(id)?;
        self.pending_resets.push(id);
        Ok(())
    }

    pub fn npc(&self) -> &Npc {
        &self.npc
    }

    pub fn camera(&self) -> &CameraView {
        self.camera.view()
    }

    pub fn rig(&self) -> &FollowRig {
        &self.camera
    }

    pub fn events(&self) -> &[SceneEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advance one frame. `input` is refreshed at the start and its edges are
    /// cleared at the end, so the caller only feeds it events.
    pub fn step(&mut self, input: &mut InputState, dt: f32) {
        let _span = tracing::info_span!("scene_step", frame = self.frame + 1).entered();
        input.refresh();
        self.frame += 1;

        self.apply_resets(input);
        self.update_agent(input, dt);
        self.update_props(input);
        self.camera.update(self.agent.as_ref().map(Agent::pose));
        self.update_npc(input, dt);

        self.agent_anim.advance(dt);
        self.npc_anim.advance(dt);
        for slot in &mut self.props {
            slot.highlight.advance(dt);
        }

        tracing::trace!(frame = self.frame, events = self.events.len(), "stepped");
        self.events.push(SceneEvent::Stepped {
            frame: self.frame,
            dt,
        });
        input.end_frame();
    }

    fn apply_resets(&mut self, input: &InputState) {
        if self.bindings.triggered(Action::ResetProps, input) {
            self.reset_all = true;
        }
        let pending = std::mem::take(&mut self.pending_resets);
        let mut count = 0;
        for slot in &mut self.props {
            if self.reset_all || pending.contains(&slot.prop.id) {
                slot.prop.reset();
                count += 1;
            }
        }
        self.reset_all = false;
        if count > 0 {
            tracing::debug!(count, "props reset");
            self.events.push(SceneEvent::PropsReset { count });
        }
    }

    fn update_agent(&mut self, input: &InputState, dt: f32) {
        let Some(agent) = self.agent.as_mut() else {
            if !self.agent_missing_logged {
                tracing::warn!("agent not spawned; locomotion, camera and proximity skipped");
                self.agent_missing_logged = true;
            }
            return;
        };
        let state = self.locomotion.update(agent, input, &self.bindings, dt);
        let clip = match state {
            LocomotionState::Idle => &self.config.agent.idle_clip,
            LocomotionState::Walking => &self.config.agent.walk_clip,
        };
        if let Some(transition) = self.agent_anim.request(clip) {
            self.events.push(SceneEvent::AnimationChanged {
                entity: agent.id,
                transition,
            });
        }
    }

    fn pointer_ray(&self, pointer: Vec2) -> Option<PointerRay> {
        let view = self.camera.view();
        view.ray(pointer).map(|ray| PointerRay {
            ray,
            view_dir: view.forward(),
        })
    }

    fn update_props(&mut self, input: &InputState) {
        let pointer = self.pointer_ray(input.pointer());
        let agent = self.agent.as_ref().map(|a| a.position);
        let radius = self.config.props.highlight_radius;

        for slot in &mut self.props {
            let prop = &mut slot.prop;
            let id = prop.id;
            for event in self.physics.update(
                prop,
                input,
                pointer.as_ref(),
                self.picker.as_ref(),
                &mut self.rng,
            ) {
                self.events.push(match event {
                    PropEvent::Picked => SceneEvent::PropPicked { id },
                    PropEvent::Released { velocity } => SceneEvent::PropReleased { id, velocity },
                    PropEvent::Bounced { after, .. } => SceneEvent::PropBounced { id, rebound: after },
                    PropEvent::Landed => SceneEvent::PropLanded {
                        id,
                        position: prop.position,
                    },
                });
            }

            let Some(agent) = agent.filter(|_| prop.visual.is_some()) else {
                continue;
            };
            let highlighted = prop.position.distance(agent) < radius;
            if highlighted != prop.highlighted {
                prop.highlighted = highlighted;
                self.events.push(SceneEvent::HighlightChanged { id, highlighted });
            }
            let clip = if highlighted { HIGHLIGHT_CLIP } else { PLAIN_CLIP };
            if let Some(transition) = slot.highlight.request(clip) {
                self.events.push(SceneEvent::AnimationChanged {
                    entity: id,
                    transition,
                });
            }
        }
    }

    fn update_npc(&mut self, input: &InputState, dt: f32) {
        let triggered = self.bindings.triggered(Action::Interact, input);
        let agent = self.agent.as_ref().map(|a| a.position);
        let id = self.npc.id;
        match self
            .interaction
            .update(&mut self.npc, agent, triggered, dt, &mut self.rng)
        {
            Some(InteractionEvent::Started { line }) => {
                self.events.push(SceneEvent::DialogueStarted { npc: id, line });
            }
            Some(InteractionEvent::Ended) => {
                self.events.push(SceneEvent::DialogueEnded { npc: id });
            }
            None => {}
        }

        let clip = if self.npc.is_speaking() {
            &self.config.npc.interact_clip
        } else {
            &self.config.npc.idle_clip
        };
        if let Some(transition) = self.npc_anim.request(clip) {
            self.events.push(SceneEvent::AnimationChanged {
                entity: id,
                transition,
            });
        }
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            frame: self.frame,
            agent: self.agent.as_ref().map(|a| AgentView {
                id: a.id,
                transform: a.transform(),
                yaw: a.yaw,
                state: a.state,
                clip: self.agent_clip().map(str::to_string),
            }),
            camera: *self.camera.view(),
            props: self
                .props
                .iter()
                .map(|slot| PropView {
                    id: slot.prop.id,
                    transform: slot.prop.transform(),
                    velocity: slot.prop.velocity,
                    dragging: slot.prop.dragging,
                    highlighted: slot.prop.highlighted,
                    loaded: slot.prop.visual.is_some(),
                })
                .collect(),
            npc: NpcView {
                id: self.npc.id,
                transform: self.npc.transform(),
                state: self.npc.state,
                opacity: self.npc.opacity,
                line: self.npc.line.clone(),
                near: self.npc.near,
                clip: self.npc_clip().map(str::to_string),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meadow_anim::Mixer;
    use meadow_input::{InputEvent, Key};

    const DT: f32 = 1.0 / 60.0;

    fn config_with_props(spawns: Vec<Vec3>) -> SceneConfig {
        let mut config = SceneConfig::default();
        config.props.spawns = spawns;
        config
    }

    fn run(scene: &mut Scene, input: &mut InputState, frames: usize) {
        for _ in 0..frames {
            scene.step(input, DT);
        }
    }

    fn press(scene: &mut Scene, input: &mut InputState, key: char) {
        input.apply(InputEvent::KeyDown(Key::char(key)));
        scene.step(input, DT);
        input.apply(InputEvent::KeyUp(Key::char(key)));
    }

    #[test]
    fn default_scene_has_agent_props_and_npc() {
        let scene = Scene::new(SceneConfig::default()).unwrap();
        assert!(scene.agent().is_some());
        assert_eq!(scene.props().count(), 3);
        assert_eq!(scene.npc().state, InteractionState::Idle);
        assert_eq!(scene.frame(), 0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = SceneConfig::default();
        config.camera.smoothing = 0.0;
        assert!(matches!(Scene::new(config), Err(SceneError::Config(_))));

        let mut config = SceneConfig::default();
        config.input.interact = vec!["not-a-key".into()];
        assert!(matches!(Scene::new(config), Err(SceneError::Bindings(_))));
    }

    #[test]
    fn dropped_prop_settles_on_floor() {
        let mut scene = Scene::new(config_with_props(vec![Vec3::new(0.0, 5.1, 0.0)])).unwrap();
        let id = scene.props().next().unwrap().id;
        let mut input = InputState::new();

        let mut landed = false;
        for _ in 0..200 {
            scene.step(&mut input, DT);
            if scene
                .drain_events()
                .iter()
                .any(|e| matches!(e, SceneEvent::PropLanded { id: landed_id, .. } if *landed_id == id))
            {
                landed = true;
                break;
            }
        }
        assert!(landed);
        let prop = scene.prop(id).unwrap();
        assert_eq!(prop.position.y, 0.1);
        assert!(prop.velocity.y.abs() < 0.01);
    }

    #[test]
    fn props_stay_in_play_area() {
        let mut scene = Scene::new(SceneConfig::default()).unwrap();
        run(&mut scene, &mut InputState::new(), 10);
        for prop in scene.props() {
            assert!(prop.position.x.abs() <= 5.0);
            assert!(prop.position.z.abs() <= 5.0);
            assert!(prop.position.y >= 0.1);
        }
    }

    #[test]
    fn drag_moves_prop_and_respects_floor_then_throw_releases() {
        let mut scene = Scene::new(config_with_props(vec![Vec3::new(0.0, 1.0, 2.0)])).unwrap();
        let id = scene.props().next().unwrap().id;
        let mut input = InputState::new();
        scene.step(&mut input, DT);

        let at = scene.prop(id).unwrap().position;
        let ndc = scene.camera().project(at).unwrap();
        input.apply(InputEvent::PointerDown(ndc));
        scene.step(&mut input, DT);
        assert!(scene.prop(id).unwrap().dragging);
        assert!(scene.events().contains(&SceneEvent::PropPicked { id }));

        // A point on the drag plane well below the floor.
        let view = *scene.camera();
        let below = scene.prop(id).unwrap().position - view.rotation * Vec3::Y * 3.0;
        assert!(below.y < 0.1);
        input.apply(InputEvent::PointerMoved(view.project(below).unwrap()));
        scene.step(&mut input, DT);
        let prop = scene.prop(id).unwrap();
        assert!(prop.dragging);
        assert_eq!(prop.position.y, 0.1);
        assert!((prop.position.x - below.x).abs() < 0.05);
        assert_eq!(prop.velocity, Vec3::ZERO);

        input.apply(InputEvent::PointerUp(input.pointer()));
        scene.step(&mut input, DT);
        assert!(!scene.prop(id).unwrap().dragging);
        assert!(
            scene
                .events()
                .iter()
                .any(|e| matches!(e, SceneEvent::PropReleased { id: released, .. } if *released == id))
        );
    }

    #[test]
    fn reset_key_restores_props_on_next_step() {
        let mut scene = Scene::new(config_with_props(vec![Vec3::new(1.0, 2.0, 1.0)])).unwrap();
        let id = scene.props().next().unwrap().id;
        let mut input = InputState::new();
        run(&mut scene, &mut input, 30);
        assert!(scene.prop(id).unwrap().position.y < 2.0);

        scene.drain_events();
        input.apply(InputEvent::KeyDown(Key::char('r')));
        scene.step(&mut input, DT);
        assert!(scene.events().contains(&SceneEvent::PropsReset { count: 1 }));
        // Reset lands before the frame's physics, so one gravity step has run.
        let y = scene.prop(id).unwrap().position.y;
        assert!((y - (2.0 - 0.01)).abs() < 1e-5);

        // Holding the key does not reset again.
        scene.drain_events();
        scene.step(&mut input, DT);
        assert!(!scene.events().iter().any(|e| matches!(e, SceneEvent::PropsReset { .. })));
    }

    #[test]
    fn reset_single_prop_by_id() {
        let mut scene = Scene::new(config_with_props(vec![
            Vec3::new(1.0, 2.0, 1.0),
            Vec3::new(-1.0, 2.0, -1.0),
        ]))
        .unwrap();
        let ids: Vec<_> = scene.props().map(|p| p.id).collect();
        let mut input = InputState::new();
        run(&mut scene, &mut input, 30);

        scene.reset_prop(ids[0]).unwrap();
        // Nothing moves until the next step.
        assert!(scene.prop(ids[0]).unwrap().position.y < 2.0);
        scene.step(&mut input, DT);
        assert!(scene.prop(ids[0]).unwrap().position.y > 1.9);
        assert!(scene.prop(ids[1]).unwrap().position.y < 1.0);

        let missing = EntityId::new();
        assert!(matches!(
            scene.reset_prop(missing),
            Err(SceneError::PropNotFound(id)) if id == missing
        ));
    }

    #[test]
    fn walking_drives_agent_animation() {
        let mut scene = Scene::new(SceneConfig::default()).unwrap();
        let idle = scene.config().agent.idle_clip.clone();
        let walk = scene.config().agent.walk_clip.clone();
        scene.attach_agent_clips(Box::new(
            Mixer::new().with_clip(&idle, 1.0).with_clip(&walk, 0.8),
        ));
        let mut input = InputState::new();

        scene.step(&mut input, DT);
        assert_eq!(scene.agent_clip(), Some(idle.as_str()));

        input.apply(InputEvent::KeyDown(Key::char('z')));
        scene.step(&mut input, DT);
        assert_eq!(scene.agent_clip(), Some(walk.as_str()));
        assert_eq!(scene.agent().unwrap().state, LocomotionState::Walking);
        let changed = scene.events().iter().any(|e| {
            matches!(e, SceneEvent::AnimationChanged { transition, .. }
                if transition.from.as_deref() == Some(idle.as_str())
                    && transition.to.as_deref() == Some(walk.as_str()))
        });
        assert!(changed);
    }

    #[test]
    fn missing_clips_still_track_state() {
        let mut scene = Scene::new(SceneConfig::default()).unwrap();
        scene.attach_agent_clips(Box::new(Mixer::new()));
        let mut input = InputState::new();
        input.apply(InputEvent::KeyDown(Key::char('w')));
        scene.step(&mut input, DT);
        assert_eq!(scene.agent().unwrap().state, LocomotionState::Walking);
        assert_eq!(scene.agent_clip(), None);
    }

    #[test]
    fn dialogue_lifecycle() {
        let mut scene = Scene::new(SceneConfig::default()).unwrap();
        scene.attach_npc_clips(Box::new(
            Mixer::new().with_clip("Idle", 2.0).with_clip("Interact", 1.5),
        ));
        scene.place_agent(Vec3::new(4.0, 0.0, 4.0), 0.0).unwrap();
        let mut input = InputState::new();
        scene.step(&mut input, DT);
        assert!(scene.npc().near);
        assert_eq!(scene.npc_clip(), Some("Idle"));

        scene.drain_events();
        press(&mut scene, &mut input, 'f');
        let started = scene
            .events()
            .iter()
            .find_map(|e| match e {
                SceneEvent::DialogueStarted { line, .. } => Some(line.clone()),
                _ => None,
            })
            .expect("dialogue did not start");
        assert!(scene.config().npc.lines.contains(&started));
        assert_eq!(scene.npc().opacity, 1.0);
        assert_eq!(scene.npc_clip(), Some("Interact"));

        // Still speaking at 1.9 s, even when pressing again.
        run(&mut scene, &mut input, 100);
        press(&mut scene, &mut input, 'f');
        assert!(scene.npc().is_speaking());
        assert_eq!(scene.npc().line.as_deref(), Some(started.as_str()));

        scene.drain_events();
        let mut ended = false;
        for _ in 0..300 {
            scene.step(&mut input, DT);
            if scene.events().iter().any(|e| matches!(e, SceneEvent::DialogueEnded { .. })) {
                ended = true;
                break;
            }
        }
        assert!(ended);
        assert_eq!(scene.npc().opacity, 0.0);
        assert_eq!(scene.npc().state, InteractionState::Idle);
        assert_eq!(scene.npc_clip(), Some("Idle"));
    }

    #[test]
    fn interact_far_from_npc_does_nothing() {
        let mut scene = Scene::new(SceneConfig::default()).unwrap();
        let mut input = InputState::new();
        press(&mut scene, &mut input, 'f');
        assert!(!scene.npc().near);
        assert_eq!(scene.npc().state, InteractionState::Idle);
    }

    #[test]
    fn camera_snaps_then_trails() {
        let mut scene = Scene::new(SceneConfig::default()).unwrap();
        let mut input = InputState::new();
        scene.step(&mut input, DT);
        let agent = scene.agent().unwrap().pose();
        assert_eq!(scene.rig().current, scene.rig().desired(agent));

        input.apply(InputEvent::KeyDown(Key::char('z')));
        for _ in 0..30 {
            scene.step(&mut input, DT);
        }
        input.apply(InputEvent::KeyUp(Key::char('z')));
        scene.step(&mut input, DT);
        let desired = scene.rig().desired(scene.agent().unwrap().pose());
        let mut last = scene.rig().current.distance(desired);
        for _ in 0..60 {
            scene.step(&mut input, DT);
            let d = scene.rig().current.distance(desired);
            assert!(d <= last);
            last = d;
        }
    }

    #[test]
    fn agent_can_arrive_late() {
        let mut scene = Scene::without_agent(SceneConfig::default()).unwrap();
        let mut input = InputState::new();
        input.apply(InputEvent::KeyDown(Key::char('z')));
        run(&mut scene, &mut input, 5);
        assert!(!scene.rig().initialized);
        assert!(scene.snapshot().agent.is_none());
        assert!(matches!(
            scene.place_agent(Vec3::ZERO, 0.0),
            Err(SceneError::AgentMissing)
        ));
        // Props still fall while the agent loads.
        assert!(scene.props().all(|p| p.position.y < 1.0));

        scene.spawn_agent();
        scene.step(&mut input, DT);
        assert!(scene.rig().initialized);
        assert!(scene.agent().unwrap().position.z > 0.0);
    }

    #[test]
    fn unloaded_prop_is_frozen() {
        let mut scene = Scene::new(config_with_props(vec![Vec3::new(0.0, 3.0, 0.0)])).unwrap();
        let id = scene.props().next().unwrap().id;
        scene.set_prop_visual(id, None).unwrap();
        run(&mut scene, &mut InputState::new(), 10);
        assert_eq!(scene.prop(id).unwrap().position.y, 3.0);
        assert!(!scene.snapshot().props[0].loaded);
    }

    #[test]
    fn highlight_follows_agent_distance() {
        let mut scene = Scene::new(config_with_props(vec![Vec3::new(2.0, 0.1, 0.0)])).unwrap();
        let id = scene.props().next().unwrap().id;
        let mut input = InputState::new();
        scene.step(&mut input, DT);
        assert!(scene.prop(id).unwrap().highlighted);
        assert!(
            scene
                .events()
                .contains(&SceneEvent::HighlightChanged { id, highlighted: true })
        );

        scene.place_agent(Vec3::new(-8.0, 0.0, -8.0), 0.0).unwrap();
        scene.step(&mut input, DT);
        assert!(!scene.prop(id).unwrap().highlighted);
    }

    #[test]
    fn unloaded_prop_is_not_highlighted() {
        let mut scene = Scene::new(config_with_props(vec![Vec3::new(2.0, 0.1, 0.0)])).unwrap();
        let id = scene.props().next().unwrap().id;
        scene.set_prop_visual(id, None).unwrap();
        scene.step(&mut InputState::new(), DT);
        assert!(!scene.prop(id).unwrap().highlighted);
        assert!(!scene.events().iter().any(|e| match e {
            SceneEvent::HighlightChanged { id: prop, .. } => *prop == id,
            SceneEvent::AnimationChanged { entity, .. } => *entity == id,
            _ => false,
        }));
    }

    #[test]
    fn highlight_crossfade_is_reported() {
        let mut scene = Scene::new(config_with_props(vec![Vec3::new(2.0, 0.1, 0.0)])).unwrap();
        let id = scene.props().next().unwrap().id;
        scene
            .attach_prop_player(
                id,
                Box::new(Mixer::new().with_clip(HIGHLIGHT_CLIP, 1.0).with_clip(PLAIN_CLIP, 1.0)),
            )
            .unwrap();
        let mut input = InputState::new();
        scene.step(&mut input, DT);

        let to_clip = |scene: &Scene| {
            scene.events().iter().find_map(|e| match e {
                SceneEvent::AnimationChanged { entity, transition } if *entity == id => {
                    transition.to.clone()
                }
                _ => None,
            })
        };
        assert_eq!(to_clip(&scene).as_deref(), Some(HIGHLIGHT_CLIP));

        scene.drain_events();
        scene.place_agent(Vec3::new(-8.0, 0.0, -8.0), 0.0).unwrap();
        scene.step(&mut input, DT);
        assert_eq!(to_clip(&scene).as_deref(), Some(PLAIN_CLIP));

        scene.drain_events();
        scene.step(&mut input, DT);
        assert_eq!(to_clip(&scene), None);
    }

    #[test]
    fn interact_sees_agent_position_from_same_frame() {
        let mut scene = Scene::new(SceneConfig::default()).unwrap();
        // Just outside the 3.0 threshold, facing the NPC along +Z.
        scene.place_agent(Vec3::new(5.0, 0.0, 1.98), 0.0).unwrap();
        let mut input = InputState::new();
        scene.step(&mut input, DT);
        assert!(!scene.npc().near);

        scene.drain_events();
        input.apply(InputEvent::KeyDown(Key::char('z')));
        input.apply(InputEvent::KeyDown(Key::char('f')));
        scene.step(&mut input, DT);
        assert!(scene.npc().near);
        assert!(
            scene
                .events()
                .iter()
                .any(|e| matches!(e, SceneEvent::DialogueStarted { .. }))
        );
    }

    #[test]
    fn same_seed_same_trajectory() {
        let script = |scene: &mut Scene| {
            let mut input = InputState::new();
            scene.place_agent(Vec3::new(4.0, 0.0, 4.0), 0.0).unwrap();
            press(scene, &mut input, 'f');
            run(scene, &mut input, 20);
            scene.snapshot()
        };
        let a = script(&mut Scene::new(SceneConfig::default()).unwrap());
        let b = script(&mut Scene::new(SceneConfig::default()).unwrap());
        assert_eq!(a.npc.line, b.npc.line);
        let pa: Vec<_> = a.props.iter().map(|p| p.transform).collect();
        let pb: Vec<_> = b.props.iter().map(|p| p.transform).collect();
        assert_eq!(pa, pb);
    }

    #[test]
    fn stepped_event_every_frame() {
        let mut scene = Scene::new(SceneConfig::default()).unwrap();
        run(&mut scene, &mut InputState::new(), 3);
        let frames: Vec<_> = scene
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                SceneEvent::Stepped { frame, .. } => Some(frame),
                _ => None,
            })
            .collect();
        assert_eq!(frames, vec![1, 2, 3]);
        assert!(scene.events().is_empty());
    }
}
