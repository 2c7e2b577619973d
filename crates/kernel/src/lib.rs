//! Meadow kernel: the per-frame simulation of agent locomotion, prop
//! drag/throw/bounce physics, the follow camera and NPC dialogue.
//!
//! # Invariants
//! - One [`Scene::step`] runs input refresh, locomotion, props, camera and NPC in that order.
//! - Every component writes only its own state; reads see the current frame's agent position.
//! - Prop height never drops below the floor; while dragged a prop has zero velocity.
//! - The per-frame path never fails. Missing collaborators only skip work.

pub mod agent;
pub mod camera;
pub mod npc;
pub mod prop;
pub mod scene;

pub use agent::{Agent, Locomotion, LocomotionState, Pose};
pub use camera::{CameraView, FollowRig, RayProjector, look_rotation};
pub use npc::{Interaction, InteractionEvent, InteractionState, Npc};
pub use prop::{ColliderPick, PickTest, PointerRay, Prop, PropEvent, PropPhysics, VisualHandle};
pub use scene::{
    AgentView, FrameSnapshot, HIGHLIGHT_CLIP, NpcView, PLAIN_CLIP, PropView, Scene, SceneError,
    SceneEvent,
};
