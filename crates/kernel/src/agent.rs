use glam::Vec3;
use meadow_common::{AgentConfig, EntityId, Transform, WorldConfig};
use meadow_input::{Action, Bindings, InputState};
use serde::{Deserialize, Serialize};

/// Locomotion animation state of the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocomotionState {
    Idle,
    Walking,
}

/// Position and heading of the agent, as read by the camera rig.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub yaw: f32,
}

/// The player-controlled creature. Planar: rotation is a yaw about +Y and
/// the height is pinned to `floor_y`.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub id: EntityId,
    pub position: Vec3,
    pub yaw: f32,
    /// Yaw the smoothed `yaw` is chasing.
    pub target_yaw: f32,
    pub state: LocomotionState,
    pub floor_y: f32,
}

impl Agent {
    pub fn new(spawn: Vec3, floor_y: f32) -> Self {
        Self {
            id: EntityId::new(),
            position: Vec3::new(spawn.x, floor_y, spawn.z),
            yaw: 0.0,
            target_yaw: 0.0,
            state: LocomotionState::Idle,
            floor_y,
        }
    }

    pub fn pose(&self) -> Pose {
        Pose {
            position: self.position,
            yaw: self.yaw,
        }
    }

    pub fn transform(&self) -> Transform {
        Transform::from_position_yaw(self.position, self.yaw)
    }

    /// Local +Z rotated by the current yaw.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.yaw.sin(), 0.0, self.yaw.cos())
    }
}

/// Turns held movement actions into agent motion.
#[derive(Debug, Clone, PartialEq)]
pub struct Locomotion {
    pub move_step: f32,
    pub rotate_step: f32,
    pub turn_smoothing: f32,
    pub half_extent: f32,
}

impl Locomotion {
    pub fn from_config(agent: &AgentConfig, world: &WorldConfig) -> Self {
        Self {
            move_step: agent.move_step,
            rotate_step: agent.rotate_step,
            turn_smoothing: agent.turn_smoothing,
            half_extent: world.agent_half_extent,
        }
    }

    /// Advance the agent by one frame. Steps are per frame; `_dt` is accepted
    /// for symmetry with the other controllers.
    pub fn update(
        &self,
        agent: &mut Agent,
        input: &InputState,
        bindings: &Bindings,
        _dt: f32,
    ) -> LocomotionState {
        if bindings.active(Action::TurnLeft, input) {
            agent.target_yaw += self.rotate_step;
        }
        if bindings.active(Action::TurnRight, input) {
            agent.target_yaw -= self.rotate_step;
        }
        agent.yaw += (agent.target_yaw - agent.yaw) * self.turn_smoothing;

        let move_distance = if bindings.active(Action::MoveForward, input) {
            self.move_step
        } else if bindings.active(Action::MoveBackward, input) {
            -self.move_step
        } else {
            0.0
        };

        if move_distance != 0.0 {
            agent.position += agent.forward() * move_distance;
        }

        agent.position.x = agent.position.x.clamp(-self.half_extent, self.half_extent);
        agent.position.z = agent.position.z.clamp(-self.half_extent, self.half_extent);
        agent.position.y = agent.floor_y;

        agent.state = if move_distance != 0.0 {
            LocomotionState::Walking
        } else {
            LocomotionState::Idle
        };
        agent.state
    }
}
