use glam::Vec3;
use meadow_common::{EntityId, NpcConfig, SplitMix64, Transform};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionState {
    Idle,
    Speaking,
}

/// Where a `Speaking` NPC is in its timed exit.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Hold { remaining: f32 },
    Fade { accumulator: f32 },
}

/// A stationary character the agent can talk to.
#[derive(Debug, Clone, PartialEq)]
pub struct Npc {
    pub id: EntityId,
    pub position: Vec3,
    pub yaw: f32,
    pub state: InteractionState,
    /// Dialogue opacity in `[0, 1]`.
    pub opacity: f32,
    pub line: Option<String>,
    /// Whether the agent was inside the proximity threshold on the last update.
    pub near: bool,
    phase: Option<Phase>,
}

impl Npc {
    pub fn new(position: Vec3, yaw: f32) -> Self {
        Self {
            id: EntityId::new(),
            position,
            yaw,
            state: InteractionState::Idle,
            opacity: 0.0,
            line: None,
            near: false,
            phase: None,
        }
    }

    pub fn transform(&self) -> Transform {
        Transform::from_position_yaw(self.position, self.yaw)
    }

    pub fn is_speaking(&self) -> bool {
        self.state == InteractionState::Speaking
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEvent {
    Started { line: String },
    Ended,
}

/// Proximity-gated dialogue: `Idle -> Speaking -> Idle`, with a fixed hold
/// followed by a stepped fade-out, both advanced from frame time.
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub threshold: f32,
    pub hold_seconds: f32,
    pub fade_step: f32,
    pub fade_interval: f32,
    pub fade_floor: f32,
    pub lines: Vec<String>,
}

impl Interaction {
    pub fn from_config(config: &NpcConfig) -> Self {
        Self {
            threshold: config.threshold,
            hold_seconds: config.hold_seconds,
            fade_step: config.fade_step,
            fade_interval: config.fade_interval,
            fade_floor: config.fade_floor,
            lines: config.lines.clone(),
        }
    }

    /// One frame. `triggered` is the interact edge for this frame. A missing
    /// agent skips the proximity check but timers still run.
    pub fn update(
        &self,
        npc: &mut Npc,
        agent: Option<Vec3>,
        triggered: bool,
        dt: f32,
        rng: &mut SplitMix64,
    ) -> Option<InteractionEvent> {
        if let Some(agent) = agent {
            npc.near = npc.position.distance(agent) < self.threshold;
        }

        match npc.state {
            InteractionState::Idle => {
                if triggered && npc.near && agent.is_some() {
                    return self.start(npc, rng);
                }
                None
            }
            InteractionState::Speaking => self.advance(npc, dt.max(0.0)),
        }
    }

    fn start(&self, npc: &mut Npc, rng: &mut SplitMix64) -> Option<InteractionEvent> {
        if self.lines.is_empty() {
            return None;
        }
        let line = self.lines[rng.index(self.lines.len())].clone();
        npc.state = InteractionState::Speaking;
        npc.opacity = 1.0;
        npc.line = Some(line.clone());
        npc.phase = Some(Phase::Hold {
            remaining: self.hold_seconds,
        });
        tracing::debug!(npc = %npc.id.short(), %line, "dialogue started");
        Some(InteractionEvent::Started { line })
    }

    fn advance(&self, npc: &mut Npc, dt: f32) -> Option<InteractionEvent> {
        let mut accumulator = match npc.phase {
            Some(Phase::Hold { remaining }) => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    npc.phase = Some(Phase::Hold { remaining });
                    return None;
                }
                -remaining
            }
            Some(Phase::Fade { accumulator }) => accumulator + dt,
            None => 0.0,
        };

        while accumulator >= self.fade_interval {
            accumulator -= self.fade_interval;
            if npc.opacity <= self.fade_floor || npc.opacity <= 0.0 {
                npc.opacity = 0.0;
                npc.state = InteractionState::Idle;
                npc.line = None;
                npc.phase = None;
                tracing::debug!(npc = %npc.id.short(), "dialogue ended");
                return Some(InteractionEvent::Ended);
            }
            npc.opacity = (npc.opacity - self.fade_step).max(0.0);
        }
        npc.phase = Some(Phase::Fade { accumulator });
        None
    }
}
