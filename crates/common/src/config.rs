//! Scene configuration: every tunable of the simulation, loadable from YAML or JSON.
//!
//! All sections default to the values the meadow scene ships with, so a config
//! file only needs to name what it overrides.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading or validating a [`SceneConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config format: {0:?} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(String),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub seed: u64,
    pub world: WorldConfig,
    pub props: PropConfig,
    pub agent: AgentConfig,
    pub camera: CameraConfig,
    pub npc: NpcConfig,
    pub input: InputConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            world: WorldConfig::default(),
            props: PropConfig::default(),
            agent: AgentConfig::default(),
            camera: CameraConfig::default(),
            npc: NpcConfig::default(),
            input: InputConfig::default(),
        }
    }
}

/// Ground plane and play-area bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub floor_y: f32,
    /// Horizontal half extent props are clamped to.
    pub play_area_half_extent: f32,
    /// Horizontal half extent the agent is clamped to.
    pub agent_half_extent: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            floor_y: 0.1,
            play_area_half_extent: 5.0,
            agent_half_extent: 9.0,
        }
    }
}

/// Drag, throw and bounce tunables. Velocities are in world units per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropConfig {
    pub gravity: f32,
    pub restitution: f32,
    pub friction: f32,
    pub angular_damping: f32,
    pub rest_epsilon: f32,
    pub throw_gain: f32,
    pub max_throw_speed: f32,
    pub max_spin: f32,
    pub highlight_radius: f32,
    /// Cross-fade duration between the plain and highlighted looks.
    pub highlight_blend: f32,
    pub collider_radius: f32,
    pub spawns: Vec<Vec3>,
}

impl Default for PropConfig {
    fn default() -> Self {
        Self {
            gravity: -0.01,
            restitution: 0.3,
            friction: 0.7,
            angular_damping: 0.9,
            rest_epsilon: 0.01,
            throw_gain: 20.0,
            max_throw_speed: 0.2,
            max_spin: 0.1,
            highlight_radius: 3.0,
            highlight_blend: 0.0,
            collider_radius: 0.4,
            spawns: vec![
                Vec3::new(7.0, 1.0, -7.0),
                Vec3::new(6.0, 1.0, -7.0),
                Vec3::new(6.0, 1.0, -6.0),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub spawn: Vec3,
    pub move_step: f32,
    pub rotate_step: f32,
    pub turn_smoothing: f32,
    pub idle_clip: String,
    pub walk_clip: String,
    pub blend: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            spawn: Vec3::ZERO,
            move_step: 0.05,
            rotate_step: 0.05,
            turn_smoothing: 0.1,
            idle_clip: "AnimalArmature|AnimalArmature|AnimalArmature|Idle".into(),
            walk_clip: "AnimalArmature|AnimalArmature|AnimalArmature|Walk".into(),
            blend: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Offset from the agent, in the agent's local frame.
    pub offset: Vec3,
    pub smoothing: f32,
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            offset: Vec3::new(0.0, 5.0, -10.0),
            smoothing: 0.1,
            fov_degrees: 60.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcConfig {
    pub position: Vec3,
    pub yaw: f32,
    pub threshold: f32,
    pub hold_seconds: f32,
    pub fade_step: f32,
    pub fade_interval: f32,
    pub fade_floor: f32,
    pub idle_clip: String,
    pub interact_clip: String,
    pub blend: f32,
    pub lines: Vec<String>,
}

impl Default for NpcConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(5.0, 0.0, 5.0),
            yaw: std::f32::consts::PI,
            threshold: 3.0,
            hold_seconds: 2.0,
            fade_step: 0.05,
            fade_interval: 0.1,
            fade_floor: 0.05,
            idle_clip: "Idle".into(),
            interact_clip: "Interact".into(),
            blend: 0.3,
            lines: [
                "Hello there, little one!",
                "The others are waiting for us.",
                "Lost again? Come along with me.",
                "Follow me, and fear nothing!",
                "More of the flock have wandered off. Come!",
                "I'm here to guide you.",
                "We'll find the flock together.",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Key names bound to each logical action. Names are matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub move_forward: Vec<String>,
    pub move_backward: Vec<String>,
    pub turn_left: Vec<String>,
    pub turn_right: Vec<String>,
    pub interact: Vec<String>,
    pub reset_props: Vec<String>,
}

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            move_forward: keys(&["z", "w", "arrowup"]),
            move_backward: keys(&["s", "arrowdown"]),
            turn_left: keys(&["q", "a", "arrowleft"]),
            turn_right: keys(&["d", "arrowright"]),
            interact: keys(&["f"]),
            reset_props: keys(&["r"]),
        }
    }
}

impl SceneConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.yaml`, `.yml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let text = std::fs::read_to_string(path)?;
        let config = match ext.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&text)?,
            "json" => Self::from_json_str(&text)?,
            _ => return Err(ConfigError::UnsupportedFormat(ext)),
        };
        tracing::debug!(path = %path.display(), "loaded scene config");
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject values outside the domain the simulation is defined on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        unit_open_closed("agent.turn_smoothing", self.agent.turn_smoothing)?;
        unit_open_closed("camera.smoothing", self.camera.smoothing)?;
        unit_closed("props.restitution", self.props.restitution)?;
        unit_closed("props.friction", self.props.friction)?;
        unit_closed("props.angular_damping", self.props.angular_damping)?;
        positive("world.play_area_half_extent", self.world.play_area_half_extent)?;
        positive("world.agent_half_extent", self.world.agent_half_extent)?;
        positive("props.collider_radius", self.props.collider_radius)?;
        positive("npc.threshold", self.npc.threshold)?;
        positive("npc.fade_interval", self.npc.fade_interval)?;
        positive("npc.fade_step", self.npc.fade_step)?;
        non_negative("npc.hold_seconds", self.npc.hold_seconds)?;
        non_negative("agent.blend", self.agent.blend)?;
        non_negative("npc.blend", self.npc.blend)?;
        non_negative("props.max_throw_speed", self.props.max_throw_speed)?;
        non_negative("props.max_spin", self.props.max_spin)?;
        non_negative("props.highlight_blend", self.props.highlight_blend)?;
        non_negative("props.rest_epsilon", self.props.rest_epsilon)?;
        non_negative("props.highlight_radius", self.props.highlight_radius)?;
        if !(0.0..1.0).contains(&self.npc.fade_floor) {
            return Err(ConfigError::Invalid {
                field: "npc.fade_floor",
                reason: format!("{} is outside [0, 1)", self.npc.fade_floor),
            });
        }
        if self.props.gravity > 0.0 {
            return Err(ConfigError::Invalid {
                field: "props.gravity",
                reason: format!("{} must pull down (<= 0)", self.props.gravity),
            });
        }
        if !(self.camera.fov_degrees > 0.0 && self.camera.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid {
                field: "camera.fov_degrees",
                reason: format!("{} is outside (0, 180)", self.camera.fov_degrees),
            });
        }
        if self.npc.lines.is_empty() {
            return Err(ConfigError::Invalid {
                field: "npc.lines",
                reason: "at least one dialogue line is required".into(),
            });
        }
        if self.camera.aspect <= 0.0 || self.camera.near <= 0.0 || self.camera.far <= self.camera.near
        {
            return Err(ConfigError::Invalid {
                field: "camera",
                reason: "projection needs aspect > 0 and 0 < near < far".into(),
            });
        }
        Ok(())
    }
}

fn unit_open_closed(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if v > 0.0 && v <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{v} is outside (0, 1]"),
        })
    }
}

fn unit_closed(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{v} is outside [0, 1]"),
        })
    }
}

fn positive(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if v > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{v} must be positive"),
        })
    }
}

fn non_negative(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if v >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{v} must not be negative"),
        })
    }
}
