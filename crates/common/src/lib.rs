//! Shared types for the meadow workspace: ids, transforms, ray geometry,
//! the seeded RNG and the scene configuration.

pub mod config;
pub mod geometry;
pub mod rng;
pub mod types;

pub use config::{
    AgentConfig, CameraConfig, ConfigError, InputConfig, NpcConfig, PropConfig, SceneConfig,
    WorldConfig,
};
pub use geometry::{Collider, Plane, Ray};
pub use rng::SplitMix64;
pub use types::{EntityId, Transform};
