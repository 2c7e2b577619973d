//! Developer Tooling: read-only inspection of a running scene.
//!
//! # Invariants
//! - Tools never mutate the scene.

mod inspector;

pub use inspector::{EntityInfo, EntityKind, SceneInspector, SceneSummary};
