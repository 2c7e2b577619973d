//! Rendering Adapter: renderer-agnostic consumers of [`FrameSnapshot`]s.
//!
//! # Invariants
//! - Renderers read snapshots only and never touch the scene.
//! - Screen placement derives from the snapshot's camera and the viewport.
//!
//! [`FrameSnapshot`]: meadow_kernel::FrameSnapshot

mod renderer;

pub use renderer::{DebugTextRenderer, RenderView, Renderer};
