//! Animation blending: one cross-fade policy shared by every animated entity,
//! the [`ClipPlayer`] seam to the renderer's clip player, and a headless
//! [`Mixer`] implementation.
//!
//! # Invariants
//! - A clip change always overlaps fade-out of the old clip with fade-in of the new.
//! - Missing clips never fail; only the visual blend is skipped.

mod crossfade;
mod mixer;
mod player;

pub use crossfade::{CrossFade, Transition};
pub use mixer::{Mixer, MixerError};
pub use player::ClipPlayer;
