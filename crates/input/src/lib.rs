//! Input State Store: raw keyboard and pointer events absorbed into a flat,
//! queryable per-frame state, plus the logical action bindings read by the
//! simulation.
//!
//! # Invariants
//! - Only the platform event layer writes the store; simulation code reads it.
//! - Key state is last-write-wins; edges are visible to exactly one frame.

pub mod action;
pub mod key;
pub mod state;
#[cfg(feature = "winit")]
pub mod winit_adapter;

pub use action::{Action, BindingError, Bindings};
pub use key::{Key, UnknownKey};
pub use state::{InputEvent, InputState};
#[cfg(feature = "winit")]
pub use winit_adapter::WinitAdapter;
