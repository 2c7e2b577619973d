use glam::Vec2;
use std::collections::{HashMap, HashSet};

use crate::key::Key;

/// A raw input event delivered by the platform layer between frames.
///
/// Pointer coordinates are normalized device coordinates: x right, y up,
/// both in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    PointerMoved(Vec2),
    PointerDown(Vec2),
    PointerUp(Vec2),
}

/// Per-frame queryable input state.
///
/// Events are absorbed as they arrive with last-write-wins semantics. The
/// frame driver calls [`InputState::refresh`] once at the start of a frame to
/// sample the pointer, and [`InputState::end_frame`] once at the end to clear
/// edge flags. Simulation code only ever reads it.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    keys: HashMap<Key, bool>,
    pressed_this_frame: HashSet<Key>,
    latest_pointer: Vec2,
    pointer: Vec2,
    previous_pointer: Vec2,
    pointer_held: bool,
    pointer_down: bool,
    pointer_up: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown(key) => {
                let was_down = self.keys.insert(key, true).unwrap_or(false);
                if !was_down {
                    tracing::trace!(%key, "key pressed");
                    self.pressed_this_frame.insert(key);
                }
            }
            InputEvent::KeyUp(key) => {
                self.keys.insert(key, false);
            }
            InputEvent::PointerMoved(p) => {
                self.latest_pointer = clamp_ndc(p);
            }
            InputEvent::PointerDown(p) => {
                self.latest_pointer = clamp_ndc(p);
                self.pointer_held = true;
                self.pointer_down = true;
            }
            InputEvent::PointerUp(p) => {
                self.latest_pointer = clamp_ndc(p);
                self.pointer_held = false;
                self.pointer_up = true;
            }
        }
    }

    pub fn apply_all(&mut self, events: impl IntoIterator<Item = InputEvent>) {
        for event in events {
            self.apply(event);
        }
    }

    /// Start-of-frame sample: the pointer seen last frame becomes the previous one.
    pub fn refresh(&mut self) {
        self.previous_pointer = self.pointer;
        self.pointer = self.latest_pointer;
    }

    /// End-of-frame: clear edge flags so each edge is seen by exactly one frame.
    pub fn end_frame(&mut self) {
        self.pressed_this_frame.clear();
        self.pointer_down = false;
        self.pointer_up = false;
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.keys.get(&key).copied().unwrap_or(false)
    }

    /// True if `key` went from up to down since the previous frame.
    pub fn was_pressed(&self, key: Key) -> bool {
        self.pressed_this_frame.contains(&key)
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    pub fn previous_pointer(&self) -> Vec2 {
        self.previous_pointer
    }

    pub fn pointer_delta(&self) -> Vec2 {
        self.pointer - self.previous_pointer
    }

    pub fn pointer_held(&self) -> bool {
        self.pointer_held
    }

    pub fn pointer_down_edge(&self) -> bool {
        self.pointer_down
    }

    pub fn pointer_up_edge(&self) -> bool {
        self.pointer_up
    }
}

fn clamp_ndc(p: Vec2) -> Vec2 {
    p.clamp(Vec2::splat(-1.0), Vec2::splat(1.0))
}
