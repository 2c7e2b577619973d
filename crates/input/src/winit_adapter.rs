//! Translates winit window events into [`InputEvent`]s.

use glam::Vec2;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::keyboard::{Key as WinitKey, NamedKey};

use crate::key::Key;
use crate::state::InputEvent;

/// Tracks window size and cursor position so pointer events can be
/// normalized to `[-1, 1]` with y up.
#[derive(Debug, Clone)]
pub struct WinitAdapter {
    size: PhysicalSize<u32>,
    cursor: Vec2,
}

impl WinitAdapter {
    pub fn new(size: PhysicalSize<u32>) -> Self {
        Self {
            size,
            cursor: Vec2::ZERO,
        }
    }

    pub fn translate(&mut self, event: &WindowEvent) -> Option<InputEvent> {
        match event {
            WindowEvent::Resized(size) => {
                self.size = *size;
                None
            }
            WindowEvent::KeyboardInput {
                event: KeyEvent {
                    logical_key, state, ..
                },
                ..
            } => {
                let key = map_key(logical_key)?;
                Some(match state {
                    ElementState::Pressed => InputEvent::KeyDown(key),
                    ElementState::Released => InputEvent::KeyUp(key),
                })
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = self.normalize(*position);
                Some(InputEvent::PointerMoved(self.cursor))
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => Some(match state {
                ElementState::Pressed => InputEvent::PointerDown(self.cursor),
                ElementState::Released => InputEvent::PointerUp(self.cursor),
            }),
            _ => None,
        }
    }

    fn normalize(&self, position: PhysicalPosition<f64>) -> Vec2 {
        let w = self.size.width.max(1) as f64;
        let h = self.size.height.max(1) as f64;
        Vec2::new(
            (position.x / w * 2.0 - 1.0) as f32,
            (-(position.y / h) * 2.0 + 1.0) as f32,
        )
    }
}

fn map_key(key: &WinitKey) -> Option<Key> {
    match key {
        WinitKey::Character(s) => s.chars().next().map(Key::char),
        WinitKey::Named(NamedKey::ArrowUp) => Some(Key::ArrowUp),
        WinitKey::Named(NamedKey::ArrowDown) => Some(Key::ArrowDown),
        WinitKey::Named(NamedKey::ArrowLeft) => Some(Key::ArrowLeft),
        WinitKey::Named(NamedKey::ArrowRight) => Some(Key::ArrowRight),
        WinitKey::Named(NamedKey::Space) => Some(Key::Space),
        WinitKey::Named(NamedKey::Enter) => Some(Key::Enter),
        WinitKey::Named(NamedKey::Escape) => Some(Key::Escape),
        WinitKey::Named(NamedKey::Shift) => Some(Key::Shift),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_is_normalized_with_y_up() {
        let adapter = WinitAdapter::new(PhysicalSize::new(800, 600));
        let top_left = adapter.normalize(PhysicalPosition::new(0.0, 0.0));
        assert_eq!(top_left, Vec2::new(-1.0, 1.0));
        let centre = adapter.normalize(PhysicalPosition::new(400.0, 300.0));
        assert!(centre.length() < 1e-6);
    }

    #[test]
    fn character_keys_map_lowercase() {
        assert_eq!(
            map_key(&WinitKey::Character("Z".into())),
            Some(Key::Char('z'))
        );
        assert_eq!(map_key(&WinitKey::Named(NamedKey::Tab)), None);
    }
}
