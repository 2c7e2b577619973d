use meadow_common::InputConfig;
use std::collections::BTreeMap;

use crate::key::{Key, UnknownKey};
use crate::state::InputState;

/// A logical action the simulation reads instead of raw keys.
///
/// Controllers ask the [`Bindings`] whether an action is held or was just
/// triggered; they never look at physical keys directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    /// Translate the agent along its facing.
    MoveForward,
    /// Translate the agent against its facing.
    MoveBackward,
    /// Raise the agent's target yaw.
    TurnLeft,
    /// Lower the agent's target yaw.
    TurnRight,
    /// Talk to a nearby NPC.
    Interact,
    /// Put every prop back on its spawn point.
    ResetProps,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::MoveForward,
        Action::MoveBackward,
        Action::TurnLeft,
        Action::TurnRight,
        Action::Interact,
        Action::ResetProps,
    ];
}

/// Errors from building [`Bindings`].
#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    #[error("bad key binding for {action:?}: {source}")]
    UnknownKey {
        action: Action,
        #[source]
        source: UnknownKey,
    },
}

/// Action to key mapping. Several keys may drive one action and one key may
/// drive several actions.
#[derive(Debug, Clone, PartialEq)]
pub struct Bindings {
    map: BTreeMap<Action, Vec<Key>>,
}

impl Bindings {
    pub fn from_config(config: &InputConfig) -> Result<Self, BindingError> {
        let mut map = BTreeMap::new();
        for action in Action::ALL {
            let keys = key_names(config, action)
                .iter()
                .map(|n| {
                    n.parse::<Key>()
                        .map_err(|source| BindingError::UnknownKey { action, source })
                })
                .collect::<Result<Vec<_>, _>>()?;
            map.insert(action, keys);
        }
        Ok(Self { map })
    }

    pub fn keys(&self, action: Action) -> &[Key] {
        self.map.get(&action).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn bind(&mut self, action: Action, key: Key) {
        let keys = self.map.entry(action).or_default();
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    /// True while any key bound to `action` is held.
    pub fn active(&self, action: Action, input: &InputState) -> bool {
        self.keys(action).iter().any(|k| input.is_down(*k))
    }

    /// True on the frame any key bound to `action` went down.
    pub fn triggered(&self, action: Action, input: &InputState) -> bool {
        self.keys(action).iter().any(|k| input.was_pressed(*k))
    }
}

impl Default for Bindings {
    fn default() -> Self {
        let config = InputConfig::default();
        let map = Action::ALL
            .into_iter()
            .map(|action| {
                let keys = key_names(&config, action)
                    .iter()
                    .filter_map(|n| n.parse::<Key>().ok())
                    .collect::<Vec<_>>();
                (action, keys)
            })
            .collect();
        Self { map }
    }
}

fn key_names(config: &InputConfig, action: Action) -> &[String] {
    match action {
        Action::MoveForward => &config.move_forward,
        Action::MoveBackward => &config.move_backward,
        Action::TurnLeft => &config.turn_left,
        Action::TurnRight => &config.turn_right,
        Action::Interact => &config.interact,
        Action::ResetProps => &config.reset_props,
    }
}
