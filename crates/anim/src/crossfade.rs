use serde::{Deserialize, Serialize};

use crate::player::ClipPlayer;

/// A change of playing clip reported by [`CrossFade::request`].
///
/// `to` is `None` when the desired clip is missing from the player; the old
/// clip still fades out so nothing stale keeps playing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from: Option<String>,
    pub to: Option<String>,
    pub blend: f32,
}

/// Cross-fade policy for one animated entity.
///
/// Each frame the owner names the clip it wants. When that differs from the
/// clip currently playing, the old clip fades out and the new one is reset
/// and faded in over the same window, so the two overlap instead of cutting.
/// Without a player the policy still tracks the desired clip; only the
/// visual blend is skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossFade {
    current: Option<String>,
    blend: f32,
}

impl CrossFade {
    pub fn new(blend: f32) -> Self {
        Self {
            current: None,
            blend: blend.max(0.0),
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn blend(&self) -> f32 {
        self.blend
    }

    /// Forget the playing clip so the next request starts it afresh.
    /// Used when a player is attached or replaced.
    pub fn forget(&mut self) {
        self.current = None;
    }

    pub fn request(
        &mut self,
        desired: &str,
        player: Option<&mut (dyn ClipPlayer + '_)>,
    ) -> Option<Transition> {
        match player {
            None => {
                if self.current.as_deref() == Some(desired) {
                    return None;
                }
                let from = self.current.replace(desired.to_string());
                Some(Transition {
                    from,
                    to: Some(desired.to_string()),
                    blend: self.blend,
                })
            }
            Some(player) => {
                let target = player.has_clip(desired).then(|| desired.to_string());
                if target == self.current {
                    return None;
                }
                if let Some(old) = &self.current {
                    player.fade_out(old, self.blend);
                }
                match &target {
                    Some(name) => {
                        player.reset(name);
                        player.fade_in(name, self.blend);
                        player.play(name);
                    }
                    None => tracing::debug!(clip = desired, "clip not available, blend skipped"),
                }
                let from = std::mem::replace(&mut self.current, target.clone());
                tracing::debug!(?from, to = ?target, blend = self.blend, "cross-fade");
                Some(Transition {
                    from,
                    to: target,
                    blend: self.blend,
                })
            }
        }
    }
}
