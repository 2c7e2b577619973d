use std::collections::BTreeMap;

use crate::player::ClipPlayer;

/// Errors from mixer setup.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MixerError {
    #[error("clip {name:?} has invalid duration {duration}")]
    InvalidDuration { name: String, duration: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Fade {
    from: f32,
    to: f32,
    elapsed: f32,
    duration: f32,
}

#[derive(Debug, Clone, PartialEq)]
struct Track {
    duration: f32,
    time: f32,
    weight: f32,
    playing: bool,
    fade: Option<Fade>,
}

/// Headless [`ClipPlayer`]: tracks per-clip playback time and blend weight
/// without sampling any skeleton. Used by the CLI and in tests, and as a
/// reference for renderer-side players.
#[derive(Debug, Clone, Default)]
pub struct Mixer {
    tracks: BTreeMap<String, Track>,
}

impl Mixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Mixer::add_clip`] for known-good durations.
    /// Non-positive durations are stored as zero (a static pose).
    pub fn with_clip(mut self, name: &str, duration: f32) -> Self {
        self.insert(name, duration.max(0.0));
        self
    }

    pub fn add_clip(&mut self, name: &str, duration: f32) -> Result<(), MixerError> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(MixerError::InvalidDuration {
                name: name.to_string(),
                duration,
            });
        }
        self.insert(name, duration);
        Ok(())
    }

    fn insert(&mut self, name: &str, duration: f32) {
        self.tracks.insert(
            name.to_string(),
            Track {
                duration,
                time: 0.0,
                weight: 0.0,
                playing: false,
                fade: None,
            },
        );
    }

    pub fn weight(&self, name: &str) -> Option<f32> {
        self.tracks.get(name).map(|t| t.weight)
    }

    pub fn time(&self, name: &str) -> Option<f32> {
        self.tracks.get(name).map(|t| t.time)
    }

    pub fn is_playing(&self, name: &str) -> bool {
        self.tracks.get(name).is_some_and(|t| t.playing)
    }

    /// Names of clips currently playing, with their weights.
    pub fn active(&self) -> Vec<(&str, f32)> {
        self.tracks
            .iter()
            .filter(|(_, t)| t.playing)
            .map(|(n, t)| (n.as_str(), t.weight))
            .collect()
    }

    fn schedule(&mut self, name: &str, to: f32, duration: f32) {
        let Some(track) = self.tracks.get_mut(name) else {
            return;
        };
        let from = if to > 0.0 { 0.0 } else { track.weight };
        if duration <= 0.0 {
            track.weight = to;
            track.fade = None;
            if to == 0.0 {
                track.playing = false;
            }
            return;
        }
        track.weight = from;
        track.fade = Some(Fade {
            from,
            to,
            elapsed: 0.0,
            duration,
        });
    }
}

impl ClipPlayer for Mixer {
    fn has_clip(&self, name: &str) -> bool {
        self.tracks.contains_key(name)
    }

    fn reset(&mut self, name: &str) {
        if let Some(track) = self.tracks.get_mut(name) {
            track.time = 0.0;
            track.fade = None;
        }
    }

    fn play(&mut self, name: &str) {
        if let Some(track) = self.tracks.get_mut(name) {
            track.playing = true;
        }
    }

    fn fade_in(&mut self, name: &str, duration: f32) {
        self.schedule(name, 1.0, duration);
    }

    fn fade_out(&mut self, name: &str, duration: f32) {
        self.schedule(name, 0.0, duration);
    }

    fn advance(&mut self, dt: f32) {
        for track in self.tracks.values_mut().filter(|t| t.playing) {
            track.time = if track.duration > 0.0 {
                (track.time + dt) % track.duration
            } else {
                0.0
            };
            if let Some(mut fade) = track.fade {
                fade.elapsed += dt;
                let k = (fade.elapsed / fade.duration).min(1.0);
                track.weight = fade.from + (fade.to - fade.from) * k;
                if k >= 1.0 {
                    track.fade = None;
                    if fade.to == 0.0 {
                        track.playing = false;
                    }
                } else {
                    track.fade = Some(fade);
                }
            }
        }
    }
}
