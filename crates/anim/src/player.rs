/// Animation clip player owned by the rendering collaborator.
///
/// Clips are addressed by name. Operations on a clip the player does not
/// have are ignored.
pub trait ClipPlayer {
    fn has_clip(&self, name: &str) -> bool;
    /// Rewind `name` to its start and cancel any fade in progress.
    fn reset(&mut self, name: &str);
    fn play(&mut self, name: &str);
    /// Ramp the weight of `name` from 0 to 1 over `duration` seconds.
    fn fade_in(&mut self, name: &str, duration: f32);
    /// Ramp the weight of `name` to 0 over `duration` seconds, then stop it.
    fn fade_out(&mut self, name: &str, duration: f32);
    /// Advance clip time and fades by `dt` seconds.
    fn advance(&mut self, dt: f32);
}
