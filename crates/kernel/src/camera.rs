use glam::{Mat3, Mat4, Quat, Vec2, Vec3};
use meadow_common::{CameraConfig, EntityId, Ray};
use serde::Serialize;

use crate::agent::Pose;

/// Builds a world-space ray through a pointer position given in normalized
/// device coordinates.
pub trait RayProjector {
    fn ray(&self, ndc: Vec2) -> Option<Ray>;
}

/// Published camera state: where it is, what it looks at, and its lens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraView {
    pub eye: Vec3,
    pub target: Vec3,
    pub rotation: Quat,
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl CameraView {
    pub fn from_config(config: &CameraConfig) -> Self {
        let eye = Vec3::new(0.0, 5.0, 10.0);
        let target = Vec3::ZERO;
        Self {
            eye,
            target,
            rotation: look_rotation(eye, target).unwrap_or(Quat::IDENTITY),
            fov_degrees: config.fov_degrees,
            aspect: config.aspect,
            near: config.near,
            far: config.far,
        }
    }

    /// Unit view direction (camera local -Z).
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.eye + self.forward(), self.rotation * Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Screen-space NDC of a world point, or `None` when it is behind the camera.
    pub fn project(&self, point: Vec3) -> Option<Vec2> {
        let clip = self.view_projection() * point.extend(1.0);
        (clip.w > 0.0).then(|| Vec2::new(clip.x / clip.w, clip.y / clip.w))
    }
}

impl Default for CameraView {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

impl RayProjector for CameraView {
    fn ray(&self, ndc: Vec2) -> Option<Ray> {
        let inverse = self.view_projection().inverse();
        let near = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        let far = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        if !near.is_finite() || !far.is_finite() {
            return None;
        }
        let ray = Ray::new(near, far - near);
        (!ray.is_degenerate()).then_some(ray)
    }
}

/// Orientation whose local -Z points from `eye` at `target`, with +Y kept up.
/// `None` when the two coincide or the view is vertical.
pub fn look_rotation(eye: Vec3, target: Vec3) -> Option<Quat> {
    let forward = (target - eye).try_normalize()?;
    let right = forward.cross(Vec3::Y).try_normalize()?;
    let up = right.cross(forward);
    Some(Quat::from_mat3(&Mat3::from_cols(right, up, -forward)))
}

/// Third-person rig trailing the agent.
///
/// Holds the agent's id only; the pose is passed in each frame by whoever
/// owns the agent.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowRig {
    pub target: Option<EntityId>,
    /// Offset in the agent's local frame.
    pub offset: Vec3,
    pub smoothing: f32,
    pub current: Vec3,
    pub initialized: bool,
    view: CameraView,
}

impl FollowRig {
    pub fn from_config(config: &CameraConfig) -> Self {
        let view = CameraView::from_config(config);
        Self {
            target: None,
            offset: config.offset,
            smoothing: config.smoothing,
            current: view.eye,
            initialized: false,
            view,
        }
    }

    pub fn follow(&mut self, target: EntityId) {
        self.target = Some(target);
    }

    pub fn view(&self) -> &CameraView {
        &self.view
    }

    pub fn desired(&self, pose: Pose) -> Vec3 {
        pose.position + Quat::from_rotation_y(pose.yaw) * self.offset
    }

    /// Move toward the agent. Without a pose nothing changes; returns whether
    /// the camera was updated.
    pub fn update(&mut self, pose: Option<Pose>) -> bool {
        let Some(pose) = pose else {
            tracing::trace!("camera target unavailable");
            return false;
        };
        let desired = self.desired(pose);
        if self.initialized {
            self.current = self.current.lerp(desired, self.smoothing);
        } else {
            self.current = desired;
            self.initialized = true;
            tracing::debug!(eye = ?desired, "camera snapped to target");
        }

        self.view.eye = self.current;
        if let Some(rotation) = look_rotation(self.current, pose.position) {
            self.view.rotation = rotation;
            self.view.target = pose.position;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig() -> FollowRig {
        FollowRig::from_config(&CameraConfig::default())
    }

    fn pose(x: f32, z: f32, yaw: f32) -> Pose {
        Pose {
            position: Vec3::new(x, 0.1, z),
            yaw,
        }
    }

    #[test]
    fn first_update_snaps_to_desired() {
        let mut rig = rig();
        let p = pose(1.0, 2.0, 0.0);
        assert!(rig.update(Some(p)));
        assert!(rig.initialized);
        assert_eq!(rig.current, rig.desired(p));
        assert!((rig.current - Vec3::new(1.0, 5.1, -8.0)).length() < 1e-5);
    }

    #[test]
    fn offset_rotates_with_agent_yaw() {
        let rig = rig();
        let d = rig.desired(pose(0.0, 0.0, std::f32::consts::FRAC_PI_2));
        // Behind an agent facing +X is -X.
        assert!((d - Vec3::new(-10.0, 5.1, 0.0)).length() < 1e-4);
    }

    #[test]
    fn later_updates_close_the_gap() {
        let mut rig = rig();
        rig.update(Some(pose(0.0, 0.0, 0.0)));
        let moved = pose(3.0, 4.0, 0.5);
        let desired = rig.desired(moved);
        let mut last = rig.current.distance(desired);
        for _ in 0..100 {
            rig.update(Some(moved));
            let d = rig.current.distance(desired);
            assert!(d <= last);
            last = d;
        }
        assert!(last < 1e-2);
    }

    #[test]
    fn looks_at_agent_not_smoothed_point() {
        let mut rig = rig();
        rig.update(Some(pose(0.0, 0.0, 0.0)));
        let p = pose(2.0, 1.0, 0.0);
        rig.update(Some(p));
        let to_agent = (p.position - rig.view().eye).normalize();
        assert!(rig.view().forward().dot(to_agent) > 0.9999);
        assert_eq!(rig.view().target, p.position);
    }

    #[test]
    fn missing_target_leaves_camera_alone() {
        let mut rig = rig();
        rig.update(Some(pose(1.0, 1.0, 0.0)));
        let before = rig.clone();
        assert!(!rig.update(None));
        assert_eq!(rig, before);
    }

    #[test]
    fn missing_target_before_first_update_does_not_initialize() {
        let mut rig = rig();
        rig.update(None);
        assert!(!rig.initialized);
    }

    #[test]
    fn center_ray_follows_view_direction() {
        let view = CameraView::default();
        let ray = view.ray(Vec2::ZERO).unwrap();
        assert!(ray.direction.dot(view.forward()) > 0.9999);
        assert!(ray.origin.distance(view.eye) < 0.2);
    }

    #[test]
    fn projected_point_maps_back_through_its_ray() {
        let view = CameraView::default();
        let point = Vec3::new(1.0, 0.5, -2.0);
        let ndc = view.project(point).unwrap();
        let ray = view.ray(ndc).unwrap();
        let to_point = (point - ray.origin).normalize();
        assert!(ray.direction.dot(to_point) > 0.9999);
    }

    #[test]
    fn vertical_look_is_degenerate() {
        assert!(look_rotation(Vec3::ZERO, Vec3::Y).is_none());
        assert!(look_rotation(Vec3::ONE, Vec3::ONE).is_none());
    }
}
