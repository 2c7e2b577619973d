use glam::Vec3;
use serde::{Deserialize, Serialize};

const PARALLEL_EPSILON: f32 = 1e-6;

/// A half-line in world space. `direction` is unit length, or zero for a
/// degenerate ray that intersects nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.direction == Vec3::ZERO
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Point where the ray crosses `plane`, if it does so in front of the origin.
    pub fn intersect_plane(&self, plane: &Plane) -> Option<Vec3> {
        let denom = plane.normal.dot(self.direction);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }
        let t = -(self.origin.dot(plane.normal) + plane.constant) / denom;
        (t >= 0.0).then(|| self.at(t))
    }
}

/// Plane `normal · p + constant = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub constant: f32,
}

impl Plane {
    /// Plane through `point` facing `normal`. Returns `None` for a zero normal.
    pub fn from_normal_and_point(normal: Vec3, point: Vec3) -> Option<Self> {
        let normal = normal.try_normalize()?;
        Some(Self {
            normal,
            constant: -point.dot(normal),
        })
    }

    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.constant
    }
}

/// Pick volume of a prop, centred on its position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collider {
    Box { half_extents: [f32; 3] },
    Sphere { radius: f32 },
}

impl Default for Collider {
    fn default() -> Self {
        Self::Sphere { radius: 0.4 }
    }
}

impl Collider {
    /// Distance along `ray` to the first hit on this collider placed at `center`.
    pub fn ray_hit(&self, center: Vec3, ray: &Ray) -> Option<f32> {
        if ray.is_degenerate() {
            return None;
        }
        match *self {
            Self::Sphere { radius } => ray_sphere(center, radius, ray),
            Self::Box { half_extents } => {
                let half = Vec3::from_array(half_extents);
                ray_aabb(center - half, center + half, ray)
            }
        }
    }
}

fn ray_sphere(center: Vec3, radius: f32, ray: &Ray) -> Option<f32> {
    let oc = ray.origin - center;
    let b = oc.dot(ray.direction);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let root = disc.sqrt();
    let near = -b - root;
    if near >= 0.0 {
        return Some(near);
    }
    let far = -b + root;
    (far >= 0.0).then_some(far)
}

fn ray_aabb(min: Vec3, max: Vec3, ray: &Ray) -> Option<f32> {
    let mut t_min = 0.0_f32;
    let mut t_max = f32::INFINITY;
    for axis in 0..3 {
        let o = ray.origin[axis];
        let d = ray.direction[axis];
        if d.abs() < PARALLEL_EPSILON {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t0 = (min[axis] - o) * inv;
        let mut t1 = (max[axis] - o) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return None;
        }
    }
    Some(t_min)
}
