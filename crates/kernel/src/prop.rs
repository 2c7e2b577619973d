use glam::Vec3;
use meadow_common::{Collider, EntityId, Plane, PropConfig, Ray, SplitMix64, Transform, WorldConfig};
use meadow_input::InputState;
use serde::{Deserialize, Serialize};

/// Opaque handle to a prop's visual node, owned by the rendering collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisualHandle(pub u64);

/// A small pickable object that can be dragged, thrown and bounced.
///
/// `position.y >= floor_y` holds at all times. While `dragging`, both
/// velocities are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Prop {
    pub id: EntityId,
    pub position: Vec3,
    /// XYZ Euler angles in radians.
    pub rotation: Vec3,
    /// World units per frame.
    pub velocity: Vec3,
    /// Radians per frame, per Euler axis.
    pub angular_velocity: Vec3,
    pub dragging: bool,
    pub spawn: Vec3,
    pub collider: Collider,
    /// `None` while the visual is still loading; the prop is not simulated then.
    pub visual: Option<VisualHandle>,
    pub highlighted: bool,
}

impl Prop {
    /// Spawn heights below the floor are raised onto it.
    pub fn new(spawn: Vec3, floor_y: f32, collider: Collider) -> Self {
        let spawn = Vec3::new(spawn.x, spawn.y.max(floor_y), spawn.z);
        Self {
            id: EntityId::new(),
            position: spawn,
            rotation: Vec3::ZERO,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            dragging: false,
            spawn,
            collider,
            visual: None,
            highlighted: false,
        }
    }

    pub fn with_visual(mut self, visual: VisualHandle) -> Self {
        self.visual = Some(visual);
        self
    }

    pub fn transform(&self) -> Transform {
        Transform::from_position_euler(self.position, self.rotation)
    }

    /// Back to the spawn point, unrotated and at rest.
    pub fn reset(&mut self) {
        self.position = self.spawn;
        self.rotation = Vec3::ZERO;
        self.velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
        self.dragging = false;
    }
}

/// Mesh intersection seam: how far along `ray` the prop's geometry is hit.
pub trait PickTest {
    fn hit(&self, prop: &Prop, ray: &Ray) -> Option<f32>;
}

/// Default pick test against the prop's [`Collider`] at its current position.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColliderPick;

impl PickTest for ColliderPick {
    fn hit(&self, prop: &Prop, ray: &Ray) -> Option<f32> {
        prop.collider.ray_hit(prop.position, ray)
    }
}

/// The pointer ray for this frame plus the camera's view direction, which
/// is the normal of the drag plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerRay {
    pub ray: Ray,
    pub view_dir: Vec3,
}

/// Something that happened to a prop during one update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropEvent {
    Picked,
    Released { velocity: Vec3 },
    /// Floor contact that sent the prop back up.
    Bounced { before: f32, after: f32 },
    /// Floor contact that left the prop at rest.
    Landed,
}

/// Drag, throw and floor-bounce integrator shared by all props.
#[derive(Debug, Clone, PartialEq)]
pub struct PropPhysics {
    pub gravity: f32,
    pub restitution: f32,
    pub friction: f32,
    pub angular_damping: f32,
    pub rest_epsilon: f32,
    pub throw_gain: f32,
    pub max_throw_speed: f32,
    pub max_spin: f32,
    pub floor_y: f32,
    pub half_extent: f32,
}

impl PropPhysics {
    pub fn from_config(props: &PropConfig, world: &WorldConfig) -> Self {
        Self {
            gravity: props.gravity,
            restitution: props.restitution,
            friction: props.friction,
            angular_damping: props.angular_damping,
            rest_epsilon: props.rest_epsilon,
            throw_gain: props.throw_gain,
            max_throw_speed: props.max_throw_speed,
            max_spin: props.max_spin,
            floor_y: world.floor_y,
            half_extent: world.play_area_half_extent,
        }
    }

    /// One frame for one prop. A prop without a visual handle is left untouched.
    pub fn update(
        &self,
        prop: &mut Prop,
        input: &InputState,
        pointer: Option<&PointerRay>,
        picker: &dyn PickTest,
        rng: &mut SplitMix64,
    ) -> Vec<PropEvent> {
        let mut events = Vec::new();
        if prop.visual.is_none() {
            return events;
        }

        if input.pointer_down_edge() && !prop.dragging {
            if let Some(p) = pointer {
                if picker.hit(prop, &p.ray).is_some() {
                    prop.dragging = true;
                    prop.velocity = Vec3::ZERO;
                    prop.angular_velocity = Vec3::ZERO;
                    tracing::debug!(prop = %prop.id.short(), "picked");
                    events.push(PropEvent::Picked);
                }
            }
        }

        if input.pointer_up_edge() && prop.dragging {
            let velocity = self.release(prop, input, rng);
            tracing::debug!(prop = %prop.id.short(), ?velocity, "released");
            events.push(PropEvent::Released { velocity });
        }

        if prop.dragging {
            self.drag(prop, pointer);
        } else if let Some(contact) = self.integrate(prop) {
            events.push(contact);
        }

        prop.position.x = prop.position.x.clamp(-self.half_extent, self.half_extent);
        prop.position.z = prop.position.z.clamp(-self.half_extent, self.half_extent);
        events
    }

    fn drag(&self, prop: &mut Prop, pointer: Option<&PointerRay>) {
        prop.velocity = Vec3::ZERO;
        prop.angular_velocity = Vec3::ZERO;
        let Some(p) = pointer else {
            return;
        };
        let Some(plane) = Plane::from_normal_and_point(p.view_dir, prop.position) else {
            return;
        };
        if let Some(mut hit) = p.ray.intersect_plane(&plane) {
            hit.y = hit.y.max(self.floor_y);
            prop.position = hit;
        }
    }

    /// Throw velocity comes from the pointer delta only; the vertical
    /// component keeps whatever gravity had accumulated.
    fn release(&self, prop: &mut Prop, input: &InputState, rng: &mut SplitMix64) -> Vec3 {
        let delta = input.pointer_delta();
        let mut throw =
            (Vec3::new(delta.x, delta.y, 0.0) * self.throw_gain).clamp_length_max(self.max_throw_speed);
        throw.y = prop.velocity.y;
        prop.velocity = throw;
        prop.angular_velocity = Vec3::new(
            rng.symmetric(self.max_spin),
            rng.symmetric(self.max_spin),
            rng.symmetric(self.max_spin),
        );
        prop.dragging = false;
        throw
    }

    /// Gravity, floor contact and spin for a prop in free flight.
    fn integrate(&self, prop: &mut Prop) -> Option<PropEvent> {
        let mut contact = None;
        // Above the floor counts as moving even at zero velocity: a prop
        // within one gravity step of the floor lands on its first frame.
        let was_moving = prop.velocity.y != 0.0 || prop.position.y > self.floor_y;
        prop.velocity.y += self.gravity;
        prop.position += prop.velocity;

        if prop.position.y <= self.floor_y {
            let before = prop.velocity.y;
            prop.position.y = self.floor_y;
            prop.velocity.y = -prop.velocity.y * self.restitution;
            prop.velocity.x *= self.friction;
            prop.velocity.z *= self.friction;
            prop.angular_velocity *= self.angular_damping;
            if prop.velocity.y.abs() < self.rest_epsilon {
                prop.velocity.y = 0.0;
            }
            if prop.velocity.y > 0.0 {
                contact = Some(PropEvent::Bounced {
                    before,
                    after: prop.velocity.y,
                });
            } else if was_moving {
                contact = Some(PropEvent::Landed);
            }
        }

        prop.rotation += prop.angular_velocity;
        contact
    }
}
