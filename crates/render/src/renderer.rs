use std::fmt::Write;

use glam::{Vec2, Vec3};
use meadow_kernel::{CameraView, FrameSnapshot, InteractionState};

/// Viewport the snapshot is presented in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    pub width: u32,
    pub height: u32,
    /// World-space lift of the dialogue label above the NPC's origin.
    pub label_height: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            label_height: 2.0,
        }
    }
}

impl RenderView {
    /// Pixel coordinates (origin top-left) of a world point, if it is in front of the camera.
    pub fn to_screen(&self, camera: &CameraView, point: Vec3) -> Option<Vec2> {
        let ndc = camera.project(point)?;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.width as f32,
            (1.0 - ndc.y) * 0.5 * self.height as f32,
        ))
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer consumes a published snapshot and produces output. It never
/// sees the scene itself.
pub trait Renderer {
    type Output;

    fn render(&self, frame: &FrameSnapshot, view: &RenderView) -> Self::Output;
}

/// Plain-text renderer for the CLI, logs and tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    /// Also list velocities and clips.
    pub verbose: bool,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbose() -> Self {
        Self { verbose: true }
    }
}

fn v3(v: Vec3) -> String {
    format!("({:.2}, {:.2}, {:.2})", v.x, v.y, v.z)
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, frame: &FrameSnapshot, view: &RenderView) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Frame {} ===", frame.frame);

        match &frame.agent {
            Some(agent) => {
                let _ = write!(
                    out,
                    "Agent [{}] pos={} yaw={:.2} {:?}",
                    agent.id.short(),
                    v3(agent.transform.position),
                    agent.yaw,
                    agent.state
                );
                if self.verbose {
                    let _ = write!(out, " clip={}", agent.clip.as_deref().unwrap_or("-"));
                }
                out.push('\n');
            }
            None => out.push_str("Agent: (loading)\n"),
        }

        let cam = &frame.camera;
        let _ = writeln!(
            out,
            "Camera: eye={} target={} fov={:.0}",
            v3(cam.eye),
            v3(cam.target),
            cam.fov_degrees
        );

        let _ = writeln!(out, "Props: {}", frame.props.len());
        for prop in &frame.props {
            let mut flags = Vec::new();
            if prop.dragging {
                flags.push("dragging");
            }
            if prop.highlighted {
                flags.push("highlighted");
            }
            if !prop.loaded {
                flags.push("loading");
            }
            let _ = write!(
                out,
                "  [{}] pos={}",
                prop.id.short(),
                v3(prop.transform.position)
            );
            if self.verbose {
                let _ = write!(out, " vel={}", v3(prop.velocity));
            }
            if !flags.is_empty() {
                let _ = write!(out, " {}", flags.join(","));
            }
            out.push('\n');
        }

        let npc = &frame.npc;
        let _ = write!(
            out,
            "NPC [{}] {:?}{}",
            npc.id.short(),
            npc.state,
            if npc.near { " near" } else { "" }
        );
        if self.verbose {
            let _ = write!(out, " clip={}", npc.clip.as_deref().unwrap_or("-"));
        }
        out.push('\n');
        if npc.state == InteractionState::Speaking {
            if let Some(line) = &npc.line {
                let anchor = npc.transform.position + Vec3::Y * view.label_height;
                let _ = write!(out, "  says \"{line}\" opacity={:.2}", npc.opacity);
                if let Some(px) = view.to_screen(cam, anchor) {
                    let _ = write!(out, " at ({:.0}, {:.0})px", px.x, px.y);
                }
                out.push('\n');
            }
        }

        tracing::trace!(frame = frame.frame, bytes = out.len(), "rendered debug text");
        out
    }
}
