use std::path::PathBuf;

use clap::{Parser, Subcommand};
use glam::{Vec2, Vec3};
use tracing_subscriber::EnvFilter;

use meadow_anim::Mixer;
use meadow_common::SceneConfig;
use meadow_input::{Action, InputEvent, InputState, Key};
use meadow_kernel::{Scene, SceneEvent};
use meadow_render::{DebugTextRenderer, RenderView, Renderer};
use meadow_tools::SceneInspector;

const DT: f32 = 1.0 / 60.0;

#[derive(Parser)]
#[command(name = "meadow", about = "Headless driver for the meadow scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version, default bindings and scene contents
    Info,
    /// Run a scripted session: walk, turn, throw a prop, talk to the NPC
    Demo {
        /// Number of frames to simulate
        #[arg(short, long, default_value = "600")]
        frames: u64,
        /// RNG seed (overrides the config file)
        #[arg(short, long)]
        seed: Option<u64>,
        /// Scene config (.yaml, .yml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print a debug frame every N frames (0 prints only the last)
        #[arg(long, default_value = "120")]
        every: u64,
        /// Emit the final snapshot and event tally as JSON
        #[arg(long)]
        json: bool,
    },
    /// Drop a single prop and report how it settles
    Drop {
        /// Height above the floor
        #[arg(long, default_value = "5.0")]
        height: f32,
        /// Give up after this many frames
        #[arg(long, default_value = "1000")]
        max_frames: u64,
    },
    /// Print a scene config as YAML (the defaults unless a file is given)
    Config {
        /// Config file to validate and print
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => info()?,
        Commands::Demo {
            frames,
            seed,
            config,
            every,
            json,
        } => {
            let mut config = load_config(config)?;
            if let Some(seed) = seed {
                config.seed = seed;
            }
            demo(config, frames, every, json)?;
        }
        Commands::Drop { height, max_frames } => drop_test(height, max_frames)?,
        Commands::Config { config } => print!("{}", load_config(config)?.to_yaml_string()?),
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<SceneConfig> {
    Ok(match path {
        Some(path) => SceneConfig::load(&path)?,
        None => SceneConfig::default(),
    })
}

fn info() -> anyhow::Result<()> {
    let scene = Scene::new(SceneConfig::default())?;
    println!("meadow v{}", env!("CARGO_PKG_VERSION"));
    println!("{}", SceneInspector::summary(&scene));
    for (id, _) in SceneInspector::list_entities(&scene) {
        if let Some(entity) = SceneInspector::inspect_entity(&scene, id) {
            println!("  {entity}");
        }
    }
    println!("bindings:");
    for action in Action::ALL {
        let keys: Vec<String> = scene
            .bindings()
            .keys(action)
            .iter()
            .map(Key::to_string)
            .collect();
        println!("  {action:?}: {}", keys.join(", "));
    }
    Ok(())
}

/// Frame-indexed input cues for the demo session.
#[derive(Default)]
struct DemoScript {
    grab: Option<Vec2>,
}

impl DemoScript {
    fn cue(&mut self, frame: u64, scene: &mut Scene, input: &mut InputState) -> anyhow::Result<()> {
        match frame {
            1 => input.apply(InputEvent::KeyDown(Key::char('z'))),
            60 => {
                input.apply(InputEvent::KeyUp(Key::char('z')));
                input.apply(InputEvent::KeyDown(Key::char('q')));
            }
            90 => {
                input.apply(InputEvent::KeyUp(Key::char('q')));
                // Stand south of the props so the camera looks at them.
                scene.place_agent(Vec3::new(4.0, 0.0, -9.0), 0.0)?;
            }
            150 => {
                self.grab = scene
                    .props()
                    .filter(|p| p.visual.is_some())
                    .filter_map(|p| scene.camera().project(p.position))
                    .find(|ndc| ndc.abs().max_element() <= 1.0);
                match self.grab {
                    Some(ndc) => input.apply(InputEvent::PointerDown(ndc)),
                    None => tracing::warn!("no prop in view to grab"),
                }
            }
            151..=160 => {
                if let Some(grab) = self.grab {
                    let k = (frame - 150) as f32;
                    input.apply(InputEvent::PointerMoved(grab + Vec2::new(-0.01, 0.02) * k));
                }
            }
            161 => {
                if let Some(grab) = self.grab.take() {
                    input.apply(InputEvent::PointerUp(grab + Vec2::new(-0.12, 0.25)));
                }
            }
            220 => scene.place_agent(Vec3::new(4.0, 0.0, 3.5), 0.5)?,
            221 => input.apply(InputEvent::KeyDown(Key::char('f'))),
            222 => input.apply(InputEvent::KeyUp(Key::char('f'))),
            520 => input.apply(InputEvent::KeyDown(Key::char('r'))),
            521 => input.apply(InputEvent::KeyUp(Key::char('r'))),
            _ => {}
        }
        Ok(())
    }
}

fn demo(config: SceneConfig, frames: u64, every: u64, json: bool) -> anyhow::Result<()> {
    let agent_clips = Mixer::new()
        .with_clip(&config.agent.idle_clip, 1.6)
        .with_clip(&config.agent.walk_clip, 0.8);
    let npc_clips = Mixer::new()
        .with_clip(&config.npc.idle_clip, 2.0)
        .with_clip(&config.npc.interact_clip, 1.2);

    let mut scene = Scene::new(config)?;
    scene.attach_agent_clips(Box::new(agent_clips));
    scene.attach_npc_clips(Box::new(npc_clips));
    tracing::info!(frames, seed = scene.config().seed, "demo started");

    let renderer = DebugTextRenderer::new();
    let view = RenderView::default();
    let mut input = InputState::new();
    let mut script = DemoScript::default();
    let mut log = Vec::new();

    for frame in 1..=frames {
        script.cue(frame, &mut scene, &mut input)?;
        scene.step(&mut input, DT);
        for event in scene.drain_events() {
            match &event {
                SceneEvent::DialogueStarted { line, .. } => {
                    tracing::info!(frame, %line, "npc speaks");
                }
                SceneEvent::PropReleased { velocity, .. } => {
                    tracing::info!(frame, ?velocity, "prop thrown");
                }
                _ => {}
            }
            log.push(event);
        }
        let last = frame == frames;
        if !json && (last || (every > 0 && frame % every == 0)) {
            print!("{}", renderer.render(&scene.snapshot(), &view));
        }
    }

    let tally = SceneInspector::tally(&log);
    if json {
        let out = serde_json::json!({
            "snapshot": scene.snapshot(),
            "events": tally,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", SceneInspector::summary(&scene));
        for (kind, count) in &tally {
            println!("  {kind}: {count}");
        }
    }
    Ok(())
}

fn drop_test(height: f32, max_frames: u64) -> anyhow::Result<()> {
    let mut config = SceneConfig::default();
    config.props.spawns = vec![Vec3::new(0.0, config.world.floor_y + height, 0.0)];
    let mut scene = Scene::without_agent(config)?;
    let Some(id) = scene.props().next().map(|p| p.id) else {
        anyhow::bail!("drop scene has no prop");
    };

    if height <= 0.0 {
        println!("settled after 0 frames at y={:.3} with 0 bounces", scene.prop(id)?.position.y);
        return Ok(());
    }

    let mut input = InputState::new();
    let mut bounces = Vec::new();
    for frame in 1..=max_frames {
        scene.step(&mut input, DT);
        for event in scene.drain_events() {
            match event {
                SceneEvent::PropBounced { rebound, .. } => bounces.push(rebound),
                SceneEvent::PropLanded { position, .. } => {
                    println!(
                        "settled after {frame} frames at y={:.3} with {} bounces",
                        position.y,
                        bounces.len()
                    );
                    for (i, rebound) in bounces.iter().enumerate() {
                        println!("  bounce {}: rebound {rebound:.4}", i + 1);
                    }
                    return Ok(());
                }
                _ => {}
            }
        }
    }
    let prop = scene.prop(id)?;
    anyhow::bail!(
        "prop did not settle within {max_frames} frames (y={:.3}, vy={:.4})",
        prop.position.y,
        prop.velocity.y
    )
}
