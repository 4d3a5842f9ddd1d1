use anyhow::{Context, Result, bail};
use bevy_ecs::prelude::*;
use bevy_math::Vec3;
use bevy_time::Time;
use clap::Parser;
use std::path::PathBuf;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use common::{
    components::{Billboard, Bullet, Position},
    config::SceneConfig,
    gpu::{CommandRecorder, ShaderHandle, TextureHandle},
    resources::{PlayerInput, Terrains},
    spawning::spawn_player_with_camera,
    systems::update_schedule,
};

mod autopilot;
mod headless;

use autopilot::Autopilot;
use headless::HeadlessProvider;

const TERRAIN_SHADER: ShaderHandle = ShaderHandle(1);
const WIREFRAME_SHADER: ShaderHandle = ShaderHandle(2);
const TERRAIN_TEXTURE: TextureHandle = TextureHandle(1);

// ============================================================================
// CLI Argument Parsing
// ============================================================================

#[derive(Parser)]
#[command(author, version, about = "Headless terrain ground-following demo", long_about = None)]
struct Args {
    // Scene description (JSON); the stock scene is used when absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    // Headerless 8-bit .raw height map for the first terrain
    #[arg(long)]
    heightmap: Option<PathBuf>,

    // Number of frames to simulate
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    // Frame rate of the update loop
    #[arg(long, default_value_t = 60)]
    hz: u64,

    // Fire a bullet every N frames (0 disables firing)
    #[arg(long, default_value_t = 45)]
    fire_every: u64,

    // Render terrains with the wireframe shader
    #[arg(long, default_value_t = false)]
    wireframe: bool,

    // Flip between the solid and wireframe shader every N frames
    #[arg(long)]
    toggle_wireframe_every: Option<u64>,

    // Cap on vertex buffer bytes the headless provider will allocate
    #[arg(long)]
    gpu_budget: Option<usize>,

    // Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

// ============================================================================
// Scene Setup
// ============================================================================

#[cfg(feature = "json")]
fn load_config(path: Option<&std::path::Path>) -> Result<SceneConfig> {
    let mut config = match path {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };
    config.fill_defaults();
    Ok(config)
}

#[cfg(not(feature = "json"))]
fn load_config(path: Option<&std::path::Path>) -> Result<SceneConfig> {
    if let Some(path) = path {
        bail!("cannot read {}: built without the json feature", path.display());
    }
    let mut config = SceneConfig::default();
    config.fill_defaults();
    Ok(config)
}

fn build_terrains(config: &SceneConfig) -> Result<Terrains> {
    let terrains = config
        .terrains
        .iter()
        .enumerate()
        .map(|(index, terrain)| {
            terrain
                .build(TERRAIN_SHADER, TERRAIN_TEXTURE)
                .with_context(|| format!("Failed to build terrain {index}"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Terrains(terrains))
}

fn set_terrain_shader(world: &mut World, shader: ShaderHandle) {
    for terrain in &mut world.resource_mut::<Terrains>().0 {
        terrain.set_shader(shader);
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.hz == 0 {
        bail!("--hz must be positive");
    }

    let mut config = load_config(args.config.as_deref())?;
    if let (Some(heightmap), Some(terrain)) = (args.heightmap, config.terrains.first_mut()) {
        terrain.heightmap = Some(heightmap);
    }

    let terrains = build_terrains(&config)?;
    let Some(first) = terrains.0.first() else {
        bail!("scene has no terrains");
    };
    let start = first.position()
        + Vec3::new(
            first.width() as f32 * first.scale().x * 0.5,
            0.0,
            first.length() as f32 * first.scale().z * 0.5,
        );
    info!(terrains = terrains.0.len(), ?start, "scene built");

    let mut world = World::new();
    world.insert_resource(Time::<()>::default());
    world.insert_resource(terrains);
    world.insert_resource(PlayerInput::default());
    let (player, _camera) = spawn_player_with_camera(&mut world, &config, start);
    world.insert_resource(config);

    let mut provider = HeadlessProvider::with_budget(args.gpu_budget);
    let uploaded: usize = world
        .resource_mut::<Terrains>()
        .0
        .iter_mut()
        .map(|terrain| terrain.upload(&mut provider))
        .sum();
    info!(uploaded, bytes = provider.allocated(), "terrain blocks uploaded");

    let mut wireframe = args.wireframe;
    if wireframe {
        set_terrain_shader(&mut world, WIREFRAME_SHADER);
    }

    let mut schedule = update_schedule();
    let autopilot = Autopilot {
        fire_every: args.fire_every,
    };
    let mut recorder = CommandRecorder::default();

    // Run the scene in a loop at `hz` frames per second
    let tick_duration = Duration::from_nanos(1_000_000_000 / args.hz);
    let mut interval = time::interval(tick_duration);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(ticks = args.ticks, hz = args.hz, "starting frame loop...");

    for frame in 0..args.ticks {
        interval.tick().await;
        let update_start = Instant::now();

        if args.toggle_wireframe_every.is_some_and(|every| every > 0 && frame > 0 && frame % every == 0) {
            wireframe = !wireframe;
            set_terrain_shader(&mut world, if wireframe { WIREFRAME_SHADER } else { TERRAIN_SHADER });
            debug!(frame, wireframe, "terrain shader swapped");
        }

        *world.resource_mut::<PlayerInput>() = autopilot.input(frame, tick_duration.as_secs_f32());
        world.resource_mut::<Time>().advance_by(tick_duration);
        schedule.run(&mut world);

        recorder.clear();
        for terrain in &world.resource::<Terrains>().0 {
            terrain.render(&mut recorder);
        }

        // Staging data is only needed until the first frame has been submitted
        if frame == 0 {
            world
                .resource_mut::<Terrains>()
                .0
                .iter_mut()
                .for_each(|terrain| terrain.release_upload_buffers(&mut provider));
        }

        let update_elapsed = update_start.elapsed();
        if update_elapsed > tick_duration {
            warn!(
                "tick {} took {:.2}ms (exceeded {:.2}ms budget)",
                frame,
                update_elapsed.as_secs_f64() * 1000.0,
                tick_duration.as_secs_f64() * 1000.0
            );
        }

        if frame % args.hz == 0 {
            let pos = world.get::<Position>(player).map(|pos| pos.0);
            debug!(frame, ?pos, draws = recorder.draw_count(), "frame");
        }
    }

    let bullets = world.query::<&Bullet>().iter(&world).count();
    let billboards = world.query::<&Billboard>().iter(&world).count();
    let pos = world.get::<Position>(player).map(|pos| pos.0);
    info!(
        ?pos,
        bullets,
        billboards,
        draws = recorder.draw_count(),
        resident_buffers = provider.resident(),
        pending_uploads = provider.pending(),
        "simulation finished"
    );

    Ok(())
}
