mod config;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use deepfield_common::SplitMix64;
use deepfield_kernel::{EntityDesc, KinematicBackend, World};
use deepfield_view::{
    DebugTextRenderer, RenderView, Renderer, ViewCompressor, Viewpoint, apply_view,
};
use glam::{DVec3, Vec3};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "deepfield-cli", about = "Inspect and exercise a floating-origin world")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON config file (world and view settings)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions and the effective configuration
    Info,
    /// Scatter bodies across a huge volume and step them
    Simulate {
        /// Number of bodies to spawn
        #[arg(short, long, default_value = "200")]
        entities: usize,
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "50")]
        ticks: u64,
        /// RNG seed for the scatter
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Half-extent of the scatter volume on each axis
        #[arg(long, default_value = "1e12")]
        spread: f64,
    },
    /// Render bodies at increasing distance through the view compressor
    View {
        /// Farthest body distance from the viewpoint
        #[arg(short, long, default_value = "80000")]
        distance: f64,
        /// Number of bodies placed along the view axis
        #[arg(short, long, default_value = "8")]
        entities: usize,
        /// Also list hidden bodies
        #[arg(long)]
        show_hidden: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Info => {
            println!("deepfield-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("partition: {}", deepfield_partition::crate_info());
            println!("kernel: {}", deepfield_kernel::crate_info());
            println!("view: {}", deepfield_view::crate_info());
            println!(
                "config: {}",
                serde_json::to_string_pretty(&config).context("serializing config")?
            );
        }
        Commands::Simulate {
            entities,
            ticks,
            seed,
            spread,
        } => simulate(&config, entities, ticks, seed, spread)?,
        Commands::View {
            distance,
            entities,
            show_hidden,
        } => view(&config, distance, entities, show_hidden)?,
    }

    Ok(())
}

fn simulate(
    config: &AppConfig,
    entities: usize,
    ticks: u64,
    seed: u64,
    spread: f64,
) -> anyhow::Result<()> {
    println!("Simulate: entities={entities}, ticks={ticks}, seed={seed}, spread={spread:e}");

    let mut world = World::create(config.world, KinematicBackend::default())
        .context("creating world")?;
    let mut rng = SplitMix64::new(seed);
    let mut starts = Vec::with_capacity(entities);
    for _ in 0..entities {
        let position = DVec3::new(
            rng.range(-spread, spread),
            rng.range(-spread, spread),
            rng.range(-spread, spread),
        );
        let velocity = Vec3::new(
            rng.range(-5.0, 5.0) as f32,
            rng.range(-5.0, 5.0) as f32,
            rng.range(-5.0, 5.0) as f32,
        );
        let radius = rng.range(0.5, 20.0) as f32;
        let id = world.spawn(
            EntityDesc::body(position)
                .with_radius(radius)
                .with_velocity(velocity),
        )?;
        starts.push((id, position, velocity));
    }

    let mut overflowed = 0;
    let mut last = None;
    for _ in 0..ticks {
        let report = world.step()?;
        if report.overflowed() {
            overflowed += 1;
        }
        last = Some(report);
    }

    if let Some(report) = &last {
        println!(
            "Last tick: tick={}, interactable={}, groups={}, synced={}",
            report.tick, report.interactable, report.groups, report.synced
        );
        if let Some(pack) = &report.pack {
            println!("Packing: rows={}, overflowed_groups={}", pack.rows, pack.overflowed_groups);
        }
    }
    println!(
        "Ticks overflowed: {overflowed}/{ticks}, avg tick: {:?}, max tick: {:?}",
        world.tick_timer().average(),
        world.tick_timer().max()
    );

    // Expected travel is velocity * elapsed time; report the worst deviation.
    let elapsed = f64::from(config.world.fixed_dt) * ticks as f64;
    let mut worst = 0.0_f64;
    for (id, start, velocity) in &starts {
        if let Some(entity) = world.get(*id) {
            let expected = *start + velocity.as_dvec3() * elapsed;
            worst = worst.max((entity.position() - expected).length());
        }
    }
    println!("Worst deviation from expected travel: {worst:.6}");

    world.shutdown();
    Ok(())
}

fn view(config: &AppConfig, distance: f64, entities: usize, show_hidden: bool) -> anyhow::Result<()> {
    let mut world = World::create(config.world, KinematicBackend::default())
        .context("creating world")?;
    let compressor = ViewCompressor::new_or_unconfigured(config.view)?;

    let eye_anchor = world.spawn(EntityDesc::body(DVec3::new(4.2e12, -1.0e9, 7.0e11)).inert())?;
    let rig = world.spawn(EntityDesc::view_anchored(DVec3::ZERO))?;

    let anchor_position = world
        .get(eye_anchor)
        .map(|e| e.position())
        .context("anchor entity vanished")?;
    let count = entities.max(1);
    for i in 1..=count {
        let d = distance * i as f64 / count as f64;
        world.spawn(EntityDesc::body(anchor_position + DVec3::new(d, 0.0, 0.0)).inert())?;
    }

    let viewpoint = Viewpoint::follow(eye_anchor);
    let eye = viewpoint.sync_rig(&mut world, rig)?;
    let stats = apply_view(&mut world, &compressor, eye);

    let renderer = DebugTextRenderer { show_hidden };
    print!("{}", renderer.render(&world, &RenderView { eye, stats }));

    world.shutdown();
    Ok(())
}
