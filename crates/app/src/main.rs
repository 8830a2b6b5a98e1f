use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use particle_overlay_core::{
    profile, EffectKind, LayerPhase, NullVisualizerTap, OverlayCompositor, OverlayConfig,
};
use tracing_subscriber::EnvFilter;

fn main() -> particle_overlay_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Demo {
            effect,
            frames,
            width,
            height,
            count,
            seed,
            json,
        } => run_demo(&effect, frames, width, height, count, seed, json.as_deref()),
        Commands::Holiday { date } => run_holiday(date),
        Commands::Effects => run_effects(),
    }
}

/// Drives the compositor headless for a number of frames and reports what
/// it produced, optionally dumping the final frame's draw stream as JSON.
fn run_demo(
    effect: &str,
    frames: u32,
    width: f32,
    height: f32,
    count: Option<usize>,
    seed: Option<u64>,
    json: Option<&std::path::Path>,
) -> particle_overlay_core::Result<()> {
    tracing::info!(effect, frames, width, height, "starting headless demo");

    let config = OverlayConfig {
        enabled: true,
        effect: effect.to_string(),
        particle_count: count,
        seed,
        ..OverlayConfig::default()
    };
    let mut compositor = OverlayCompositor::new(&config, Box::new(NullVisualizerTap));
    compositor.set_viewport(width, height);
    compositor.observe_date(Local::now().date_naive());

    let step = 1.0 / config.steps_per_second;
    let mut frame = compositor.frame(step);
    for _ in 1..frames {
        frame = compositor.frame(step);
    }

    tracing::info!(
        draw_ops = frame.len(),
        player_particles = compositor.player_particle_count(),
        seasonal_particles = compositor.seasonal_particle_count(),
        running = compositor.player_phase() == LayerPhase::Running,
        "demo finished"
    );

    if let Some(path) = json {
        std::fs::write(path, serde_json::to_string_pretty(&frame)?)?;
        tracing::info!(?path, "final frame exported");
    }

    compositor.deactivate();
    Ok(())
}

fn run_holiday(date: Option<NaiveDate>) -> particle_overlay_core::Result<()> {
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let mode = particle_overlay_core::resolve_holiday(date);
    println!("{date}: {mode:?}");
    Ok(())
}

fn run_effects() -> particle_overlay_core::Result<()> {
    for kind in EffectKind::PLAYER_EFFECTS {
        let profile = profile(kind).expect("player effects always have a profile");
        println!(
            "{:<10} count={:<4} reactive={:<5} motion={:?}",
            kind.id(),
            profile.default_count,
            profile.audio_reactive,
            profile.motion
        );
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Decorative particle overlay driver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run an effect headless for a number of frames.
    Demo {
        /// Effect identifier (snow, rain, sakura, ...). Unknown ids render nothing.
        #[arg(short, long, default_value = "snow")]
        effect: String,
        /// Number of frames to simulate.
        #[arg(short, long, default_value_t = 120)]
        frames: u32,
        /// Viewport width in device-independent units.
        #[arg(long, default_value_t = 1080.0)]
        width: f32,
        /// Viewport height in device-independent units.
        #[arg(long, default_value_t = 1920.0)]
        height: f32,
        /// Particle count override (defaults to the catalog's per-effect count).
        #[arg(short, long)]
        count: Option<usize>,
        /// Seed for reproducible runs.
        #[arg(short, long)]
        seed: Option<u64>,
        /// Write the final frame's draw stream to this JSON file.
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Resolve the seasonal overlay mode for a date.
    Holiday {
        /// Date to resolve (YYYY-MM-DD); defaults to today.
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// List the effect catalog.
    Effects,
}
