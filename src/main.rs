//! Golf swing kiosk.
//!
//! Watches the camera for a raised hand, then follows the golfer through
//! address, backswing and follow-through, and plays the matching prompts,
//! overlays and videos.

#[cfg(feature = "camera")]
mod camera;
mod config;
mod error;
mod feedback;
mod hand_raise;
#[cfg(feature = "camera")]
mod inference;
mod kiosk;
mod media;
mod overlay;
mod pose;
mod session;
mod source;
mod swing;
mod tracker;
mod voice;

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use feedback::{FeedbackSink, KioskOutputs, LogSink};
use kiosk::Kiosk;
use media::MediaController;
use overlay::OverlayPanels;
use source::{PoseSource, ReplaySource};
use voice::VoicePlayer;

#[derive(Parser, Debug)]
#[command(name = "swing-kiosk")]
#[command(about = "Hand-raise and golf swing detection kiosk")]
struct Args {
    /// Configuration file (defaults are used when it does not exist)
    #[arg(short, long, default_value = "kiosk.toml")]
    config: PathBuf,

    /// Drive the kiosk from a recorded pose file instead of the camera
    #[arg(short, long)]
    replay: Option<PathBuf>,

    /// Write the default configuration to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,

    /// Seed for the result card selection
    #[arg(long)]
    seed: Option<u64>,

    /// Only log feedback commands instead of driving screen, player and voice
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        Config::load(path)
    } else {
        warn!(path = %path.display(), "config not found, using defaults");
        Ok(Config::default())
    }
}

fn open_source(args: &Args, config: &Config) -> Result<Box<dyn PoseSource>> {
    if let Some(path) = &args.replay {
        info!(path = %path.display(), "replaying recorded poses");
        return Ok(Box::new(ReplaySource::open(path)?));
    }

    #[cfg(feature = "camera")]
    {
        Ok(Box::new(source::CameraSource::new(config)?))
    }
    #[cfg(not(feature = "camera"))]
    {
        let _ = config;
        anyhow::bail!("built without the `camera` feature; pass --replay <file>")
    }
}

fn open_outputs(args: &Args, config: &Config) -> Box<dyn FeedbackSink> {
    if args.dry_run {
        return Box::new(LogSink);
    }

    let media = match MediaController::new(&config.media) {
        Ok(media) => Some(media),
        Err(e) => {
            warn!(error = %e, "media player unavailable, videos disabled");
            None
        }
    };
    Box::new(KioskOutputs {
        overlays: OverlayPanels::new(&config.overlay.assets_dir),
        media,
        voice: VoicePlayer::new(&config.voice),
    })
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Some(path) = &args.write_config {
        Config::default().save(path)?;
        info!(path = %path.display(), "default config written");
        return Ok(());
    }

    info!("swing kiosk starting");
    let config = load_config(&args.config)?;

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut source = open_source(&args, &config)?;
    let mut outputs = open_outputs(&args, &config);
    let mut kiosk = Kiosk::new(&config, rng, Instant::now());

    for command in kiosk.startup_commands() {
        outputs.dispatch(&command);
    }

    let interval = config.tick_interval();
    let mut deadline = Instant::now();
    let mut ticks: u64 = 0;

    while let Some(input) = source.next_frame()? {
        if let Some((width, height)) = source.frame_size() {
            kiosk.set_frame_size(width, height);
        }
        for command in kiosk.tick(input, Instant::now()) {
            outputs.dispatch(&command);
        }
        ticks += 1;

        // Late ticks are not made up for; the schedule restarts from now.
        deadline += interval;
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        } else {
            deadline = now;
        }
    }

    info!(ticks, state = kiosk.state().name(), "frame source exhausted, shutting down");
    Ok(())
}
