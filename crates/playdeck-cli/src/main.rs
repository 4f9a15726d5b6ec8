//! Playdeck CLI - Terminal Video Player Screen
//!
//! Features:
//! - Play an HLS stream on the headless backend with a live progress line
//! - Keyboard gestures for play/pause, seek, mute and bitrate cap
//! - Manifest probing (variant ladder, duration)

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;
mod screen;

/// Stream played when no URL is given
const SAMPLE_STREAM: &str = "http://amssamples.streaming.mediaservices.windows.net/634cd01c-6822-4630-8444-8dd6279f94c6/CaminandesLlamaDrama4K.ism/manifest(format=m3u8-aapl)";

/// Playdeck CLI - Streaming video player
#[derive(Parser)]
#[command(name = "playdeck")]
#[command(version)]
#[command(about = "Streaming video player and HLS probe", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json, table)
    #[arg(short, long, default_value = "text", global = true)]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a stream with an interactive screen
    Play {
        /// URL of the HLS manifest
        #[arg(env = "PLAYDECK_STREAM_URL", default_value = SAMPLE_STREAM)]
        url: String,

        /// Player configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Preferred peak bitrate in bits per second (0 = no cap)
        #[arg(long)]
        peak_bitrate: Option<f64>,

        /// Start muted
        #[arg(long)]
        muted: bool,

        /// Do not observe audio interruptions
        #[arg(long)]
        no_interruptions: bool,

        /// Mix with other apps' audio
        #[arg(long)]
        mix_with_others: bool,
    },

    /// Resolve a manifest and show its variant ladder
    Probe {
        /// URL of the HLS manifest
        #[arg(env = "PLAYDECK_STREAM_URL", default_value = SAMPLE_STREAM)]
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing on stderr, away from the screen line
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    playdeck_core::init();

    match cli.command {
        Commands::Play {
            url,
            config,
            peak_bitrate,
            muted,
            no_interruptions,
            mix_with_others,
        } => {
            let options = commands::PlayOptions {
                url,
                config,
                peak_bitrate,
                muted,
                no_interruptions,
                mix_with_others,
            };
            commands::play(options).await?;
        }
        Commands::Probe { url } => {
            commands::probe(&url, &cli.format).await?;
        }
    }

    Ok(())
}
