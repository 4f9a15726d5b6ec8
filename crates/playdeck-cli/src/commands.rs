//! CLI command implementations

use crate::output::{format_bitrate, format_manifest, OutputFormat};
use crate::screen::PlaybackScreen;
use anyhow::{bail, Context};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use playdeck_core::headless::{HeadlessPlatform, HlsManifest};
use playdeck_core::{configure_audio_session, InterruptionPhase, PlaybackEvent, PlayerConfig, PlayerFacade};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use url::Url;

/// Resolution of the progress bar
const BAR_STEPS: u64 = 1_000;

const HELP: &str = "keys: p play/pause  f +15s  b -15s  s <0..1> seek  m mute  c <bps> cap  i interrupt  q quit";

pub struct PlayOptions {
    pub url: String,
    pub config: Option<PathBuf>,
    pub peak_bitrate: Option<f64>,
    pub muted: bool,
    pub no_interruptions: bool,
    pub mix_with_others: bool,
}

impl PlayOptions {
    /// Config file (or defaults) with command-line overrides applied
    fn player_config(&self) -> anyhow::Result<PlayerConfig> {
        let mut config = match &self.config {
            Some(path) => PlayerConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
            None => PlayerConfig::default(),
        };
        if let Some(peak) = self.peak_bitrate {
            config.preferred_peak_bit_rate = peak;
        }
        if self.no_interruptions {
            config.observe_interruptions = false;
        }
        if self.mix_with_others {
            config.audio_session.mix_with_others = true;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Play a stream on the headless backend
pub async fn play(options: PlayOptions) -> anyhow::Result<()> {
    let config = options.player_config()?;
    let platform = Arc::new(HeadlessPlatform::new()?);

    // Process-wide, once, before any facade exists
    if let Err(e) = configure_audio_session(platform.audio_session(), &config.audio_session) {
        warn!(error = %e, "Audio session not configured");
    }

    let (facade, mut events) = PlayerFacade::spawn(platform.clone(), config)?;
    let session = facade.load(&options.url)?;
    info!(session_id = %session, url = %options.url, "Playback requested");

    let bar = ProgressBar::new(BAR_STEPS);
    bar.set_style(
        ProgressStyle::with_template("{prefix} {msg} [{bar:40.magenta/blue}]")?.progress_chars("=> "),
    );
    bar.println(style(HELP).dim().to_string());

    let mut screen = PlaybackScreen::default();
    let mut interrupted = false;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut failure = None;
    let mut stdin_open = true;

    render(&bar, &screen);
    loop {
        tokio::select! {
            event = events.next() => {
                let Some(event) = event else { break };
                match event {
                    PlaybackEvent::Ready { .. } => {
                        screen.on_ready();
                        if options.muted {
                            facade.set_muted(true);
                        }
                        bar.println(format!("{} {}", style("Ready").green().bold(), options.url));
                    }
                    PlaybackEvent::Failed { reason, .. } => {
                        failure = Some(reason);
                        break;
                    }
                    PlaybackEvent::ProgressTick { current, total } => screen.on_progress(current, total),
                    PlaybackEvent::BitrateSample { indicated, observed } => {
                        bar.println(format!(
                            "{} indicated {} observed {}",
                            style("Bitrate").cyan(),
                            format_bitrate(indicated),
                            format_bitrate(observed)
                        ));
                    }
                    PlaybackEvent::Interrupted(phase) => {
                        bar.println(format!("{} {:?}", style("Interruption").yellow(), phase));
                    }
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(line) => {
                        if !gesture(line.trim(), &facade, &platform, &mut screen, &mut interrupted) {
                            break;
                        }
                    }
                    // Keep playing until ctrl-c
                    None => stdin_open = false,
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
        screen.set_playing(facade.snapshot().is_playing);
        render(&bar, &screen);
    }

    bar.finish_and_clear();
    facade.shutdown().await?;

    if let Some(reason) = failure {
        bail!("{} ({})", reason, reason.error_code());
    }
    Ok(())
}

/// Apply one line of keyboard input; returns false to quit
fn gesture(
    input: &str,
    facade: &PlayerFacade,
    platform: &HeadlessPlatform,
    screen: &mut PlaybackScreen,
    interrupted: &mut bool,
) -> bool {
    let mut parts = input.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("q"), _) => return false,
        (Some("p"), _) => {
            if facade.snapshot().is_playing {
                facade.pause();
            } else {
                facade.play();
            }
        }
        (Some("f"), _) => facade.seek_forward(),
        (Some("b"), _) => facade.seek_backward(),
        (Some("m"), _) => facade.set_muted(!facade.snapshot().is_muted),
        (Some("s"), Some(value)) => match value.parse::<f64>() {
            Ok(fraction) => {
                screen.begin_drag();
                if let Some(target) = screen.end_drag(fraction) {
                    facade.seek_to(target);
                }
            }
            Err(_) => warn!(input, "Seek fraction must be a number"),
        },
        (Some("c"), Some(value)) => match value.parse::<f64>() {
            Ok(bps) => {
                if let Err(e) = facade.set_preferred_peak_bit_rate(bps) {
                    warn!(error = %e, "Bitrate cap rejected");
                }
            }
            Err(_) => warn!(input, "Bitrate cap must be a number"),
        },
        (Some("i"), _) => {
            *interrupted = !*interrupted;
            platform.interrupt(if *interrupted {
                InterruptionPhase::Began
            } else {
                InterruptionPhase::Ended
            });
        }
        (None, _) => {}
        _ => warn!(input, "Unknown command; {}", HELP),
    }
    true
}

fn render(bar: &ProgressBar, screen: &PlaybackScreen) {
    bar.set_prefix(screen.icon());
    bar.set_message(format!("{} / {}", screen.elapsed_label(), screen.total_label()));
    bar.set_position((screen.fraction() * BAR_STEPS as f64).round() as u64);
}

/// Resolve a manifest and print its variant ladder
pub async fn probe(manifest_url: &str, format: &str) -> anyhow::Result<()> {
    let url = Url::parse(manifest_url)?;
    let platform = HeadlessPlatform::new()?;
    let manifest = HlsManifest::fetch(platform.client(), &url).await?;

    println!("{}", format_manifest(&manifest, OutputFormat::from(format)));
    Ok(())
}
