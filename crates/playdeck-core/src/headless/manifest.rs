//! HLS manifest loading for the headless backend
//!
//! Only what the backend needs to decide playability and duration:
//! - Multivariant playlists (variant ladder)
//! - Media playlists (total duration, live detection)

use crate::{Error, Result};
use m3u8_rs::{MasterPlaylist, MediaPlaylist, Playlist};
use reqwest::Client;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};
use url::Url;

/// One entry of a multivariant playlist
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variant {
    /// Peak bandwidth in bits per second
    pub bandwidth: u64,
    /// `WIDTHxHEIGHT`, if advertised
    pub resolution: Option<String>,
    /// Media playlist URI
    pub uri: Url,
}

/// Timeline facts from a media playlist
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MediaTimeline {
    /// Sum of segment durations; `None` for live playlists
    pub duration: Option<Duration>,
    pub is_live: bool,
    pub segments: usize,
}

/// Top-level playlist content
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Presentation {
    Multivariant { variants: Vec<Variant> },
    Media(MediaTimeline),
}

/// A fetched and parsed top-level playlist
#[derive(Debug, Clone, Serialize)]
pub struct HlsManifest {
    pub url: Url,
    pub presentation: Presentation,
    /// Size of the playlist body
    pub bytes: usize,
    /// Time spent fetching the body
    pub fetch_time: Duration,
}

impl HlsManifest {
    /// Fetch and parse the playlist at `url`
    #[instrument(skip(client))]
    pub async fn fetch(client: &Client, url: &Url) -> Result<Self> {
        let start = Instant::now();
        let body = fetch_body(client, url).await?;
        let fetch_time = start.elapsed();

        let presentation = parse_presentation(url, &body)?;
        debug!(bytes = body.len(), fetch_ms = fetch_time.as_millis(), "Playlist fetched");

        Ok(Self {
            url: url.clone(),
            presentation,
            bytes: body.len(),
            fetch_time,
        })
    }

    /// Variant ladder; empty for a bare media playlist
    pub fn variants(&self) -> &[Variant] {
        match &self.presentation {
            Presentation::Multivariant { variants } => variants,
            Presentation::Media(_) => &[],
        }
    }

    /// Throughput measured while fetching the playlist, in bps
    pub fn throughput_bps(&self) -> f64 {
        let secs = self.fetch_time.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        (self.bytes as f64 * 8.0) / secs
    }
}

/// Fetch a variant's media playlist and read its timeline
#[instrument(skip(client))]
pub async fn fetch_media_timeline(client: &Client, url: &Url) -> Result<MediaTimeline> {
    let body = fetch_body(client, url).await?;
    match parse_presentation(url, &body)? {
        Presentation::Media(timeline) => Ok(timeline),
        Presentation::Multivariant { .. } => Err(Error::ManifestParse(format!(
            "expected a media playlist at {}",
            url
        ))),
    }
}

async fn fetch_body(client: &Client, url: &Url) -> Result<Vec<u8>> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| Error::ManifestFetch(format!("{}: {}", url, e)))?
        .error_for_status()
        .map_err(|e| Error::ManifestFetch(format!("{}: {}", url, e)))?;
    Ok(response.bytes().await?.to_vec())
}

/// Parse playlist bytes fetched from `base`
pub fn parse_presentation(base: &Url, content: &[u8]) -> Result<Presentation> {
    match m3u8_rs::parse_playlist_res(content) {
        Ok(Playlist::MasterPlaylist(master)) => Ok(Presentation::Multivariant {
            variants: extract_variants(&master, base)?,
        }),
        Ok(Playlist::MediaPlaylist(media)) => Ok(Presentation::Media(timeline(&media))),
        Err(e) => Err(Error::ManifestParse(format!("Failed to parse HLS playlist: {:?}", e))),
    }
}

/// Extract variants in playlist order; the first one is where playback starts
fn extract_variants(master: &MasterPlaylist, base: &Url) -> Result<Vec<Variant>> {
    let mut variants = Vec::new();
    for variant in master.variants.iter().filter(|v| !v.is_i_frame) {
        variants.push(Variant {
            bandwidth: variant.bandwidth,
            resolution: variant.resolution.map(|r| format!("{}x{}", r.width, r.height)),
            uri: resolve_uri(base, &variant.uri)?,
        });
    }

    if variants.is_empty() {
        return Err(Error::ManifestParse("multivariant playlist has no variants".into()));
    }
    Ok(variants)
}

fn timeline(media: &MediaPlaylist) -> MediaTimeline {
    let is_live = !media.end_list;
    let duration = if media.end_list {
        let total: f64 = media.segments.iter().map(|s| f64::from(s.duration)).sum();
        Duration::try_from_secs_f64(total).ok()
    } else {
        None
    };

    MediaTimeline {
        duration,
        is_live,
        segments: media.segments.len(),
    }
}

/// Highest bandwidth within `cap`, the lowest if none fits, the highest if
/// uncapped (`cap <= 0`)
pub fn select_variant(variants: &[Variant], cap: f64) -> Option<&Variant> {
    if cap <= 0.0 {
        return variants.iter().max_by_key(|v| v.bandwidth);
    }
    variants
        .iter()
        .filter(|v| v.bandwidth as f64 <= cap)
        .max_by_key(|v| v.bandwidth)
        .or_else(|| variants.iter().min_by_key(|v| v.bandwidth))
}

/// Resolve relative URI against base URL
fn resolve_uri(base: &Url, relative: &str) -> Result<Url> {
    base.join(relative)
        .map_err(|e| Error::ManifestParse(format!("Invalid URI '{}': {}", relative, e)))
}
