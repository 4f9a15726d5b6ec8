//! Output formatting for CLI

use playdeck_core::headless::{HlsManifest, Presentation};
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Table,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "table" => OutputFormat::Table,
            _ => OutputFormat::Text,
        }
    }
}

#[derive(Tabled)]
struct VariantRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Bandwidth")]
    bandwidth: String,
    #[tabled(rename = "Resolution")]
    resolution: String,
    #[tabled(rename = "URI")]
    uri: String,
}

/// Human-readable bitrate
pub fn format_bitrate(bits_per_second: f64) -> String {
    if bits_per_second >= 1_000_000.0 {
        format!("{:.2} Mbps", bits_per_second / 1_000_000.0)
    } else if bits_per_second >= 1_000.0 {
        format!("{:.0} kbps", bits_per_second / 1_000.0)
    } else {
        format!("{:.0} bps", bits_per_second)
    }
}

pub fn to_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}

/// Render a probed manifest in `format`
pub fn format_manifest(manifest: &HlsManifest, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(manifest),
        OutputFormat::Table => match &manifest.presentation {
            Presentation::Multivariant { variants } => {
                let rows: Vec<VariantRow> = variants
                    .iter()
                    .enumerate()
                    .map(|(i, v)| VariantRow {
                        index: i + 1,
                        bandwidth: format_bitrate(v.bandwidth as f64),
                        resolution: v.resolution.clone().unwrap_or_else(|| "-".into()),
                        uri: v.uri.to_string(),
                    })
                    .collect();
                Table::new(rows).to_string()
            }
            Presentation::Media(_) => format_manifest(manifest, OutputFormat::Text),
        },
        OutputFormat::Text => {
            let mut out = format!("Manifest: {}\n", manifest.url);
            out.push_str(&format!(
                "  Fetched: {} bytes in {} ms ({})\n",
                manifest.bytes,
                manifest.fetch_time.as_millis(),
                format_bitrate(manifest.throughput_bps())
            ));
            match &manifest.presentation {
                Presentation::Multivariant { variants } => {
                    out.push_str(&format!("  Type: multivariant\n  Variants: {}\n", variants.len()));
                    for (i, v) in variants.iter().enumerate() {
                        out.push_str(&format!(
                            "  {}. {} {}\n",
                            i + 1,
                            format_bitrate(v.bandwidth as f64),
                            v.resolution.as_deref().unwrap_or("-")
                        ));
                    }
                }
                Presentation::Media(timeline) => {
                    out.push_str(&format!(
                        "  Type: media\n  Live: {}\n  Segments: {}\n",
                        timeline.is_live, timeline.segments
                    ));
                    if let Some(duration) = timeline.duration {
                        out.push_str(&format!("  Duration: {:.1}s\n", duration.as_secs_f64()));
                    }
                }
            }
            out
        }
    }
}
