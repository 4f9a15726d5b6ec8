//! Playback screen model
//!
//! Turns facade events into what the terminal renders: a play/pause icon,
//! elapsed and total labels, and a progress fraction. The only piece of state
//! beyond the rendered values is whether the user is dragging the seek bar.

use std::time::Duration;

/// Rendered state of the player screen
#[derive(Debug, Default)]
pub struct PlaybackScreen {
    is_playing: bool,
    elapsed: Duration,
    total: Option<Duration>,
    fraction: f64,
    dragging: bool,
}

impl PlaybackScreen {
    pub fn on_ready(&mut self) {
        self.is_playing = true;
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.is_playing = playing;
    }

    /// Labels always follow the clock; the indicator holds still during a drag
    pub fn on_progress(&mut self, current: Duration, total: Option<Duration>) {
        self.elapsed = current;
        self.total = total;
        if self.dragging {
            return;
        }
        self.fraction = fraction(current, total);
    }

    pub fn begin_drag(&mut self) {
        self.dragging = true;
    }

    /// Finish a drag at `fraction`; returns the absolute seek target
    pub fn end_drag(&mut self, fraction: f64) -> Option<Duration> {
        self.dragging = false;
        let total = self.total?;
        let fraction = fraction.clamp(0.0, 1.0);
        self.fraction = fraction;
        Some(total.mul_f64(fraction))
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    pub fn icon(&self) -> &'static str {
        if self.is_playing {
            "▶"
        } else {
            "⏸"
        }
    }

    pub fn elapsed_label(&self) -> String {
        format_clock(self.elapsed)
    }

    pub fn total_label(&self) -> String {
        self.total.map(format_clock).unwrap_or_else(|| "--:--".to_string())
    }
}

/// `mm:ss`, minutes not wrapped at the hour
pub fn format_clock(time: Duration) -> String {
    let secs = time.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn fraction(current: Duration, total: Option<Duration>) -> f64 {
    match total {
        Some(total) if !total.is_zero() => (current.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0),
        _ => 0.0,
    }
}
