//! Formatting helpers for plain-text progress lines

use super::Snapshot;
use crate::options::ProgressOptions;
use std::time::Duration;

const BAR_FILLED: char = '#';
const BAR_EMPTY: char = '.';

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let seconds = duration.as_secs();
    if seconds < 60 {
        format!("{seconds}s")
    } else if seconds < 3600 {
        let minutes = seconds / 60;
        let remaining_seconds = seconds % 60;
        if remaining_seconds > 0 {
            format!("{minutes}m {remaining_seconds}s")
        } else {
            format!("{minutes}m")
        }
    } else {
        let hours = seconds / 3600;
        let minutes = (seconds % 3600) / 60;
        if minutes > 0 {
            format!("{hours}h {minutes}m")
        } else {
            format!("{hours}h")
        }
    }
}

/// Format a fraction as a percentage with one decimal, e.g. ` 5.0%`
pub fn format_percent(fraction: f64) -> String {
    format!("{:4.1}%", fraction * 100.0)
}

/// Draw a fixed-width bar; fractions above 1 render as a full bar
pub fn format_bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    let mut bar = String::with_capacity(width);
    bar.extend(std::iter::repeat_n(BAR_FILLED, filled));
    bar.extend(std::iter::repeat_n(BAR_EMPTY, width - filled));
    bar
}

/// Render one log-friendly status line
pub fn status_line(snapshot: &Snapshot, options: &ProgressOptions, finished: bool) -> String {
    let message = format!("{:<width$}", options.message, width = options.message_width);
    let elapsed = format_duration(snapshot.elapsed);

    let mut line = match (snapshot.total, snapshot.fraction()) {
        (Some(total), Some(fraction)) => {
            let mut line = format!(
                "{message} {} [{}] [{}/{total} in {elapsed}",
                format_percent(fraction),
                format_bar(fraction, options.bar_width),
                snapshot.completed,
            );
            if !finished && let Some(eta) = snapshot.eta() {
                line.push_str("; ETA ");
                line.push_str(&format_duration(eta));
            }
            line.push(']');
            line
        }
        _ => format!("{message} [{} in {elapsed}]", snapshot.completed),
    };

    if finished {
        line.push_str(" done!");
    }
    line
}
