use std::time::Duration;

const UNITS: [(&str, f64); 3] = [("GB", 1e9), ("MB", 1e6), ("KB", 1e3)];

/// Format a byte count for display using decimal units (KB, MB, GB).
///
/// Sizes below one kilobyte are still shown in KB so a listing column
/// stays in one family of units.
pub fn format_size(bytes: u64) -> String {
    let value = bytes as f64;
    let (unit, divisor) = UNITS
        .iter()
        .copied()
        .find(|(_, divisor)| value >= *divisor)
        .unwrap_or(("KB", 1e3));
    let scaled = value / divisor;
    let text = format!("{scaled:.1}");
    let text = text.strip_suffix(".0").unwrap_or(&text);
    format!("{text} {unit}")
}

/// Format a playback position as `MM:SS`, or `HH:MM:SS` from one hour on.
pub fn format_time(time: Duration) -> String {
    let total = time.as_secs();
    let hours = total / 3600;
    let minutes = total / 60 % 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}
