//! Human-readable countdowns

/// Format a number of seconds as `1h 1m 1s`, `2m 5s`, `45s` or `now`
pub fn format_countdown(seconds: u64) -> String {
    if seconds == 0 {
        return "now".to_string();
    }

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}
