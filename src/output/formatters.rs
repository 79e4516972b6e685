//! Reusable formatting helpers for timestamps, ages and sizes

use chrono::{DateTime, Duration, Local, Utc};

/// Local date and time, `2025-01-15 14:30`
pub fn format_local(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Coarse age such as `3d 4h`, `2h 15m` or `45s`
pub fn format_age(age: Duration) -> String {
    let secs = age.num_seconds().max(0);
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3600;
    let mins = (secs % 3600) / 60;

    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else if mins > 0 {
        format!("{}m", mins)
    } else {
        format!("{}s", secs)
    }
}

/// Single-line text cut to `max` characters, with an ellipsis when cut
pub fn truncate_text(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let mut cut: String = flat.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Format bytes as human-readable size
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;
    const GB: usize = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::seconds(45)), "45s");
        assert_eq!(format_age(Duration::minutes(5)), "5m");
        assert_eq!(format_age(Duration::minutes(135)), "2h 15m");
        assert_eq!(format_age(Duration::hours(76)), "3d 4h");
        assert_eq!(format_age(Duration::seconds(-3)), "0s");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("line one\nline two", 40), "line one line two");
        assert_eq!(truncate_text("abcdefghij", 5), "abcd…");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }

    #[test]
    fn test_format_local_shape() {
        let at = DateTime::from_timestamp(1_736_942_400, 0).unwrap();
        let s = format_local(at);
        assert_eq!(s.len(), "2025-01-15 12:00".len());
        assert!(s.starts_with("2025-01-1"));
    }
}
