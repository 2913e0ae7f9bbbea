use chrono::{Datelike, NaiveDate, Weekday};

/// Format a duration as human-readable string (e.g., "2h 30m")
pub fn format_duration(d: chrono::Duration) -> String {
    let total_mins = d.num_minutes();
    let days = total_mins / (24 * 60);
    let hours = (total_mins % (24 * 60)) / 60;
    let mins = total_mins % 60;

    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn weekday_short(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Lun",
        Weekday::Tue => "Mar",
        Weekday::Wed => "Mié",
        Weekday::Thu => "Jue",
        Weekday::Fri => "Vie",
        Weekday::Sat => "Sáb",
        Weekday::Sun => "Dom",
    }
}

/// Column header for a day, e.g. "Lun 10/03".
pub fn day_header(date: NaiveDate) -> String {
    format!("{} {}", weekday_short(date.weekday()), date.format("%d/%m"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("ana", 10), "ana");
        assert_eq!(truncate("confirmación pendiente", 10), "confirm...");
        assert_eq!(truncate("ñandúñandú", 10), "ñandúñandú");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(chrono::Duration::minutes(45)), "45m");
        assert_eq!(format_duration(chrono::Duration::minutes(90)), "1h 30m");
        assert_eq!(format_duration(chrono::Duration::hours(50)), "2d 2h");
    }

    #[test]
    fn headers() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(day_header(date), "Lun 10/03");
    }
}
