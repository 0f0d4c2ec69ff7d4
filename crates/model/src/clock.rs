//! 12-hour clock strings <-> minutes-since-midnight.
//!
//! All time arithmetic in the tracker happens in minutes since local
//! midnight. Known limitation: an event crossing midnight wraps and produces
//! a discontinuity; the arithmetic is deliberately not "fixed" here.

/// Race clock zero: 7:00 AM.
pub const RACE_START_MINUTES: f64 = 7.0 * 60.0;

/// Parse "9:15 AM" / "1:45 PM" into minutes from midnight.
/// Returns `None` for anything that does not match `H:MM AM/PM`.
pub fn parse_clock(s: &str) -> Option<f64> {
    let upper = s.trim().to_ascii_uppercase();
    let (body, pm) = if let Some(b) = upper.strip_suffix("PM") {
        (b, true)
    } else if let Some(b) = upper.strip_suffix("AM") {
        (b, false)
    } else {
        return None;
    };
    let (h, m) = body.trim_end().split_once(':')?;
    if h.is_empty() || h.len() > 2 || m.len() != 2 {
        return None;
    }
    let mut h: u32 = h.parse().ok()?;
    let m: u32 = m.parse().ok()?;
    if pm && h != 12 {
        h += 12;
    }
    if !pm && h == 12 {
        h = 0;
    }
    Some((h * 60 + m) as f64)
}

/// Format minutes-from-midnight as "9:15 AM" / "1:45 PM".
/// Fractional minutes are floored; hours wrap modulo 24.
pub fn format_clock(total_minutes: f64) -> String {
    let h = (total_minutes / 60.0).floor() as i64 % 24;
    let m = (total_minutes % 60.0).floor() as i64;
    let ampm = if h >= 12 { "PM" } else { "AM" };
    let hour = if h % 12 == 0 { 12 } else { h % 12 };
    format!("{}:{:02} {}", hour, m, ampm)
}

/// Parse an elapsed chip time "HH:MM:SS" into minutes.
pub fn parse_elapsed(s: &str) -> Option<f64> {
    let mut parts = s.trim().splitn(3, ':');
    let h: u32 = parts.next()?.parse().ok()?;
    let m_str = parts.next()?;
    let s_str = parts.next()?;
    if m_str.len() != 2 || s_str.len() != 2 {
        return None;
    }
    let m: u32 = m_str.parse().ok()?;
    let sec: u32 = s_str.parse().ok()?;
    Some(h as f64 * 60.0 + m as f64 + sec as f64 / 60.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_morning_and_afternoon() {
        assert_eq!(parse_clock("9:15 AM"), Some(555.0));
        assert_eq!(parse_clock("1:45 PM"), Some(13.0 * 60.0 + 45.0));
        assert_eq!(parse_clock("12:00 PM"), Some(720.0));
        assert_eq!(parse_clock("12:05 AM"), Some(5.0));
    }

    #[test]
    fn tolerates_missing_space_and_case() {
        assert_eq!(parse_clock("9:15am"), Some(555.0));
        assert_eq!(parse_clock(" 2:30 pm "), Some(14.0 * 60.0 + 30.0));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_clock(""), None);
        assert_eq!(parse_clock("9:15"), None);
        assert_eq!(parse_clock("915 AM"), None);
        assert_eq!(parse_clock("9:5 AM"), None);
        assert_eq!(parse_clock("soon"), None);
    }

    #[test]
    fn formats_back() {
        assert_eq!(format_clock(555.0), "9:15 AM");
        assert_eq!(format_clock(720.0), "12:00 PM");
        assert_eq!(format_clock(0.0), "12:00 AM");
        assert_eq!(format_clock(13.0 * 60.0 + 45.0), "1:45 PM");
    }

    #[test]
    fn format_floors_fractional_minutes() {
        assert_eq!(format_clock(555.9), "9:15 AM");
    }

    #[test]
    fn round_trips_within_one_day() {
        for minutes in [0.0, 59.0, 60.0, 419.0, 420.0, 719.0, 720.0, 1439.0] {
            let parsed = parse_clock(&format_clock(minutes)).unwrap();
            assert_eq!(parsed, minutes);
        }
    }

    #[test]
    fn elapsed_chip_times() {
        assert_eq!(parse_elapsed("14:44:19"), Some(14.0 * 60.0 + 44.0 + 19.0 / 60.0));
        assert_eq!(parse_elapsed("0:00:00"), Some(0.0));
        assert_eq!(parse_elapsed("Active"), None);
        assert_eq!(parse_elapsed("14:44"), None);
    }
}
