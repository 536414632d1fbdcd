//! Text readouts shown next to the globe

use crate::domain::types::{EconomicReport, SECONDS_PER_DAY};
use chrono::{DateTime, NaiveDateTime, Utc};

/// Whole simulated days since epoch (floored, negative before epoch)
pub fn day_count(elapsed_seconds: f64) -> i64 {
    (elapsed_seconds / SECONDS_PER_DAY).floor() as i64
}

/// Time of day as `HH:MM:SS`; times before epoch wrap into the previous day
pub fn time_of_day(elapsed_seconds: f64) -> String {
    let seconds = elapsed_seconds.rem_euclid(SECONDS_PER_DAY).floor() as u64;
    format!("{:02}:{:02}:{:02}", seconds / 3600, (seconds % 3600) / 60, seconds % 60)
}

pub fn time_display(elapsed_seconds: f64) -> String {
    format!("Day {:02} / Hour {}", day_count(elapsed_seconds), time_of_day(elapsed_seconds))
}

/// `UTC: Tue, 01 Jan 2030 00:00:00 GMT`. Timestamps without an offset are read as UTC.
pub fn utc_display(simulation_time_iso: Option<&str>) -> String {
    let parsed = simulation_time_iso.and_then(|iso| {
        DateTime::parse_from_rfc3339(iso)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| {
                NaiveDateTime::parse_from_str(iso, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.and_utc())
            })
            .ok()
    });
    match parsed {
        Some(dt) => format!("UTC: {}", dt.format("%a, %d %b %Y %H:%M:%S GMT")),
        None => "UTC: Invalid Date".to_string(),
    }
}

pub fn speed_label(speed_multiplier: f64) -> String {
    format!("{}x", speed_multiplier)
}

/// Thousands-separated number with a fixed count of fraction digits
pub fn group_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let negative = value < 0.0 && formatted.chars().any(|c| c != '0' && c != '.');
    let sign = if negative { "-" } else { "" };
    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Integers print whole, everything else with two decimals
pub fn metric_value(value: f64) -> String {
    if value.fract() == 0.0 {
        group_thousands(value, 0)
    } else {
        group_thousands(value, 2)
    }
}

pub fn population_score_text(score: f64) -> String {
    format!("Population Score: ~{}", group_thousands(score.round(), 0))
}

pub fn coverage_area_text(area_km2: f64) -> String {
    format!("Coverage Area: ~{} km²", group_thousands(area_km2.round(), 0))
}

/// One `key: value` row per metric, keys padded to 25 columns
pub fn economic_report_text(report: &EconomicReport) -> String {
    report
        .metrics
        .iter()
        .map(|(key, value)| format!("{:<25}: {}\n", key, metric_value(*value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_and_time_of_day() {
        assert_eq!(day_count(90061.0), 1);
        assert_eq!(time_of_day(90061.0), "01:01:01");
        assert_eq!(time_display(90061.0), "Day 01 / Hour 01:01:01");
    }

    #[test]
    fn test_negative_elapsed_wraps_to_previous_day() {
        assert_eq!(day_count(-1.0), -1);
        assert_eq!(time_of_day(-1.0), "23:59:59");
    }

    #[test]
    fn test_utc_display() {
        assert_eq!(
            utc_display(Some("2030-01-01T00:00:00Z")),
            "UTC: Tue, 01 Jan 2030 00:00:00 GMT"
        );
        assert_eq!(
            utc_display(Some("2030-01-02T03:04:05.250000")),
            "UTC: Wed, 02 Jan 2030 03:04:05 GMT"
        );
        assert_eq!(utc_display(Some("not a date")), "UTC: Invalid Date");
        assert_eq!(utc_display(None), "UTC: Invalid Date");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0.0, 0), "0");
        assert_eq!(group_thousands(999.0, 0), "999");
        assert_eq!(group_thousands(1234567.0, 0), "1,234,567");
        assert_eq!(group_thousands(-1234.5, 2), "-1,234.50");
        assert_eq!(group_thousands(-0.001, 2), "0.00");
    }

    #[test]
    fn test_economic_report_text() {
        let report = EconomicReport {
            metrics: vec![
                ("subscribers".to_string(), 12000.0),
                ("monthly_revenue_usd".to_string(), 5432.1),
            ],
        };
        let text = economic_report_text(&report);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], format!("{:<25}: 12,000", "subscribers"));
        assert_eq!(lines[1], format!("{:<25}: 5,432.10", "monthly_revenue_usd"));
    }

    #[test]
    fn test_coverage_texts() {
        assert_eq!(population_score_text(1234567.4), "Population Score: ~1,234,567");
        assert_eq!(coverage_area_text(5309291.0), "Coverage Area: ~5,309,291 km²");
        assert_eq!(speed_label(100.0), "100x");
    }
}
