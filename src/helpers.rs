use chrono::{DateTime, Utc};

use crate::models::kluctl::CommandResultSummary;

pub fn human_time(t: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let t = match t {
        Some(t) => t,
        None => return "never".to_string(),
    };

    let d = now - t;
    let secs = d.num_seconds();

    if secs < 60 {
        "just now".to_string()
    } else if secs < 3600 {
        let m = d.num_minutes();
        if m == 1 {
            "1 minute ago".to_string()
        } else {
            format!("{} minutes ago", m)
        }
    } else if secs < 86400 {
        let h = d.num_hours();
        if h == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", h)
        }
    } else if secs < 30 * 86400 {
        let days = d.num_days();
        if days == 1 {
            "1 day ago".to_string()
        } else {
            format!("{} days ago", days)
        }
    } else {
        t.format("%b %e, %Y").to_string()
    }
}

/// Relative age of a start time; empty when the time is unknown.
pub fn since(start_time: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match start_time {
        Some(t) => human_time(Some(t), now),
        None => String::new(),
    }
}

/// One-line summary of a result's object changes and problems.
pub fn status_line(rs: &CommandResultSummary) -> String {
    let parts: Vec<String> = [
        (rs.new_objects, "new"),
        (rs.changed_objects, "changed"),
        (rs.deleted_objects, "deleted"),
        (rs.orphan_objects, "orphan"),
        (rs.errors, "errors"),
        (rs.warnings, "warnings"),
    ]
    .into_iter()
    .filter(|(n, _)| *n > 0)
    .map(|(n, label)| format!("{} {}", n, label))
    .collect();

    if parts.is_empty() {
        "no changes".to_string()
    } else {
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn relative_ages() {
        let n = now();
        assert_eq!(human_time(None, n), "never");
        assert_eq!(human_time(Some(n - Duration::seconds(5)), n), "just now");
        assert_eq!(human_time(Some(n - Duration::minutes(1)), n), "1 minute ago");
        assert_eq!(human_time(Some(n - Duration::minutes(7)), n), "7 minutes ago");
        assert_eq!(human_time(Some(n - Duration::hours(3)), n), "3 hours ago");
        assert_eq!(human_time(Some(n - Duration::days(1)), n), "1 day ago");
        assert_eq!(human_time(Some(n - Duration::days(45)), n), "Jan 25, 2024");
    }

    #[test]
    fn since_unknown_time_is_blank() {
        assert_eq!(since(Some(now() - Duration::hours(1)), now()), "1 hour ago");
        assert_eq!(since(None, now()), "");
    }

    #[test]
    fn status_line_lists_nonzero_counts() {
        let rs = CommandResultSummary {
            id: "r".to_string(),
            changed_objects: 2,
            new_objects: 1,
            errors: 1,
            ..Default::default()
        };
        assert_eq!(status_line(&rs), "1 new, 2 changed, 1 errors");
        assert_eq!(
            status_line(&CommandResultSummary {
                id: "r".to_string(),
                ..Default::default()
            }),
            "no changes"
        );
    }
}
