//! ICS rendering for schedule exports.
//!
//! Each entry becomes one weekly recurring VEVENT anchored to the week
//! containing the export. Lines end in CRLF and text values are escaped
//! per RFC 5545. Calendar apps that cannot parse this are not our
//! problem; all major ones can.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use super::model::ScheduleEntry;

const PRODID: &str = "-//LunchLit//Class Schedule//EN";

/// RFC 5545 TEXT escaping: backslash first, then the separators.
fn escape_text(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

/// ISO weekday (1 = Monday) to an RRULE BYDAY code.
fn byday(weekday: i16) -> &'static str {
    match weekday {
        1 => "MO",
        2 => "TU",
        3 => "WE",
        4 => "TH",
        5 => "FR",
        6 => "SA",
        _ => "SU",
    }
}

/// Monday of the week containing `today`.
pub fn week_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(i64::from(today.weekday().number_from_monday() - 1))
}

/// Renders a full VCALENDAR document. `now` stamps DTSTAMP; `anchor_week`
/// is the Monday the first occurrences are placed in.
pub fn render_calendar(
    entries: &[ScheduleEntry],
    now: DateTime<Utc>,
    anchor_week: NaiveDate,
) -> String {
    let mut lines: Vec<String> = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{}", PRODID),
        "CALSCALE:GREGORIAN".to_string(),
    ];

    let dtstamp = now.format("%Y%m%dT%H%M%SZ");

    for entry in entries {
        let date = anchor_week + Duration::days(i64::from(entry.weekday - 1));
        let mut description = Vec::new();
        if let Some(period) = entry.period {
            description.push(format!("Period {}", period));
        }
        if let Some(instructor) = &entry.instructor {
            description.push(format!("Instructor: {}", instructor));
        }

        lines.push("BEGIN:VEVENT".to_string());
        lines.push(format!("UID:{}@lunchlit", entry.id));
        lines.push(format!("DTSTAMP:{}", dtstamp));
        lines.push(format!(
            "DTSTART:{}T{}",
            date.format("%Y%m%d"),
            entry.starts_at.format("%H%M%S")
        ));
        lines.push(format!(
            "DTEND:{}T{}",
            date.format("%Y%m%d"),
            entry.ends_at.format("%H%M%S")
        ));
        lines.push(format!("RRULE:FREQ=WEEKLY;BYDAY={}", byday(entry.weekday)));
        lines.push(format!("SUMMARY:{}", escape_text(&entry.title)));
        if let Some(room) = &entry.room {
            lines.push(format!("LOCATION:{}", escape_text(room)));
        }
        if !description.is_empty() {
            lines.push(format!(
                "DESCRIPTION:{}",
                escape_text(&description.join("\n"))
            ));
        }
        lines.push("END:VEVENT".to_string());
    }

    lines.push("END:VCALENDAR".to_string());

    // RFC 5545 requires CRLF, including after the final line.
    let mut out = lines.join("\r\n");
    out.push_str("\r\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use uuid::Uuid;

    fn entry(title: &str, weekday: i16, room: Option<&str>) -> ScheduleEntry {
        ScheduleEntry {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            title: title.to_string(),
            period: Some(3),
            weekday,
            starts_at: NaiveTime::from_hms_opt(10, 15, 0).unwrap(),
            ends_at: NaiveTime::from_hms_opt(11, 5, 0).unwrap(),
            room: room.map(str::to_string),
            instructor: Some("Ms. Okafor".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn render_one(e: ScheduleEntry) -> String {
        let now = "2025-09-03T12:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let monday = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        render_calendar(&[e], now, monday)
    }

    #[test]
    fn renders_weekly_recurring_event_with_crlf() {
        let ics = render_one(entry("AP Chemistry", 3, Some("Lab 2")));

        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
        assert!(ics.contains("RRULE:FREQ=WEEKLY;BYDAY=WE\r\n"));
        // Wednesday of the anchor week.
        assert!(ics.contains("DTSTART:20250903T101500\r\n"));
        assert!(ics.contains("DTEND:20250903T110500\r\n"));
        assert!(ics.contains("SUMMARY:AP Chemistry\r\n"));
        assert!(ics.contains("LOCATION:Lab 2\r\n"));
        assert!(!ics.contains('\n') || ics.matches('\n').count() == ics.matches("\r\n").count());
    }

    #[test]
    fn escapes_separator_characters_in_text() {
        let ics = render_one(entry("Lit; Comp, and Rhetoric", 1, None));
        assert!(ics.contains("SUMMARY:Lit\\; Comp\\, and Rhetoric"));
    }

    #[test]
    fn empty_schedule_renders_empty_calendar() {
        let now = Utc::now();
        let monday = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let ics = render_calendar(&[], now, monday);

        assert!(ics.contains("BEGIN:VCALENDAR"));
        assert!(!ics.contains("BEGIN:VEVENT"));
    }

    #[test]
    fn week_start_finds_monday() {
        let wednesday = NaiveDate::from_ymd_opt(2025, 9, 3).unwrap();
        let monday = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        assert_eq!(week_start(wednesday), monday);
        assert_eq!(week_start(monday), monday);

        let sunday = NaiveDate::from_ymd_opt(2025, 9, 7).unwrap();
        assert_eq!(week_start(sunday), monday);
    }
}
