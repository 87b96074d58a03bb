//! Flat `time,type,detail` export of an event log, and the matching reader.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Event, EventKind};

pub const TABLE_HEADER: &str = "time,type,detail";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExportError {
    #[error("missing or unexpected header: {0:?}")]
    BadHeader(String),

    #[error("line {line}: expected 3 columns")]
    MissingColumns { line: usize },

    #[error("line {line}: invalid time '{value}'")]
    BadTime { line: usize, value: String },

    #[error("line {line}: {reason}")]
    BadType { line: usize, reason: String },
}

/// A row read back from an export. Time is only known to the second.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub time_ms: u64,
    pub kind: EventKind,
    pub detail: String,
}

/// `MM:SS`, or `HH:MM:SS` from one hour on.
pub fn format_elapsed(ms: u64) -> String {
    let total_secs = ms / 1000;
    let (hours, minutes, seconds) = (total_secs / 3600, (total_secs / 60) % 60, total_secs % 60);
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

pub fn parse_elapsed(value: &str) -> Option<u64> {
    let parts: Vec<u64> = value
        .split(':')
        .map(|p| p.parse::<u64>().ok())
        .collect::<Option<_>>()?;
    let secs = match parts.as_slice() {
        [m, s] if *s < 60 => m * 60 + s,
        [h, m, s] if *m < 60 && *s < 60 => h * 3600 + m * 60 + s,
        _ => return None,
    };
    Some(secs * 1000)
}

/// Commas would split the column; they become semicolons.
pub fn sanitize_detail(detail: &str) -> String {
    detail.replace(['\r', '\n'], " ").replace(',', ";")
}

pub fn to_table(events: &[Event]) -> String {
    let mut lines = Vec::with_capacity(events.len() + 1);
    lines.push(TABLE_HEADER.to_string());
    lines.extend(events.iter().map(|e| {
        format!(
            "{},{},{}",
            format_elapsed(e.time_ms),
            e.kind,
            sanitize_detail(&e.detail)
        )
    }));
    lines.join("\n")
}

pub fn parse_table(text: &str) -> Result<Vec<TableRow>, ExportError> {
    let mut lines = text.lines();
    match lines.next() {
        Some(header) if header.trim_end() == TABLE_HEADER => {}
        other => return Err(ExportError::BadHeader(other.unwrap_or_default().to_string())),
    }

    lines
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            let line_no = idx + 2;
            let mut columns = line.splitn(3, ',');
            let (Some(time), Some(kind), Some(detail)) =
                (columns.next(), columns.next(), columns.next())
            else {
                return Err(ExportError::MissingColumns { line: line_no });
            };

            let time_ms = parse_elapsed(time).ok_or_else(|| ExportError::BadTime {
                line: line_no,
                value: time.to_string(),
            })?;
            let kind = kind
                .parse::<EventKind>()
                .map_err(|reason| ExportError::BadType {
                    line: line_no,
                    reason,
                })?;

            Ok(TableRow {
                time_ms,
                kind,
                detail: detail.to_string(),
            })
        })
        .collect()
}

pub fn report_file_name(now: DateTime<Utc>) -> String {
    format!(
        "proctoring_report_{}.csv",
        now.format("%Y-%m-%dT%H-%M-%S-%3fZ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn formats_minutes_and_hours() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(10_200), "00:10");
        assert_eq!(format_elapsed(59_999), "00:59");
        assert_eq!(format_elapsed(61_000), "01:01");
        assert_eq!(format_elapsed(3_599_999), "59:59");
        assert_eq!(format_elapsed(3_600_000), "01:00:00");
        assert_eq!(format_elapsed(3_725_000), "01:02:05");
    }

    #[test]
    fn parses_both_time_forms() {
        assert_eq!(parse_elapsed("01:01"), Some(61_000));
        assert_eq!(parse_elapsed("01:02:05"), Some(3_725_000));
        assert_eq!(parse_elapsed("1:75"), None);
        assert_eq!(parse_elapsed("abc"), None);
    }

    #[test]
    fn table_escapes_commas_in_details() {
        let events = vec![
            Event::new(1_500, EventKind::Meta, "Candidate: Doe, Jane"),
            Event::new(10_200, EventKind::NoFace, "No face detected > 10s"),
        ];
        assert_eq!(
            to_table(&events),
            "time,type,detail\n00:01,META,Candidate: Doe; Jane\n00:10,NO_FACE,No face detected > 10s"
        );
    }

    #[test]
    fn empty_log_is_header_only() {
        assert_eq!(to_table(&[]), TABLE_HEADER);
        assert!(parse_table(TABLE_HEADER).unwrap().is_empty());
    }

    #[test]
    fn round_trip_keeps_type_and_second_resolution() {
        let events = vec![
            Event::new(0, EventKind::MultipleFaces, "Multiple faces detected"),
            Event::new(5_200, EventKind::FocusLost, "User looking away > 5s"),
            Event::new(7_999, EventKind::Object, "cell phone: 82%"),
            Event::new(3_725_400, EventKind::Meta, "Session ended, final"),
        ];

        let rows = parse_table(&to_table(&events)).unwrap();
        assert_eq!(rows.len(), events.len());
        for (row, event) in rows.iter().zip(&events) {
            assert_eq!(row.kind, event.kind);
            assert!(event.time_ms - row.time_ms < 1_000);
        }
        assert_eq!(rows[3].detail, "Session ended; final");
    }

    #[test]
    fn rejects_malformed_tables() {
        assert!(matches!(
            parse_table("when,what\n00:01,META,x"),
            Err(ExportError::BadHeader(_))
        ));
        assert_eq!(
            parse_table("time,type,detail\n00:01,META"),
            Err(ExportError::MissingColumns { line: 2 })
        );
        assert!(matches!(
            parse_table("time,type,detail\n00:01,BLINK,x"),
            Err(ExportError::BadType { line: 2, .. })
        ));
    }

    #[test]
    fn report_file_name_is_filesystem_safe() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            report_file_name(at),
            "proctoring_report_2024-03-09T14-05-07-000Z.csv"
        );
    }
}
