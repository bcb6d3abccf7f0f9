//! Tests for calendar segment expansion across day boundaries.

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use shared::dates::{expand_segments, CalendarSegment, SegmentInput};

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

fn expand(
    id: &str,
    title: &str,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    tz: Tz,
) -> Vec<CalendarSegment<()>> {
    expand_segments(
        SegmentInput {
            id,
            title,
            start,
            end,
        },
        (),
        tz,
    )
}

// ---------------------------------------------------------------------------
// Single-segment cases
// ---------------------------------------------------------------------------

#[test]
fn missing_end_collapses_to_a_point() {
    let start = utc(2024, 3, 1, 18, 0);
    let segments = expand("e1", "Game Night", start, None, chrono_tz::UTC);

    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].id, "e1");
    assert_eq!(segments[0].title, "Game Night");
    assert_eq!(segments[0].start, start);
    assert_eq!(segments[0].end, start);
}

#[test]
fn same_day_event_stays_whole() {
    let start = utc(2024, 3, 1, 18, 0);
    let end = utc(2024, 3, 1, 21, 0);
    let segments = expand("e1", "Game Night", start, Some(end), chrono_tz::UTC);

    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].id, "e1");
    assert_eq!(segments[0].title, "Game Night");
    assert_eq!(segments[0].start, start);
    assert_eq!(segments[0].end, end);
}

#[test]
fn end_before_start_yields_single_segment() {
    // Bad data still renders as one segment rather than splitting.
    let start = utc(2024, 3, 2, 1, 0);
    let end = utc(2024, 3, 1, 23, 0);
    let segments = expand("e1", "Game Night", start, Some(end), chrono_tz::UTC);

    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].start, start);
    assert_eq!(segments[0].end, end);
}

#[test]
fn end_equal_to_start_yields_single_segment() {
    let start = utc(2024, 3, 1, 18, 0);
    let segments = expand("e1", "Game Night", start, Some(start), chrono_tz::UTC);

    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].id, "e1");
}

// ---------------------------------------------------------------------------
// Overnight splits
// ---------------------------------------------------------------------------

#[test]
fn overnight_event_splits_at_midnight() {
    // 23:00 Mar 1 to 01:00 Mar 2, viewed in UTC.
    let start = utc(2024, 3, 1, 23, 0);
    let end = utc(2024, 3, 2, 1, 0);
    let segments = expand("e1", "Late Skate", start, Some(end), chrono_tz::UTC);

    assert_eq!(segments.len(), 2);

    assert_eq!(segments[0].id, "e1-0");
    assert_eq!(segments[0].title, "Late Skate");
    assert_eq!(segments[0].start, start);
    assert_eq!(segments[0].end, utc(2024, 3, 2, 0, 0));

    assert_eq!(segments[1].id, "e1-1");
    assert_eq!(segments[1].title, "Late Skate (cont.)");
    assert_eq!(segments[1].start, utc(2024, 3, 2, 0, 0));
    assert_eq!(segments[1].end, end);

    // The two halves meet exactly at the boundary.
    assert_eq!(segments[0].end, segments[1].start);
}

#[test]
fn split_depends_on_timezone() {
    // The same instants are 15:00 to 17:00 the same afternoon in Los Angeles.
    let start = utc(2024, 3, 1, 23, 0);
    let end = utc(2024, 3, 2, 1, 0);
    let segments = expand(
        "e1",
        "Late Skate",
        start,
        Some(end),
        chrono_tz::America::Los_Angeles,
    );

    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].id, "e1");
    assert_eq!(segments[0].title, "Late Skate");
}

#[test]
fn multi_midnight_span_keeps_two_segments() {
    // Mar 1 noon to Mar 4 noon crosses three midnights but still renders
    // as the two outer days.
    let start = utc(2024, 3, 1, 12, 0);
    let end = utc(2024, 3, 4, 12, 0);
    let segments = expand("e1", "Retreat", start, Some(end), chrono_tz::UTC);

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].start, start);
    assert_eq!(segments[0].end, utc(2024, 3, 2, 0, 0));
    assert_eq!(segments[1].start, utc(2024, 3, 4, 0, 0));
    assert_eq!(segments[1].end, end);
}

#[test]
fn resource_is_attached_to_every_segment() {
    let start = utc(2024, 3, 1, 23, 0);
    let end = utc(2024, 3, 2, 1, 0);
    let segments = expand_segments(
        SegmentInput {
            id: "e1",
            title: "Late Skate",
            start,
            end: Some(end),
        },
        42u32,
        chrono_tz::UTC,
    );

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].resource, 42);
    assert_eq!(segments[1].resource, 42);
}

// ---------------------------------------------------------------------------
// DST edge: the boundary midnight does not exist
// ---------------------------------------------------------------------------

#[test]
fn missing_midnight_shifts_boundary_forward() {
    // Cuba springs forward at midnight on 2024-03-10, so that day opens at
    // 01:00 CDT, which is 05:00 UTC.
    let tz: Tz = "America/Havana".parse().unwrap();

    // Mar 9 23:00 CST (04:00 UTC) to Mar 10 02:00 CDT (06:00 UTC).
    let start = utc(2024, 3, 10, 4, 0);
    let end = utc(2024, 3, 10, 6, 0);
    let segments = expand("e1", "Overnight", start, Some(end), tz);

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].end, utc(2024, 3, 10, 5, 0));
    assert_eq!(segments[1].start, utc(2024, 3, 10, 5, 0));
    assert_eq!(segments[0].end, segments[1].start);
}
