//! Date and time handling for calendar events.
//!
//! Everything here is pure and stateless: wall-clock parsing and formatting
//! for editing surfaces, overnight detection, and expansion of
//! midnight-spanning events into per-day calendar segments. Timezones are
//! always explicit parameters, never ambient process state.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;

/// A wall-clock time of day, independent of any date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WallTime {
    hour: u8,
    minute: u8,
}

impl WallTime {
    /// Build a time of day, rejecting out-of-range components.
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Parse a canonical "HH:MM" value. The hour and minute may be single
    /// digits, and a missing ":MM" part means minute zero.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let (hour_part, minute_part) = match value.split_once(':') {
            Some((hour, minute)) => (hour, Some(minute)),
            None => (value, None),
        };

        let hour = parse_two_digit(hour_part)?;
        let minute = match minute_part {
            Some(part) => parse_two_digit(part)?,
            None => 0,
        };

        Self::new(hour, minute)
    }

    /// Round to the nearest quarter hour, wrapping past midnight.
    ///
    /// Minutes land on :00/:15/:30/:45; 23:53 and later wrap to 00:00.
    pub fn round_to_quarter(&self) -> Self {
        let total = self.hour as u32 * 60 + self.minute as u32;
        let rounded = (total + 7) / 15 * 15 % (24 * 60);
        Self {
            hour: (rounded / 60) as u8,
            minute: (rounded % 60) as u8,
        }
    }

    /// 12-hour clock label, e.g. "6:30 PM" or "12:00 AM".
    pub fn label(&self) -> String {
        let meridiem = if self.hour < 12 { "AM" } else { "PM" };
        let hour12 = match self.hour % 12 {
            0 => 12,
            hour => hour,
        };
        format!("{}:{:02} {}", hour12, self.minute, meridiem)
    }

    /// Parse loosely-formatted user input like "6:30 pm", "0930", or "9am".
    ///
    /// A meridiem suffix shifts the hour when it stands alone as a word
    /// ("6:30 pm") or sits directly after a bare hour ("9am"); glued to a
    /// colon form it is accepted but ignored, so "6:30pm" parses as 06:30.
    /// Bare runs of three or four digits split the trailing two off as
    /// minutes. Returns `None` when no shape matches or the result is out
    /// of range.
    pub fn from_free_text(input: &str) -> Option<Self> {
        let text = input.trim().to_ascii_lowercase();
        if text.is_empty() {
            return None;
        }

        let am = has_meridiem(&text, "am");
        let pm = has_meridiem(&text, "pm");

        if let Some((hour, minute)) = match_colon_form(&text) {
            return Self::new(adjust_hour(hour, am, pm), minute);
        }

        if let Some(hour) = match_bare_hour(&text) {
            return Self::new(adjust_hour(hour, am, pm), 0);
        }

        if let Some((hour, minute)) = match_digit_run(&text) {
            return Self::new(adjust_hour(hour, am, pm), minute);
        }

        None
    }
}

impl fmt::Display for WallTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// All 96 quarter-hour times of a day, 00:00 through 23:45.
pub fn quarter_hour_options() -> Vec<WallTime> {
    let mut options = Vec::with_capacity(96);
    for hour in 0..24u8 {
        for minute in [0u8, 15, 30, 45] {
            options.push(WallTime { hour, minute });
        }
    }
    options
}

fn parse_two_digit(part: &str) -> Option<u8> {
    if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// Apply a 12-hour meridiem to an hour: "pm" pushes afternoon hours past
/// twelve, "12am" means midnight.
fn adjust_hour(hour: u8, am: bool, pm: bool) -> u8 {
    let mut hour = hour;
    if pm && hour < 12 {
        hour += 12;
    }
    if am && hour == 12 {
        hour = 0;
    }
    hour
}

/// True when the suffix appears as a standalone word, or directly after a
/// leading one- or two-digit hour ("9am").
fn has_meridiem(text: &str, word: &str) -> bool {
    contains_word(text, word) || hour_with_suffix(text, word)
}

fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

/// Word-boundary search: the match may not touch another letter, digit, or
/// underscore on either side.
fn contains_word(text: &str, word: &str) -> bool {
    let bytes = text.as_bytes();
    let mut from = 0;
    while let Some(offset) = text[from..].find(word) {
        let at = from + offset;
        let end = at + word.len();
        let open = at == 0 || !is_word_byte(bytes[at - 1]);
        let close = end == bytes.len() || !is_word_byte(bytes[end]);
        if open && close {
            return true;
        }
        from = at + 1;
    }
    false
}

/// Matches text whose leading one- or two-digit hour is followed, after
/// optional whitespace, by the suffix at a word boundary ("9am", "11 pm").
fn hour_with_suffix(text: &str, word: &str) -> bool {
    let bytes = text.as_bytes();
    let mut digits = 0;
    while digits < bytes.len() && digits < 2 && bytes[digits].is_ascii_digit() {
        digits += 1;
    }
    if digits == 0 {
        return false;
    }
    // A third leading digit blocks the match however many the hour takes.
    if digits == 2 && bytes.len() > 2 && bytes[2].is_ascii_digit() {
        return false;
    }
    let rest = text[digits..].trim_start();
    if !rest.starts_with(word) {
        return false;
    }
    match rest.as_bytes().get(word.len()) {
        Some(&byte) => !is_word_byte(byte),
        None => true,
    }
}

/// Matches "H:MM" or "HH:MM", optionally followed by whitespace and a
/// meridiem suffix.
fn match_colon_form(text: &str) -> Option<(u8, u8)> {
    let (hour_part, rest) = text.split_once(':')?;
    if hour_part.is_empty() || hour_part.len() > 2 || !hour_part.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let bytes = rest.as_bytes();
    if bytes.len() < 2 || !bytes[0].is_ascii_digit() || !bytes[1].is_ascii_digit() {
        return None;
    }
    let tail = rest[2..].trim_start();
    if !(tail.is_empty() || tail == "am" || tail == "pm") {
        return None;
    }
    Some((hour_part.parse().ok()?, rest[..2].parse().ok()?))
}

/// Matches a bare one- or two-digit hour, optionally followed by whitespace
/// and a meridiem suffix.
fn match_bare_hour(text: &str) -> Option<u8> {
    let bytes = text.as_bytes();
    let mut digits = 0;
    while digits < bytes.len() && digits < 2 && bytes[digits].is_ascii_digit() {
        digits += 1;
    }
    if digits == 0 {
        return None;
    }
    let tail = text[digits..].trim_start();
    if !(tail.is_empty() || tail == "am" || tail == "pm") {
        return None;
    }
    text[..digits].parse().ok()
}

/// Matches a bare run of two to four digits; runs longer than two digits
/// split the trailing two off as minutes ("630" is 6:30, "0930" is 9:30).
fn match_digit_run(text: &str) -> Option<(u8, u8)> {
    let len = text.len();
    if !(2..=4).contains(&len) || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if len <= 2 {
        return Some((text.parse().ok()?, 0));
    }
    let split = len - 2;
    Some((text[..split].parse().ok()?, text[split..].parse().ok()?))
}

/// True when `end` falls on a later calendar day than `start` in `tz`.
pub fn is_overnight(start: DateTime<Utc>, end: DateTime<Utc>, tz: Tz) -> bool {
    end.with_timezone(&tz).date_naive() > start.with_timezone(&tz).date_naive()
}

/// One calendar-renderable slice of an event's time span.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarSegment<R> {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub resource: R,
}

/// Event fields consumed by [`expand_segments`].
#[derive(Debug, Clone, Copy)]
pub struct SegmentInput<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

/// Expand an event into the segments a calendar grid should draw.
///
/// Events contained within one local day yield a single segment carrying
/// the original id and title. An event whose end falls on a later local day
/// yields two: the first runs to the midnight after the start, the second
/// from the midnight opening the end's day and with " (cont.)" appended to
/// the title, so a single-midnight span is covered with no gap or overlap.
/// Spans touching more than two days still yield two segments, one per
/// outer day. A missing end collapses to a zero-length segment at the
/// start.
pub fn expand_segments<R: Clone>(
    input: SegmentInput<'_>,
    resource: R,
    tz: Tz,
) -> Vec<CalendarSegment<R>> {
    let start = input.start;
    let end = input.end.unwrap_or(start);

    if end <= start || !is_overnight(start, end, tz) {
        return vec![CalendarSegment {
            id: input.id.to_string(),
            title: input.title.to_string(),
            start,
            end,
            resource,
        }];
    }

    vec![
        CalendarSegment {
            id: format!("{}-0", input.id),
            title: input.title.to_string(),
            start,
            end: day_end(start, tz),
            resource: resource.clone(),
        },
        CalendarSegment {
            id: format!("{}-1", input.id),
            title: format!("{} (cont.)", input.title),
            start: day_start(end, tz),
            end,
            resource,
        },
    ]
}

/// First valid instant of the local day containing `instant`.
pub fn day_start(instant: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    first_instant_of(instant.with_timezone(&tz).date_naive(), tz)
}

/// The instant the local day containing `instant` ends: the first instant
/// of the following day.
pub fn day_end(instant: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let date = instant.with_timezone(&tz).date_naive();
    first_instant_of(date.succ_opt().unwrap_or(date), tz)
}

/// Earliest instant of a local date. When a spring-forward transition
/// removes midnight itself, the day opens at the first wall time that
/// exists, probed in 30-minute steps.
fn first_instant_of(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    let mut probe = midnight;
    for _ in 0..8 {
        if let Some(local) = tz.from_local_datetime(&probe).earliest() {
            return local.with_timezone(&Utc);
        }
        probe += Duration::minutes(30);
    }
    // No tzdb rule leaves a gap this wide.
    Utc.from_utc_datetime(&midnight)
}

/// Render an instant in the editing format used by datetime-local inputs,
/// e.g. "2024-03-01T18:30".
pub fn format_datetime_local(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%Y-%m-%dT%H:%M").to_string()
}

/// Human-readable event time range; shows both dates when the event spans
/// midnight, e.g. "Mar 1, 2024 11:00 PM – Mar 2, 2024 1:00 AM".
pub fn format_event_range(start: DateTime<Utc>, end: Option<DateTime<Utc>>, tz: Tz) -> String {
    let opening = start.with_timezone(&tz).format("%b %-d, %Y %-I:%M %p");

    match end {
        None => opening.to_string(),
        Some(end_instant) => {
            let end_local = end_instant.with_timezone(&tz);
            if is_overnight(start, end_instant, tz) {
                format!("{} – {}", opening, end_local.format("%b %-d, %Y %-I:%M %p"))
            } else {
                format!("{} – {}", opening, end_local.format("%-I:%M %p"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall(hour: u8, minute: u8) -> WallTime {
        WallTime::new(hour, minute).unwrap()
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(WallTime::new(24, 0).is_none());
        assert!(WallTime::new(12, 60).is_none());
        assert_eq!(wall(23, 59).to_string(), "23:59");
    }

    #[test]
    fn test_parse_canonical() {
        assert_eq!(WallTime::parse("18:30"), Some(wall(18, 30)));
        assert_eq!(WallTime::parse("9"), Some(wall(9, 0)));
        assert_eq!(WallTime::parse("9:5"), Some(wall(9, 5)));
        assert_eq!(WallTime::parse(" 07:45 "), Some(wall(7, 45)));
        assert_eq!(WallTime::parse("24:00"), None);
        assert_eq!(WallTime::parse("abc"), None);
        assert_eq!(WallTime::parse(""), None);
    }

    #[test]
    fn test_round_to_nearest_quarter() {
        assert_eq!(wall(18, 32).round_to_quarter(), wall(18, 30));
        assert_eq!(wall(9, 52).round_to_quarter(), wall(9, 45));
        assert_eq!(wall(9, 53).round_to_quarter(), wall(10, 0));
        assert_eq!(wall(0, 7).round_to_quarter(), wall(0, 0));
        assert_eq!(wall(0, 8).round_to_quarter(), wall(0, 15));
    }

    #[test]
    fn test_round_wraps_past_midnight() {
        assert_eq!(wall(23, 53).round_to_quarter(), wall(0, 0));
        assert_eq!(wall(23, 59).round_to_quarter(), wall(0, 0));
    }

    #[test]
    fn test_round_is_idempotent_on_quarters() {
        for option in quarter_hour_options() {
            assert_eq!(option.round_to_quarter(), option);
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(wall(18, 30).label(), "6:30 PM");
        assert_eq!(wall(0, 0).label(), "12:00 AM");
        assert_eq!(wall(12, 0).label(), "12:00 PM");
        assert_eq!(wall(9, 5).label(), "9:05 AM");
    }

    #[test]
    fn test_quarter_hour_options_cover_the_day() {
        let options = quarter_hour_options();
        assert_eq!(options.len(), 96);
        assert_eq!(options[0].to_string(), "00:00");
        assert_eq!(options[95].to_string(), "23:45");
    }

    #[test]
    fn test_free_text_accepts_common_shapes() {
        assert_eq!(WallTime::from_free_text("6:30 pm"), Some(wall(18, 30)));
        assert_eq!(WallTime::from_free_text("18:30"), Some(wall(18, 30)));
        assert_eq!(WallTime::from_free_text("6:30"), Some(wall(6, 30)));
        assert_eq!(WallTime::from_free_text("630"), Some(wall(6, 30)));
        assert_eq!(WallTime::from_free_text("0930"), Some(wall(9, 30)));
        assert_eq!(WallTime::from_free_text("9am"), Some(wall(9, 0)));
        assert_eq!(WallTime::from_free_text("9 PM"), Some(wall(21, 0)));
        assert_eq!(WallTime::from_free_text("  7:15 AM  "), Some(wall(7, 15)));
    }

    #[test]
    fn test_free_text_twelve_oclock() {
        assert_eq!(WallTime::from_free_text("12am"), Some(wall(0, 0)));
        assert_eq!(WallTime::from_free_text("12pm"), Some(wall(12, 0)));
        assert_eq!(WallTime::from_free_text("12:30 am"), Some(wall(0, 30)));
    }

    #[test]
    fn test_free_text_rejects_invalid() {
        assert_eq!(WallTime::from_free_text("25:00"), None);
        assert_eq!(WallTime::from_free_text(""), None);
        assert_eq!(WallTime::from_free_text("   "), None);
        assert_eq!(WallTime::from_free_text("12:60"), None);
        assert_eq!(WallTime::from_free_text("99"), None);
        assert_eq!(WallTime::from_free_text("noon"), None);
        assert_eq!(WallTime::from_free_text("2400"), None);
    }

    #[test]
    fn test_free_text_quirks_preserved() {
        // A glued suffix on the colon form matches the shape but not the
        // meridiem word boundary, so the hour stays untouched.
        assert_eq!(WallTime::from_free_text("6:30pm"), Some(wall(6, 30)));
        // Three-digit runs still take the last two digits as minutes.
        assert_eq!(WallTime::from_free_text("100"), Some(wall(1, 0)));
        // A two-digit run is an hour, and 30 o'clock does not exist.
        assert_eq!(WallTime::from_free_text("30"), None);
        assert_eq!(WallTime::from_free_text("730pm"), None);
    }

    #[test]
    fn test_overnight_depends_on_timezone() {
        let start = utc(2024, 3, 1, 23, 0);
        let end = utc(2024, 3, 2, 1, 0);
        assert!(is_overnight(start, end, chrono_tz::UTC));
        // 15:00 to 17:00 local on the same afternoon.
        assert!(!is_overnight(start, end, chrono_tz::America::Los_Angeles));
    }

    #[test]
    fn test_overnight_false_when_end_earlier() {
        let start = utc(2024, 3, 2, 1, 0);
        let end = utc(2024, 3, 1, 23, 0);
        assert!(!is_overnight(start, end, chrono_tz::UTC));
    }

    #[test]
    fn test_day_bounds_plain_day() {
        let instant = utc(2024, 3, 1, 10, 30);
        assert_eq!(day_start(instant, chrono_tz::UTC), utc(2024, 3, 1, 0, 0));
        assert_eq!(day_end(instant, chrono_tz::UTC), utc(2024, 3, 2, 0, 0));
    }

    #[test]
    fn test_day_start_skips_missing_midnight() {
        // Cuba springs forward at midnight: 2024-03-10 00:00 local does not
        // exist, the day opens at 01:00 CDT which is 05:00 UTC.
        let tz: Tz = "America/Havana".parse().unwrap();
        let instant = utc(2024, 3, 10, 12, 0);
        assert_eq!(day_start(instant, tz), utc(2024, 3, 10, 5, 0));
    }

    #[test]
    fn test_format_datetime_local() {
        let instant = utc(2024, 3, 1, 23, 5);
        assert_eq!(format_datetime_local(instant, chrono_tz::UTC), "2024-03-01T23:05");
        assert_eq!(
            format_datetime_local(instant, chrono_tz::America::New_York),
            "2024-03-01T18:05"
        );
    }

    #[test]
    fn test_format_event_range() {
        let start = utc(2024, 3, 1, 23, 0);
        assert_eq!(
            format_event_range(start, None, chrono_tz::UTC),
            "Mar 1, 2024 11:00 PM"
        );
        assert_eq!(
            format_event_range(start, Some(utc(2024, 3, 1, 23, 45)), chrono_tz::UTC),
            "Mar 1, 2024 11:00 PM – 11:45 PM"
        );
        assert_eq!(
            format_event_range(start, Some(utc(2024, 3, 2, 1, 0)), chrono_tz::UTC),
            "Mar 1, 2024 11:00 PM – Mar 2, 2024 1:00 AM"
        );
    }
}
