// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Test data factories.

use calsync_caldav::Href;
use calsync_core::{Calendar, DateRange};
use jiff::Timestamp;

/// Collection path of the calendar used throughout the tests.
pub const CAL_HREF: &str = "/dav/calendars/jane/work/";

/// The `work` calendar with a stored token.
pub fn calendar_with_token(token: Option<&str>) -> Calendar {
    let mut calendar = Calendar::new("work", Href::from(CAL_HREF));
    calendar.sync_token = token.map(str::to_string);
    calendar
}

/// A fixed window around 2025-01-15.
pub fn range() -> DateRange {
    let now: Timestamp = "2025-01-15T00:00:00Z".parse().unwrap();
    DateRange::around(now, 30, 365)
}

/// A resource holding one plain event.
pub fn single_ics(uid: &str, summary: &str) -> String {
    format!(
        "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//calsync//Test//EN\r\n\
BEGIN:VEVENT\r\n\
UID:{uid}\r\n\
DTSTAMP:20250101T000000Z\r\n\
DTSTART:20250120T090000Z\r\n\
DTEND:20250120T100000Z\r\n\
SUMMARY:{summary}\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n"
    )
}

/// A weekly series in Europe/Berlin without overrides.
pub fn series_ics(uid: &str) -> String {
    format!(
        "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//calsync//Test//EN\r\n\
{TIMEZONE}\
{master}\
END:VCALENDAR\r\n",
        master = master(uid)
    )
}

/// A weekly series with overrides on 2025-01-13 and 2025-01-20.
pub fn series_with_overrides_ics(uid: &str) -> String {
    format!(
        "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//calsync//Test//EN\r\n\
{TIMEZONE}\
{master}\
BEGIN:VEVENT\r\n\
UID:{uid}\r\n\
DTSTAMP:20250101T000000Z\r\n\
RECURRENCE-ID;TZID=Europe/Berlin:20250113T100000\r\n\
DTSTART;TZID=Europe/Berlin:20250113T120000\r\n\
DTEND;TZID=Europe/Berlin:20250113T130000\r\n\
SUMMARY:Team sync\r\n\
LOCATION:Room 2\r\n\
ATTENDEE;CN=Bob;PARTSTAT=NEEDS-ACTION:mailto:bob@example.com\r\n\
SEQUENCE:1\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:{uid}\r\n\
DTSTAMP:20250101T000000Z\r\n\
RECURRENCE-ID;TZID=Europe/Berlin:20250120T100000\r\n\
DTSTART;TZID=Europe/Berlin:20250120T100000\r\n\
DTEND;TZID=Europe/Berlin:20250120T110000\r\n\
SUMMARY:Team sync (long)\r\n\
ATTENDEE;CN=Bob;PARTSTAT=NEEDS-ACTION:mailto:bob@example.com\r\n\
SEQUENCE:3\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n",
        master = master(uid)
    )
}

fn master(uid: &str) -> String {
    format!(
        "BEGIN:VEVENT\r\n\
UID:{uid}\r\n\
DTSTAMP:20250101T000000Z\r\n\
DTSTART;TZID=Europe/Berlin:20250106T100000\r\n\
DTEND;TZID=Europe/Berlin:20250106T110000\r\n\
RRULE:FREQ=WEEKLY;BYDAY=MO\r\n\
SUMMARY:Team sync\r\n\
ORGANIZER;CN=Jane:mailto:jane@example.com\r\n\
ATTENDEE;CN=Bob;PARTSTAT=NEEDS-ACTION:mailto:bob@example.com\r\n\
ATTENDEE;CN=Carol;PARTSTAT=ACCEPTED:mailto:carol@example.com\r\n\
SEQUENCE:2\r\n\
BEGIN:VALARM\r\n\
ACTION:DISPLAY\r\n\
TRIGGER:-PT15M\r\n\
DESCRIPTION:Reminder\r\n\
END:VALARM\r\n\
END:VEVENT\r\n"
    )
}

const TIMEZONE: &str = "BEGIN:VTIMEZONE\r\n\
TZID:Europe/Berlin\r\n\
BEGIN:STANDARD\r\n\
DTSTART:19701025T030000\r\n\
TZOFFSETFROM:+0200\r\n\
TZOFFSETTO:+0100\r\n\
END:STANDARD\r\n\
END:VTIMEZONE\r\n";
