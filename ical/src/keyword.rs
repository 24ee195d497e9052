// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Keywords defined in iCalendar RFC 5545 that the engine looks up by name.

pub const KW_BEGIN: &str = "BEGIN";
pub const KW_END: &str = "END";

// Section 3.6 - Calendar Components
pub const KW_VCALENDAR: &str = "VCALENDAR";
pub const KW_VEVENT: &str = "VEVENT";
pub const KW_VTIMEZONE: &str = "VTIMEZONE";
pub const KW_VALARM: &str = "VALARM";

// Section 3.2 - Property Parameters
pub const KW_CN: &str = "CN";
pub const KW_CUTYPE: &str = "CUTYPE";
pub const KW_PARTSTAT: &str = "PARTSTAT";
pub const KW_ROLE: &str = "ROLE";
pub const KW_RSVP: &str = "RSVP";
pub const KW_RSVP_TRUE: &str = "TRUE";
pub const KW_RSVP_FALSE: &str = "FALSE";
pub const KW_TZID: &str = "TZID";
pub const KW_VALUE: &str = "VALUE";

// Section 3.3 - Value Data Types
pub const KW_BINARY: &str = "BINARY";
pub const KW_BOOLEAN: &str = "BOOLEAN";
pub const KW_CAL_ADDRESS: &str = "CAL-ADDRESS";
pub const KW_DATE: &str = "DATE";
pub const KW_DATETIME: &str = "DATE-TIME";
pub const KW_DURATION: &str = "DURATION";
pub const KW_FLOAT: &str = "FLOAT";
pub const KW_INTEGER: &str = "INTEGER";
pub const KW_PERIOD: &str = "PERIOD";
pub const KW_RECUR: &str = "RECUR";
pub const KW_TEXT: &str = "TEXT";
pub const KW_TIME: &str = "TIME";
pub const KW_URI: &str = "URI";
pub const KW_UTC_OFFSET: &str = "UTC-OFFSET";

// Section 3.7 / 3.8 - Properties
pub const KW_VERSION: &str = "VERSION";
pub const KW_PRODID: &str = "PRODID";
pub const KW_UID: &str = "UID";
pub const KW_DTSTAMP: &str = "DTSTAMP";
pub const KW_DTSTART: &str = "DTSTART";
pub const KW_DTEND: &str = "DTEND";
pub const KW_DUE: &str = "DUE";
pub const KW_CREATED: &str = "CREATED";
pub const KW_LAST_MODIFIED: &str = "LAST-MODIFIED";
pub const KW_SUMMARY: &str = "SUMMARY";
pub const KW_DESCRIPTION: &str = "DESCRIPTION";
pub const KW_LOCATION: &str = "LOCATION";
pub const KW_CLASS: &str = "CLASS";
pub const KW_TRANSP: &str = "TRANSP";
pub const KW_ORGANIZER: &str = "ORGANIZER";
pub const KW_ATTENDEE: &str = "ATTENDEE";
pub const KW_RRULE: &str = "RRULE";
pub const KW_EXDATE: &str = "EXDATE";
pub const KW_RDATE: &str = "RDATE";
pub const KW_RECURRENCE_ID: &str = "RECURRENCE-ID";
pub const KW_SEQUENCE: &str = "SEQUENCE";
pub const KW_URL: &str = "URL";
pub const KW_TZURL: &str = "TZURL";
pub const KW_TZOFFSETFROM: &str = "TZOFFSETFROM";
pub const KW_TZOFFSETTO: &str = "TZOFFSETTO";
pub const KW_TRIGGER: &str = "TRIGGER";
pub const KW_ATTACH: &str = "ATTACH";
pub const KW_GEO: &str = "GEO";
pub const KW_PERCENT_COMPLETE: &str = "PERCENT-COMPLETE";
pub const KW_PRIORITY: &str = "PRIORITY";
pub const KW_REPEAT: &str = "REPEAT";
pub const KW_FREEBUSY: &str = "FREEBUSY";

// RFC 7986
pub const KW_CONFERENCE: &str = "CONFERENCE";

// Section 3.3.10 - Recurrence Rule parts
pub const KW_RRULE_FREQ: &str = "FREQ";
pub const KW_RRULE_INTERVAL: &str = "INTERVAL";
pub const KW_RRULE_COUNT: &str = "COUNT";
pub const KW_RRULE_UNTIL: &str = "UNTIL";
pub const KW_RRULE_BYDAY: &str = "BYDAY";
