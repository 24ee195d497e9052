// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Property parameter vocabularies (RFC 5545 Section 3.2).

use crate::keyword::{
    KW_ATTACH, KW_ATTENDEE, KW_CONFERENCE, KW_CREATED, KW_DTEND, KW_DTSTAMP, KW_DTSTART, KW_DUE,
    KW_EXDATE, KW_FREEBUSY, KW_GEO, KW_LAST_MODIFIED, KW_ORGANIZER, KW_PERCENT_COMPLETE,
    KW_PRIORITY, KW_RDATE, KW_RECURRENCE_ID, KW_REPEAT, KW_RRULE, KW_SEQUENCE, KW_TRIGGER,
    KW_TZOFFSETFROM, KW_TZOFFSETTO, KW_TZURL, KW_URL,
};

/// Value data type of a property (RFC 5545 Section 3.3).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(strum::EnumString, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "SCREAMING-KEBAB-CASE", ascii_case_insensitive)]
pub enum ValueType {
    /// Inline binary data.
    Binary,
    /// `TRUE` / `FALSE`.
    Boolean,
    /// Calendar user address, usually a `mailto:` URI.
    CalAddress,
    /// Calendar date without time.
    Date,
    /// Date with time, floating, UTC or bound to a TZID.
    DateTime,
    /// Duration.
    Duration,
    /// Floating point number.
    Float,
    /// Integer.
    Integer,
    /// Period of time.
    Period,
    /// Recurrence rule.
    Recur,
    /// Free text.
    #[default]
    Text,
    /// Time of day.
    Time,
    /// URI reference.
    Uri,
    /// UTC offset.
    UtcOffset,
}

impl ValueType {
    /// Returns the default value type of a property when no `VALUE` parameter is given.
    #[must_use]
    pub fn default_for(property: &str) -> Self {
        match property {
            KW_DTSTART | KW_DTEND | KW_DUE | KW_RECURRENCE_ID | KW_EXDATE | KW_RDATE
            | KW_DTSTAMP | KW_CREATED | KW_LAST_MODIFIED => Self::DateTime,
            KW_RRULE => Self::Recur,
            KW_ATTENDEE | KW_ORGANIZER => Self::CalAddress,
            KW_SEQUENCE | KW_PRIORITY | KW_PERCENT_COMPLETE | KW_REPEAT => Self::Integer,
            KW_URL | KW_TZURL | KW_ATTACH | KW_CONFERENCE => Self::Uri,
            KW_TRIGGER => Self::Duration,
            KW_TZOFFSETFROM | KW_TZOFFSETTO => Self::UtcOffset,
            KW_FREEBUSY => Self::Period,
            KW_GEO => Self::Float,
            _ => Self::Text,
        }
    }
}

/// Participation status of an attendee (`PARTSTAT`).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(strum::EnumString, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "SCREAMING-KEBAB-CASE", ascii_case_insensitive)]
#[allow(missing_docs)]
pub enum ParticipationStatus {
    #[default]
    NeedsAction,
    Accepted,
    Declined,
    Tentative,
    Delegated,
    Completed,
    InProcess,
}

/// Participation role of an attendee (`ROLE`).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(strum::EnumString, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "SCREAMING-KEBAB-CASE", ascii_case_insensitive)]
#[allow(missing_docs)]
pub enum ParticipationRole {
    Chair,
    #[default]
    ReqParticipant,
    OptParticipant,
    NonParticipant,
}

/// Calendar user type of an attendee (`CUTYPE`).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(strum::EnumString, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "SCREAMING-KEBAB-CASE", ascii_case_insensitive)]
#[allow(missing_docs)]
pub enum CalendarUserType {
    #[default]
    Individual,
    Group,
    Resource,
    Room,
    Unknown,
}
