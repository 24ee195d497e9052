// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::str::FromStr;

use calsync_caldav::{CalendarResource, ETag, Href, TimeRange};
use calsync_ical::keyword::{
    KW_ATTENDEE, KW_CLASS, KW_CN, KW_CUTYPE, KW_DATE, KW_DESCRIPTION, KW_DTEND, KW_DTSTAMP,
    KW_DTSTART, KW_DURATION, KW_EXDATE, KW_LOCATION, KW_ORGANIZER, KW_PARTSTAT,
    KW_RECURRENCE_ID, KW_ROLE, KW_RRULE, KW_RSVP, KW_RSVP_FALSE, KW_RSVP_TRUE, KW_SEQUENCE,
    KW_SUMMARY, KW_TRANSP, KW_TZID, KW_UID, KW_VALUE, KW_VEVENT,
};
use calsync_ical::{
    CalendarUserType, Component, Frequency, ParticipationRole, ParticipationStatus, Property,
    RecurrenceRule, escape_text, unescape_text,
};
use jiff::civil::{self, Time};
use jiff::tz::TimeZone;
use jiff::{SignedDuration, Timestamp};

use crate::identity::OccurrenceId;

const FORMAT_DATE: &str = "%Y%m%d";
const FORMAT_DATETIME: &str = "%Y%m%dT%H%M%S";
const FORMAT_UTC: &str = "%Y%m%dT%H%M%SZ";

/// A start or end value as written in iCalendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTime {
    /// All-day value (`VALUE=DATE`).
    Date(civil::Date),
    /// Local time without a zone.
    Floating(civil::DateTime),
    /// UTC instant (`Z` suffix).
    Utc(Timestamp),
    /// Local time in a named zone (`TZID=`).
    Zoned {
        /// Wall-clock time.
        datetime: civil::DateTime,
        /// Zone identifier as written in the resource.
        tzid: String,
    },
}

impl EventTime {
    /// Reads a date or date-time property.
    #[must_use]
    pub fn from_property(property: &Property) -> Option<Self> {
        let value = property.value.trim();
        let is_date = property
            .parameter(KW_VALUE)
            .is_some_and(|v| v.eq_ignore_ascii_case(KW_DATE))
            || value.len() == 8;
        if is_date {
            return parse_date(value).map(Self::Date);
        }

        if let Some(utc) = value.strip_suffix('Z') {
            let timestamp = parse_datetime(utc)?.to_zoned(TimeZone::UTC).ok()?.timestamp();
            return Some(Self::Utc(timestamp));
        }

        let datetime = parse_datetime(value)?;
        Some(match property.parameter(KW_TZID) {
            Some(tzid) => Self::Zoned {
                datetime,
                tzid: tzid.to_string(),
            },
            None => Self::Floating(datetime),
        })
    }

    /// Writes the value as a property called `name`.
    #[must_use]
    pub fn to_property(&self, name: &str) -> Property {
        let property = Property::new(name, self.value());
        match self {
            Self::Date(_) => property.with_parameter(KW_VALUE, KW_DATE),
            Self::Zoned { tzid, .. } => property.with_parameter(KW_TZID, tzid.clone()),
            Self::Floating(_) | Self::Utc(_) => property,
        }
    }

    /// The wire form, e.g. `20250315`, `20250315T100000` or `20250315T100000Z`.
    #[must_use]
    pub fn value(&self) -> String {
        match self {
            Self::Date(date) => date.strftime(FORMAT_DATE).to_string(),
            Self::Floating(datetime) | Self::Zoned { datetime, .. } => {
                datetime.strftime(FORMAT_DATETIME).to_string()
            }
            Self::Utc(timestamp) => timestamp.strftime(FORMAT_UTC).to_string(),
        }
    }

    /// Returns true for all-day values.
    #[must_use]
    pub const fn is_date(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// The zone identifier, for zoned values.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        match self {
            Self::Zoned { tzid, .. } => Some(tzid),
            _ => None,
        }
    }

    /// The instant this value denotes; dates and floating times are read as UTC.
    #[must_use]
    pub fn timestamp(&self) -> Option<Timestamp> {
        match self {
            Self::Date(date) => date
                .to_datetime(Time::midnight())
                .to_zoned(TimeZone::UTC)
                .ok()
                .map(|z| z.timestamp()),
            Self::Floating(datetime) => datetime.to_zoned(TimeZone::UTC).ok().map(|z| z.timestamp()),
            Self::Utc(timestamp) => Some(*timestamp),
            Self::Zoned { datetime, tzid } => datetime.in_tz(tzid).ok().map(|z| z.timestamp()),
        }
    }

    /// Moves `self` by the offset between `from` and `to`.
    ///
    /// Dates move by whole days, times by the wall-clock offset; a zone change
    /// from `from` to `to` is taken over. Returns `None` when `from` and `to`
    /// are of different kinds or the offset does not apply to `self`.
    #[must_use]
    pub fn shifted(&self, from: &Self, to: &Self) -> Option<Self> {
        if std::mem::discriminant(from) != std::mem::discriminant(to) {
            return None;
        }
        if let (Self::Date(from), Self::Date(to)) = (from, to) {
            let days = from.until(*to).ok()?;
            return match self {
                Self::Date(date) => date.checked_add(days).ok().map(Self::Date),
                _ => None,
            };
        }

        let offset = from.wall_clock()?.duration_until(to.wall_clock()?);
        match self {
            Self::Date(_) => None,
            Self::Floating(datetime) => datetime.checked_add(offset).ok().map(Self::Floating),
            Self::Utc(timestamp) => timestamp.checked_add(offset).ok().map(Self::Utc),
            Self::Zoned { datetime, tzid } => {
                let tzid = match (from, to) {
                    (Self::Zoned { tzid: a, .. }, Self::Zoned { tzid: b, .. }) if a != b => b,
                    _ => tzid,
                };
                datetime.checked_add(offset).ok().map(|datetime| Self::Zoned {
                    datetime,
                    tzid: tzid.clone(),
                })
            }
        }
    }

    fn wall_clock(&self) -> Option<civil::DateTime> {
        match self {
            Self::Date(_) => None,
            Self::Floating(datetime) | Self::Zoned { datetime, .. } => Some(*datetime),
            Self::Utc(timestamp) => Some(timestamp.to_zoned(TimeZone::UTC).datetime()),
        }
    }
}

fn parse_number<T: FromStr>(s: &str, range: std::ops::Range<usize>) -> Option<T> {
    s.get(range)?.parse().ok()
}

fn parse_date(s: &str) -> Option<civil::Date> {
    if s.len() != 8 {
        return None;
    }
    civil::Date::new(
        parse_number(s, 0..4)?,
        parse_number(s, 4..6)?,
        parse_number(s, 6..8)?,
    )
    .ok()
}

fn parse_datetime(s: &str) -> Option<civil::DateTime> {
    if s.len() != 15 || s.get(8..9) != Some("T") {
        return None;
    }
    let date = parse_date(s.get(..8)?)?;
    let time = Time::new(
        parse_number(s, 9..11)?,
        parse_number(s, 11..13)?,
        parse_number(s, 13..15)?,
        0,
    )
    .ok()?;
    Some(civil::DateTime::from_parts(date, time))
}

/// Strips a trailing `Z` so that UTC and floating spellings of one recurrence
/// id compare equal.
#[must_use]
pub fn normalize_recurrence_id(rid: &str) -> &str {
    rid.trim().strip_suffix('Z').unwrap_or_else(|| rid.trim())
}

/// Builds a `RECURRENCE-ID` (or `EXDATE`) property matching the series start.
pub(crate) fn recurrence_property(name: &str, rid: &str, tzid: Option<&str>) -> Property {
    let property = Property::new(name, rid);
    if rid.len() == 8 {
        property.with_parameter(KW_VALUE, KW_DATE)
    } else if rid.ends_with('Z') {
        property
    } else if let Some(tzid) = tzid {
        property.with_parameter(KW_TZID, tzid)
    } else {
        property
    }
}

/// An attendee of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attendee {
    /// Calendar user address, usually a `mailto:` URI.
    pub address: String,
    /// Common name.
    pub name: Option<String>,
    /// Participation status.
    pub status: ParticipationStatus,
    /// Whether a reply is expected.
    pub rsvp: bool,
    /// Participation role.
    pub role: ParticipationRole,
    /// Calendar user type.
    pub user_type: CalendarUserType,
}

impl Attendee {
    /// Creates an attendee that has not answered yet.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: None,
            status: ParticipationStatus::default(),
            rsvp: false,
            role: ParticipationRole::default(),
            user_type: CalendarUserType::default(),
        }
    }

    /// Reads an `ATTENDEE` property; unknown parameter values fall back to defaults.
    #[must_use]
    pub fn from_property(property: &Property) -> Self {
        fn parsed<T: FromStr + Default>(property: &Property, name: &str) -> T {
            property
                .parameter(name)
                .and_then(|v| T::from_str(v).ok())
                .unwrap_or_default()
        }

        Self {
            address: property.value.clone(),
            name: property.parameter(KW_CN).map(str::to_string),
            status: parsed(property, KW_PARTSTAT),
            rsvp: property
                .parameter(KW_RSVP)
                .is_some_and(|v| v.eq_ignore_ascii_case(KW_RSVP_TRUE)),
            role: parsed(property, KW_ROLE),
            user_type: parsed(property, KW_CUTYPE),
        }
    }

    /// Writes the attendee as an `ATTENDEE` property.
    #[must_use]
    pub fn to_property(&self) -> Property {
        let mut property = Property::new(KW_ATTENDEE, self.address.clone())
            .with_parameter(KW_PARTSTAT, self.status.to_string())
            .with_parameter(KW_ROLE, self.role.to_string())
            .with_parameter(KW_CUTYPE, self.user_type.to_string())
            .with_parameter(KW_RSVP, if self.rsvp { KW_RSVP_TRUE } else { KW_RSVP_FALSE });
        if let Some(name) = &self.name {
            property.set_parameter(KW_CN, name.clone());
        }
        property
    }

    /// The address without its `mailto:` scheme.
    #[must_use]
    pub fn email(&self) -> &str {
        strip_mailto(&self.address)
    }
}

pub(crate) fn strip_mailto(address: &str) -> &str {
    match address.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("mailto:") => address.get(7..).unwrap_or(""),
        _ => address,
    }
}

/// How a series ends.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RepeatEnd {
    /// Repeats forever.
    #[default]
    Never,
    /// Stops after this many occurrences (`COUNT`).
    After(u32),
    /// Stops at this date or date-time (`UNTIL`, wire form).
    Until(String),
}

/// The recurrence rule of a series master.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repetition {
    /// Frequency.
    pub frequency: Frequency,
    /// Interval between occurrences, at least 1.
    pub interval: u32,
    /// Weekday filter such as `MO` or `-1FR`.
    pub by_day: Vec<String>,
    /// End condition.
    pub end: RepeatEnd,
    /// Other rule parts kept verbatim.
    pub extra: Vec<(String, String)>,
}

impl Repetition {
    /// A rule repeating every `frequency` forever.
    #[must_use]
    pub const fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: 1,
            by_day: Vec::new(),
            end: RepeatEnd::Never,
            extra: Vec::new(),
        }
    }

    /// Converts back to an `RRULE` value.
    #[must_use]
    pub fn to_rule(&self) -> RecurrenceRule {
        let mut rule = RecurrenceRule::new(self.frequency);
        rule.interval = (self.interval > 1).then_some(self.interval);
        match &self.end {
            RepeatEnd::Never => {}
            RepeatEnd::After(count) => rule.count = Some(*count),
            RepeatEnd::Until(until) => rule.until = Some(until.clone()),
        }
        rule.by_day.clone_from(&self.by_day);
        rule.other.clone_from(&self.extra);
        rule
    }
}

impl From<RecurrenceRule> for Repetition {
    fn from(rule: RecurrenceRule) -> Self {
        let end = match (rule.count, rule.until) {
            (Some(count), _) => RepeatEnd::After(count),
            (None, Some(until)) => RepeatEnd::Until(until),
            (None, None) => RepeatEnd::Never,
        };
        Self {
            frequency: rule.freq,
            interval: rule.interval.unwrap_or(1).max(1),
            by_day: rule.by_day,
            end,
            extra: rule.other,
        }
    }
}

/// One occurrence of an event as held in the local cache.
///
/// A recurring series stored in one resource yields the master plus one
/// record per override, all sharing [`CalendarEvent::url`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    /// Occurrence identifier (`UID` plus optional `RECURRENCE-ID`).
    pub id: OccurrenceId,
    /// Owning calendar.
    pub cal_id: String,
    /// Resource path shared by all occurrences of the series.
    pub url: Href,
    /// Entity tag of the resource when it was read.
    pub etag: Option<ETag>,
    /// Start.
    pub start: Option<EventTime>,
    /// End.
    pub end: Option<EventTime>,
    /// Summary.
    pub title: String,
    /// Description.
    pub description: Option<String>,
    /// Location.
    pub location: Option<String>,
    /// Organizer address.
    pub organizer: Option<String>,
    /// Attendees.
    pub attendees: Vec<Attendee>,
    /// Recurrence rule; only masters carry one.
    pub repetition: Option<Repetition>,
    /// Revision counter (`SEQUENCE`).
    pub sequence: u32,
    /// Access class (`CLASS`).
    pub class: Option<String>,
    /// Busy/free transparency (`TRANSP`).
    pub transparency: Option<String>,
    /// Excluded dates of the series, wire form.
    pub exdates: Vec<String>,
}

impl CalendarEvent {
    /// Creates an event with only an id, a calendar and a resource path.
    pub fn new(id: OccurrenceId, cal_id: impl Into<String>, url: Href) -> Self {
        Self {
            id,
            cal_id: cal_id.into(),
            url,
            etag: None,
            start: None,
            end: None,
            title: String::new(),
            description: None,
            location: None,
            organizer: None,
            attendees: Vec::new(),
            repetition: None,
            sequence: 0,
            class: None,
            transparency: None,
            exdates: Vec::new(),
        }
    }

    /// The id shared by every occurrence of the series.
    #[must_use]
    pub fn uid(&self) -> &str {
        self.id.base_id()
    }

    /// The recurrence id, for instances.
    #[must_use]
    pub fn recurrence_id(&self) -> Option<&str> {
        self.id.recurrence_id()
    }

    /// Returns true for all-day events.
    #[must_use]
    pub fn is_allday(&self) -> bool {
        self.start.as_ref().is_some_and(EventTime::is_date)
    }

    /// The zone of the start, if any.
    #[must_use]
    pub fn timezone(&self) -> Option<&str> {
        self.start.as_ref().and_then(EventTime::tzid)
    }

    /// Returns true if the event belongs to a recurring series.
    #[must_use]
    pub const fn is_recurring(&self) -> bool {
        self.repetition.is_some() || self.id.is_instance()
    }

    /// The occurrence of this series master at `rid`, as generated by its
    /// rule without an override.
    ///
    /// Returns `None` for events that are not a series master and for
    /// excluded recurrence ids. The rule itself is not expanded: `rid` is
    /// trusted to be one of its dates.
    #[must_use]
    pub fn instance_of(&self, rid: &str) -> Option<Self> {
        if self.repetition.is_none() || self.id.is_instance() {
            return None;
        }
        let rid = normalize_recurrence_id(rid);
        if self.exdates.iter().any(|d| normalize_recurrence_id(d) == rid) {
            return None;
        }

        let mut instance = self.clone();
        instance.id = OccurrenceId::instance(self.uid(), rid);
        instance.repetition = None;
        instance.exdates.clear();

        let start = EventTime::from_property(&recurrence_property(
            KW_DTSTART,
            rid,
            self.timezone(),
        ));
        if let (Some(from), Some(to)) = (&self.start, &start) {
            instance.end = self.end.as_ref().and_then(|end| end.shifted(from, to));
            instance.start = start;
        }
        Some(instance)
    }

    /// Reads a `VEVENT`; returns `None` if it has no `UID`.
    #[must_use]
    pub fn from_component(
        cal_id: &str,
        url: &Href,
        etag: Option<&ETag>,
        component: &Component,
    ) -> Option<Self> {
        let uid = component.value(KW_UID)?.trim();
        if uid.is_empty() {
            return None;
        }
        let id = match component.value(KW_RECURRENCE_ID) {
            Some(rid) => OccurrenceId::instance(uid, rid.trim()),
            None => OccurrenceId::new(uid),
        };
        let text = |name: &str| component.value(name).map(unescape_text);

        let repetition = if id.is_instance() {
            None
        } else {
            component
                .value(KW_RRULE)
                .and_then(|rule| match RecurrenceRule::from_str(rule) {
                    Ok(rule) => Some(Repetition::from(rule)),
                    Err(e) => {
                        tracing::warn!(uid, err = %e, "ignoring unreadable recurrence rule");
                        None
                    }
                })
        };

        Some(Self {
            id,
            cal_id: cal_id.to_string(),
            url: url.clone(),
            etag: etag.cloned(),
            start: component.property(KW_DTSTART).and_then(EventTime::from_property),
            end: component.property(KW_DTEND).and_then(EventTime::from_property),
            title: text(KW_SUMMARY).unwrap_or_default(),
            description: text(KW_DESCRIPTION),
            location: text(KW_LOCATION),
            organizer: component.value(KW_ORGANIZER).map(str::to_string),
            attendees: component
                .properties_named(KW_ATTENDEE)
                .map(Attendee::from_property)
                .collect(),
            repetition,
            sequence: component
                .value(KW_SEQUENCE)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(0),
            class: component.value(KW_CLASS).map(str::to_string),
            transparency: component.value(KW_TRANSP).map(str::to_string),
            exdates: component
                .properties_named(KW_EXDATE)
                .flat_map(|p| p.value.split(','))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect(),
        })
    }

    /// Reads every `VEVENT` of a resource: the master and its overrides.
    #[must_use]
    pub fn from_resource(cal_id: &str, resource: &CalendarResource) -> Vec<Self> {
        resource
            .data
            .children_named(KW_VEVENT)
            .filter_map(|c| {
                Self::from_component(cal_id, &resource.href, resource.etag.as_ref(), c)
            })
            .collect()
    }

    /// Builds a fresh `VEVENT`.
    #[must_use]
    pub fn to_component(&self) -> Component {
        let mut component = Component::new(KW_VEVENT)
            .with_property(Property::new(KW_UID, self.uid()))
            .with_property(Property::new(
                KW_DTSTAMP,
                Timestamp::now().strftime(FORMAT_UTC).to_string(),
            ));
        if let Some(rid) = self.recurrence_id() {
            component.push_property(recurrence_property(KW_RECURRENCE_ID, rid, self.timezone()));
        }
        self.apply_to(&mut component);
        if self.repetition.is_some() {
            for exdate in &self.exdates {
                component.push_property(recurrence_property(KW_EXDATE, exdate, self.timezone()));
            }
        }
        component
    }

    /// Writes the event's fields onto an existing `VEVENT`.
    ///
    /// Properties whose value did not change keep their parameters; unknown
    /// properties, alarms and `EXDATE`s are left alone. A missing start, end or
    /// recurrence rule leaves the existing one in place.
    pub fn apply_to(&self, component: &mut Component) {
        if component.value(KW_UID) != Some(self.uid()) {
            component.set_property(Property::new(KW_UID, self.uid()));
        }
        component.set_property(Property::new(KW_SEQUENCE, self.sequence.to_string()));

        if let Some(start) = &self.start {
            set_time(component, KW_DTSTART, start);
        }
        if let Some(end) = &self.end {
            set_time(component, KW_DTEND, end);
            component.remove_properties(KW_DURATION);
        }

        set_text(component, KW_SUMMARY, Some(&self.title).filter(|t| !t.is_empty()));
        set_text(component, KW_DESCRIPTION, self.description.as_ref());
        set_text(component, KW_LOCATION, self.location.as_ref());
        set_raw(component, KW_CLASS, self.class.as_deref());
        set_raw(component, KW_TRANSP, self.transparency.as_deref());
        set_raw(component, KW_ORGANIZER, self.organizer.as_deref());

        let current = component
            .properties_named(KW_ATTENDEE)
            .map(Attendee::from_property)
            .collect::<Vec<_>>();
        if current != self.attendees {
            component.remove_properties(KW_ATTENDEE);
            for attendee in &self.attendees {
                component.push_property(attendee.to_property());
            }
        }

        if self.id.is_instance() {
            component.remove_properties(KW_RRULE);
        } else if let Some(repetition) = &self.repetition {
            let rule = repetition.to_rule();
            let unchanged = component
                .value(KW_RRULE)
                .and_then(|r| RecurrenceRule::from_str(r).ok())
                .is_some_and(|r| Repetition::from(r) == *repetition);
            if !unchanged {
                component.set_property(Property::new(KW_RRULE, rule.to_string()));
            }
        }
    }
}

fn set_time(component: &mut Component, name: &str, time: &EventTime) {
    let unchanged = component
        .property(name)
        .and_then(EventTime::from_property)
        .is_some_and(|t| t == *time);
    if !unchanged {
        component.set_property(time.to_property(name));
    }
}

fn set_text(component: &mut Component, name: &str, value: Option<&String>) {
    match value {
        Some(value) => {
            if component.value(name).map(unescape_text).as_ref() != Some(value) {
                component.set_property(Property::new(name, escape_text(value)));
            }
        }
        None => {
            component.remove_properties(name);
        }
    }
}

fn set_raw(component: &mut Component, name: &str, value: Option<&str>) {
    match value {
        Some(value) => {
            if component.value(name) != Some(value) {
                component.set_property(Property::new(name, value));
            }
        }
        None => {
            component.remove_properties(name);
        }
    }
}

/// A time window, threaded explicitly into every range query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// Inclusive start.
    pub start: Timestamp,
    /// Exclusive end.
    pub end: Timestamp,
}

impl DateRange {
    /// Creates a range.
    #[must_use]
    pub const fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// The window from `past_days` before `now` to `future_days` after it.
    #[must_use]
    pub fn around(now: Timestamp, past_days: u32, future_days: u32) -> Self {
        let day = SignedDuration::from_hours(24);
        let start = now
            .checked_sub(day * i32::try_from(past_days).unwrap_or(i32::MAX))
            .unwrap_or(Timestamp::MIN);
        let end = now
            .checked_add(day * i32::try_from(future_days).unwrap_or(i32::MAX))
            .unwrap_or(Timestamp::MAX);
        Self { start, end }
    }

    /// The range as a calendar-query time-range filter.
    #[must_use]
    pub fn to_time_range(&self) -> TimeRange {
        TimeRange::new(
            self.start.strftime(FORMAT_UTC).to_string(),
            Some(self.end.strftime(FORMAT_UTC).to_string()),
        )
    }
}
