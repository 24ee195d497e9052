// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Request builders for `CalDAV` operations.

use quick_xml::events::BytesStart;

use crate::error::CalDavError;
use crate::xml::{XmlBody, ns};

/// PROPFIND request builder.
#[derive(Debug, Default)]
pub struct PropFindRequest {
    props: Vec<Prop>,
}

/// Properties to request in PROPFIND.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prop {
    /// Display name.
    DisplayName,
    /// Resource type.
    ResourceType,
    /// `ETag`.
    GetETag,
    /// Collection sync token (RFC 6578).
    SyncToken,
    /// Calendar home set.
    CalendarHomeSet,
    /// Calendar user addresses of the principal.
    CalendarUserAddressSet,
    /// Supported calendar components.
    SupportedCalendarComponents,
    /// Calendar description.
    CalendarDescription,
    /// Calendar color (Apple extension).
    CalendarColor,
}

impl Prop {
    const fn name(self) -> &'static str {
        match self {
            Self::DisplayName => "displayname",
            Self::ResourceType => "resourcetype",
            Self::GetETag => "getetag",
            Self::SyncToken => "sync-token",
            Self::CalendarHomeSet => "calendar-home-set",
            Self::CalendarUserAddressSet => "calendar-user-address-set",
            Self::SupportedCalendarComponents => "supported-calendar-component-set",
            Self::CalendarDescription => "calendar-description",
            Self::CalendarColor => "calendar-color",
        }
    }

    const fn prefix(self) -> &'static str {
        match self {
            Self::DisplayName | Self::ResourceType | Self::GetETag | Self::SyncToken => "D",
            Self::CalendarHomeSet
            | Self::CalendarUserAddressSet
            | Self::SupportedCalendarComponents
            | Self::CalendarDescription => "C",
            Self::CalendarColor => "A",
        }
    }
}

impl PropFindRequest {
    /// Creates a new PROPFIND request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property to the request.
    pub fn add_property(&mut self, prop: Prop) -> &mut Self {
        self.props.push(prop);
        self
    }

    /// Builds the XML body for the PROPFIND request.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, CalDavError> {
        let mut body = XmlBody::new();

        // <D:propfind xmlns:D="DAV:" ...>
        let mut propfind = BytesStart::new("D:propfind");
        propfind.push_attribute(("xmlns:D", ns::DAV));
        if self.props.iter().any(|p| p.prefix() == "C") {
            propfind.push_attribute(("xmlns:C", ns::CALDAV));
        }
        if self.props.iter().any(|p| p.prefix() == "A") {
            propfind.push_attribute(("xmlns:A", ns::APPLE_ICAL));
        }
        body.start(propfind)?;

        body.start(BytesStart::new("D:prop"))?;
        for prop in &self.props {
            body.empty(BytesStart::new(format!("{}:{}", prop.prefix(), prop.name())))?;
        }
        body.end("D:prop")?;

        body.end("D:propfind")?;
        body.finish()
    }
}

/// Time range filter for calendar queries, in UTC basic format
/// (`20260101T000000Z`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRange {
    /// Start date/time.
    pub start: String,
    /// End date/time.
    pub end: Option<String>,
}

impl TimeRange {
    /// Creates a time range.
    #[must_use]
    pub const fn new(start: String, end: Option<String>) -> Self {
        Self { start, end }
    }
}

/// Calendar query request builder.
#[derive(Debug, Default)]
pub struct CalendarQueryRequest {
    time_range: Option<TimeRange>,
    component: Option<String>,
}

impl CalendarQueryRequest {
    /// Creates a new calendar query request.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            time_range: None,
            component: None,
        }
    }

    /// Sets the time range filter.
    #[must_use]
    pub fn time_range(mut self, range: TimeRange) -> Self {
        self.time_range = Some(range);
        self
    }

    /// Sets the component filter (VEVENT, VTODO, etc.).
    #[must_use]
    pub fn component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Builds the XML body for the calendar query request.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, CalDavError> {
        let mut body = XmlBody::new();

        // <C:calendar-query xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
        let mut calendar_query = BytesStart::new("C:calendar-query");
        calendar_query.push_attribute(("xmlns:D", ns::DAV));
        calendar_query.push_attribute(("xmlns:C", ns::CALDAV));
        body.start(calendar_query)?;

        body.start(BytesStart::new("D:prop"))?;
        body.empty(BytesStart::new("D:getetag"))?;
        body.empty(BytesStart::new("C:calendar-data"))?;
        body.end("D:prop")?;

        body.start(BytesStart::new("C:filter"))?;

        // <C:comp-filter name="VCALENDAR">
        let mut comp_filter = BytesStart::new("C:comp-filter");
        comp_filter.push_attribute(("name", "VCALENDAR"));
        body.start(comp_filter)?;

        if let Some(component) = &self.component {
            let mut comp_filter_inner = BytesStart::new("C:comp-filter");
            comp_filter_inner.push_attribute(("name", component.as_str()));
            body.start(comp_filter_inner)?;

            if let Some(tr) = &self.time_range {
                let mut time_range = BytesStart::new("C:time-range");
                time_range.push_attribute(("start", tr.start.as_str()));
                if let Some(end) = &tr.end {
                    time_range.push_attribute(("end", end.as_str()));
                }
                body.empty(time_range)?;
            }

            body.end("C:comp-filter")?;
        }

        body.end("C:comp-filter")?;
        body.end("C:filter")?;
        body.end("C:calendar-query")?;
        body.finish()
    }
}

/// `sync-collection` REPORT builder (RFC 6578).
#[derive(Debug, Clone)]
pub struct SyncCollectionRequest {
    sync_token: String,
}

impl SyncCollectionRequest {
    /// Creates a request for changes since `sync_token`.
    ///
    /// An empty token asks for the full membership of the collection.
    #[must_use]
    pub fn new(sync_token: impl Into<String>) -> Self {
        Self {
            sync_token: sync_token.into(),
        }
    }

    /// Builds the XML body for the REPORT.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, CalDavError> {
        let mut body = XmlBody::new();

        let mut sync_collection = BytesStart::new("D:sync-collection");
        sync_collection.push_attribute(("xmlns:D", ns::DAV));
        body.start(sync_collection)?;

        body.text_element("D:sync-token", &self.sync_token)?;
        body.text_element("D:sync-level", "1")?;

        body.start(BytesStart::new("D:prop"))?;
        body.empty(BytesStart::new("D:getetag"))?;
        body.end("D:prop")?;

        body.end("D:sync-collection")?;
        body.finish()
    }
}
