// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use calsync_caldav::{CalendarCollection, Href};

use crate::event::CalendarEvent;

/// A calendar as mirrored in the local cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calendar {
    /// Local identifier, unique within the cache. The last segment of the
    /// collection path unless another calendar already uses it.
    pub id: String,
    /// Collection path on the server.
    pub href: Href,
    /// Display name.
    pub display_name: Option<String>,
    /// Color, as sent by the server.
    pub color: Option<String>,
    /// Addresses of the calendar's owners.
    pub owners: Vec<String>,
    /// Cursor of the last successful diff pass; unset until the first one.
    pub sync_token: Option<String>,
    /// Occurrences keyed by their occurrence id.
    pub events: BTreeMap<String, CalendarEvent>,
}

impl Calendar {
    /// Creates an empty, never synchronized calendar.
    pub fn new(id: impl Into<String>, href: Href) -> Self {
        Self {
            id: id.into(),
            href,
            display_name: None,
            color: None,
            owners: Vec::new(),
            sync_token: None,
            events: BTreeMap::new(),
        }
    }

    /// Local identifiers for a collection, shortest first: trailing path
    /// segments joined by `/`, then the whole path.
    ///
    /// `/dav/calendars/bob/events/` yields `events`, `bob/events`,
    /// `calendars/bob/events`, `dav/calendars/bob/events` and finally the
    /// href itself.
    pub fn id_candidates(href: &Href) -> impl Iterator<Item = String> + '_ {
        let segments = href
            .as_str()
            .split('/')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();
        (1..=segments.len())
            .map(move |n| segments[segments.len() - n..].join("/"))
            .chain(std::iter::once(href.to_string()))
    }

    /// Creates a calendar from its first listing.
    ///
    /// The collection's current sync token is not adopted: events have not
    /// been fetched yet.
    #[must_use]
    pub fn from_collection(id: impl Into<String>, collection: &CalendarCollection) -> Self {
        let mut calendar = Self::new(id, collection.href.clone());
        calendar.update_metadata(collection);
        calendar
    }

    /// Takes over display metadata from a fresh listing.
    pub fn update_metadata(&mut self, collection: &CalendarCollection) {
        self.display_name.clone_from(&collection.display_name);
        self.color.clone_from(&collection.color);
    }

    /// The name to show for the calendar.
    #[must_use]
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }

    /// Iterates over the occurrences of one series.
    pub fn series<'a>(&'a self, base_id: &'a str) -> impl Iterator<Item = &'a CalendarEvent> {
        self.events.values().filter(move |e| e.uid() == base_id)
    }
}
