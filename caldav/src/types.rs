// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::ops::Deref;

use calsync_ical::Component;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident, $what:literal) => {
        $(#[$meta])*
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Wraps a raw ", $what, ".")]
            #[must_use]
            pub const fn new(value: String) -> Self {
                Self(value)
            }

            #[doc = concat!("The raw ", $what, ".")]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }
    };
}

string_newtype!(
    /// Path of a collection or resource on the server, e.g.
    /// `/dav/calendars/jane/work/abc.ics`.
    #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
    Href,
    "path"
);

string_newtype!(
    /// Opaque entity tag; compared byte for byte in `If-Match`.
    #[derive(Debug, Clone, PartialEq, Eq)]
    ETag,
    "entity tag"
);

impl Href {
    /// The last path segment, ignoring a trailing slash.
    #[must_use]
    pub fn file_name(&self) -> &str {
        let trimmed = self.0.trim_end_matches('/');
        trimmed.rsplit('/').next().unwrap_or(trimmed)
    }

    /// The enclosing collection, with its trailing slash.
    #[must_use]
    pub fn parent(&self) -> Self {
        let trimmed = self.0.trim_end_matches('/');
        let parent = trimmed
            .rfind('/')
            .and_then(|idx| trimmed.get(..=idx))
            .unwrap_or("/");
        Self(parent.to_owned())
    }

    /// A child of this collection.
    #[must_use]
    pub fn join(&self, name: &str) -> Self {
        let sep = if self.0.ends_with('/') { "" } else { "/" };
        Self(format!("{}{sep}{name}", self.0))
    }
}

/// A calendar object resource.
///
/// One resource holds every component that shares a `UID`: the master
/// `VEVENT`, its overrides, and the `VTIMEZONE` definitions they reference.
#[derive(Debug, Clone)]
pub struct CalendarResource {
    /// The href of the resource.
    pub href: Href,
    /// The entity tag of the resource, if the server sent one.
    pub etag: Option<ETag>,
    /// The `VCALENDAR` component.
    pub data: Component,
}

impl CalendarResource {
    /// Creates a new `CalendarResource`.
    #[must_use]
    pub const fn new(href: Href, etag: Option<ETag>, data: Component) -> Self {
        Self { href, etag, data }
    }
}

/// A calendar collection as reported by `PROPFIND`.
#[derive(Debug, Clone, Default)]
pub struct CalendarCollection {
    /// The href of the calendar collection.
    pub href: Href,
    /// The display name of the calendar.
    pub display_name: Option<String>,
    /// The description of the calendar.
    pub description: Option<String>,
    /// The calendar color, usually `#RRGGBB` or `#RRGGBBAA`.
    pub color: Option<String>,
    /// Supported component types (VEVENT, VTODO, etc.).
    pub supported_components: Vec<String>,
    /// The current collection sync token (RFC 6578).
    pub sync_token: Option<String>,
}

impl CalendarCollection {
    /// A collection known only by its path.
    #[must_use]
    pub fn new(href: Href) -> Self {
        Self {
            href,
            ..Self::default()
        }
    }

    /// Returns true when the collection can hold events.
    ///
    /// Servers that omit `supported-calendar-component-set` accept everything.
    #[must_use]
    pub fn supports_events(&self) -> bool {
        self.supported_components.is_empty()
            || self
                .supported_components
                .iter()
                .any(|c| c.eq_ignore_ascii_case("VEVENT"))
    }
}
