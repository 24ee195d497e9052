// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Occurrence identifiers.
//!
//! Every occurrence of a series is addressed by the `UID` shared by the
//! series (the base id) plus, for overrides and expanded instances, its
//! `RECURRENCE-ID`. The textual form is `base` or `base/recurrence-id`.

use std::fmt;

const SEPARATOR: char = '/';

/// Identifier of one occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OccurrenceId {
    base_id: String,
    recurrence_id: Option<String>,
}

impl OccurrenceId {
    /// Identifier of a master or non-recurring event.
    pub fn new(base_id: impl Into<String>) -> Self {
        Self {
            base_id: base_id.into(),
            recurrence_id: None,
        }
    }

    /// Identifier of one instance of a series.
    pub fn instance(base_id: impl Into<String>, recurrence_id: impl Into<String>) -> Self {
        Self {
            base_id: base_id.into(),
            recurrence_id: Some(recurrence_id.into()),
        }
    }

    /// Splits `base/recurrence-id` at the first separator.
    #[must_use]
    pub fn parse(id: &str) -> Self {
        match id.split_once(SEPARATOR) {
            Some((base, rid)) => Self::instance(base, rid),
            None => Self::new(id),
        }
    }

    /// The id shared by every occurrence of the series.
    #[must_use]
    pub fn base_id(&self) -> &str {
        &self.base_id
    }

    /// The recurrence id, for instances.
    #[must_use]
    pub fn recurrence_id(&self) -> Option<&str> {
        self.recurrence_id.as_deref()
    }

    /// Returns true for instances of a series.
    #[must_use]
    pub const fn is_instance(&self) -> bool {
        self.recurrence_id.is_some()
    }

    /// The identifier of the series master.
    #[must_use]
    pub fn master(&self) -> Self {
        Self::new(self.base_id.clone())
    }
}

impl fmt::Display for OccurrenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.recurrence_id {
            Some(rid) => write!(f, "{}{SEPARATOR}{rid}", self.base_id),
            None => f.write_str(&self.base_id),
        }
    }
}

impl From<&str> for OccurrenceId {
    fn from(id: &str) -> Self {
        Self::parse(id)
    }
}

/// Returns the part of an occurrence id before the first `/`.
#[must_use]
pub fn base_id(occurrence_id: &str) -> &str {
    occurrence_id
        .split_once(SEPARATOR)
        .map_or(occurrence_id, |(base, _)| base)
}

/// Returns true if the occurrence id names an instance.
#[must_use]
pub fn is_instance(occurrence_id: &str) -> bool {
    occurrence_id.contains(SEPARATOR)
}

/// Derives the base id from a resource path: the final segment without its
/// extension.
#[must_use]
pub fn base_id_from_href(href: &str) -> &str {
    let name = href
        .trim_end_matches(SEPARATOR)
        .rsplit(SEPARATOR)
        .next()
        .unwrap_or(href);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}
