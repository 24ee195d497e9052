// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory mirror of the server's calendars.
//!
//! [`LocalCacheStore`] is the only writer of the event mapping. It changes
//! through exactly two doors: merging a [`SyncDiffResult`] and applying (or
//! rolling back) an optimistic local change. Each runs as one `&mut self`
//! step, so no reader ever sees a half-merged calendar.

use std::collections::{BTreeMap, HashSet};

use calsync_caldav::CalendarCollection;

use crate::calendar::Calendar;
use crate::error::SyncError;
use crate::event::CalendarEvent;
use crate::identity::OccurrenceId;
use crate::reconciler::{SyncDiffResult, SyncStatus};

/// What a merge did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Occurrences removed from the cache.
    pub removed: usize,
    /// Occurrences inserted or replaced.
    pub upserted: usize,
    /// The calendar's events were replaced wholesale.
    pub replaced: bool,
}

/// A local change made ahead of the matching server write.
#[derive(Debug, Clone)]
pub enum OptimisticChange {
    /// Insert or replace one occurrence.
    Upsert(CalendarEvent),
    /// Remove one occurrence.
    Remove {
        /// Owning calendar.
        cal_id: String,
        /// Occurrence id.
        id: String,
    },
    /// Remove every occurrence of a series.
    RemoveSeries {
        /// Owning calendar.
        cal_id: String,
        /// Base id of the series.
        base_id: String,
    },
}

/// An applied optimistic change together with its inverse.
#[derive(Debug, Clone)]
#[must_use = "an optimistic update must be kept to roll it back"]
pub struct OptimisticUpdate {
    cal_id: String,
    previous: Vec<(String, Option<CalendarEvent>)>,
}

impl OptimisticUpdate {
    /// The calendar the change applies to.
    #[must_use]
    pub fn cal_id(&self) -> &str {
        &self.cal_id
    }

    /// Number of occurrences the change touched.
    #[must_use]
    pub fn len(&self) -> usize {
        self.previous.len()
    }

    /// Returns true if the change touched nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }
}

/// The local cache of calendars and their occurrences.
#[derive(Debug, Clone, Default)]
pub struct LocalCacheStore {
    calendars: BTreeMap<String, Calendar>,
}

impl LocalCacheStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a listed collection; creates the calendar on first sight and
    /// only refreshes its metadata afterwards. Returns the calendar id.
    ///
    /// A collection keeps the id it got first. A new collection whose last
    /// path segment is already taken by another one gets a longer id, see
    /// [`Calendar::id_candidates`].
    pub fn upsert_calendar(&mut self, collection: &CalendarCollection) -> String {
        if let Some(calendar) = self
            .calendars
            .values_mut()
            .find(|c| c.href == collection.href)
        {
            calendar.update_metadata(collection);
            return calendar.id.clone();
        }

        let id = Calendar::id_candidates(&collection.href)
            .find(|id| !self.calendars.contains_key(id))
            .unwrap_or_else(|| collection.href.to_string());
        tracing::debug!(cal_id = %id, href = %collection.href, "new calendar");
        self.calendars
            .insert(id.clone(), Calendar::from_collection(id.clone(), collection));
        id
    }

    /// Sets the owner addresses of every calendar.
    pub fn set_owners(&mut self, owners: &[String]) {
        for calendar in self.calendars.values_mut() {
            calendar.owners = owners.to_vec();
        }
    }

    /// Drops calendars that are no longer listed.
    pub fn retain_calendars(&mut self, ids: &HashSet<String>) {
        self.calendars.retain(|id, _| ids.contains(id));
    }

    /// Merges the result of a sync pass into its calendar.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::UnknownCalendar`] if the calendar is not cached.
    pub fn apply_diff(&mut self, result: SyncDiffResult) -> Result<MergeSummary, SyncError> {
        let calendar = self
            .calendars
            .get_mut(&result.cal_id)
            .ok_or_else(|| SyncError::UnknownCalendar(result.cal_id.clone()))?;

        let summary = match result.status {
            SyncStatus::TokenInvalid => {
                let removed = calendar.events.len();
                calendar.events = result
                    .created_or_updated_events
                    .into_iter()
                    .map(|mut e| {
                        e.cal_id.clone_from(&calendar.id);
                        (e.id.to_string(), e)
                    })
                    .collect();
                calendar.sync_token = result.sync_token;
                MergeSummary {
                    removed,
                    upserted: calendar.events.len(),
                    replaced: true,
                }
            }
            SyncStatus::Success => {
                // A refetched resource carries its whole series.
                let refetched = result
                    .created_or_updated_events
                    .iter()
                    .map(|e| e.uid().to_string())
                    .collect::<HashSet<_>>();
                let stale_urls = result
                    .refetched_hrefs
                    .iter()
                    .chain(&result.deleted_hrefs)
                    .collect::<HashSet<_>>();

                let before = calendar.events.len();
                calendar.events.retain(|id, event| {
                    !(result.deleted_events.contains(id)
                        || result.deleted_events.contains(event.uid())
                        || refetched.contains(event.uid())
                        || stale_urls.contains(&event.url))
                });
                let removed = before - calendar.events.len();

                let upserted = result.created_or_updated_events.len();
                for mut event in result.created_or_updated_events {
                    event.cal_id.clone_from(&calendar.id);
                    calendar.events.insert(event.id.to_string(), event);
                }
                if let Some(token) = result.sync_token {
                    calendar.sync_token = Some(token);
                }
                MergeSummary {
                    removed,
                    upserted,
                    replaced: false,
                }
            }
        };

        tracing::debug!(
            cal_id = %calendar.id,
            removed = summary.removed,
            upserted = summary.upserted,
            replaced = summary.replaced,
            "merged diff"
        );
        Ok(summary)
    }

    /// Applies a local change ahead of the server write.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::UnknownCalendar`] if the calendar is not cached.
    pub fn apply_optimistic_update(
        &mut self,
        change: OptimisticChange,
    ) -> Result<OptimisticUpdate, SyncError> {
        let cal_id = match &change {
            OptimisticChange::Upsert(event) => event.cal_id.clone(),
            OptimisticChange::Remove { cal_id, .. } | OptimisticChange::RemoveSeries { cal_id, .. } => {
                cal_id.clone()
            }
        };
        let calendar = self
            .calendars
            .get_mut(&cal_id)
            .ok_or_else(|| SyncError::UnknownCalendar(cal_id.clone()))?;

        let previous = match change {
            OptimisticChange::Upsert(event) => {
                let key = event.id.to_string();
                let old = calendar.events.insert(key.clone(), event);
                vec![(key, old)]
            }
            OptimisticChange::Remove { id, .. } => {
                let old = calendar.events.remove(&id);
                vec![(id, old)]
            }
            OptimisticChange::RemoveSeries { base_id, .. } => {
                let keys = calendar
                    .series(&base_id)
                    .map(|e| e.id.to_string())
                    .collect::<Vec<_>>();
                keys.into_iter()
                    .map(|key| {
                        let old = calendar.events.remove(&key);
                        (key, old)
                    })
                    .collect()
            }
        };

        Ok(OptimisticUpdate { cal_id, previous })
    }

    /// Restores the state from before an optimistic change.
    pub fn rollback(&mut self, update: OptimisticUpdate) {
        let Some(calendar) = self.calendars.get_mut(&update.cal_id) else {
            tracing::warn!(cal_id = %update.cal_id, "calendar vanished before rollback");
            return;
        };
        for (key, previous) in update.previous.into_iter().rev() {
            match previous {
                Some(event) => {
                    calendar.events.insert(key, event);
                }
                None => {
                    calendar.events.remove(&key);
                }
            }
        }
    }

    /// Returns a cached calendar.
    #[must_use]
    pub fn calendar(&self, id: &str) -> Option<&Calendar> {
        self.calendars.get(id)
    }

    /// Iterates over cached calendars.
    pub fn calendars(&self) -> impl Iterator<Item = &Calendar> {
        self.calendars.values()
    }

    /// Returns a copy of a calendar to hand to a sync pass.
    #[must_use]
    pub fn snapshot(&self, id: &str) -> Option<Calendar> {
        self.calendars.get(id).cloned()
    }

    /// Finds an occurrence in any calendar.
    #[must_use]
    pub fn find_event(&self, id: &str) -> Option<&CalendarEvent> {
        self.calendars.values().find_map(|c| c.events.get(id))
    }

    /// Finds an occurrence in any calendar, generating it from its series
    /// master when the occurrence has no override of its own.
    #[must_use]
    pub fn resolve_occurrence(&self, id: &str) -> Option<CalendarEvent> {
        if let Some(event) = self.find_event(id) {
            return Some(event.clone());
        }
        let id = OccurrenceId::parse(id);
        let rid = id.recurrence_id()?;
        let master = self.find_event(&id.master().to_string())?;
        tracing::debug!(%id, "occurrence not cached, generating it from the master");
        master.instance_of(rid)
    }
}
