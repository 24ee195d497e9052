// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! One incremental sync pass per calendar (RFC 6578 sync-collection).

use std::collections::HashSet;
use std::sync::Arc;

use calsync_caldav::{CalDavError, Href, TimeRange};
use tokio_util::sync::CancellationToken;

use crate::calendar::Calendar;
use crate::error::{ErrorKind, SyncError};
use crate::event::{CalendarEvent, DateRange};
use crate::identity::base_id_from_href;
use crate::limiter::ConcurrencyLimiter;
use crate::remote::CalendarRemote;

/// Default number of resources fetched at once.
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

/// How a diff result must be merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    /// Incremental: apply deletions and updates.
    #[default]
    Success,
    /// Result of a full refresh: replace the calendar's events wholesale.
    TokenInvalid,
}

/// Outcome of one pass over one calendar.
#[derive(Debug, Clone, Default)]
pub struct SyncDiffResult {
    /// The calendar the result belongs to.
    pub cal_id: String,
    /// Occurrence ids or base ids removed on the server.
    pub deleted_events: HashSet<String>,
    /// Resources removed on the server.
    pub deleted_hrefs: Vec<Href>,
    /// Occurrences of every changed resource.
    pub created_or_updated_events: Vec<CalendarEvent>,
    /// Token to store after merging; `None` keeps the current one.
    pub sync_token: Option<String>,
    /// How to merge.
    pub status: SyncStatus,
    /// Changed resources fetched successfully. Their cached occurrences are
    /// replaced by what the fetch returned, which may be nothing.
    pub refetched_hrefs: Vec<Href>,
    /// Changed resources that could not be fetched.
    pub failed_hrefs: Vec<Href>,
    /// The diff answer had no change container.
    pub malformed: bool,
}

impl SyncDiffResult {
    /// A result that changes nothing.
    pub fn empty(cal_id: impl Into<String>) -> Self {
        Self {
            cal_id: cal_id.into(),
            ..Self::default()
        }
    }

    /// Returns true if merging the result would not touch the cache.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status == SyncStatus::Success
            && self.deleted_events.is_empty()
            && self.deleted_hrefs.is_empty()
            && self.created_or_updated_events.is_empty()
            && self.refetched_hrefs.is_empty()
            && self.sync_token.is_none()
    }

    /// The partial-failure kinds the pass ran into, for reporting.
    #[must_use]
    pub fn error_kinds(&self) -> Vec<ErrorKind> {
        let mut kinds = Vec::new();
        if !self.failed_hrefs.is_empty() {
            kinds.push(ErrorKind::PartialFetchFailure);
        }
        if self.malformed {
            kinds.push(ErrorKind::MalformedResponse);
        }
        kinds
    }
}

/// Options of a reconciliation pass.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Maximum number of resource fetches in flight.
    pub max_concurrency: usize,
    /// Aborts the pass; an aborted pass reports no change and keeps the token.
    pub cancel: Option<CancellationToken>,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            cancel: None,
        }
    }
}

/// Computes diff results for calendars.
#[derive(Debug)]
pub struct SyncTokenReconciler<R: ?Sized> {
    remote: Arc<R>,
}

impl<R: CalendarRemote + ?Sized> SyncTokenReconciler<R> {
    /// Creates a reconciler on top of a remote.
    pub const fn new(remote: Arc<R>) -> Self {
        Self { remote }
    }

    /// Runs one incremental pass.
    ///
    /// A calendar without a token yields an empty result without any request.
    /// Per-item fetch failures are logged and listed in
    /// [`SyncDiffResult::failed_hrefs`]; a diff answer without its container
    /// is treated as an empty diff.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::SyncTokenInvalid`] if the token is stale and
    /// [`SyncError::Network`] if the diff request fails. Local state is never
    /// touched here, so a failed pass leaves the cache as it was.
    #[tracing::instrument(skip_all, fields(cal_id = %calendar.id))]
    pub async fn reconcile(
        &self,
        calendar: &Calendar,
        range: &DateRange,
        options: &ReconcileOptions,
    ) -> Result<SyncDiffResult, SyncError> {
        let Some(token) = calendar.sync_token.as_deref() else {
            tracing::debug!("calendar has no sync token, skipping diff");
            return Ok(SyncDiffResult::empty(&calendar.id));
        };
        let cancel = options.cancel.clone().unwrap_or_default();
        if cancel.is_cancelled() {
            return Ok(SyncDiffResult::empty(&calendar.id));
        }

        let diff = match cancel
            .run_until_cancelled(self.remote.sync_collection(&calendar.href, token))
            .await
        {
            None => {
                tracing::debug!("diff request cancelled");
                return Ok(SyncDiffResult::empty(&calendar.id));
            }
            Some(Ok(diff)) => diff,
            Some(Err(CalDavError::InvalidSyncToken(_))) => {
                return Err(SyncError::SyncTokenInvalid {
                    cal_id: calendar.id.clone(),
                });
            }
            Some(Err(source)) => {
                return Err(SyncError::Network {
                    cal_id: calendar.id.clone(),
                    source,
                });
            }
        };

        let mut result = SyncDiffResult {
            sync_token: diff.sync_token,
            ..SyncDiffResult::empty(&calendar.id)
        };

        let Some(items) = diff.items else {
            tracing::warn!("diff answer has no change container, treating it as empty");
            result.malformed = true;
            return Ok(result);
        };

        let mut changed = Vec::new();
        for item in items {
            if item.is_token_gone() {
                return Err(SyncError::SyncTokenInvalid {
                    cal_id: calendar.id.clone(),
                });
            }
            let Some(href) = item.href.as_ref().filter(|h| !h.is_empty()) else {
                tracing::debug!(status = ?item.status, "skipping change without href");
                continue;
            };
            if item.is_deleted() {
                result
                    .deleted_events
                    .insert(base_id_from_href(href).to_string());
                result.deleted_hrefs.push(href.clone());
            } else if item.is_changed() {
                changed.push(href.clone());
            }
        }

        let time_range = range.to_time_range();
        let limiter = ConcurrencyLimiter::new(options.max_concurrency);
        let fetched = limiter
            .run(
                changed
                    .into_iter()
                    .map(|href| self.fetch(&calendar.id, href, &time_range, &cancel)),
            )
            .await;

        for (href, outcome) in fetched {
            match outcome {
                Fetch::Events(events) => {
                    if events.is_empty() {
                        tracing::debug!(%href, "changed resource has no occurrence in range");
                    }
                    result.created_or_updated_events.extend(events);
                    result.refetched_hrefs.push(href);
                }
                Fetch::Failed(e) => {
                    tracing::warn!(%href, err = %e, "failed to fetch changed resource, skipping");
                    result.failed_hrefs.push(href);
                }
                Fetch::Cancelled => {}
            }
        }

        if cancel.is_cancelled() {
            tracing::debug!("pass cancelled, keeping the current sync token");
            result.sync_token = None;
        }

        tracing::info!(
            deleted = result.deleted_events.len(),
            updated = result.created_or_updated_events.len(),
            failed = result.failed_hrefs.len(),
            "diff pass finished"
        );
        Ok(result)
    }

    async fn fetch(
        &self,
        cal_id: &str,
        href: Href,
        range: &TimeRange,
        cancel: &CancellationToken,
    ) -> (Href, Fetch) {
        if cancel.is_cancelled() {
            return (href, Fetch::Cancelled);
        }
        let outcome = match cancel
            .run_until_cancelled(self.remote.fetch_range(&href, range))
            .await
        {
            None => Fetch::Cancelled,
            Some(Ok(resources)) => Fetch::Events(
                resources
                    .iter()
                    .flat_map(|r| CalendarEvent::from_resource(cal_id, r))
                    .collect(),
            ),
            Some(Err(e)) => Fetch::Failed(e),
        };
        (href, outcome)
    }

    /// Refetches a calendar from scratch.
    ///
    /// The result replaces the calendar's events wholesale and carries the
    /// collection's current sync token.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Network`] if a request fails.
    #[tracing::instrument(skip_all, fields(cal_id = %calendar.id))]
    pub async fn full_refresh(
        &self,
        calendar: &Calendar,
        range: &DateRange,
    ) -> Result<SyncDiffResult, SyncError> {
        let network = |source| SyncError::Network {
            cal_id: calendar.id.clone(),
            source,
        };

        // Token before data: changes racing the query reappear in the next diff.
        let sync_token = self
            .remote
            .list_calendars()
            .await
            .map_err(network)?
            .into_iter()
            .find(|c| c.href == calendar.href)
            .and_then(|c| c.sync_token);

        let resources = self
            .remote
            .query_range(&calendar.href, &range.to_time_range())
            .await
            .map_err(network)?;

        let events = resources
            .iter()
            .flat_map(|r| CalendarEvent::from_resource(&calendar.id, r))
            .collect::<Vec<_>>();

        tracing::info!(events = events.len(), "full refresh finished");
        Ok(SyncDiffResult {
            cal_id: calendar.id.clone(),
            created_or_updated_events: events,
            sync_token,
            status: SyncStatus::TokenInvalid,
            ..SyncDiffResult::default()
        })
    }
}

enum Fetch {
    Events(Vec<CalendarEvent>),
    Failed(CalDavError),
    Cancelled,
}
