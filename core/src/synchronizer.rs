// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Drives sync passes and mutations against one server and one local cache.

use std::collections::HashSet;
use std::sync::Arc;

use calsync_ical::ParticipationStatus;
use tokio_util::sync::CancellationToken;

use crate::cache::{LocalCacheStore, MergeSummary, OptimisticChange, OptimisticUpdate};
use crate::config::SyncConfig;
use crate::error::{ErrorKind, MutationError, SyncError};
use crate::event::{CalendarEvent, DateRange};
use crate::mutation::EventMutationEngine;
use crate::reconciler::{ReconcileOptions, SyncDiffResult, SyncTokenReconciler};
use crate::remote::CalendarRemote;
use crate::scope::{DeletePlan, EditPlan, EditScope, lift_to_master, plan_delete, plan_edit};

/// How a calendar was synchronized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SyncMode {
    /// Diff against the stored token.
    Incremental,
    /// Refetch of the whole window.
    Full,
}

/// Outcome of syncing one calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// The calendar.
    pub cal_id: String,
    /// How it was synchronized.
    pub mode: SyncMode,
    /// What the merge did.
    pub summary: MergeSummary,
    /// Number of changed resources that could not be fetched.
    pub failed: usize,
    /// The diff answer had no change container.
    pub malformed: bool,
    /// Failures absorbed by the pass.
    pub warnings: Vec<ErrorKind>,
}

/// Keeps a [`LocalCacheStore`] in step with a server.
///
/// Passes are serialised by `&mut self`: a second pass on the same calendar
/// cannot start before the first one has been merged.
#[derive(Debug)]
pub struct Synchronizer<R: ?Sized> {
    remote: Arc<R>,
    reconciler: SyncTokenReconciler<R>,
    engine: EventMutationEngine<R>,
    store: LocalCacheStore,
    options: ReconcileOptions,
}

impl<R: CalendarRemote + ?Sized> Synchronizer<R> {
    /// Creates a synchronizer with an empty cache.
    pub fn new(remote: Arc<R>, config: &SyncConfig) -> Self {
        Self {
            reconciler: SyncTokenReconciler::new(remote.clone()),
            engine: EventMutationEngine::new(remote.clone(), config.metadata()),
            remote,
            store: LocalCacheStore::new(),
            options: config.reconcile_options(),
        }
    }

    /// Aborts running and future passes when `cancel` fires.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.options.cancel = Some(cancel);
        self
    }

    /// Read access to the cache.
    pub const fn store(&self) -> &LocalCacheStore {
        &self.store
    }

    /// The mutation engine used by [`Synchronizer::edit`] and friends.
    pub const fn engine(&self) -> &EventMutationEngine<R> {
        &self.engine
    }

    /// Lists the server's event calendars into the cache and drops calendars
    /// that disappeared. Returns the ids of the listed calendars.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Listing`] if the listing request fails.
    #[tracing::instrument(skip_all)]
    pub async fn refresh_calendars(&mut self) -> Result<Vec<String>, SyncError> {
        let collections = self
            .remote
            .list_calendars()
            .await
            .map_err(SyncError::Listing)?;

        let ids = collections
            .iter()
            .filter(|c| c.supports_events())
            .map(|c| self.store.upsert_calendar(c))
            .collect::<Vec<_>>();
        self.store
            .retain_calendars(&ids.iter().cloned().collect::<HashSet<_>>());

        match self.remote.principal_addresses().await {
            Ok(owners) => self.store.set_owners(&owners),
            Err(e) => tracing::warn!(err = %e, "failed to read calendar owners"),
        }

        tracing::debug!(count = ids.len(), "calendars refreshed");
        Ok(ids)
    }

    /// Synchronizes one calendar and merges the outcome.
    ///
    /// A calendar without a token, or whose token was rejected, is refetched
    /// in full.
    ///
    /// # Errors
    ///
    /// Fails if the calendar is unknown or a request that the pass depends on
    /// fails; the cache is left as it was.
    #[tracing::instrument(skip(self, range))]
    pub async fn sync_calendar(
        &mut self,
        cal_id: &str,
        range: &DateRange,
    ) -> Result<SyncReport, SyncError> {
        let calendar = self
            .store
            .snapshot(cal_id)
            .ok_or_else(|| SyncError::UnknownCalendar(cal_id.to_string()))?;

        let (mode, result) = if calendar.sync_token.is_none() {
            let result = self.reconciler.full_refresh(&calendar, range).await?;
            (SyncMode::Full, result)
        } else {
            match self
                .reconciler
                .reconcile(&calendar, range, &self.options)
                .await
            {
                Ok(result) => (SyncMode::Incremental, result),
                Err(SyncError::SyncTokenInvalid { .. }) => {
                    tracing::warn!("sync token rejected, falling back to a full refresh");
                    let result = self.reconciler.full_refresh(&calendar, range).await?;
                    (SyncMode::Full, result)
                }
                Err(e) => return Err(e),
            }
        };

        self.merge(mode, result)
    }

    /// Synchronizes every cached calendar, one after the other.
    pub async fn sync_all(
        &mut self,
        range: &DateRange,
    ) -> Vec<(String, Result<SyncReport, SyncError>)> {
        let ids = self
            .store
            .calendars()
            .map(|c| c.id.clone())
            .collect::<Vec<_>>();

        let mut reports = Vec::with_capacity(ids.len());
        for id in ids {
            let report = self.sync_calendar(&id, range).await;
            if let Err(e) = &report {
                tracing::warn!(cal_id = %id, err = %e, "sync failed");
            }
            reports.push((id, report));
        }
        reports
    }

    fn merge(&mut self, mode: SyncMode, result: SyncDiffResult) -> Result<SyncReport, SyncError> {
        let cal_id = result.cal_id.clone();
        let failed = result.failed_hrefs.len();
        let malformed = result.malformed;
        let warnings = result.error_kinds();
        let summary = self.store.apply_diff(result)?;
        Ok(SyncReport {
            cal_id,
            mode,
            summary,
            failed,
            malformed,
            warnings,
        })
    }

    /// Edits an event under `scope`, reflecting the change in the cache
    /// first and undoing it if the server write fails.
    ///
    /// # Errors
    ///
    /// Propagates the mutation error after rolling back.
    pub async fn edit(
        &mut self,
        scope: EditScope,
        old: &CalendarEvent,
        new: CalendarEvent,
    ) -> Result<(), MutationError> {
        let plan = plan_edit(scope, old, new)?;
        let change = match &plan {
            EditPlan::Update(event) | EditPlan::UpsertOverride(event) => {
                Some(OptimisticChange::Upsert(event.clone()))
            }
            EditPlan::RewriteSeries {
                event,
                occurrence: Some(occurrence),
                ..
            } => self
                .store
                .find_event(&event.id.master().to_string())
                .map(|master| OptimisticChange::Upsert(lift_to_master(master, occurrence, event))),
            EditPlan::RewriteSeries { event, .. } => {
                let mut master = event.clone();
                master.id = event.id.master();
                Some(OptimisticChange::Upsert(master))
            }
        };
        let update = change.and_then(|change| self.optimistic(change));
        let result = self.engine.apply_edit(&plan).await;
        self.settle(update, result)
    }

    /// Deletes an event under `scope`, with the same optimistic handling as
    /// [`Synchronizer::edit`].
    ///
    /// # Errors
    ///
    /// Propagates the mutation error after rolling back.
    pub async fn delete(
        &mut self,
        scope: EditScope,
        event: &CalendarEvent,
    ) -> Result<(), MutationError> {
        let plan = plan_delete(scope, event.clone());
        let change = match &plan {
            DeletePlan::DeleteInstance(e) => OptimisticChange::Remove {
                cal_id: e.cal_id.clone(),
                id: e.id.to_string(),
            },
            DeletePlan::DeleteSeries(e) => OptimisticChange::RemoveSeries {
                cal_id: e.cal_id.clone(),
                base_id: e.uid().to_string(),
            },
        };
        let update = self.optimistic(change);
        let result = self.engine.apply_delete(&plan).await;
        self.settle(update, result)
    }

    /// Answers an invitation on every occurrence of a series at once.
    ///
    /// The cache reflects the answer on the next sync pass.
    ///
    /// # Errors
    ///
    /// Fails if the resource cannot be read or written.
    pub async fn rsvp(
        &self,
        event: &CalendarEvent,
        email: &str,
        status: ParticipationStatus,
    ) -> Result<usize, MutationError> {
        self.engine.bulk_partstat_update(event, email, status).await
    }

    /// Turns a series into a single event and reflects both sides in the cache.
    ///
    /// # Errors
    ///
    /// Fails if the new resource cannot be written.
    pub async fn convert_to_single(
        &mut self,
        event: &CalendarEvent,
    ) -> Result<CalendarEvent, MutationError> {
        let single = self.engine.convert_recurring_to_single(event).await?;
        let _ = self.optimistic(OptimisticChange::RemoveSeries {
            cal_id: event.cal_id.clone(),
            base_id: event.uid().to_string(),
        });
        let _ = self.optimistic(OptimisticChange::Upsert(single.clone()));
        Ok(single)
    }

    fn optimistic(&mut self, change: OptimisticChange) -> Option<OptimisticUpdate> {
        match self.store.apply_optimistic_update(change) {
            Ok(update) => Some(update),
            Err(e) => {
                tracing::debug!(err = %e, "skipping local reflection");
                None
            }
        }
    }

    fn settle(
        &mut self,
        update: Option<OptimisticUpdate>,
        result: Result<(), MutationError>,
    ) -> Result<(), MutationError> {
        if let Err(e) = &result {
            tracing::warn!(err = %e, "mutation failed, rolling back local change");
            if let Some(update) = update {
                self.store.rollback(update);
            }
        }
        result
    }
}
