// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Incremental CalDAV sync with a local cache, and read-modify-write
//! mutations of recurring events.

mod cache;
mod calendar;
mod config;
mod error;
mod event;
mod identity;
mod limiter;
mod mutation;
mod reconciler;
mod remote;
mod scope;
mod synchronizer;

pub use crate::cache::{LocalCacheStore, MergeSummary, OptimisticChange, OptimisticUpdate};
pub use crate::calendar::Calendar;
pub use crate::config::{APP_NAME, Config, SyncConfig};
pub use crate::error::{ConfigError, ErrorKind, MutationError, SyncError};
pub use crate::event::{
    Attendee, CalendarEvent, DateRange, EventTime, RepeatEnd, Repetition,
    normalize_recurrence_id,
};
pub use crate::identity::{OccurrenceId, base_id, base_id_from_href, is_instance};
pub use crate::limiter::ConcurrencyLimiter;
pub use crate::mutation::{DEFAULT_METADATA_FIELDS, EventMutationEngine, MetadataFields};
pub use crate::reconciler::{
    DEFAULT_MAX_CONCURRENCY, ReconcileOptions, SyncDiffResult, SyncStatus, SyncTokenReconciler,
};
pub use crate::remote::CalendarRemote;
pub use crate::scope::{
    DeletePlan, EditPlan, EditScope, lift_to_master, plan_delete, plan_edit, timing_changed,
};
pub use crate::synchronizer::{SyncMode, SyncReport, Synchronizer};
