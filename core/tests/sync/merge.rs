// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use calsync_caldav::{CalDavError, CalendarCollection, Href, SyncCollection};
use calsync_core::{ErrorKind, LocalCacheStore, ReconcileOptions, SyncTokenReconciler};

use crate::common::{
    CAL_HREF, MockRemote, changed, deleted, diff, range, series_with_overrides_ics, single_ics,
};

fn href(name: &str) -> String {
    format!("{CAL_HREF}{name}")
}

/// A store whose `work` calendar went through one full refresh.
async fn bootstrapped(remote: &Arc<MockRemote>) -> LocalCacheStore {
    let mut store = LocalCacheStore::new();
    let id = store.upsert_calendar(&CalendarCollection::new(Href::from(CAL_HREF)));
    let calendar = store.snapshot(&id).unwrap();
    let result = SyncTokenReconciler::new(remote.clone())
        .full_refresh(&calendar, &range())
        .await
        .unwrap();
    store.apply_diff(result).unwrap();
    store
}

fn ids(store: &LocalCacheStore) -> Vec<String> {
    store.calendar("work").unwrap().events.keys().cloned().collect()
}

#[tokio::test]
async fn deleting_a_master_removes_its_overrides() {
    let remote = Arc::new(
        MockRemote::new()
            .with_calendar(CAL_HREF, Some("tok-1"))
            .with_resource(&href("base.ics"), &series_with_overrides_ics("base"))
            .with_resource(&href("other.ics"), &single_ics("other", "Other")),
    );
    let mut store = bootstrapped(&remote).await;
    assert_eq!(
        ids(&store),
        vec![
            "base",
            "base/20250113T100000",
            "base/20250120T100000",
            "other"
        ]
    );

    remote.remove(&href("base.ics"));
    remote.script_sync(Ok(diff("tok-2", vec![deleted(&href("base.ics"))])));
    let calendar = store.snapshot("work").unwrap();
    let result = SyncTokenReconciler::new(remote.clone())
        .reconcile(&calendar, &range(), &ReconcileOptions::default())
        .await
        .unwrap();
    store.apply_diff(result).unwrap();

    assert_eq!(ids(&store), vec!["other"]);
    assert_eq!(store.calendar("work").unwrap().sync_token.as_deref(), Some("tok-2"));
}

#[tokio::test]
async fn refetched_series_replaces_stale_overrides() {
    let remote = Arc::new(
        MockRemote::new()
            .with_calendar(CAL_HREF, Some("tok-1"))
            .with_resource(&href("base.ics"), &series_with_overrides_ics("base")),
    );
    let mut store = bootstrapped(&remote).await;
    assert_eq!(ids(&store).len(), 3);

    // The server dropped the overrides.
    remote.insert(&href("base.ics"), &crate::common::series_ics("base"));
    remote.script_sync(Ok(diff("tok-2", vec![changed(&href("base.ics"))])));
    let calendar = store.snapshot("work").unwrap();
    let result = SyncTokenReconciler::new(remote.clone())
        .reconcile(&calendar, &range(), &ReconcileOptions::default())
        .await
        .unwrap();
    store.apply_diff(result).unwrap();

    assert_eq!(ids(&store), vec!["base"]);
}

#[tokio::test]
async fn rejected_token_leaves_the_cache_untouched() {
    let remote = Arc::new(
        MockRemote::new()
            .with_calendar(CAL_HREF, Some("tok-1"))
            .with_resource(&href("a.ics"), &single_ics("a", "A")),
    );
    let store = bootstrapped(&remote).await;
    let before = store.snapshot("work").unwrap();

    remote.script_sync(Err(CalDavError::InvalidSyncToken("tok-1".to_string())));
    let err = SyncTokenReconciler::new(remote.clone())
        .reconcile(&before, &range(), &ReconcileOptions::default())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("SYNC_TOKEN_INVALID"));
    assert_eq!(store.snapshot("work").unwrap(), before);
    assert_eq!(before.sync_token.as_deref(), Some("tok-1"));
}

#[tokio::test]
async fn malformed_answer_still_advances_the_token() {
    let remote = Arc::new(
        MockRemote::new()
            .with_calendar(CAL_HREF, Some("tok-1"))
            .with_resource(&href("a.ics"), &single_ics("a", "A")),
    );
    let mut store = bootstrapped(&remote).await;

    remote.script_sync(Ok(SyncCollection {
        sync_token: Some("tok-2".to_string()),
        items: None,
    }));
    let calendar = store.snapshot("work").unwrap();
    let result = SyncTokenReconciler::new(remote.clone())
        .reconcile(&calendar, &range(), &ReconcileOptions::default())
        .await
        .unwrap();
    assert_eq!(result.error_kinds(), vec![ErrorKind::MalformedResponse]);
    let summary = store.apply_diff(result).unwrap();

    assert_eq!(summary.removed, 0);
    assert_eq!(summary.upserted, 0);
    assert_eq!(ids(&store), vec!["a"]);
    assert_eq!(store.calendar("work").unwrap().sync_token.as_deref(), Some("tok-2"));
}

#[tokio::test]
async fn changed_resource_without_occurrences_is_evicted() {
    let remote = Arc::new(
        MockRemote::new()
            .with_calendar(CAL_HREF, Some("tok-1"))
            .with_resource(&href("x.ics"), &single_ics("x", "Moved away"))
            .with_resource(&href("y.ics"), &single_ics("y", "Stays")),
    );
    let mut store = bootstrapped(&remote).await;
    assert_eq!(ids(&store), vec!["x", "y"]);

    // Nothing of the resource is left in the window.
    remote.remove(&href("x.ics"));
    remote.script_sync(Ok(diff("tok-2", vec![changed(&href("x.ics"))])));
    let calendar = store.snapshot("work").unwrap();
    let result = SyncTokenReconciler::new(remote.clone())
        .reconcile(&calendar, &range(), &ReconcileOptions::default())
        .await
        .unwrap();
    assert!(result.created_or_updated_events.is_empty());
    assert_eq!(result.refetched_hrefs, vec![Href::from(href("x.ics"))]);
    assert!(result.error_kinds().is_empty());
    store.apply_diff(result).unwrap();

    assert_eq!(ids(&store), vec!["y"]);
}

#[tokio::test]
async fn deletion_matches_resources_named_apart_from_their_uid() {
    let remote = Arc::new(
        MockRemote::new()
            .with_calendar(CAL_HREF, Some("tok-1"))
            .with_resource(&href("standup.ics"), &series_with_overrides_ics("uid-42"))
            .with_resource(&href("other.ics"), &single_ics("other", "Other")),
    );
    let mut store = bootstrapped(&remote).await;
    assert_eq!(ids(&store).len(), 4);

    remote.remove(&href("standup.ics"));
    remote.script_sync(Ok(diff("tok-2", vec![deleted(&href("standup.ics"))])));
    let calendar = store.snapshot("work").unwrap();
    let result = SyncTokenReconciler::new(remote.clone())
        .reconcile(&calendar, &range(), &ReconcileOptions::default())
        .await
        .unwrap();
    store.apply_diff(result).unwrap();

    assert_eq!(ids(&store), vec!["other"]);
}
