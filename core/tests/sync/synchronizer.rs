// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use calsync_caldav::CalDavError;
use calsync_core::{EditScope, ErrorKind, SyncConfig, SyncMode, Synchronizer};

use crate::common::{
    CAL_HREF, MockRemote, changed, deleted, diff, range, series_with_overrides_ics, single_ics,
};

fn href(name: &str) -> String {
    format!("{CAL_HREF}{name}")
}

async fn synced(remote: &Arc<MockRemote>) -> Synchronizer<MockRemote> {
    let mut sync = Synchronizer::new(remote.clone(), &SyncConfig::default());
    let listed = sync.refresh_calendars().await.unwrap();
    assert_eq!(listed, vec!["work", "inbox"]);
    let report = sync.sync_calendar("work", &range()).await.unwrap();
    assert_eq!(report.mode, SyncMode::Full);
    sync
}

fn ids(sync: &Synchronizer<MockRemote>) -> Vec<String> {
    sync.store()
        .calendar("work")
        .unwrap()
        .events
        .keys()
        .cloned()
        .collect()
}

fn remote() -> Arc<MockRemote> {
    Arc::new(
        MockRemote::new()
            .with_calendar(CAL_HREF, Some("tok-1"))
            .with_calendar("/dav/calendars/jane/inbox/", None)
            .with_owner("mailto:jane@example.com")
            .with_resource(&href("s.ics"), &series_with_overrides_ics("s"))
            .with_resource(&href("x.ics"), &single_ics("x", "Dentist")),
    )
}

#[tokio::test]
async fn first_sync_bootstraps_with_a_full_refresh() {
    let remote = remote();
    let sync = synced(&remote).await;

    let calendar = sync.store().calendar("work").unwrap();
    assert_eq!(calendar.sync_token.as_deref(), Some("tok-1"));
    assert_eq!(calendar.owners, vec!["mailto:jane@example.com"]);
    assert_eq!(
        ids(&sync),
        vec!["s", "s/20250113T100000", "s/20250120T100000", "x"]
    );
    assert_eq!(remote.calls_of("sync"), 0);
}

#[tokio::test]
async fn later_syncs_are_incremental() {
    let remote = remote();
    let mut sync = synced(&remote).await;

    remote.insert(&href("y.ics"), &single_ics("y", "Gym"));
    remote.remove(&href("x.ics"));
    remote.script_sync(Ok(diff(
        "tok-2",
        vec![deleted(&href("x.ics")), changed(&href("y.ics"))],
    )));

    let report = sync.sync_calendar("work", &range()).await.unwrap();
    assert_eq!(report.mode, SyncMode::Incremental);
    assert_eq!(report.summary.removed, 1);
    assert_eq!(report.summary.upserted, 1);
    assert_eq!(report.failed, 0);
    assert!(ids(&sync).contains(&"y".to_string()));
    assert!(!ids(&sync).contains(&"x".to_string()));
    assert_eq!(
        sync.store().calendar("work").unwrap().sync_token.as_deref(),
        Some("tok-2")
    );
}

#[tokio::test]
async fn rejected_token_falls_back_to_full_refresh() {
    let remote = remote();
    let mut sync = synced(&remote).await;

    remote.remove(&href("x.ics"));
    remote.set_collection_token(CAL_HREF, "tok-7");
    remote.script_sync(Err(CalDavError::InvalidSyncToken("tok-1".to_string())));

    let report = sync.sync_calendar("work", &range()).await.unwrap();
    assert_eq!(report.mode, SyncMode::Full);
    assert!(report.summary.replaced);
    assert_eq!(ids(&sync).len(), 3);
    assert_eq!(
        sync.store().calendar("work").unwrap().sync_token.as_deref(),
        Some("tok-7")
    );
}

#[tokio::test]
async fn network_failure_keeps_the_cache() {
    let remote = remote();
    let mut sync = synced(&remote).await;
    let before = sync.store().snapshot("work").unwrap();

    remote.script_sync(Err(CalDavError::Http("timeout".to_string())));
    let err = sync.sync_calendar("work", &range()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NetworkError);
    assert_eq!(sync.store().snapshot("work").unwrap(), before);
}

#[tokio::test]
async fn sync_all_reports_per_calendar() {
    let remote = remote();
    let mut sync = Synchronizer::new(remote.clone(), &SyncConfig::default());
    sync.refresh_calendars().await.unwrap();

    let reports = sync.sync_all(&range()).await;
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|(_, r)| r.is_ok()));
}

#[tokio::test]
async fn failed_delete_is_rolled_back() {
    let remote = remote();
    let mut sync = synced(&remote).await;
    let instance = sync
        .store()
        .find_event("s/20250113T100000")
        .unwrap()
        .clone();

    remote.fail_puts();
    let err = sync.delete(EditScope::Solo, &instance).await.unwrap_err();

    assert!(err.to_string().contains("RESOURCE_WRITE_FAILURE"));
    assert!(sync.store().find_event("s/20250113T100000").is_some());
}

#[tokio::test]
async fn successful_edit_is_reflected_at_once() {
    let remote = remote();
    let mut sync = synced(&remote).await;
    let old = sync.store().find_event("x").unwrap().clone();
    let mut new = old.clone();
    new.title = "Dentist (moved)".to_string();

    sync.edit(EditScope::All, &old, new).await.unwrap();

    assert_eq!(sync.store().find_event("x").unwrap().title, "Dentist (moved)");
    let data = remote.resource(&href("x.ics")).unwrap();
    let vevent = data.children_named("VEVENT").next().unwrap();
    assert_eq!(vevent.value("SUMMARY"), Some("Dentist (moved)"));
}

#[tokio::test]
async fn series_delete_removes_every_occurrence_locally() {
    let remote = remote();
    let mut sync = synced(&remote).await;
    let master = sync.store().find_event("s").unwrap().clone();

    sync.delete(EditScope::All, &master).await.unwrap();

    assert_eq!(ids(&sync), vec!["x"]);
    assert!(remote.resource(&href("s.ics")).is_none());
}

#[tokio::test]
async fn absorbed_failures_are_reported() {
    let remote = remote();
    let mut sync = synced(&remote).await;

    remote.insert(&href("y.ics"), &single_ics("y", "Gym"));
    remote.fail_fetch(&href("y.ics"));
    remote.script_sync(Ok(diff("tok-2", vec![changed(&href("y.ics"))])));

    let report = sync.sync_calendar("work", &range()).await.unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(report.warnings, vec![ErrorKind::PartialFetchFailure]);
}

#[tokio::test]
async fn unknown_calendar_is_not_a_network_error() {
    let remote = remote();
    let mut sync = synced(&remote).await;

    let err = sync.sync_calendar("nope", &range()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownCalendar);
}

#[tokio::test]
async fn all_edit_from_an_occurrence_keeps_the_master_timing_locally() {
    let remote = remote();
    let mut sync = synced(&remote).await;
    let master_start = sync.store().find_event("s").unwrap().start.clone();
    let old = sync
        .store()
        .find_event("s/20250113T100000")
        .unwrap()
        .clone();
    let mut new = old.clone();
    new.title = "Renamed".to_string();

    sync.edit(EditScope::All, &old, new).await.unwrap();

    let master = sync.store().find_event("s").unwrap();
    assert_eq!(master.title, "Renamed");
    assert_eq!(master.start, master_start);
    assert!(master.repetition.is_some());
    let data = remote.resource(&href("s.ics")).unwrap();
    let vevent = data
        .children_named("VEVENT")
        .find(|c| c.property("RECURRENCE-ID").is_none())
        .unwrap();
    assert_eq!(vevent.value("DTSTART"), Some("20250106T100000"));
}

#[tokio::test]
async fn same_named_calendars_sync_separately() {
    let remote = Arc::new(
        MockRemote::new()
            .with_calendar("/dav/calendars/alice/events/", Some("tok-a"))
            .with_calendar("/dav/calendars/bob/events/", Some("tok-b"))
            .with_resource("/dav/calendars/alice/events/a.ics", &single_ics("a", "Alice"))
            .with_resource("/dav/calendars/bob/events/b.ics", &single_ics("b", "Bob")),
    );
    let mut sync = Synchronizer::new(remote.clone(), &SyncConfig::default());

    let listed = sync.refresh_calendars().await.unwrap();
    assert_eq!(listed, vec!["events", "bob/events"]);
    for (_, report) in sync.sync_all(&range()).await {
        report.unwrap();
    }

    let alice = sync.store().calendar("events").unwrap();
    assert_eq!(alice.events.keys().collect::<Vec<_>>(), vec!["a"]);
    let bob = sync.store().calendar("bob/events").unwrap();
    assert_eq!(bob.events.keys().collect::<Vec<_>>(), vec!["b"]);
    assert_eq!(bob.sync_token.as_deref(), Some("tok-b"));
}
