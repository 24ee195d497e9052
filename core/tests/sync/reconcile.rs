// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use calsync_caldav::{CalDavError, Href, SyncCollection, SyncItem};
use calsync_core::{ErrorKind, ReconcileOptions, SyncError, SyncStatus, SyncTokenReconciler};
use tokio_util::sync::CancellationToken;

use crate::common::{
    CAL_HREF, MockRemote, calendar_with_token, changed, deleted, diff, range, series_ics,
    single_ics,
};

fn href(name: &str) -> String {
    format!("{CAL_HREF}{name}")
}

fn reconciler(remote: &Arc<MockRemote>) -> SyncTokenReconciler<MockRemote> {
    SyncTokenReconciler::new(remote.clone())
}

#[tokio::test]
async fn no_token_means_no_request() {
    let remote = Arc::new(MockRemote::new());
    let result = reconciler(&remote)
        .reconcile(&calendar_with_token(None), &range(), &ReconcileOptions::default())
        .await
        .unwrap();

    assert!(result.is_empty());
    assert_eq!(result.cal_id, "work");
    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn deleted_item_yields_base_id() {
    let remote = Arc::new(MockRemote::new());
    remote.script_sync(Ok(diff("tok-2", vec![deleted(&href("X.ics"))])));

    let result = reconciler(&remote)
        .reconcile(&calendar_with_token(Some("tok-1")), &range(), &ReconcileOptions::default())
        .await
        .unwrap();

    assert_eq!(result.deleted_events, HashSet::from(["X".to_string()]));
    assert!(result.created_or_updated_events.is_empty());
    assert_eq!(result.sync_token.as_deref(), Some("tok-2"));
    assert_eq!(result.status, SyncStatus::Success);
    assert_eq!(remote.calls_of("fetch"), 0);
}

#[tokio::test]
async fn changed_item_is_fetched() {
    let remote = Arc::new(
        MockRemote::new().with_resource(&href("new-event.ics"), &single_ics("new-event", "Lunch")),
    );
    remote.script_sync(Ok(diff("tok-2", vec![changed(&href("new-event.ics"))])));

    let result = reconciler(&remote)
        .reconcile(&calendar_with_token(Some("tok-1")), &range(), &ReconcileOptions::default())
        .await
        .unwrap();

    assert_eq!(result.created_or_updated_events.len(), 1);
    let event = &result.created_or_updated_events[0];
    assert_eq!(event.uid(), "new-event");
    assert_eq!(event.title, "Lunch");
    assert_eq!(event.cal_id, "work");
    assert!(result.deleted_events.is_empty());
}

#[tokio::test]
async fn mixed_items_fill_both_sides_in_any_order() {
    for flipped in [false, true] {
        let remote = Arc::new(
            MockRemote::new().with_resource(&href("b.ics"), &single_ics("b", "Kept")),
        );
        let mut items = vec![deleted(&href("a.ics")), changed(&href("b.ics"))];
        if flipped {
            items.reverse();
        }
        remote.script_sync(Ok(diff("tok-2", items)));

        let result = reconciler(&remote)
            .reconcile(&calendar_with_token(Some("tok-1")), &range(), &ReconcileOptions::default())
            .await
            .unwrap();

        assert_eq!(result.deleted_events, HashSet::from(["a".to_string()]));
        assert_eq!(result.created_or_updated_events.len(), 1);
        assert_eq!(result.created_or_updated_events[0].uid(), "b");
    }
}

#[tokio::test]
async fn recurring_resource_yields_every_occurrence() {
    let remote = Arc::new(MockRemote::new().with_resource(&href("s.ics"), &series_ics("s")));
    remote.script_sync(Ok(diff("tok-2", vec![changed(&href("s.ics"))])));

    let result = reconciler(&remote)
        .reconcile(&calendar_with_token(Some("tok-1")), &range(), &ReconcileOptions::default())
        .await
        .unwrap();

    assert_eq!(result.created_or_updated_events.len(), 1);
    assert!(result.created_or_updated_events[0].is_recurring());
}

#[tokio::test]
async fn gone_token_is_rejected() {
    let remote = Arc::new(MockRemote::new());
    remote.script_sync(Err(CalDavError::InvalidSyncToken("tok-1".to_string())));

    let err = reconciler(&remote)
        .reconcile(&calendar_with_token(Some("tok-1")), &range(), &ReconcileOptions::default())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("SYNC_TOKEN_INVALID"));
    assert_eq!(err.kind(), ErrorKind::SyncTokenInvalid);
}

#[tokio::test]
async fn gone_status_inside_the_answer_is_rejected() {
    let remote = Arc::new(MockRemote::new());
    let gone = SyncItem {
        href: None,
        status: Some(410),
    };
    remote.script_sync(Ok(diff("tok-2", vec![deleted(&href("a.ics")), gone])));

    let err = reconciler(&remote)
        .reconcile(&calendar_with_token(Some("tok-1")), &range(), &ReconcileOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::SyncTokenInvalid { ref cal_id } if cal_id == "work"));
}

#[tokio::test]
async fn failed_diff_request_is_a_network_error() {
    let remote = Arc::new(MockRemote::new());
    remote.script_sync(Err(CalDavError::Http("connection reset".to_string())));

    let err = reconciler(&remote)
        .reconcile(&calendar_with_token(Some("tok-1")), &range(), &ReconcileOptions::default())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("NETWORK_ERROR"));
    assert_eq!(err.kind(), ErrorKind::NetworkError);
}

#[tokio::test]
async fn items_without_href_or_known_status_are_ignored() {
    let remote = Arc::new(MockRemote::new());
    let items = vec![
        SyncItem {
            href: None,
            status: Some(404),
        },
        SyncItem {
            href: Some(Href::from("")),
            status: Some(200),
        },
        SyncItem {
            href: Some(Href::from(href("a.ics"))),
            status: Some(507),
        },
    ];
    remote.script_sync(Ok(diff("tok-2", items)));

    let result = reconciler(&remote)
        .reconcile(&calendar_with_token(Some("tok-1")), &range(), &ReconcileOptions::default())
        .await
        .unwrap();

    assert!(result.deleted_events.is_empty());
    assert!(result.created_or_updated_events.is_empty());
    assert_eq!(result.sync_token.as_deref(), Some("tok-2"));
    assert_eq!(remote.calls_of("fetch"), 0);
}

#[tokio::test]
async fn fetches_stay_within_the_concurrency_limit() {
    let mut remote = MockRemote::new().with_fetch_delay(Duration::from_millis(20));
    let mut items = Vec::new();
    for i in 0..20 {
        let name = format!("ev-{i}.ics");
        remote = remote.with_resource(&href(&name), &single_ics(&format!("ev-{i}"), "Item"));
        items.push(changed(&href(&name)));
    }
    let remote = Arc::new(remote);
    remote.script_sync(Ok(diff("tok-2", items)));

    let options = ReconcileOptions {
        max_concurrency: 5,
        ..ReconcileOptions::default()
    };
    let result = reconciler(&remote)
        .reconcile(&calendar_with_token(Some("tok-1")), &range(), &options)
        .await
        .unwrap();

    assert_eq!(result.created_or_updated_events.len(), 20);
    assert_eq!(remote.calls_of("fetch"), 20);
    assert!(remote.max_in_flight() <= 5, "saw {} fetches at once", remote.max_in_flight());
    assert!(remote.max_in_flight() > 1);
}

#[tokio::test]
async fn failed_fetches_do_not_abort_the_pass() {
    let remote = Arc::new(
        MockRemote::new()
            .with_resource(&href("a.ics"), &single_ics("a", "A"))
            .with_resource(&href("b.ics"), &single_ics("b", "B"))
            .with_resource(&href("c.ics"), &single_ics("c", "C")),
    );
    remote.fail_fetch(&href("b.ics"));
    remote.script_sync(Ok(diff(
        "tok-2",
        vec![changed(&href("a.ics")), changed(&href("b.ics")), changed(&href("c.ics"))],
    )));

    let result = reconciler(&remote)
        .reconcile(&calendar_with_token(Some("tok-1")), &range(), &ReconcileOptions::default())
        .await
        .unwrap();

    let mut uids = result
        .created_or_updated_events
        .iter()
        .map(|e| e.uid().to_string())
        .collect::<Vec<_>>();
    uids.sort();
    assert_eq!(uids, vec!["a", "c"]);
    assert_eq!(result.failed_hrefs, vec![Href::from(href("b.ics"))]);
    assert_eq!(result.error_kinds(), vec![ErrorKind::PartialFetchFailure]);
    let mut refetched = result.refetched_hrefs.clone();
    refetched.sort();
    assert_eq!(refetched, vec![Href::from(href("a.ics")), Href::from(href("c.ics"))]);
    assert_eq!(result.sync_token.as_deref(), Some("tok-2"));
}

#[tokio::test]
async fn answer_without_container_is_an_empty_diff() {
    let remote = Arc::new(MockRemote::new());
    remote.script_sync(Ok(SyncCollection {
        sync_token: Some("tok-2".to_string()),
        items: None,
    }));

    let result = reconciler(&remote)
        .reconcile(&calendar_with_token(Some("tok-1")), &range(), &ReconcileOptions::default())
        .await
        .unwrap();

    assert!(result.malformed);
    assert!(result.deleted_events.is_empty());
    assert!(result.created_or_updated_events.is_empty());
    assert_eq!(result.sync_token.as_deref(), Some("tok-2"));
}

#[tokio::test]
async fn cancelled_pass_reports_nothing() {
    let remote = Arc::new(MockRemote::new());
    remote.script_sync(Ok(diff("tok-2", vec![deleted(&href("a.ics"))])));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let options = ReconcileOptions {
        cancel: Some(cancel),
        ..ReconcileOptions::default()
    };
    let result = reconciler(&remote)
        .reconcile(&calendar_with_token(Some("tok-1")), &range(), &options)
        .await
        .unwrap();

    assert!(result.is_empty());
    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn cancel_during_fetches_keeps_the_token() {
    let mut remote = MockRemote::new().with_fetch_delay(Duration::from_secs(5));
    let mut items = Vec::new();
    for i in 0..3 {
        let name = format!("slow-{i}.ics");
        remote = remote.with_resource(&href(&name), &single_ics(&format!("slow-{i}"), "Slow"));
        items.push(changed(&href(&name)));
    }
    let remote = Arc::new(remote);
    remote.script_sync(Ok(diff("tok-2", items)));

    let cancel = CancellationToken::new();
    let options = ReconcileOptions {
        cancel: Some(cancel.clone()),
        ..ReconcileOptions::default()
    };
    let trigger = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
    };
    let calendar = calendar_with_token(Some("tok-1"));
    let reconciler = reconciler(&remote);
    let window = range();
    let (result, ()) = tokio::join!(reconciler.reconcile(&calendar, &window, &options), trigger);
    let result = result.unwrap();

    assert!(result.created_or_updated_events.is_empty());
    assert!(result.failed_hrefs.is_empty());
    assert_eq!(result.sync_token, None);
}

#[tokio::test]
async fn full_refresh_takes_the_collection_token() {
    let remote = Arc::new(
        MockRemote::new()
            .with_calendar(CAL_HREF, Some("tok-9"))
            .with_resource(&href("a.ics"), &single_ics("a", "A"))
            .with_resource(&href("s.ics"), &series_ics("s"))
            .with_resource("/dav/calendars/jane/home/h.ics", &single_ics("h", "Other")),
    );

    let result = reconciler(&remote)
        .full_refresh(&calendar_with_token(None), &range())
        .await
        .unwrap();

    assert_eq!(result.status, SyncStatus::TokenInvalid);
    assert_eq!(result.sync_token.as_deref(), Some("tok-9"));
    let mut uids = result
        .created_or_updated_events
        .iter()
        .map(|e| e.uid().to_string())
        .collect::<Vec<_>>();
    uids.sort();
    assert_eq!(uids, vec!["a", "s"]);
    assert_eq!(remote.calls()[0], "list /");
}
