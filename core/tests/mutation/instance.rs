// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use calsync_core::{ErrorKind, MutationError, OccurrenceId};
use calsync_ical::ParticipationStatus;

use super::{engine, href, master, occurrence, override_at, vevents};
use crate::common::{MockRemote, series_ics, series_with_overrides_ics};

#[tokio::test]
async fn delete_instance_adds_one_exdate() {
    let remote = Arc::new(MockRemote::new().with_resource(&href("s.ics"), &series_ics("s")));
    let mut instance = occurrence(&remote, "s.ics", "s").await;
    instance.id = OccurrenceId::instance("s", "20250113T100000");

    engine(&remote).delete_instance(&instance).await.unwrap();

    let data = remote.resource(&href("s.ics")).unwrap();
    let exdates = master(&data).properties_named("EXDATE").collect::<Vec<_>>();
    assert_eq!(exdates.len(), 1);
    assert_eq!(exdates[0].value, "20250113T100000");
    assert_eq!(exdates[0].parameter("TZID"), Some("Europe/Berlin"));
    assert_eq!(data.children_named("VTIMEZONE").count(), 1);

    // The UTC spelling of the same id is recognised as already excluded.
    instance.id = OccurrenceId::instance("s", "20250113T100000Z");
    engine(&remote).delete_instance(&instance).await.unwrap();
    let data = remote.resource(&href("s.ics")).unwrap();
    assert_eq!(master(&data).properties_named("EXDATE").count(), 1);
}

#[tokio::test]
async fn delete_instance_drops_the_matching_override() {
    let remote = Arc::new(
        MockRemote::new().with_resource(&href("s.ics"), &series_with_overrides_ics("s")),
    );
    let instance = occurrence(&remote, "s.ics", "s/20250113T100000").await;

    engine(&remote).delete_instance(&instance).await.unwrap();

    let data = remote.resource(&href("s.ics")).unwrap();
    assert_eq!(vevents(&data).len(), 2);
    assert!(override_at(&data, "20250113T100000").is_none());
    assert!(override_at(&data, "20250120T100000").is_some());
    assert_eq!(master(&data).value("EXDATE"), Some("20250113T100000"));
}

#[tokio::test]
async fn delete_instance_of_a_master_uses_its_start() {
    let remote = Arc::new(MockRemote::new().with_resource(&href("s.ics"), &series_ics("s")));
    let first = occurrence(&remote, "s.ics", "s").await;

    engine(&remote).delete_instance(&first).await.unwrap();

    let data = remote.resource(&href("s.ics")).unwrap();
    assert_eq!(master(&data).value("EXDATE"), Some("20250106T100000"));
}

#[tokio::test]
async fn override_is_appended_then_replaced() {
    let remote = Arc::new(
        MockRemote::new().with_resource(&href("s.ics"), &series_with_overrides_ics("s")),
    );

    let mut fresh = occurrence(&remote, "s.ics", "s").await;
    fresh.id = OccurrenceId::instance("s", "20250127T100000");
    fresh.repetition = None;
    fresh.title = "Offsite".to_string();
    engine(&remote).upsert_instance_override(&fresh).await.unwrap();

    let data = remote.resource(&href("s.ics")).unwrap();
    assert_eq!(vevents(&data).len(), 4);
    let added = override_at(&data, "20250127T100000").unwrap();
    assert_eq!(added.value("SUMMARY"), Some("Offsite"));
    assert_eq!(added.value("SEQUENCE"), Some("3"));
    assert!(added.property("RRULE").is_none());

    let mut edited = occurrence(&remote, "s.ics", "s/20250113T100000").await;
    edited.title = "Team sync (moved)".to_string();
    engine(&remote).upsert_instance_override(&edited).await.unwrap();

    let data = remote.resource(&href("s.ics")).unwrap();
    assert_eq!(vevents(&data).len(), 4);
    let replaced = override_at(&data, "20250113T100000").unwrap();
    assert_eq!(replaced.value("SUMMARY"), Some("Team sync (moved)"));
    assert_eq!(replaced.value("SEQUENCE"), Some("2"));
    assert_eq!(master(&data).value("SUMMARY"), Some("Team sync"));
}

#[tokio::test]
async fn override_requires_an_instance() {
    let remote = Arc::new(MockRemote::new().with_resource(&href("s.ics"), &series_ics("s")));
    let master_event = occurrence(&remote, "s.ics", "s").await;

    let err = engine(&remote)
        .upsert_instance_override(&master_event)
        .await
        .unwrap_err();
    assert!(matches!(err, MutationError::NotAnInstance(ref id) if id == "s"));
    assert_eq!(remote.calls_of("put"), 0);
}

#[tokio::test]
async fn partstat_is_updated_everywhere_in_one_write() {
    let remote = Arc::new(
        MockRemote::new().with_resource(&href("s.ics"), &series_with_overrides_ics("s")),
    );
    let event = occurrence(&remote, "s.ics", "s").await;

    let updated = engine(&remote)
        .bulk_partstat_update(&event, "BOB@example.com", ParticipationStatus::Tentative)
        .await
        .unwrap();

    assert_eq!(updated, 3);
    assert_eq!(remote.calls_of("put"), 1);
    let data = remote.resource(&href("s.ics")).unwrap();
    for vevent in vevents(&data) {
        let bob = vevent
            .properties_named("ATTENDEE")
            .find(|p| p.value.contains("bob"))
            .unwrap();
        assert_eq!(bob.parameter("PARTSTAT"), Some("TENTATIVE"));
    }
    let carol = master(&data)
        .properties_named("ATTENDEE")
        .find(|p| p.value.contains("carol"))
        .unwrap();
    assert_eq!(carol.parameter("PARTSTAT"), Some("ACCEPTED"));
    assert_eq!(carol.parameter("CN"), Some("Carol"));
}

#[tokio::test]
async fn partstat_without_match_writes_nothing() {
    let remote = Arc::new(MockRemote::new().with_resource(&href("s.ics"), &series_ics("s")));
    let event = occurrence(&remote, "s.ics", "s").await;

    let updated = engine(&remote)
        .bulk_partstat_update(&event, "mailto:dave@example.com", ParticipationStatus::Declined)
        .await
        .unwrap();

    assert_eq!(updated, 0);
    assert_eq!(remote.calls_of("put"), 0);
}

#[tokio::test]
async fn partstat_with_an_empty_address_matches_nobody() {
    let remote = Arc::new(MockRemote::new().with_resource(&href("s.ics"), &series_ics("s")));
    let event = occurrence(&remote, "s.ics", "s").await;
    let engine = engine(&remote);

    for email in ["", "  ", "mailto:", "MAILTO: "] {
        let updated = engine
            .bulk_partstat_update(&event, email, ParticipationStatus::Declined)
            .await
            .unwrap();
        assert_eq!(updated, 0, "{email:?}");
    }
    assert_eq!(remote.calls_of("put"), 0);
    let data = remote.resource(&href("s.ics")).unwrap();
    assert!(master(&data)
        .properties_named("ATTENDEE")
        .all(|p| p.parameter("PARTSTAT") != Some("DECLINED")));
}

#[tokio::test]
async fn failed_write_is_reported() {
    let remote = Arc::new(MockRemote::new().with_resource(&href("s.ics"), &series_ics("s")));
    let instance = {
        let mut e = occurrence(&remote, "s.ics", "s").await;
        e.id = OccurrenceId::instance("s", "20250113T100000");
        e
    };
    remote.fail_puts();

    let err = engine(&remote).delete_instance(&instance).await.unwrap_err();
    assert!(err.to_string().contains("RESOURCE_WRITE_FAILURE"));
    assert_eq!(err.kind(), ErrorKind::ResourceWriteFailure);
    assert!(master(&remote.resource(&href("s.ics")).unwrap())
        .property("EXDATE")
        .is_none());
}

#[tokio::test]
async fn missing_resource_is_a_read_failure() {
    let remote = Arc::new(MockRemote::new().with_resource(&href("s.ics"), &series_ics("s")));
    let instance = {
        let mut e = occurrence(&remote, "s.ics", "s").await;
        e.id = OccurrenceId::instance("s", "20250113T100000");
        e
    };
    remote.remove(&href("s.ics"));

    let err = engine(&remote).delete_instance(&instance).await.unwrap_err();
    assert!(matches!(err, MutationError::ResourceRead { .. }));
    assert!(err.to_string().starts_with("RESOURCE_READ_FAILURE"));
    assert_eq!(err.kind(), ErrorKind::ResourceReadFailure);
}
