// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory server used by the integration tests.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use calsync_caldav::{
    CalDavError, CalendarCollection, CalendarResource, ETag, Href, SyncCollection, SyncItem,
    TimeRange,
};
use calsync_core::CalendarRemote;
use calsync_ical::Component;

/// A `CalendarRemote` holding resources in memory.
///
/// Every call is recorded as `"<op> <href>"`; fetches track how many of them
/// run at the same time.
#[derive(Debug, Default)]
pub struct MockRemote {
    calendars: Mutex<Vec<CalendarCollection>>,
    owners: Mutex<Vec<String>>,
    resources: Mutex<BTreeMap<Href, (ETag, Component)>>,
    sync_answers: Mutex<VecDeque<Result<SyncCollection, CalDavError>>>,
    failing_fetches: Mutex<HashSet<Href>>,
    fail_puts: Mutex<bool>,
    fail_deletes: Mutex<bool>,
    calls: Mutex<Vec<String>>,
    fetch_delay: Mutex<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    etags: AtomicUsize,
}

#[allow(dead_code)]
impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_calendar(self, href: &str, sync_token: Option<&str>) -> Self {
        let mut collection = CalendarCollection::new(Href::from(href));
        collection.sync_token = sync_token.map(str::to_string);
        self.calendars.lock().unwrap().push(collection);
        self
    }

    pub fn with_owner(self, address: &str) -> Self {
        self.owners.lock().unwrap().push(address.to_string());
        self
    }

    /// Stores a resource given as iCalendar text.
    pub fn with_resource(self, href: &str, ics: &str) -> Self {
        self.insert(href, ics);
        self
    }

    pub fn with_fetch_delay(self, delay: Duration) -> Self {
        *self.fetch_delay.lock().unwrap() = delay;
        self
    }

    pub fn insert(&self, href: &str, ics: &str) {
        let data = calsync_ical::parse(ics)
            .unwrap()
            .into_iter()
            .next()
            .unwrap();
        let etag = self.next_etag();
        self.resources
            .lock()
            .unwrap()
            .insert(Href::from(href), (etag, data));
    }

    pub fn remove(&self, href: &str) {
        self.resources.lock().unwrap().remove(&Href::from(href));
    }

    /// Queues the answer of the next sync-collection request.
    pub fn script_sync(&self, answer: Result<SyncCollection, CalDavError>) {
        self.sync_answers.lock().unwrap().push_back(answer);
    }

    pub fn set_collection_token(&self, href: &str, token: &str) {
        let mut calendars = self.calendars.lock().unwrap();
        if let Some(c) = calendars.iter_mut().find(|c| c.href.as_str() == href) {
            c.sync_token = Some(token.to_string());
        }
    }

    pub fn fail_fetch(&self, href: &str) {
        self.failing_fetches.lock().unwrap().insert(Href::from(href));
    }

    pub fn fail_puts(&self) {
        *self.fail_puts.lock().unwrap() = true;
    }

    pub fn fail_deletes(&self) {
        *self.fail_deletes.lock().unwrap() = true;
    }

    pub fn resource(&self, href: &str) -> Option<Component> {
        self.resources
            .lock()
            .unwrap()
            .get(&Href::from(href))
            .map(|(_, data)| data.clone())
    }

    pub fn hrefs(&self) -> Vec<Href> {
        self.resources.lock().unwrap().keys().cloned().collect()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_of(&self, op: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.split(' ').next() == Some(op))
            .count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, op: &str, href: &Href) {
        self.calls.lock().unwrap().push(format!("{op} {href}"));
    }

    fn next_etag(&self) -> ETag {
        let n = self.etags.fetch_add(1, Ordering::SeqCst) + 1;
        ETag::from(format!("\"e{n}\""))
    }

    fn read(&self, href: &Href) -> Result<CalendarResource, CalDavError> {
        self.resources
            .lock()
            .unwrap()
            .get(href)
            .map(|(etag, data)| CalendarResource::new(href.clone(), Some(etag.clone()), data.clone()))
            .ok_or_else(|| CalDavError::NotFound(href.clone()))
    }
}

#[async_trait]
impl CalendarRemote for MockRemote {
    async fn list_calendars(&self) -> Result<Vec<CalendarCollection>, CalDavError> {
        self.calls.lock().unwrap().push("list /".to_string());
        Ok(self.calendars.lock().unwrap().clone())
    }

    async fn principal_addresses(&self) -> Result<Vec<String>, CalDavError> {
        Ok(self.owners.lock().unwrap().clone())
    }

    async fn sync_collection(
        &self,
        calendar: &Href,
        _sync_token: &str,
    ) -> Result<SyncCollection, CalDavError> {
        self.record("sync", calendar);
        self.sync_answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(SyncCollection::default()))
    }

    async fn fetch_range(
        &self,
        href: &Href,
        _range: &TimeRange,
    ) -> Result<Vec<CalendarResource>, CalDavError> {
        self.record("fetch", href);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *self.fetch_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_fetches.lock().unwrap().contains(href) {
            return Err(CalDavError::Http(format!("fetch of {href} failed")));
        }
        Ok(self.read(href).into_iter().collect())
    }

    async fn query_range(
        &self,
        calendar: &Href,
        _range: &TimeRange,
    ) -> Result<Vec<CalendarResource>, CalDavError> {
        self.record("query", calendar);
        let hrefs = self
            .resources
            .lock()
            .unwrap()
            .keys()
            .filter(|h| h.starts_with(calendar.as_str()))
            .cloned()
            .collect::<Vec<_>>();
        hrefs.iter().map(|h| self.read(h)).collect()
    }

    async fn get_resource(&self, href: &Href) -> Result<CalendarResource, CalDavError> {
        self.record("get", href);
        self.read(href)
    }

    async fn put_resource(
        &self,
        href: &Href,
        etag: Option<&ETag>,
        data: &Component,
    ) -> Result<Option<ETag>, CalDavError> {
        self.record("put", href);
        if *self.fail_puts.lock().unwrap() {
            return Err(CalDavError::Http("put rejected".to_string()));
        }

        let mut resources = self.resources.lock().unwrap();
        let current = resources.get(href).map(|(e, _)| e.clone());
        match (etag, current) {
            (Some(expected), Some(current)) if *expected != current => {
                return Err(CalDavError::PreconditionFailed(current.to_string()));
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(CalDavError::PreconditionFailed(href.to_string()));
            }
            _ => {}
        }

        let etag = self.next_etag();
        resources.insert(href.clone(), (etag.clone(), data.clone()));
        Ok(Some(etag))
    }

    async fn delete_resource(&self, href: &Href) -> Result<(), CalDavError> {
        self.record("delete", href);
        if *self.fail_deletes.lock().unwrap() {
            return Err(CalDavError::Http("delete rejected".to_string()));
        }
        match self.resources.lock().unwrap().remove(href) {
            Some(_) => Ok(()),
            None => Err(CalDavError::NotFound(href.clone())),
        }
    }
}

/// A sync answer carrying `items` and a new token.
pub fn diff(token: &str, items: Vec<SyncItem>) -> SyncCollection {
    SyncCollection {
        sync_token: Some(token.to_string()),
        items: Some(items),
    }
}

pub fn changed(href: &str) -> SyncItem {
    SyncItem {
        href: Some(Href::from(href)),
        status: Some(200),
    }
}

pub fn deleted(href: &str) -> SyncItem {
    SyncItem {
        href: Some(Href::from(href)),
        status: Some(404),
    }
}
