// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use calsync_caldav::{
    CalDavClient, CalDavError, CalendarCollection, CalendarResource, ETag, Href, SyncCollection,
    TimeRange,
};
use calsync_ical::Component;

/// The server operations the engine relies on.
#[async_trait]
pub trait CalendarRemote: Send + Sync {
    /// Lists the calendar collections of the user.
    async fn list_calendars(&self) -> Result<Vec<CalendarCollection>, CalDavError>;

    /// Addresses identifying the current user, used as calendar owners.
    async fn principal_addresses(&self) -> Result<Vec<String>, CalDavError> {
        Ok(Vec::new())
    }

    /// Asks for the changes of a collection since `sync_token`.
    async fn sync_collection(
        &self,
        calendar: &Href,
        sync_token: &str,
    ) -> Result<SyncCollection, CalDavError>;

    /// Fetches one resource, restricted to events in `range`.
    async fn fetch_range(
        &self,
        href: &Href,
        range: &TimeRange,
    ) -> Result<Vec<CalendarResource>, CalDavError>;

    /// Fetches every resource of a collection with events in `range`.
    async fn query_range(
        &self,
        calendar: &Href,
        range: &TimeRange,
    ) -> Result<Vec<CalendarResource>, CalDavError>;

    /// Reads a whole resource.
    async fn get_resource(&self, href: &Href) -> Result<CalendarResource, CalDavError>;

    /// Replaces a whole resource; creates it when `etag` is `None`.
    async fn put_resource(
        &self,
        href: &Href,
        etag: Option<&ETag>,
        data: &Component,
    ) -> Result<Option<ETag>, CalDavError>;

    /// Deletes a whole resource.
    async fn delete_resource(&self, href: &Href) -> Result<(), CalDavError>;
}

#[async_trait]
impl CalendarRemote for CalDavClient {
    async fn list_calendars(&self) -> Result<Vec<CalendarCollection>, CalDavError> {
        Self::list_calendars(self).await
    }

    async fn principal_addresses(&self) -> Result<Vec<String>, CalDavError> {
        Ok(self.discover().await?.calendar_user_addresses)
    }

    async fn sync_collection(
        &self,
        calendar: &Href,
        sync_token: &str,
    ) -> Result<SyncCollection, CalDavError> {
        Self::sync_collection(self, calendar, sync_token).await
    }

    async fn fetch_range(
        &self,
        href: &Href,
        range: &TimeRange,
    ) -> Result<Vec<CalendarResource>, CalDavError> {
        Self::fetch_range(self, href, range).await
    }

    async fn query_range(
        &self,
        calendar: &Href,
        range: &TimeRange,
    ) -> Result<Vec<CalendarResource>, CalDavError> {
        Self::query_range(self, calendar, range).await
    }

    async fn get_resource(&self, href: &Href) -> Result<CalendarResource, CalDavError> {
        Self::get_resource(self, href).await
    }

    async fn put_resource(
        &self,
        href: &Href,
        etag: Option<&ETag>,
        data: &Component,
    ) -> Result<Option<ETag>, CalDavError> {
        Self::put_resource(self, href, etag, data).await
    }

    async fn delete_resource(&self, href: &Href) -> Result<(), CalDavError> {
        Self::delete_resource(self, href).await
    }
}
