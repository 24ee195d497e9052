// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! `CalDAV` client for calendar operations.

use std::sync::Arc;

use calsync_ical::{Component, format, parse};
use reqwest::Method;

use crate::config::CalDavConfig;
use crate::error::CalDavError;
use crate::http::HttpClient;
use crate::request::{
    CalendarQueryRequest, Prop, PropFindRequest, SyncCollectionRequest, TimeRange,
};
use crate::response::MultiStatusResponse;
use crate::sync::SyncCollection;
use crate::types::{CalendarCollection, CalendarResource, ETag, Href};

/// `CalDAV` client for accessing and managing calendars on `CalDAV` servers.
///
/// # Example
///
/// ```ignore
/// use calsync_caldav::{AuthMethod, CalDavClient, CalDavConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = CalDavConfig {
///     base_url: "https://caldav.example.com".to_string(),
///     calendar_home: "/dav/calendars/user/".to_string(),
///     auth: AuthMethod::Basic {
///         username: "user".to_string(),
///         password: "pass".to_string(),
///     },
///     ..Default::default()
/// };
///
/// let client = CalDavClient::new(config)?;
/// let calendars = client.list_calendars().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CalDavClient {
    http: Arc<HttpClient>,
    config: CalDavConfig,
}

impl CalDavClient {
    /// Creates a new `CalDAV` client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or HTTP client
    /// initialization fails.
    pub fn new(config: CalDavConfig) -> Result<Self, CalDavError> {
        config.validate()?;
        let http = HttpClient::new(config.clone())?;
        Ok(Self {
            http: Arc::new(http),
            config,
        })
    }

    /// Returns the configured calendar home.
    #[must_use]
    pub fn calendar_home(&self) -> Href {
        Href::new(self.config.calendar_home.clone())
    }

    /// Discovers `CalDAV` support, the calendar home set and the principal's
    /// calendar user addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery fails.
    #[tracing::instrument(skip(self))]
    pub async fn discover(&self) -> Result<DiscoverResult, CalDavError> {
        let url = self.full_url(&self.config.calendar_home);
        let resp = self
            .http
            .execute(self.http.build_request(Method::OPTIONS, &url))
            .await?;

        let supports_calendars = resp
            .headers()
            .get("DAV")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("calendar-access"));

        let mut propfind = PropFindRequest::new();
        propfind
            .add_property(Prop::CalendarHomeSet)
            .add_property(Prop::CalendarUserAddressSet);

        let resp = self
            .http
            .execute(
                self.http
                    .build_dav_request("PROPFIND", &url)?
                    .header("Depth", "0")
                    .body(propfind.build()?),
            )
            .await?;

        let multistatus = MultiStatusResponse::from_xml(&resp.text().await?)?;
        let calendar_home = multistatus
            .find_prop(|p| p.calendar_home_set.clone())
            .unwrap_or_else(|| self.calendar_home());
        let calendar_user_addresses = multistatus
            .find_prop(|p| {
                (!p.calendar_user_addresses.is_empty()).then(|| p.calendar_user_addresses.clone())
            })
            .unwrap_or_default();

        tracing::debug!(supports_calendars, %calendar_home, "discovery finished");
        Ok(DiscoverResult {
            supports_calendars,
            calendar_home,
            calendar_user_addresses,
        })
    }

    /// Gets list of calendar collections under the calendar home.
    ///
    /// # Errors
    ///
    /// Returns an error if PROPFIND fails.
    #[tracing::instrument(skip(self))]
    pub async fn list_calendars(&self) -> Result<Vec<CalendarCollection>, CalDavError> {
        let url = self.full_url(&self.config.calendar_home);

        let mut propfind = PropFindRequest::new();
        propfind
            .add_property(Prop::DisplayName)
            .add_property(Prop::ResourceType)
            .add_property(Prop::CalendarDescription)
            .add_property(Prop::SupportedCalendarComponents)
            .add_property(Prop::CalendarColor)
            .add_property(Prop::SyncToken);

        let resp = self
            .http
            .execute(
                self.http
                    .build_dav_request("PROPFIND", &url)?
                    .header("Depth", "1")
                    .body(propfind.build()?),
            )
            .await?;

        let xml = resp.text().await?;
        let collections = MultiStatusResponse::from_xml(&xml)?.into_collections();
        tracing::debug!(count = collections.len(), "listed calendars");
        Ok(collections)
    }

    /// Asks for the changes of a collection since `sync_token`.
    ///
    /// # Errors
    ///
    /// Returns [`CalDavError::InvalidSyncToken`] if the server no longer
    /// accepts the token, or another error if the REPORT fails.
    #[tracing::instrument(skip(self, sync_token))]
    pub async fn sync_collection(
        &self,
        calendar_href: &Href,
        sync_token: &str,
    ) -> Result<SyncCollection, CalDavError> {
        let url = self.full_url(calendar_href.as_str());
        let body = SyncCollectionRequest::new(sync_token).build()?;

        let resp = self
            .http
            .execute(
                self.http
                    .build_dav_request("REPORT", &url)?
                    .header("Depth", "0")
                    .body(body),
            )
            .await?;

        let xml = resp.text().await?;
        let collection = MultiStatusResponse::from_xml(&xml)?.into_sync_collection();
        tracing::debug!(
            items = collection.items.as_ref().map(Vec::len),
            "sync-collection answered"
        );
        Ok(collection)
    }

    /// Fetches the events of one resource that fall into `range`.
    ///
    /// # Errors
    ///
    /// Returns an error if the REPORT fails or the calendar data is invalid.
    #[tracing::instrument(skip(self, range))]
    pub async fn fetch_range(
        &self,
        href: &Href,
        range: &TimeRange,
    ) -> Result<Vec<CalendarResource>, CalDavError> {
        self.calendar_query(href, range, "0").await
    }

    /// Fetches every event of a calendar collection that falls into `range`.
    ///
    /// # Errors
    ///
    /// Returns an error if the REPORT fails or the calendar data is invalid.
    #[tracing::instrument(skip(self, range))]
    pub async fn query_range(
        &self,
        calendar_href: &Href,
        range: &TimeRange,
    ) -> Result<Vec<CalendarResource>, CalDavError> {
        self.calendar_query(calendar_href, range, "1").await
    }

    async fn calendar_query(
        &self,
        href: &Href,
        range: &TimeRange,
        depth: &str,
    ) -> Result<Vec<CalendarResource>, CalDavError> {
        let url = self.full_url(href.as_str());
        let body = CalendarQueryRequest::new()
            .component("VEVENT")
            .time_range(range.clone())
            .build()?;

        let resp = self
            .http
            .execute(
                self.http
                    .build_dav_request("REPORT", &url)?
                    .header("Depth", depth)
                    .body(body),
            )
            .await?;

        let xml = resp.text().await?;
        MultiStatusResponse::from_xml(&xml)?.into_resources()
    }

    /// Gets a single calendar object by href.
    ///
    /// # Errors
    ///
    /// Returns an error if the object doesn't exist or parsing fails.
    #[tracing::instrument(skip(self))]
    pub async fn get_resource(&self, href: &Href) -> Result<CalendarResource, CalDavError> {
        let url = self.full_url(href.as_str());
        let resp = self
            .http
            .execute(self.http.build_request(Method::GET, &url))
            .await?;

        let etag = HttpClient::extract_etag(&resp);
        let ical_data = resp.text().await?;

        let data = parse(&ical_data)?
            .into_iter()
            .next()
            .ok_or_else(|| CalDavError::InvalidResponse("No calendar data found".to_string()))?;

        Ok(CalendarResource::new(href.clone(), etag, data))
    }

    /// Writes a calendar object wholesale.
    ///
    /// With an `ETag` the write is conditional on it (`If-Match`); without one
    /// the resource must not exist yet (`If-None-Match: *`).
    ///
    /// # Errors
    ///
    /// Returns [`CalDavError::PreconditionFailed`] on an `ETag` mismatch, or
    /// another error if the PUT fails.
    #[tracing::instrument(skip(self, etag, calendar))]
    pub async fn put_resource(
        &self,
        href: &Href,
        etag: Option<&ETag>,
        calendar: &Component,
    ) -> Result<Option<ETag>, CalDavError> {
        let url = self.full_url(href.as_str());
        let req = self
            .http
            .build_request(Method::PUT, &url)
            .header("Content-Type", "text/calendar; charset=utf-8")
            .body(format(calendar));

        let req = match etag {
            Some(etag) => HttpClient::if_match(req, etag),
            None => HttpClient::if_none_match_any(req),
        };

        let resp = self.http.execute(req).await?;
        Ok(HttpClient::extract_etag(&resp))
    }

    /// Deletes a calendar object.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails; a missing resource yields
    /// [`CalDavError::NotFound`].
    #[tracing::instrument(skip(self))]
    pub async fn delete_resource(&self, href: &Href) -> Result<(), CalDavError> {
        let url = self.full_url(href.as_str());
        self.http
            .execute(self.http.build_request(Method::DELETE, &url))
            .await?;
        Ok(())
    }

    /// Builds full URL from href.
    fn full_url(&self, href: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), href)
    }
}

/// Result of `CalDAV` server discovery.
#[derive(Debug, Clone)]
pub struct DiscoverResult {
    /// Whether the server supports `CalDAV`.
    pub supports_calendars: bool,
    /// The calendar home set href.
    pub calendar_home: Href,
    /// Addresses (usually `mailto:` URIs) identifying the current user.
    pub calendar_user_addresses: Vec<String>,
}
