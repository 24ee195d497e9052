// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Response parsers for WebDAV/CalDAV operations.

use quick_xml::events::Event;

use crate::error::CalDavError;
use crate::sync::{SyncCollection, SyncItem};
use crate::types::{CalendarCollection, CalendarResource, ETag, Href};
use crate::xml::read_text;

/// `WebDAV` multistatus response.
#[derive(Debug, Clone, Default)]
pub struct MultiStatusResponse {
    /// The response items.
    pub responses: Vec<ResponseItem>,
    /// Top-level `sync-token` of a sync-collection answer.
    pub sync_token: Option<String>,
    /// Whether the document had a `multistatus` root at all.
    pub has_multistatus: bool,
}

/// Individual response in multistatus.
#[derive(Debug, Clone, Default)]
pub struct ResponseItem {
    /// Target of the response; empty when the server omitted it.
    pub href: Href,
    /// Property groups with their status.
    pub prop_stats: Vec<PropStat>,
    /// Response-level status line, used for members removed from a collection.
    pub status: Option<String>,
}

/// Property stat with status and value.
#[derive(Debug, Clone, Default)]
pub struct PropStat {
    /// The properties of this group.
    pub props: Properties,
    /// Status line such as `HTTP/1.1 200 OK`.
    pub status: String,
}

/// WebDAV/CalDAV properties.
#[derive(Debug, Clone, Default)]
#[allow(missing_docs)]
pub struct Properties {
    pub display_name: Option<String>,
    pub get_etag: Option<ETag>,
    pub sync_token: Option<String>,
    pub calendar_data: Option<String>,
    pub calendar_home_set: Option<Href>,
    pub calendar_user_addresses: Vec<String>,
    pub supported_calendar_components: Option<Vec<String>>,
    pub calendar_description: Option<String>,
    pub calendar_color: Option<String>,
    pub is_calendar: bool,
    pub is_collection: bool,
}

/// Extracts the numeric code of an HTTP status line (`HTTP/1.1 404 Not Found`).
#[must_use]
pub fn status_code(status: &str) -> Option<u16> {
    status.split_whitespace().nth(1).and_then(|c| c.parse().ok())
}

fn is_success(status: &str) -> bool {
    status_code(status).is_some_and(|c| (200..300).contains(&c))
}

impl MultiStatusResponse {
    /// Parses multistatus response from XML.
    ///
    /// # Errors
    ///
    /// Returns an error if XML parsing fails.
    #[expect(clippy::too_many_lines)]
    pub fn from_xml(xml: &str) -> Result<Self, CalDavError> {
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().check_end_names = true;

        let mut parsed = Self::default();
        let mut current_response: Option<ResponseItem> = None;
        let mut current_props = Properties::default();
        let mut in_prop = false;
        let mut in_propstat = false;

        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Eof => break,

                Event::Start(ref e) => {
                    let name = e.name().local_name().into_inner().to_vec();
                    buf.clear();
                    match name.as_slice() {
                        b"multistatus" => parsed.has_multistatus = true,
                        b"response" => {
                            current_response = Some(ResponseItem::default());
                        }
                        b"propstat" if current_response.is_some() => {
                            in_propstat = true;
                            current_props = Properties::default();
                        }
                        b"prop" => in_prop = true,

                        b"href" if !in_prop => {
                            let href = read_text(&mut reader, &mut buf)?;
                            if let Some(resp) = current_response.as_mut() {
                                resp.href = Href::new(href.trim().to_string());
                            }
                        }
                        b"status" if in_propstat => {
                            let status = read_text(&mut reader, &mut buf)?.trim().to_string();
                            if let Some(resp) = current_response.as_mut() {
                                resp.prop_stats.push(PropStat {
                                    props: std::mem::take(&mut current_props),
                                    status,
                                });
                            }
                        }
                        b"status" => {
                            let status = read_text(&mut reader, &mut buf)?.trim().to_string();
                            if let Some(resp) = current_response.as_mut() {
                                resp.status = Some(status);
                            }
                        }
                        b"sync-token" if in_prop => {
                            current_props.sync_token =
                                Some(read_text(&mut reader, &mut buf)?.trim().to_string());
                        }
                        b"sync-token" => {
                            parsed.sync_token =
                                Some(read_text(&mut reader, &mut buf)?.trim().to_string());
                        }

                        b"displayname" if in_prop => {
                            current_props.display_name =
                                Some(read_text(&mut reader, &mut buf)?.trim().to_string());
                        }
                        b"getetag" if in_prop => {
                            current_props.get_etag =
                                Some(ETag::new(read_text(&mut reader, &mut buf)?.trim().to_string()));
                        }
                        b"calendar-data" if in_prop => {
                            current_props.calendar_data = Some(read_text(&mut reader, &mut buf)?);
                        }
                        b"calendar-description" if in_prop => {
                            current_props.calendar_description =
                                Some(read_text(&mut reader, &mut buf)?.trim().to_string());
                        }
                        b"calendar-color" if in_prop => {
                            current_props.calendar_color =
                                Some(read_text(&mut reader, &mut buf)?.trim().to_string());
                        }
                        b"resourcetype" if in_prop => {
                            current_props.is_collection = true;
                            loop {
                                match reader.read_event_into(&mut buf)? {
                                    Event::End(ref e)
                                        if e.name().local_name().into_inner()
                                            == b"resourcetype" =>
                                    {
                                        break;
                                    }
                                    Event::Start(ref e) | Event::Empty(ref e) => {
                                        if e.name().local_name().into_inner() == b"calendar" {
                                            current_props.is_calendar = true;
                                        }
                                    }
                                    Event::Eof => {
                                        return Err(CalDavError::Xml("Unexpected EOF".to_string()));
                                    }
                                    _ => {}
                                }
                                buf.clear();
                            }
                        }
                        b"calendar-home-set" if in_prop => {
                            let hrefs = read_hrefs(&mut reader, &mut buf, b"calendar-home-set")?;
                            current_props.calendar_home_set =
                                hrefs.into_iter().next().map(Href::new);
                        }
                        b"calendar-user-address-set" if in_prop => {
                            current_props.calendar_user_addresses =
                                read_hrefs(&mut reader, &mut buf, b"calendar-user-address-set")?;
                        }
                        b"supported-calendar-component-set" if in_prop => {
                            let mut components = Vec::new();
                            loop {
                                match reader.read_event_into(&mut buf)? {
                                    Event::End(ref e)
                                        if e.name().local_name().into_inner()
                                            == b"supported-calendar-component-set" =>
                                    {
                                        break;
                                    }
                                    Event::Start(ref e) | Event::Empty(ref e)
                                        if e.name().local_name().into_inner() == b"comp" =>
                                    {
                                        if let Ok(Some(name_attr)) = e.try_get_attribute("name") {
                                            let name = std::str::from_utf8(&name_attr.value)
                                                .map_err(|e| {
                                                    CalDavError::Xml(format!("UTF-8 error: {e}"))
                                                })?
                                                .to_string();
                                            components.push(name);
                                        }
                                    }
                                    Event::Eof => {
                                        return Err(CalDavError::Xml("Unexpected EOF".to_string()));
                                    }
                                    _ => {}
                                }
                                buf.clear();
                            }
                            current_props.supported_calendar_components = Some(components);
                        }
                        _ => {}
                    }
                }
                Event::End(ref e) => match e.name().local_name().into_inner() {
                    b"response" => {
                        if let Some(resp) = current_response.take() {
                            parsed.responses.push(resp);
                        }
                    }
                    b"propstat" => in_propstat = false,
                    b"prop" => in_prop = false,
                    _ => {}
                },
                _ => {}
            }
            buf.clear();
        }

        Ok(parsed)
    }

    /// Converts multistatus response to calendar resources.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded iCalendar data does not parse.
    pub fn into_resources(self) -> Result<Vec<CalendarResource>, CalDavError> {
        let mut resources = Vec::new();

        for response in self.responses {
            for prop_stat in response.prop_stats {
                if !is_success(&prop_stat.status) {
                    continue;
                }
                let Some(data) = prop_stat.props.calendar_data else {
                    continue;
                };
                for calendar in calsync_ical::parse(&data)? {
                    resources.push(CalendarResource::new(
                        response.href.clone(),
                        prop_stat.props.get_etag.clone(),
                        calendar,
                    ));
                }
            }
        }

        Ok(resources)
    }

    /// Converts multistatus response to calendar collections.
    #[must_use]
    pub fn into_collections(self) -> Vec<CalendarCollection> {
        let mut collections = Vec::new();

        for response in self.responses {
            for prop_stat in response.prop_stats {
                if !is_success(&prop_stat.status) {
                    continue;
                }
                let props = prop_stat.props;
                // Only include if it's a calendar collection
                if props.is_calendar && props.is_collection {
                    collections.push(CalendarCollection {
                        href: response.href.clone(),
                        display_name: props.display_name,
                        description: props.calendar_description,
                        color: props.calendar_color,
                        supported_components: props
                            .supported_calendar_components
                            .unwrap_or_default(),
                        sync_token: props.sync_token,
                    });
                }
            }
        }

        collections
    }

    /// Converts a sync-collection answer into its change descriptors.
    ///
    /// A document without a `multistatus` container yields `items: None`; the
    /// sync token is kept either way.
    #[must_use]
    pub fn into_sync_collection(self) -> SyncCollection {
        let items = self.has_multistatus.then(|| {
            self.responses
                .into_iter()
                .map(|response| {
                    let status = response
                        .status
                        .as_deref()
                        .or_else(|| response.prop_stats.first().map(|p| p.status.as_str()))
                        .and_then(status_code);
                    let href = (!response.href.is_empty()).then_some(response.href);
                    SyncItem { href, status }
                })
                .collect()
        });

        SyncCollection {
            sync_token: self.sync_token,
            items,
        }
    }

    /// Returns the first property value found in a successful propstat.
    pub fn find_prop<T>(&self, f: impl Fn(&Properties) -> Option<T>) -> Option<T> {
        self.responses.iter().find_map(|r| {
            r.prop_stats
                .iter()
                .filter(|p| is_success(&p.status))
                .find_map(|p| f(&p.props))
        })
    }
}

/// Collects `<href>` texts until the end tag `end`.
fn read_hrefs(
    reader: &mut quick_xml::Reader<&[u8]>,
    buf: &mut Vec<u8>,
    end: &[u8],
) -> Result<Vec<String>, CalDavError> {
    let mut hrefs = Vec::new();
    loop {
        let is_href = match reader.read_event_into(buf)? {
            Event::End(ref e) if e.name().local_name().into_inner() == end => break,
            Event::Start(ref e) => e.name().local_name().into_inner() == b"href",
            Event::Eof => return Err(CalDavError::Xml("Unexpected EOF".to_string())),
            _ => false,
        };
        buf.clear();
        if is_href {
            hrefs.push(read_text(reader, buf)?.trim().to_string());
        }
    }
    buf.clear();
    Ok(hrefs)
}
