// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Read-modify-write mutations of recurring events.
//!
//! Every operation reads the whole resource (master, overrides and timezone
//! definitions), changes it in memory and writes it back wholesale, guarded by
//! the entity tag it was read with. The local cache is never touched here.

use std::sync::Arc;

use calsync_caldav::{CalendarResource, ETag, Href};
use calsync_ical::keyword::{
    KW_ATTENDEE, KW_CLASS, KW_CONFERENCE, KW_DESCRIPTION, KW_DTSTART, KW_EXDATE, KW_LOCATION,
    KW_ORGANIZER, KW_PARTSTAT, KW_PRODID, KW_RECURRENCE_ID, KW_SEQUENCE, KW_SUMMARY, KW_TRANSP,
    KW_TZID, KW_VALARM, KW_VCALENDAR, KW_VERSION, KW_VEVENT, KW_VTIMEZONE,
};
use calsync_ical::{Component, ParticipationStatus, Property};

use crate::error::MutationError;
use crate::event::{
    CalendarEvent, EventTime, normalize_recurrence_id, recurrence_property, strip_mailto,
};
use crate::identity::OccurrenceId;
use crate::remote::CalendarRemote;
use crate::scope::{DeletePlan, EditPlan, lift_to_master};

const PRODID: &str = concat!("-//calsync//calsync ", env!("CARGO_PKG_VERSION"), "//EN");

/// Fields copied from a rewritten master onto its overrides.
pub const DEFAULT_METADATA_FIELDS: &[&str] = &[
    KW_SUMMARY,
    KW_DESCRIPTION,
    KW_LOCATION,
    KW_CLASS,
    KW_TRANSP,
    KW_ATTENDEE,
    KW_ORGANIZER,
    KW_CONFERENCE,
    KW_VALARM,
];

/// Names of the properties (and `VALARM`) that count as descriptive metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataFields(Vec<String>);

impl MetadataFields {
    /// Creates a set from property or component names.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names = fields
            .into_iter()
            .map(|f| f.as_ref().trim().to_ascii_uppercase())
            .filter(|f| !f.is_empty())
            .collect::<Vec<_>>();
        names.sort();
        names.dedup();
        Self(names)
    }

    /// Returns true if `name` is in the set.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|f| f.eq_ignore_ascii_case(name))
    }

    /// Iterates over the names.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for MetadataFields {
    fn default() -> Self {
        Self::new(DEFAULT_METADATA_FIELDS)
    }
}

/// Applies recurring-event mutations to server resources.
#[derive(Debug)]
pub struct EventMutationEngine<R: ?Sized> {
    remote: Arc<R>,
    metadata: MetadataFields,
}

impl<R: CalendarRemote + ?Sized> EventMutationEngine<R> {
    /// Creates an engine writing through `remote`.
    pub const fn new(remote: Arc<R>, metadata: MetadataFields) -> Self {
        Self { remote, metadata }
    }

    /// The fields propagated to overrides on metadata-only rewrites.
    pub const fn metadata_fields(&self) -> &MetadataFields {
        &self.metadata
    }

    /// Removes one occurrence from its series.
    ///
    /// The occurrence is excluded through an `EXDATE` on the master (unless an
    /// equal one exists already) and its override, if any, is dropped.
    ///
    /// # Errors
    ///
    /// Fails if the resource cannot be read or written, has no master, or the
    /// event has neither a recurrence id nor a start.
    #[tracing::instrument(skip_all, fields(id = %event.id, href = %event.url))]
    pub async fn delete_instance(&self, event: &CalendarEvent) -> Result<(), MutationError> {
        let rid = match event.recurrence_id() {
            Some(rid) => rid.to_string(),
            None => event
                .start
                .as_ref()
                .map(EventTime::value)
                .ok_or_else(|| MutationError::MissingStart(event.id.to_string()))?,
        };
        let key = normalize_recurrence_id(&rid);

        let mut resource = self.read(&event.url).await?;
        let master = master_mut(&mut resource.data)
            .ok_or_else(|| MutationError::MissingMaster(event.url.clone()))?;

        let excluded = master
            .properties_named(KW_EXDATE)
            .flat_map(|p| p.value.split(','))
            .any(|v| normalize_recurrence_id(v) == key);
        if excluded {
            tracing::debug!(rid, "occurrence already excluded");
        } else {
            let tzid = start_tzid(master);
            master.push_property(recurrence_property(KW_EXDATE, &rid, tzid.as_deref()));
        }

        resource
            .data
            .children
            .retain(|c| !(c.is(KW_VEVENT) && override_key(c) == Some(key)));

        self.write(&resource).await.map(|_| ())
    }

    /// Writes one occurrence as an override, replacing an existing override
    /// with the same recurrence id.
    ///
    /// # Errors
    ///
    /// Fails if the event is not an instance or the resource cannot be read
    /// or written.
    #[tracing::instrument(skip_all, fields(id = %event.id, href = %event.url))]
    pub async fn upsert_instance_override(
        &self,
        event: &CalendarEvent,
    ) -> Result<(), MutationError> {
        let rid = event
            .recurrence_id()
            .ok_or_else(|| MutationError::NotAnInstance(event.id.to_string()))?;
        let key = normalize_recurrence_id(rid);

        let mut resource = self.read(&event.url).await?;
        let mut component = event.to_component();
        set_sequence(&mut component, event.sequence.saturating_add(1));

        let existing = resource
            .data
            .children
            .iter_mut()
            .find(|c| c.is(KW_VEVENT) && override_key(c) == Some(key));
        match existing {
            Some(slot) => *slot = component,
            None => resource.data.children.push(component),
        }

        self.write(&resource).await.map(|_| ())
    }

    /// Rewrites the master of a series from `event`.
    ///
    /// A rule left out of `event` keeps the existing one. With
    /// `remove_overrides` the resource keeps only the new master (and its
    /// timezone definitions); otherwise every override stays, receives the
    /// metadata fields that changed on the master, and has its `SEQUENCE`
    /// bumped.
    ///
    /// # Errors
    ///
    /// Fails if the resource cannot be read or written or has no master.
    #[tracing::instrument(
        skip_all,
        fields(id = %event.id, href = %event.url, remove_overrides = remove_overrides)
    )]
    pub async fn rewrite_series(
        &self,
        event: &CalendarEvent,
        remove_overrides: bool,
    ) -> Result<(), MutationError> {
        let resource = self.read(&event.url).await?;
        self.rewrite_master(resource, event, remove_overrides).await
    }

    /// Rewrites the master of a series from an edit made on one of its
    /// occurrences.
    ///
    /// Only what changed between `old` and `new` reaches the master; a moved
    /// occurrence moves the master's start and end by the same offset. See
    /// [`lift_to_master`].
    ///
    /// # Errors
    ///
    /// Fails if the resource cannot be read or written or has no master.
    #[tracing::instrument(
        skip_all,
        fields(id = %old.id, href = %old.url, remove_overrides = remove_overrides)
    )]
    pub async fn rewrite_series_from(
        &self,
        old: &CalendarEvent,
        new: &CalendarEvent,
        remove_overrides: bool,
    ) -> Result<(), MutationError> {
        let mut resource = self.read(&new.url).await?;
        let href = resource.href.clone();
        let etag = resource.etag.clone();
        let master = master_mut(&mut resource.data)
            .and_then(|c| CalendarEvent::from_component(&new.cal_id, &href, etag.as_ref(), c))
            .ok_or_else(|| MutationError::MissingMaster(new.url.clone()))?;

        let lifted = lift_to_master(&master, old, new);
        self.rewrite_master(resource, &lifted, remove_overrides).await
    }

    async fn rewrite_master(
        &self,
        mut resource: CalendarResource,
        event: &CalendarEvent,
        remove_overrides: bool,
    ) -> Result<(), MutationError> {
        let old = master_mut(&mut resource.data)
            .ok_or_else(|| MutationError::MissingMaster(event.url.clone()))?
            .clone();

        let mut source = event.clone();
        source.id = event.id.master();
        let mut master = old.clone();
        source.apply_to(&mut master);
        master.remove_properties(KW_RECURRENCE_ID);
        set_sequence(&mut master, sequence_of(&old).max(event.sequence).saturating_add(1));

        let changed = self
            .metadata
            .iter()
            .filter(|name| field_values(&old, name) != field_values(&master, name))
            .map(str::to_string)
            .collect::<Vec<_>>();
        tracing::debug!(?changed, "metadata fields changed on master");

        let children = std::mem::take(&mut resource.data.children);
        let mut kept_overrides = 0usize;
        for mut child in children {
            if !child.is(KW_VEVENT) {
                resource.data.children.push(child);
            } else if override_key(&child).is_none() {
                resource.data.children.push(master.clone());
            } else if !remove_overrides {
                for name in &changed {
                    copy_field(&master, &mut child, name);
                }
                let sequence = sequence_of(&child).saturating_add(1);
                set_sequence(&mut child, sequence);
                resource.data.children.push(child);
                kept_overrides += 1;
            }
        }
        tracing::debug!(kept_overrides, "series rewritten");

        self.write(&resource).await.map(|_| ())
    }

    /// Replaces a recurring series by a single event under a new identifier.
    ///
    /// The old resource is deleted first; a failure there is logged and does
    /// not stop the creation of the replacement, a later sync pass cleans up.
    ///
    /// # Errors
    ///
    /// Fails only if the new resource cannot be written.
    #[tracing::instrument(skip_all, fields(id = %event.id, href = %event.url))]
    pub async fn convert_recurring_to_single(
        &self,
        event: &CalendarEvent,
    ) -> Result<CalendarEvent, MutationError> {
        let timezones = match self.remote.get_resource(&event.url).await {
            Ok(resource) => resource
                .data
                .children_named(KW_VTIMEZONE)
                .cloned()
                .collect::<Vec<_>>(),
            Err(e) => {
                tracing::debug!(err = %e, "old series unreadable, writing without timezones");
                Vec::new()
            }
        };

        match self.remote.delete_resource(&event.url).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => tracing::debug!("old series already gone"),
            Err(e) => tracing::warn!(err = %e, "failed to delete old series, continuing"),
        }

        let uid = uuid::Uuid::new_v4().to_string();
        let href = event.url.parent().join(&format!("{uid}.ics"));

        let mut single = event.clone();
        single.id = OccurrenceId::new(uid);
        single.url = href.clone();
        single.etag = None;
        single.repetition = None;
        single.exdates.clear();
        single.sequence = 1;

        let mut data = calendar_wrapper();
        data.children.extend(timezones);
        data.children.push(single.to_component());

        single.etag = self
            .remote
            .put_resource(&href, None, &data)
            .await
            .map_err(|source| MutationError::ResourceWrite {
                href: href.clone(),
                source,
            })?;
        tracing::info!(new_id = %single.id, "series converted to a single event");
        Ok(single)
    }

    /// Sets the participation status of one attendee on every component of
    /// the resource, in one write.
    ///
    /// Attendees match when their address contains `email`, ignoring case;
    /// an empty address matches nobody. Returns the number of updated entries; nothing is written when none
    /// matched.
    ///
    /// # Errors
    ///
    /// Fails if the resource cannot be read or written.
    #[tracing::instrument(skip_all, fields(id = %event.id, href = %event.url, status = %status))]
    pub async fn bulk_partstat_update(
        &self,
        event: &CalendarEvent,
        email: &str,
        status: ParticipationStatus,
    ) -> Result<usize, MutationError> {
        let needle = strip_mailto(email.trim()).trim().to_ascii_lowercase();
        if needle.is_empty() {
            tracing::debug!(email, "no address given, nothing to update");
            return Ok(0);
        }
        let mut resource = self.read(&event.url).await?;

        let mut updated = 0usize;
        for component in resource
            .data
            .children
            .iter_mut()
            .filter(|c| c.is(KW_VEVENT))
        {
            for attendee in component
                .properties
                .iter_mut()
                .filter(|p| p.name == KW_ATTENDEE)
                .filter(|p| p.value.to_ascii_lowercase().contains(&needle))
            {
                attendee.set_parameter(KW_PARTSTAT, status.to_string());
                updated += 1;
            }
        }

        if updated == 0 {
            tracing::debug!(email, "no matching attendee");
            return Ok(0);
        }
        self.write(&resource).await?;
        Ok(updated)
    }

    /// Deletes the whole resource of a series; a missing resource is fine.
    ///
    /// # Errors
    ///
    /// Fails if the server rejects the delete.
    #[tracing::instrument(skip_all, fields(href = %event.url))]
    pub async fn delete_series(&self, event: &CalendarEvent) -> Result<(), MutationError> {
        match self.remote.delete_resource(&event.url).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::debug!("series already gone");
                Ok(())
            }
            Err(source) => Err(MutationError::ResourceWrite {
                href: event.url.clone(),
                source,
            }),
        }
    }

    /// Executes a resolved edit.
    ///
    /// # Errors
    ///
    /// Propagates the error of the underlying mutation.
    pub async fn apply_edit(&self, plan: &EditPlan) -> Result<(), MutationError> {
        match plan {
            EditPlan::Update(event) => self.rewrite_series(event, false).await,
            EditPlan::UpsertOverride(event) => self.upsert_instance_override(event).await,
            EditPlan::RewriteSeries {
                event,
                remove_overrides,
                occurrence: Some(old),
            } => self.rewrite_series_from(old, event, *remove_overrides).await,
            EditPlan::RewriteSeries {
                event,
                remove_overrides,
                occurrence: None,
            } => self.rewrite_series(event, *remove_overrides).await,
        }
    }

    /// Executes a resolved delete.
    ///
    /// # Errors
    ///
    /// Propagates the error of the underlying mutation.
    pub async fn apply_delete(&self, plan: &DeletePlan) -> Result<(), MutationError> {
        match plan {
            DeletePlan::DeleteInstance(event) => self.delete_instance(event).await,
            DeletePlan::DeleteSeries(event) => self.delete_series(event).await,
        }
    }

    async fn read(&self, href: &Href) -> Result<CalendarResource, MutationError> {
        self.remote
            .get_resource(href)
            .await
            .map_err(|source| MutationError::ResourceRead {
                href: href.clone(),
                source,
            })
    }

    async fn write(&self, resource: &CalendarResource) -> Result<Option<ETag>, MutationError> {
        self.remote
            .put_resource(&resource.href, resource.etag.as_ref(), &resource.data)
            .await
            .map_err(|source| MutationError::ResourceWrite {
                href: resource.href.clone(),
                source,
            })
    }
}

fn calendar_wrapper() -> Component {
    Component::new(KW_VCALENDAR)
        .with_property(Property::new(KW_VERSION, "2.0"))
        .with_property(Property::new(KW_PRODID, PRODID))
}

fn master_mut(calendar: &mut Component) -> Option<&mut Component> {
    calendar
        .children
        .iter_mut()
        .find(|c| c.is(KW_VEVENT) && c.property(KW_RECURRENCE_ID).is_none())
}

fn override_key(component: &Component) -> Option<&str> {
    component.value(KW_RECURRENCE_ID).map(normalize_recurrence_id)
}

fn start_tzid(component: &Component) -> Option<String> {
    component
        .property(KW_DTSTART)
        .and_then(|p| p.parameter(KW_TZID))
        .map(str::to_string)
}

fn sequence_of(component: &Component) -> u32 {
    component
        .value(KW_SEQUENCE)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

fn set_sequence(component: &mut Component, sequence: u32) {
    component.set_property(Property::new(KW_SEQUENCE, sequence.to_string()));
}

fn field_values<'a>(component: &'a Component, name: &str) -> Vec<FieldValue<'a>> {
    if name == KW_VALARM {
        component
            .children_named(KW_VALARM)
            .map(FieldValue::Alarm)
            .collect()
    } else {
        component
            .properties
            .iter()
            .filter(|p| p.name == name)
            .map(FieldValue::Property)
            .collect()
    }
}

fn copy_field(from: &Component, to: &mut Component, name: &str) {
    if name == KW_VALARM {
        to.children.retain(|c| !c.is(KW_VALARM));
        to.children.extend(from.children_named(KW_VALARM).cloned());
    } else {
        to.remove_properties(name);
        to.properties
            .extend(from.properties.iter().filter(|p| p.name == name).cloned());
    }
}

#[derive(Debug, PartialEq, Eq)]
enum FieldValue<'a> {
    Property(&'a Property),
    Alarm(&'a Component),
}
