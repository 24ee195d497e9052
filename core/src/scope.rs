// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Resolution of edit and delete scopes on recurring series.

use crate::error::MutationError;
use crate::event::{CalendarEvent, EventTime};
use crate::identity::OccurrenceId;

/// Which part of a series an edit or delete applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(strum::EnumString, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EditScope {
    /// Only the selected occurrence.
    Solo,
    /// Every occurrence of the series.
    All,
}

/// The mutation an edit resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditPlan {
    /// A plain, non-recurring event.
    Update(CalendarEvent),
    /// Write one occurrence as an override.
    UpsertOverride(CalendarEvent),
    /// Rewrite the master of the series.
    RewriteSeries {
        /// New master data, or the edited occurrence when `occurrence` is set.
        event: CalendarEvent,
        /// Drop every override; set when the timing of the series changed.
        remove_overrides: bool,
        /// The occurrence as it was before the edit, when the edit was made on
        /// an instance rather than on the master. Only its differences to
        /// `event` reach the master.
        occurrence: Option<CalendarEvent>,
    },
}

/// The mutation a delete resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletePlan {
    /// Exclude one occurrence from its series.
    DeleteInstance(CalendarEvent),
    /// Delete the whole resource.
    DeleteSeries(CalendarEvent),
}

/// Resolves an edit of `old` into `new` under `scope`.
///
/// # Errors
///
/// Returns [`MutationError::MissingStart`] when a single occurrence of a
/// master is edited and the master has no start to derive its recurrence id
/// from.
pub fn plan_edit(
    scope: EditScope,
    old: &CalendarEvent,
    mut new: CalendarEvent,
) -> Result<EditPlan, MutationError> {
    if !old.is_recurring() {
        return Ok(EditPlan::Update(new));
    }

    match scope {
        EditScope::Solo => {
            if !new.id.is_instance() {
                let rid = old
                    .start
                    .as_ref()
                    .map(EventTime::value)
                    .ok_or_else(|| MutationError::MissingStart(old.id.to_string()))?;
                new.id = OccurrenceId::instance(old.uid(), rid);
            }
            new.repetition = None;
            new.exdates.clear();
            Ok(EditPlan::UpsertOverride(new))
        }
        EditScope::All => {
            let remove_overrides = timing_changed(old, &new);
            Ok(EditPlan::RewriteSeries {
                event: new,
                remove_overrides,
                occurrence: old.id.is_instance().then(|| old.clone()),
            })
        }
    }
}

/// Resolves a delete of `event` under `scope`.
#[must_use]
pub fn plan_delete(scope: EditScope, event: CalendarEvent) -> DeletePlan {
    match scope {
        EditScope::Solo if event.is_recurring() => DeletePlan::DeleteInstance(event),
        _ => DeletePlan::DeleteSeries(event),
    }
}

/// Returns true if the date, time, zone or recurrence rule differ.
///
/// A new event without a rule keeps the existing one, so only a given rule
/// can change it.
#[must_use]
pub fn timing_changed(old: &CalendarEvent, new: &CalendarEvent) -> bool {
    old.start != new.start
        || old.end != new.end
        || old.is_allday() != new.is_allday()
        || old.timezone() != new.timezone()
        || new
            .repetition
            .as_ref()
            .is_some_and(|r| old.repetition.as_ref() != Some(r))
}

/// Carries an edit made on one occurrence (`old` into `new`) over to the
/// series `master`.
///
/// Only fields that differ between `old` and `new` are taken over. A moved
/// start or end shifts the master's by the same offset; if the offset cannot
/// be expressed on the master's value type, the new value is used as is.
#[must_use]
pub fn lift_to_master(
    master: &CalendarEvent,
    old: &CalendarEvent,
    new: &CalendarEvent,
) -> CalendarEvent {
    fn take<T: Clone + PartialEq>(target: &mut T, old: &T, new: &T) {
        if old != new {
            target.clone_from(new);
        }
    }

    let mut lifted = master.clone();
    take(&mut lifted.title, &old.title, &new.title);
    take(&mut lifted.description, &old.description, &new.description);
    take(&mut lifted.location, &old.location, &new.location);
    take(&mut lifted.organizer, &old.organizer, &new.organizer);
    take(&mut lifted.attendees, &old.attendees, &new.attendees);
    take(&mut lifted.class, &old.class, &new.class);
    take(&mut lifted.transparency, &old.transparency, &new.transparency);
    if new.repetition.is_some() && old.repetition != new.repetition {
        lifted.repetition.clone_from(&new.repetition);
    }

    lifted.start = shift_time(master.start.as_ref(), old.start.as_ref(), new.start.as_ref());
    lifted.end = shift_time(master.end.as_ref(), old.end.as_ref(), new.end.as_ref());
    lifted.sequence = master.sequence.max(new.sequence);
    lifted
}

fn shift_time(
    master: Option<&EventTime>,
    old: Option<&EventTime>,
    new: Option<&EventTime>,
) -> Option<EventTime> {
    if old == new {
        return master.cloned();
    }
    match (master, old, new) {
        (Some(master), Some(old), Some(new)) => master.shifted(old, new).or_else(|| {
            tracing::debug!("offset not applicable to the master, taking the new value");
            Some(new.clone())
        }),
        (_, _, Some(new)) => Some(new.clone()),
        (master, _, None) => master.cloned(),
    }
}
