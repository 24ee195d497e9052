// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Parse and represent iCalendar components and properties as a structured tree.

#![warn(
    trivial_casts,
    trivial_numeric_casts,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    clippy::dbg_macro,
    clippy::indexing_slicing,
    clippy::pedantic
)]
// Allow certain clippy lints that are too restrictive for this crate
#![allow(
    clippy::option_option,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::match_bool,
    clippy::missing_docs_in_private_items
)]

pub mod formatter;
#[allow(missing_docs)]
pub mod keyword;
pub mod parameter;
pub mod syntax;
pub mod value;

pub use crate::formatter::{FormatOptions, format};
pub use crate::parameter::{CalendarUserType, ParticipationRole, ParticipationStatus, ValueType};
pub use crate::syntax::{Component, ParseError, Property, parse};
pub use crate::value::{
    Frequency, RecurrenceRule, RecurrenceRuleError, escape_text, unescape_text,
};
