// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Common test utilities for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - An in-memory `CalendarRemote` with scripted sync answers
//! - Resource fixtures for plain and recurring events

mod fixtures;
mod remote;

#[allow(unused_imports)]
pub use fixtures::{
    CAL_HREF, calendar_with_token, range, series_ics, series_with_overrides_ics, single_ics,
};
#[allow(unused_imports)]
pub use remote::{MockRemote, changed, deleted, diff};
