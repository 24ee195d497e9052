// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Command-line front end of calsync.

mod cli;
mod cmd_calendars;
mod cmd_delete;
mod cmd_events;
mod cmd_rsvp;
mod cmd_sync;
mod config;
mod session;

pub use crate::cli::{Cli, Commands, run};
pub use crate::cmd_calendars::CmdCalendars;
pub use crate::cmd_delete::CmdDelete;
pub use crate::cmd_events::CmdEvents;
pub use crate::cmd_rsvp::CmdRsvp;
pub use crate::cmd_sync::CmdSync;
pub use crate::session::Session;
