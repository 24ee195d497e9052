// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command};
use colored::Colorize;

use crate::session::Session;

#[derive(Debug, Clone, Copy)]
pub struct CmdCalendars;

impl CmdCalendars {
    pub const NAME: &str = "calendars";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("cals")
            .about("List the calendars that hold events")
    }

    pub fn from(_matches: &ArgMatches) -> Self {
        Self
    }

    pub async fn run(self, session: &mut Session) -> Result<(), Box<dyn Error>> {
        tracing::debug!("listing calendars...");
        let ids = session.sync.refresh_calendars().await?;
        if ids.is_empty() {
            println!("No calendars found");
            return Ok(());
        }

        for id in ids {
            let Some(calendar) = session.sync.store().calendar(&id) else {
                continue;
            };
            let name = if calendar.name() == calendar.id {
                String::new()
            } else {
                format!(" ({})", calendar.name())
            };
            println!("{}{} {}", calendar.id.bold(), name, calendar.href.as_str().dimmed());
        }
        Ok(())
    }
}
