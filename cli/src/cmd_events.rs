// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use calsync_core::CalendarEvent;
use clap::{ArgMatches, Command};
use colored::Colorize;

use crate::cmd_sync::calendar_arg;
use crate::session::Session;

#[derive(Debug, Clone)]
pub struct CmdEvents {
    pub calendar: Option<String>,
}

impl CmdEvents {
    pub const NAME: &str = "events";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("ls")
            .about("Synchronize, then list cached events")
            .arg(calendar_arg())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            calendar: matches.get_one::<String>("calendar").cloned(),
        }
    }

    pub async fn run(self, session: &mut Session) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "listing events...");
        for (cal_id, report) in session.sync(self.calendar.as_deref()).await? {
            if let Err(e) = report {
                println!("{} {} {}", cal_id.bold(), "failed:".red(), e);
            }
        }

        let mut events = session
            .sync
            .store()
            .calendars()
            .filter(|c| self.calendar.as_ref().is_none_or(|id| *id == c.id))
            .flat_map(|c| c.events.values())
            .collect::<Vec<_>>();
        events.sort_by_key(|e| e.start.as_ref().and_then(|t| t.timestamp()));

        if events.is_empty() {
            println!("No events found");
            return Ok(());
        }
        for event in events {
            println!("{}", format_event(event));
        }
        Ok(())
    }
}

fn format_event(event: &CalendarEvent) -> String {
    let start = event
        .start
        .as_ref()
        .map_or_else(|| "-".to_string(), |t| t.value());
    let mut line = format!("{:<16} {} {}", start, event.id.to_string().dimmed(), event.title.bold());
    if event.is_recurring() {
        line.push_str(&format!(" {}", "(recurring)".cyan()));
    }
    line
}
