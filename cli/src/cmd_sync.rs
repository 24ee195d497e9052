// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use calsync_core::SyncReport;
use clap::{Arg, ArgMatches, Command};
use colored::Colorize;

use crate::session::Session;

#[derive(Debug, Clone)]
pub struct CmdSync {
    pub calendar: Option<String>,
}

impl CmdSync {
    pub const NAME: &str = "sync";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Synchronize calendars with the server")
            .arg(calendar_arg())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            calendar: matches.get_one::<String>("calendar").cloned(),
        }
    }

    pub async fn run(self, session: &mut Session) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "synchronizing...");
        let reports = session.sync(self.calendar.as_deref()).await?;

        let mut failures = 0;
        for (cal_id, report) in reports {
            match report {
                Ok(report) => println!("{} {}", cal_id.bold(), describe(&report)),
                Err(e) => {
                    failures += 1;
                    println!("{} {} {}", cal_id.bold(), "failed:".red(), e);
                }
            }
        }

        if failures > 0 {
            return Err(format!("{failures} calendar(s) failed to sync").into());
        }
        Ok(())
    }
}

pub(crate) fn calendar_arg() -> Arg {
    Arg::new("calendar")
        .short('C')
        .long("calendar")
        .value_name("ID")
        .help("Only this calendar")
}

fn describe(report: &SyncReport) -> String {
    let mut s = format!(
        "{} sync: {} removed, {} updated",
        report.mode, report.summary.removed, report.summary.upserted
    );
    if report.failed > 0 {
        s.push_str(&format!(", {}", format!("{} not fetched", report.failed).yellow()));
    }
    if report.malformed {
        s.push_str(&format!(", {}", "malformed answer".yellow()));
    }
    s
}
