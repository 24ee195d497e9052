// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, str::FromStr};

use calsync_core::EditScope;
use clap::{Arg, ArgMatches, Command, builder::PossibleValuesParser};
use colored::Colorize;

use crate::session::Session;

#[derive(Debug, Clone)]
pub struct CmdDelete {
    pub id: String,
    pub scope: EditScope,
}

impl CmdDelete {
    pub const NAME: &str = "delete";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("rm")
            .about("Delete an event, or one occurrence of a series")
            .arg(
                Arg::new("id")
                    .value_name("EVENT-ID")
                    .required(true)
                    .help("The event id, `uid` or `uid/recurrence-id`"),
            )
            .arg(
                Arg::new("scope")
                    .long("scope")
                    .short('s')
                    .value_name("SCOPE")
                    .default_value("solo")
                    .ignore_case(true)
                    .value_parser(PossibleValuesParser::new(["solo", "all"]))
                    .help("Delete only this occurrence, or the whole series"),
            )
    }

    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        let id = matches
            .get_one::<String>("id")
            .cloned()
            .ok_or("Missing argument: id")?;
        let scope = matches
            .get_one::<String>("scope")
            .map_or(Ok(EditScope::Solo), |s| EditScope::from_str(s))?;
        Ok(Self { id, scope })
    }

    pub async fn run(self, session: &mut Session) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "deleting event...");
        let event = session.find_event(&self.id).await?;
        session.sync.delete(self.scope, &event).await?;

        let what = match (self.scope, event.is_recurring()) {
            (EditScope::Solo, true) => "occurrence of",
            (EditScope::All, true) => "series",
            (_, false) => "event",
        };
        println!("{} {what} {}", "Deleted".green(), event.title.bold());
        Ok(())
    }
}
