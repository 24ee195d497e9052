// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, str::FromStr};

use calsync_ical::ParticipationStatus;
use clap::{Arg, ArgMatches, Command, builder::PossibleValuesParser};
use colored::Colorize;

use crate::session::Session;

#[derive(Debug, Clone)]
pub struct CmdRsvp {
    pub id: String,
    pub email: String,
    pub status: ParticipationStatus,
}

impl CmdRsvp {
    pub const NAME: &str = "rsvp";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Answer an invitation for every occurrence of an event")
            .arg(
                Arg::new("id")
                    .value_name("EVENT-ID")
                    .required(true)
                    .help("The event id, `uid` or `uid/recurrence-id`"),
            )
            .arg(
                Arg::new("email")
                    .value_name("EMAIL")
                    .required(true)
                    .help("The attendee address"),
            )
            .arg(
                Arg::new("status")
                    .value_name("STATUS")
                    .required(true)
                    .ignore_case(true)
                    .value_parser(PossibleValuesParser::new([
                        "accepted",
                        "declined",
                        "tentative",
                        "needs-action",
                    ]))
                    .help("The participation status"),
            )
    }

    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        let get = |name: &str| {
            matches
                .get_one::<String>(name)
                .cloned()
                .ok_or_else(|| format!("Missing argument: {name}"))
        };
        let status = get("status")?;
        Ok(Self {
            id: get("id")?,
            email: get("email")?,
            status: ParticipationStatus::from_str(&status.to_uppercase())
                .map_err(|_| format!("Unknown participation status: {status}"))?,
        })
    }

    pub async fn run(self, session: &mut Session) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "answering invitation...");
        let event = session.find_event(&self.id).await?;
        let updated = session.sync.rsvp(&event, &self.email, self.status).await?;
        if updated == 0 {
            println!(
                "{} {} is not invited to {}",
                "Warning:".yellow(),
                self.email,
                event.title.bold()
            );
        } else {
            println!(
                "{} {} on {updated} occurrence(s) of {}",
                "Answered".green(),
                self.status.as_ref(),
                event.title.bold()
            );
        }
        Ok(())
    }
}
