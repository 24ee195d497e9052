// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;
use std::sync::Arc;

use calsync_caldav::CalDavClient;
use calsync_core::{
    CalendarEvent, Config, DateRange, LocalCacheStore, SyncError, SyncReport, Synchronizer,
};
use jiff::Timestamp;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// One run of the CLI: a server connection, a fresh cache and the sync window.
#[derive(Debug)]
pub struct Session {
    /// The synchronizer owning the cache.
    pub sync: Synchronizer<CalDavClient>,
    /// The window every pass is restricted to.
    pub range: DateRange,
    watcher: JoinHandle<()>,
}

impl Session {
    /// Connects to the configured server. Ctrl-C cancels running passes.
    pub async fn open(config: Config) -> Result<Self, Box<dyn Error>> {
        let client = CalDavClient::new(config.server)?;
        let range = DateRange::around(
            Timestamp::now(),
            config.sync.past_days,
            config.sync.future_days,
        );

        let cancel = CancellationToken::new();
        let watcher = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupted, cancelling sync");
                    cancel.cancel();
                }
            }
        });

        let sync = Synchronizer::new(Arc::new(client), &config.sync).with_cancel(cancel);
        Ok(Self {
            sync,
            range,
            watcher,
        })
    }

    /// Lists calendars, then syncs either `calendar` or all of them.
    pub async fn sync(
        &mut self,
        calendar: Option<&str>,
    ) -> Result<Vec<(String, Result<SyncReport, SyncError>)>, Box<dyn Error>> {
        let listed = self.sync.refresh_calendars().await?;
        match calendar {
            Some(id) => {
                if !listed.iter().any(|a| a == id) {
                    return Err(SyncError::UnknownCalendar(id.to_string()).into());
                }
                let report = self.sync.sync_calendar(id, &self.range).await;
                Ok(vec![(id.to_string(), report)])
            }
            None => Ok(self.sync.sync_all(&self.range).await),
        }
    }

    /// Syncs every calendar and looks up one occurrence by id. Occurrences
    /// without an override are generated from their series master.
    pub async fn find_event(&mut self, id: &str) -> Result<CalendarEvent, Box<dyn Error>> {
        for (cal_id, report) in self.sync(None).await? {
            if let Err(e) = report {
                tracing::warn!(cal_id = %cal_id, err = %e, "calendar skipped while searching");
            }
        }
        lookup(self.sync.store(), id)
    }

    /// Stops watching for Ctrl-C.
    pub fn close(self) {
        self.watcher.abort();
    }
}

fn lookup(store: &LocalCacheStore, id: &str) -> Result<CalendarEvent, Box<dyn Error>> {
    store
        .resolve_occurrence(id)
        .ok_or_else(|| format!("No event found with id: {id}").into())
}
