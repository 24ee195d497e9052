// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use calsync_caldav::{CalDavError, Href};

/// Failure classes shared by sync passes and mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// The stored sync token was rejected; a full refresh is required.
    SyncTokenInvalid,
    /// The diff request itself failed.
    NetworkError,
    /// Some per-item fetches failed; recorded on the diff result, never raised.
    PartialFetchFailure,
    /// The diff answer lacked its container; recorded on the diff result, never raised.
    MalformedResponse,
    /// A mutation could not read the resource it modifies.
    ResourceReadFailure,
    /// A mutation's write failed or the resource could not be modified.
    ResourceWriteFailure,
    /// The calendar is not in the local cache.
    UnknownCalendar,
}

/// Errors that abort a whole sync pass.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The server no longer knows the stored token.
    #[error("SYNC_TOKEN_INVALID: sync token of calendar '{cal_id}' is no longer valid")]
    SyncTokenInvalid {
        /// Calendar whose token was rejected.
        cal_id: String,
    },

    /// The diff request failed.
    #[error("NETWORK_ERROR: sync request for calendar '{cal_id}' failed: {source}")]
    Network {
        /// Calendar being synchronized.
        cal_id: String,
        /// Transport error.
        #[source]
        source: CalDavError,
    },

    /// Listing the calendar home failed.
    #[error("NETWORK_ERROR: failed to list calendars: {0}")]
    Listing(#[source] CalDavError),

    /// The calendar is not in the local cache.
    #[error("UNKNOWN_CALENDAR: unknown calendar '{0}'")]
    UnknownCalendar(String),
}

impl SyncError {
    /// Returns the failure class.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::SyncTokenInvalid { .. } => ErrorKind::SyncTokenInvalid,
            Self::Network { .. } | Self::Listing(_) => ErrorKind::NetworkError,
            Self::UnknownCalendar(_) => ErrorKind::UnknownCalendar,
        }
    }
}

/// Errors raised by recurring-event mutations.
#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    /// The resource could not be read before modification.
    #[error("RESOURCE_READ_FAILURE: failed to read {href}: {source}")]
    ResourceRead {
        /// Resource being modified.
        href: Href,
        /// Transport error.
        #[source]
        source: CalDavError,
    },

    /// Writing the modified resource failed.
    #[error("RESOURCE_WRITE_FAILURE: failed to write {href}: {source}")]
    ResourceWrite {
        /// Resource being written.
        href: Href,
        /// Transport error.
        #[source]
        source: CalDavError,
    },

    /// The resource holds no master occurrence.
    #[error("resource {0} has no master event")]
    MissingMaster(Href),

    /// An instance operation was given a plain event.
    #[error("event '{0}' is not an instance of a recurring series")]
    NotAnInstance(String),

    /// The event has neither a recurrence id nor a start.
    #[error("event '{0}' has no start")]
    MissingStart(String),
}

impl MutationError {
    /// Returns the failure class.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ResourceRead { .. } => ErrorKind::ResourceReadFailure,
            _ => ErrorKind::ResourceWriteFailure,
        }
    }
}

/// Errors raised while locating or reading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        /// Path of the file.
        path: PathBuf,
        /// I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or misses required keys.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A path could not be expanded.
    #[error("{0}")]
    Path(String),
}
