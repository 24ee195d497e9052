// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Change descriptors of a `sync-collection` REPORT (RFC 6578).

use crate::types::Href;

/// One member of a sync-collection answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncItem {
    /// The member href; `None` when the server left it out.
    pub href: Option<Href>,
    /// HTTP status code of the member, 404 marking a removal.
    pub status: Option<u16>,
}

impl SyncItem {
    /// Returns true if the member was removed from the collection.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.status == Some(404)
    }

    /// Returns true if the member was created or changed.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.status == Some(200)
    }

    /// Returns true if the server reports the sync token as gone.
    #[must_use]
    pub fn is_token_gone(&self) -> bool {
        self.status == Some(410)
    }
}

/// Parsed answer of a sync-collection REPORT.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncCollection {
    /// The new sync token to persist, if any.
    pub sync_token: Option<String>,
    /// Change descriptors; `None` when the body had no `multistatus` container.
    pub items: Option<Vec<SyncItem>>,
}
