// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Sync-token reconciliation against an in-memory server.

mod merge;
mod reconcile;
mod synchronizer;
