// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::future::Future;

use futures::{StreamExt, stream};

/// Runs futures with a bound on how many are in flight at once.
#[derive(Debug, Clone, Copy)]
pub struct ConcurrencyLimiter {
    limit: usize,
}

impl ConcurrencyLimiter {
    /// Creates a limiter; a limit of zero is treated as one.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    /// The effective limit.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Drives every task to completion, at most `limit` at a time.
    ///
    /// Tasks are not started until a slot is free. Results come back in
    /// completion order.
    pub async fn run<I, F, T>(&self, tasks: I) -> Vec<T>
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = T>,
    {
        stream::iter(tasks)
            .buffer_unordered(self.limit)
            .collect()
            .await
    }
}
