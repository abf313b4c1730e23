// Copyright 2024 Vincent Chan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//	http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::future::Future;
use std::time::Duration;
use futures::{Stream, TryStreamExt};
use tokio::time::Instant;
use crate::errors::{Error, Result};

/// Carries the one deadline every store call of a run has to meet.
///
/// The deadline is fixed when the context is created, so the budget is
/// shared: time spent connecting is no longer available to later steps.
#[derive(Debug, Clone)]
pub struct OpContext {
    deadline: Instant,
    timeout: Duration,
}

impl OpContext {

    pub fn with_timeout(timeout: Duration) -> OpContext {
        OpContext {
            deadline: Instant::now() + timeout,
            timeout,
        }
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Drive `fut` to completion unless the deadline passes first.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_expired() {
            return Err(Error::DeadlineExceeded(self.timeout));
        }
        match tokio::time::timeout_at(self.deadline, fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::DeadlineExceeded(self.timeout)),
        }
    }

    /// Pull the next item of a cursor under the deadline.
    pub async fn next<S, T>(&self, cursor: &mut S) -> Result<Option<T>>
    where
        S: Stream<Item = Result<T>> + Unpin,
    {
        self.run(cursor.try_next()).await
    }

    /// Drain a cursor into memory under the deadline.
    pub async fn collect<S, T>(&self, cursor: S) -> Result<Vec<T>>
    where
        S: Stream<Item = Result<T>>,
    {
        self.run(cursor.try_collect::<Vec<T>>()).await
    }

}
