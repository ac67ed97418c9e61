// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Deferred Jobs
//!
//! Expensive, context-bound work is wrapped in a [`Job`] and handed to a
//! [`JobQueue`] from any thread. A single worker thread that owns the
//! execution context `C` (typically the GPU context) periodically calls
//! [`JobQueue::drain`], which runs every job present at the start of the pass
//! exactly once.
//!
//! Each enqueued job gets a [`JobId`] and a [`JobTicket`] through which the
//! caller can wait for its [`JobOutcome`].
//!
//! ```rust
//! use tessera_core::job::{FnJob, JobQueue};
//!
//! let queue: JobQueue<Vec<u32>> = JobQueue::new();
//! let ticket = queue.enqueue(FnJob::boxed("push", |ctx: &mut Vec<u32>| {
//!     ctx.push(7);
//!     Ok(())
//! }));
//!
//! let mut context = Vec::new();
//! let report = queue.drain(&mut context);
//!
//! assert!(report.found_work());
//! assert_eq!(context, vec![7]);
//! assert!(ticket.wait().unwrap().is_success());
//! ```

use crate::error::ImportError;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

mod queue;
mod ticket;

pub use queue::*;
pub use ticket::*;

/// Global counter for generating unique job IDs.
static JOB_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique identifier of an enqueued job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u64);

impl JobId {
    /// Allocates the next identifier.
    pub(crate) fn next() -> Self {
        Self(JOB_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw counter value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// The result of executing one job.
pub type JobResult = Result<(), ImportError>;

/// A unit of deferred, side-effecting work executed on the worker thread.
///
/// `execute` consumes the job, so a job can only ever run once.
pub trait Job<C>: Send {
    /// A short human-readable description used in logs and reports.
    fn label(&self) -> String;

    /// Runs the job against the worker's context.
    fn execute(self: Box<Self>, ctx: &mut C) -> JobResult;
}

/// A [`Job`] backed by a closure.
pub struct FnJob<F> {
    label: String,
    body: F,
}

impl<F> FnJob<F> {
    /// Wraps `body` into a job.
    pub fn new(label: impl Into<String>, body: F) -> Self {
        Self {
            label: label.into(),
            body,
        }
    }

    /// Wraps `body` into a boxed job ready for [`JobQueue::enqueue`].
    pub fn boxed<C>(label: impl Into<String>, body: F) -> Box<dyn Job<C>>
    where
        F: FnOnce(&mut C) -> JobResult + Send + 'static,
        C: 'static,
    {
        Box::new(Self::new(label, body))
    }
}

impl<C, F> Job<C> for FnJob<F>
where
    F: FnOnce(&mut C) -> JobResult + Send,
{
    fn label(&self) -> String {
        self.label.clone()
    }

    fn execute(self: Box<Self>, ctx: &mut C) -> JobResult {
        (self.body)(ctx)
    }
}

/// What happened to one job during a drain pass.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    /// The job's identifier.
    pub id: JobId,
    /// The job's label at enqueue time.
    pub label: String,
    /// Success, or the fault attributed to this job.
    pub result: JobResult,
}

impl JobOutcome {
    /// Returns `true` if the job completed without error.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Returns the job's error, if it failed.
    pub fn error(&self) -> Option<&ImportError> {
        self.result.as_ref().err()
    }
}
