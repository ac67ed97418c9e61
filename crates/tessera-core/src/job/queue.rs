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

use super::{Job, JobId, JobOutcome, JobTicket};
use crate::error::ImportError;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

/// A job waiting in the queue together with its completion channel.
struct QueuedJob<C> {
    id: JobId,
    label: String,
    job: Box<dyn Job<C>>,
    completion: flume::Sender<JobOutcome>,
}

struct QueueInner<C> {
    /// Jobs enqueued since the last drain started.
    pending: Mutex<Vec<QueuedJob<C>>>,
    /// Held for the whole duration of a drain pass.
    drain_lock: Mutex<()>,
}

/// A thread-safe queue of deferred jobs executed on one worker thread.
///
/// Cloning the queue is cheap and every clone refers to the same jobs, so
/// producers on any thread can hold their own handle.
///
/// Draining uses double buffering: the pending list is swapped for an empty
/// one under the lock and the snapshot is then executed without holding it.
/// Producers are therefore never blocked for longer than a `Vec::push`, and
/// jobs enqueued during a pass (including by the jobs themselves) are picked
/// up by the next pass.
pub struct JobQueue<C> {
    inner: Arc<QueueInner<C>>,
}

impl<C> Clone for JobQueue<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C> Default for JobQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> JobQueue<C> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(QueueInner {
                pending: Mutex::new(Vec::new()),
                drain_lock: Mutex::new(()),
            }),
        }
    }

    /// Appends `job` at the tail of the queue and returns its ticket.
    ///
    /// May be called concurrently from any thread, including from inside a
    /// job being drained.
    pub fn enqueue(&self, job: Box<dyn Job<C>>) -> JobTicket {
        let id = JobId::next();
        let label = job.label();
        let (completion, receiver) = flume::bounded(1);

        log::trace!("Enqueuing {id} ({label})");
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(QueuedJob {
                id,
                label: label.clone(),
                job,
                completion,
            });

        JobTicket::new(id, label, receiver)
    }

    /// Returns the number of jobs waiting for the next drain.
    pub fn len(&self) -> usize {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no job is waiting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Executes every job present at the start of the pass, in FIFO order.
    ///
    /// Intended to be called by the worker thread only; concurrent calls are
    /// serialized. A failing or panicking job never stops the pass: its fault
    /// is captured in its [`JobOutcome`] and the remaining jobs still run.
    /// Must not be called from inside a job.
    pub fn drain(&self, ctx: &mut C) -> DrainReport {
        let _pass = self
            .inner
            .drain_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let snapshot = std::mem::take(
            &mut *self
                .inner
                .pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );

        if snapshot.is_empty() {
            return DrainReport::default();
        }

        log::debug!("Draining {} job(s)", snapshot.len());
        let mut outcomes = Vec::with_capacity(snapshot.len());

        for queued in snapshot {
            let QueuedJob {
                id,
                label,
                job,
                completion,
            } = queued;

            let result = match panic::catch_unwind(AssertUnwindSafe(|| job.execute(ctx))) {
                Ok(result) => result,
                Err(payload) => Err(ImportError::JobPanicked {
                    job: label.clone(),
                    message: panic_message(payload.as_ref()),
                }),
            };

            if let Err(e) = &result {
                log::error!("{id} ({label}) failed: {e}");
            }

            let outcome = JobOutcome { id, label, result };
            // The caller may have dropped its ticket; the report still records it.
            let _ = completion.send(outcome.clone());
            outcomes.push(outcome);
        }

        DrainReport { outcomes }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// The outcomes of one drain pass.
#[derive(Debug, Clone, Default)]
pub struct DrainReport {
    outcomes: Vec<JobOutcome>,
}

impl DrainReport {
    /// Returns `true` if the pass found at least one job.
    pub fn found_work(&self) -> bool {
        !self.outcomes.is_empty()
    }

    /// Returns the number of jobs executed by the pass.
    pub fn executed(&self) -> usize {
        self.outcomes.len()
    }

    /// Returns the number of jobs that completed without error.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Iterates over the outcomes of failed jobs.
    pub fn failures(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// Returns every outcome in execution order.
    pub fn outcomes(&self) -> &[JobOutcome] {
        &self.outcomes
    }

    /// Consumes the report, yielding its outcomes.
    pub fn into_outcomes(self) -> Vec<JobOutcome> {
        self.outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImportErrorKind;
    use crate::job::{FnJob, JobResult};

    #[test]
    fn drain_on_empty_queue_finds_nothing() {
        let queue: JobQueue<()> = JobQueue::new();
        let report = queue.drain(&mut ());
        assert!(!report.found_work());
        assert_eq!(report.executed(), 0);
    }

    #[test]
    fn jobs_run_in_fifo_order() {
        let queue: JobQueue<Vec<u32>> = JobQueue::new();
        for n in 0..5 {
            queue.enqueue(FnJob::boxed(format!("push {n}"), move |ctx: &mut Vec<u32>| {
                ctx.push(n);
                Ok(())
            }));
        }

        let mut order = Vec::new();
        let report = queue.drain(&mut order);

        assert_eq!(order, vec![0, 1, 2, 3, 4]);
        assert_eq!(report.succeeded(), 5);
        assert!(queue.is_empty());
    }

    #[test]
    fn panicking_job_does_not_stop_the_pass() {
        let queue: JobQueue<u32> = JobQueue::new();
        queue.enqueue(FnJob::boxed("first", |ctx: &mut u32| {
            *ctx += 1;
            Ok(())
        }));
        let bad = queue.enqueue(FnJob::boxed("boom", |_: &mut u32| -> JobResult {
            panic!("exploded")
        }));
        queue.enqueue(FnJob::boxed("third", |ctx: &mut u32| {
            *ctx += 1;
            Ok(())
        }));

        let mut counter = 0;
        let report = queue.drain(&mut counter);

        assert_eq!(counter, 2);
        assert_eq!(report.executed(), 3);
        let outcome = bad.wait().unwrap();
        let err = outcome.error().unwrap();
        assert_eq!(err.kind(), ImportErrorKind::JobPanicked);
        assert!(err.to_string().contains("exploded"));
    }

    #[test]
    fn job_enqueued_during_drain_runs_next_pass() {
        let queue: JobQueue<Vec<&'static str>> = JobQueue::new();
        let producer = queue.clone();
        queue.enqueue(FnJob::boxed("parent", move |ctx: &mut Vec<&'static str>| {
            ctx.push("parent");
            producer.enqueue(FnJob::boxed("child", |ctx: &mut Vec<&'static str>| {
                ctx.push("child");
                Ok(())
            }));
            Ok(())
        }));

        let mut log = Vec::new();
        assert_eq!(queue.drain(&mut log).executed(), 1);
        assert_eq!(log, vec!["parent"]);
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.drain(&mut log).executed(), 1);
        assert_eq!(log, vec!["parent", "child"]);
        assert!(!queue.drain(&mut log).found_work());
    }

    #[test]
    fn dropped_queue_disconnects_pending_tickets() {
        let queue: JobQueue<()> = JobQueue::new();
        let ticket = queue.enqueue(FnJob::boxed("never", |_: &mut ()| Ok(())));
        drop(queue);
        assert!(ticket.wait().is_none());
    }
}
