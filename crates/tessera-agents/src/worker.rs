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

//! The thread that owns the GPU context and drains the import queue.

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tessera_core::job::{DrainReport, JobOutcome, JobQueue};

/// Settings of an [`ImportWorker`].
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Time between the starts of two drain passes.
    pub tick: Duration,
    /// Number of job outcomes buffered for the report receiver, at least 1.
    /// When the buffer is full, new outcomes are dropped.
    pub report_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(16),
            report_capacity: 1024,
        }
    }
}

/// Runs a [`JobQueue`] on a dedicated thread.
///
/// The execution context is built on that thread by a factory, so it never
/// has to be `Send`. While running, the queue is drained once per tick. On
/// [`shutdown`](Self::shutdown), the queue is drained until empty before the
/// thread exits.
pub struct ImportWorker<G> {
    queue: JobQueue<G>,
    running: Arc<AtomicBool>,
    /// Dropped on shutdown to wake the thread out of its tick wait.
    wake: Option<Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl<G: 'static> ImportWorker<G> {
    /// Spawns the worker thread and waits until its context is built.
    ///
    /// Every [`JobOutcome`] is forwarded to the returned receiver.
    ///
    /// # Errors
    /// Fails if the thread cannot be spawned or if `make_context` fails.
    pub fn spawn<F>(
        queue: JobQueue<G>,
        config: &WorkerConfig,
        make_context: F,
    ) -> Result<(Self, Receiver<JobOutcome>)>
    where
        F: FnOnce() -> Result<G> + Send + 'static,
    {
        if config.report_capacity == 0 {
            log::warn!("Report capacity of 0 would drop every outcome, using 1");
        }
        let (report_tx, report_rx) = crossbeam_channel::bounded(config.report_capacity.max(1));
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<()>>(1);
        let (wake_tx, wake_rx) = crossbeam_channel::bounded::<()>(1);
        let running = Arc::new(AtomicBool::new(true));

        let thread_queue = queue.clone();
        let thread_running = Arc::clone(&running);
        let tick = config.tick;

        let handle = thread::Builder::new()
            .name("tessera-import".to_string())
            .spawn(move || {
                let mut context = match make_context() {
                    Ok(context) => context,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));
                log::info!("Import worker thread started.");

                while thread_running.load(Ordering::Relaxed) {
                    let start_time = Instant::now();

                    let report = thread_queue.drain(&mut context);
                    forward(report, &report_tx);

                    let remaining = tick.saturating_sub(start_time.elapsed());
                    match wake_rx.recv_timeout(remaining) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }

                // Jobs enqueued before shutdown still run.
                loop {
                    let report = thread_queue.drain(&mut context);
                    if !report.found_work() {
                        break;
                    }
                    forward(report, &report_tx);
                }
                log::info!("Import worker thread stopped.");
            })
            .context("Failed to spawn the import worker thread")?;

        let worker = Self {
            queue,
            running,
            wake: Some(wake_tx),
            handle: Some(handle),
        };

        match ready_rx.recv() {
            Ok(Ok(())) => Ok((worker, report_rx)),
            Ok(Err(e)) => Err(e.context("Failed to create the worker's execution context")),
            Err(_) => Err(anyhow!("Import worker thread exited during startup")),
        }
    }
}

impl<G> ImportWorker<G> {
    /// The queue this worker drains.
    pub fn queue(&self) -> &JobQueue<G> {
        &self.queue
    }

    /// Returns `true` until [`shutdown`](Self::shutdown) is called.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stops the loop, runs every job still queued, and joins the thread.
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.wake.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Import worker thread panicked");
            }
        }
    }
}

impl<G> Drop for ImportWorker<G> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn forward(report: DrainReport, reports: &Sender<JobOutcome>) {
    for outcome in report.into_outcomes() {
        match reports.try_send(outcome) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(outcome)) => {
                log::warn!("Report channel full, dropping outcome of {}", outcome.id);
            }
        }
    }
}
