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

use super::{JobId, JobOutcome};
use std::time::Duration;

/// A handle to the eventual outcome of an enqueued job.
///
/// The outcome is delivered once, when the worker thread has executed the
/// job. Dropping the ticket does not cancel the job.
#[derive(Debug)]
pub struct JobTicket {
    id: JobId,
    label: String,
    receiver: flume::Receiver<JobOutcome>,
}

impl JobTicket {
    pub(crate) fn new(id: JobId, label: String, receiver: flume::Receiver<JobOutcome>) -> Self {
        Self { id, label, receiver }
    }

    /// The identifier assigned at enqueue time.
    pub fn id(&self) -> JobId {
        self.id
    }

    /// The job's label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Blocks until the job has run.
    ///
    /// Returns `None` if the queue was dropped before the job was executed.
    pub fn wait(&self) -> Option<JobOutcome> {
        self.receiver.recv().ok()
    }

    /// Blocks for at most `timeout` waiting for the job to run.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<JobOutcome> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Returns the outcome if the job has already run.
    pub fn try_outcome(&self) -> Option<JobOutcome> {
        self.receiver.try_recv().ok()
    }
}
