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

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Barrier;
use std::thread;
use tessera_core::error::{ImportError, ImportErrorKind};
use tessera_core::job::{FnJob, JobQueue};

const PRODUCERS: usize = 8;
const JOBS_PER_PRODUCER: usize = 125;

#[test]
fn concurrent_producers_every_job_runs_exactly_once() {
    let queue: JobQueue<Vec<(usize, usize)>> = JobQueue::new();
    let barrier = Arc::new(Barrier::new(PRODUCERS + 1));

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let queue = queue.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for n in 0..JOBS_PER_PRODUCER {
                    queue.enqueue(FnJob::boxed(
                        format!("p{p}-{n}"),
                        move |ctx: &mut Vec<(usize, usize)>| {
                            ctx.push((p, n));
                            Ok(())
                        },
                    ));
                }
            })
        })
        .collect();

    // Drain while producers are still running.
    let mut executed = Vec::new();
    barrier.wait();
    while producers.iter().any(|h| !h.is_finished()) {
        queue.drain(&mut executed);
    }
    for handle in producers {
        handle.join().expect("producer thread panicked");
    }

    // Once producers are done, drain until two consecutive passes find nothing.
    let mut idle_passes = 0;
    while idle_passes < 2 {
        if queue.drain(&mut executed).found_work() {
            idle_passes = 0;
        } else {
            idle_passes += 1;
        }
    }

    assert_eq!(executed.len(), PRODUCERS * JOBS_PER_PRODUCER);
    let unique: HashSet<_> = executed.iter().copied().collect();
    assert_eq!(unique.len(), executed.len(), "a job ran more than once");

    // Per-producer submission order is preserved.
    for p in 0..PRODUCERS {
        let order: Vec<usize> = executed
            .iter()
            .filter(|(producer, _)| *producer == p)
            .map(|(_, n)| *n)
            .collect();
        assert_eq!(order, (0..JOBS_PER_PRODUCER).collect::<Vec<_>>());
    }
}

#[test]
fn failing_job_is_isolated_from_its_neighbours() {
    let queue: JobQueue<u32> = JobQueue::new();
    let before = queue.enqueue(FnJob::boxed("before", |ctx: &mut u32| {
        *ctx += 1;
        Ok(())
    }));
    let failing = queue.enqueue(FnJob::boxed("decode", |_: &mut u32| {
        Err(ImportError::decode("broken.jpg", "unexpected end of file"))
    }));
    let after = queue.enqueue(FnJob::boxed("after", |ctx: &mut u32| {
        *ctx += 1;
        Ok(())
    }));

    let mut counter = 0;
    let report = queue.drain(&mut counter);

    assert_eq!(counter, 2);
    assert_eq!(report.executed(), 3);
    assert_eq!(report.succeeded(), 2);
    assert!(before.wait().unwrap().is_success());
    assert!(after.wait().unwrap().is_success());

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].id, failing.id());
    assert_eq!(
        failing.wait().unwrap().error().map(ImportError::kind),
        Some(ImportErrorKind::DecodeFailure)
    );
}
