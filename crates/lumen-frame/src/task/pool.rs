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

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, SendError, Sender};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Why a task produced no result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// The task panicked.
    Panicked {
        /// Task label.
        label: &'static str,
        /// Panic message, if it was a string.
        message: String,
    },
    /// The task did not finish within the allowed time.
    Stalled {
        /// Task label.
        label: &'static str,
    },
    /// The worker went away without reporting a result.
    Disconnected {
        /// Task label.
        label: &'static str,
    },
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobError::Panicked { label, message } => {
                write!(f, "Task '{label}' panicked: {message}")
            }
            JobError::Stalled { label } => write!(f, "Task '{label}' stalled"),
            JobError::Disconnected { label } => {
                write!(f, "Task '{label}' lost its worker")
            }
        }
    }
}

impl std::error::Error for JobError {}

/// The pending result of a task spawned on a [`WorkerPool`].
pub struct TaskHandle<R> {
    label: &'static str,
    result: Receiver<Result<R, String>>,
}

impl<R> TaskHandle<R> {
    /// Task label.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Returns `true` once the result is available.
    pub fn is_finished(&self) -> bool {
        !self.result.is_empty()
    }

    /// Blocks until the task finishes.
    pub fn wait(self) -> Result<R, JobError> {
        match self.result.recv() {
            Ok(result) => self.map(result),
            Err(_) => Err(JobError::Disconnected { label: self.label }),
        }
    }

    /// Blocks until the task finishes or `timeout` elapses.
    pub fn wait_timeout(self, timeout: Duration) -> Result<R, JobError> {
        match self.result.recv_timeout(timeout) {
            Ok(result) => self.map(result),
            Err(RecvTimeoutError::Timeout) => Err(JobError::Stalled { label: self.label }),
            Err(RecvTimeoutError::Disconnected) => {
                Err(JobError::Disconnected { label: self.label })
            }
        }
    }

    fn map(&self, result: Result<R, String>) -> Result<R, JobError> {
        result.map_err(|message| JobError::Panicked {
            label: self.label,
            message,
        })
    }
}

impl<R> fmt::Debug for TaskHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("label", &self.label)
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// A fixed set of threads consuming a shared job queue.
///
/// Dropping the pool closes the queue and joins every worker once the
/// queued jobs have run.
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `threads` workers (at least one).
    pub fn new(threads: usize) -> std::io::Result<Self> {
        let threads = threads.max(1);
        let (sender, receiver) = crossbeam_channel::unbounded::<Job>();

        let mut workers = Vec::with_capacity(threads);
        for index in 0..threads {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("lumen-worker-{index}"))
                .spawn(move || {
                    while let Ok(job) = receiver.recv() {
                        job();
                    }
                })?;
            workers.push(handle);
        }

        log::info!("Worker pool started with {threads} thread(s)");
        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    /// Number of worker threads.
    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }

    /// Runs `task` on a worker. A panic inside `task` is reported through the handle.
    pub fn spawn<R, F>(&self, label: &'static str, task: F) -> TaskHandle<R>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let job: Job = Box::new(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(task)).map_err(|payload| {
                payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_owned())
            });
            if let Err(ref message) = result {
                log::error!("Task '{label}' panicked: {message}");
            }
            // The handle may have been dropped after a stall.
            let _ = tx.send(result);
        });

        match &self.sender {
            Some(sender) => {
                if let Err(SendError(job)) = sender.send(job) {
                    log::warn!("Worker queue closed, running task '{label}' inline");
                    job();
                }
            }
            None => job(),
        }

        TaskHandle { label, result: rx }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        drop(self.sender.take());
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::error!("A worker thread terminated abnormally");
            }
        }
        log::debug!("Worker pool stopped");
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.workers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_spawn_returns_result() {
        let pool = WorkerPool::new(2).unwrap();
        let handle = pool.spawn("answer", || 6 * 7);
        assert_eq!(handle.wait(), Ok(42));
    }

    #[test]
    fn test_all_tasks_run() {
        let pool = WorkerPool::new(3).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..32)
            .map(|_| {
                let counter = Arc::clone(&counter);
                pool.spawn("count", move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();
        for handle in handles {
            handle.wait().unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 32);
    }

    #[test]
    fn test_panic_is_reported_and_worker_survives() {
        let pool = WorkerPool::new(1).unwrap();
        let failed = pool.spawn("boom", || -> u32 { panic!("exploded") });
        assert!(matches!(
            failed.wait(),
            Err(JobError::Panicked { label: "boom", ref message }) if message == "exploded"
        ));

        let next = pool.spawn("after", || 1u32);
        assert_eq!(next.wait(), Ok(1));
    }

    #[test]
    fn test_wait_timeout_reports_stall() {
        let pool = WorkerPool::new(1).unwrap();
        let slow = pool.spawn("slow", || thread::sleep(Duration::from_millis(300)));
        assert_eq!(
            slow.wait_timeout(Duration::from_millis(10)),
            Err(JobError::Stalled { label: "slow" })
        );
    }

    #[test]
    fn test_zero_threads_means_one() {
        let pool = WorkerPool::new(0).unwrap();
        assert_eq!(pool.thread_count(), 1);
    }
}
