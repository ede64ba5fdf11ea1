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

//! Ordered collection and submission of command lists.

use std::sync::Arc;
use std::time::{Duration, Instant};

use lumen_core::renderer::{CommandList, GpuBackend, RenderError, RenderSettings};
use lumen_core::stage::{FrameRecorder, RecordingWork};

use crate::task::{JobError, TaskHandle, WorkerPool};

const PRIMARY_LABEL: &str = "primary";

/// Tuning of a [`JobDispatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Maximum number of reset command lists kept for reuse.
    pub pool_limit: usize,
    /// Longest wait for a single job before the frame fails. `None` waits forever.
    pub stall_timeout: Option<Duration>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            pool_limit: 8,
            stall_timeout: None,
        }
    }
}

impl From<&RenderSettings> for DispatcherConfig {
    fn from(settings: &RenderSettings) -> Self {
        Self {
            pool_limit: settings.command_list_pool_limit,
            stall_timeout: settings.stall_timeout(),
        }
    }
}

/// What [`JobDispatcher::submit`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitSummary {
    /// Inline lists collected.
    pub inline_lists: usize,
    /// Jobs waited for.
    pub jobs: usize,
    /// Lists handed to the backend. Empty lists are skipped.
    pub submitted: usize,
    /// Lists allocated since the previous submit.
    pub lists_allocated: usize,
    /// Time spent waiting for jobs.
    pub wait_time: Duration,
}

enum PendingWork {
    Inline(Box<dyn CommandList>),
    Job(TaskHandle<Box<dyn CommandList>>),
}

struct PendingList {
    label: &'static str,
    work: PendingWork,
}

/// Collects inline recording and worker jobs of one frame in issue order.
///
/// The primary list stays open until a job is enqueued, at which point it is
/// sealed so that work recorded afterwards lands in a new list behind the job.
pub struct JobDispatcher {
    backend: Arc<dyn GpuBackend>,
    pool: Arc<WorkerPool>,
    config: DispatcherConfig,
    primary: Option<Box<dyn CommandList>>,
    pending: Vec<PendingList>,
    free: Vec<Box<dyn CommandList>>,
    allocated: usize,
}

impl JobDispatcher {
    /// Creates a dispatcher recording through `backend` and running jobs on `pool`.
    pub fn new(backend: Arc<dyn GpuBackend>, pool: Arc<WorkerPool>, config: DispatcherConfig) -> Self {
        Self {
            backend,
            pool,
            config,
            primary: None,
            pending: Vec::new(),
            free: Vec::new(),
            allocated: 0,
        }
    }

    fn acquire_list(&mut self, label: &str) -> Box<dyn CommandList> {
        match self.free.pop() {
            Some(mut list) => {
                list.set_label(label);
                list
            }
            None => {
                self.allocated += 1;
                self.backend.create_command_list(label)
            }
        }
    }

    fn recycle(&mut self, mut list: Box<dyn CommandList>) {
        list.reset();
        if self.free.len() < self.config.pool_limit {
            self.free.push(list);
        } else {
            log::trace!("Command list pool full, dropping '{}'", list.label());
        }
    }

    fn seal_primary(&mut self) {
        if let Some(list) = self.primary.take() {
            self.pending.push(PendingList {
                label: PRIMARY_LABEL,
                work: PendingWork::Inline(list),
            });
        }
    }

    fn wait(&self, handle: TaskHandle<Box<dyn CommandList>>) -> Result<Box<dyn CommandList>, JobError> {
        match self.config.stall_timeout {
            Some(timeout) => handle.wait_timeout(timeout),
            None => handle.wait(),
        }
    }

    /// Waits for every job and submits all lists in issue order, then
    /// recycles them.
    ///
    /// After the first failure the remaining lists are still waited for and
    /// recycled, but not submitted.
    pub fn submit(&mut self) -> Result<SubmitSummary, RenderError> {
        self.seal_primary();
        let pending = std::mem::take(&mut self.pending);
        let mut summary = SubmitSummary {
            lists_allocated: std::mem::take(&mut self.allocated),
            ..Default::default()
        };
        let mut failure: Option<RenderError> = None;

        for entry in pending {
            let list = match entry.work {
                PendingWork::Inline(list) => {
                    summary.inline_lists += 1;
                    list
                }
                PendingWork::Job(handle) => {
                    summary.jobs += 1;
                    let started = Instant::now();
                    let result = self.wait(handle);
                    summary.wait_time += started.elapsed();
                    match result {
                        Ok(list) => list,
                        Err(err) => {
                            log::error!("Recording job '{}' failed: {err}", entry.label);
                            failure.get_or_insert(job_failure(err));
                            continue;
                        }
                    }
                }
            };

            let mut list = list;
            if failure.is_none() && list.command_count() > 0 {
                match self.backend.submit(list.as_mut()) {
                    Ok(()) => summary.submitted += 1,
                    Err(err) => {
                        log::error!("Submission of '{}' failed: {err}", list.label());
                        failure = Some(err);
                    }
                }
            }
            self.recycle(list);
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(summary),
        }
    }

    /// Waits for outstanding jobs and drops their work without submitting it.
    pub fn discard(&mut self) {
        self.seal_primary();
        for entry in std::mem::take(&mut self.pending) {
            let list = match entry.work {
                PendingWork::Inline(list) => Some(list),
                PendingWork::Job(handle) => self.wait(handle).ok(),
            };
            if let Some(list) = list {
                self.recycle(list);
            }
        }
        self.allocated = 0;
    }

    /// Lists and jobs issued since the last submit.
    pub fn pending_len(&self) -> usize {
        self.pending.len() + usize::from(self.primary.is_some())
    }

    /// Reset lists ready for reuse.
    pub fn free_len(&self) -> usize {
        self.free.len()
    }
}

fn job_failure(err: JobError) -> RenderError {
    match err {
        JobError::Stalled { label } => RenderError::JobStalled { label },
        JobError::Panicked { label, message } => RenderError::JobFailed {
            label,
            reason: message,
        },
        JobError::Disconnected { label } => RenderError::JobFailed {
            label,
            reason: "worker disconnected".to_owned(),
        },
    }
}

impl FrameRecorder for JobDispatcher {
    fn primary(&mut self) -> &mut dyn CommandList {
        let list = match self.primary.take() {
            Some(list) => list,
            None => self.acquire_list(PRIMARY_LABEL),
        };
        self.primary.insert(list).as_mut()
    }

    fn enqueue(&mut self, label: &'static str, work: RecordingWork) {
        self.seal_primary();
        let mut list = self.acquire_list(label);
        let handle = self.pool.spawn(label, move || {
            work(list.as_mut());
            list
        });
        self.pending.push(PendingList {
            label,
            work: PendingWork::Job(handle),
        });
    }
}

impl Drop for JobDispatcher {
    fn drop(&mut self) {
        if self.pending_len() > 0 {
            log::warn!("Dispatcher dropped with {} unsubmitted list(s)", self.pending_len());
            self.discard();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_infra::HeadlessBackend;

    fn dispatcher(pool_limit: usize) -> (Arc<HeadlessBackend>, JobDispatcher) {
        let backend = Arc::new(HeadlessBackend::new());
        let pool = Arc::new(WorkerPool::new(2).unwrap());
        let config = DispatcherConfig {
            pool_limit,
            ..Default::default()
        };
        (backend.clone(), JobDispatcher::new(backend, pool, config))
    }

    fn mark(list: &mut dyn CommandList, name: &str) {
        list.push_debug_group(name);
        list.pop_debug_group();
    }

    #[test]
    fn test_enqueue_seals_primary() {
        let (backend, mut dispatcher) = dispatcher(8);
        mark(dispatcher.primary(), "before");
        dispatcher.enqueue("job", Box::new(|list| mark(list, "job")));
        mark(dispatcher.primary(), "after");
        assert_eq!(dispatcher.pending_len(), 3);

        let summary = dispatcher.submit().unwrap();
        assert_eq!((summary.inline_lists, summary.jobs, summary.submitted), (2, 1, 3));
        assert_eq!(backend.submitted_labels(), ["primary", "job", "primary"]);
    }

    #[test]
    fn test_empty_lists_are_recycled_without_submission() {
        let (backend, mut dispatcher) = dispatcher(8);
        dispatcher.primary();
        dispatcher.enqueue("noop", Box::new(|_| {}));

        let summary = dispatcher.submit().unwrap();
        assert_eq!(summary.submitted, 0);
        assert!(backend.submissions().is_empty());
        assert_eq!(dispatcher.free_len(), 2);
    }

    #[test]
    fn test_discard_drops_pending_work() {
        let (backend, mut dispatcher) = dispatcher(1);
        dispatcher.enqueue("a", Box::new(|list| mark(list, "a")));
        dispatcher.enqueue("b", Box::new(|list| mark(list, "b")));
        dispatcher.discard();

        assert_eq!(dispatcher.pending_len(), 0);
        assert_eq!(dispatcher.free_len(), 1);
        assert!(backend.submissions().is_empty());
        assert_eq!(dispatcher.submit().unwrap(), SubmitSummary::default());
    }
}
