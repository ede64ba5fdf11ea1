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

use std::time::Duration;

/// Counters of one rendered frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    /// Frame counter of the scene.
    pub frame_index: u64,
    /// Stages that recorded or enqueued work.
    pub stages_executed: usize,
    /// Stages that had nothing to do.
    pub stages_skipped: usize,
    /// Inline command lists recorded on the control thread.
    pub inline_lists: usize,
    /// Recording jobs run on workers.
    pub jobs: usize,
    /// Command lists handed to the backend.
    pub lists_submitted: usize,
    /// Command lists newly allocated because the free pool was empty.
    pub lists_allocated: usize,
    /// Time the control thread spent waiting for jobs.
    pub wait_time: Duration,
    /// Time from `prepare` to the end of `submit`.
    pub cpu_time: Duration,
}
