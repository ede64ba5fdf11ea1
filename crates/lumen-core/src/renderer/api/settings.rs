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

//! Global settings for the frame pipeline.

use std::time::Duration;

use serde::Deserialize;

use crate::math::Extent2D;

/// Settings read at startup, typically from a RON file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Recording worker threads. `0` picks one per available core minus one.
    pub worker_threads: usize,
    /// Maximum number of recycled command lists kept between frames.
    pub command_list_pool_limit: usize,
    /// Upper bound on waiting for a recording job, in milliseconds. `None` waits forever.
    pub stall_timeout_ms: Option<u64>,
    /// Log every cache object creation and removal.
    pub log_cache_events: bool,
    /// Initial output size.
    pub viewport: Extent2D,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            command_list_pool_limit: 8,
            stall_timeout_ms: None,
            log_cache_events: false,
            viewport: Extent2D::new(1280, 720),
        }
    }
}

impl RenderSettings {
    /// Resolves `worker_threads`, always at least one.
    pub fn worker_count(&self) -> usize {
        if self.worker_threads > 0 {
            return self.worker_threads;
        }
        std::thread::available_parallelism()
            .map(|n| n.get().saturating_sub(1))
            .unwrap_or(1)
            .max(1)
    }

    /// The stall timeout as a duration.
    pub fn stall_timeout(&self) -> Option<Duration> {
        self.stall_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_count_is_never_zero() {
        let settings = RenderSettings::default();
        assert!(settings.worker_count() >= 1);

        let fixed = RenderSettings {
            worker_threads: 3,
            ..Default::default()
        };
        assert_eq!(fixed.worker_count(), 3);
    }

    #[test]
    fn test_stall_timeout_defaults_to_none() {
        assert_eq!(RenderSettings::default().stall_timeout(), None);
        let bounded = RenderSettings {
            stall_timeout_ms: Some(250),
            ..Default::default()
        };
        assert_eq!(bounded.stall_timeout(), Some(Duration::from_millis(250)));
    }
}
