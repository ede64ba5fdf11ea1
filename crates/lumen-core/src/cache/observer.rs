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

use std::sync::atomic::{AtomicU64, Ordering};

use crate::cache::ObjectKind;

/// Receives cache lifecycle events.
///
/// Callbacks run on the control thread while the cache is not locked.
pub trait CacheObserver: Send + Sync {
    /// A new object was allocated and inserted.
    fn on_object_created(&self, _kind: ObjectKind, _hash: u64, _label: &str) {}

    /// An object was removed and is about to be destroyed.
    fn on_object_removed(&self, kind: ObjectKind, hash: u64, label: &str);
}

/// Forwards cache events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl CacheObserver for LogObserver {
    fn on_object_created(&self, kind: ObjectKind, hash: u64, label: &str) {
        log::debug!("Cached {kind} '{label}' ({hash:#018x})");
    }

    fn on_object_removed(&self, kind: ObjectKind, hash: u64, label: &str) {
        log::debug!("Evicted {kind} '{label}' ({hash:#018x})");
    }
}

/// Live counters of one cache.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    collisions: AtomicU64,
    allocation_failures: AtomicU64,
    destroyed: AtomicU64,
}

/// A point-in-time copy of [`CacheStats`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    /// Acquisitions served by an existing object.
    pub hits: u64,
    /// Acquisitions that allocated a new object.
    pub misses: u64,
    /// Misses whose hash bucket already held a different description.
    pub collisions: u64,
    /// Allocations rejected by the backend.
    pub allocation_failures: u64,
    /// Objects destroyed by release or clear.
    pub destroyed: u64,
    /// Objects currently cached.
    pub live: u64,
}

impl CacheStats {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_collision(&self) {
        self.collisions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_allocation_failure(&self) {
        self.allocation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_destroyed(&self, count: u64) {
        self.destroyed.fetch_add(count, Ordering::Relaxed);
    }

    /// Copies the counters. `live` is supplied by the cache.
    pub fn snapshot(&self, live: u64) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            collisions: self.collisions.load(Ordering::Relaxed),
            allocation_failures: self.allocation_failures.load(Ordering::Relaxed),
            destroyed: self.destroyed.load(Ordering::Relaxed),
            live,
        }
    }
}
