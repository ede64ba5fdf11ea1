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

use std::sync::atomic::{AtomicI32, Ordering};

/// Number of owners currently linked to a shared object.
///
/// Only an [`ObjectTracker`](crate::cache::ObjectTracker) links and unlinks,
/// so a count can never be changed without a matching tracker entry.
#[derive(Debug, Default)]
pub struct RefCount {
    links: AtomicI32,
}

impl RefCount {
    /// A count with no owners.
    pub const fn new() -> Self {
        Self {
            links: AtomicI32::new(0),
        }
    }

    /// Adds one owner and returns the new count.
    pub(crate) fn link(&self) -> i32 {
        self.links.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Removes one owner and returns the new count.
    pub(crate) fn unlink(&self) -> i32 {
        let count = self.links.fetch_sub(1, Ordering::AcqRel) - 1;
        if count < 0 {
            log::error!("Reference count dropped below zero ({count})");
            debug_assert!(count >= 0, "reference count dropped below zero");
            self.links.store(0, Ordering::Release);
            return 0;
        }
        count
    }

    /// Current number of owners.
    pub fn count(&self) -> i32 {
        self.links.load(Ordering::Acquire)
    }

    /// Returns `true` while at least one owner is linked.
    pub fn is_linked(&self) -> bool {
        self.count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_unlink_balance() {
        let refs = RefCount::new();
        assert_eq!(refs.link(), 1);
        assert_eq!(refs.link(), 2);
        assert!(refs.is_linked());
        assert_eq!(refs.unlink(), 1);
        assert_eq!(refs.unlink(), 0);
        assert!(!refs.is_linked());
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "below zero"))]
    fn test_unlink_below_zero() {
        let refs = RefCount::new();
        assert_eq!(refs.unlink(), 0);
        assert_eq!(refs.count(), 0);
    }
}
