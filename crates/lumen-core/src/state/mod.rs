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

//! Owners of cached GPU objects.
//!
//! Each owner keeps its own tracker and releases everything it linked when
//! it is dropped.

mod pipeline_state;
mod render_target;
mod sampler_state;

pub use self::pipeline_state::*;
pub use self::render_target::*;
pub use self::sampler_state::*;

use std::sync::Arc;

use crate::cache::{CacheTracker, CachedObject, ContentAddressedCache, Description, GpuContext};

/// A tracker that hands orphaned objects back to the cache chosen by `cache`.
pub(crate) fn releasing_tracker<D, F>(context: &Arc<GpuContext>, cache: F) -> CacheTracker<D>
where
    D: Description,
    F: Fn(&GpuContext) -> &ContentAddressedCache<D> + Send + Sync + 'static,
{
    let context = Arc::clone(context);
    CacheTracker::new(move |objects: &[Arc<CachedObject<D>>]| {
        let cache = cache(&context);
        for object in objects {
            if let Err(e) = cache.release(object) {
                log::error!("Failed to release {} '{}': {e}", D::KIND, object.label());
            }
        }
    })
}
