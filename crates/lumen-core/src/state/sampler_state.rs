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

use std::sync::Arc;

use crate::cache::{CacheError, CacheTracker, CachedObject, GpuContext};
use crate::renderer::api::{SamplerDescription, SamplerId};

/// An owner of one cached sampler.
pub struct SamplerState {
    context: Arc<GpuContext>,
    label: String,
    description: SamplerDescription,
    current: Option<Arc<CachedObject<SamplerDescription>>>,
    tracker: CacheTracker<SamplerDescription>,
}

impl SamplerState {
    /// Creates a sampler owner. Nothing is allocated until [`sampler`](Self::sampler).
    pub fn new(context: &Arc<GpuContext>, label: impl Into<String>, description: SamplerDescription) -> Self {
        Self {
            context: Arc::clone(context),
            label: label.into(),
            description,
            current: None,
            tracker: super::releasing_tracker(context, GpuContext::samplers),
        }
    }

    /// Changes the sampling state.
    pub fn set_description(&mut self, description: SamplerDescription) {
        if description != self.description {
            self.description = description;
            self.current = None;
        }
    }

    /// The current description.
    pub fn description(&self) -> &SamplerDescription {
        &self.description
    }

    /// Returns the sampler matching the current description.
    pub fn sampler(&mut self) -> Result<SamplerId, CacheError> {
        if let Some(current) = &self.current {
            return Ok(current.object());
        }
        let (object, _) = self
            .context
            .samplers()
            .acquire(&self.description, &self.label, &self.tracker)?;
        let id = object.object();
        self.current = Some(object);
        Ok(id)
    }
}

impl Drop for SamplerState {
    fn drop(&mut self) {
        self.current = None;
        self.tracker.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::{RenderSettings, SamplerWrap};
    use crate::testing::TestBackend;

    #[test]
    fn test_samplers_are_shared_and_released() {
        let backend = Arc::new(TestBackend::default());
        let context = GpuContext::new(backend.clone(), &RenderSettings::default());
        let clamp = SamplerDescription::default().with_wrap(SamplerWrap::ClampToEdge);

        let mut a = SamplerState::new(&context, "a", clamp);
        let mut b = SamplerState::new(&context, "b", clamp);
        assert_eq!(a.sampler().unwrap(), b.sampler().unwrap());
        assert_eq!(backend.created("sampler"), 1);

        b.set_description(SamplerDescription::default());
        assert_ne!(a.sampler().unwrap(), b.sampler().unwrap());

        drop(a);
        drop(b);
        assert_eq!(backend.live("sampler"), 0);
    }
}
