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

use crate::cache::{CacheStatsSnapshot, ContentAddressedCache, LogObserver};
use crate::renderer::api::{
    FramebufferDescription, PipelineDescription, RenderPassDescription, RenderSettings,
    SamplerDescription,
};
use crate::renderer::traits::GpuBackend;

/// Per-cache counters of a [`GpuContext`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheReport {
    /// Pipeline cache.
    pub pipelines: CacheStatsSnapshot,
    /// Render pass cache.
    pub render_passes: CacheStatsSnapshot,
    /// Framebuffer cache.
    pub framebuffers: CacheStatsSnapshot,
    /// Sampler cache.
    pub samplers: CacheStatsSnapshot,
}

/// The backend and the four object caches, passed explicitly to every owner.
///
/// The context must outlive every owner that acquired objects from it.
#[derive(Debug)]
pub struct GpuContext {
    backend: Arc<dyn GpuBackend>,
    // Field order is teardown order: framebuffers reference render passes.
    pipelines: ContentAddressedCache<PipelineDescription>,
    framebuffers: ContentAddressedCache<FramebufferDescription>,
    render_passes: ContentAddressedCache<RenderPassDescription>,
    samplers: ContentAddressedCache<SamplerDescription>,
}

impl GpuContext {
    /// Creates a context with empty caches.
    pub fn new(backend: Arc<dyn GpuBackend>, settings: &RenderSettings) -> Arc<Self> {
        let context = Self {
            pipelines: ContentAddressedCache::new(Arc::clone(&backend)),
            framebuffers: ContentAddressedCache::new(Arc::clone(&backend)),
            render_passes: ContentAddressedCache::new(Arc::clone(&backend)),
            samplers: ContentAddressedCache::new(Arc::clone(&backend)),
            backend,
        };

        if settings.log_cache_events {
            let observer = Arc::new(LogObserver);
            context.pipelines.add_observer(observer.clone());
            context.framebuffers.add_observer(observer.clone());
            context.render_passes.add_observer(observer.clone());
            context.samplers.add_observer(observer);
        }

        log::info!("GPU context created");
        Arc::new(context)
    }

    /// The backend all caches allocate through.
    pub fn backend(&self) -> &Arc<dyn GpuBackend> {
        &self.backend
    }

    /// Graphics pipeline cache.
    pub fn pipelines(&self) -> &ContentAddressedCache<PipelineDescription> {
        &self.pipelines
    }

    /// Render pass cache.
    pub fn render_passes(&self) -> &ContentAddressedCache<RenderPassDescription> {
        &self.render_passes
    }

    /// Framebuffer cache.
    pub fn framebuffers(&self) -> &ContentAddressedCache<FramebufferDescription> {
        &self.framebuffers
    }

    /// Sampler cache.
    pub fn samplers(&self) -> &ContentAddressedCache<SamplerDescription> {
        &self.samplers
    }

    /// Counters of all four caches.
    pub fn report(&self) -> CacheReport {
        CacheReport {
            pipelines: self.pipelines.stats(),
            render_passes: self.render_passes.stats(),
            framebuffers: self.framebuffers.stats(),
            samplers: self.samplers.stats(),
        }
    }

    /// Destroys everything still cached. Call once every owner is gone.
    pub fn shutdown(&self) {
        let destroyed = self.pipelines.clear()
            + self.framebuffers.clear()
            + self.render_passes.clear()
            + self.samplers.clear();
        log::info!("GPU context shut down, {destroyed} cached object(s) destroyed");
    }
}
