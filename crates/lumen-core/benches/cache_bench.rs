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

use std::any::Any;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lumen_core::cache::{CacheTracker, ContentAddressedCache};
use lumen_core::math::Viewport;
use lumen_core::renderer::*;

#[derive(Debug, Default)]
struct NullBackend {
    next: AtomicU64,
}

impl NullBackend {
    fn id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl GpuBackend for NullBackend {
    fn create_pipeline(&self, _: &PipelineDescription, _: &str) -> Result<PipelineId, ResourceError> {
        Ok(PipelineId(self.id()))
    }
    fn destroy_pipeline(&self, _: PipelineId) -> Result<(), ResourceError> {
        Ok(())
    }
    fn create_render_pass(&self, _: &RenderPassDescription, _: &str) -> Result<RenderPassId, ResourceError> {
        Ok(RenderPassId(self.id()))
    }
    fn destroy_render_pass(&self, _: RenderPassId) -> Result<(), ResourceError> {
        Ok(())
    }
    fn create_framebuffer(&self, _: &FramebufferDescription, _: &str) -> Result<FramebufferId, ResourceError> {
        Ok(FramebufferId(self.id()))
    }
    fn destroy_framebuffer(&self, _: FramebufferId) -> Result<(), ResourceError> {
        Ok(())
    }
    fn create_sampler(&self, _: &SamplerDescription, _: &str) -> Result<SamplerId, ResourceError> {
        Ok(SamplerId(self.id()))
    }
    fn destroy_sampler(&self, _: SamplerId) -> Result<(), ResourceError> {
        Ok(())
    }
    fn create_texture(&self, _: &TextureDescription) -> Result<TextureId, ResourceError> {
        Ok(TextureId(self.id()))
    }
    fn destroy_texture(&self, _: TextureId) -> Result<(), ResourceError> {
        Ok(())
    }
    fn create_command_list(&self, _: &str) -> Box<dyn CommandList> {
        Box::new(NullList)
    }
    fn submit(&self, _: &mut dyn CommandList) -> Result<(), RenderError> {
        Ok(())
    }
}

struct NullList;

impl CommandList for NullList {
    fn id(&self) -> CommandListId {
        CommandListId(0)
    }
    fn label(&self) -> &str {
        "null"
    }
    fn set_label(&mut self, _: &str) {}
    fn begin_render_pass(&mut self, _: &RenderPassBinding) {}
    fn end_render_pass(&mut self) {}
    fn set_viewport(&mut self, _: Viewport) {}
    fn set_pipeline(&mut self, _: PipelineId) {}
    fn bind_texture(&mut self, _: u32, _: TextureId) {}
    fn bind_sampler(&mut self, _: u32, _: SamplerId) {}
    fn draw(&mut self, _: Range<u32>, _: Range<u32>) {}
    fn push_debug_group(&mut self, _: &str) {}
    fn pop_debug_group(&mut self) {}
    fn command_count(&self) -> usize {
        0
    }
    fn reset(&mut self) {}
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn bench_cache(c: &mut Criterion) {
    let backend: Arc<dyn GpuBackend> = Arc::new(NullBackend::default());
    let cache = ContentAddressedCache::<SamplerDescription>::new(backend);
    let tracker: CacheTracker<SamplerDescription> = CacheTracker::new(|_| {});

    // 64 distinct samplers in the cache.
    let descriptions: Vec<SamplerDescription> = (0..64)
        .map(|i| {
            let mut desc = SamplerDescription::default();
            desc.set_lod_bias(i as f32 * 0.25);
            desc
        })
        .collect();
    for desc in &descriptions {
        cache.acquire(desc, "bench", &tracker).unwrap();
    }

    let mut group = c.benchmark_group("Object Cache");

    group.bench_function("Hit (64 entries)", |b| {
        let mut i = 0;
        b.iter(|| {
            let desc = &descriptions[i % descriptions.len()];
            i += 1;
            black_box(cache.acquire(desc, "bench", &tracker).unwrap());
        });
    });

    group.bench_function("Render pass hash", |b| {
        let pass = RenderPassDescription::default()
            .with_color(AttachmentDescription::color(TextureFormat::Rgba16Float))
            .with_depth(AttachmentDescription::depth(TextureFormat::Depth32Float));
        b.iter(|| black_box(lumen_core::cache::hash_pod(black_box(&pass))));
    });

    group.finish();
}

criterion_group!(benches, bench_cache);
criterion_main!(benches);
