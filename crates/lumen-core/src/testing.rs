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

//! A minimal in-memory backend for unit tests of this crate.

use std::any::Any;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use crate::math::Viewport;
use crate::renderer::api::*;
use crate::renderer::error::{RenderError, ResourceError};
use crate::renderer::traits::{CommandList, GpuBackend, RenderPassBinding};

#[derive(Debug, Default)]
pub struct TestBackend {
    next_id: AtomicU64,
    pub fail_allocations: AtomicBool,
    live: Mutex<HashMap<&'static str, i64>>,
    created: Mutex<HashMap<&'static str, u64>>,
}

impl TestBackend {
    fn create(&self, kind: &'static str, label: &str) -> Result<u64, ResourceError> {
        if self.fail_allocations.load(Ordering::SeqCst) {
            return Err(ResourceError::AllocationFailed {
                kind,
                label: label.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        *self.live.lock().unwrap().entry(kind).or_default() += 1;
        *self.created.lock().unwrap().entry(kind).or_default() += 1;
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn destroy(&self, kind: &'static str) -> Result<(), ResourceError> {
        *self.live.lock().unwrap().entry(kind).or_default() -= 1;
        Ok(())
    }

    pub fn live(&self, kind: &'static str) -> i64 {
        self.live.lock().unwrap().get(kind).copied().unwrap_or(0)
    }

    pub fn created(&self, kind: &'static str) -> u64 {
        self.created.lock().unwrap().get(kind).copied().unwrap_or(0)
    }
}

impl GpuBackend for TestBackend {
    fn create_pipeline(&self, _: &PipelineDescription, label: &str) -> Result<PipelineId, ResourceError> {
        self.create("pipeline", label).map(PipelineId)
    }

    fn destroy_pipeline(&self, _: PipelineId) -> Result<(), ResourceError> {
        self.destroy("pipeline")
    }

    fn create_render_pass(&self, _: &RenderPassDescription, label: &str) -> Result<RenderPassId, ResourceError> {
        self.create("render_pass", label).map(RenderPassId)
    }

    fn destroy_render_pass(&self, _: RenderPassId) -> Result<(), ResourceError> {
        self.destroy("render_pass")
    }

    fn create_framebuffer(&self, _: &FramebufferDescription, label: &str) -> Result<FramebufferId, ResourceError> {
        self.create("framebuffer", label).map(FramebufferId)
    }

    fn destroy_framebuffer(&self, _: FramebufferId) -> Result<(), ResourceError> {
        self.destroy("framebuffer")
    }

    fn create_sampler(&self, _: &SamplerDescription, label: &str) -> Result<SamplerId, ResourceError> {
        self.create("sampler", label).map(SamplerId)
    }

    fn destroy_sampler(&self, _: SamplerId) -> Result<(), ResourceError> {
        self.destroy("sampler")
    }

    fn create_texture(&self, desc: &TextureDescription) -> Result<TextureId, ResourceError> {
        self.create("texture", &desc.label).map(TextureId)
    }

    fn destroy_texture(&self, _: TextureId) -> Result<(), ResourceError> {
        self.destroy("texture")
    }

    fn create_command_list(&self, label: &str) -> Box<dyn CommandList> {
        Box::new(CountingList {
            id: CommandListId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1),
            label: label.to_string(),
            commands: 0,
        })
    }

    fn submit(&self, _: &mut dyn CommandList) -> Result<(), RenderError> {
        Ok(())
    }
}

pub struct CountingList {
    id: CommandListId,
    label: String,
    commands: usize,
}

impl CommandList for CountingList {
    fn id(&self) -> CommandListId {
        self.id
    }
    fn label(&self) -> &str {
        &self.label
    }
    fn set_label(&mut self, label: &str) {
        self.label = label.to_string();
    }
    fn begin_render_pass(&mut self, _: &RenderPassBinding) {
        self.commands += 1;
    }
    fn end_render_pass(&mut self) {
        self.commands += 1;
    }
    fn set_viewport(&mut self, _: Viewport) {
        self.commands += 1;
    }
    fn set_pipeline(&mut self, _: PipelineId) {
        self.commands += 1;
    }
    fn bind_texture(&mut self, _: u32, _: TextureId) {
        self.commands += 1;
    }
    fn bind_sampler(&mut self, _: u32, _: SamplerId) {
        self.commands += 1;
    }
    fn draw(&mut self, _: Range<u32>, _: Range<u32>) {
        self.commands += 1;
    }
    fn push_debug_group(&mut self, _: &str) {}
    fn pop_debug_group(&mut self) {}
    fn command_count(&self) -> usize {
        self.commands
    }
    fn reset(&mut self) {
        self.commands = 0;
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
