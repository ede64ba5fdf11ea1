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

use crate::math::{Extent2D, Viewport};
use crate::renderer::api::{
    CommandListId, FramebufferId, PipelineId, RenderPassId, SamplerId, TextureId,
};

/// Everything needed to begin a render pass on a command list.
///
/// It only holds handles, so recording jobs can carry it to worker threads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPassBinding {
    /// Render pass object.
    pub render_pass: RenderPassId,
    /// Framebuffer bound to the pass.
    pub framebuffer: FramebufferId,
    /// Rendered area.
    pub area: Extent2D,
    /// Clear color for color attachments.
    pub clear_color: [f32; 4],
    /// Clear value for depth.
    pub clear_depth: f32,
}

/// A list of GPU commands recorded on one thread and submitted later.
///
/// Lists are recycled between frames: [`reset`](CommandList::reset) must
/// leave the list empty and ready for recording.
pub trait CommandList: Send {
    /// Backend identity of the list.
    fn id(&self) -> CommandListId;

    /// Debug label of the list.
    fn label(&self) -> &str;

    /// Renames the list, used when a pooled list is reused.
    fn set_label(&mut self, label: &str);

    /// Begins a render pass.
    fn begin_render_pass(&mut self, binding: &RenderPassBinding);

    /// Ends the current render pass.
    fn end_render_pass(&mut self);

    /// Sets the viewport.
    fn set_viewport(&mut self, viewport: Viewport);

    /// Binds a graphics pipeline.
    fn set_pipeline(&mut self, pipeline: PipelineId);

    /// Binds a texture to a shader slot.
    fn bind_texture(&mut self, slot: u32, texture: TextureId);

    /// Binds a sampler to a shader slot.
    fn bind_sampler(&mut self, slot: u32, sampler: SamplerId);

    /// Records a non-indexed draw.
    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>);

    /// Opens a named debug region.
    fn push_debug_group(&mut self, label: &str);

    /// Closes the innermost debug region.
    fn pop_debug_group(&mut self);

    /// Number of commands recorded since the last reset.
    fn command_count(&self) -> usize;

    /// Clears all recorded commands.
    fn reset(&mut self);

    /// Allows downcasting to the backend's concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Allows mutable downcasting to the backend's concrete type.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
