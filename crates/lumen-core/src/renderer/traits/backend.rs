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

use std::fmt::Debug;

use crate::renderer::api::{
    FramebufferDescription, FramebufferId, PipelineDescription, PipelineId,
    RenderPassDescription, RenderPassId, SamplerDescription, SamplerId, TextureDescription,
    TextureId,
};
use crate::renderer::error::{RenderError, ResourceError};
use crate::renderer::traits::CommandList;

/// Creates and destroys GPU objects and consumes recorded command lists.
///
/// Creation and destruction are only called from the control thread. `submit`
/// is called in recording order, one list at a time.
pub trait GpuBackend: Send + Sync + Debug {
    /// Compiles a graphics pipeline.
    fn create_pipeline(
        &self,
        descriptor: &PipelineDescription,
        label: &str,
    ) -> Result<PipelineId, ResourceError>;

    /// Destroys a pipeline.
    fn destroy_pipeline(&self, id: PipelineId) -> Result<(), ResourceError>;

    /// Creates a render pass object.
    fn create_render_pass(
        &self,
        descriptor: &RenderPassDescription,
        label: &str,
    ) -> Result<RenderPassId, ResourceError>;

    /// Destroys a render pass.
    fn destroy_render_pass(&self, id: RenderPassId) -> Result<(), ResourceError>;

    /// Creates a framebuffer.
    fn create_framebuffer(
        &self,
        descriptor: &FramebufferDescription,
        label: &str,
    ) -> Result<FramebufferId, ResourceError>;

    /// Destroys a framebuffer.
    fn destroy_framebuffer(&self, id: FramebufferId) -> Result<(), ResourceError>;

    /// Creates a sampler.
    fn create_sampler(
        &self,
        descriptor: &SamplerDescription,
        label: &str,
    ) -> Result<SamplerId, ResourceError>;

    /// Destroys a sampler.
    fn destroy_sampler(&self, id: SamplerId) -> Result<(), ResourceError>;

    /// Creates a texture.
    fn create_texture(&self, descriptor: &TextureDescription) -> Result<TextureId, ResourceError>;

    /// Destroys a texture.
    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError>;

    /// Allocates an empty command list.
    fn create_command_list(&self, label: &str) -> Box<dyn CommandList>;

    /// Submits a finished command list to the GPU queue.
    fn submit(&self, list: &mut dyn CommandList) -> Result<(), RenderError>;
}
