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

use lumen_core::math::Viewport;
use lumen_core::renderer::{
    CommandList, CommandListId, PipelineId, RenderPassBinding, SamplerId, TextureId,
};

/// One recorded command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `begin_render_pass`
    BeginRenderPass(RenderPassBinding),
    /// `end_render_pass`
    EndRenderPass,
    /// `set_viewport`
    SetViewport(Viewport),
    /// `set_pipeline`
    SetPipeline(PipelineId),
    /// `bind_texture`
    BindTexture {
        /// Shader slot.
        slot: u32,
        /// Bound texture.
        texture: TextureId,
    },
    /// `bind_sampler`
    BindSampler {
        /// Shader slot.
        slot: u32,
        /// Bound sampler.
        sampler: SamplerId,
    },
    /// `draw`
    Draw {
        /// Vertex range.
        vertices: Range<u32>,
        /// Instance range.
        instances: Range<u32>,
    },
    /// `push_debug_group`
    PushDebugGroup(String),
    /// `pop_debug_group`
    PopDebugGroup,
}

/// A command list that stores commands in a vector.
#[derive(Debug)]
pub struct HeadlessCommandList {
    id: CommandListId,
    label: String,
    commands: Vec<Command>,
    open_pass: bool,
}

impl HeadlessCommandList {
    pub(crate) fn new(id: CommandListId, label: &str) -> Self {
        Self {
            id,
            label: label.to_owned(),
            commands: Vec::new(),
            open_pass: false,
        }
    }

    /// Recorded commands.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub(crate) fn take_commands(&mut self) -> Vec<Command> {
        self.open_pass = false;
        std::mem::take(&mut self.commands)
    }

    pub(crate) fn has_open_pass(&self) -> bool {
        self.open_pass
    }
}

impl CommandList for HeadlessCommandList {
    fn id(&self) -> CommandListId {
        self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn set_label(&mut self, label: &str) {
        label.clone_into(&mut self.label);
    }

    fn begin_render_pass(&mut self, binding: &RenderPassBinding) {
        if self.open_pass {
            log::warn!("HeadlessCommandList '{}': render pass begun inside another pass", self.label);
        }
        self.open_pass = true;
        self.commands.push(Command::BeginRenderPass(*binding));
    }

    fn end_render_pass(&mut self) {
        if !self.open_pass {
            log::warn!("HeadlessCommandList '{}': end_render_pass without a pass", self.label);
        }
        self.open_pass = false;
        self.commands.push(Command::EndRenderPass);
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.commands.push(Command::SetViewport(viewport));
    }

    fn set_pipeline(&mut self, pipeline: PipelineId) {
        self.commands.push(Command::SetPipeline(pipeline));
    }

    fn bind_texture(&mut self, slot: u32, texture: TextureId) {
        self.commands.push(Command::BindTexture { slot, texture });
    }

    fn bind_sampler(&mut self, slot: u32, sampler: SamplerId) {
        self.commands.push(Command::BindSampler { slot, sampler });
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.commands.push(Command::Draw {
            vertices,
            instances,
        });
    }

    fn push_debug_group(&mut self, label: &str) {
        self.commands.push(Command::PushDebugGroup(label.to_owned()));
    }

    fn pop_debug_group(&mut self) {
        self.commands.push(Command::PopDebugGroup);
    }

    fn command_count(&self) -> usize {
        self.commands.len()
    }

    fn reset(&mut self) {
        self.commands.clear();
        self.open_pass = false;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
