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

//! Render pass descriptions.
//!
//! A render pass fixes attachment formats, load/store behavior, and layout
//! transitions. The last attachment slot is reserved for depth-stencil.

use bytemuck::NoUninit;

use crate::cache::{hash_pod, Description, ObjectKind};
use crate::renderer::api::{LoadOp, RenderPassId, SampleCount, StoreOp, TextureFormat, TransitionOp};
use crate::renderer::error::ResourceError;
use crate::renderer::traits::GpuBackend;

/// Maximum number of color attachments in one render pass.
pub const MAX_COLOR_ATTACHMENTS: usize = 8;

/// Total attachment slots, color attachments followed by one depth-stencil slot.
pub const MAX_ATTACHMENTS: usize = MAX_COLOR_ATTACHMENTS + 1;

/// Index of the depth-stencil slot in [`RenderPassDescription::attachments`].
pub const DEPTH_ATTACHMENT_INDEX: usize = MAX_COLOR_ATTACHMENTS;

/// Marks an attachment that binds every array layer.
pub const ALL_LAYERS: u8 = u8::MAX;

/// One attachment slot of a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, NoUninit)]
#[repr(C)]
pub struct AttachmentDescription {
    /// Texel format. [`TextureFormat::Undefined`] marks an unused slot.
    pub format: TextureFormat,
    /// Samples per pixel.
    pub samples: SampleCount,
    /// Color or depth load behavior.
    pub load_op: LoadOp,
    /// Color or depth store behavior.
    pub store_op: StoreOp,
    /// Stencil load behavior.
    pub stencil_load_op: LoadOp,
    /// Stencil store behavior.
    pub stencil_store_op: StoreOp,
    /// Layout before the pass.
    pub initial_transition: TransitionOp,
    /// Layout after the pass.
    pub final_transition: TransitionOp,
    /// The attachment is the presentable backbuffer.
    pub backbuffer: bool,
    /// Array layer rendered to, or [`ALL_LAYERS`].
    pub layer: u8,
}

impl Default for AttachmentDescription {
    fn default() -> Self {
        Self {
            format: TextureFormat::Undefined,
            samples: SampleCount::X1,
            load_op: LoadOp::DontCare,
            store_op: StoreOp::DontCare,
            stencil_load_op: LoadOp::DontCare,
            stencil_store_op: StoreOp::DontCare,
            initial_transition: TransitionOp::Undefined,
            final_transition: TransitionOp::Undefined,
            backbuffer: false,
            layer: 0,
        }
    }
}

impl AttachmentDescription {
    /// A color attachment that is cleared, stored, and left readable by shaders.
    pub fn color(format: TextureFormat) -> Self {
        Self {
            format,
            load_op: LoadOp::Clear,
            store_op: StoreOp::Store,
            final_transition: TransitionOp::ShaderRead,
            ..Self::default()
        }
    }

    /// A depth attachment that is cleared and stored.
    pub fn depth(format: TextureFormat) -> Self {
        let stencil = format.has_stencil();
        Self {
            format,
            load_op: LoadOp::Clear,
            store_op: StoreOp::Store,
            stencil_load_op: if stencil { LoadOp::Clear } else { LoadOp::DontCare },
            stencil_store_op: if stencil { StoreOp::Store } else { StoreOp::DontCare },
            final_transition: TransitionOp::DepthStencilAttachment,
            ..Self::default()
        }
    }

    /// Returns `true` if the slot holds an attachment.
    pub fn is_used(&self) -> bool {
        self.format != TextureFormat::Undefined
    }
}

/// Attachment layout of a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(C)]
pub struct RenderPassDescription {
    /// Color attachments, then the depth-stencil slot at [`DEPTH_ATTACHMENT_INDEX`].
    pub attachments: [AttachmentDescription; MAX_ATTACHMENTS],
    /// Number of leading color attachments in use.
    pub color_attachment_count: u8,
    /// The depth-stencil slot is in use.
    pub has_depth_stencil: bool,
}

impl RenderPassDescription {
    /// Appends a color attachment. Extra attachments past the limit are ignored.
    pub fn with_color(mut self, attachment: AttachmentDescription) -> Self {
        let index = self.color_attachment_count as usize;
        if index < MAX_COLOR_ATTACHMENTS {
            self.attachments[index] = attachment;
            self.color_attachment_count += 1;
        } else {
            log::warn!("Render pass already has {MAX_COLOR_ATTACHMENTS} color attachments, ignoring extra one");
        }
        self
    }

    /// Sets the depth-stencil attachment.
    pub fn with_depth(mut self, attachment: AttachmentDescription) -> Self {
        self.attachments[DEPTH_ATTACHMENT_INDEX] = attachment;
        self.has_depth_stencil = true;
        self
    }

    /// Iterates over the color attachments in use.
    pub fn colors(&self) -> impl Iterator<Item = &AttachmentDescription> {
        self.attachments[..self.color_attachment_count as usize].iter()
    }

    /// Returns the depth-stencil attachment, if any.
    pub fn depth_stencil(&self) -> Option<&AttachmentDescription> {
        self.has_depth_stencil
            .then(|| &self.attachments[DEPTH_ATTACHMENT_INDEX])
    }

    /// Number of attachments in use, depth included.
    pub fn attachment_count(&self) -> usize {
        self.color_attachment_count as usize + usize::from(self.has_depth_stencil)
    }

    /// Reduces the description to what pipeline compatibility depends on.
    ///
    /// Two passes with the same formats and sample counts accept the same
    /// pipelines, whatever their load, store, and transition behavior.
    pub fn compatibility(&self) -> Self {
        let mut compat = Self {
            color_attachment_count: self.color_attachment_count,
            has_depth_stencil: self.has_depth_stencil,
            ..Self::default()
        };
        for (dst, src) in compat.attachments.iter_mut().zip(self.attachments.iter()) {
            if src.is_used() {
                dst.format = src.format;
                dst.samples = src.samples;
            }
        }
        compat
    }
}

// Arrays are only `NoUninit` through `Pod`, so the derive cannot see through
// `[AttachmentDescription; N]`. Every field is byte-sized and the struct is
// `repr(C)`, so it has no padding; the assertion below enforces that.
const _: () = assert!(
    core::mem::size_of::<RenderPassDescription>()
        == core::mem::size_of::<AttachmentDescription>() * MAX_ATTACHMENTS + 2
);
const _: () = assert!(core::mem::align_of::<AttachmentDescription>() == 1);
// SAFETY: `repr(C)`, padding-free (asserted above), all fields are `NoUninit`.
unsafe impl NoUninit for RenderPassDescription {}

impl Description for RenderPassDescription {
    type Object = RenderPassId;
    const KIND: ObjectKind = ObjectKind::RenderPass;

    fn content_hash(&self) -> u64 {
        hash_pod(self)
    }

    fn allocate(&self, backend: &dyn GpuBackend, label: &str) -> Result<RenderPassId, ResourceError> {
        backend.create_render_pass(self, label)
    }

    fn destroy(object: RenderPassId, backend: &dyn GpuBackend) -> Result<(), ResourceError> {
        backend.destroy_render_pass(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gbuffer_pass() -> RenderPassDescription {
        RenderPassDescription::default()
            .with_color(AttachmentDescription::color(TextureFormat::Rgba16Float))
            .with_color(AttachmentDescription::color(TextureFormat::Rgba8Unorm))
            .with_depth(AttachmentDescription::depth(TextureFormat::Depth32Float))
    }

    #[test]
    fn test_builder_fills_slots() {
        let pass = gbuffer_pass();
        assert_eq!(pass.color_attachment_count, 2);
        assert_eq!(pass.attachment_count(), 3);
        assert_eq!(pass.colors().count(), 2);
        assert_eq!(
            pass.depth_stencil().map(|d| d.format),
            Some(TextureFormat::Depth32Float)
        );
    }

    #[test]
    fn test_compatibility_ignores_load_ops() {
        let mut loading = gbuffer_pass();
        loading.attachments[0].load_op = LoadOp::Load;
        assert_ne!(loading, gbuffer_pass());
        assert_eq!(loading.compatibility(), gbuffer_pass().compatibility());
    }

    #[test]
    fn test_compatibility_keeps_formats() {
        let other = RenderPassDescription::default()
            .with_color(AttachmentDescription::color(TextureFormat::Bgra8Unorm));
        assert_ne!(other.compatibility(), gbuffer_pass().compatibility());
    }
}
