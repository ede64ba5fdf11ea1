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

//! Framebuffer descriptions.

use crate::cache::{hash_value, Description, ObjectKind};
use crate::math::Extent2D;
use crate::renderer::api::{FramebufferId, RenderPassId, TextureId, ALL_LAYERS};
use crate::renderer::error::ResourceError;
use crate::renderer::traits::GpuBackend;

/// One texture bound to a framebuffer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferAttachment {
    /// Bound texture.
    pub texture: TextureId,
    /// Array layer, or [`ALL_LAYERS`].
    pub layer: u8,
}

impl FramebufferAttachment {
    /// Binds every layer of `texture`.
    pub fn whole(texture: TextureId) -> Self {
        Self {
            texture,
            layer: ALL_LAYERS,
        }
    }
}

/// Concrete textures bound to the slots of a render pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FramebufferDescription {
    /// The pass the framebuffer is compatible with.
    pub render_pass: RenderPassId,
    /// Attachments in render pass slot order, depth last.
    pub attachments: Vec<FramebufferAttachment>,
    /// Rendered area.
    pub size: Extent2D,
}

impl Description for FramebufferDescription {
    type Object = FramebufferId;
    const KIND: ObjectKind = ObjectKind::Framebuffer;

    /// Attachment count in the high 32 bits, content hash in the low 32 bits.
    fn content_hash(&self) -> u64 {
        let count = self.attachments.len() as u64;
        let content = hash_value(self) & 0xFFFF_FFFF;
        (count << 32) | content
    }

    fn allocate(&self, backend: &dyn GpuBackend, label: &str) -> Result<FramebufferId, ResourceError> {
        backend.create_framebuffer(self, label)
    }

    fn destroy(object: FramebufferId, backend: &dyn GpuBackend) -> Result<(), ResourceError> {
        backend.destroy_framebuffer(object)
    }
}
