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

use crate::cache::{CacheTracker, CachedObject, GpuContext};
use crate::math::Extent2D;
use crate::renderer::api::{
    FramebufferAttachment, FramebufferDescription, FramebufferId, RenderPassDescription,
    RenderPassId, TextureDescription, TextureId,
};
use crate::renderer::error::RenderError;
use crate::renderer::traits::{GpuBackend, RenderPassBinding};

/// What a render target looks like, independent of its size.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTargetLayout {
    /// Attachment formats and operations.
    pub pass: RenderPassDescription,
    /// Clear color used when binding the target.
    pub clear_color: [f32; 4],
    /// Clear depth used when binding the target.
    pub clear_depth: f32,
}

impl RenderTargetLayout {
    /// A layout clearing to transparent black and far depth.
    pub fn new(pass: RenderPassDescription) -> Self {
        Self {
            pass,
            clear_color: [0.0; 4],
            clear_depth: 1.0,
        }
    }
}

struct OwnedTextures {
    backend: Arc<dyn GpuBackend>,
    ids: Vec<TextureId>,
}

impl Drop for OwnedTextures {
    fn drop(&mut self) {
        for id in self.ids.drain(..) {
            if let Err(e) = self.backend.destroy_texture(id) {
                log::error!("Failed to destroy render target texture {id:?}: {e}");
            }
        }
    }
}

/// A set of attachment textures with the render pass and framebuffer to draw into them.
///
/// Dropping the target releases the framebuffer, then the render pass, then
/// destroys the textures.
pub struct RenderTarget {
    label: String,
    size: Extent2D,
    layout: RenderTargetLayout,
    render_pass: Arc<CachedObject<RenderPassDescription>>,
    framebuffer: Arc<CachedObject<FramebufferDescription>>,
    framebuffer_tracker: CacheTracker<FramebufferDescription>,
    render_pass_tracker: CacheTracker<RenderPassDescription>,
    textures: OwnedTextures,
}

impl RenderTarget {
    /// Allocates the attachments and resolves the pass and framebuffer through the caches.
    ///
    /// On failure everything created so far is released again.
    pub fn create(
        context: &Arc<GpuContext>,
        label: impl Into<String>,
        layout: &RenderTargetLayout,
        size: Extent2D,
    ) -> Result<Self, RenderError> {
        let label = label.into();
        let backend = context.backend();
        let mut textures = OwnedTextures {
            backend: Arc::clone(backend),
            ids: Vec::with_capacity(layout.pass.attachment_count()),
        };

        let colors = layout.pass.colors().enumerate().map(|(i, a)| (format!("{label}.color{i}"), a));
        let depth = layout.pass.depth_stencil().map(|a| (format!("{label}.depth"), a));
        let mut attachments = Vec::with_capacity(layout.pass.attachment_count());
        for (texture_label, attachment) in colors.chain(depth) {
            let id = backend.create_texture(&TextureDescription::attachment(texture_label, size, attachment.format))?;
            textures.ids.push(id);
            attachments.push(FramebufferAttachment {
                texture: id,
                layer: attachment.layer,
            });
        }

        let render_pass_tracker = super::releasing_tracker(context, GpuContext::render_passes);
        let (render_pass, _) = context
            .render_passes()
            .acquire(&layout.pass, &label, &render_pass_tracker)?;

        let framebuffer_tracker = super::releasing_tracker(context, GpuContext::framebuffers);
        let description = FramebufferDescription {
            render_pass: render_pass.object(),
            attachments,
            size,
        };
        let (framebuffer, _) =
            context
                .framebuffers()
                .acquire(&description, &label, &framebuffer_tracker)?;

        log::debug!("Created render target '{label}' ({}x{})", size.width, size.height);
        Ok(Self {
            label,
            size,
            layout: layout.clone(),
            render_pass,
            framebuffer,
            framebuffer_tracker,
            render_pass_tracker,
            textures,
        })
    }

    /// Debug label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Size of every attachment.
    pub fn size(&self) -> Extent2D {
        self.size
    }

    /// The layout the target was created from.
    pub fn layout(&self) -> &RenderTargetLayout {
        &self.layout
    }

    /// The cached render pass.
    pub fn render_pass(&self) -> RenderPassId {
        self.render_pass.object()
    }

    /// The cached framebuffer.
    pub fn framebuffer(&self) -> FramebufferId {
        self.framebuffer.object()
    }

    /// Color attachment texture at `index`.
    pub fn color(&self, index: usize) -> Option<TextureId> {
        (index < self.layout.pass.color_attachment_count as usize)
            .then(|| self.textures.ids[index])
    }

    /// Depth attachment texture.
    pub fn depth(&self) -> Option<TextureId> {
        self.layout
            .pass
            .has_depth_stencil
            .then(|| self.textures.ids.last().copied())
            .flatten()
    }

    /// Handles needed to begin a pass on this target.
    pub fn binding(&self) -> RenderPassBinding {
        RenderPassBinding {
            render_pass: self.render_pass(),
            framebuffer: self.framebuffer(),
            area: self.size,
            clear_color: self.layout.clear_color,
            clear_depth: self.layout.clear_depth,
        }
    }
}

impl Drop for RenderTarget {
    fn drop(&mut self) {
        self.framebuffer_tracker.release();
        self.render_pass_tracker.release();
        log::debug!("Destroying render target '{}'", self.label);
    }
}

/// A render target that is rebuilt whenever the requested size changes.
#[derive(Default)]
pub struct RenderTargetSlot {
    target: Option<RenderTarget>,
    rebuilds: u32,
}

impl RenderTargetSlot {
    /// An empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes sure the slot holds a target of `size`. Returns `true` if a target was created.
    ///
    /// A size change destroys the old target before creating the new one.
    pub fn ensure(
        &mut self,
        context: &Arc<GpuContext>,
        label: &str,
        layout: &RenderTargetLayout,
        size: Extent2D,
    ) -> Result<bool, RenderError> {
        if let Some(target) = &self.target {
            if target.size() == size && target.layout() == layout {
                return Ok(false);
            }
            log::debug!(
                "Resizing render target '{label}' from {}x{} to {}x{}",
                target.size().width,
                target.size().height,
                size.width,
                size.height
            );
            self.target = None;
            self.rebuilds += 1;
        }
        self.target = Some(RenderTarget::create(context, label, layout, size)?);
        Ok(true)
    }

    /// The current target.
    pub fn get(&self) -> Option<&RenderTarget> {
        self.target.as_ref()
    }

    /// Drops the current target.
    pub fn clear(&mut self) {
        self.target = None;
    }

    /// How many times an existing target was replaced.
    pub fn rebuilds(&self) -> u32 {
        self.rebuilds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::{AttachmentDescription, RenderSettings, TextureFormat};
    use crate::testing::TestBackend;
    use std::sync::atomic::Ordering;

    fn setup() -> (Arc<TestBackend>, Arc<GpuContext>) {
        let backend = Arc::new(TestBackend::default());
        let context = GpuContext::new(backend.clone(), &RenderSettings::default());
        (backend, context)
    }

    fn layout() -> RenderTargetLayout {
        RenderTargetLayout::new(
            RenderPassDescription::default()
                .with_color(AttachmentDescription::color(TextureFormat::Rgba16Float))
                .with_depth(AttachmentDescription::depth(TextureFormat::Depth32Float)),
        )
    }

    #[test]
    fn test_create_and_drop_balance() {
        let (backend, context) = setup();
        let target = RenderTarget::create(&context, "scene", &layout(), Extent2D::new(64, 32)).unwrap();

        assert_eq!(backend.live("texture"), 2);
        assert_eq!(backend.live("render_pass"), 1);
        assert_eq!(backend.live("framebuffer"), 1);
        assert!(target.color(0).is_some());
        assert!(target.color(1).is_none());
        assert!(target.depth().is_some());
        assert_eq!(target.binding().area, Extent2D::new(64, 32));

        drop(target);
        assert_eq!(backend.live("texture"), 0);
        assert_eq!(backend.live("render_pass"), 0);
        assert_eq!(backend.live("framebuffer"), 0);
    }

    #[test]
    fn test_targets_share_render_pass() {
        let (backend, context) = setup();
        let a = RenderTarget::create(&context, "a", &layout(), Extent2D::new(64, 64)).unwrap();
        let b = RenderTarget::create(&context, "b", &layout(), Extent2D::new(64, 64)).unwrap();

        assert_eq!(a.render_pass(), b.render_pass());
        assert_ne!(a.framebuffer(), b.framebuffer());
        assert_eq!(backend.created("render_pass"), 1);
    }

    #[test]
    fn test_failed_creation_rolls_back() {
        let (backend, context) = setup();
        let keep = RenderTarget::create(&context, "keep", &layout(), Extent2D::new(8, 8)).unwrap();
        backend.fail_allocations.store(true, Ordering::SeqCst);

        let result = RenderTarget::create(&context, "broken", &layout(), Extent2D::new(16, 16));
        assert!(result.is_err());
        assert_eq!(backend.live("texture"), 2);
        assert_eq!(context.framebuffers().len(), 1);
        drop(keep);
    }

    #[test]
    fn test_slot_rebuilds_only_on_resize() {
        let (backend, context) = setup();
        let mut slot = RenderTargetSlot::new();

        assert!(slot.ensure(&context, "color", &layout(), Extent2D::new(32, 32)).unwrap());
        assert!(!slot.ensure(&context, "color", &layout(), Extent2D::new(32, 32)).unwrap());
        assert_eq!(slot.rebuilds(), 0);

        assert!(slot.ensure(&context, "color", &layout(), Extent2D::new(48, 32)).unwrap());
        assert_eq!(slot.rebuilds(), 1);
        assert_eq!(backend.live("texture"), 2);
        assert_eq!(backend.live("framebuffer"), 1);

        slot.clear();
        assert_eq!(backend.live("texture"), 0);
    }
}
