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
use crate::renderer::api::{
    BlendFactor, BlendOp, CompareFunction, CullMode, FrontFace, GraphicsPipelineStateDescription,
    PipelineDescription, PipelineId, PolygonMode, PrimitiveTopology, RenderPassDescription,
    ShaderProgramDescription, MAX_COLOR_ATTACHMENTS,
};

/// Mutable pipeline configuration that resolves to a cached pipeline on demand.
///
/// Setters only mark the state dirty. The next call to
/// [`pipeline`](PipelineState::pipeline) looks up or compiles the matching
/// pipeline. Every pipeline acquired stays linked until the state is dropped.
pub struct PipelineState {
    context: Arc<GpuContext>,
    label: String,
    description: PipelineDescription,
    current: Option<Arc<CachedObject<PipelineDescription>>>,
    tracker: CacheTracker<PipelineDescription>,
}

impl PipelineState {
    /// Creates a state for `program` rendering into passes compatible with `render_pass`.
    pub fn new(
        context: &Arc<GpuContext>,
        label: impl Into<String>,
        program: ShaderProgramDescription,
        render_pass: &RenderPassDescription,
    ) -> Self {
        Self {
            context: Arc::clone(context),
            label: label.into(),
            description: PipelineDescription {
                program,
                state: GraphicsPipelineStateDescription::default(),
                render_pass: render_pass.compatibility(),
            },
            current: None,
            tracker: super::releasing_tracker(context, GpuContext::pipelines),
        }
    }

    /// Replaces the whole fixed-function state.
    pub fn with_state(mut self, state: GraphicsPipelineStateDescription) -> Self {
        self.update(|d| d.state = state);
        self
    }

    fn update(&mut self, change: impl FnOnce(&mut PipelineDescription)) {
        let before = self.description;
        change(&mut self.description);
        if before != self.description {
            self.current = None;
        }
    }

    /// Sets the shader program, e.g. after a reload.
    pub fn set_program(&mut self, program: ShaderProgramDescription) {
        self.update(|d| d.program = program);
    }

    /// Sets the render pass the pipeline must be compatible with.
    pub fn set_render_pass(&mut self, render_pass: &RenderPassDescription) {
        let compat = render_pass.compatibility();
        self.update(|d| d.render_pass = compat);
    }

    /// Sets the primitive topology.
    pub fn set_topology(&mut self, topology: PrimitiveTopology) {
        self.update(|d| d.state.topology = topology);
    }

    /// Sets the fill mode.
    pub fn set_polygon_mode(&mut self, mode: PolygonMode) {
        self.update(|d| d.state.polygon_mode = mode);
    }

    /// Sets face culling.
    pub fn set_cull_mode(&mut self, mode: CullMode) {
        self.update(|d| d.state.cull_mode = mode);
    }

    /// Sets the winding order of front faces.
    pub fn set_front_face(&mut self, face: FrontFace) {
        self.update(|d| d.state.front_face = face);
    }

    /// Sets the write mask of color attachment `index`, see [`color_mask`](crate::renderer::api::color_mask).
    ///
    /// Indexes past the last color attachment slot are ignored.
    pub fn set_color_write_mask(&mut self, index: usize, mask: u8) {
        if index >= MAX_COLOR_ATTACHMENTS {
            log::warn!(
                "Pipeline state '{}' has no color attachment {index}, ignoring write mask",
                self.label
            );
            return;
        }
        self.update(|d| d.state.color_write_mask[index] = mask);
    }

    /// Configures the depth test.
    pub fn set_depth(&mut self, test: bool, write: bool, compare: CompareFunction) {
        self.update(|d| {
            d.state.depth_test = test;
            d.state.depth_write = write;
            d.state.depth_compare = compare;
        });
    }

    /// Enables color blending with the same factors for color and alpha.
    pub fn set_blend(&mut self, src: BlendFactor, dst: BlendFactor, op: BlendOp) {
        self.update(|d| {
            d.state.blend_enabled = true;
            d.state.src_color = src;
            d.state.dst_color = dst;
            d.state.color_op = op;
            d.state.src_alpha = src;
            d.state.dst_alpha = dst;
            d.state.alpha_op = op;
        });
    }

    /// Disables color blending.
    pub fn disable_blend(&mut self) {
        self.update(|d| d.state.blend_enabled = false);
    }

    /// Returns `true` if the next [`pipeline`](Self::pipeline) call has to look up the cache.
    pub fn is_dirty(&self) -> bool {
        self.current.is_none()
    }

    /// The current description.
    pub fn description(&self) -> &PipelineDescription {
        &self.description
    }

    /// Returns the pipeline matching the current state.
    pub fn pipeline(&mut self) -> Result<PipelineId, CacheError> {
        if let Some(current) = &self.current {
            return Ok(current.object());
        }
        let (object, created) =
            self.context
                .pipelines()
                .acquire(&self.description, &self.label, &self.tracker)?;
        if created {
            log::trace!("Compiled pipeline '{}'", self.label);
        }
        let id = object.object();
        self.current = Some(object);
        Ok(id)
    }

    /// Number of distinct pipelines this state has linked.
    pub fn linked_pipelines(&self) -> usize {
        self.tracker.len()
    }
}

impl Drop for PipelineState {
    fn drop(&mut self) {
        self.current = None;
        self.tracker.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::{
        color_mask, AttachmentDescription, RenderSettings, ShaderModuleId, TextureFormat,
    };
    use crate::testing::TestBackend;

    fn setup() -> (Arc<TestBackend>, Arc<GpuContext>) {
        let backend = Arc::new(TestBackend::default());
        let context = GpuContext::new(backend.clone(), &RenderSettings::default());
        (backend, context)
    }

    fn pass() -> RenderPassDescription {
        RenderPassDescription::default()
            .with_color(AttachmentDescription::color(TextureFormat::Rgba8Unorm))
    }

    fn program() -> ShaderProgramDescription {
        ShaderProgramDescription::new(ShaderModuleId(1), ShaderModuleId(2))
    }

    #[test]
    fn test_pipeline_is_cached_until_state_changes() {
        let (backend, context) = setup();
        let mut state = PipelineState::new(&context, "opaque", program(), &pass());

        let first = state.pipeline().unwrap();
        assert_eq!(state.pipeline().unwrap(), first);
        assert_eq!(backend.created("pipeline"), 1);

        state.set_cull_mode(CullMode::Back);
        assert!(!state.is_dirty(), "setting the same value keeps the pipeline");

        state.set_polygon_mode(PolygonMode::Line);
        assert!(state.is_dirty());
        assert_ne!(state.pipeline().unwrap(), first);
        assert_eq!(state.linked_pipelines(), 2);
    }

    #[test]
    fn test_identical_states_share_one_pipeline() {
        let (backend, context) = setup();
        let mut a = PipelineState::new(&context, "a", program(), &pass());
        let mut b = PipelineState::new(&context, "b", program(), &pass());

        assert_eq!(a.pipeline().unwrap(), b.pipeline().unwrap());
        assert_eq!(backend.created("pipeline"), 1);

        drop(a);
        assert_eq!(context.pipelines().len(), 1);
        drop(b);
        assert!(context.pipelines().is_empty());
        assert_eq!(backend.live("pipeline"), 0);
    }

    #[test]
    fn test_face_and_write_mask_changes_recompile() {
        let (backend, context) = setup();
        let mut state = PipelineState::new(&context, "masked", program(), &pass());
        let first = state.pipeline().unwrap();

        state.set_front_face(FrontFace::Ccw);
        state.set_color_write_mask(0, color_mask::ALL);
        state.set_color_write_mask(MAX_COLOR_ATTACHMENTS, 0);
        assert!(!state.is_dirty());

        state.set_color_write_mask(0, color_mask::RED | color_mask::ALPHA);
        assert!(state.is_dirty());
        let masked = state.pipeline().unwrap();
        assert_ne!(masked, first);

        state.set_front_face(FrontFace::Cw);
        assert!(state.is_dirty());
        assert_ne!(state.pipeline().unwrap(), masked);
        assert_eq!(backend.created("pipeline"), 3);
        assert_eq!(
            state.description().state.color_write_mask[0],
            color_mask::RED | color_mask::ALPHA
        );
    }

    #[test]
    fn test_state_dropped_after_shutdown() {
        let (backend, context) = setup();
        let mut state = PipelineState::new(&context, "leaked", program(), &pass());
        state.pipeline().unwrap();

        context.shutdown();
        assert_eq!(backend.live("pipeline"), 0);

        drop(state);
        assert_eq!(backend.live("pipeline"), 0);
        assert_eq!(context.pipelines().stats().destroyed, 1);
    }
}
