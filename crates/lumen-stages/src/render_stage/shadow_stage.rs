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

//! Shadow map rendering.

use std::any::Any;

use lumen_core::math::{Extent2D, Viewport};
use lumen_core::renderer::api::{
    AttachmentDescription, BorderColor, CompareFunction, DrawItem,
    GraphicsPipelineStateDescription, RenderPassDescription, SamplerDescription, SamplerFilter,
    SamplerWrap, ShaderProgramDescription, TextureFormat, TransitionOp,
};
use lumen_core::stage::keys::{ShadowMap, ShadowSampler};
use lumen_core::stage::{
    FrameRecorder, ResourceSlot, Stage, StageContext, StageError, StageEvent, StageOutcome,
};
use lumen_core::state::{PipelineState, RenderTargetLayout, RenderTargetSlot, SamplerState};

const NAME: &str = "shadow";

/// Settings of a [`ShadowStage`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowStageConfig {
    /// Depth-only shader program.
    pub program: ShaderProgramDescription,
    /// Width and height of the square shadow map.
    pub resolution: u32,
    /// Depth format of the shadow map.
    pub format: TextureFormat,
}

impl ShadowStageConfig {
    /// A 2048x2048 32-bit depth map rendered with `program`.
    pub fn new(program: ShaderProgramDescription) -> Self {
        Self {
            program,
            resolution: 2048,
            format: TextureFormat::Depth32Float,
        }
    }
}

struct ShadowObjects {
    pipeline: PipelineState,
    sampler: SamplerState,
}

/// Renders shadow casters into a fixed-size depth map.
///
/// The map does not follow the viewport, so resizes never touch it. When no
/// light casts shadows, or nothing casts one, `execute` skips.
pub struct ShadowStage {
    config: ShadowStageConfig,
    layout: RenderTargetLayout,
    target: RenderTargetSlot,
    objects: Option<ShadowObjects>,
    creates: u32,
    destroys: u32,
    casters: usize,
}

impl ShadowStage {
    /// Creates the stage. Nothing is allocated until `create`.
    pub fn new(config: ShadowStageConfig) -> Self {
        let depth = AttachmentDescription {
            final_transition: TransitionOp::ShaderRead,
            ..AttachmentDescription::depth(config.format)
        };
        Self {
            config,
            layout: RenderTargetLayout::new(RenderPassDescription::default().with_depth(depth)),
            target: RenderTargetSlot::new(),
            objects: None,
            creates: 0,
            destroys: 0,
            casters: 0,
        }
    }

    fn extent(&self) -> Extent2D {
        Extent2D::new(self.config.resolution, self.config.resolution)
    }

    fn compare_sampler() -> SamplerDescription {
        let mut description = SamplerDescription::default()
            .with_filter(SamplerFilter::Bilinear)
            .with_wrap(SamplerWrap::ClampToBorder)
            .with_compare(CompareFunction::LessEqual);
        description.border_color = BorderColor::OpaqueWhite;
        description
    }

    /// Number of successful `create` calls.
    pub fn create_count(&self) -> u32 {
        self.creates
    }

    /// Number of `destroy` calls.
    pub fn destroy_count(&self) -> u32 {
        self.destroys
    }

    /// Number of times the shadow map was reallocated.
    pub fn target_rebuilds(&self) -> u32 {
        self.target.rebuilds()
    }

    /// Shadow casters drawn by the last `execute`.
    pub fn casters_drawn(&self) -> usize {
        self.casters
    }
}

impl Stage for ShadowStage {
    fn name(&self) -> &'static str {
        NAME
    }

    fn writes(&self) -> Vec<ResourceSlot> {
        vec![ResourceSlot::of::<ShadowMap>(), ResourceSlot::of::<ShadowSampler>()]
    }

    fn create(&mut self, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        let mut pipeline = PipelineState::new(ctx.gpu, NAME, self.config.program, &self.layout.pass)
            .with_state(GraphicsPipelineStateDescription::depth_only());
        pipeline.pipeline()?;
        let mut sampler = SamplerState::new(ctx.gpu, "shadow.compare", Self::compare_sampler());
        sampler.sampler()?;
        self.target.ensure(ctx.gpu, "shadow_map", &self.layout, self.extent())?;

        self.objects = Some(ShadowObjects { pipeline, sampler });
        self.creates += 1;
        log::debug!(
            "Shadow stage created ({0}x{0} {1:?})",
            self.config.resolution,
            self.config.format
        );
        Ok(())
    }

    fn destroy(&mut self, ctx: &mut StageContext<'_>) {
        self.objects = None;
        self.target.clear();
        ctx.resources.remove::<ShadowMap>();
        ctx.resources.remove::<ShadowSampler>();
        self.destroys += 1;
    }

    fn prepare(&mut self, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        let extent = self.extent();
        let objects = self.objects.as_mut().ok_or(StageError::NotCreated { stage: NAME })?;
        self.target.ensure(ctx.gpu, "shadow_map", &self.layout, extent)?;

        if let Some(depth) = self.target.get().and_then(|t| t.depth()) {
            ctx.resources.publish::<ShadowMap>(depth);
        }
        ctx.resources.publish::<ShadowSampler>(objects.sampler.sampler()?);
        Ok(())
    }

    fn execute(
        &mut self,
        ctx: &mut StageContext<'_>,
        recorder: &mut dyn FrameRecorder,
    ) -> Result<StageOutcome, StageError> {
        self.casters = 0;
        if !ctx.scene.lights().any(|light| light.casts_shadow) {
            return Ok(StageOutcome::Skipped);
        }
        let casters: Vec<DrawItem> = ctx.scene.draws().filter(|d| d.casts_shadow).copied().collect();
        if casters.is_empty() {
            return Ok(StageOutcome::Skipped);
        }

        let objects = self.objects.as_mut().ok_or(StageError::NotCreated { stage: NAME })?;
        let pipeline = objects.pipeline.pipeline()?;
        let binding = self
            .target
            .get()
            .ok_or(StageError::NotCreated { stage: NAME })?
            .binding();
        self.casters = casters.len();

        recorder.enqueue(
            NAME,
            Box::new(move |list| {
                list.push_debug_group("shadow map");
                list.begin_render_pass(&binding);
                list.set_viewport(Viewport::covering(binding.area));
                list.set_pipeline(pipeline);
                for caster in &casters {
                    list.draw(0..caster.vertex_count, 0..caster.instance_count);
                }
                list.end_render_pass();
                list.pop_debug_group();
            }),
        );
        Ok(StageOutcome::Enqueued)
    }

    fn on_changed(&mut self, ctx: &mut StageContext<'_>, event: &StageEvent) -> Result<(), StageError> {
        match event {
            StageEvent::ShaderReloaded { module } if super::program_uses(&self.config.program, *module) => {
                log::debug!("Shadow stage rebuilding after reload of {module:?}");
                self.destroy(ctx);
                self.create(ctx)
            }
            _ => Ok(()),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
