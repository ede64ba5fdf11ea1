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

//! Full-screen composition of the scene color into the final image.

use std::any::Any;

use lumen_core::math::Viewport;
use lumen_core::renderer::api::{
    AttachmentDescription, GraphicsPipelineStateDescription, RenderPassDescription,
    SamplerDescription, SamplerFilter, SamplerWrap, ShaderProgramDescription, TextureFormat,
    TextureId,
};
use lumen_core::stage::keys::{CompositionTarget, FinalImage, OutputExtent, SceneColor};
use lumen_core::stage::{
    FrameRecorder, ResourceSlot, Stage, StageContext, StageError, StageEvent, StageOutcome,
};
use lumen_core::state::{PipelineState, RenderTargetLayout, RenderTargetSlot, SamplerState};

const NAME: &str = "composition";

/// Settings of a [`CompositionStage`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositionConfig {
    /// Full-screen triangle program sampling the scene color.
    pub program: ShaderProgramDescription,
    /// Format of the final image.
    pub format: TextureFormat,
    /// Filter used to sample the scene color.
    pub filter: SamplerFilter,
}

impl CompositionConfig {
    /// An sRGB output sampled with bilinear filtering.
    pub fn new(program: ShaderProgramDescription) -> Self {
        Self {
            program,
            format: TextureFormat::Rgba8UnormSrgb,
            filter: SamplerFilter::Bilinear,
        }
    }
}

struct CompositionObjects {
    pipeline: PipelineState,
    sampler: SamplerState,
}

/// Resolves [`SceneColor`] into the presentable [`FinalImage`].
///
/// Recording happens on a worker: the job draws one full-screen triangle.
pub struct CompositionStage {
    config: CompositionConfig,
    layout: RenderTargetLayout,
    target: RenderTargetSlot,
    objects: Option<CompositionObjects>,
    source: Option<TextureId>,
    creates: u32,
    destroys: u32,
}

impl CompositionStage {
    /// Creates the stage. Nothing is allocated until `create`.
    pub fn new(config: CompositionConfig) -> Self {
        let pass = RenderPassDescription::default().with_color(AttachmentDescription::color(config.format));
        Self {
            config,
            layout: RenderTargetLayout::new(pass),
            target: RenderTargetSlot::new(),
            objects: None,
            source: None,
            creates: 0,
            destroys: 0,
        }
    }

    /// Number of successful `create` calls.
    pub fn create_count(&self) -> u32 {
        self.creates
    }

    /// Number of `destroy` calls.
    pub fn destroy_count(&self) -> u32 {
        self.destroys
    }

    /// Number of times the output was reallocated for a new size.
    pub fn target_rebuilds(&self) -> u32 {
        self.target.rebuilds()
    }
}

impl Stage for CompositionStage {
    fn name(&self) -> &'static str {
        NAME
    }

    fn reads(&self) -> Vec<ResourceSlot> {
        vec![ResourceSlot::of::<SceneColor>()]
    }

    fn writes(&self) -> Vec<ResourceSlot> {
        vec![
            ResourceSlot::of::<CompositionTarget>(),
            ResourceSlot::of::<FinalImage>(),
            ResourceSlot::of::<OutputExtent>(),
        ]
    }

    fn create(&mut self, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        let mut pipeline = PipelineState::new(ctx.gpu, NAME, self.config.program, &self.layout.pass)
            .with_state(GraphicsPipelineStateDescription::fullscreen());
        pipeline.pipeline()?;
        let description = SamplerDescription::default()
            .with_filter(self.config.filter)
            .with_wrap(SamplerWrap::ClampToEdge);
        let mut sampler = SamplerState::new(ctx.gpu, "composition.source", description);
        sampler.sampler()?;

        if !ctx.scene.viewport.is_empty() {
            self.target.ensure(ctx.gpu, NAME, &self.layout, ctx.scene.viewport)?;
        }

        self.objects = Some(CompositionObjects { pipeline, sampler });
        self.creates += 1;
        Ok(())
    }

    fn destroy(&mut self, ctx: &mut StageContext<'_>) {
        self.objects = None;
        self.source = None;
        self.target.clear();
        ctx.resources.remove::<CompositionTarget>();
        ctx.resources.remove::<FinalImage>();
        ctx.resources.remove::<OutputExtent>();
        self.destroys += 1;
    }

    fn prepare(&mut self, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        if self.objects.is_none() {
            return Err(StageError::NotCreated { stage: NAME });
        }
        self.source = None;
        let viewport = ctx.scene.viewport;
        if viewport.is_empty() {
            return Ok(());
        }

        self.target.ensure(ctx.gpu, NAME, &self.layout, viewport)?;
        self.source = Some(ctx.resources.require::<SceneColor>()?);
        if let Some(output) = self.target.get().and_then(|t| t.color(0)) {
            ctx.resources.publish::<CompositionTarget>(output);
            ctx.resources.publish::<FinalImage>(output);
            ctx.resources.publish::<OutputExtent>(viewport);
        }
        Ok(())
    }

    fn execute(
        &mut self,
        _ctx: &mut StageContext<'_>,
        recorder: &mut dyn FrameRecorder,
    ) -> Result<StageOutcome, StageError> {
        let objects = self.objects.as_mut().ok_or(StageError::NotCreated { stage: NAME })?;
        let (Some(target), Some(source)) = (self.target.get(), self.source) else {
            return Ok(StageOutcome::Skipped);
        };
        let pipeline = objects.pipeline.pipeline()?;
        let sampler = objects.sampler.sampler()?;
        let binding = target.binding();

        recorder.enqueue(
            NAME,
            Box::new(move |list| {
                list.push_debug_group("composition");
                list.begin_render_pass(&binding);
                list.set_viewport(Viewport::covering(binding.area));
                list.set_pipeline(pipeline);
                list.bind_sampler(0, sampler);
                list.bind_texture(0, source);
                list.draw(0..3, 0..1);
                list.end_render_pass();
                list.pop_debug_group();
            }),
        );
        Ok(StageOutcome::Enqueued)
    }

    fn on_changed(&mut self, ctx: &mut StageContext<'_>, event: &StageEvent) -> Result<(), StageError> {
        match event {
            StageEvent::ShaderReloaded { module } if super::program_uses(&self.config.program, *module) => {
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
