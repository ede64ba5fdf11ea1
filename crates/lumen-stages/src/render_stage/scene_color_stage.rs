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

//! Forward rendering of the scene into a color and depth target.

use std::any::Any;

use lumen_core::math::Viewport;
use lumen_core::renderer::api::{
    AttachmentDescription, CompareFunction, CullMode, GraphicsPipelineStateDescription,
    RenderPassDescription, ShaderModuleId, ShaderProgramDescription, TextureFormat,
};
use lumen_core::stage::keys::{SceneColor, SceneDepth, ShadowMap, ShadowSampler};
use lumen_core::stage::{
    FrameRecorder, ResourceSlot, Stage, StageContext, StageError, StageEvent, StageOutcome,
};
use lumen_core::state::{PipelineState, RenderTargetLayout, RenderTargetSlot};

const NAME: &str = "scene_color";

/// Shader slot the shadow map and its sampler are bound to.
pub const SHADOW_SLOT: u32 = 1;

/// Vertices of the skybox cube.
const SKYBOX_VERTICES: u32 = 36;

/// Settings of a [`SceneColorStage`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneColorConfig {
    /// Shader program for scene meshes.
    pub program: ShaderProgramDescription,
    /// Shader program for the skybox. Without it skybox items are ignored.
    pub skybox_program: Option<ShaderProgramDescription>,
    /// Color attachment format.
    pub color_format: TextureFormat,
    /// Depth attachment format.
    pub depth_format: TextureFormat,
    /// Clear color of the target.
    pub clear_color: [f32; 4],
}

impl SceneColorConfig {
    /// HDR color with 32-bit depth, cleared to black.
    pub fn new(program: ShaderProgramDescription) -> Self {
        Self {
            program,
            skybox_program: None,
            color_format: TextureFormat::Rgba16Float,
            depth_format: TextureFormat::Depth32Float,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

struct SceneObjects {
    forward: PipelineState,
    skybox: Option<PipelineState>,
}

/// Draws the render list on the primary command list.
///
/// The target always matches the viewport. When a [`ShadowMap`] has been
/// published earlier in the frame it is bound at [`SHADOW_SLOT`].
pub struct SceneColorStage {
    config: SceneColorConfig,
    layout: RenderTargetLayout,
    target: RenderTargetSlot,
    objects: Option<SceneObjects>,
    creates: u32,
    destroys: u32,
}

impl SceneColorStage {
    /// Creates the stage. Nothing is allocated until `create`.
    pub fn new(config: SceneColorConfig) -> Self {
        let pass = RenderPassDescription::default()
            .with_color(AttachmentDescription::color(config.color_format))
            .with_depth(AttachmentDescription::depth(config.depth_format));
        let layout = RenderTargetLayout {
            clear_color: config.clear_color,
            ..RenderTargetLayout::new(pass)
        };
        Self {
            config,
            layout,
            target: RenderTargetSlot::new(),
            objects: None,
            creates: 0,
            destroys: 0,
        }
    }

    fn uses(&self, module: ShaderModuleId) -> bool {
        super::program_uses(&self.config.program, module)
            || self
                .config
                .skybox_program
                .is_some_and(|program| super::program_uses(&program, module))
    }

    /// Number of successful `create` calls.
    pub fn create_count(&self) -> u32 {
        self.creates
    }

    /// Number of `destroy` calls.
    pub fn destroy_count(&self) -> u32 {
        self.destroys
    }

    /// Number of times the target was reallocated for a new size.
    pub fn target_rebuilds(&self) -> u32 {
        self.target.rebuilds()
    }
}

impl Stage for SceneColorStage {
    fn name(&self) -> &'static str {
        NAME
    }

    fn writes(&self) -> Vec<ResourceSlot> {
        vec![ResourceSlot::of::<SceneColor>(), ResourceSlot::of::<SceneDepth>()]
    }

    fn create(&mut self, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        let mut forward = PipelineState::new(ctx.gpu, "scene.forward", self.config.program, &self.layout.pass);
        forward.pipeline()?;

        let skybox = match self.config.skybox_program {
            Some(program) => {
                let state = GraphicsPipelineStateDescription {
                    cull_mode: CullMode::None,
                    depth_write: false,
                    depth_compare: CompareFunction::LessEqual,
                    ..Default::default()
                };
                let mut skybox = PipelineState::new(ctx.gpu, "scene.skybox", program, &self.layout.pass)
                    .with_state(state);
                skybox.pipeline()?;
                Some(skybox)
            }
            None => None,
        };

        // An empty viewport (minimized window) defers the target to `prepare`.
        if !ctx.scene.viewport.is_empty() {
            self.target.ensure(ctx.gpu, NAME, &self.layout, ctx.scene.viewport)?;
        }

        self.objects = Some(SceneObjects { forward, skybox });
        self.creates += 1;
        Ok(())
    }

    fn destroy(&mut self, ctx: &mut StageContext<'_>) {
        self.objects = None;
        self.target.clear();
        ctx.resources.remove::<SceneColor>();
        ctx.resources.remove::<SceneDepth>();
        self.destroys += 1;
    }

    fn prepare(&mut self, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        if self.objects.is_none() {
            return Err(StageError::NotCreated { stage: NAME });
        }
        let viewport = ctx.scene.viewport;
        if viewport.is_empty() {
            log::trace!("Scene color stage: empty viewport, keeping the current target");
            return Ok(());
        }

        self.target.ensure(ctx.gpu, NAME, &self.layout, viewport)?;
        if let Some(target) = self.target.get() {
            if let Some(color) = target.color(0) {
                ctx.resources.publish::<SceneColor>(color);
            }
            if let Some(depth) = target.depth() {
                ctx.resources.publish::<SceneDepth>(depth);
            }
        }
        Ok(())
    }

    fn execute(
        &mut self,
        ctx: &mut StageContext<'_>,
        recorder: &mut dyn FrameRecorder,
    ) -> Result<StageOutcome, StageError> {
        let objects = self.objects.as_mut().ok_or(StageError::NotCreated { stage: NAME })?;
        let Some(target) = self.target.get() else {
            return Ok(StageOutcome::Skipped);
        };
        if ctx.scene.viewport.is_empty() {
            return Ok(StageOutcome::Skipped);
        }

        let forward = objects.forward.pipeline()?;
        let skybox = match (&mut objects.skybox, ctx.scene.skybox()) {
            (Some(state), Some(item)) => Some((state.pipeline()?, item.cubemap)),
            _ => None,
        };
        let shadow = ctx
            .resources
            .get::<ShadowMap>()
            .copied()
            .zip(ctx.resources.get::<ShadowSampler>().copied());
        let binding = target.binding();

        let list = recorder.primary();
        list.push_debug_group("scene color");
        list.begin_render_pass(&binding);
        list.set_viewport(Viewport::covering(binding.area));
        list.set_pipeline(forward);
        if let Some((map, sampler)) = shadow {
            list.bind_texture(SHADOW_SLOT, map);
            list.bind_sampler(SHADOW_SLOT, sampler);
        }
        for draw in ctx.scene.draws() {
            list.draw(0..draw.vertex_count, 0..draw.instance_count);
        }
        if let Some((pipeline, cubemap)) = skybox {
            list.set_pipeline(pipeline);
            list.bind_texture(0, cubemap);
            list.draw(0..SKYBOX_VERTICES, 0..1);
        }
        list.end_render_pass();
        list.pop_debug_group();
        Ok(StageOutcome::Recorded)
    }

    fn on_changed(&mut self, ctx: &mut StageContext<'_>, event: &StageEvent) -> Result<(), StageError> {
        match event {
            StageEvent::ShaderReloaded { module } if self.uses(*module) => {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_stage::test_support::{commands, program, Harness, InlineRecorder};
    use lumen_core::math::Extent2D;
    use lumen_core::renderer::api::{
        DrawItem, MeshId, RenderItem, SamplerDescription, SkyboxItem, TextureDescription,
    };
    use lumen_core::renderer::traits::GpuBackend;
    use lumen_infra::headless::{Command, HeadlessObject};

    fn draw(mesh: u64) -> RenderItem {
        RenderItem::Draw(DrawItem {
            mesh: MeshId(mesh),
            vertex_count: 6,
            instance_count: 2,
            casts_shadow: false,
        })
    }

    #[test]
    fn test_publishes_viewport_sized_targets() {
        let mut h = Harness::new(Extent2D::new(320, 200));
        let mut stage = SceneColorStage::new(SceneColorConfig::new(program(1, 2)));
        stage.create(&mut h.ctx()).unwrap();
        stage.prepare(&mut h.ctx()).unwrap();

        let color = *h.resources.get::<SceneColor>().unwrap();
        let depth = *h.resources.get::<SceneDepth>().unwrap();
        assert_eq!(h.backend.texture_description(color).unwrap().size, Extent2D::new(320, 200));
        assert_eq!(
            h.backend.texture_description(depth).unwrap().format,
            TextureFormat::Depth32Float
        );
    }

    #[test]
    fn test_resize_rebuilds_target_but_not_pipeline() {
        let mut h = Harness::new(Extent2D::new(320, 200));
        let mut stage = SceneColorStage::new(SceneColorConfig::new(program(1, 2)));
        stage.create(&mut h.ctx()).unwrap();
        stage.prepare(&mut h.ctx()).unwrap();
        let misses = h.gpu.pipelines().stats().misses;

        h.scene.viewport = Extent2D::new(640, 400);
        stage.prepare(&mut h.ctx()).unwrap();
        stage.prepare(&mut h.ctx()).unwrap();

        assert_eq!(stage.target_rebuilds(), 1);
        assert_eq!(h.backend.created(HeadlessObject::Texture), 4);
        assert_eq!(h.backend.live(HeadlessObject::Texture), 2);
        assert_eq!(h.backend.created(HeadlessObject::Pipeline), 1);
        assert_eq!(h.gpu.pipelines().stats().misses, misses);
        let color = *h.resources.get::<SceneColor>().unwrap();
        assert_eq!(h.backend.texture_description(color).unwrap().size, Extent2D::new(640, 400));
    }

    #[test]
    fn test_records_draws_on_primary() {
        let mut h = Harness::new(Extent2D::new(320, 200));
        h.scene.render_list = vec![draw(1), draw(2), draw(3)];
        let mut stage = SceneColorStage::new(SceneColorConfig::new(program(1, 2)));
        stage.create(&mut h.ctx()).unwrap();
        stage.prepare(&mut h.ctx()).unwrap();

        let mut recorder = InlineRecorder::new(&h.backend);
        let outcome = stage.execute(&mut h.ctx(), &mut recorder).unwrap();

        assert_eq!(outcome, StageOutcome::Recorded);
        assert!(recorder.jobs.is_empty());
        let recorded = commands(recorder.primary.as_deref().unwrap());
        assert!(matches!(recorded.first(), Some(Command::PushDebugGroup(_))));
        let draws: Vec<_> = recorded
            .iter()
            .filter(|c| matches!(c, Command::Draw { .. }))
            .collect();
        assert_eq!(draws.len(), 3);
        assert!(!recorded.iter().any(|c| matches!(c, Command::BindSampler { .. })));
    }

    #[test]
    fn test_binds_published_shadow_map() {
        let mut h = Harness::new(Extent2D::new(320, 200));
        let map = h
            .backend
            .create_texture(&TextureDescription::attachment(
                "shadow",
                Extent2D::new(64, 64),
                TextureFormat::Depth32Float,
            ))
            .unwrap();
        let sampler = h
            .backend
            .create_sampler(&SamplerDescription::default(), "shadow")
            .unwrap();
        h.resources.publish::<ShadowMap>(map);
        h.resources.publish::<ShadowSampler>(sampler);

        let mut stage = SceneColorStage::new(SceneColorConfig::new(program(1, 2)));
        stage.create(&mut h.ctx()).unwrap();
        stage.prepare(&mut h.ctx()).unwrap();
        let mut recorder = InlineRecorder::new(&h.backend);
        stage.execute(&mut h.ctx(), &mut recorder).unwrap();

        let recorded = commands(recorder.primary.as_deref().unwrap());
        assert!(recorded.contains(&Command::BindTexture {
            slot: SHADOW_SLOT,
            texture: map
        }));
        assert!(recorded.contains(&Command::BindSampler {
            slot: SHADOW_SLOT,
            sampler
        }));
    }

    #[test]
    fn test_skybox_uses_its_own_pipeline() {
        let mut h = Harness::new(Extent2D::new(320, 200));
        let cubemap = h
            .backend
            .create_texture(&TextureDescription::attachment(
                "sky",
                Extent2D::new(32, 32),
                TextureFormat::Rgba8Unorm,
            ))
            .unwrap();
        h.scene.render_list = vec![draw(1), RenderItem::Skybox(SkyboxItem { cubemap })];
        let config = SceneColorConfig {
            skybox_program: Some(program(3, 4)),
            ..SceneColorConfig::new(program(1, 2))
        };
        let mut stage = SceneColorStage::new(config);
        stage.create(&mut h.ctx()).unwrap();
        stage.prepare(&mut h.ctx()).unwrap();
        let mut recorder = InlineRecorder::new(&h.backend);
        stage.execute(&mut h.ctx(), &mut recorder).unwrap();

        let pipelines: Vec<_> = commands(recorder.primary.as_deref().unwrap())
            .into_iter()
            .filter_map(|c| match c {
                Command::SetPipeline(id) => Some(id),
                _ => None,
            })
            .collect();
        assert_eq!(pipelines.len(), 2);
        assert_ne!(pipelines[0], pipelines[1]);
        assert_eq!(h.backend.live(HeadlessObject::Pipeline), 2);
    }

    #[test]
    fn test_empty_viewport_skips() {
        let mut h = Harness::new(Extent2D::new(0, 0));
        let mut stage = SceneColorStage::new(SceneColorConfig::new(program(1, 2)));
        stage.create(&mut h.ctx()).unwrap();
        stage.prepare(&mut h.ctx()).unwrap();

        let mut recorder = InlineRecorder::new(&h.backend);
        let outcome = stage.execute(&mut h.ctx(), &mut recorder).unwrap();
        assert_eq!(outcome, StageOutcome::Skipped);
        assert!(!h.resources.contains::<SceneColor>());
        assert_eq!(h.backend.live(HeadlessObject::Texture), 0);
    }
}
