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

// Lumen Sandbox
// Runs the forward technique on the headless backend and reports cache usage.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use lumen_core::math::Extent2D;
use lumen_core::renderer::{
    DrawItem, LightItem, LightKind, MeshId, RenderItem, RenderSettings, SceneState,
    ShaderModuleId, ShaderProgramDescription,
};
use lumen_core::{GpuContext, StageEvent};
use lumen_frame::{DispatcherConfig, Technique, WorkerPool};
use lumen_infra::HeadlessBackend;
use lumen_stages::{
    CompositionConfig, CompositionStage, SceneColorConfig, SceneColorStage, ShadowStage,
    ShadowStageConfig,
};
use serde::Deserialize;

const SHADOW_VS: ShaderModuleId = ShaderModuleId(1);
const SHADOW_FS: ShaderModuleId = ShaderModuleId(2);
const FORWARD_VS: ShaderModuleId = ShaderModuleId(3);
const FORWARD_FS: ShaderModuleId = ShaderModuleId(4);
const FULLSCREEN_VS: ShaderModuleId = ShaderModuleId(5);
const COMPOSITE_FS: ShaderModuleId = ShaderModuleId(6);

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SandboxConfig {
    frames: u64,
    resize_at: Option<u64>,
    resize_to: Extent2D,
    reload_at: Option<u64>,
    meshes: u32,
    render: RenderSettings,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            frames: 120,
            resize_at: Some(60),
            resize_to: Extent2D::new(1920, 1080),
            reload_at: None,
            meshes: 32,
            render: RenderSettings::default(),
        }
    }
}

impl SandboxConfig {
    fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        ron::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

fn build_scene(config: &SandboxConfig) -> SceneState {
    let mut scene = SceneState::new(config.render.viewport);
    scene.render_list.push(RenderItem::Light(LightItem {
        kind: LightKind::Directional,
        color: [1.0, 0.95, 0.9],
        intensity: 4.0,
        casts_shadow: true,
    }));
    scene.render_list.extend((0..config.meshes).map(|i| {
        RenderItem::Draw(DrawItem {
            mesh: MeshId(u64::from(i)),
            vertex_count: 36,
            instance_count: 1 + i % 4,
            casts_shadow: i % 3 != 0,
        })
    }));
    scene
}

fn build_technique(gpu: &Arc<GpuContext>, settings: &RenderSettings) -> Result<Technique> {
    let pool = Arc::new(WorkerPool::new(settings.worker_count())?);
    let mut technique = Technique::new(
        "forward",
        Arc::clone(gpu),
        pool,
        DispatcherConfig::from(settings),
    );
    technique.add_stage(Box::new(ShadowStage::new(ShadowStageConfig::new(
        ShaderProgramDescription::new(SHADOW_VS, SHADOW_FS),
    ))))?;
    technique.add_stage(Box::new(SceneColorStage::new(SceneColorConfig::new(
        ShaderProgramDescription::new(FORWARD_VS, FORWARD_FS),
    ))))?;
    technique.add_stage(Box::new(CompositionStage::new(CompositionConfig::new(
        ShaderProgramDescription::new(FULLSCREEN_VS, COMPOSITE_FS),
    ))))?;
    Ok(technique)
}

fn run(config: &SandboxConfig) -> Result<()> {
    let backend = Arc::new(HeadlessBackend::new());
    let gpu = GpuContext::new(backend.clone(), &config.render);
    let mut technique = build_technique(&gpu, &config.render)?;
    let mut scene = build_scene(config);

    technique.create(&scene)?;

    let mut jobs = 0;
    let mut lists = 0;
    let mut wait = Duration::ZERO;
    for frame in 0..config.frames {
        scene.frame_index = frame;
        if config.resize_at == Some(frame) {
            scene.viewport = config.resize_to;
            technique.notify(&scene, &StageEvent::ViewportResized(config.resize_to))?;
        }
        if config.reload_at == Some(frame) {
            technique.notify(&scene, &StageEvent::ShaderReloaded { module: FORWARD_FS })?;
        }

        let stats = technique.render_frame(&scene)?;
        jobs += stats.jobs;
        lists += stats.lists_submitted;
        wait += stats.wait_time;
        if frame % 60 == 0 {
            log::info!(
                "Frame {frame}: {} stage(s), {} job(s), {} list(s), cpu {:?}",
                stats.stages_executed,
                stats.jobs,
                stats.lists_submitted,
                stats.cpu_time
            );
        }
    }

    technique.destroy(&scene);
    let report = gpu.report();
    gpu.shutdown();

    log::info!(
        "{} frame(s): {jobs} job(s), {lists} list(s) submitted, {wait:?} waiting",
        config.frames
    );
    log::info!("Pipelines: {:?}", report.pipelines);
    log::info!("Render passes: {:?}", report.render_passes);
    log::info!("Framebuffers: {:?}", report.framebuffers);
    log::info!("Samplers: {:?}", report.samplers);
    log::info!(
        "Command lists created: {}, objects still alive: {}",
        backend.command_lists_created(),
        backend.live_total()
    );
    Ok(())
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => SandboxConfig::load(Path::new(&path))?,
        None => SandboxConfig::default(),
    };
    log::info!("Sandbox starting with {config:?}");
    run(&config)
}
