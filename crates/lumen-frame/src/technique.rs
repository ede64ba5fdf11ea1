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

//! An ordered list of stages rendered into one frame.

use std::sync::Arc;
use std::time::Instant;

use lumen_core::cache::GpuContext;
use lumen_core::renderer::SceneState;
use lumen_core::stage::{
    ResourceKey, ResourceSlot, ResourceTable, Stage, StageContext, StageEvent, StageOutcome,
    StageState,
};

use crate::dispatcher::{DispatcherConfig, JobDispatcher};
use crate::error::TechniqueError;
use crate::stats::FrameStats;
use crate::task::WorkerPool;

struct StageEntry {
    stage: Box<dyn Stage>,
    state: StageState,
}

impl StageEntry {
    fn is_live(&self) -> bool {
        matches!(
            self.state,
            StageState::Created | StageState::Prepared | StageState::Executed
        )
    }

    fn check_state(&self, allowed: &[StageState], operation: &'static str) -> Result<(), TechniqueError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            log::error!(
                "Stage '{}' cannot {operation} while {}",
                self.stage.name(),
                self.state
            );
            Err(TechniqueError::InvalidTransition {
                stage: self.stage.name(),
                from: self.state,
                operation,
            })
        }
    }
}

/// Runs registered stages in order and submits what they record.
///
/// Stages communicate only through the technique's [`ResourceTable`]. A
/// stage may read a resource only if an earlier stage writes it, or if it was
/// declared as an [external input](Technique::declare_external).
pub struct Technique {
    name: String,
    gpu: Arc<GpuContext>,
    stages: Vec<StageEntry>,
    external: Vec<ResourceSlot>,
    resources: ResourceTable,
    dispatcher: JobDispatcher,
    stats: FrameStats,
}

impl Technique {
    /// Creates an empty technique.
    pub fn new(
        name: impl Into<String>,
        gpu: Arc<GpuContext>,
        pool: Arc<WorkerPool>,
        config: DispatcherConfig,
    ) -> Self {
        let dispatcher = JobDispatcher::new(Arc::clone(gpu.backend()), pool, config);
        Self {
            name: name.into(),
            gpu,
            stages: Vec::new(),
            external: Vec::new(),
            resources: ResourceTable::new(),
            dispatcher,
            stats: FrameStats::default(),
        }
    }

    /// Name of the technique.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declares that `K` is published from outside the technique.
    pub fn declare_external<K: ResourceKey>(&mut self) {
        let slot = ResourceSlot::of::<K>();
        if !self.external.contains(&slot) {
            self.external.push(slot);
        }
    }

    /// Appends a stage.
    ///
    /// Every resource the stage reads must be written by an already
    /// registered stage or declared external.
    pub fn add_stage(&mut self, stage: Box<dyn Stage>) -> Result<(), TechniqueError> {
        let name = stage.name();
        if self.stages.iter().any(|e| e.stage.name() == name) {
            return Err(TechniqueError::DuplicateStage { stage: name });
        }

        for read in stage.reads() {
            let produced = self.external.contains(&read)
                || self
                    .stages
                    .iter()
                    .any(|e| e.stage.writes().contains(&read));
            if !produced {
                log::error!(
                    "Technique '{}': stage '{name}' reads '{}' with no producer",
                    self.name,
                    read.name()
                );
                return Err(TechniqueError::MissingProducer {
                    stage: name,
                    resource: read.name(),
                });
            }
        }

        log::debug!("Technique '{}': registered stage '{name}'", self.name);
        self.stages.push(StageEntry {
            stage,
            state: StageState::Uninitialized,
        });
        Ok(())
    }

    /// Creates every stage that is not live yet, in registration order.
    pub fn create(&mut self, scene: &SceneState) -> Result<(), TechniqueError> {
        for entry in &mut self.stages {
            if entry.is_live() {
                continue;
            }
            let mut ctx = StageContext {
                gpu: &self.gpu,
                scene,
                resources: &mut self.resources,
            };
            entry
                .stage
                .create(&mut ctx)
                .map_err(|source| TechniqueError::Stage {
                    stage: entry.stage.name(),
                    source,
                })?;
            entry.state = StageState::Created;
            log::trace!("Stage '{}' created", entry.stage.name());
        }
        log::info!(
            "Technique '{}' created with {} stage(s)",
            self.name,
            self.stages.len()
        );
        Ok(())
    }

    /// Starts a new frame: resets the frame statistics, drops frame resources and prepares every stage in order.
    pub fn prepare(&mut self, scene: &SceneState) -> Result<(), TechniqueError> {
        self.stats = FrameStats {
            frame_index: scene.frame_index,
            ..Default::default()
        };
        self.resources.begin_frame();
        for entry in &mut self.stages {
            entry.check_state(
                &[StageState::Created, StageState::Prepared, StageState::Executed],
                "prepare",
            )?;
            let mut ctx = StageContext {
                gpu: &self.gpu,
                scene,
                resources: &mut self.resources,
            };
            entry
                .stage
                .prepare(&mut ctx)
                .map_err(|source| TechniqueError::Stage {
                    stage: entry.stage.name(),
                    source,
                })?;
            entry.state = StageState::Prepared;
        }
        Ok(())
    }

    /// Executes every stage in order, collecting their recording.
    pub fn execute(&mut self, scene: &SceneState) -> Result<(), TechniqueError> {
        for entry in &mut self.stages {
            entry.check_state(&[StageState::Prepared], "execute")?;
            let mut ctx = StageContext {
                gpu: &self.gpu,
                scene,
                resources: &mut self.resources,
            };
            let outcome = entry
                .stage
                .execute(&mut ctx, &mut self.dispatcher)
                .map_err(|source| TechniqueError::Stage {
                    stage: entry.stage.name(),
                    source,
                })?;
            entry.state = StageState::Executed;
            match outcome {
                StageOutcome::Skipped => self.stats.stages_skipped += 1,
                StageOutcome::Recorded | StageOutcome::Enqueued => self.stats.stages_executed += 1,
            }
        }
        Ok(())
    }

    /// Waits for recording jobs and submits every list in order.
    pub fn submit(&mut self) -> Result<FrameStats, TechniqueError> {
        let summary = self.dispatcher.submit()?;
        self.stats.inline_lists = summary.inline_lists;
        self.stats.jobs = summary.jobs;
        self.stats.lists_submitted = summary.submitted;
        self.stats.lists_allocated = summary.lists_allocated;
        self.stats.wait_time = summary.wait_time;
        Ok(self.stats.clone())
    }

    /// Prepares, executes, and submits one frame.
    ///
    /// If preparation or execution fails, already issued work is discarded.
    pub fn render_frame(&mut self, scene: &SceneState) -> Result<FrameStats, TechniqueError> {
        let started = Instant::now();
        if let Err(err) = self.prepare(scene).and_then(|()| self.execute(scene)) {
            self.dispatcher.discard();
            return Err(err);
        }
        let mut stats = self.submit()?;
        stats.cpu_time = started.elapsed();
        self.stats.cpu_time = stats.cpu_time;

        log::trace!(
            "Technique '{}' frame {}: {} stage(s), {} skipped, {} job(s), {} list(s)",
            self.name,
            stats.frame_index,
            stats.stages_executed,
            stats.stages_skipped,
            stats.jobs,
            stats.lists_submitted
        );
        Ok(stats)
    }

    /// Forwards `event` to every live stage in order.
    pub fn notify(&mut self, scene: &SceneState, event: &StageEvent) -> Result<(), TechniqueError> {
        log::debug!("Technique '{}': {event:?}", self.name);
        for entry in &mut self.stages {
            if !entry.is_live() {
                continue;
            }
            let mut ctx = StageContext {
                gpu: &self.gpu,
                scene,
                resources: &mut self.resources,
            };
            let result = entry.stage.on_changed(&mut ctx, event);
            let rebuilt = matches!(event, StageEvent::ShaderReloaded { .. });
            if let Err(source) = result {
                if rebuilt {
                    entry.state = StageState::Destroyed;
                }
                return Err(TechniqueError::Stage {
                    stage: entry.stage.name(),
                    source,
                });
            }
            if rebuilt {
                entry.state = StageState::Created;
            }
        }
        Ok(())
    }

    /// Discards pending work and destroys every live stage in registration order.
    pub fn destroy(&mut self, scene: &SceneState) {
        self.dispatcher.discard();
        for entry in &mut self.stages {
            if !entry.is_live() {
                continue;
            }
            let mut ctx = StageContext {
                gpu: &self.gpu,
                scene,
                resources: &mut self.resources,
            };
            entry.stage.destroy(&mut ctx);
            entry.state = StageState::Destroyed;
            log::trace!("Stage '{}' destroyed", entry.stage.name());
        }
        self.resources.clear();
        log::info!("Technique '{}' destroyed", self.name);
    }

    /// Lifecycle state of the stage called `name`.
    pub fn stage_state(&self, name: &str) -> Option<StageState> {
        self.stages
            .iter()
            .find(|e| e.stage.name() == name)
            .map(|e| e.state)
    }

    /// The first stage of type `T`.
    pub fn stage<T: Stage + 'static>(&self) -> Option<&T> {
        self.stages
            .iter()
            .find_map(|e| e.stage.as_any().downcast_ref::<T>())
    }

    /// Names of the stages in registration order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|e| e.stage.name()).collect()
    }

    /// Published resources.
    pub fn resources(&self) -> &ResourceTable {
        &self.resources
    }

    /// Published resources, for feeding external inputs.
    pub fn resources_mut(&mut self) -> &mut ResourceTable {
        &mut self.resources
    }

    /// Counters of the last frame.
    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// The dispatcher collecting recorded lists.
    pub fn dispatcher(&self) -> &JobDispatcher {
        &self.dispatcher
    }
}

impl Drop for Technique {
    fn drop(&mut self) {
        let live = self.stages.iter().filter(|e| e.is_live()).count();
        if live > 0 {
            log::warn!(
                "Technique '{}' dropped with {live} live stage(s); call destroy() first",
                self.name
            );
        }
    }
}
