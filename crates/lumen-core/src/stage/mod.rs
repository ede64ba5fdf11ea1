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

//! # Stage Abstraction
//!
//! A **Stage** is one step of a frame technique: it owns its render targets
//! and cached-object owners, publishes outputs into a [`ResourceTable`], and
//! records GPU work either directly or through recording jobs.
//!
//! A technique drives every stage through the same lifecycle:
//!
//! 1. `create` once, allocating long-lived objects.
//! 2. `prepare` then `execute` every frame, in registration order.
//! 3. `on_changed` when a shader, the viewport, or the settings change.
//! 4. `destroy` once at teardown.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

pub mod keys;
mod resources;

pub use self::resources::*;

use crate::cache::{CacheError, GpuContext};
use crate::math::Extent2D;
use crate::renderer::api::{SceneState, ShaderModuleId};
use crate::renderer::error::{RenderError, ResourceError};
use crate::renderer::traits::CommandList;

/// Error type for stage operations.
#[derive(Debug)]
pub enum StageError {
    /// A resource the stage reads was never published.
    MissingResource {
        /// Name of the resource key.
        name: &'static str,
    },
    /// The stage was used before `create` or after `destroy`.
    NotCreated {
        /// Name of the stage.
        stage: &'static str,
    },
    /// A GPU object could not be created or used.
    Render(RenderError),
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageError::MissingResource { name } => {
                write!(f, "Required resource '{name}' is missing")
            }
            StageError::NotCreated { stage } => {
                write!(f, "Stage '{stage}' has not been created")
            }
            StageError::Render(e) => write!(f, "Render error: {e}"),
        }
    }
}

impl std::error::Error for StageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StageError::Render(e) => Some(e),
            StageError::MissingResource { .. } | StageError::NotCreated { .. } => None,
        }
    }
}

impl From<RenderError> for StageError {
    fn from(err: RenderError) -> Self {
        StageError::Render(err)
    }
}

impl From<CacheError> for StageError {
    fn from(err: CacheError) -> Self {
        StageError::Render(RenderError::Cache(err))
    }
}

impl From<ResourceError> for StageError {
    fn from(err: ResourceError) -> Self {
        StageError::Render(RenderError::Resource(err))
    }
}

/// A change reported to every created stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageEvent {
    /// A shader module was recompiled.
    ShaderReloaded {
        /// The module that changed.
        module: ShaderModuleId,
    },
    /// The output size changed. Targets are resized on the next `prepare`.
    ViewportResized(Extent2D),
    /// Render settings were edited.
    SettingsChanged,
}

/// What a stage did during `execute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// Commands were recorded on the primary list.
    Recorded,
    /// A recording job was enqueued.
    Enqueued,
    /// Nothing to do this frame.
    Skipped,
}

/// Lifecycle position of a stage inside a technique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageState {
    /// Registered, never created.
    Uninitialized,
    /// Created, not yet prepared for a frame.
    Created,
    /// Prepared for the current frame.
    Prepared,
    /// Executed for the current frame.
    Executed,
    /// Destroyed. May be created again.
    Destroyed,
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageState::Uninitialized => "uninitialized",
            StageState::Created => "created",
            StageState::Prepared => "prepared",
            StageState::Executed => "executed",
            StageState::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// Work recorded on a worker thread into its own command list.
pub type RecordingWork = Box<dyn FnOnce(&mut dyn CommandList) + Send + 'static>;

/// Where stages put their GPU work during `execute`.
///
/// Work recorded on [`primary`](FrameRecorder::primary) and jobs passed to
/// [`enqueue`](FrameRecorder::enqueue) are submitted in the order they were
/// issued, whichever thread finishes first.
pub trait FrameRecorder {
    /// The inline command list on the control thread.
    fn primary(&mut self) -> &mut dyn CommandList;

    /// Records `work` on a worker thread into a fresh command list.
    ///
    /// The closure must only capture plain handles and values, never caches
    /// or owners.
    fn enqueue(&mut self, label: &'static str, work: RecordingWork);
}

/// Everything a stage can see while it runs.
pub struct StageContext<'a> {
    /// Backend and object caches.
    pub gpu: &'a Arc<GpuContext>,
    /// The frame being rendered.
    pub scene: &'a SceneState,
    /// Resources published by earlier stages.
    pub resources: &'a mut ResourceTable,
}

/// One step of a frame technique.
pub trait Stage: Send {
    /// Unique name of the stage, used in logs and errors.
    fn name(&self) -> &'static str;

    /// Resources the stage reads. Each must be written by an earlier stage.
    fn reads(&self) -> Vec<ResourceSlot> {
        Vec::new()
    }

    /// Resources the stage publishes.
    fn writes(&self) -> Vec<ResourceSlot> {
        Vec::new()
    }

    /// Allocates long-lived objects.
    fn create(&mut self, ctx: &mut StageContext<'_>) -> Result<(), StageError>;

    /// Releases everything allocated in `create` and `prepare`.
    fn destroy(&mut self, ctx: &mut StageContext<'_>);

    /// Brings targets up to date with the scene and publishes outputs.
    fn prepare(&mut self, ctx: &mut StageContext<'_>) -> Result<(), StageError>;

    /// Records the stage's GPU work.
    fn execute(
        &mut self,
        ctx: &mut StageContext<'_>,
        recorder: &mut dyn FrameRecorder,
    ) -> Result<StageOutcome, StageError>;

    /// Reacts to a change. A shader reload rebuilds the stage by default.
    fn on_changed(&mut self, ctx: &mut StageContext<'_>, event: &StageEvent) -> Result<(), StageError> {
        match event {
            StageEvent::ShaderReloaded { .. } => {
                self.destroy(ctx);
                self.create(ctx)
            }
            StageEvent::ViewportResized(_) | StageEvent::SettingsChanged => Ok(()),
        }
    }

    /// Allows downcasting to the concrete stage type.
    fn as_any(&self) -> &dyn Any;
}
