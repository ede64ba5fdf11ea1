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

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

use lumen_core::renderer::{
    CommandList, CommandListId, FramebufferDescription, FramebufferId, GpuBackend,
    PipelineDescription, PipelineId, RenderError, RenderPassDescription, RenderPassId,
    ResourceError, SamplerDescription, SamplerId, TextureDescription, TextureId,
};

use super::command::{Command, HeadlessCommandList};

/// Kinds of objects a [`HeadlessBackend`] tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeadlessObject {
    /// Graphics pipelines.
    Pipeline,
    /// Render passes.
    RenderPass,
    /// Framebuffers.
    Framebuffer,
    /// Samplers.
    Sampler,
    /// Textures.
    Texture,
}

impl HeadlessObject {
    const ALL: [HeadlessObject; 5] = [
        HeadlessObject::Pipeline,
        HeadlessObject::RenderPass,
        HeadlessObject::Framebuffer,
        HeadlessObject::Sampler,
        HeadlessObject::Texture,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            HeadlessObject::Pipeline => "pipeline",
            HeadlessObject::RenderPass => "render pass",
            HeadlessObject::Framebuffer => "framebuffer",
            HeadlessObject::Sampler => "sampler",
            HeadlessObject::Texture => "texture",
        }
    }
}

/// A command list as it was handed to [`GpuBackend::submit`].
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// Backend id of the list.
    pub list: CommandListId,
    /// Label of the list at submission time.
    pub label: String,
    /// Recorded commands.
    pub commands: Vec<Command>,
}

#[derive(Debug, Default)]
struct ObjectCounters {
    created: AtomicU64,
    destroyed: AtomicU64,
}

/// An in-memory [`GpuBackend`].
pub struct HeadlessBackend {
    pipelines: Mutex<HashMap<PipelineId, PipelineDescription>>,
    render_passes: Mutex<HashMap<RenderPassId, RenderPassDescription>>,
    framebuffers: Mutex<HashMap<FramebufferId, FramebufferDescription>>,
    samplers: Mutex<HashMap<SamplerId, SamplerDescription>>,
    textures: Mutex<HashMap<TextureId, TextureDescription>>,

    next_object_id: AtomicU64,
    next_list_id: AtomicU64,
    counters: [ObjectCounters; 5],
    lists_created: AtomicU64,

    pending_failures: Mutex<HashMap<HeadlessObject, u32>>,
    device_lost: AtomicBool,
    submissions: Mutex<Vec<Submission>>,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    /// Creates a backend with no objects.
    pub fn new() -> Self {
        Self {
            pipelines: Mutex::new(HashMap::new()),
            render_passes: Mutex::new(HashMap::new()),
            framebuffers: Mutex::new(HashMap::new()),
            samplers: Mutex::new(HashMap::new()),
            textures: Mutex::new(HashMap::new()),
            next_object_id: AtomicU64::new(1),
            next_list_id: AtomicU64::new(1),
            counters: Default::default(),
            lists_created: AtomicU64::new(0),
            pending_failures: Mutex::new(HashMap::new()),
            device_lost: AtomicBool::new(false),
            submissions: Mutex::new(Vec::new()),
        }
    }

    // --- Test and diagnostics controls ---

    /// Makes the next `count` creations of `kind` fail.
    pub fn fail_next(&self, kind: HeadlessObject, count: u32) {
        *self.pending_failures.lock().entry(kind).or_default() += count;
    }

    /// Makes every later submission fail with [`RenderError::DeviceLost`].
    pub fn lose_device(&self) {
        log::warn!("HeadlessBackend: device marked as lost");
        self.device_lost.store(true, Ordering::Release);
    }

    /// Number of objects of `kind` ever created.
    pub fn created(&self, kind: HeadlessObject) -> u64 {
        self.counters[kind.index()].created.load(Ordering::Acquire)
    }

    /// Number of objects of `kind` destroyed.
    pub fn destroyed(&self, kind: HeadlessObject) -> u64 {
        self.counters[kind.index()].destroyed.load(Ordering::Acquire)
    }

    /// Number of objects of `kind` currently alive.
    pub fn live(&self, kind: HeadlessObject) -> usize {
        match kind {
            HeadlessObject::Pipeline => self.pipelines.lock().len(),
            HeadlessObject::RenderPass => self.render_passes.lock().len(),
            HeadlessObject::Framebuffer => self.framebuffers.lock().len(),
            HeadlessObject::Sampler => self.samplers.lock().len(),
            HeadlessObject::Texture => self.textures.lock().len(),
        }
    }

    /// Total number of live objects of every kind.
    pub fn live_total(&self) -> usize {
        HeadlessObject::ALL.iter().map(|k| self.live(*k)).sum()
    }

    /// Number of command lists allocated.
    pub fn command_lists_created(&self) -> u64 {
        self.lists_created.load(Ordering::Acquire)
    }

    /// Description of a live pipeline.
    pub fn pipeline_description(&self, id: PipelineId) -> Option<PipelineDescription> {
        self.pipelines.lock().get(&id).copied()
    }

    /// Description of a live texture.
    pub fn texture_description(&self, id: TextureId) -> Option<TextureDescription> {
        self.textures.lock().get(&id).cloned()
    }

    /// Every submission so far, in order.
    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().clone()
    }

    /// Labels of every submitted list, in order.
    pub fn submitted_labels(&self) -> Vec<String> {
        self.submissions.lock().iter().map(|s| s.label.clone()).collect()
    }

    /// Forgets recorded submissions.
    pub fn clear_submissions(&self) {
        self.submissions.lock().clear();
    }

    // --- Internals ---

    fn check_failure(&self, kind: HeadlessObject, label: &str) -> Result<(), ResourceError> {
        let mut failures = self.pending_failures.lock();
        if let Some(remaining) = failures.get_mut(&kind) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ResourceError::AllocationFailed {
                    kind: kind.name(),
                    label: label.to_owned(),
                    reason: "injected failure".to_owned(),
                });
            }
        }
        Ok(())
    }

    fn insert<K, V>(
        &self,
        kind: HeadlessObject,
        label: &str,
        table: &Mutex<HashMap<K, V>>,
        make_id: impl FnOnce(u64) -> K,
        value: V,
    ) -> Result<K, ResourceError>
    where
        K: Copy + Eq + Hash + fmt::Debug,
    {
        self.check_failure(kind, label)?;
        let id = make_id(self.next_object_id.fetch_add(1, Ordering::Relaxed));
        table.lock().insert(id, value);
        self.counters[kind.index()].created.fetch_add(1, Ordering::AcqRel);
        log::trace!("HeadlessBackend: created {} '{label}' ({id:?})", kind.name());
        Ok(id)
    }

    fn remove<K, V>(
        &self,
        kind: HeadlessObject,
        table: &Mutex<HashMap<K, V>>,
        id: K,
        raw: u64,
    ) -> Result<(), ResourceError>
    where
        K: Copy + Eq + Hash + fmt::Debug,
    {
        if table.lock().remove(&id).is_some() {
            self.counters[kind.index()].destroyed.fetch_add(1, Ordering::AcqRel);
            log::trace!("HeadlessBackend: destroyed {} {id:?}", kind.name());
            Ok(())
        } else {
            log::warn!("HeadlessBackend: destroy of unknown {} {id:?}", kind.name());
            Err(ResourceError::InvalidHandle {
                kind: kind.name(),
                id: raw,
            })
        }
    }

    fn validate(&self, commands: &[Command]) -> Result<(), String> {
        for command in commands {
            match command {
                Command::BeginRenderPass(binding) => {
                    if !self.render_passes.lock().contains_key(&binding.render_pass) {
                        return Err(format!("render pass {:?} is not alive", binding.render_pass));
                    }
                    if !self.framebuffers.lock().contains_key(&binding.framebuffer) {
                        return Err(format!("framebuffer {:?} is not alive", binding.framebuffer));
                    }
                }
                Command::SetPipeline(id) => {
                    if !self.pipelines.lock().contains_key(id) {
                        return Err(format!("pipeline {id:?} is not alive"));
                    }
                }
                Command::BindTexture { texture, .. } => {
                    if !self.textures.lock().contains_key(texture) {
                        return Err(format!("texture {texture:?} is not alive"));
                    }
                }
                Command::BindSampler { sampler, .. } => {
                    if !self.samplers.lock().contains_key(sampler) {
                        return Err(format!("sampler {sampler:?} is not alive"));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl fmt::Debug for HeadlessBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessBackend")
            .field("live_objects", &self.live_total())
            .field("submissions", &self.submissions.lock().len())
            .finish()
    }
}

impl GpuBackend for HeadlessBackend {
    fn create_pipeline(
        &self,
        descriptor: &PipelineDescription,
        label: &str,
    ) -> Result<PipelineId, ResourceError> {
        self.insert(HeadlessObject::Pipeline, label, &self.pipelines, PipelineId, *descriptor)
    }

    fn destroy_pipeline(&self, id: PipelineId) -> Result<(), ResourceError> {
        self.remove(HeadlessObject::Pipeline, &self.pipelines, id, id.0)
    }

    fn create_render_pass(
        &self,
        descriptor: &RenderPassDescription,
        label: &str,
    ) -> Result<RenderPassId, ResourceError> {
        self.insert(HeadlessObject::RenderPass, label, &self.render_passes, RenderPassId, *descriptor)
    }

    fn destroy_render_pass(&self, id: RenderPassId) -> Result<(), ResourceError> {
        self.remove(HeadlessObject::RenderPass, &self.render_passes, id, id.0)
    }

    fn create_framebuffer(
        &self,
        descriptor: &FramebufferDescription,
        label: &str,
    ) -> Result<FramebufferId, ResourceError> {
        let expected = self
            .render_passes
            .lock()
            .get(&descriptor.render_pass)
            .map(|pass| pass.attachment_count())
            .ok_or(ResourceError::InvalidHandle {
                kind: HeadlessObject::RenderPass.name(),
                id: descriptor.render_pass.0,
            })?;
        if expected != descriptor.attachments.len() {
            return Err(ResourceError::AllocationFailed {
                kind: HeadlessObject::Framebuffer.name(),
                label: label.to_owned(),
                reason: format!(
                    "render pass expects {expected} attachment(s), got {}",
                    descriptor.attachments.len()
                ),
            });
        }
        {
            let textures = self.textures.lock();
            if let Some(missing) = descriptor
                .attachments
                .iter()
                .find(|a| !textures.contains_key(&a.texture))
            {
                return Err(ResourceError::InvalidHandle {
                    kind: HeadlessObject::Texture.name(),
                    id: missing.texture.0,
                });
            }
        }
        self.insert(
            HeadlessObject::Framebuffer,
            label,
            &self.framebuffers,
            FramebufferId,
            descriptor.clone(),
        )
    }

    fn destroy_framebuffer(&self, id: FramebufferId) -> Result<(), ResourceError> {
        self.remove(HeadlessObject::Framebuffer, &self.framebuffers, id, id.0)
    }

    fn create_sampler(
        &self,
        descriptor: &SamplerDescription,
        label: &str,
    ) -> Result<SamplerId, ResourceError> {
        self.insert(HeadlessObject::Sampler, label, &self.samplers, SamplerId, *descriptor)
    }

    fn destroy_sampler(&self, id: SamplerId) -> Result<(), ResourceError> {
        self.remove(HeadlessObject::Sampler, &self.samplers, id, id.0)
    }

    fn create_texture(&self, descriptor: &TextureDescription) -> Result<TextureId, ResourceError> {
        if descriptor.size.is_empty() {
            return Err(ResourceError::AllocationFailed {
                kind: HeadlessObject::Texture.name(),
                label: descriptor.label.clone(),
                reason: "zero-sized texture".to_owned(),
            });
        }
        self.insert(
            HeadlessObject::Texture,
            &descriptor.label,
            &self.textures,
            TextureId,
            descriptor.clone(),
        )
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        self.remove(HeadlessObject::Texture, &self.textures, id, id.0)
    }

    fn create_command_list(&self, label: &str) -> Box<dyn CommandList> {
        let id = CommandListId(self.next_list_id.fetch_add(1, Ordering::Relaxed));
        self.lists_created.fetch_add(1, Ordering::AcqRel);
        Box::new(HeadlessCommandList::new(id, label))
    }

    fn submit(&self, list: &mut dyn CommandList) -> Result<(), RenderError> {
        if self.device_lost.load(Ordering::Acquire) {
            return Err(RenderError::DeviceLost);
        }
        let id = list.id();
        let label = list.label().to_owned();
        let Some(headless) = list.as_any_mut().downcast_mut::<HeadlessCommandList>() else {
            return Err(RenderError::SubmissionFailed(format!(
                "command list '{label}' was not created by the headless backend"
            )));
        };
        if headless.has_open_pass() {
            return Err(RenderError::SubmissionFailed(format!(
                "command list '{label}' has an unterminated render pass"
            )));
        }

        let commands = headless.take_commands();
        self.validate(&commands)
            .map_err(|reason| RenderError::SubmissionFailed(format!("'{label}': {reason}")))?;

        log::trace!("HeadlessBackend: submitted '{label}' with {} command(s)", commands.len());
        self.submissions.lock().push(Submission {
            list: id,
            label,
            commands,
        });
        Ok(())
    }
}
