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

use std::fmt;

use crate::renderer::error::ResourceError;
use crate::renderer::traits::GpuBackend;

/// The four kinds of cached objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Graphics pipelines.
    Pipeline,
    /// Render passes.
    RenderPass,
    /// Framebuffers.
    Framebuffer,
    /// Samplers.
    Sampler,
}

impl ObjectKind {
    /// Lower-case name used in logs and errors.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Pipeline => "pipeline",
            ObjectKind::RenderPass => "render pass",
            ObjectKind::Framebuffer => "framebuffer",
            ObjectKind::Sampler => "sampler",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value that fully determines an immutable GPU object.
///
/// Equal descriptions must produce equal hashes. Unequal descriptions may
/// collide; the cache keeps them apart by comparing descriptions.
pub trait Description: Clone + Eq + fmt::Debug + Send + Sync + 'static {
    /// Handle of the backend object built from the description.
    type Object: Copy + Eq + fmt::Debug + Send + Sync + 'static;

    /// Kind reported in logs, errors, and observer events.
    const KIND: ObjectKind;

    /// Cache key of the description.
    fn content_hash(&self) -> u64;

    /// Creates the backend object.
    fn allocate(&self, backend: &dyn GpuBackend, label: &str) -> Result<Self::Object, ResourceError>;

    /// Destroys the backend object.
    fn destroy(object: Self::Object, backend: &dyn GpuBackend) -> Result<(), ResourceError>;
}
