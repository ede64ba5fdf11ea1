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

//! Sampler descriptions.

use bytemuck::NoUninit;

use crate::cache::{hash_pod, Description, ObjectKind};
use crate::renderer::api::{BorderColor, CompareFunction, SamplerAnisotropy, SamplerFilter, SamplerId, SamplerWrap};
use crate::renderer::error::ResourceError;
use crate::renderer::traits::GpuBackend;

/// Full sampling state. Two equal descriptions always map to one sampler object.
///
/// The LOD bias is stored as raw `f32` bits so the description keeps exact
/// equality and a padding-free byte image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, NoUninit)]
#[repr(C)]
pub struct SamplerDescription {
    /// Texel filtering.
    pub filter: SamplerFilter,
    /// Addressing along U.
    pub wrap_u: SamplerWrap,
    /// Addressing along V.
    pub wrap_v: SamplerWrap,
    /// Addressing along W.
    pub wrap_w: SamplerWrap,
    /// Maximum anisotropy.
    pub anisotropy: SamplerAnisotropy,
    /// Enables depth comparison sampling.
    pub compare_enabled: bool,
    /// Comparison used when `compare_enabled` is set.
    pub compare: CompareFunction,
    /// Border color for [`SamplerWrap::ClampToBorder`].
    pub border_color: BorderColor,
    lod_bias_bits: u32,
}

impl Default for SamplerDescription {
    fn default() -> Self {
        Self {
            filter: SamplerFilter::default(),
            wrap_u: SamplerWrap::default(),
            wrap_v: SamplerWrap::default(),
            wrap_w: SamplerWrap::default(),
            anisotropy: SamplerAnisotropy::default(),
            compare_enabled: false,
            compare: CompareFunction::default(),
            border_color: BorderColor::default(),
            lod_bias_bits: 0.0f32.to_bits(),
        }
    }
}

impl SamplerDescription {
    /// Sets the same addressing mode on all three axes.
    pub fn with_wrap(mut self, wrap: SamplerWrap) -> Self {
        self.wrap_u = wrap;
        self.wrap_v = wrap;
        self.wrap_w = wrap;
        self
    }

    /// Sets the texel filter.
    pub fn with_filter(mut self, filter: SamplerFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Enables depth comparison with `compare`.
    pub fn with_compare(mut self, compare: CompareFunction) -> Self {
        self.compare_enabled = true;
        self.compare = compare;
        self
    }

    /// Returns the mip LOD bias.
    pub fn lod_bias(&self) -> f32 {
        f32::from_bits(self.lod_bias_bits)
    }

    /// Sets the mip LOD bias.
    pub fn set_lod_bias(&mut self, bias: f32) {
        // -0.0 and 0.0 must describe the same sampler.
        let bias = if bias == 0.0 { 0.0 } else { bias };
        self.lod_bias_bits = bias.to_bits();
    }
}

impl Description for SamplerDescription {
    type Object = SamplerId;
    const KIND: ObjectKind = ObjectKind::Sampler;

    fn content_hash(&self) -> u64 {
        hash_pod(self)
    }

    fn allocate(&self, backend: &dyn GpuBackend, label: &str) -> Result<SamplerId, ResourceError> {
        backend.create_sampler(self, label)
    }

    fn destroy(object: SamplerId, backend: &dyn GpuBackend) -> Result<(), ResourceError> {
        backend.destroy_sampler(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_descriptions_hash_equal() {
        let a = SamplerDescription::default().with_wrap(SamplerWrap::ClampToEdge);
        let b = SamplerDescription::default().with_wrap(SamplerWrap::ClampToEdge);
        assert_eq!(a, b);
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn test_lod_bias_normalizes_negative_zero() {
        let mut a = SamplerDescription::default();
        a.set_lod_bias(-0.0);
        assert_eq!(a, SamplerDescription::default());

        a.set_lod_bias(0.5);
        assert_eq!(a.lod_bias(), 0.5);
        assert_ne!(a, SamplerDescription::default());
    }

    #[test]
    fn test_compare_changes_identity() {
        let plain = SamplerDescription::default();
        let shadow = plain.with_compare(CompareFunction::LessEqual);
        assert_ne!(plain, shadow);
        assert_ne!(plain.content_hash(), shadow.content_hash());
    }
}
