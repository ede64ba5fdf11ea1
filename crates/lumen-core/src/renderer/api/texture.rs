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

//! Texture descriptions. Textures are owned by render targets and are not cached.

use crate::math::Extent2D;
use crate::renderer::api::{SampleCount, TextureFormat};

/// Usage flags of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureUsage(u8);

impl TextureUsage {
    /// Can be bound as a render target.
    pub const RENDER_ATTACHMENT: Self = Self(0b001);
    /// Can be sampled from shaders.
    pub const SAMPLED: Self = Self(0b010);
    /// Can be copied from.
    pub const COPY_SRC: Self = Self(0b100);

    /// Returns `true` if all flags in `other` are set.
    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for TextureUsage {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Parameters for creating a texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDescription {
    /// Debug label.
    pub label: String,
    /// Size in pixels.
    pub size: Extent2D,
    /// Number of array layers.
    pub layers: u32,
    /// Texel format.
    pub format: TextureFormat,
    /// Samples per pixel.
    pub samples: SampleCount,
    /// Usage flags.
    pub usage: TextureUsage,
}

impl TextureDescription {
    /// A single-layer texture usable as attachment and shader input.
    pub fn attachment(label: impl Into<String>, size: Extent2D, format: TextureFormat) -> Self {
        Self {
            label: label.into(),
            size,
            layers: 1,
            format,
            samples: SampleCount::X1,
            usage: TextureUsage::RENDER_ATTACHMENT | TextureUsage::SAMPLED,
        }
    }
}
