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

//! Resource keys shared by the built-in stages.

use crate::declare_resource_key;
use crate::math::Extent2D;
use crate::renderer::api::{SamplerId, TextureId};

declare_resource_key! {
    /// Lit scene color.
    pub SceneColor: TextureId = "scene_color", Global;
    /// Scene depth buffer.
    pub SceneDepth: TextureId = "scene_depth", Global;
    /// Shadow depth map.
    pub ShadowMap: TextureId = "shadow_map", Global;
    /// Comparison sampler for [`ShadowMap`].
    pub ShadowSampler: SamplerId = "shadow_sampler", Global;
    /// Output of the composition stage.
    pub CompositionTarget: TextureId = "composition_target", Global;
    /// Texture to present this frame.
    pub FinalImage: TextureId = "final_image", Frame;
    /// Size of the presented image this frame.
    pub OutputExtent: Extent2D = "output_extent", Frame;
}
