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

//! The per-frame scene handed to every stage.

use crate::math::Extent2D;
use crate::renderer::api::{MeshId, TextureId};

/// A mesh draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    /// Geometry to draw.
    pub mesh: MeshId,
    /// Vertices per instance.
    pub vertex_count: u32,
    /// Number of instances.
    pub instance_count: u32,
    /// The mesh is rendered into shadow maps.
    pub casts_shadow: bool,
}

/// Kind of a light source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightKind {
    /// Infinitely distant light.
    Directional,
    /// Omnidirectional light.
    Point,
    /// Cone light.
    Spot,
}

/// A light source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightItem {
    /// Light kind.
    pub kind: LightKind,
    /// Linear RGB color.
    pub color: [f32; 3],
    /// Intensity multiplier.
    pub intensity: f32,
    /// The light renders a shadow map.
    pub casts_shadow: bool,
}

/// The environment cubemap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyboxItem {
    /// Cubemap texture.
    pub cubemap: TextureId,
}

/// One entry of the render list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderItem {
    /// A mesh draw.
    Draw(DrawItem),
    /// A light source.
    Light(LightItem),
    /// The environment.
    Skybox(SkyboxItem),
}

/// Read-only frame state shared by all stages.
#[derive(Debug, Clone, Default)]
pub struct SceneState {
    /// Output size. Stages size their targets from it.
    pub viewport: Extent2D,
    /// Monotonic frame counter.
    pub frame_index: u64,
    /// Everything to render this frame.
    pub render_list: Vec<RenderItem>,
}

impl SceneState {
    /// An empty scene with the given viewport.
    pub fn new(viewport: Extent2D) -> Self {
        Self {
            viewport,
            ..Default::default()
        }
    }

    /// Iterates over mesh draws.
    pub fn draws(&self) -> impl Iterator<Item = &DrawItem> {
        self.render_list.iter().filter_map(|item| match item {
            RenderItem::Draw(draw) => Some(draw),
            _ => None,
        })
    }

    /// Iterates over lights.
    pub fn lights(&self) -> impl Iterator<Item = &LightItem> {
        self.render_list.iter().filter_map(|item| match item {
            RenderItem::Light(light) => Some(light),
            _ => None,
        })
    }

    /// Returns the first skybox of the render list.
    pub fn skybox(&self) -> Option<&SkyboxItem> {
        self.render_list.iter().find_map(|item| match item {
            RenderItem::Skybox(sky) => Some(sky),
            _ => None,
        })
    }
}
