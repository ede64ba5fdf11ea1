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

//! Graphics pipeline descriptions.

use bytemuck::NoUninit;

use crate::cache::{hash_pod, Description, ObjectKind};
use crate::renderer::api::{
    color_mask, BlendFactor, BlendOp, CompareFunction, CullMode, FrontFace, PipelineId,
    PolygonMode, PrimitiveTopology, RenderPassDescription, SampleCount, ShaderModuleId,
    MAX_COLOR_ATTACHMENTS,
};
use crate::renderer::error::ResourceError;
use crate::renderer::traits::GpuBackend;

/// A linked vertex and fragment shader pair.
///
/// `hash` identifies the compiled program. It is produced by whatever
/// compiles the shaders and is the only input of the pipeline cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, NoUninit)]
#[repr(C)]
pub struct ShaderProgramDescription {
    /// Vertex stage module.
    pub vertex: ShaderModuleId,
    /// Fragment stage module.
    pub fragment: ShaderModuleId,
    /// Identity of the compiled program.
    pub hash: u64,
}

impl ShaderProgramDescription {
    /// Creates a program whose hash is derived from its module ids.
    pub fn new(vertex: ShaderModuleId, fragment: ShaderModuleId) -> Self {
        let hash = hash_pod(&[vertex, fragment]);
        Self {
            vertex,
            fragment,
            hash,
        }
    }
}

/// Fixed-function state of a graphics pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, NoUninit)]
#[repr(C)]
pub struct GraphicsPipelineStateDescription {
    /// Primitive assembly topology.
    pub topology: PrimitiveTopology,
    /// Fill mode.
    pub polygon_mode: PolygonMode,
    /// Face culling.
    pub cull_mode: CullMode,
    /// Front face winding.
    pub front_face: FrontFace,
    /// Enables the depth test.
    pub depth_test: bool,
    /// Enables depth writes.
    pub depth_write: bool,
    /// Depth comparison.
    pub depth_compare: CompareFunction,
    /// Enables the stencil test.
    pub stencil_test: bool,
    /// Enables blending on all color targets.
    pub blend_enabled: bool,
    /// Color source factor.
    pub src_color: BlendFactor,
    /// Color destination factor.
    pub dst_color: BlendFactor,
    /// Color blend operation.
    pub color_op: BlendOp,
    /// Alpha source factor.
    pub src_alpha: BlendFactor,
    /// Alpha destination factor.
    pub dst_alpha: BlendFactor,
    /// Alpha blend operation.
    pub alpha_op: BlendOp,
    /// Enables alpha to coverage.
    pub alpha_to_coverage: bool,
    /// Rasterization samples.
    pub samples: SampleCount,
    /// Write masks, one per color target.
    pub color_write_mask: [u8; MAX_COLOR_ATTACHMENTS],
}

impl Default for GraphicsPipelineStateDescription {
    fn default() -> Self {
        Self {
            topology: PrimitiveTopology::TriangleList,
            polygon_mode: PolygonMode::Fill,
            cull_mode: CullMode::Back,
            front_face: FrontFace::Ccw,
            depth_test: true,
            depth_write: true,
            depth_compare: CompareFunction::Less,
            stencil_test: false,
            blend_enabled: false,
            src_color: BlendFactor::One,
            dst_color: BlendFactor::Zero,
            color_op: BlendOp::Add,
            src_alpha: BlendFactor::One,
            dst_alpha: BlendFactor::Zero,
            alpha_op: BlendOp::Add,
            alpha_to_coverage: false,
            samples: SampleCount::X1,
            color_write_mask: [color_mask::ALL; MAX_COLOR_ATTACHMENTS],
        }
    }
}

impl GraphicsPipelineStateDescription {
    /// State for a full-screen pass: no culling, no depth.
    pub fn fullscreen() -> Self {
        Self {
            cull_mode: CullMode::None,
            depth_test: false,
            depth_write: false,
            ..Self::default()
        }
    }

    /// State for a depth-only pass such as shadow rendering.
    pub fn depth_only() -> Self {
        Self {
            cull_mode: CullMode::Front,
            color_write_mask: [0; MAX_COLOR_ATTACHMENTS],
            ..Self::default()
        }
    }
}

/// Everything needed to compile a graphics pipeline.
///
/// `render_pass` should be the [compatibility](RenderPassDescription::compatibility)
/// form so pipelines are shared across passes that only differ in load/store ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PipelineDescription {
    /// Shader program.
    pub program: ShaderProgramDescription,
    /// Fixed-function state.
    pub state: GraphicsPipelineStateDescription,
    /// Attachment layout the pipeline renders into.
    pub render_pass: RenderPassDescription,
}

impl Description for PipelineDescription {
    type Object = PipelineId;
    const KIND: ObjectKind = ObjectKind::Pipeline;

    /// Pipelines are keyed by program only. Variants of one program with
    /// different state share a bucket and are told apart by equality.
    fn content_hash(&self) -> u64 {
        self.program.hash
    }

    fn allocate(&self, backend: &dyn GpuBackend, label: &str) -> Result<PipelineId, ResourceError> {
        backend.create_pipeline(self, label)
    }

    fn destroy(object: PipelineId, backend: &dyn GpuBackend) -> Result<(), ResourceError> {
        backend.destroy_pipeline(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_hash_follows_modules() {
        let a = ShaderProgramDescription::new(ShaderModuleId(1), ShaderModuleId(2));
        let b = ShaderProgramDescription::new(ShaderModuleId(1), ShaderModuleId(2));
        let c = ShaderProgramDescription::new(ShaderModuleId(2), ShaderModuleId(1));
        assert_eq!(a.hash, b.hash);
        assert_ne!(a.hash, c.hash);
    }

    #[test]
    fn test_state_variants_share_hash() {
        let program = ShaderProgramDescription::new(ShaderModuleId(7), ShaderModuleId(8));
        let opaque = PipelineDescription {
            program,
            ..Default::default()
        };
        let wireframe = PipelineDescription {
            program,
            state: GraphicsPipelineStateDescription {
                polygon_mode: PolygonMode::Line,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(opaque.content_hash(), wireframe.content_hash());
        assert_ne!(opaque, wireframe);
    }
}
