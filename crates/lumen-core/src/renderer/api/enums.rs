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

//! Enums used inside hashed object descriptions.
//!
//! Every enum here is a fieldless `#[repr(u8)]` type so that descriptions
//! containing them have a stable, padding-free byte image.

use bytemuck::NoUninit;

/// The memory layout of texels in a texture or attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, NoUninit)]
#[repr(u8)]
pub enum TextureFormat {
    /// No format. Marks an unused attachment slot.
    #[default]
    Undefined,
    /// Four 8-bit normalized channels.
    Rgba8Unorm,
    /// Four 8-bit normalized channels, sRGB encoded.
    Rgba8UnormSrgb,
    /// Four 8-bit normalized channels in BGRA order.
    Bgra8Unorm,
    /// Four 16-bit float channels.
    Rgba16Float,
    /// Two 11-bit and one 10-bit float channels.
    Rg11b10Float,
    /// 32-bit float depth.
    Depth32Float,
    /// 24-bit depth with 8-bit stencil.
    Depth24PlusStencil8,
}

impl TextureFormat {
    /// Returns `true` for depth or depth-stencil formats.
    pub fn is_depth(&self) -> bool {
        matches!(self, Self::Depth32Float | Self::Depth24PlusStencil8)
    }

    /// Returns `true` if the format carries a stencil aspect.
    pub fn has_stencil(&self) -> bool {
        matches!(self, Self::Depth24PlusStencil8)
    }
}

/// What happens to an attachment's contents when a render pass begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, NoUninit)]
#[repr(u8)]
pub enum LoadOp {
    /// Keep the previous contents.
    Load,
    /// Clear to the pass clear value.
    #[default]
    Clear,
    /// Contents are undefined.
    DontCare,
}

/// What happens to an attachment's contents when a render pass ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, NoUninit)]
#[repr(u8)]
pub enum StoreOp {
    /// Write the results to memory.
    #[default]
    Store,
    /// Results may be discarded.
    DontCare,
}

/// The layout an attachment is transitioned from or to around a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, NoUninit)]
#[repr(u8)]
pub enum TransitionOp {
    /// Previous contents are irrelevant.
    #[default]
    Undefined,
    /// Used as a color attachment.
    ColorAttachment,
    /// Used as a depth-stencil attachment.
    DepthStencilAttachment,
    /// Sampled from a shader.
    ShaderRead,
    /// Handed to the presentation engine.
    Present,
}

/// Number of samples per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, NoUninit)]
#[repr(u8)]
pub enum SampleCount {
    /// One sample.
    #[default]
    X1 = 1,
    /// Two samples.
    X2 = 2,
    /// Four samples.
    X4 = 4,
    /// Eight samples.
    X8 = 8,
}

/// Primitive assembly topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, NoUninit)]
#[repr(u8)]
pub enum PrimitiveTopology {
    /// Separate points.
    PointList,
    /// Separate lines.
    LineList,
    /// Connected lines.
    LineStrip,
    /// Separate triangles.
    #[default]
    TriangleList,
    /// Connected triangles.
    TriangleStrip,
}

/// Rasterizer fill mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, NoUninit)]
#[repr(u8)]
pub enum PolygonMode {
    /// Filled polygons.
    #[default]
    Fill,
    /// Wireframe.
    Line,
}

/// Which faces are culled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, NoUninit)]
#[repr(u8)]
pub enum CullMode {
    /// No culling.
    None,
    /// Cull front faces.
    Front,
    /// Cull back faces.
    #[default]
    Back,
}

/// Winding order of front faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, NoUninit)]
#[repr(u8)]
pub enum FrontFace {
    /// Counter-clockwise.
    #[default]
    Ccw,
    /// Clockwise.
    Cw,
}

/// Comparison used for depth, stencil, and shadow sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, NoUninit)]
#[repr(u8)]
pub enum CompareFunction {
    /// Never passes.
    Never,
    /// Passes if the new value is less.
    #[default]
    Less,
    /// Passes if the values are equal.
    Equal,
    /// Passes if the new value is less or equal.
    LessEqual,
    /// Passes if the new value is greater.
    Greater,
    /// Passes if the values differ.
    NotEqual,
    /// Passes if the new value is greater or equal.
    GreaterEqual,
    /// Always passes.
    Always,
}

/// Blend factor applied to source or destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, NoUninit)]
#[repr(u8)]
pub enum BlendFactor {
    /// 0.0
    Zero,
    /// 1.0
    #[default]
    One,
    /// Source alpha.
    SrcAlpha,
    /// 1.0 - source alpha.
    OneMinusSrcAlpha,
    /// Destination alpha.
    DstAlpha,
    /// 1.0 - destination alpha.
    OneMinusDstAlpha,
}

/// How blended source and destination are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, NoUninit)]
#[repr(u8)]
pub enum BlendOp {
    /// src + dst
    #[default]
    Add,
    /// src - dst
    Subtract,
    /// dst - src
    ReverseSubtract,
    /// min(src, dst)
    Min,
    /// max(src, dst)
    Max,
}

/// Texel filtering of a sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, NoUninit)]
#[repr(u8)]
pub enum SamplerFilter {
    /// Nearest texel, no mip blending.
    Nearest,
    /// Linear within a level, nearest mip.
    #[default]
    Bilinear,
    /// Linear within and across mip levels.
    Trilinear,
}

/// Addressing mode outside the `[0, 1]` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, NoUninit)]
#[repr(u8)]
pub enum SamplerWrap {
    /// Tile the texture.
    #[default]
    Repeat,
    /// Tile with mirroring.
    MirroredRepeat,
    /// Clamp to the edge texel.
    ClampToEdge,
    /// Clamp to the border color.
    ClampToBorder,
}

/// Maximum anisotropy of a sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, NoUninit)]
#[repr(u8)]
pub enum SamplerAnisotropy {
    /// Anisotropic filtering disabled.
    #[default]
    Off = 1,
    /// 2x
    X2 = 2,
    /// 4x
    X4 = 4,
    /// 8x
    X8 = 8,
    /// 16x
    X16 = 16,
}

/// Color used by [`SamplerWrap::ClampToBorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, NoUninit)]
#[repr(u8)]
pub enum BorderColor {
    /// (0, 0, 0, 0)
    #[default]
    TransparentBlack,
    /// (0, 0, 0, 1)
    OpaqueBlack,
    /// (1, 1, 1, 1)
    OpaqueWhite,
}

/// Per-channel color write mask bits.
pub mod color_mask {
    /// Red channel.
    pub const RED: u8 = 0b0001;
    /// Green channel.
    pub const GREEN: u8 = 0b0010;
    /// Blue channel.
    pub const BLUE: u8 = 0b0100;
    /// Alpha channel.
    pub const ALPHA: u8 = 0b1000;
    /// All channels.
    pub const ALL: u8 = RED | GREEN | BLUE | ALPHA;
}
