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

//! Plain data types exchanged between stages, caches, and the GPU backend.

pub mod enums;
pub mod framebuffer;
pub mod handles;
pub mod pipeline;
pub mod render_pass;
pub mod sampler;
pub mod scene;
pub mod settings;
pub mod texture;

pub use self::enums::*;
pub use self::framebuffer::*;
pub use self::handles::*;
pub use self::pipeline::*;
pub use self::render_pass::*;
pub use self::sampler::*;
pub use self::scene::*;
pub use self::settings::*;
pub use self::texture::*;
