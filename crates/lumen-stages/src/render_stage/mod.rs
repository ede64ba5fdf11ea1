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

//! Render stages.
//!
//! Stages acquire their owners and targets in `create`. Outputs are
//! published during `prepare`, before any later stage reads them.

mod composition_stage;
mod scene_color_stage;
mod shadow_stage;

pub use composition_stage::*;
pub use scene_color_stage::*;
pub use shadow_stage::*;

use lumen_core::renderer::api::{ShaderModuleId, ShaderProgramDescription};

fn program_uses(program: &ShaderProgramDescription, module: ShaderModuleId) -> bool {
    program.vertex == module || program.fragment == module
}
