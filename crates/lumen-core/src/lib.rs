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

//! # Lumen Core
//!
//! Foundational crate of the frame pipeline: GPU object descriptions, the
//! content-addressed object caches with their ownership tracking, and the
//! contracts every render stage implements.

#![warn(missing_docs)]

pub mod cache;
pub mod math;
pub mod renderer;
pub mod stage;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::GpuContext;
pub use stage::{Stage, StageContext, StageEvent};
