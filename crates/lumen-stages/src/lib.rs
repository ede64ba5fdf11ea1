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

//! # Lumen Stages
//!
//! Ready-made [`Stage`](lumen_core::Stage) implementations. Each stage owns
//! its render targets and cached-object owners and talks to the others only
//! through the resource keys in [`lumen_core::stage::keys`].

#![warn(missing_docs)]

pub mod render_stage;

pub use render_stage::*;
