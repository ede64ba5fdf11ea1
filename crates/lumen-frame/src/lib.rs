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

//! # Lumen Frame
//!
//! Runs ordered stages into a frame. A [`Technique`] drives the stage
//! lifecycle and a [`JobDispatcher`] collects the command lists stages
//! record, on the control thread or on a [`WorkerPool`], and submits them in
//! recording order.

#![warn(missing_docs)]

mod dispatcher;
mod error;
mod stats;
pub mod task;
mod technique;

pub use dispatcher::{DispatcherConfig, JobDispatcher, SubmitSummary};
pub use error::TechniqueError;
pub use stats::FrameStats;
pub use task::{JobError, TaskHandle, WorkerPool};
pub use technique::Technique;
