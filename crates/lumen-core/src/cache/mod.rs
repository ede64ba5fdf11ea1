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

//! Content-addressed caching of immutable GPU objects.
//!
//! Pipelines, render passes, framebuffers, and samplers are deduplicated by
//! their description. Owners link to cached objects through an
//! [`ObjectTracker`] and the object is destroyed once the last owner lets go.

mod context;
mod description;
mod error;
mod hash;
mod object_cache;
mod observer;
mod ref_count;
mod tracker;

pub use self::context::*;
pub use self::description::*;
pub use self::error::*;
pub use self::hash::*;
pub use self::object_cache::*;
pub use self::observer::*;
pub use self::ref_count::*;
pub use self::tracker::*;
