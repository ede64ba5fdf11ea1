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

//! A backend that keeps every object in memory and records submitted commands.
//!
//! It validates handles the way a real driver would fail on them, which makes
//! it suitable for running whole techniques in tests and in the sandbox.

mod backend;
mod command;

pub use self::backend::*;
pub use self::command::*;
