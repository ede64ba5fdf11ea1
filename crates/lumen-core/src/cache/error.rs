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

use std::fmt;

use crate::cache::ObjectKind;
use crate::renderer::error::ResourceError;

/// An error returned by a [`ContentAddressedCache`](crate::cache::ContentAddressedCache).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The backend failed to allocate the object. Nothing was inserted.
    AllocationFailed {
        /// Kind of object.
        kind: ObjectKind,
        /// Label passed to `acquire`.
        label: String,
        /// Backend error.
        source: ResourceError,
    },
    /// The object is not present in the cache, typically a double release.
    NotCached {
        /// Kind of object.
        kind: ObjectKind,
        /// Content hash of the object.
        hash: u64,
    },
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::AllocationFailed {
                kind,
                label,
                source,
            } => write!(f, "Could not allocate {kind} '{label}': {source}"),
            CacheError::NotCached { kind, hash } => {
                write!(f, "{kind} with hash {hash:#018x} is not in the cache")
            }
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::AllocationFailed { source, .. } => Some(source),
            CacheError::NotCached { .. } => None,
        }
    }
}
