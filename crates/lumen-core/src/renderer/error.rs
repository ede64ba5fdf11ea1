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

//! Defines the hierarchy of error types for the rendering subsystem.

use crate::cache::CacheError;
use std::fmt;

/// An error raised by the backend while creating or destroying an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// The backend could not create the object.
    AllocationFailed {
        /// Kind of object, e.g. "pipeline".
        kind: &'static str,
        /// Label of the object being created.
        label: String,
        /// Backend-specific reason.
        reason: String,
    },
    /// The device ran out of memory.
    OutOfMemory,
    /// A handle did not refer to a live object.
    InvalidHandle {
        /// Kind of object.
        kind: &'static str,
        /// Raw handle value.
        id: u64,
    },
    /// The device was lost.
    DeviceLost,
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::AllocationFailed {
                kind,
                label,
                reason,
            } => write!(f, "Failed to allocate {kind} '{label}': {reason}"),
            ResourceError::OutOfMemory => write!(f, "Out of GPU memory"),
            ResourceError::InvalidHandle { kind, id } => {
                write!(f, "Invalid {kind} handle: {id}")
            }
            ResourceError::DeviceLost => write!(f, "Graphics device lost"),
        }
    }
}

impl std::error::Error for ResourceError {}

/// A high-level error that can occur while producing a frame.
#[derive(Debug)]
pub enum RenderError {
    /// A backend object could not be created.
    Resource(ResourceError),
    /// A cache operation failed.
    Cache(CacheError),
    /// The backend rejected a command list.
    SubmissionFailed(String),
    /// A recording job did not finish within the stall timeout.
    JobStalled {
        /// Label of the stalled job.
        label: &'static str,
    },
    /// A recording job failed or panicked.
    JobFailed {
        /// Label of the failed job.
        label: &'static str,
        /// Failure description.
        reason: String,
    },
    /// The graphics device was lost.
    DeviceLost,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Resource(e) => write!(f, "Resource error: {e}"),
            RenderError::Cache(e) => write!(f, "Cache error: {e}"),
            RenderError::SubmissionFailed(msg) => write!(f, "Command list submission failed: {msg}"),
            RenderError::JobStalled { label } => {
                write!(f, "Recording job '{label}' stalled")
            }
            RenderError::JobFailed { label, reason } => {
                write!(f, "Recording job '{label}' failed: {reason}")
            }
            RenderError::DeviceLost => write!(f, "Graphics device lost"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Resource(e) => Some(e),
            RenderError::Cache(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::Resource(err)
    }
}

impl From<CacheError> for RenderError {
    fn from(err: CacheError) -> Self {
        RenderError::Cache(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_error_display() {
        let err = ResourceError::AllocationFailed {
            kind: "sampler",
            label: "linear".to_string(),
            reason: "out of slots".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "Failed to allocate sampler 'linear': out of slots"
        );
    }

    #[test]
    fn test_render_error_from_resource() {
        let err: RenderError = ResourceError::OutOfMemory.into();
        assert!(matches!(err, RenderError::Resource(ResourceError::OutOfMemory)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_job_stalled_display() {
        let err = RenderError::JobStalled { label: "shadow" };
        assert_eq!(format!("{err}"), "Recording job 'shadow' stalled");
    }
}
