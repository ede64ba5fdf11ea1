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

//! Defines the error type for technique operations.

use std::fmt;

use lumen_core::renderer::RenderError;
use lumen_core::stage::{StageError, StageState};

/// An error raised while building or running a technique.
#[derive(Debug)]
pub enum TechniqueError {
    /// A stage reads a resource no earlier stage writes.
    MissingProducer {
        /// The reading stage.
        stage: &'static str,
        /// The unproduced resource.
        resource: &'static str,
    },
    /// A stage with the same name is already registered.
    DuplicateStage {
        /// The stage name.
        stage: &'static str,
    },
    /// A lifecycle method was called in the wrong state.
    InvalidTransition {
        /// The stage.
        stage: &'static str,
        /// Its current state.
        from: StageState,
        /// The attempted operation.
        operation: &'static str,
    },
    /// A stage reported an error.
    Stage {
        /// The failing stage.
        stage: &'static str,
        /// The stage error.
        source: StageError,
    },
    /// Recording or submission failed.
    Render(RenderError),
}

impl fmt::Display for TechniqueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TechniqueError::MissingProducer { stage, resource } => write!(
                f,
                "Stage '{stage}' reads '{resource}' but no earlier stage writes it"
            ),
            TechniqueError::DuplicateStage { stage } => {
                write!(f, "Stage '{stage}' is already registered")
            }
            TechniqueError::InvalidTransition {
                stage,
                from,
                operation,
            } => write!(f, "Cannot {operation} stage '{stage}' while {from}"),
            TechniqueError::Stage { stage, source } => {
                write!(f, "Stage '{stage}' failed: {source}")
            }
            TechniqueError::Render(e) => write!(f, "Frame submission failed: {e}"),
        }
    }
}

impl std::error::Error for TechniqueError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TechniqueError::Stage { source, .. } => Some(source),
            TechniqueError::Render(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderError> for TechniqueError {
    fn from(err: RenderError) -> Self {
        TechniqueError::Render(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = TechniqueError::MissingProducer {
            stage: "composition",
            resource: "scene_color",
        };
        assert_eq!(
            format!("{err}"),
            "Stage 'composition' reads 'scene_color' but no earlier stage writes it"
        );

        let err = TechniqueError::InvalidTransition {
            stage: "shadow",
            from: StageState::Uninitialized,
            operation: "execute",
        };
        assert_eq!(format!("{err}"), "Cannot execute stage 'shadow' while uninitialized");
    }
}
