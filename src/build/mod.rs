//! Build orchestration.
//!
//! | Module         | Purpose                                          |
//! |----------------|--------------------------------------------------|
//! | `orchestrator` | Drives one build from graph to artifact set      |
//! | `artifact`     | Named artifacts and the output sink              |
//! | `diagnostics`  | Orphans, downgraded failures, minimizer fallbacks |
//! | `manifest`     | `manifest.json` and the runtime's manifest global |
//! | `html`         | Entry pages                                      |
//! | `copy`         | Static directory copy                            |

mod artifact;
mod copy;
mod diagnostics;
mod html;
mod manifest;
mod orchestrator;

#[cfg(test)]
mod tests;

pub use artifact::{Artifact, ArtifactSet, ArtifactSource};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use manifest::{ChunkFiles, Manifest};
pub use orchestrator::Orchestrator;

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::chunk::{ChunkPlan, ChunkPlanningError, RenderError};
use crate::graph::GraphError;
use crate::naming::NamingCollisionError;
use crate::transform::TransformError;

/// Fatal build errors. Any of them means zero artifacts.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    ChunkPlanning(#[from] ChunkPlanningError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    NamingCollision(#[from] NamingCollisionError),

    #[error("failed to start the worker pool")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to serialize the manifest")]
    Manifest(#[from] serde_json::Error),

    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("build cancelled")]
    Cancelled,
}

/// A failed build: the fatal error plus whatever was diagnosed before it.
#[derive(Debug)]
pub struct BuildFailure {
    pub error: BuildError,
    pub diagnostics: Diagnostics,
}

impl fmt::Display for BuildFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl std::error::Error for BuildFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.error)
    }
}

/// A successful build.
#[derive(Debug)]
pub struct BuildOutput {
    pub artifacts: ArtifactSet,
    pub plan: ChunkPlan,
    pub manifest: Manifest,
    pub diagnostics: Diagnostics,
}
