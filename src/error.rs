// Error taxonomy for the analysis core.
//
// The CLI and I/O layers use anyhow; the core returns these typed errors so
// callers can tell a bad input (fix and retry) from bad training data (fix the
// dataset) or a missing model (train first). Convergence problems are not
// errors; see ConvergenceWarning.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Empty or missing text, column or parameter. Nothing was mutated.
    #[error("invalid input: {0}")]
    Input(String),

    /// The training data cannot produce a usable model.
    #[error("invalid training data: {0}")]
    Data(String),

    /// Inference was requested before a model was trained or saved.
    #[error("no sentiment model found at {}; run `reviewlens train` first", .0.display())]
    ModelNotFound(PathBuf),

    /// The model artifact exists but cannot be used.
    #[error("model artifact is unusable: {0}")]
    Artifact(String),
}

/// An iterative algorithm stopped at its iteration cap without meeting its
/// tolerance. The parameters it returns are still usable.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceWarning {
    pub algorithm: &'static str,
    pub iterations: usize,
    /// Last observed change (loss delta or reassigned documents).
    pub last_change: f64,
}

impl fmt::Display for ConvergenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} did not converge after {} iterations (last change {:.3e})",
            self.algorithm, self.iterations, self.last_change
        )
    }
}
