use thiserror::Error;

/// Errors raised by point-cloud operations.
///
/// Shape errors (`CountMismatch`, `Dimension`, `NotEnoughPoints`) and lookup
/// errors (`MissingFiducial`, `DuplicateFiducial`, `NoOptodes`) are always
/// surfaced to the caller; nothing in this workspace silently repairs them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CloudError {
    /// Two inputs that must correspond point-for-point have different sizes.
    #[error("point count mismatch: {left} vs {right}")]
    CountMismatch { left: usize, right: usize },
    /// A matrix does not have the expected number of coordinate rows.
    #[error("expected a {expected}xN matrix, got {rows}x{cols}")]
    Dimension {
        expected: usize,
        rows: usize,
        cols: usize,
    },
    /// Too few points for the requested operation.
    #[error("need at least {needed} points, got {got}")]
    NotEnoughPoints { needed: usize, got: usize },
    /// A required named fiducial is absent.
    #[error("required fiducial '{0}' not found")]
    MissingFiducial(String),
    /// A required named fiducial occurs more than once.
    #[error("fiducial '{name}' occurs {count} times, expected exactly once")]
    DuplicateFiducial { name: String, count: usize },
    /// The cloud has no integer-labeled optodes.
    #[error("cloud has no optodes (no integer labels)")]
    NoOptodes,
    /// A named fiducial appears after the first optode.
    #[error("fiducial at index {index} follows the first optode")]
    InterleavedLabels { index: usize },
    /// Anchors and targets cannot be told apart for atlas projection.
    #[error("cannot resolve anchors from targets: no anchor names and no optodes")]
    UnresolvedAnchors,
    /// Input is geometrically degenerate for the requested operation.
    #[error("degenerate input: {0}")]
    Degenerate(String),
    /// Singular value decomposition did not produce the requested factors.
    #[error("svd failed")]
    SvdFailed,
}
