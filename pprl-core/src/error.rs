// pprl-core/src/error.rs
//
// Error kinds for the linkage core. `ChecksumMismatch` and `LoadError` are
// fatal and always propagate; `MissingThresholds` is recoverable by calling
// `EmbeddedTable::update_thresholds()` first or opting out explicitly.
//
// `DateParseFailure` from the spec has no variant here — it's handled
// locally inside the `dob` feature function by substituting the default
// token list, and never reaches a caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PprlError {
    #[error("embedder checksum mismatch: table was built from a different embedder (expected {expected}, found {found})")]
    ChecksumMismatch { expected: String, found: String },

    #[error("thresholds required but not present; call update_thresholds() first or pass require_thresholds=false")]
    MissingThresholds,

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("failed to load serialised embedder: {0}")]
    LoadError(String),
}

pub type Result<T> = std::result::Result<T, PprlError>;
