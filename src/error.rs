//! Error types for the context budget crate

use thiserror::Error;

/// Errors surfaced by the context budget manager
///
/// The mutation surface never returns errors; refusals are communicated
/// through boolean returns with state left unchanged. This type only covers
/// construction-time validation.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Token limit must be positive, got {0}")]
    InvalidLimit(usize),
}

/// Crate-wide result alias
pub type Result<T, E = ContextError> = std::result::Result<T, E>;
