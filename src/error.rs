use thiserror::Error;

/// Errors reported when constructing a [`ScapegoatTree`](crate::ScapegoatTree).
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum Error {
    /// The balance factor was NaN or outside the open interval `(0.5, 1)`.
    #[error("balance factor alpha must satisfy 0.5 < alpha < 1, got {alpha}")]
    InvalidAlpha { alpha: f64 },
}

pub type Result<T> = std::result::Result<T, Error>;
