//! Balance parameters and the two numeric rules the tree is built on: the
//! height-alpha threshold and the α-weight-balance test.

use crate::error::{Error, Result};

/// Balance factor used by [`Config::default`].
pub const DEFAULT_ALPHA: f64 = 0.7;

/// Configuration for a [`ScapegoatTree`](crate::ScapegoatTree).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Weight-balance factor, `0.5 < alpha < 1`.
    ///
    /// Smaller values keep the tree closer to perfectly balanced at the cost
    /// of more frequent rebuilds.
    pub alpha: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
        }
    }
}

impl Config {
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    /// Check that `alpha` lies in the open interval `(0.5, 1)`.
    pub fn validate(&self) -> Result<()> {
        // Written so that NaN fails both comparisons.
        if self.alpha > 0.5 && self.alpha < 1.0 {
            Ok(())
        } else {
            Err(Error::InvalidAlpha { alpha: self.alpha })
        }
    }
}

/// Deepest insertion depth (root = 0) tolerated in a tree of `size` nodes:
/// `floor(ln(size) / ln(1 / alpha))`.
#[inline]
pub(crate) fn height_threshold(size: usize, alpha: f64) -> usize {
    if size <= 1 {
        return 0;
    }
    ((size as f64).ln() / (1.0 / alpha).ln()).floor() as usize
}

/// α-weight-balance test for a node whose children hold `a` and `b` nodes and
/// whose subtree is claimed to hold `total` nodes.
#[inline]
pub(crate) fn is_weight_balanced(a: usize, b: usize, total: usize, alpha: f64) -> bool {
    let limit = alpha * total as f64;
    a as f64 <= limit && b as f64 <= limit
}

/// Whether a tree that has shrunk from `max_size` to `size` must be rebuilt.
#[inline]
pub(crate) fn needs_global_rebuild(size: usize, max_size: usize, alpha: f64) -> bool {
    (size as f64) < alpha * max_size as f64
}
