//! Index configuration.

use serde::Deserialize;

use crate::error::Result;

/// Configuration for a [`super::HierarchyIndex`].
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct IndexOptions {
    /// Deepest class/member nesting a payload may contain.
    pub max_nesting_depth: usize,
    /// Whether bytes left after the last class make a payload corrupt.
    pub reject_trailing_bytes: bool,
    /// Batches smaller than this are encoded on the calling thread.
    pub parallel_encode_threshold: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: 256,
            reject_trailing_bytes: true,
            parallel_encode_threshold: 64,
        }
    }
}

impl IndexOptions {
    /// Parses options from TOML; missing keys keep their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Sets the nesting limit.
    pub fn max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Enables or disables rejection of trailing bytes.
    pub fn reject_trailing_bytes(mut self, enabled: bool) -> Self {
        self.reject_trailing_bytes = enabled;
        self
    }

    /// Sets the batch size at which encoding goes parallel.
    pub fn parallel_encode_threshold(mut self, threshold: usize) -> Self {
        self.parallel_encode_threshold = threshold;
        self
    }
}
