//! Configuration for buffered delete tracking.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Iteration order of the buffered delete-by-term map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermOrder {
    /// Terms iterate in the order they were first buffered.
    #[default]
    Insertion,
    /// Terms iterate in ascending [`Term`](crate::index::term::Term) order,
    /// for deterministic flush output.
    Sorted,
}

/// Configuration for buffered delete tracking.
///
/// # Example
///
/// ```
/// use segdel::index::config::{DeletesConfig, TermOrder};
///
/// let config = DeletesConfig::default()
///     .with_max_buffered_delete_terms(Some(500))
///     .with_term_order(TermOrder::Sorted);
/// assert_eq!(config.max_buffered_delete_terms, Some(500));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeletesConfig {
    /// Number of buffered delete operations that triggers a flush.
    /// `None` disables the trigger.
    pub max_buffered_delete_terms: Option<usize>,

    /// Term map ordering policy.
    pub term_order: TermOrder,

    /// Entry count at which merge remapping rebuilds the three collections
    /// in parallel.
    pub parallel_remap_threshold: usize,
}

impl Default for DeletesConfig {
    fn default() -> Self {
        DeletesConfig {
            max_buffered_delete_terms: Some(1000),
            term_order: TermOrder::Insertion,
            parallel_remap_threshold: 4096,
        }
    }
}

impl DeletesConfig {
    /// Set the delete-count flush trigger.
    pub fn with_max_buffered_delete_terms(mut self, max: Option<usize>) -> Self {
        self.max_buffered_delete_terms = max;
        self
    }

    /// Set the term map ordering policy.
    pub fn with_term_order(mut self, order: TermOrder) -> Self {
        self.term_order = order;
        self
    }

    /// Set the parallel remap threshold.
    pub fn with_parallel_remap_threshold(mut self, threshold: usize) -> Self {
        self.parallel_remap_threshold = threshold;
        self
    }

    /// Load a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
