//! Search configuration

use crate::error::Result;
use crate::limits::{validate_step_limit, validate_tries, validate_verify_ceiling};
use crate::selector::SelectionPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for circuit search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Step budget shared by the climb, descent and verification of one try
    #[serde(default = "default_step_limit")]
    pub step_limit: usize,

    /// Hard cap on verification steps within one try
    #[serde(default = "default_verify_ceiling")]
    pub verify_ceiling: usize,

    /// Next-edge selection policy
    #[serde(default)]
    pub policy: SelectionPolicy,

    /// Retry budget per label node; defaults to the number of origins that
    /// resolved to it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tries: Option<usize>,

    /// Fixed RNG seed for reproducible searches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Abort a search after this many milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

fn default_step_limit() -> usize {
    100
}

fn default_verify_ceiling() -> usize {
    32
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            step_limit: default_step_limit(),
            verify_ceiling: default_verify_ceiling(),
            policy: SelectionPolicy::default(),
            tries: None,
            seed: None,
            timeout_ms: None,
        }
    }
}

impl SearchConfig {
    pub fn with_step_limit(mut self, step_limit: usize) -> Self {
        self.step_limit = step_limit;
        self
    }

    pub fn with_verify_ceiling(mut self, verify_ceiling: usize) -> Self {
        self.verify_ceiling = verify_ceiling;
        self
    }

    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_tries(mut self, tries: usize) -> Self {
        self.tries = Some(tries);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<()> {
        validate_step_limit(self.step_limit)?;
        validate_verify_ceiling(self.verify_ceiling)?;
        if let Some(tries) = self.tries {
            validate_tries(tries)?;
        }
        Ok(())
    }
}
