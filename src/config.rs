//! Configuration structures for implicit AVL trees.

use crate::error::{AvlError, Result};
use serde::{Deserialize, Serialize};

/// When the structural invariants are re-checked after an insertion.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VerifyMode {
    /// Never check.
    Never = 0,
    /// Check only in builds with debug assertions enabled.
    #[default]
    DebugAssertions = 1,
    /// Check after every structural insertion.
    Always = 2,
}

impl VerifyMode {
    /// Whether the check runs in the current build.
    pub fn is_enabled(self) -> bool {
        match self {
            VerifyMode::Never => false,
            VerifyMode::DebugAssertions => cfg!(debug_assertions),
            VerifyMode::Always => true,
        }
    }

    pub(crate) fn from_raw(raw: u32) -> Self {
        match raw {
            0 => VerifyMode::Never,
            2 => VerifyMode::Always,
            _ => VerifyMode::DebugAssertions,
        }
    }
}

/// Tree configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Number of slots allocated up front. The tree never grows past it.
    pub capacity: u32,
    /// Invariant checking policy.
    pub verify: VerifyMode,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            verify: VerifyMode::DebugAssertions,
        }
    }
}

impl TreeConfig {
    /// Creates a configuration with the given capacity and the default verify mode.
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Rejects configurations that cannot hold a single key.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(AvlError::ConfigError(
                "capacity must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
