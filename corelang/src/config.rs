//! Run configuration
//!
//! Loaded from an optional TOML file; command-line flags override it.
//!
//! ```toml
//! show_gc = false
//! max_call_depth = 2000
//! max_array_len = 1048576
//! release_on_exit = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CompileError, Result};

/// Interpreter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Print `gc:N` events alongside program output
    pub show_gc: bool,
    /// Deepest procedure nesting before the run fails with a stack overflow
    pub max_call_depth: usize,
    /// Release every remaining binding when the program finishes
    pub release_on_exit: bool,
    /// Largest element count a single `new integer[n]` may request
    pub max_array_len: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            show_gc: true,
            max_call_depth: 10_000,
            release_on_exit: true,
            max_array_len: 1 << 24,
        }
    }
}

impl RunConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CompileError::config_error(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CompileError::io_error(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn show_gc(mut self, show: bool) -> Self {
        self.show_gc = show;
        self
    }

    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn release_on_exit(mut self, release: bool) -> Self {
        self.release_on_exit = release;
        self
    }

    pub fn max_array_len(mut self, len: usize) -> Self {
        self.max_array_len = len;
        self
    }
}
