//! Instance configuration.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Emit warn-once diagnostics for unresolved includes.
    /// Defaults to the `debug-warnings` feature.
    pub debug: bool,
}

impl Config {
    pub fn quiet() -> Self {
        Self { debug: false }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: cfg!(feature = "debug-warnings"),
        }
    }
}
