//! Build configuration.
//!
//! Read from the `[preprocessor.docexec]` table of the book config:
//!
//! ```toml
//! [preprocessor.docexec]
//! interpreter = "/usr/bin/python3.12"
//! language = "python"
//! ```

use std::path::PathBuf;

use docexec_core::InterpreterConfig;
use serde::Deserialize;

use crate::error::Result;

/// Table name under `preprocessor` in the host config.
pub const CONFIG_TABLE: &str = "docexec";

const DEFAULT_LANGUAGE: &str = "python";

/// Settings for a documentation build.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Interpreter to run snippets with. Discovered when unset.
    pub interpreter: Option<PathBuf>,
    /// Highlight tag for displayed code.
    pub language: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interpreter: None,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl Config {
    /// Extract the settings from the host's preprocessor context.
    ///
    /// A missing table yields the defaults. Keys the host itself uses
    /// (`command`, `renderers`, ...) are ignored.
    pub fn from_context(context: &serde_json::Value) -> Result<Self> {
        match context.pointer(&format!("/config/preprocessor/{}", CONFIG_TABLE)) {
            Some(table) => Ok(serde_json::from_value(table.clone())?),
            None => Ok(Self::default()),
        }
    }

    /// How the execution environment should find its interpreter.
    pub fn interpreter_config(&self) -> InterpreterConfig {
        InterpreterConfig {
            interpreter: self.interpreter.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_table_uses_defaults() {
        let context = json!({ "root": "/book", "config": { "book": {} } });
        let config = Config::from_context(&context).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.language, "python");
        assert!(config.interpreter_config().interpreter.is_none());
    }

    #[test]
    fn test_table_values() {
        let context = json!({
            "config": {
                "preprocessor": {
                    "docexec": {
                        "command": "mdbook-docexec",
                        "interpreter": "/opt/python/bin/python3",
                        "language": "py"
                    }
                }
            }
        });
        let config = Config::from_context(&context).unwrap();

        assert_eq!(config.language, "py");
        assert_eq!(
            config.interpreter_config().interpreter,
            Some(PathBuf::from("/opt/python/bin/python3"))
        );
    }

    #[test]
    fn test_wrong_type_is_an_error() {
        let context = json!({
            "config": { "preprocessor": { "docexec": { "language": 3 } } }
        });
        assert!(Config::from_context(&context).is_err());
    }
}
