//! @ai:module:intent Configuration for tag injection runs
//! @ai:module:layer infrastructure
//! @ai:module:public_api InjectConfig, InjectOptions
//! @ai:module:depends_on error

use crate::error::{Error, Result};
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// @ai:intent Settings loaded from a TOML file and merged with CLI flags
/// @ai:effects pure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InjectConfig {
    /// Files, directories or glob patterns to process.
    pub input: Vec<String>,
    /// Field name patterns whose fields are never rewritten.
    pub skip_fields: Vec<String>,
    pub strip_directives: bool,
    pub verbose: bool,
}

/// @ai:intent Compiled options consumed by the annotator and the pipeline
#[derive(Debug, Clone, Default)]
pub struct InjectOptions {
    pub skip_fields: Vec<Pattern>,
    pub strip_directives: bool,
    pub dry_run: bool,
}

impl InjectOptions {
    /// @ai:intent Check whether any of a field's names is excluded
    /// @ai:effects pure
    pub fn skips<S: AsRef<str>>(&self, names: &[S]) -> bool {
        names
            .iter()
            .any(|name| self.skip_fields.iter().any(|p| p.matches(name.as_ref())))
    }
}

impl InjectConfig {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&text).map_err(|message| Error::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    /// @ai:effects pure
    pub fn from_toml(text: &str) -> std::result::Result<Self, String> {
        toml::from_str(text).map_err(|e| e.message().to_string())
    }

    /// @ai:intent Overlay command-line values: non-empty lists replace, flags combine
    /// @ai:effects pure
    pub fn merge(mut self, cli: InjectConfig) -> Self {
        if !cli.input.is_empty() {
            self.input = cli.input;
        }
        if !cli.skip_fields.is_empty() {
            self.skip_fields = cli.skip_fields;
        }
        self.strip_directives |= cli.strip_directives;
        self.verbose |= cli.verbose;
        self
    }

    /// @ai:intent Compile skip patterns into options
    /// @ai:post every pattern in skip_fields is valid glob syntax
    pub fn options(&self, dry_run: bool) -> Result<InjectOptions> {
        let skip_fields = self
            .skip_fields
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|source| Error::InvalidPattern {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(InjectOptions {
            skip_fields,
            strip_directives: self.strip_directives,
            dry_run,
        })
    }
}
