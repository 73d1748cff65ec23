//! @ai:module:intent Data structures describing what an injection run changed
//! @ai:module:layer domain
//! @ai:module:public_api FieldChange, FileReport, FileFailure, RunReport
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// @ai:intent One field whose tag literal was rewritten
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub struct_name: Option<String>,
    pub field: String,
    pub line: usize,
    pub old_tag: String,
    pub new_tag: String,
}

/// @ai:intent Outcome of processing one file successfully
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub changes: Vec<FieldChange>,
    pub directives_removed: usize,
    /// False when nothing needed writing or the run was a dry run.
    pub written: bool,
}

impl FileReport {
    pub fn is_changed(&self) -> bool {
        !self.changes.is_empty() || self.directives_removed > 0
    }
}

/// @ai:intent A file that could not be processed and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub phase: String,
    pub message: String,
}

/// @ai:intent Aggregate result of processing many files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub files: Vec<FileReport>,
    pub failures: Vec<FileFailure>,
    pub dry_run: bool,
}

impl RunReport {
    /// @ai:intent Check if every file was processed without error
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn files_changed(&self) -> usize {
        self.files.iter().filter(|f| f.is_changed()).count()
    }

    pub fn fields_changed(&self) -> usize {
        self.files.iter().map(|f| f.changes.len()).sum()
    }
}
