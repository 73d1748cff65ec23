//! @ai:module:intent Inject custom struct tags into Go source files from field comments
//! @ai:module:layer infrastructure
//! @ai:module:public_api annotation, annotator, config, directive, inject, lexer, output, parser, patcher, report, syntax, error
//! @ai:module:stateless true
//!
//! # gotag-inject
//!
//! Finds struct fields annotated with a directive comment such as
//! `// @gotags: db:"user_id"` and merges the directive's tags into the
//! field's tag literal. Only the tag literals change; every other byte of
//! the file is preserved.
//!
//! ## Example
//!
//! ```rust,no_run
//! use gotag_inject::{inject, output, InjectConfig};
//!
//! let config = InjectConfig {
//!     input: vec!["api/*.pb.go".to_string()],
//!     skip_fields: vec!["XXX_*".to_string()],
//!     ..Default::default()
//! };
//! let options = config.options(false).unwrap();
//! let paths = inject::expand_inputs(&config.input).unwrap();
//! let report = inject::inject_paths(&paths, &options);
//! println!("{}", output::format_run_report(&report, output::OutputFormat::Text));
//! ```

pub mod annotation;
pub mod annotator;
pub mod config;
pub mod directive;
pub mod error;
pub mod inject;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod patcher;
pub mod report;
pub mod syntax;

pub use annotation::{override_tag, Annotation, Entry};
pub use annotator::{annotate, Injection};
pub use config::{InjectConfig, InjectOptions};
pub use directive::{directive_fragment, scan_directives, Directive};
pub use error::{Error, Result};
pub use inject::{expand_inputs, inject_file, inject_paths, is_go_source};
pub use output::{format_run_report, to_json, OutputFormat};
pub use parser::{parse_file, parse_source, ParsedSource};
pub use patcher::{patch_source, write_file, PatchRegion};
pub use report::{FieldChange, FileFailure, FileReport, RunReport};
pub use syntax::{Comment, Field, SourceFile, StructType, TagLit};
