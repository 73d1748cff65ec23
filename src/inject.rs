//! @ai:module:intent Run the parse, annotate and patch pipeline over files
//! @ai:module:layer application
//! @ai:module:public_api inject_file, inject_paths, expand_inputs, is_go_source
//! @ai:module:depends_on parser, annotator, patcher, config, report, error

use crate::annotator::annotate;
use crate::config::InjectOptions;
use crate::error::{Error, Result};
use crate::parser::parse_file;
use crate::patcher::write_file;
use crate::report::{FileFailure, FileReport, RunReport};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// @ai:intent Inject directive tags into one Go file
/// @ai:pre path is a readable Go source file
/// @ai:post file bytes differ only inside rewritten tag literals (and removed directives)
/// @ai:effects fs:read, fs:write
pub fn inject_file(path: &Path, options: &InjectOptions) -> Result<FileReport> {
    let mut parsed = parse_file(path)?;
    let injection = annotate(&mut parsed, options);

    if injection.regions.is_empty() {
        tracing::debug!("no tags to inject in {:?}", path);
    }

    let written = if options.dry_run {
        false
    } else {
        write_file(path, &injection.regions)?
    };

    Ok(FileReport {
        path: path.to_path_buf(),
        changes: injection.changes,
        directives_removed: injection.directives_removed,
        written,
    })
}

/// @ai:intent Process files independently, collecting failures instead of stopping
/// @ai:effects fs:read, fs:write
pub fn inject_paths(paths: &[PathBuf], options: &InjectOptions) -> RunReport {
    let mut report = RunReport {
        dry_run: options.dry_run,
        ..Default::default()
    };

    for path in paths {
        match inject_file(path, options) {
            Ok(file_report) => report.files.push(file_report),
            Err(e) => {
                tracing::warn!("failed to inject tags into {:?}: {}", path, e);
                report.failures.push(FileFailure {
                    path: path.clone(),
                    phase: e.phase().to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    report
}

/// @ai:intent Resolve files, directories and glob patterns into Go file paths
/// @ai:post result is sorted and free of duplicates
/// @ai:example (["api/user.pb.go"]) -> ["api/user.pb.go"]
/// @ai:example (["api"]) -> every *.go below api/
/// @ai:effects fs:read
pub fn expand_inputs<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<PathBuf>> {
    let mut paths = BTreeSet::new();

    for input in inputs {
        let input = input.as_ref();
        let path = Path::new(input);

        if path.is_file() {
            paths.insert(path.to_path_buf());
            continue;
        }

        if path.is_dir() {
            for entry in WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                if is_go_source(entry.path()) {
                    paths.insert(entry.into_path());
                }
            }
            continue;
        }

        let matches = glob::glob(input).map_err(|source| Error::InvalidPattern {
            pattern: input.to_string(),
            source,
        })?;

        let mut matched = 0;
        for entry in matches {
            match entry {
                Ok(found) if found.is_file() => {
                    matched += 1;
                    paths.insert(found);
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("cannot read {:?}: {}", e.path(), e.error()),
            }
        }
        if matched == 0 {
            return Err(Error::NoMatches(input.to_string()));
        }
    }

    Ok(paths.into_iter().collect())
}

/// @ai:intent Check if a path names a Go source file
/// @ai:example ("user.pb.go") -> true
/// @ai:example ("user.proto") -> false
/// @ai:effects pure
pub fn is_go_source(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "go")
}
