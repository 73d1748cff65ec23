//! @ai:module:intent Splice recorded replacements into file bytes and write them back
//! @ai:module:layer infrastructure
//! @ai:module:public_api PatchRegion, patch_source, verify_regions, write_file
//! @ai:module:depends_on error

use crate::error::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// @ai:intent Replace bytes `[start, end)` of the original file with `replacement`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRegion {
    pub start: usize,
    pub end: usize,
    /// Bytes the region held when it was recorded.
    pub current: Vec<u8>,
    pub replacement: String,
}

impl PatchRegion {
    pub fn new(start: usize, end: usize, current: &[u8], replacement: impl Into<String>) -> Self {
        Self {
            start,
            end,
            current: current.to_vec(),
            replacement: replacement.into(),
        }
    }
}

/// @ai:intent Apply ascending, non-overlapping regions to content
/// @ai:pre regions are sorted by start and do not overlap
/// @ai:post bytes outside every region are unchanged and keep their order
/// @ai:effects pure
pub fn patch_source(content: &[u8], regions: &[PatchRegion]) -> Vec<u8> {
    let mut patched = content.to_vec();
    // tail first, so offsets of the regions not yet applied stay valid
    for region in regions.iter().rev() {
        patched.splice(region.start..region.end, region.replacement.bytes());
    }
    patched
}

/// @ai:intent Check regions are in bounds, ordered, disjoint and still hold their recorded bytes
/// @ai:effects pure
pub fn verify_regions(path: &Path, content: &[u8], regions: &[PatchRegion]) -> Result<()> {
    let mut previous_end = 0;
    for region in regions {
        let stale = || Error::StaleRegion {
            path: path.to_path_buf(),
            start: region.start,
            end: region.end,
        };
        if region.start < previous_end || region.start > region.end || region.end > content.len()
        {
            return Err(stale());
        }
        if content[region.start..region.end] != region.current[..] {
            return Err(stale());
        }
        previous_end = region.end;
    }
    Ok(())
}

/// @ai:intent Rewrite a file in place with all regions applied
/// @ai:pre regions were recorded against the file's current content
/// @ai:post returns true when the file was written; nothing is written on error
/// @ai:effects fs:read, fs:write
pub fn write_file(path: &Path, regions: &[PatchRegion]) -> Result<bool> {
    if regions.is_empty() {
        return Ok(false);
    }

    let content = fs::read(path).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    verify_regions(path, &content, regions)?;

    for region in regions.iter().rev() {
        tracing::debug!(
            "inject custom tag {:?} to expression {:?}",
            region.replacement,
            String::from_utf8_lossy(&region.current)
        );
    }

    replace_contents(path, &patch_source(&content, regions))?;
    tracing::info!("file {:?} is injected with custom tags", path);
    Ok(true)
}

/// @ai:intent Atomically replace a file's contents, keeping its permissions
/// @ai:effects fs:write
fn replace_contents(path: &Path, contents: &[u8]) -> Result<()> {
    let write_err = |source: std::io::Error| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let permissions = fs::metadata(path).map_err(write_err)?.permissions();

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(contents).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    fs::set_permissions(tmp.path(), permissions).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    Ok(())
}
