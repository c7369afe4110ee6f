//! Descriptor Loader
//!
//! Reads descriptor documents from a file or a directory tree. Directory
//! entries are visited in sorted order so the shape order, and with it the
//! generated output, does not depend on the filesystem.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use super::{parse_str, ShapeDescriptor};
use crate::checksum::Checksum;
use crate::error::{Result, ShapegenError};

/// Shapes loaded from disk
#[derive(Debug, Clone)]
pub struct LoadedDescriptors {
    pub shapes: Vec<ShapeDescriptor>,
    /// Files read, in load order
    pub sources: Vec<PathBuf>,
    /// Fingerprint over every source path and content
    pub fingerprint: Checksum,
}

/// Load a descriptor file, or every `*.json` file below a directory
pub fn load_path(path: &Path) -> Result<LoadedDescriptors> {
    let files = if path.is_dir() {
        collect_files(path)?
    } else {
        vec![path.to_path_buf()]
    };

    if files.is_empty() {
        return Err(ShapegenError::NoDescriptors(path.display().to_string()));
    }

    let mut shapes = Vec::new();
    let mut fingerprint_parts = Vec::with_capacity(files.len() * 2);
    for file in &files {
        let content = std::fs::read_to_string(file)?;
        let set = parse_str(&content).map_err(|e| match e {
            ShapegenError::InvalidDescriptor(messages) => ShapegenError::InvalidDescriptor(
                messages
                    .into_iter()
                    .map(|m| format!("{}: {}", file.display(), m))
                    .collect(),
            ),
            other => other,
        })?;
        debug!(file = %file.display(), shapes = set.shapes.len(), "loaded descriptors");

        let relative = file.strip_prefix(path).unwrap_or(file);
        fingerprint_parts.push(relative.display().to_string());
        fingerprint_parts.push(content);
        shapes.extend(set.shapes);
    }

    let fingerprint = Checksum::of_parts(&fingerprint_parts);
    info!(files = files.len(), shapes = shapes.len(), %fingerprint, "descriptors loaded");

    Ok(LoadedDescriptors {
        shapes,
        sources: files,
        fingerprint,
    })
}

fn collect_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        let is_json = entry.path().extension().map(|e| e == "json").unwrap_or(false);
        if entry.file_type().is_file() && is_json {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
