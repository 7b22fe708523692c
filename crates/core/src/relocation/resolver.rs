//! Source and destination path derivation.

use std::path::{Component, Path, PathBuf};

use super::error::ResolveError;

/// Absolute source path and flattened destination path for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Derives the paths for moving `relative_name` out of `save_path`.
///
/// The source is `save_path/relative_name`. The destination keeps only the
/// final component of the name, so a torrent's subdirectories are flattened.
/// Names that are empty, absolute, or contain `..` are rejected.
pub fn resolve(
    save_path: &Path,
    relative_name: &str,
    destination_directory: &Path,
) -> Result<ResolvedPaths, ResolveError> {
    if relative_name.trim().is_empty() {
        return Err(ResolveError::EmptyName);
    }

    let relative = Path::new(relative_name);
    for component in relative.components() {
        match component {
            Component::ParentDir => {
                return Err(ResolveError::ParentTraversal {
                    name: relative_name.to_string(),
                })
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(ResolveError::AbsoluteName {
                    name: relative_name.to_string(),
                })
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }

    let basename = relative
        .file_name()
        .ok_or_else(|| ResolveError::NoFileName {
            name: relative_name.to_string(),
        })?;

    Ok(ResolvedPaths {
        source: save_path.join(relative),
        destination: destination_directory.join(basename),
    })
}
