//! Package descriptors and entry-point lookup

use crate::error::{KilnError, KilnResult};
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

/// File name of the package descriptor inside an artifact
pub const DESCRIPTOR_FILE: &str = "package.json";

/// The subset of `package.json` kiln cares about
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageDescriptor {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub version: String,

    /// Entry file relative to the descriptor's directory
    #[serde(default)]
    pub main: Option<String>,
}

/// A runnable entry point found inside an artifact
#[derive(Debug, Clone)]
pub struct EntryPoint {
    /// Absolute, normalized path to the entry file
    pub path: PathBuf,
    /// Directory holding the descriptor
    pub package_dir: PathBuf,
    pub package: PackageDescriptor,
}

/// Find the nearest directory at or above `start` that holds a descriptor
pub fn find_package_dir(start: &Path) -> Option<PathBuf> {
    let start = absolute(start);
    start
        .ancestors()
        .find(|dir| dir.join(DESCRIPTOR_FILE).is_file())
        .map(Path::to_path_buf)
}

/// Read and parse the descriptor in `package_dir`
pub fn read_descriptor(package_dir: &Path) -> KilnResult<PackageDescriptor> {
    let path = package_dir.join(DESCRIPTOR_FILE);
    let content = std::fs::read_to_string(&path).map_err(|e| KilnError::cache_state(&path, e))?;
    serde_json::from_str(&content).map_err(|e| KilnError::cache_state(&path, e))
}

/// Resolve the entry point of the package enclosing `start`.
///
/// Returns `Ok(None)` when there is no descriptor or it declares no `main`.
pub fn locate_entry_point(start: &Path) -> KilnResult<Option<EntryPoint>> {
    let Some(package_dir) = find_package_dir(start) else {
        return Ok(None);
    };
    let package = read_descriptor(&package_dir)?;
    let Some(main) = package.main.as_deref().filter(|m| !m.trim().is_empty()) else {
        return Ok(None);
    };
    let path = normalize(&package_dir.join(main));
    Ok(Some(EntryPoint {
        path,
        package_dir,
        package,
    }))
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        normalize(&cwd.join(path))
    }
}

/// Lexically normalize a path: drop `.` segments and fold `..` into the parent
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
