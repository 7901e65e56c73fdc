//! In-memory file tree assembled before anything touches the disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::error::{TemplateError, TemplateResult};

/// Directories never copied from a module source tree.
const EXCLUDED_DIRS: &[&str] = &[".terraform", ".git"];

/// A validated, `/`-separated path relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelativePath(String);

impl RelativePath {
    pub fn new(path: impl AsRef<str>) -> TemplateResult<Self> {
        let raw = path.as_ref();
        if raw.is_empty() || raw.starts_with('/') || Path::new(raw).is_absolute() {
            return Err(TemplateError::InvalidPath(raw.to_string()));
        }

        for part in raw.split('/') {
            if part.is_empty() || part == "." || part == ".." || part.contains('\\') {
                return Err(TemplateError::InvalidPath(raw.to_string()));
            }
        }

        Ok(Self(raw.to_string()))
    }

    /// Append a relative suffix.
    pub fn join(&self, suffix: impl AsRef<str>) -> TemplateResult<Self> {
        Self::new(format!("{}/{}", self.0, suffix.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Native path below `root`.
    pub fn under(&self, root: &Path) -> PathBuf {
        self.0.split('/').fold(root.to_path_buf(), |p, part| p.join(part))
    }

    fn from_native(path: &Path) -> TemplateResult<Self> {
        let mut parts = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => parts.push(
                    part.to_str()
                        .ok_or_else(|| TemplateError::InvalidPath(path.display().to_string()))?,
                ),
                _ => return Err(TemplateError::InvalidPath(path.display().to_string())),
            }
        }
        Self::new(parts.join("/"))
    }
}

impl std::fmt::Display for RelativePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generated files keyed by path. Iteration order is sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedFileTree {
    files: BTreeMap<RelativePath, Vec<u8>>,
}

impl GeneratedFileTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file. Adding the same path twice is an error.
    pub fn insert(&mut self, path: RelativePath, contents: impl Into<Vec<u8>>) -> TemplateResult<()> {
        if self.files.contains_key(&path) {
            return Err(TemplateError::DuplicatePath(path.to_string()));
        }
        debug!("Adding {}", path);
        self.files.insert(path, contents.into());
        Ok(())
    }

    /// Copy every regular file below `source` into the tree under `prefix`.
    ///
    /// Terraform working directories, state files, `.git` and stale bundles
    /// are skipped. Returns the number of files added.
    pub fn mount_dir(&mut self, prefix: &RelativePath, source: &Path) -> TemplateResult<usize> {
        let mut count = 0;

        for entry in WalkDir::new(source)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_excluded_dir(e))
        {
            let entry = entry?;
            if !entry.file_type().is_file() || is_excluded_file(&entry) {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(source)
                .map_err(|_| TemplateError::InvalidPath(entry.path().display().to_string()))?;
            let target = prefix.join(RelativePath::from_native(relative)?.as_str())?;

            self.insert(target, fs::read(entry.path())?)?;
            count += 1;
        }

        debug!("Mounted {} files from {:?} at {}", count, source, prefix);
        Ok(count)
    }

    /// Write every file below `root`, creating directories as needed.
    pub fn write_to(&self, root: &Path) -> TemplateResult<()> {
        for (path, contents) in &self.files {
            let target = path.under(root);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, contents)?;

            if path.as_str().ends_with(".sh") {
                make_executable(&target)?;
            }
        }

        info!("Wrote {} files to {:?}", self.files.len(), root);
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        RelativePath::new(path)
            .ok()
            .and_then(|p| self.files.get(&p))
            .map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RelativePath, &[u8])> {
        self.files.iter().map(|(p, c)| (p, c.as_slice()))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(RelativePath::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn is_excluded_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| EXCLUDED_DIRS.contains(&name))
            .unwrap_or(false)
}

fn is_excluded_file(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.contains(".tfstate") || name == "bundle.tar.gz"
}

#[cfg(unix)]
fn make_executable(path: &Path) -> TemplateResult<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> TemplateResult<()> {
    Ok(())
}
