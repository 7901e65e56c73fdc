//! Deterministic template bundles.
//!
//! A bundle is a gzip-compressed tar of every regular file in the template
//! directory. Entries are sorted by path and carry fixed ownership and
//! timestamps, so the same tree always produces the same bytes.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::{Compression, GzBuilder};
use tar::{Builder, Header, HeaderMode};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::error::{PublishError, PublishResult};

/// File name of the archive, both locally and in the bucket.
pub const BUNDLE_FILE_NAME: &str = "bundle.tar.gz";

/// Object key a template's bundle is uploaded to.
pub fn bundle_key(template_name: &str) -> String {
    format!("{}/{}", template_name, BUNDLE_FILE_NAME)
}

/// A bundle written next to the template it was built from.
#[derive(Debug, Clone)]
pub struct Bundle {
    pub path: PathBuf,
    /// Archive entry paths, in archive order.
    pub entries: Vec<String>,
    pub data: Vec<u8>,
}

impl Bundle {
    /// Archive `dir` into `dir/bundle.tar.gz`.
    pub fn create(dir: &Path) -> PublishResult<Self> {
        let path = dir.join(BUNDLE_FILE_NAME);
        debug!("Creating template bundle {:?}", path);

        let files = collect_files(dir)?;

        let mut tar = deterministic_tar(Vec::new());
        let mut entries = Vec::with_capacity(files.len());
        for (name, source) in &files {
            let data = fs::read(source)?;
            append_entry(&mut tar, name, &data, file_mode(source)?)?;
            entries.push(name.clone());
        }
        let data = tar.into_inner()?.finish()?;

        fs::write(&path, &data)?;
        info!(
            "Bundled {} files into {:?} ({} bytes)",
            entries.len(),
            path,
            data.len()
        );

        Ok(Self {
            path,
            entries,
            data,
        })
    }

    /// Delete the local archive.
    pub fn remove(&self) -> PublishResult<()> {
        fs::remove_file(&self.path)?;
        debug!("Removed local bundle {:?}", self.path);
        Ok(())
    }
}

/// Regular files below `dir` as (archive path, source path), sorted.
fn collect_files(dir: &Path) -> PublishResult<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_git_dir(e))
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(|_| PublishError::Config(format!("{:?} is outside {:?}", entry.path(), dir)))?;
        if relative == Path::new(BUNDLE_FILE_NAME) {
            continue;
        }

        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        files.push((name, entry.into_path()));
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

fn is_git_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name() == ".git"
}

fn deterministic_tar<W: Write>(writer: W) -> Builder<GzEncoder<W>> {
    let encoder = GzBuilder::new()
        .mtime(0)
        .operating_system(255)
        .write(writer, Compression::best());

    let mut tar = Builder::new(encoder);
    tar.mode(HeaderMode::Deterministic);
    tar
}

fn append_entry<W: Write>(
    tar: &mut Builder<W>,
    path: &str,
    data: &[u8],
    mode: u32,
) -> PublishResult<()> {
    let mut header = Header::new_gnu();
    header.set_path(path)?;
    header.set_size(data.len() as u64);
    header.set_mode(mode);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(0);
    header.set_cksum();

    tar.append(&header, data)?;
    Ok(())
}

#[cfg(unix)]
fn file_mode(path: &Path) -> PublishResult<u32> {
    use std::os::unix::fs::PermissionsExt;

    let executable = fs::metadata(path)?.permissions().mode() & 0o111 != 0;
    Ok(if executable { 0o755 } else { 0o644 })
}

#[cfg(not(unix))]
fn file_mode(path: &Path) -> PublishResult<u32> {
    let is_script = path.extension().map(|e| e == "sh").unwrap_or(false);
    Ok(if is_script { 0o755 } else { 0o644 })
}
