//! Filesystem primitives: directory walking, whole-file reads and writes.

use crate::error::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Options controlling how directories are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOptions {
    /// Import dot-files and dot-directories.
    pub include_hidden: bool,
    /// Skip entries matched by `.gitignore` rules.
    pub respect_gitignore: bool,
    /// Follow symlinks; when false they are skipped.
    pub follow_links: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            include_hidden: true,
            respect_gitignore: false,
            follow_links: false,
        }
    }
}

impl WalkOptions {
    pub fn include_hidden(mut self, yes: bool) -> Self {
        self.include_hidden = yes;
        self
    }

    pub fn respect_gitignore(mut self, yes: bool) -> Self {
        self.respect_gitignore = yes;
        self
    }

    pub fn follow_links(mut self, yes: bool) -> Self {
        self.follow_links = yes;
        self
    }
}

/// Options controlling how files are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    /// Write through a temporary file that is persisted over the target.
    pub atomic: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self { atomic: true }
    }
}

/// Kind of a directory entry found by [`walk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryKind {
    File,
    Dir,
}

/// A file or subdirectory found while walking.
#[derive(Debug, Clone)]
pub(crate) struct DirEntry {
    pub(crate) path: PathBuf,
    pub(crate) name: String,
    pub(crate) kind: EntryKind,
}

fn check_dir(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::invalid_argument("directory path is empty"));
    }
    if !path.exists() {
        return Err(Error::not_found(path));
    }
    if !path.is_dir() {
        return Err(Error::invalid_argument(format!(
            "not a directory: {}",
            path.display()
        )));
    }
    Ok(())
}

/// Walk `dir`, returning files and directories sorted by name.
///
/// With `recursive` false only immediate children are returned.
pub(crate) fn walk(dir: &Path, recursive: bool, opts: &WalkOptions) -> Result<Vec<DirEntry>> {
    check_dir(dir)?;

    let walker = ignore::WalkBuilder::new(dir)
        .standard_filters(false)
        .hidden(!opts.include_hidden)
        .git_ignore(opts.respect_gitignore)
        .require_git(false)
        .follow_links(opts.follow_links)
        .max_depth(if recursive { None } else { Some(1) })
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut entries = Vec::new();
    for entry in walker {
        let entry = entry?;

        // Skip the directory itself
        if entry.depth() == 0 {
            continue;
        }

        let Some(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_symlink() {
            warn!(path = %entry.path().display(), "skipping symlink");
            continue;
        }

        let kind = if file_type.is_dir() {
            EntryKind::Dir
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            warn!(path = %entry.path().display(), "skipping special file");
            continue;
        };

        let Some(name) = entry.file_name().to_str() else {
            warn!(path = %entry.path().display(), "skipping non UTF-8 name");
            continue;
        };

        entries.push(DirEntry {
            path: entry.path().to_path_buf(),
            name: name.to_string(),
            kind,
        });
    }

    debug!(dir = %dir.display(), recursive, count = entries.len(), "walked directory");
    Ok(entries)
}

/// Read a whole file.
pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>> {
    if path.as_os_str().is_empty() {
        return Err(Error::invalid_argument("file path is empty"));
    }
    if !path.is_file() {
        return Err(Error::not_found(path));
    }
    Ok(fs::read(path)?)
}

/// Write `content` to `path`, replacing any existing file.
pub(crate) fn write_file(path: &Path, content: &[u8], opts: &SaveOptions) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::invalid_argument("file path is empty"));
    }

    if !opts.atomic {
        fs::write(path, content)?;
        return Ok(());
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    #[cfg_attr(not(unix), allow(unused_mut))]
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Same mode a plain create gets: 0666 less the umask
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let mut temp_file = builder.tempfile_in(dir)?;
    // An existing target keeps its mode
    if let Ok(meta) = fs::metadata(path) {
        temp_file.as_file().set_permissions(meta.permissions())?;
    }
    temp_file.write_all(content)?;
    temp_file.flush()?;
    temp_file.persist(path)?;

    Ok(())
}

/// Create `path` and any missing parents.
pub(crate) fn create_dir(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::invalid_argument("directory path is empty"));
    }
    fs::create_dir_all(path)?;
    Ok(())
}
