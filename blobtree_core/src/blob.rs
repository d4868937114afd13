//! Named binary payloads and flat collections of them.

use crate::error::{Error, Result};
use crate::fsio::{self, EntryKind, SaveOptions, WalkOptions};
use crate::hash::Hash;
use crate::names;
use std::path::Path;
use tracing::{debug, instrument};

/// A named binary payload with an optional user tag.
///
/// Two blobs are equal when name, content and tag are all equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blob {
    /// File name of the blob.
    pub name: String,
    /// Raw bytes; an empty vector stands for absent content.
    pub content: Vec<u8>,
    /// Opaque user data, never written to disk.
    pub tag: Option<String>,
}

impl Blob {
    /// Create a new blob.
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Read a whole file; the blob is named after the file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fsio::read_file(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                Error::invalid_argument(format!("Invalid filename: {}", path.display()))
            })?
            .to_string();

        Ok(Self::new(name, content))
    }

    /// Write the content verbatim to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.save_with(path, &SaveOptions::default())
    }

    pub fn save_with(&self, path: impl AsRef<Path>, opts: &SaveOptions) -> Result<()> {
        fsio::write_file(path.as_ref(), &self.content, opts)
    }

    /// Content length in bytes.
    pub fn len(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// BLAKE3 digest of the content.
    pub fn hash(&self) -> Hash {
        Hash::of(&self.content)
    }
}

/// Ordered, mutable collection of blobs. Names need not be unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobCollection {
    blobs: Vec<Blob>,
}

impl BlobCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Blob> {
        self.blobs.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Blob> {
        self.blobs.iter_mut()
    }

    pub fn push(&mut self, blob: Blob) {
        self.blobs.push(blob);
    }

    pub fn insert(&mut self, index: usize, blob: Blob) -> Result<()> {
        if index > self.blobs.len() {
            return Err(Error::index_out_of_range(index, self.blobs.len()));
        }
        self.blobs.insert(index, blob);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<Blob> {
        if index >= self.blobs.len() {
            return Err(Error::index_out_of_range(index, self.blobs.len()));
        }
        Ok(self.blobs.remove(index))
    }

    pub fn clear(&mut self) {
        self.blobs.clear();
    }

    pub fn get(&self, index: usize) -> Option<&Blob> {
        self.blobs.get(index)
    }

    /// Blob at `index`.
    pub fn at(&self, index: usize) -> Result<&Blob> {
        let len = self.blobs.len();
        self.blobs
            .get(index)
            .ok_or_else(|| Error::index_out_of_range(index, len))
    }

    pub fn at_mut(&mut self, index: usize) -> Result<&mut Blob> {
        let len = self.blobs.len();
        self.blobs
            .get_mut(index)
            .ok_or_else(|| Error::index_out_of_range(index, len))
    }

    /// First blob named exactly `name`.
    pub fn named(&self, name: &str) -> Result<&Blob> {
        self.find(name, false)
            .ok_or_else(|| Error::key_not_found(name))
    }

    pub fn named_mut(&mut self, name: &str) -> Result<&mut Blob> {
        self.blobs
            .iter_mut()
            .find(|b| b.name == name)
            .ok_or_else(|| Error::key_not_found(name))
    }

    /// First blob whose name matches, or `None`.
    pub fn find(&self, name: &str, ignore_case: bool) -> Option<&Blob> {
        self.blobs
            .iter()
            .find(|b| names::names_equal(&b.name, name, ignore_case))
    }

    pub fn find_mut(&mut self, name: &str, ignore_case: bool) -> Option<&mut Blob> {
        self.blobs
            .iter_mut()
            .find(|b| names::names_equal(&b.name, name, ignore_case))
    }

    /// Total content size in bytes.
    pub fn compute_size(&self) -> u64 {
        self.blobs.iter().map(Blob::len).sum()
    }

    /// One blob per file in `path`.
    ///
    /// With `recursive`, files in subdirectories are included too, flattened
    /// into this one collection.
    pub fn from_directory(path: impl AsRef<Path>, recursive: bool) -> Result<Self> {
        Self::from_directory_with(path, recursive, &WalkOptions::default())
    }

    #[instrument(level = "debug", skip(path, opts), fields(dir = %path.as_ref().display()))]
    pub fn from_directory_with(
        path: impl AsRef<Path>,
        recursive: bool,
        opts: &WalkOptions,
    ) -> Result<Self> {
        let mut blobs = Self::new();
        for entry in fsio::walk(path.as_ref(), recursive, opts)? {
            if entry.kind == EntryKind::File {
                let content = fsio::read_file(&entry.path)?;
                blobs.push(Blob::new(entry.name, content));
            }
        }

        debug!(count = blobs.len(), bytes = blobs.compute_size(), "read blobs");
        Ok(blobs)
    }

    /// Fail with [`Error::IllegalFileName`] on the first blob whose name
    /// cannot be written as a file.
    pub fn validate_names(&self) -> Result<()> {
        self.blobs
            .iter()
            .try_for_each(|b| names::validate_file_name(&b.name))
    }

    /// Write every blob as a file under `path`, overwriting existing files.
    ///
    /// All names are validated first; if any is illegal nothing is written.
    pub fn save_to_directory(&self, path: impl AsRef<Path>) -> Result<()> {
        self.save_to_directory_with(path, &SaveOptions::default())
    }

    #[instrument(level = "debug", skip(self, path, opts), fields(dir = %path.as_ref().display()))]
    pub fn save_to_directory_with(&self, path: impl AsRef<Path>, opts: &SaveOptions) -> Result<()> {
        let path = path.as_ref();
        self.validate_names()?;

        fsio::create_dir(path)?;
        self.write_all(path, opts)?;

        debug!(count = self.len(), "wrote blobs");
        Ok(())
    }

    /// Write phase only; names must already be validated.
    pub(crate) fn write_all(&self, dir: &Path, opts: &SaveOptions) -> Result<()> {
        for blob in &self.blobs {
            blob.save_with(dir.join(&blob.name), opts)?;
        }
        Ok(())
    }
}

impl FromIterator<Blob> for BlobCollection {
    fn from_iter<I: IntoIterator<Item = Blob>>(iter: I) -> Self {
        Self {
            blobs: iter.into_iter().collect(),
        }
    }
}

impl Extend<Blob> for BlobCollection {
    fn extend<I: IntoIterator<Item = Blob>>(&mut self, iter: I) {
        self.blobs.extend(iter);
    }
}

impl IntoIterator for BlobCollection {
    type Item = Blob;
    type IntoIter = std::vec::IntoIter<Blob>;

    fn into_iter(self) -> Self::IntoIter {
        self.blobs.into_iter()
    }
}

impl<'a> IntoIterator for &'a BlobCollection {
    type Item = &'a Blob;
    type IntoIter = std::slice::Iter<'a, Blob>;

    fn into_iter(self) -> Self::IntoIter {
        self.blobs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_blob_equality() {
        let a = Blob::new("a", vec![1, 2]);
        assert_eq!(a, Blob::new("a", vec![1, 2]));
        assert_ne!(a, Blob::new("b", vec![1, 2]));
        assert_ne!(a, Blob::new("a", vec![1, 3]));
        assert_ne!(a, Blob::new("a", vec![1, 2]).with_tag("t"));
        assert_eq!(a.clone().with_tag("t"), Blob::new("a", vec![1, 2]).with_tag("t"));
    }

    #[test]
    fn test_blob_from_file_and_save() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("data.bin");
        fs::write(&src, [0u8, 1, 2, 255]).unwrap();

        let blob = Blob::from_file(&src).unwrap();
        assert_eq!(blob.name, "data.bin");
        assert_eq!(blob.content, vec![0, 1, 2, 255]);

        let dest = temp_dir.path().join("copy.bin");
        blob.save(&dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), vec![0, 1, 2, 255]);
    }

    #[test]
    fn test_blob_from_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = Blob::from_file(temp_dir.path().join("missing"));
        assert!(matches!(result, Err(Error::NotFound { .. })));
        assert!(matches!(
            Blob::from_file(""),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_indexers() {
        let blobs: BlobCollection = vec![
            Blob::new("a", b"1".to_vec()),
            Blob::new("b", b"2".to_vec()),
            Blob::new("a", b"3".to_vec()),
        ]
        .into_iter()
        .collect();

        assert_eq!(blobs.at(1).unwrap().name, "b");
        assert!(matches!(
            blobs.at(3),
            Err(Error::IndexOutOfRange { index: 3, len: 3 })
        ));

        // First match wins
        assert_eq!(blobs.named("a").unwrap().content, b"1");
        assert!(matches!(blobs.named("A"), Err(Error::KeyNotFound { .. })));
        assert!(matches!(blobs.named("c"), Err(Error::KeyNotFound { .. })));
    }

    #[test]
    fn test_insert_remove() {
        let mut blobs = BlobCollection::new();
        blobs.push(Blob::new("b", Vec::new()));
        blobs.insert(0, Blob::new("a", Vec::new())).unwrap();
        assert!(blobs.insert(5, Blob::new("z", Vec::new())).is_err());

        assert_eq!(blobs.remove(0).unwrap().name, "a");
        assert_eq!(blobs.len(), 1);
        assert!(blobs.remove(1).is_err());
    }

    #[test]
    fn test_compute_size() {
        let mut blobs = BlobCollection::new();
        assert_eq!(blobs.compute_size(), 0);

        blobs.push(Blob::new("a", vec![0; 10]));
        blobs.push(Blob::new("empty", Vec::new()));
        blobs.push(Blob::new("b", vec![0; 5]));
        assert_eq!(blobs.compute_size(), 15);
    }

    #[test]
    fn test_from_directory_flat_and_recursive() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("top.txt"), b"top").unwrap();
        fs::create_dir(temp_dir.path().join("sub")).unwrap();
        fs::write(temp_dir.path().join("sub").join("inner.txt"), b"inner").unwrap();

        let flat = BlobCollection::from_directory(temp_dir.path(), false).unwrap();
        assert_eq!(flat.len(), 1);
        assert_eq!(flat.at(0).unwrap().name, "top.txt");

        let deep = BlobCollection::from_directory(temp_dir.path(), true).unwrap();
        let names: Vec<&str> = deep.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"inner.txt"));
        assert!(names.contains(&"top.txt"));
        assert_eq!(deep.compute_size(), 8);
    }

    #[test]
    fn test_from_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result = BlobCollection::from_directory(temp_dir.path().join("gone"), false);
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_save_to_directory_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("out");
        fs::create_dir(&out).unwrap();
        fs::write(out.join("a.txt"), b"stale data").unwrap();

        let mut blobs = BlobCollection::new();
        blobs.push(Blob::new("a.txt", b"fresh".to_vec()));
        blobs.push(Blob::new("b.txt", b"new".to_vec()));
        blobs.save_to_directory(&out).unwrap();

        assert_eq!(fs::read(out.join("a.txt")).unwrap(), b"fresh");
        assert_eq!(fs::read(out.join("b.txt")).unwrap(), b"new");
    }

    #[test]
    fn test_save_validates_before_writing() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("out");

        let mut blobs = BlobCollection::new();
        blobs.push(Blob::new("good.txt", b"ok".to_vec()));
        blobs.push(Blob::new("a:b", b"bad".to_vec()));

        let result = blobs.save_to_directory(&out);
        assert!(matches!(result, Err(Error::IllegalFileName { ref name }) if name == "a:b"));
        assert!(!out.join("good.txt").exists());
    }
}
