//! Storage for the documents uploaded with invoices.
//!
//! Documents are stored outside of the database and referenced by a relative
//! path such as `invoices/0d9c...e1.pdf`. Every call to [BlobStore::put]
//! returns a new path, so a blob is never overwritten in place.

use std::{
    collections::HashMap,
    fs::{self, File},
    io::{ErrorKind, Write},
    path::{Component, Path, PathBuf},
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use uuid::Uuid;

use crate::Error;

/// The directory, relative to the store root, that invoice documents are
/// written to.
const BLOB_DIRECTORY: &str = "invoices";

/// A place to keep uploaded documents.
pub trait BlobStore: std::fmt::Debug + Send + Sync {
    /// Store `bytes` under a new, unique path ending in `extension`.
    ///
    /// # Errors
    /// Returns an [Error::Storage] if the bytes could not be written.
    fn put(&self, bytes: &[u8], extension: &str) -> Result<String, Error>;

    /// Read the blob stored at `path`.
    ///
    /// # Errors
    /// Returns an [Error::NotFound] if there is no blob at `path`, or an
    /// [Error::Storage] if it could not be read.
    fn get(&self, path: &str) -> Result<Vec<u8>, Error>;

    /// Delete the blob stored at `path`.
    ///
    /// Deleting a missing blob is not an error.
    ///
    /// # Errors
    /// Returns an [Error::Storage] if the blob exists but could not be
    /// deleted.
    fn delete(&self, path: &str) -> Result<(), Error>;
}

fn new_blob_path(extension: &str) -> String {
    format!("{BLOB_DIRECTORY}/{}.{extension}", Uuid::new_v4())
}

/// Stores blobs as files under a root directory.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    /// Create a blob store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    /// Returns an [Error::Storage] if the directory could not be created.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = root.into();

        fs::create_dir_all(root.join(BLOB_DIRECTORY)).map_err(|error| {
            Error::Storage(format!(
                "could not create the storage directory {}: {error}",
                root.display()
            ))
        })?;

        Ok(Self { root })
    }

    /// Map a blob path to a file path, refusing paths that would escape the
    /// root directory.
    fn resolve(&self, path: &str) -> Result<PathBuf, Error> {
        let relative = Path::new(path);
        let is_contained = !path.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));

        if is_contained {
            Ok(self.root.join(relative))
        } else {
            Err(Error::Storage(format!("invalid blob path {path:?}")))
        }
    }
}

impl BlobStore for FileBlobStore {
    fn put(&self, bytes: &[u8], extension: &str) -> Result<String, Error> {
        let path = new_blob_path(extension);
        let file_path = self.resolve(&path)?;
        let temp_path = file_path.with_extension(format!("{extension}.tmp"));

        let write = || -> std::io::Result<()> {
            let mut file = File::create(&temp_path)?;
            file.write_all(bytes)?;
            file.sync_all()?;
            fs::rename(&temp_path, &file_path)
        };

        write().map_err(|error| {
            // The temp file may not exist, there is nothing more to do if
            // removing it fails.
            let _ = fs::remove_file(&temp_path);
            Error::Storage(format!("could not write blob {path}: {error}"))
        })?;

        Ok(path)
    }

    fn get(&self, path: &str) -> Result<Vec<u8>, Error> {
        let file_path = self.resolve(path)?;

        fs::read(file_path).map_err(|error| match error.kind() {
            ErrorKind::NotFound => Error::NotFound,
            _ => Error::Storage(format!("could not read blob {path}: {error}")),
        })
    }

    fn delete(&self, path: &str) -> Result<(), Error> {
        let file_path = self.resolve(path)?;

        match fs::remove_file(file_path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(Error::Storage(format!(
                "could not delete blob {path}: {error}"
            ))),
        }
    }
}

/// Keeps blobs in memory.
///
/// Writes and deletes can be made to fail to check how callers recover from
/// storage errors.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryBlobStore {
    /// Create an empty blob store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following call to [BlobStore::put] fail (or succeed again).
    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Make every following call to [BlobStore::delete] fail (or succeed again).
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Whether a blob is stored at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.blobs
            .lock()
            .map(|blobs| blobs.contains_key(path))
            .unwrap_or(false)
    }

    /// The number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.lock().map(|blobs| blobs.len()).unwrap_or(0)
    }

    /// Whether no blobs are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>, Error> {
        self.blobs
            .lock()
            .map_err(|error| Error::Storage(format!("could not acquire blob store lock: {error}")))
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, bytes: &[u8], extension: &str) -> Result<String, Error> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(Error::Storage("simulated write failure".to_owned()));
        }

        let path = new_blob_path(extension);
        self.lock()?.insert(path.clone(), bytes.to_vec());

        Ok(path)
    }

    fn get(&self, path: &str) -> Result<Vec<u8>, Error> {
        self.lock()?.get(path).cloned().ok_or(Error::NotFound)
    }

    fn delete(&self, path: &str) -> Result<(), Error> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(Error::Storage("simulated delete failure".to_owned()));
        }

        self.lock()?.remove(path);

        Ok(())
    }
}
