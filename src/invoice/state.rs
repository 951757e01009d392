//! The state shared by the invoice endpoints.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{AppState, Error, blob_store::BlobStore};

/// The state needed to manage invoices and their documents.
#[derive(Debug, Clone)]
pub struct InvoiceState {
    /// The database connection for managing invoices.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Where invoice documents are kept.
    pub blob_store: Arc<dyn BlobStore>,
}

impl FromRef<AppState> for InvoiceState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            blob_store: state.blob_store.clone(),
        }
    }
}

impl InvoiceState {
    pub(super) fn connection(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)
    }

    /// Delete a document that was stored for a write that then failed.
    ///
    /// Errors are logged rather than returned so that the caller can report
    /// the original failure.
    pub(super) fn discard_document(&self, document_path: &str) {
        if let Err(error) = self.blob_store.delete(document_path) {
            tracing::error!("could not delete unused document {document_path}: {error}");
        }
    }
}

#[cfg(test)]
pub mod test_state {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;

    use crate::{
        Error,
        blob_store::{BlobStore, MemoryBlobStore},
        initialize_db,
    };

    use super::InvoiceState;

    /// An invoice state backed by an in-memory database, and its blob store.
    pub fn must_create_test_state() -> (InvoiceState, Arc<MemoryBlobStore>) {
        let connection =
            Connection::open_in_memory().expect("could not create in-memory SQLite database");
        initialize_db(&connection).expect("could not initialize test DB");
        let blob_store = Arc::new(MemoryBlobStore::new());

        let state = InvoiceState {
            db_connection: Arc::new(Mutex::new(connection)),
            blob_store: blob_store.clone(),
        };

        (state, blob_store)
    }

    /// A blob store that fails any write or delete made while the database
    /// connection is locked.
    #[derive(Debug)]
    pub struct UnlockedOnlyBlobStore {
        db_connection: Arc<Mutex<Connection>>,
        pub blobs: MemoryBlobStore,
    }

    impl UnlockedOnlyBlobStore {
        fn check_unlocked(&self) -> Result<(), Error> {
            match self.db_connection.try_lock() {
                Ok(_) => Ok(()),
                Err(_) => Err(Error::Storage("database connection is locked".to_owned())),
            }
        }
    }

    impl BlobStore for UnlockedOnlyBlobStore {
        fn put(&self, bytes: &[u8], extension: &str) -> Result<String, Error> {
            self.check_unlocked()?;
            self.blobs.put(bytes, extension)
        }

        fn get(&self, path: &str) -> Result<Vec<u8>, Error> {
            self.blobs.get(path)
        }

        fn delete(&self, path: &str) -> Result<(), Error> {
            self.check_unlocked()?;
            self.blobs.delete(path)
        }
    }

    /// An invoice state whose blob store rejects blob I/O under the database
    /// lock.
    pub fn must_create_unlocked_only_state() -> (InvoiceState, Arc<UnlockedOnlyBlobStore>) {
        let connection =
            Connection::open_in_memory().expect("could not create in-memory SQLite database");
        initialize_db(&connection).expect("could not initialize test DB");
        let db_connection = Arc::new(Mutex::new(connection));
        let blob_store = Arc::new(UnlockedOnlyBlobStore {
            db_connection: db_connection.clone(),
            blobs: MemoryBlobStore::new(),
        });

        let state = InvoiceState {
            db_connection,
            blob_store: blob_store.clone(),
        };

        (state, blob_store)
    }
}
