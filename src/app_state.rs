//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{BlobStore, Error, db::initialize};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// Where uploaded invoice documents are kept.
    pub blob_store: Arc<dyn BlobStore>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection and a blob
    /// store for invoice documents.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection, blob_store: Arc<dyn BlobStore>) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            blob_store,
        })
    }
}
