//! Sets up the application's SQLite database.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error,
    account::create_account_table,
    entry::{EntryKind, create_entry_table},
    invoice::create_invoice_table,
};

/// Enable foreign keys and create the tables for the domain models.
///
/// The tables are created in a single exclusive transaction, and existing
/// tables are left untouched, so calling this function on an initialized
/// database is a no-op.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an unexpected SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Foreign keys are off by default in SQLite and the pragma has no effect
    // inside a transaction.
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_entry_table(EntryKind::Income, &transaction)?;
    create_entry_table(EntryKind::Expense, &transaction)?;
    create_account_table(&transaction)?;
    create_invoice_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
