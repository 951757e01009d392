//! Defines the core data models and database queries for invoices.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    database_id::DatabaseId,
    validation::{FieldErrors, Fields, MAX_TEXT_LENGTH},
};

/// The kind of document attached to an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// A photo or scan, e.g. a JPEG or PNG file.
    Image,
    /// A PDF file.
    Pdf,
    /// Any other kind of file.
    Other,
}

impl DocumentType {
    /// Infer the document type from a media type such as `image/png`.
    pub fn from_media_type(media_type: &str) -> Self {
        let media_type = media_type.trim().to_ascii_lowercase();

        if media_type.starts_with("image/") {
            DocumentType::Image
        } else if media_type.starts_with("application/pdf") {
            DocumentType::Pdf
        } else {
            DocumentType::Other
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::Image => "image",
            DocumentType::Pdf => "pdf",
            DocumentType::Other => "other",
        }
    }
}

impl Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(DocumentType::Image),
            "pdf" => Ok(DocumentType::Pdf),
            "other" => Ok(DocumentType::Other),
            _ => Err(format!("unknown document type {s:?}")),
        }
    }
}

impl ToSql for DocumentType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for DocumentType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// The fields of an invoice that a client can set directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceData {
    /// A short name for the invoice, e.g. the supplier.
    #[serde(rename = "nombre")]
    pub name: String,
    /// The amount charged, never negative.
    #[serde(rename = "monto")]
    pub amount: f64,
    /// When the invoice was issued.
    #[serde(rename = "fecha_emision")]
    pub issued_on: Date,
    /// When the invoice is due to be paid.
    #[serde(rename = "fecha_vencimiento")]
    pub due_on: Option<Date>,
    /// The expense the invoice was paid with.
    #[serde(rename = "gasto_id")]
    pub expense_id: Option<DatabaseId>,
    #[serde(rename = "notas")]
    pub notes: Option<String>,
}

impl InvoiceData {
    /// Parse the request `fields`, adding any problems to `errors`.
    ///
    /// When updating, `current` holds the stored data and fields that are
    /// absent from the request keep their stored value. A `tipo_documento`
    /// field is checked but otherwise ignored, since the document type always
    /// follows the uploaded document.
    ///
    /// Returns `None` if a required field is missing or invalid.
    pub fn from_fields(
        fields: &Fields,
        current: Option<InvoiceData>,
        errors: &mut FieldErrors,
    ) -> Option<Self> {
        let (name, amount, issued_on, due_on, expense_id, notes) = match current {
            Some(current) => (
                Some(current.name),
                Some(current.amount),
                Some(current.issued_on),
                current.due_on,
                current.expense_id,
                current.notes,
            ),
            None => (None, None, None, None, None, None),
        };

        let name = fields
            .text("nombre", Some(MAX_TEXT_LENGTH), errors)
            .required("nombre", name, errors);
        let amount = fields
            .amount("monto", errors)
            .required("monto", amount, errors);
        let issued_on = fields
            .date("fecha_emision", errors)
            .required("fecha_emision", issued_on, errors);
        let due_on = fields.date("fecha_vencimiento", errors).nullable(due_on);
        let expense_id = fields.id("gasto_id", errors).nullable(expense_id);
        let notes = fields.text("notas", None, errors).nullable(notes);
        let _ = fields.choice::<DocumentType>("tipo_documento", errors);

        Some(Self {
            name: name?,
            amount: amount?,
            issued_on: issued_on?,
            due_on,
            expense_id,
            notes,
        })
    }
}

/// An invoice and the document stored for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invoice {
    /// The ID of the invoice.
    pub id: DatabaseId,
    #[serde(flatten)]
    pub data: InvoiceData,
    /// The kind of the stored document.
    #[serde(rename = "tipo_documento")]
    pub document_type: DocumentType,
    /// Where the document is kept in the blob store.
    #[serde(rename = "ruta_archivo")]
    pub document_path: String,
}

pub fn create_invoice_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS invoice (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            amount REAL NOT NULL,
            issued_on TEXT NOT NULL,
            due_on TEXT,
            document_type TEXT NOT NULL,
            expense_id INTEGER REFERENCES expense(id) ON DELETE CASCADE,
            notes TEXT,
            document_path TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS invoice_expense_id ON invoice(expense_id);",
    )?;

    Ok(())
}

const SELECT_INVOICE: &str = "SELECT id, name, amount, issued_on, due_on, document_type, \
    expense_id, notes, document_path FROM invoice";

pub fn map_row_to_invoice(row: &rusqlite::Row) -> Result<Invoice, rusqlite::Error> {
    Ok(Invoice {
        id: row.get(0)?,
        data: InvoiceData {
            name: row.get(1)?,
            amount: row.get(2)?,
            issued_on: row.get(3)?,
            due_on: row.get(4)?,
            expense_id: row.get(6)?,
            notes: row.get(7)?,
        },
        document_type: row.get(5)?,
        document_path: row.get(8)?,
    })
}

/// Check that `expense_id` refers to an existing expense, adding an error for
/// `gasto_id` if it does not.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an unexpected SQL error.
pub fn check_expense_reference(
    expense_id: Option<DatabaseId>,
    connection: &Connection,
    errors: &mut FieldErrors,
) -> Result<(), Error> {
    let Some(expense_id) = expense_id else {
        return Ok(());
    };

    let exists: bool = connection.query_row(
        "SELECT EXISTS(SELECT 1 FROM expense WHERE id = ?1)",
        params![expense_id],
        |row| row.get(0),
    )?;

    if !exists {
        errors.add("gasto_id", "The selected gasto id is invalid.");
    }

    Ok(())
}

/// Save a new invoice that points at the blob `document_path`.
///
/// # Errors
/// Returns an [Error::Validation] if the expense does not exist, or an
/// [Error::SqlError] if there is some other SQL error.
pub fn insert_invoice(
    data: InvoiceData,
    document_type: DocumentType,
    document_path: String,
    connection: &Connection,
) -> Result<Invoice, Error> {
    connection.execute(
        "INSERT INTO invoice
            (name, amount, issued_on, due_on, document_type, expense_id, notes, document_path)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            data.name,
            data.amount,
            data.issued_on,
            data.due_on,
            document_type,
            data.expense_id,
            data.notes,
            document_path
        ],
    )?;

    Ok(Invoice {
        id: connection.last_insert_rowid(),
        data,
        document_type,
        document_path,
    })
}

/// Retrieve an invoice by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid invoice,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_invoice(id: DatabaseId, connection: &Connection) -> Result<Invoice, Error> {
    let invoice = connection
        .prepare(&format!("{SELECT_INVOICE} WHERE id = :id"))?
        .query_one(&[(":id", &id)], map_row_to_invoice)?;

    Ok(invoice)
}

/// Retrieve all invoices, most recently issued first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an unexpected SQL error.
pub fn list_invoices(connection: &Connection) -> Result<Vec<Invoice>, Error> {
    connection
        .prepare(&format!("{SELECT_INVOICE} ORDER BY issued_on DESC, id DESC"))?
        .query_map([], map_row_to_invoice)?
        .map(|maybe_invoice| maybe_invoice.map_err(Error::from))
        .collect()
}

/// Retrieve the invoices attached to the expense `expense_id`, most recently
/// issued first.
///
/// An expense without invoices, or a missing expense, gives an empty list.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an unexpected SQL error.
pub fn list_invoices_for_expense(
    expense_id: DatabaseId,
    connection: &Connection,
) -> Result<Vec<Invoice>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_INVOICE} WHERE expense_id = :expense_id ORDER BY issued_on DESC, id DESC"
        ))?
        .query_map(&[(":expense_id", &expense_id)], map_row_to_invoice)?
        .map(|maybe_invoice| maybe_invoice.map_err(Error::from))
        .collect()
}

/// Overwrite the stored row for `invoice`.
///
/// # Errors
/// Returns an [Error::NotFound] if the invoice does not exist, an
/// [Error::Validation] if the expense does not exist, or an
/// [Error::SqlError] if there is some other SQL error.
pub fn update_invoice_row(invoice: &Invoice, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE invoice SET
            name = ?1, amount = ?2, issued_on = ?3, due_on = ?4, document_type = ?5,
            expense_id = ?6, notes = ?7, document_path = ?8
        WHERE id = ?9",
        params![
            invoice.data.name,
            invoice.data.amount,
            invoice.data.issued_on,
            invoice.data.due_on,
            invoice.document_type,
            invoice.data.expense_id,
            invoice.data.notes,
            invoice.document_path,
            invoice.id
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete the invoice row `id` and return the path of its document.
///
/// # Errors
/// Returns an [Error::NotFound] if the invoice does not exist, or an
/// [Error::SqlError] if there is some other SQL error.
pub fn delete_invoice_row(id: DatabaseId, connection: &Connection) -> Result<String, Error> {
    let document_path = connection.query_row(
        "DELETE FROM invoice WHERE id = ?1 RETURNING document_path",
        params![id],
        |row| row.get(0),
    )?;

    Ok(document_path)
}

/// Delete every invoice attached to the expense `expense_id` and return the
/// paths of their documents.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an unexpected SQL error.
pub fn delete_invoices_for_expense(
    expense_id: DatabaseId,
    connection: &Connection,
) -> Result<Vec<String>, Error> {
    connection
        .prepare("DELETE FROM invoice WHERE expense_id = ?1 RETURNING document_path")?
        .query_map(params![expense_id], |row| row.get(0))?
        .map(|maybe_path| maybe_path.map_err(Error::from))
        .collect()
}



#[cfg(test)]
mod store_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error, FieldErrors,
        entry::{EntryKind, insert_entry, test_data::office_supplies},
        initialize_db,
        invoice::core::{
            DocumentType, check_expense_reference, delete_invoice_row,
            delete_invoices_for_expense, get_invoice, insert_invoice, list_invoices,
            list_invoices_for_expense, test_data::receipt, update_invoice_row, InvoiceData,
        },
    };

    #[track_caller]
    fn must_create_test_connection() -> Connection {
        let connection =
            Connection::open_in_memory().expect("could not create in-memory SQLite database");
        initialize_db(&connection).expect("could not initialize test DB");

        connection
    }

    #[test]
    fn insert_then_get() {
        let connection = must_create_test_connection();

        let want = insert_invoice(
            receipt(None),
            DocumentType::Pdf,
            "invoices/a.pdf".to_owned(),
            &connection,
        )
        .unwrap();
        let got = get_invoice(want.id, &connection).unwrap();

        assert_eq!(want, got);
    }

    #[test]
    fn insert_with_missing_expense_is_rejected_by_foreign_key() {
        let connection = must_create_test_connection();

        let got = insert_invoice(
            receipt(Some(42)),
            DocumentType::Pdf,
            "invoices/a.pdf".to_owned(),
            &connection,
        );

        assert!(matches!(got, Err(Error::Validation(_))), "got {got:?}");
    }

    #[test]
    fn check_expense_reference_flags_missing_expense() {
        let connection = must_create_test_connection();
        let expense = insert_entry(EntryKind::Expense, office_supplies(), &connection).unwrap();
        let mut errors = FieldErrors::new();

        check_expense_reference(Some(expense.id), &connection, &mut errors).unwrap();
        check_expense_reference(None, &connection, &mut errors).unwrap();
        assert!(errors.is_empty());

        check_expense_reference(Some(expense.id + 1), &connection, &mut errors).unwrap();
        assert!(errors.get("gasto_id").is_some());
    }

    #[test]
    fn lists_by_expense_newest_first() {
        let connection = must_create_test_connection();
        let expense = insert_entry(EntryKind::Expense, office_supplies(), &connection).unwrap();
        let older = insert_invoice(
            InvoiceData {
                issued_on: date!(2024 - 01 - 01),
                ..receipt(Some(expense.id))
            },
            DocumentType::Image,
            "invoices/older.png".to_owned(),
            &connection,
        )
        .unwrap();
        let newer = insert_invoice(
            receipt(Some(expense.id)),
            DocumentType::Image,
            "invoices/newer.png".to_owned(),
            &connection,
        )
        .unwrap();
        insert_invoice(
            receipt(None),
            DocumentType::Pdf,
            "invoices/unattached.pdf".to_owned(),
            &connection,
        )
        .unwrap();

        let got: Vec<_> = list_invoices_for_expense(expense.id, &connection)
            .unwrap()
            .into_iter()
            .map(|invoice| invoice.id)
            .collect();

        assert_eq!(got, [newer.id, older.id]);
        assert_eq!(list_invoices(&connection).unwrap().len(), 3);
        assert_eq!(list_invoices_for_expense(999, &connection), Ok(vec![]));
    }

    #[test]
    fn update_missing_invoice_is_not_found() {
        let connection = must_create_test_connection();
        let mut invoice = insert_invoice(
            receipt(None),
            DocumentType::Pdf,
            "invoices/a.pdf".to_owned(),
            &connection,
        )
        .unwrap();
        invoice.id += 1;

        assert_eq!(update_invoice_row(&invoice, &connection), Err(Error::NotFound));
    }

    #[test]
    fn delete_returns_document_path() {
        let connection = must_create_test_connection();
        let invoice = insert_invoice(
            receipt(None),
            DocumentType::Pdf,
            "invoices/a.pdf".to_owned(),
            &connection,
        )
        .unwrap();

        assert_eq!(
            delete_invoice_row(invoice.id, &connection),
            Ok("invoices/a.pdf".to_owned())
        );
        assert_eq!(delete_invoice_row(invoice.id, &connection), Err(Error::NotFound));
    }

    #[test]
    fn delete_for_expense_only_removes_its_invoices() {
        let connection = must_create_test_connection();
        let expense = insert_entry(EntryKind::Expense, office_supplies(), &connection).unwrap();
        for path in ["invoices/a.pdf", "invoices/b.pdf"] {
            insert_invoice(
                receipt(Some(expense.id)),
                DocumentType::Pdf,
                path.to_owned(),
                &connection,
            )
            .unwrap();
        }
        let other = insert_invoice(
            receipt(None),
            DocumentType::Pdf,
            "invoices/c.pdf".to_owned(),
            &connection,
        )
        .unwrap();

        let mut paths = delete_invoices_for_expense(expense.id, &connection).unwrap();
        paths.sort();

        assert_eq!(paths, ["invoices/a.pdf", "invoices/b.pdf"]);
        assert_eq!(list_invoices(&connection), Ok(vec![other]));
    }
}

#[cfg(test)]
mod from_fields_tests {
    use serde_json::json;
    use time::macros::date;

    use crate::{
        FieldErrors,
        invoice::core::{InvoiceData, test_data::receipt},
        validation::Fields,
    };

    #[test]
    fn parses_multipart_style_strings() {
        let mut fields = Fields::new();
        fields.insert_text("nombre", "Receipt".to_owned());
        fields.insert_text("monto", "42.50".to_owned());
        fields.insert_text("fecha_emision", "2025-01-10".to_owned());
        fields.insert_text("fecha_vencimiento", "".to_owned());
        fields.insert_text("gasto_id", "1".to_owned());
        let mut errors = FieldErrors::new();

        let got = InvoiceData::from_fields(&fields, None, &mut errors);

        assert!(errors.is_empty(), "got errors {errors:?}");
        assert_eq!(got, Some(receipt(Some(1))));
    }

    #[test]
    fn validates_but_ignores_document_type() {
        let fields = Fields::from_json(json!({ "tipo_documento": "spreadsheet" })).unwrap();
        let mut errors = FieldErrors::new();

        let got = InvoiceData::from_fields(&fields, Some(receipt(None)), &mut errors);

        assert_eq!(got, Some(receipt(None)));
        assert_eq!(
            errors.get("tipo_documento"),
            Some(&["The selected tipo documento is invalid.".to_owned()][..])
        );
    }

    #[test]
    fn update_can_detach_expense_and_set_due_date() {
        let fields = Fields::from_json(json!({
            "gasto_id": null,
            "fecha_vencimiento": "2025-02-10",
        }))
        .unwrap();
        let mut errors = FieldErrors::new();

        let got = InvoiceData::from_fields(&fields, Some(receipt(Some(1))), &mut errors);

        assert!(errors.is_empty());
        assert_eq!(
            got,
            Some(InvoiceData {
                due_on: Some(date!(2025 - 02 - 10)),
                ..receipt(None)
            })
        );
    }

    #[test]
    fn reports_all_missing_fields_on_create() {
        let mut errors = FieldErrors::new();

        let got = InvoiceData::from_fields(&Fields::new(), None, &mut errors);

        assert_eq!(got, None);
        assert!(errors.get("nombre").is_some());
        assert!(errors.get("monto").is_some());
        assert!(errors.get("fecha_emision").is_some());
    }
}
