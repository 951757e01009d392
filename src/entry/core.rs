//! Defines the core data models and database queries shared by incomes and
//! expenses.

use rusqlite::{Connection, params};
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    database_id::DatabaseId,
    endpoints,
    validation::{FieldErrors, Fields, MAX_TEXT_LENGTH},
};

/// The two kinds of money movement, which share the same fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Money received.
    Income,
    /// Money spent.
    Expense,
}

impl EntryKind {
    /// The name of the table that stores this kind of entry.
    pub fn table(self) -> &'static str {
        match self {
            EntryKind::Income => "income",
            EntryKind::Expense => "expense",
        }
    }

    /// The singular, capitalised name, e.g. "Income".
    pub fn name(self) -> &'static str {
        match self {
            EntryKind::Income => "Income",
            EntryKind::Expense => "Expense",
        }
    }

    /// The plural, capitalised name, e.g. "Incomes".
    pub fn plural_name(self) -> &'static str {
        match self {
            EntryKind::Income => "Incomes",
            EntryKind::Expense => "Expenses",
        }
    }

    pub fn list_view(self) -> &'static str {
        match self {
            EntryKind::Income => endpoints::INCOMES_VIEW,
            EntryKind::Expense => endpoints::EXPENSES_VIEW,
        }
    }

    pub fn new_view(self) -> &'static str {
        match self {
            EntryKind::Income => endpoints::NEW_INCOME_VIEW,
            EntryKind::Expense => endpoints::NEW_EXPENSE_VIEW,
        }
    }

    pub fn edit_view(self) -> &'static str {
        match self {
            EntryKind::Income => endpoints::EDIT_INCOME_VIEW,
            EntryKind::Expense => endpoints::EDIT_EXPENSE_VIEW,
        }
    }

    pub fn collection_api(self) -> &'static str {
        match self {
            EntryKind::Income => endpoints::INCOMES_API,
            EntryKind::Expense => endpoints::EXPENSES_API,
        }
    }

    pub fn item_api(self) -> &'static str {
        match self {
            EntryKind::Income => endpoints::INCOME_API,
            EntryKind::Expense => endpoints::EXPENSE_API,
        }
    }
}

/// The fields of an income or expense.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryData {
    /// What the money was for.
    #[serde(rename = "descripcion")]
    pub description: String,
    /// The amount of money, never negative.
    #[serde(rename = "monto")]
    pub amount: f64,
    /// When the money was received or spent.
    #[serde(rename = "fecha")]
    pub date: Date,
    /// A free-form category, e.g. "Groceries".
    #[serde(rename = "categoria")]
    pub category: Option<String>,
    #[serde(rename = "notas")]
    pub notes: Option<String>,
}

impl EntryData {
    /// Validate the request `fields`.
    ///
    /// When updating, `current` holds the stored data and fields that are
    /// absent from the request keep their stored value.
    ///
    /// # Errors
    /// Returns an [Error::Validation] listing every invalid field.
    pub fn from_fields(fields: &Fields, current: Option<EntryData>) -> Result<Self, Error> {
        let mut errors = FieldErrors::new();

        let (description, amount, date, category, notes) = match current {
            Some(current) => (
                Some(current.description),
                Some(current.amount),
                Some(current.date),
                current.category,
                current.notes,
            ),
            None => (None, None, None, None, None),
        };

        let description = fields
            .text("descripcion", Some(MAX_TEXT_LENGTH), &mut errors)
            .required("descripcion", description, &mut errors);
        let amount = fields
            .amount("monto", &mut errors)
            .required("monto", amount, &mut errors);
        let date = fields
            .date("fecha", &mut errors)
            .required("fecha", date, &mut errors);
        let category = fields
            .text("categoria", Some(MAX_TEXT_LENGTH), &mut errors)
            .nullable(category);
        let notes = fields.text("notas", None, &mut errors).nullable(notes);

        match (description, amount, date) {
            (Some(description), Some(amount), Some(date)) if errors.is_empty() => Ok(Self {
                description,
                amount,
                date,
                category,
                notes,
            }),
            _ => Err(Error::Validation(errors)),
        }
    }
}

/// An income or expense.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    /// The ID of the entry.
    pub id: DatabaseId,
    #[serde(flatten)]
    pub data: EntryData,
}

pub fn create_entry_table(kind: EntryKind, connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                amount REAL NOT NULL,
                date TEXT NOT NULL,
                category TEXT,
                notes TEXT
            )",
            kind.table()
        ),
        (),
    )?;

    Ok(())
}

pub fn map_row_to_entry(row: &rusqlite::Row) -> Result<Entry, rusqlite::Error> {
    let id = row.get(0)?;
    let description = row.get(1)?;
    let amount = row.get(2)?;
    let date = row.get(3)?;
    let category = row.get(4)?;
    let notes = row.get(5)?;

    Ok(Entry {
        id,
        data: EntryData {
            description,
            amount,
            date,
            category,
            notes,
        },
    })
}

/// Save a new entry and return it with its ID.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an unexpected SQL error.
pub fn insert_entry(
    kind: EntryKind,
    data: EntryData,
    connection: &Connection,
) -> Result<Entry, Error> {
    connection.execute(
        &format!(
            "INSERT INTO {} (description, amount, date, category, notes) VALUES (?1, ?2, ?3, ?4, ?5)",
            kind.table()
        ),
        params![
            data.description,
            data.amount,
            data.date,
            data.category,
            data.notes
        ],
    )?;

    Ok(Entry {
        id: connection.last_insert_rowid(),
        data,
    })
}

/// Retrieve an entry by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid entry,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_entry(kind: EntryKind, id: DatabaseId, connection: &Connection) -> Result<Entry, Error> {
    let entry = connection
        .prepare(&format!(
            "SELECT id, description, amount, date, category, notes FROM {} WHERE id = :id",
            kind.table()
        ))?
        .query_one(&[(":id", &id)], map_row_to_entry)?;

    Ok(entry)
}

/// Retrieve all entries, newest first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an unexpected SQL error.
pub fn list_entries(kind: EntryKind, connection: &Connection) -> Result<Vec<Entry>, Error> {
    connection
        .prepare(&format!(
            "SELECT id, description, amount, date, category, notes FROM {}
            ORDER BY date DESC, id DESC",
            kind.table()
        ))?
        .query_map([], map_row_to_entry)?
        .map(|maybe_entry| maybe_entry.map_err(Error::from))
        .collect()
}

/// Replace the data of the entry `id`.
///
/// # Errors
/// Returns an [Error::NotFound] if `id` does not refer to a valid entry, or
/// an [Error::SqlError] if there is some other SQL error.
pub fn update_entry(
    kind: EntryKind,
    id: DatabaseId,
    data: EntryData,
    connection: &Connection,
) -> Result<Entry, Error> {
    let rows_affected = connection.execute(
        &format!(
            "UPDATE {} SET description = ?1, amount = ?2, date = ?3, category = ?4, notes = ?5
            WHERE id = ?6",
            kind.table()
        ),
        params![
            data.description,
            data.amount,
            data.date,
            data.category,
            data.notes,
            id
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(Entry { id, data })
}

/// Delete the entry `id`.
///
/// # Errors
/// Returns an [Error::NotFound] if `id` does not refer to a valid entry, or
/// an [Error::SqlError] if there is some other SQL error.
pub fn delete_entry(kind: EntryKind, id: DatabaseId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        &format!("DELETE FROM {} WHERE id = :id", kind.table()),
        &[(":id", &id)],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}




#[cfg(test)]
mod from_fields_tests {
    use serde_json::json;
    use time::macros::date;

    use crate::{
        Error,
        entry::core::{EntryData, test_data::office_supplies},
        validation::Fields,
    };

    fn fields(value: serde_json::Value) -> Fields {
        Fields::from_json(value).unwrap()
    }

    #[test]
    fn accepts_valid_fields() {
        let got = EntryData::from_fields(
            &fields(json!({
                "descripcion": "Office supplies",
                "monto": "42.50",
                "fecha": "2025-01-10",
                "categoria": "Work",
            })),
            None,
        );

        assert_eq!(got, Ok(office_supplies()));
    }

    #[test]
    fn rejects_negative_amount_and_bad_date() {
        let got = EntryData::from_fields(
            &fields(json!({
                "descripcion": "Office supplies",
                "monto": -1,
                "fecha": "not-a-date",
            })),
            None,
        );

        let Err(Error::Validation(errors)) = got else {
            panic!("want validation error");
        };
        assert!(errors.get("monto").is_some());
        assert!(errors.get("fecha").is_some());
        assert!(errors.get("descripcion").is_none());
    }

    #[test]
    fn requires_fields_on_create() {
        let got = EntryData::from_fields(&fields(json!({})), None);

        let Err(Error::Validation(errors)) = got else {
            panic!("want validation error");
        };
        assert_eq!(
            errors.get("descripcion"),
            Some(&["The descripcion field is required.".to_owned()][..])
        );
        assert!(errors.get("monto").is_some());
        assert!(errors.get("fecha").is_some());
    }

    #[test]
    fn update_keeps_absent_fields_and_clears_null_ones() {
        let got = EntryData::from_fields(
            &fields(json!({ "fecha": "2025-02-01", "categoria": null })),
            Some(office_supplies()),
        );

        assert_eq!(
            got,
            Ok(EntryData {
                date: date!(2025 - 02 - 01),
                category: None,
                ..office_supplies()
            })
        );
    }

    #[test]
    fn update_rejects_null_required_field() {
        let got = EntryData::from_fields(
            &fields(json!({ "descripcion": "" })),
            Some(office_supplies()),
        );

        assert!(matches!(got, Err(Error::Validation(_))));
    }
}
