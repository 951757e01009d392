//! Defines the core data models and database queries for service accounts.

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
    validation::{Field, FieldErrors, Fields, MAX_TEXT_LENGTH},
};

/// The kind of service an account is for.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Outlook,
    Hostinger,
    #[default]
    Other,
}

impl ServiceType {
    pub const ALL: [ServiceType; 3] = [
        ServiceType::Outlook,
        ServiceType::Hostinger,
        ServiceType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceType::Outlook => "outlook",
            ServiceType::Hostinger => "hostinger",
            ServiceType::Other => "other",
        }
    }

    /// The name to show in the user interface.
    pub fn label(self) -> &'static str {
        match self {
            ServiceType::Outlook => "Outlook",
            ServiceType::Hostinger => "Hostinger",
            ServiceType::Other => "Other",
        }
    }
}

impl Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "outlook" => Ok(ServiceType::Outlook),
            "hostinger" => Ok(ServiceType::Hostinger),
            "other" => Ok(ServiceType::Other),
            _ => Err(format!("unknown service type {s:?}")),
        }
    }
}

impl ToSql for ServiceType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for ServiceType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// The fields of an online service account, apart from its password.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountData {
    /// The name of the site or service, e.g. "Outlook".
    #[serde(rename = "nombre_pagina")]
    pub site_name: String,
    /// The email address or user name used to log in.
    #[serde(rename = "correo")]
    pub email: String,
    /// When the account was registered.
    #[serde(rename = "fecha_registro")]
    pub registered_on: Date,
    /// When the account or its subscription expires.
    #[serde(rename = "fecha_vencimiento")]
    pub expires_on: Option<Date>,
    #[serde(rename = "tipo_servicio")]
    pub service_type: ServiceType,
    #[serde(rename = "notas")]
    pub notes: Option<String>,
}

impl AccountData {
    /// Parse the request `fields`, adding any problems to `errors`.
    ///
    /// When updating, `current` holds the stored data and fields that are
    /// absent from the request keep their stored value. A null service type
    /// resets it to [ServiceType::Other].
    ///
    /// Returns `None` if a required field is missing or invalid.
    pub fn from_fields(
        fields: &Fields,
        current: Option<AccountData>,
        errors: &mut FieldErrors,
    ) -> Option<Self> {
        let (site_name, email, registered_on, expires_on, service_type, notes) = match current {
            Some(current) => (
                Some(current.site_name),
                Some(current.email),
                Some(current.registered_on),
                current.expires_on,
                current.service_type,
                current.notes,
            ),
            None => (None, None, None, None, ServiceType::default(), None),
        };

        let site_name = fields
            .text("nombre_pagina", Some(MAX_TEXT_LENGTH), errors)
            .required("nombre_pagina", site_name, errors);
        let email = fields
            .text("correo", Some(MAX_TEXT_LENGTH), errors)
            .required("correo", email, errors);
        let registered_on = fields
            .date("fecha_registro", errors)
            .required("fecha_registro", registered_on, errors);
        let expires_on = fields.date("fecha_vencimiento", errors).nullable(expires_on);
        let service_type = match fields.choice("tipo_servicio", errors) {
            Field::Value(service_type) => service_type,
            Field::Null => ServiceType::default(),
            Field::Absent | Field::Invalid => service_type,
        };
        let notes = fields.text("notas", None, errors).nullable(notes);

        Some(Self {
            site_name: site_name?,
            email: email?,
            registered_on: registered_on?,
            expires_on,
            service_type,
            notes,
        })
    }
}

/// Parse the `password` field.
///
/// The password is required when creating an account. When updating, a
/// missing or blank password means the stored password is kept, which is
/// signalled by returning `None`.
pub fn password_from_fields(
    fields: &Fields,
    is_required: bool,
    errors: &mut FieldErrors,
) -> Option<String> {
    let password = fields.text("password", Some(MAX_TEXT_LENGTH), errors);

    if is_required {
        password.required("password", None, errors)
    } else {
        password.nullable(None)
    }
}

/// A service account as it is shown to clients.
///
/// The password is write-only and never loaded into this type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub id: DatabaseId,
    #[serde(flatten)]
    pub data: AccountData,
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            site_name TEXT NOT NULL,
            email TEXT NOT NULL,
            password TEXT NOT NULL,
            registered_on TEXT NOT NULL,
            expires_on TEXT,
            service_type TEXT NOT NULL DEFAULT 'other',
            notes TEXT
        )",
        (),
    )?;

    Ok(())
}

const SELECT_ACCOUNT: &str = "SELECT id, site_name, email, registered_on, expires_on, \
    service_type, notes FROM account";

pub fn map_row_to_account(row: &rusqlite::Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: row.get(0)?,
        data: AccountData {
            site_name: row.get(1)?,
            email: row.get(2)?,
            registered_on: row.get(3)?,
            expires_on: row.get(4)?,
            service_type: row.get(5)?,
            notes: row.get(6)?,
        },
    })
}

/// Save a new account.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an unexpected SQL error.
pub fn insert_account(
    data: AccountData,
    password: &str,
    connection: &Connection,
) -> Result<Account, Error> {
    connection.execute(
        "INSERT INTO account
            (site_name, email, password, registered_on, expires_on, service_type, notes)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            data.site_name,
            data.email,
            password,
            data.registered_on,
            data.expires_on,
            data.service_type,
            data.notes
        ],
    )?;

    Ok(Account {
        id: connection.last_insert_rowid(),
        data,
    })
}

/// Retrieve an account by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid account,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_account(id: DatabaseId, connection: &Connection) -> Result<Account, Error> {
    let account = connection
        .prepare(&format!("{SELECT_ACCOUNT} WHERE id = :id"))?
        .query_one(&[(":id", &id)], map_row_to_account)?;

    Ok(account)
}

/// Retrieve all accounts sorted by site name.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an unexpected SQL error.
pub fn list_accounts(connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_ACCOUNT} ORDER BY site_name COLLATE NOCASE ASC, id ASC"
        ))?
        .query_map([], map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(Error::from))
        .collect()
}

/// Replace the data of the account `id`, and its password if one is given.
///
/// # Errors
/// Returns an [Error::NotFound] if `id` does not refer to a valid account, or
/// an [Error::SqlError] if there is some other SQL error.
pub fn update_account(
    id: DatabaseId,
    data: AccountData,
    password: Option<&str>,
    connection: &Connection,
) -> Result<Account, Error> {
    let rows_affected = connection.execute(
        "UPDATE account SET
            site_name = ?1, email = ?2, registered_on = ?3, expires_on = ?4,
            service_type = ?5, notes = ?6, password = COALESCE(?7, password)
        WHERE id = ?8",
        params![
            data.site_name,
            data.email,
            data.registered_on,
            data.expires_on,
            data.service_type,
            data.notes,
            password,
            id
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(Account { id, data })
}

/// Delete the account `id`.
///
/// # Errors
/// Returns an [Error::NotFound] if `id` does not refer to a valid account, or
/// an [Error::SqlError] if there is some other SQL error.
pub fn delete_account(id: DatabaseId, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM account WHERE id = :id", &[(":id", &id)])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}


#[cfg(test)]
mod store_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        account::core::{
            AccountData, delete_account, get_account, insert_account, list_accounts,
            test_data::{mailbox, stored_password},
            update_account,
        },
        initialize_db,
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

        let want = insert_account(mailbox(), "hunter2", &connection).unwrap();
        let got = get_account(want.id, &connection).unwrap();

        assert_eq!(want, got);
        assert_eq!(stored_password(want.id, &connection), "hunter2");
    }

    #[test]
    fn lists_by_site_name() {
        let connection = must_create_test_connection();
        for site_name in ["hostinger", "Outlook", "Amazon"] {
            insert_account(
                AccountData {
                    site_name: site_name.to_owned(),
                    ..mailbox()
                },
                "secret",
                &connection,
            )
            .unwrap();
        }

        let got: Vec<_> = list_accounts(&connection)
            .unwrap()
            .into_iter()
            .map(|account| account.data.site_name)
            .collect();

        assert_eq!(got, ["Amazon", "hostinger", "Outlook"]);
    }

    #[test]
    fn update_without_password_keeps_it() {
        let connection = must_create_test_connection();
        let account = insert_account(mailbox(), "hunter2", &connection).unwrap();

        update_account(
            account.id,
            AccountData {
                email: "new@example.com".to_owned(),
                ..mailbox()
            },
            None,
            &connection,
        )
        .unwrap();

        assert_eq!(stored_password(account.id, &connection), "hunter2");
        assert_eq!(
            get_account(account.id, &connection).unwrap().data.email,
            "new@example.com"
        );

        update_account(account.id, mailbox(), Some("correct horse"), &connection).unwrap();
        assert_eq!(stored_password(account.id, &connection), "correct horse");
    }

    #[test]
    fn update_and_delete_missing_account_are_not_found() {
        let connection = must_create_test_connection();

        assert_eq!(
            update_account(1, mailbox(), None, &connection),
            Err(Error::NotFound)
        );
        assert_eq!(delete_account(1, &connection), Err(Error::NotFound));
    }
}
