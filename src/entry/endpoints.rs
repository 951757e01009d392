//! The JSON API for incomes and expenses.
//!
//! The income and expense route handlers are thin wrappers that pick an
//! [EntryKind] and call into the functions here.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::Value;

use crate::{
    AppState, Error,
    api_response::{created, deleted, failed, updated},
    database_id::DatabaseId,
    entry::core::{
        Entry, EntryData, EntryKind, delete_entry, get_entry, insert_entry, list_entries,
        update_entry,
    },
    search::SearchQuery,
    validation::fields_from_json,
};

/// The state needed to manage incomes and expenses.
#[derive(Debug, Clone)]
pub struct EntryState {
    /// The database connection for managing entries.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EntryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Retrieve the entries that match `query`, newest first.
///
/// # Errors
/// Returns an error if the database lock cannot be acquired or there is an
/// SQL error.
pub fn search_entries(
    kind: EntryKind,
    state: &EntryState,
    query: &SearchQuery,
) -> Result<Vec<Entry>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let entries = list_entries(kind, &connection)?;

    Ok(query.filter(entries, |entry| {
        let mut keys = vec![entry.data.description.as_str()];
        keys.extend(entry.data.category.as_deref());
        keys
    }))
}

/// Retrieve a single entry.
///
/// # Errors
/// Returns an [Error::NotFound] if `id` does not refer to a valid entry.
pub fn find_entry(kind: EntryKind, state: &EntryState, id: DatabaseId) -> Result<Entry, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_entry(kind, id, &connection)
}

pub fn list_entries_response(kind: EntryKind, state: &EntryState, query: &SearchQuery) -> Response {
    match search_entries(kind, state, query) {
        Ok(entries) => Json(entries).into_response(),
        Err(error) => error.into_response(),
    }
}

pub fn get_entry_response(kind: EntryKind, state: &EntryState, id: DatabaseId) -> Response {
    match find_entry(kind, state, id) {
        Ok(entry) => Json(entry).into_response(),
        Err(error) => error.into_response(),
    }
}

pub fn create_entry_response(
    kind: EntryKind,
    state: &EntryState,
    is_htmx: bool,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let result = fields_from_json(payload)
        .and_then(|fields| EntryData::from_fields(&fields, None))
        .and_then(|data| {
            let connection = state
                .db_connection
                .lock()
                .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
                .map_err(|_| Error::DatabaseLockError)?;

            insert_entry(kind, data, &connection)
        });

    match result {
        Ok(entry) => {
            tracing::info!("created {} {}", kind.table(), entry.id);
            created(is_htmx, entry, kind.list_view())
        }
        Err(error) => failed(is_htmx, error),
    }
}

pub fn update_entry_response(
    kind: EntryKind,
    state: &EntryState,
    is_htmx: bool,
    id: DatabaseId,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let result = fields_from_json(payload).and_then(|fields| {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let current = get_entry(kind, id, &connection)?;
        let data = EntryData::from_fields(&fields, Some(current.data))?;

        update_entry(kind, id, data, &connection)
    });

    match result {
        Ok(entry) => updated(is_htmx, entry, kind.list_view()),
        Err(error) => failed(is_htmx, error),
    }
}

pub fn delete_entry_response(
    kind: EntryKind,
    state: &EntryState,
    is_htmx: bool,
    id: DatabaseId,
) -> Response {
    let result = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)
        .and_then(|connection| delete_entry(kind, id, &connection));

    match result {
        Ok(()) => {
            tracing::info!("deleted {} {id}", kind.table());
            deleted(is_htmx, &format!("{} deleted successfully", kind.name()))
        }
        Err(error) => failed(is_htmx, error),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Json, http::StatusCode};
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{
        entry::{
            core::{EntryKind, get_entry, insert_entry, test_data::office_supplies},
            endpoints::{
                EntryState, create_entry_response, delete_entry_response, list_entries_response,
                update_entry_response,
            },
        },
        initialize_db,
        search::SearchQuery,
        test_utils::{assert_hx_redirect, json_body},
    };

    fn get_test_state() -> EntryState {
        let connection = Connection::open_in_memory().unwrap();
        initialize_db(&connection).unwrap();

        EntryState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn create_returns_created_entry() {
        let state = get_test_state();

        let response = create_entry_response(
            EntryKind::Income,
            &state,
            false,
            Ok(Json(json!({
                "descripcion": "Salary",
                "monto": 1000,
                "fecha": "2025-01-31",
            }))),
        );

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(
            body,
            json!({
                "id": 1,
                "descripcion": "Salary",
                "monto": 1000.0,
                "fecha": "2025-01-31",
                "categoria": null,
                "notas": null,
            })
        );
    }

    #[tokio::test]
    async fn create_from_htmx_redirects_to_list_page() {
        let state = get_test_state();

        let response = create_entry_response(
            EntryKind::Expense,
            &state,
            true,
            Ok(Json(json!({
                "descripcion": "Rent",
                "monto": "500",
                "fecha": "2025-01-01",
            }))),
        );

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, "/expenses");
    }

    #[tokio::test]
    async fn create_rejects_invalid_fields() {
        let state = get_test_state();

        let response = create_entry_response(
            EntryKind::Expense,
            &state,
            false,
            Ok(Json(json!({
                "descripcion": "Rent",
                "monto": -1,
                "fecha": "not-a-date",
            }))),
        );

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["errors"]["monto"].is_array());
        assert!(body["errors"]["fecha"].is_array());
    }

    #[tokio::test]
    async fn list_filters_by_description() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            insert_entry(EntryKind::Expense, office_supplies(), &connection).unwrap();
        }

        let matching = list_entries_response(
            EntryKind::Expense,
            &state,
            &SearchQuery {
                search: Some("SUPPLIES".to_owned()),
            },
        );
        let not_matching = list_entries_response(
            EntryKind::Expense,
            &state,
            &SearchQuery {
                search: Some("rent".to_owned()),
            },
        );

        assert_eq!(json_body(matching).await.as_array().map(Vec::len), Some(1));
        assert_eq!(json_body(not_matching).await, Value::Array(vec![]));
    }

    #[tokio::test]
    async fn list_finds_entry_by_category() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            insert_entry(EntryKind::Expense, office_supplies(), &connection).unwrap();
        }

        let response = list_entries_response(
            EntryKind::Expense,
            &state,
            &SearchQuery {
                search: Some("work".to_owned()),
            },
        );

        let body = json_body(response).await;
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert_eq!(body[0]["categoria"], "Work");
    }

    #[tokio::test]
    async fn update_changes_only_given_fields() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            insert_entry(EntryKind::Income, office_supplies(), &connection).unwrap();
        }

        let response = update_entry_response(
            EntryKind::Income,
            &state,
            false,
            1,
            Ok(Json(json!({ "monto": 10 }))),
        );

        assert_eq!(response.status(), StatusCode::OK);
        let connection = state.db_connection.lock().unwrap();
        let got = get_entry(EntryKind::Income, 1, &connection).unwrap();
        assert_eq!(got.data.amount, 10.0);
        assert_eq!(got.data.description, office_supplies().description);
    }

    #[tokio::test]
    async fn update_missing_entry_is_not_found() {
        let state = get_test_state();

        let response = update_entry_response(
            EntryKind::Income,
            &state,
            false,
            99,
            Ok(Json(json!({ "monto": 10 }))),
        );

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_responds_with_no_content_then_not_found() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            insert_entry(EntryKind::Income, office_supplies(), &connection).unwrap();
        }

        let first = delete_entry_response(EntryKind::Income, &state, false, 1);
        let second = delete_entry_response(EntryKind::Income, &state, false, 1);

        assert_eq!(first.status(), StatusCode::NO_CONTENT);
        assert_eq!(second.status(), StatusCode::NOT_FOUND);
    }
}
