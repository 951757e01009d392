//! The JSON API for service accounts.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use axum_htmx::HxRequest;
use rusqlite::Connection;
use serde_json::Value;

use crate::{
    AppState, Error, FieldErrors,
    api_response::{created, deleted, failed, updated},
    account::core::{
        Account, AccountData, delete_account, get_account, insert_account, list_accounts,
        password_from_fields, update_account,
    },
    database_id::DatabaseId,
    endpoints,
    search::SearchQuery,
    validation::fields_from_json,
};

/// The state needed to manage service accounts.
#[derive(Debug, Clone)]
pub struct AccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

impl AccountState {
    fn connection(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)
    }
}

/// Retrieve the accounts whose site name or email matches `query`.
///
/// # Errors
/// Returns an error if the database lock cannot be acquired or there is an
/// SQL error.
pub fn search_accounts(state: &AccountState, query: &SearchQuery) -> Result<Vec<Account>, Error> {
    let accounts = list_accounts(&*state.connection()?)?;

    Ok(query.filter(accounts, |account| {
        vec![account.data.site_name.as_str(), account.data.email.as_str()]
    }))
}

/// Retrieve a single account.
///
/// # Errors
/// Returns an [Error::NotFound] if `id` does not refer to a valid account.
pub fn find_account(state: &AccountState, id: DatabaseId) -> Result<Account, Error> {
    get_account(id, &*state.connection()?)
}

/// A route handler for listing accounts, optionally filtered with `?search=`.
pub async fn list_accounts_endpoint(
    State(state): State<AccountState>,
    Query(query): Query<SearchQuery>,
) -> Response {
    match search_accounts(&state, &query) {
        Ok(accounts) => Json(accounts).into_response(),
        Err(error) => error.into_response(),
    }
}

pub async fn get_account_endpoint(
    State(state): State<AccountState>,
    Path(account_id): Path<DatabaseId>,
) -> Response {
    match find_account(&state, account_id) {
        Ok(account) => Json(account).into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler for creating an account from a JSON body.
///
/// The response never includes the password.
pub async fn create_account_endpoint(
    State(state): State<AccountState>,
    HxRequest(is_htmx): HxRequest,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let result = fields_from_json(payload).and_then(|fields| {
        let mut errors = FieldErrors::new();
        let data = AccountData::from_fields(&fields, None, &mut errors);
        let password = password_from_fields(&fields, true, &mut errors);

        let (data, password) = match (data, password) {
            (Some(data), Some(password)) if errors.is_empty() => (data, password),
            _ => return Err(Error::Validation(errors)),
        };

        insert_account(data, &password, &*state.connection()?)
    });

    match result {
        Ok(account) => {
            tracing::info!("created account {}", account.id);
            created(is_htmx, account, endpoints::ACCOUNTS_VIEW)
        }
        Err(error) => failed(is_htmx, error),
    }
}

/// A route handler for updating the fields of an account given in a JSON
/// body.
///
/// The stored password is kept unless a new one is given.
pub async fn update_account_endpoint(
    State(state): State<AccountState>,
    HxRequest(is_htmx): HxRequest,
    Path(account_id): Path<DatabaseId>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let result = fields_from_json(payload).and_then(|fields| {
        let connection = state.connection()?;
        let current = get_account(account_id, &connection)?;

        let mut errors = FieldErrors::new();
        let data = AccountData::from_fields(&fields, Some(current.data), &mut errors);
        let password = password_from_fields(&fields, false, &mut errors);

        let data = match data {
            Some(data) if errors.is_empty() => data,
            _ => return Err(Error::Validation(errors)),
        };

        update_account(account_id, data, password.as_deref(), &connection)
    });

    match result {
        Ok(account) => updated(is_htmx, account, endpoints::ACCOUNTS_VIEW),
        Err(error) => failed(is_htmx, error),
    }
}

pub async fn delete_account_endpoint(
    State(state): State<AccountState>,
    HxRequest(is_htmx): HxRequest,
    Path(account_id): Path<DatabaseId>,
) -> Response {
    let result = state
        .connection()
        .and_then(|connection| delete_account(account_id, &connection));

    match result {
        Ok(()) => {
            tracing::info!("deleted account {account_id}");
            deleted(is_htmx, "Account deleted successfully")
        }
        Err(error) => failed(is_htmx, error),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Json,
        extract::{Path, Query, State},
        http::StatusCode,
    };
    use axum_htmx::HxRequest;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        account::{
            core::{
                get_account, insert_account,
                test_data::{mailbox, stored_password},
            },
            endpoints::{
                AccountState, create_account_endpoint, delete_account_endpoint,
                list_accounts_endpoint, update_account_endpoint,
            },
        },
        initialize_db,
        search::SearchQuery,
        test_utils::{assert_hx_redirect, json_body},
    };

    fn get_test_state() -> AccountState {
        let connection = Connection::open_in_memory().unwrap();
        initialize_db(&connection).unwrap();

        AccountState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn create_never_returns_password() {
        let state = get_test_state();

        let response = create_account_endpoint(
            State(state.clone()),
            HxRequest(false),
            Ok(Json(json!({
                "nombre_pagina": "Hostinger",
                "correo": "me@example.com",
                "password": "hunter2",
                "fecha_registro": "2024-03-01",
                "tipo_servicio": "hostinger",
            }))),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(
            body,
            json!({
                "id": 1,
                "nombre_pagina": "Hostinger",
                "correo": "me@example.com",
                "fecha_registro": "2024-03-01",
                "fecha_vencimiento": null,
                "tipo_servicio": "hostinger",
                "notas": null,
            })
        );
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(stored_password(1, &connection), "hunter2");
    }

    #[tokio::test]
    async fn create_requires_password() {
        let state = get_test_state();

        let response = create_account_endpoint(
            State(state),
            HxRequest(false),
            Ok(Json(json!({
                "nombre_pagina": "Hostinger",
                "correo": "me@example.com",
                "fecha_registro": "2024-03-01",
            }))),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["errors"]["password"][0], "The password field is required.");
    }

    #[tokio::test]
    async fn update_from_htmx_redirects_and_keeps_password() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            insert_account(mailbox(), "hunter2", &connection).unwrap();
        }

        let response = update_account_endpoint(
            State(state.clone()),
            HxRequest(true),
            Path(1),
            Ok(Json(json!({ "correo": "new@example.com", "password": "" }))),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, "/accounts");
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(stored_password(1, &connection), "hunter2");
        assert_eq!(
            get_account(1, &connection).unwrap().data.email,
            "new@example.com"
        );
    }

    #[tokio::test]
    async fn list_filters_by_site_name_without_passwords() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            insert_account(mailbox(), "hunter2", &connection).unwrap();
        }

        let response = list_accounts_endpoint(
            State(state),
            Query(SearchQuery {
                search: Some("out".to_owned()),
            }),
        )
        .await;

        let body = json_body(response).await;
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert!(body[0].get("password").is_none());
    }

    #[tokio::test]
    async fn list_finds_account_by_email() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            insert_account(mailbox(), "hunter2", &connection).unwrap();
        }

        let matching = list_accounts_endpoint(
            State(state.clone()),
            Query(SearchQuery {
                search: Some("ME@EXAMPLE".to_owned()),
            }),
        )
        .await;
        let not_matching = list_accounts_endpoint(
            State(state),
            Query(SearchQuery {
                search: Some("hostinger".to_owned()),
            }),
        )
        .await;

        assert_eq!(json_body(matching).await.as_array().map(Vec::len), Some(1));
        assert_eq!(json_body(not_matching).await, json!([]));
    }

    #[tokio::test]
    async fn delete_then_not_found() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            insert_account(mailbox(), "hunter2", &connection).unwrap();
        }

        let first = delete_account_endpoint(State(state.clone()), HxRequest(false), Path(1)).await;
        let second = delete_account_endpoint(State(state), HxRequest(false), Path(1)).await;

        assert_eq!(first.status(), StatusCode::NO_CONTENT);
        assert_eq!(second.status(), StatusCode::NOT_FOUND);
    }
}
