//! Route handlers for incomes.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use axum_htmx::HxRequest;
use serde_json::Value;

use crate::{
    database_id::DatabaseId,
    entry::{
        EntryKind, EntryState, create_entry_response, delete_entry_response,
        edit_entry_page_response, entries_page_response, entry_form_view, get_entry_response,
        list_entries_response, update_entry_response,
    },
    search::SearchQuery,
};

const KIND: EntryKind = EntryKind::Income;

/// List the incomes, newest first, optionally filtered with `?search=`.
pub async fn list_incomes_endpoint(
    State(state): State<EntryState>,
    Query(query): Query<SearchQuery>,
) -> Response {
    list_entries_response(KIND, &state, &query)
}

pub async fn get_income_endpoint(
    State(state): State<EntryState>,
    Path(income_id): Path<DatabaseId>,
) -> Response {
    get_entry_response(KIND, &state, income_id)
}

/// Create an income from a JSON body.
pub async fn create_income_endpoint(
    State(state): State<EntryState>,
    HxRequest(is_htmx): HxRequest,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    create_entry_response(KIND, &state, is_htmx, payload)
}

/// Update the fields of an income given in a JSON body.
pub async fn update_income_endpoint(
    State(state): State<EntryState>,
    HxRequest(is_htmx): HxRequest,
    Path(income_id): Path<DatabaseId>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    update_entry_response(KIND, &state, is_htmx, income_id, payload)
}

pub async fn delete_income_endpoint(
    State(state): State<EntryState>,
    HxRequest(is_htmx): HxRequest,
    Path(income_id): Path<DatabaseId>,
) -> Response {
    delete_entry_response(KIND, &state, is_htmx, income_id)
}

/// Display the incomes in a table.
pub async fn get_incomes_page(
    State(state): State<EntryState>,
    Query(query): Query<SearchQuery>,
) -> Response {
    entries_page_response(KIND, &state, &query)
}

pub async fn get_new_income_page() -> Response {
    entry_form_view(KIND, None).into_response()
}

pub async fn get_edit_income_page(
    State(state): State<EntryState>,
    Path(income_id): Path<DatabaseId>,
) -> Response {
    edit_entry_page_response(KIND, &state, income_id)
}
