//! Application router configuration for the pages and the JSON API.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::Redirect,
    routing::get,
};

use crate::{
    AppState,
    account::{
        create_account_endpoint, delete_account_endpoint, get_account_endpoint,
        get_accounts_page, get_edit_account_page, get_new_account_page, list_accounts_endpoint,
        update_account_endpoint,
    },
    endpoints,
    expense::{
        create_expense_endpoint, delete_expense_endpoint, get_edit_expense_page,
        get_expense_endpoint, get_expense_invoices_page, get_expenses_page, get_new_expense_page,
        list_expense_invoices_endpoint, list_expenses_endpoint, update_expense_endpoint,
    },
    income::{
        create_income_endpoint, delete_income_endpoint, get_edit_income_page,
        get_income_endpoint, get_incomes_page, get_new_income_page, list_incomes_endpoint,
        update_income_endpoint,
    },
    invoice::{
        create_invoice_endpoint, delete_invoice_endpoint, edit_invoice_endpoint,
        get_edit_invoice_page, get_invoice_document_endpoint, get_invoice_endpoint,
        get_invoices_page, get_new_invoice_page, list_invoices_endpoint,
    },
    logging::MAX_REQUEST_BODY_SIZE,
    not_found::get_404_not_found,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let page_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::INCOMES_VIEW, get(get_incomes_page))
        .route(endpoints::NEW_INCOME_VIEW, get(get_new_income_page))
        .route(endpoints::EDIT_INCOME_VIEW, get(get_edit_income_page))
        .route(endpoints::EXPENSES_VIEW, get(get_expenses_page))
        .route(endpoints::NEW_EXPENSE_VIEW, get(get_new_expense_page))
        .route(endpoints::EDIT_EXPENSE_VIEW, get(get_edit_expense_page))
        .route(
            endpoints::EXPENSE_INVOICES_VIEW,
            get(get_expense_invoices_page),
        )
        .route(endpoints::ACCOUNTS_VIEW, get(get_accounts_page))
        .route(endpoints::NEW_ACCOUNT_VIEW, get(get_new_account_page))
        .route(endpoints::EDIT_ACCOUNT_VIEW, get(get_edit_account_page))
        .route(endpoints::INVOICES_VIEW, get(get_invoices_page))
        .route(endpoints::NEW_INVOICE_VIEW, get(get_new_invoice_page))
        .route(endpoints::EDIT_INVOICE_VIEW, get(get_edit_invoice_page));

    let api_routes = Router::new()
        .route(
            endpoints::INCOMES_API,
            get(list_incomes_endpoint).post(create_income_endpoint),
        )
        .route(
            endpoints::INCOME_API,
            get(get_income_endpoint)
                .put(update_income_endpoint)
                .delete(delete_income_endpoint),
        )
        .route(
            endpoints::EXPENSES_API,
            get(list_expenses_endpoint).post(create_expense_endpoint),
        )
        .route(
            endpoints::EXPENSE_API,
            get(get_expense_endpoint)
                .put(update_expense_endpoint)
                .delete(delete_expense_endpoint),
        )
        .route(
            endpoints::EXPENSE_INVOICES_API,
            get(list_expense_invoices_endpoint),
        )
        .route(
            endpoints::ACCOUNTS_API,
            get(list_accounts_endpoint).post(create_account_endpoint),
        )
        .route(
            endpoints::ACCOUNT_API,
            get(get_account_endpoint)
                .put(update_account_endpoint)
                .delete(delete_account_endpoint),
        )
        .route(
            endpoints::INVOICES_API,
            get(list_invoices_endpoint).post(create_invoice_endpoint),
        )
        .route(
            endpoints::INVOICE_API,
            get(get_invoice_endpoint)
                .put(edit_invoice_endpoint)
                .delete(delete_invoice_endpoint),
        )
        .route(
            endpoints::INVOICE_DOCUMENT_API,
            get(get_invoice_document_endpoint),
        );

    page_routes
        .merge(api_routes)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_SIZE))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the expenses page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::EXPENSES_VIEW)
}

#[cfg(test)]
mod root_route_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{endpoints, routing::get_index_page};

    #[tokio::test]
    async fn root_redirects_to_expenses() {
        let response = get_index_page().await.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = response.headers().get("location").unwrap();
        assert_eq!(location, endpoints::EXPENSES_VIEW);
    }
}
