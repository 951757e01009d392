//! The list and form pages for service accounts.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    account::{
        core::{Account, ServiceType},
        endpoints::{AccountState, find_account, search_accounts},
    },
    database_id::DatabaseId,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, edit_delete_action_links, form_input, notes_input, search_form,
    },
    navigation::NavBar,
    search::SearchQuery,
};

/// Display the accounts in a table.
pub async fn get_accounts_page(
    State(state): State<AccountState>,
    Query(query): Query<SearchQuery>,
) -> Response {
    match search_accounts(&state, &query) {
        Ok(accounts) => accounts_view(&accounts, query.as_str()).into_response(),
        Err(error) => error.into_page_response(),
    }
}

pub async fn get_new_account_page() -> Response {
    account_form_view(None).into_response()
}

pub async fn get_edit_account_page(
    State(state): State<AccountState>,
    Path(account_id): Path<DatabaseId>,
) -> Response {
    match find_account(&state, account_id) {
        Ok(account) => account_form_view(Some(&account)).into_response(),
        Err(error) => error.into_page_response(),
    }
}

fn accounts_view(accounts: &[Account], search: &str) -> Markup {
    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW).into_html();

    let table_row = |account: &Account| {
        let edit_url = format_endpoint(endpoints::EDIT_ACCOUNT_VIEW, account.id);
        let delete_url = format_endpoint(endpoints::ACCOUNT_API, account.id);
        let confirm_message = format!(
            "Are you sure you want to delete the account '{}'? This cannot be undone.",
            account.data.site_name
        );

        html!(
            tr class=(TABLE_ROW_STYLE) data-account-id=(account.id)
            {
                th
                    scope="row"
                    class="px-6 py-4 font-medium text-gray-900 dark:text-white"
                {
                    (account.data.site_name)
                }

                td class=(TABLE_CELL_STYLE) { (account.data.email) }

                td class=(TABLE_CELL_STYLE) { (account.data.service_type.label()) }

                td class=(TABLE_CELL_STYLE)
                {
                    time datetime=(account.data.registered_on) { (account.data.registered_on) }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    @if let Some(expires_on) = account.data.expires_on {
                        time datetime=(expires_on) { (expires_on) }
                    }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        (edit_delete_action_links(
                            &edit_url,
                            &delete_url,
                            &confirm_message,
                            "closest tr",
                            "delete",
                        ))
                    }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end gap-4"
                {
                    h1 class="text-xl font-bold" { "Accounts" }

                    a href=(endpoints::NEW_ACCOUNT_VIEW) class=(LINK_STYLE) { "Add Account" }
                }

                (search_form(endpoints::ACCOUNTS_VIEW, search, "Search by site or email"))

                div class="w-full overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Site" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Email" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Service" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Registered" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Expires" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for account in accounts {
                                (table_row(account))
                            }

                            @if accounts.is_empty() {
                                tr
                                {
                                    td
                                        colspan="6"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "Nothing found. Add one "
                                        a href=(endpoints::NEW_ACCOUNT_VIEW) class=(LINK_STYLE)
                                        {
                                            "here"
                                        }
                                        "."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Accounts", &content)
}

/// The form for creating an account, or editing `account` if it is given.
///
/// The password input is never pre-filled. When editing, leaving it blank
/// keeps the stored password.
fn account_form_view(account: Option<&Account>) -> Markup {
    let (title, active_endpoint, submit_text) = match account {
        Some(account) => (
            "Edit Account",
            format_endpoint(endpoints::EDIT_ACCOUNT_VIEW, account.id),
            "Save",
        ),
        None => (
            "Add Account",
            endpoints::NEW_ACCOUNT_VIEW.to_owned(),
            "Create",
        ),
    };
    let nav_bar = NavBar::new(&active_endpoint).into_html();
    let data = account.map(|account| &account.data);
    let registered_on = data.map(|data| data.registered_on.to_string());
    let expires_on = data.and_then(|data| data.expires_on).map(|date| date.to_string());
    let selected_service = data.map(|data| data.service_type).unwrap_or_default();
    let password_label = if account.is_some() {
        "New password (leave blank to keep the current one)"
    } else {
        "Password"
    };

    let form = html!(
        form
            hx-post=[account.is_none().then_some(endpoints::ACCOUNTS_API)]
            hx-put=[account.map(|account| format_endpoint(endpoints::ACCOUNT_API, account.id))]
            hx-ext="json-enc"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            (form_input(
                "nombre_pagina",
                "Site",
                "text",
                data.map(|data| data.site_name.as_str()),
                true,
            ))
            (form_input(
                "correo",
                "Email",
                "email",
                data.map(|data| data.email.as_str()),
                true,
            ))
            (form_input("password", password_label, "password", None, account.is_none()))
            (form_input("fecha_registro", "Registered", "date", registered_on.as_deref(), true))
            (form_input("fecha_vencimiento", "Expires", "date", expires_on.as_deref(), false))

            div
            {
                label for="tipo_servicio" class=(FORM_LABEL_STYLE) { "Service" }

                select id="tipo_servicio" name="tipo_servicio" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for service_type in ServiceType::ALL {
                        option
                            value=(service_type.as_str())
                            selected[service_type == selected_service]
                        {
                            (service_type.label())
                        }
                    }
                }
            }

            (notes_input(data.and_then(|data| data.notes.as_deref())))

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_text) }
        }
    );

    let content = html!(
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold my-4" { (title) }
            (form)
        }
    );

    base(title, &content)
}
