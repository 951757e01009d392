//! The list and form pages for invoices.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    Error,
    database_id::DatabaseId,
    endpoints::{self, format_endpoint},
    entry::{Entry, EntryKind, list_entries},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, edit_delete_action_links, form_input, format_currency, notes_input, search_form,
    },
    invoice::{
        core::Invoice,
        document::DOCUMENT_FIELD,
        get_endpoint::{find_invoice, search_invoices},
        state::InvoiceState,
    },
    navigation::NavBar,
    search::SearchQuery,
};

/// The query string for the new invoice page.
#[derive(Debug, Default, Deserialize)]
pub struct NewInvoiceQuery {
    /// The expense to preselect.
    pub gasto_id: Option<DatabaseId>,
}

/// Display the invoices in a table.
pub async fn get_invoices_page(
    State(state): State<InvoiceState>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let result = search_invoices(&state, &query)
        .and_then(|invoices| Ok((invoices, list_expenses(&state)?)));

    match result {
        Ok((invoices, expenses)) => {
            invoices_view(&invoices, &expenses, query.as_str()).into_response()
        }
        Err(error) => error.into_page_response(),
    }
}

pub async fn get_new_invoice_page(
    State(state): State<InvoiceState>,
    Query(query): Query<NewInvoiceQuery>,
) -> Response {
    match list_expenses(&state) {
        Ok(expenses) => invoice_form_view(None, &expenses, query.gasto_id).into_response(),
        Err(error) => error.into_page_response(),
    }
}

pub async fn get_edit_invoice_page(
    State(state): State<InvoiceState>,
    Path(invoice_id): Path<DatabaseId>,
) -> Response {
    let result = find_invoice(&state, invoice_id)
        .and_then(|invoice| Ok((list_expenses(&state)?, invoice)));

    match result {
        Ok((expenses, invoice)) => {
            invoice_form_view(Some(&invoice), &expenses, invoice.data.expense_id).into_response()
        }
        Err(error) => error.into_page_response(),
    }
}

fn list_expenses(state: &InvoiceState) -> Result<Vec<Entry>, Error> {
    list_entries(EntryKind::Expense, &*state.connection()?)
}

/// A table of invoices with links to their documents.
///
/// Linked expenses are named by their description when they are in
/// `expenses`, and by their id otherwise. `empty_message` is shown in place of
/// the rows when there are no invoices.
pub fn invoices_table(invoices: &[Invoice], expenses: &[Entry], empty_message: Markup) -> Markup {
    let expense_description = |expense_id: DatabaseId| {
        expenses
            .iter()
            .find(|expense| expense.id == expense_id)
            .map(|expense| expense.data.description.clone())
            .unwrap_or_else(|| format!("#{expense_id}"))
    };

    let table_row = |invoice: &Invoice| {
        let edit_url = format_endpoint(endpoints::EDIT_INVOICE_VIEW, invoice.id);
        let delete_url = format_endpoint(endpoints::INVOICE_API, invoice.id);
        let document_url = format_endpoint(endpoints::INVOICE_DOCUMENT_API, invoice.id);
        let confirm_message = format!(
            "Are you sure you want to delete the invoice '{}' and its document? \
            This cannot be undone.",
            invoice.data.name
        );

        html!(
            tr class=(TABLE_ROW_STYLE) data-invoice-id=(invoice.id)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    time datetime=(invoice.data.issued_on) { (invoice.data.issued_on) }
                }

                th
                    scope="row"
                    class="px-6 py-4 font-medium text-gray-900 dark:text-white"
                {
                    (invoice.data.name)
                }

                td class=(TABLE_CELL_STYLE)
                {
                    @if let Some(due_on) = invoice.data.due_on {
                        time datetime=(due_on) { (due_on) }
                    }
                }

                td class="px-6 py-4 text-right"
                {
                    (format_currency(invoice.data.amount))
                }

                td class=(TABLE_CELL_STYLE)
                {
                    @if let Some(expense_id) = invoice.data.expense_id {
                        a
                            href=(format_endpoint(endpoints::EXPENSE_INVOICES_VIEW, expense_id))
                            class=(LINK_STYLE)
                        {
                            (expense_description(expense_id))
                        }
                    }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        a href=(document_url) target="_blank" class=(LINK_STYLE)
                        {
                            "View " (invoice.document_type)
                        }

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

    html!(
        div class="w-full overflow-x-auto dark:bg-gray-800"
        {
            table class="w-full text-sm text-left rtl:text-right
                text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Issued" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Due" }
                        th scope="col" class="px-6 py-3 text-right" { "Amount" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Expense" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                    }
                }

                tbody
                {
                    @for invoice in invoices {
                        (table_row(invoice))
                    }

                    @if invoices.is_empty() {
                        tr
                        {
                            td
                                colspan="6"
                                class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                            {
                                (empty_message)
                            }
                        }
                    }
                }
            }
        }
    )
}

fn invoices_view(invoices: &[Invoice], expenses: &[Entry], search: &str) -> Markup {
    let nav_bar = NavBar::new(endpoints::INVOICES_VIEW).into_html();
    let empty_message = html!(
        "Nothing found. Add one "
        a href=(endpoints::NEW_INVOICE_VIEW) class=(LINK_STYLE) { "here" }
        "."
    );

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end gap-4"
                {
                    h1 class="text-xl font-bold" { "Invoices" }

                    a href=(endpoints::NEW_INVOICE_VIEW) class=(LINK_STYLE) { "Add Invoice" }
                }

                (search_form(endpoints::INVOICES_VIEW, search, "Search by name"))
                (invoices_table(invoices, expenses, empty_message))
            }
        }
    );

    base("Invoices", &content)
}

/// The form for creating an invoice, or editing `invoice` if it is given.
///
/// The form is sent as multipart so that it can carry the document. A
/// document is required when creating and optional when editing.
pub fn invoice_form_view(
    invoice: Option<&Invoice>,
    expenses: &[Entry],
    selected_expense: Option<DatabaseId>,
) -> Markup {
    let (title, active_endpoint, submit_text) = match invoice {
        Some(invoice) => (
            "Edit Invoice",
            format_endpoint(endpoints::EDIT_INVOICE_VIEW, invoice.id),
            "Save",
        ),
        None => (
            "Add Invoice",
            endpoints::NEW_INVOICE_VIEW.to_owned(),
            "Create",
        ),
    };
    let nav_bar = NavBar::new(&active_endpoint).into_html();
    let data = invoice.map(|invoice| &invoice.data);
    let amount = data.map(|data| format!("{:.2}", data.amount));
    let issued_on = data.map(|data| data.issued_on.to_string());
    let due_on = data.and_then(|data| data.due_on).map(|date| date.to_string());

    let form = html!(
        form
            hx-post=[invoice.is_none().then_some(endpoints::INVOICES_API)]
            hx-put=[invoice.map(|invoice| format_endpoint(endpoints::INVOICE_API, invoice.id))]
            hx-encoding="multipart/form-data"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            (form_input("nombre", "Name", "text", data.map(|data| data.name.as_str()), true))
            (form_input("monto", "Amount", "number", amount.as_deref(), true))
            (form_input("fecha_emision", "Issue date", "date", issued_on.as_deref(), true))
            (form_input("fecha_vencimiento", "Due date", "date", due_on.as_deref(), false))

            div
            {
                label for="gasto_id" class=(FORM_LABEL_STYLE) { "Expense" }

                select id="gasto_id" name="gasto_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "None" }

                    @for expense in expenses {
                        option
                            value=(expense.id)
                            selected[selected_expense == Some(expense.id)]
                        {
                            (expense.data.date) " " (expense.data.description)
                            " (" (format_currency(expense.data.amount)) ")"
                        }
                    }
                }
            }

            div
            {
                label for=(DOCUMENT_FIELD) class=(FORM_LABEL_STYLE)
                {
                    @if invoice.is_some() {
                        "Replace document (JPEG, PNG or PDF, up to 2 MB)"
                    } @else {
                        "Document (JPEG, PNG or PDF, up to 2 MB)"
                    }
                }

                input
                    id=(DOCUMENT_FIELD)
                    name=(DOCUMENT_FIELD)
                    type="file"
                    accept="image/jpeg,image/png,application/pdf"
                    required[invoice.is_none()]
                    class=(FORM_TEXT_INPUT_STYLE);
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
