//! The list and form pages for incomes and expenses.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

use crate::{
    database_id::DatabaseId,
    endpoints::{self, format_endpoint},
    entry::{
        core::{Entry, EntryKind},
        endpoints::{EntryState, find_entry, search_entries},
    },
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, edit_delete_action_links,
        form_input, format_currency, notes_input, search_form,
    },
    navigation::NavBar,
    search::SearchQuery,
};

/// Render the list page for `kind`, filtered by `query`.
pub fn entries_page_response(kind: EntryKind, state: &EntryState, query: &SearchQuery) -> Response {
    match search_entries(kind, state, query) {
        Ok(entries) => entries_view(kind, &entries, query.as_str()).into_response(),
        Err(error) => error.into_page_response(),
    }
}

/// Render the edit page for the entry `id`.
pub fn edit_entry_page_response(kind: EntryKind, state: &EntryState, id: DatabaseId) -> Response {
    match find_entry(kind, state, id) {
        Ok(entry) => entry_form_view(kind, Some(&entry)).into_response(),
        Err(error) => error.into_page_response(),
    }
}

/// The table of incomes or expenses with a search box.
pub fn entries_view(kind: EntryKind, entries: &[Entry], search: &str) -> Markup {
    let nav_bar = NavBar::new(kind.list_view()).into_html();
    let is_expense = kind == EntryKind::Expense;

    let table_row = |entry: &Entry| {
        let edit_url = format_endpoint(kind.edit_view(), entry.id);
        let delete_url = format_endpoint(kind.item_api(), entry.id);
        let confirm_message = if is_expense {
            format!(
                "Are you sure you want to delete the expense '{}'? \
                Its invoices will be deleted too. This cannot be undone.",
                entry.data.description
            )
        } else {
            format!(
                "Are you sure you want to delete the income '{}'? This cannot be undone.",
                entry.data.description
            )
        };

        html!(
            tr class=(TABLE_ROW_STYLE) data-entry-id=(entry.id)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    time datetime=(entry.data.date) { (entry.data.date) }
                }

                th
                    scope="row"
                    class="px-6 py-4 font-medium text-gray-900 dark:text-white"
                {
                    (entry.data.description)
                }

                td class=(TABLE_CELL_STYLE)
                {
                    (entry.data.category.as_deref().unwrap_or_default())
                }

                td class="px-6 py-4 text-right"
                {
                    (format_currency(entry.data.amount))
                }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        @if is_expense {
                            a
                                href=(format_endpoint(endpoints::EXPENSE_INVOICES_VIEW, entry.id))
                                class=(LINK_STYLE)
                            {
                                "Invoices"
                            }
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

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end gap-4"
                {
                    h1 class="text-xl font-bold" { (kind.plural_name()) }

                    a href=(kind.new_view()) class=(LINK_STYLE)
                    {
                        "Add " (kind.name())
                    }
                }

                (search_form(kind.list_view(), search, "Search by description or category"))

                div class="w-full overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class="px-6 py-3 text-right" { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for entry in entries {
                                (table_row(entry))
                            }

                            @if entries.is_empty() {
                                tr
                                {
                                    td
                                        colspan="5"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "Nothing found. Add one "
                                        a href=(kind.new_view()) class=(LINK_STYLE)
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

    base(kind.plural_name(), &content)
}

/// The form for creating an entry, or editing `entry` if it is given.
pub fn entry_form_view(kind: EntryKind, entry: Option<&Entry>) -> Markup {
    let (title, active_endpoint, submit_text) = match entry {
        Some(entry) => (
            format!("Edit {}", kind.name()),
            format_endpoint(kind.edit_view(), entry.id),
            "Save",
        ),
        None => (
            format!("Add {}", kind.name()),
            kind.new_view().to_owned(),
            "Create",
        ),
    };
    let nav_bar = NavBar::new(&active_endpoint).into_html();
    let data = entry.map(|entry| &entry.data);
    let amount = data.map(|data| format!("{:.2}", data.amount));
    let date = data.map(|data| data.date.to_string());

    let form = html!(
        form
            hx-post=[entry.is_none().then_some(kind.collection_api())]
            hx-put=[entry.map(|entry| format_endpoint(kind.item_api(), entry.id))]
            hx-ext="json-enc"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            (form_input(
                "descripcion",
                "Description",
                "text",
                data.map(|data| data.description.as_str()),
                true,
            ))
            (form_input("monto", "Amount", "number", amount.as_deref(), true))
            (form_input("fecha", "Date", "date", date.as_deref(), true))
            (form_input(
                "categoria",
                "Category",
                "text",
                data.and_then(|data| data.category.as_deref()),
                false,
            ))
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

    base(&title, &content)
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use crate::{
        entry::{
            core::{Entry, EntryKind, test_data::office_supplies},
            pages::{entries_view, entry_form_view},
        },
        test_utils::{
            assert_form_input, assert_form_input_with_value, assert_hx_endpoint,
            assert_valid_html, must_get_form,
        },
    };

    fn entry() -> Entry {
        Entry {
            id: 3,
            data: office_supplies(),
        }
    }

    #[test]
    fn expense_rows_link_to_invoices() {
        let html = Html::parse_document(&entries_view(EntryKind::Expense, &[entry()], "").into_string());
        assert_valid_html(&html);

        let links: Vec<_> = html
            .select(&Selector::parse("tbody a").unwrap())
            .filter_map(|link| link.value().attr("href"))
            .collect();
        assert_eq!(links, ["/expenses/3/invoices", "/expenses/3/edit"]);

        let delete = html
            .select(&Selector::parse("tbody button").unwrap())
            .next()
            .expect("could not find delete button");
        assert_eq!(delete.value().attr("hx-delete"), Some("/api/expenses/3"));
    }

    #[test]
    fn income_rows_have_no_invoices_link() {
        let html = Html::parse_document(&entries_view(EntryKind::Income, &[entry()], "").into_string());

        let links: Vec<_> = html
            .select(&Selector::parse("tbody a").unwrap())
            .filter_map(|link| link.value().attr("href"))
            .collect();
        assert_eq!(links, ["/incomes/3/edit"]);
    }

    #[test]
    fn empty_list_shows_placeholder() {
        let html = Html::parse_document(&entries_view(EntryKind::Income, &[], "foo").into_string());

        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Nothing found"));

        let search = html
            .select(&Selector::parse("input[type=search]").unwrap())
            .next()
            .expect("could not find search input");
        assert_eq!(search.value().attr("value"), Some("foo"));
    }

    #[test]
    fn create_form_posts_to_api() {
        let html = Html::parse_document(&entry_form_view(EntryKind::Income, None).into_string());
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, "/api/incomes", "hx-post");
        assert_form_input(&form, "descripcion", "text");
        assert_form_input(&form, "monto", "number");
        assert_form_input(&form, "fecha", "date");
    }

    #[test]
    fn edit_form_is_prefilled() {
        let html =
            Html::parse_document(&entry_form_view(EntryKind::Expense, Some(&entry())).into_string());
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, "/api/expenses/3", "hx-put");
        assert_form_input_with_value(&form, "descripcion", "text", "Office supplies");
        assert_form_input_with_value(&form, "monto", "number", "42.50");
        assert_form_input_with_value(&form, "fecha", "date", "2025-01-10");
    }
}
