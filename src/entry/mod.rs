//! Incomes and expenses, which share the same fields and storage layout.

mod core;
mod endpoints;
mod pages;

pub use self::core::{Entry, EntryKind, create_entry_table, delete_entry, list_entries};
pub use endpoints::{
    EntryState, create_entry_response, delete_entry_response, find_entry, get_entry_response,
    list_entries_response, update_entry_response,
};
pub use pages::{edit_entry_page_response, entries_page_response, entry_form_view};

#[cfg(test)]
pub use self::core::{get_entry, insert_entry, test_data};
