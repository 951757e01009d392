//! Login details for online services such as email and web hosting.

mod core;
mod endpoints;
mod pages;

pub use self::core::create_account_table;
pub use endpoints::{
    create_account_endpoint, delete_account_endpoint, get_account_endpoint,
    list_accounts_endpoint, update_account_endpoint,
};
pub use pages::{get_accounts_page, get_edit_account_page, get_new_account_page};
