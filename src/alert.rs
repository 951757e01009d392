//! Alert system for displaying success and error messages to users.
//!
//! Alerts are rendered as an out-of-band swap for the `#alert-container`
//! element in the [base](crate::html::base) page, so they show up no matter
//! which element the htmx request targeted.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

/// An alert message to display at the bottom of the page.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// A success message without details.
    SuccessSimple { message: String },
    /// An error message with extra details.
    Error { message: String, details: String },
}

impl Alert {
    pub fn into_html(self) -> Markup {
        let (message, details, is_error) = match self {
            Alert::SuccessSimple { message } => (message, String::new(), false),
            Alert::Error { message, details } => (message, details, true),
        };

        let style = if is_error {
            "p-4 mb-4 text-sm text-red-800 rounded-lg bg-red-50 \
            dark:bg-gray-800 dark:text-red-400 border border-red-300 dark:border-red-800"
        } else {
            "p-4 mb-4 text-sm text-green-800 rounded-lg bg-green-50 \
            dark:bg-gray-800 dark:text-green-400 border border-green-300 dark:border-green-800"
        };

        html!(
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div
                    class=(style)
                    role="alert"
                    data-alert-type=(if is_error { "error" } else { "success" })
                {
                    div class="flex justify-between items-start gap-4"
                    {
                        div
                        {
                            p class="font-medium" { (message) }

                            @if !details.is_empty() {
                                p class="mt-1" { (details) }
                            }
                        }

                        button
                            type="button"
                            aria-label="Close"
                            onclick="this.closest('[role=alert]').remove()"
                            class="font-bold"
                        {
                            "×"
                        }
                    }
                }
            }
        )
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}
