//! The navigation bar shown at the top of every page.

use maud::{Markup, html};

use crate::endpoints;

/// A link in the navigation bar.
///
/// It will change appearance if `is_current` is set to
/// `true`. Only one link should be set as active at any one time.
#[derive(Clone)]
struct Link<'a> {
    url: &'a str,
    title: &'a str,
    is_current: bool,
}

impl Link<'_> {
    fn into_html(self) -> Markup {
        let style = if self.is_current {
            "block py-2 px-3 text-white bg-blue-700 rounded-sm lg:bg-transparent
        lg:text-blue-700 lg:p-0 dark:text-white lg:dark:text-blue-500"
        } else {
            "block py-2 px-3 text-gray-900 rounded-sm hover:bg-gray-100
        lg:hover:bg-transparent lg:border-0 lg:hover:text-blue-700 lg:p-0
        dark:text-white lg:dark:hover:text-blue-500 dark:hover:bg-gray-700
        dark:hover:text-white lg:dark:hover:bg-transparent"
        };

        html!(
            a
                href=(self.url)
                class=(style)
                aria-current=[self.is_current.then_some("page")]
            {
                (self.title)
            }
        )
    }
}

pub struct NavBar<'a> {
    links: Vec<Link<'a>>,
}

impl NavBar<'_> {
    /// Get the navigation bar.
    ///
    /// The link for the section that `active_endpoint` belongs to is marked
    /// as active, e.g. both `/expenses` and `/expenses/1/edit` activate the
    /// "Expenses" link.
    pub fn new(active_endpoint: &str) -> NavBar<'_> {
        let sections = [
            (endpoints::INCOMES_VIEW, "Incomes"),
            (endpoints::EXPENSES_VIEW, "Expenses"),
            (endpoints::INVOICES_VIEW, "Invoices"),
            (endpoints::ACCOUNTS_VIEW, "Accounts"),
        ];

        let links = sections
            .into_iter()
            .map(|(url, title)| Link {
                url,
                title,
                is_current: is_in_section(active_endpoint, url),
            })
            .collect();

        NavBar { links }
    }

    pub fn into_html(self) -> Markup {
        // Template adapted from https://flowbite.com/docs/components/navbar/#default-navbar
        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900"
            {
                div
                    class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a
                        href=(endpoints::ROOT)
                        class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                    {
                        "Finance Tracker"
                    }

                    ul
                        class="font-medium flex flex-row space-x-8 rtl:space-x-reverse
                        dark:bg-gray-800 lg:dark:bg-gray-900"
                    {
                        @for link in self.links {
                            li { (link.into_html()) }
                        }
                    }
                }
            }
        )
    }
}

fn is_in_section(endpoint: &str, section: &str) -> bool {
    endpoint == section
        || endpoint
            .strip_prefix(section)
            .is_some_and(|rest| rest.starts_with('/'))
}
