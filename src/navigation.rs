//! The navigation bar shown at the top of every page for logged in users.

use maud::{Markup, html};

use crate::endpoints;

/// The pages reachable from the navigation bar, in display order.
const NAV_LINKS: [(&str, &str); 6] = [
    (endpoints::DASHBOARD_VIEW, "Dashboard"),
    (endpoints::TRANSACTIONS_VIEW, "Transactions"),
    (endpoints::CATEGORIES_VIEW, "Categories"),
    (endpoints::CURRENCY_VIEW, "Currency"),
    (endpoints::PROFILE_VIEW, "Profile"),
    (endpoints::LOG_OUT, "Log out"),
];

const ACTIVE_LINK_STYLE: &str = "block rounded px-3 py-2 font-semibold text-blue-700 \
    bg-blue-50 dark:bg-blue-900/30 dark:text-blue-200";

const INACTIVE_LINK_STYLE: &str = "block rounded px-3 py-2 text-gray-700 \
    hover:bg-gray-100 hover:text-blue-700 dark:text-gray-200 \
    dark:hover:bg-gray-800 dark:hover:text-blue-200";

/// A link in the navigation bar.
struct NavLink {
    url: &'static str,
    title: &'static str,
    is_current: bool,
}

/// The navigation bar with the link for the current page highlighted.
pub struct NavBar {
    links: Vec<NavLink>,
}

impl NavBar {
    /// Build the navigation bar for the page at `active_endpoint`.
    ///
    /// Pages that are not in the navigation bar, e.g. edit pages, highlight nothing.
    /// Logging out is an action, so its link is never highlighted.
    pub fn new(active_endpoint: &str) -> Self {
        let links = NAV_LINKS
            .iter()
            .map(|&(url, title)| NavLink {
                url,
                title,
                is_current: url != endpoints::LOG_OUT && url == active_endpoint,
            })
            .collect();

        Self { links }
    }

    pub fn into_html(self) -> Markup {
        html!(
            header class="bg-white border-b border-gray-200 dark:bg-gray-900 dark:border-gray-700"
            {
                nav
                    class="max-w-screen-xl mx-auto flex flex-col gap-3 p-4
                    lg:flex-row lg:items-center lg:justify-between"
                    aria-label="Main"
                {
                    a href=(endpoints::DASHBOARD_VIEW) class="flex items-center gap-3"
                    {
                        img src="/static/favicon-128x128.png" alt="" class="h-8";
                        span class="text-2xl font-semibold whitespace-nowrap dark:text-white"
                        {
                            "Family Budget"
                        }
                    }

                    ul class="flex gap-1 overflow-x-auto text-sm font-medium"
                    {
                        @for link in &self.links {
                            li class="shrink-0" {
                                a
                                    href=(link.url)
                                    class=(if link.is_current { ACTIVE_LINK_STYLE } else { INACTIVE_LINK_STYLE })
                                    aria-current=[link.is_current.then_some("page")]
                                {
                                    (link.title)
                                }
                            }
                        }
                    }
                }
            }
        )
    }
}
