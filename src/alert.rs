//! Alert messages that are swapped into the page's alert container.
//!
//! Alerts are rendered as out-of-band swaps so any HTMX response can show one
//! regardless of the element that triggered the request.

use axum::response::{Html, IntoResponse, Response};
use maud::{Markup, html};

/// A message to show the user after an action completes.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// The action completed, with some extra details.
    Success { message: String, details: String },
    /// The action completed.
    SuccessSimple { message: String },
    /// The action failed.
    Error { message: String, details: String },
}

impl Alert {
    pub fn into_markup(self) -> Markup {
        let (container_style, icon, message, details) = match self {
            Alert::Success { message, details } => (SUCCESS_STYLE, "✓", message, details),
            Alert::SuccessSimple { message } => (SUCCESS_STYLE, "✓", message, String::new()),
            Alert::Error { message, details } => (ERROR_STYLE, "!", message, details),
        };

        html!(
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div class=(container_style) role="alert"
                {
                    span class="font-bold me-2" aria-hidden="true" { (icon) }

                    div class="flex-1"
                    {
                        p class="font-medium" { (message) }

                        @if !details.is_empty() {
                            p class="text-sm mt-1" { (details) }
                        }
                    }

                    button
                        type="button"
                        class="ms-2 text-lg leading-none"
                        aria-label="Dismiss"
                        onclick="document.getElementById('alert-container').classList.add('hidden')"
                    {
                        "×"
                    }
                }
            }
        )
    }

    pub fn into_html(self) -> Html<String> {
        Html(self.into_markup().into_string())
    }
}

const SUCCESS_STYLE: &str = "flex items-start p-4 rounded-lg shadow text-green-800 \
    bg-green-50 border border-green-300 dark:bg-gray-800 dark:text-green-400 \
    dark:border-green-800";

const ERROR_STYLE: &str = "flex items-start p-4 rounded-lg shadow text-red-800 \
    bg-red-50 border border-red-300 dark:bg-gray-800 dark:text-red-400 \
    dark:border-red-800";

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}
