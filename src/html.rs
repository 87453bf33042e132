//! Shared page layout, style constants and small HTML building blocks.
use std::sync::OnceLock;

use maud::{DOCTYPE, Markup, html};
use numfmt::{Formatter, Precision};

use crate::endpoints;

pub const LINK_STYLE: &str = "text-blue-600 hover:text-blue-500 \
    dark:text-blue-500 dark:hover:text-blue-400 underline";

pub const BUTTON_PRIMARY_STYLE: &str = "w-full px-4 py-2 rounded text-white \
    bg-blue-500 dark:bg-blue-600 disabled:bg-blue-700 \
    hover:enabled:bg-blue-600 hover:enabled:dark:bg-blue-700";

pub const BUTTON_DELETE_STYLE: &str = "text-red-600 hover:text-red-500 underline \
    dark:text-red-500 dark:hover:text-red-400 bg-transparent border-none cursor-pointer";

pub const PAGE_CONTAINER_STYLE: &str =
    "flex flex-col items-center px-6 py-8 mx-auto lg:py-5 text-gray-900 dark:text-white";

pub const FORM_CONTAINER_STYLE: &str = "flex flex-col items-center px-6 py-8 \
    mx-auto lg:py-0 max-w-md text-gray-900 dark:text-white";
pub const FORM_LABEL_STYLE: &str = "block mb-2 text-sm font-medium text-gray-900 dark:text-white";
pub const FORM_TEXT_INPUT_STYLE: &str = "block w-full p-2.5 rounded text-sm \
    text-gray-900 dark:text-white disabled:text-gray-500 bg-gray-50 dark:bg-gray-700 \
    border border-gray-300 dark:border-gray-600 dark:placeholder-gray-400 \
    focus:ring-blue-600 focus:border-blue-600 focus:dark:ring-blue-500 focus:dark:border-blue-500";
pub const FORM_ERROR_STYLE: &str = "text-red-600 dark:text-red-400";

/// The radio buttons for picking income or expense are rendered as toggle cards.
pub const FORM_RADIO_GROUP_STYLE: &str = "grid grid-cols-2 gap-2";
pub const FORM_RADIO_INPUT_STYLE: &str = "peer sr-only";
pub const FORM_RADIO_LABEL_STYLE: &str = "block rounded border border-gray-300 \
    dark:border-gray-600 bg-white dark:bg-gray-700 px-3 py-2 text-center text-sm \
    font-medium text-gray-700 dark:text-white cursor-pointer \
    hover:bg-gray-50 hover:dark:bg-gray-600 peer-focus-visible:ring-2 \
    peer-focus-visible:ring-blue-500 peer-checked:border-blue-600 \
    peer-checked:bg-blue-50 peer-checked:text-blue-700 \
    peer-checked:dark:bg-blue-600/20 peer-checked:dark:text-blue-200";

pub const TABLE_HEADER_STYLE: &str = "text-xs uppercase text-gray-700 bg-gray-50 \
    dark:bg-gray-700 dark:text-gray-400";
pub const TABLE_ROW_STYLE: &str = "bg-white border-b dark:bg-gray-800 dark:border-gray-700";
pub const TABLE_CELL_STYLE: &str = "px-6 py-4";

pub const CATEGORY_BADGE_STYLE: &str = "inline-flex items-center px-2.5 py-0.5 \
    rounded-full text-xs font-semibold text-blue-800 bg-blue-100 \
    dark:bg-blue-900 dark:text-blue-300";

pub const INCOME_TEXT_STYLE: &str = "text-green-700 dark:text-green-400";
pub const EXPENSE_TEXT_STYLE: &str = "text-red-700 dark:text-red-400";

/// The HTML document every full page is rendered into.
///
/// Alerts returned by HTMX endpoints are swapped into `#alert-container`.
pub fn base(title: &str, content: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en"
        {
            head
            {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - Family Budget" }
                link rel="icon" type="image/png" href="/static/favicon-32x32.png" sizes="32x32";
                link rel="icon" type="image/png" href="/static/favicon-128x128.png" sizes="128x128";
                link href="/static/main.css" rel="stylesheet";

                script src="/static/htmx-2.0.8-min.js" integrity="sha384-/TgkGk7p307TH7EXJDuUlgG3Ce1UVolAOFopFekQkkXihi5u/6OCvVKyz1W+idaz" {}
                script src="/static/htmx-ext-response-targets-2.0.4.js" integrity="sha384-T41oglUPvXLGBVyRdZsVRxNWnOOqCynaPubjUVjxhsjFTKrFJGEMm3/0KGmNQ+Pg" {}

                style
                {
                    ".htmx-indicator { display: none; }
                    .htmx-request .htmx-indicator, .htmx-request.htmx-indicator { display: inline; }"
                }

                script src="/static/app.js" defer {}
            }

            body
                hx-ext="response-targets"
                class="container max-w-full min-h-screen bg-gray-50 dark:bg-gray-900"
            {
                (content)

                div
                    id="alert-container"
                    class="hidden fixed bottom-4 left-1/2 -translate-x-1/2 z-50 w-full max-w-md px-4"
                {}
            }
        }
    }
}

/// A full page explaining an error, with a link back to the dashboard.
///
/// `code` is shown in large text, e.g. "404".
pub fn error_view(title: &str, code: &str, description: &str, fix: &str) -> Markup {
    let content = html!(
        section class="bg-white dark:bg-gray-900"
        {
            div class="mx-auto max-w-screen-sm px-4 py-8 lg:py-16 text-center"
            {
                h1 class="mb-4 text-7xl lg:text-9xl font-extrabold tracking-tight text-blue-600 dark:text-blue-500"
                {
                    (code)
                }

                p class="mb-4 text-3xl md:text-4xl font-bold tracking-tight text-gray-900 dark:text-white"
                {
                    (description)
                }

                p class="mb-4 text-xl md:text-2xl text-gray-900 dark:text-white"
                {
                    (fix)
                }

                a
                    href=(endpoints::DASHBOARD_VIEW)
                    class="inline-flex my-4 px-5 py-2.5 rounded text-sm font-medium
                        text-white bg-blue-600 hover:bg-blue-800"
                {
                    "Back to Dashboard"
                }
            }
        }
    );

    base(title, &content)
}

/// The card used by the pages a visitor sees before logging in.
pub fn public_form_card(form_title: &str, form: &Markup) -> Markup {
    html! {
        div class="flex flex-col items-center justify-center px-6 py-8 mx-auto"
        {
            div class="flex items-center mb-6 text-2xl font-semibold text-gray-900 dark:text-white"
            {
                img class="w-8 h-8 mr-2" src="/static/favicon-128x128.png" alt="";
                "Family Budget"
            }

            div class="w-full sm:max-w-md p-6 sm:p-8 space-y-4 md:space-y-6 rounded-lg shadow
                bg-white dark:bg-gray-800 dark:border dark:border-gray-700"
            {
                h1 class="text-xl md:text-2xl font-bold tracking-tight text-gray-900 dark:text-white"
                {
                    (form_title)
                }

                (form)
            }
        }
    }
}

/// The new password field. `password` is echoed back when a form is re-rendered.
pub fn password_input(password: &str, min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label for="password" class=(FORM_LABEL_STYLE) { "Password" }

            input
                type="password"
                name="password"
                id="password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                value=(password)
                minlength=(min_length);

            (field_error("password", error_message))
        }
    }
}

pub fn confirm_password_input(min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label for="confirm-password" class=(FORM_LABEL_STYLE) { "Confirm Password" }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(min_length)
                autofocus[error_message.is_some()];

            (field_error("confirm_password", error_message))
        }
    }
}

/// A labelled input. `input_type` is the HTML input type, e.g. "text" or "email".
pub fn text_input(name: &str, label: &str, input_type: &str, value: &str, required: bool) -> Markup {
    html!(
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            input
                type=(input_type)
                name=(name)
                id=(name)
                value=(value)
                required[required]
                class=(FORM_TEXT_INPUT_STYLE);
        }
    )
}

/// The inline error for the form field `name`, renders nothing without a message.
pub fn field_error(name: &str, message: Option<&str>) -> Markup {
    html! {
        @if let Some(message) = message {
            p class=(FORM_ERROR_STYLE) data-error-for=(name) { (message) }
        }
    }
}

pub fn link(url: &str, text: &str) -> Markup {
    html!( a href=(url) class=(LINK_STYLE) { (text) } )
}

/// The "Edit" link and "Delete" button of a table row.
///
/// The button asks for confirmation with `confirm_message`, sends a DELETE
/// request to `delete_url` and swaps `hx_target` using `hx_swap`.
pub fn edit_delete_action_links(
    edit_url: &str,
    delete_url: &str,
    confirm_message: &str,
    hx_target: &str,
    hx_swap: &str,
) -> Markup {
    html!(
        a href=(edit_url) class=(LINK_STYLE) { "Edit" }

        button
            type="button"
            hx-delete=(delete_url)
            hx-confirm=(confirm_message)
            hx-target=(hx_target)
            hx-target-error="#alert-container"
            hx-swap=(hx_swap)
            class=(BUTTON_DELETE_STYLE)
        {
            "Delete"
        }
    )
}

/// A spinning circle shown inside submit buttons while a request is in flight.
pub fn loading_spinner() -> Markup {
    html! {
        svg
            aria-hidden="true"
            class="inline w-4 h-4 me-2 mb-1 animate-spin text-white"
            viewBox="0 0 24 24"
            fill="none"
            xmlns="http://www.w3.org/2000/svg"
        {
            circle cx="12" cy="12" r="10" stroke="#E5E7EB" stroke-width="4" {}
            path d="M22 12a10 10 0 0 0-10-10" stroke="currentColor" stroke-width="4" stroke-linecap="round" {}
        }
    }
}

/// Format `amount` as dollars with exactly two decimal places, e.g. "-$12.50".
pub fn format_currency(amount: f64) -> String {
    static FORMATTER: OnceLock<Option<Formatter>> = OnceLock::new();

    let formatter = FORMATTER.get_or_init(|| {
        Formatter::currency("$")
            .ok()
            .map(|formatter| formatter.precision(Precision::Decimals(2)))
    });

    let magnitude = amount.abs();
    let mut formatted = match formatter {
        // numfmt renders zero as "0" without the currency symbol.
        Some(formatter) if magnitude != 0.0 => formatter.fmt_string(magnitude),
        _ => format!("${magnitude:.2}"),
    };

    // numfmt drops trailing zeros after the decimal point.
    match formatted.rfind('.') {
        None => formatted.push_str(".00"),
        Some(point) if formatted.len() - point == 2 => formatted.push('0'),
        Some(_) => {}
    }

    if amount < 0.0 {
        format!("-{formatted}")
    } else {
        formatted
    }
}
