use axum::{response::IntoResponse, response::Response};
use maud::{Markup, html};

use crate::{
    endpoints,
    html::{LINK_STYLE, base},
};

fn forgot_password_template() -> Markup {
    let content = html! {
        // Template adapted from https://flowbite.com/blocks/marketing/register/
        div
            class="flex flex-col items-center justify-center px-6 py-8 mx-auto text-gray-900 dark:text-white"
        {
            a
                href=(endpoints::ROOT)
                class="flex items-center mb-6 text-2xl font-semibold"
            {
                img
                    src="/static/favicon-128x128.png"
                    alt="logo"
                    class="w-8 h-8 mr-2";
                "Family Budget"
            }
            div
                class="w-full bg-white rounded shadow dark:border md:mt-0 sm:max-w-md xl:p-0 dark:bg-gray-800 dark:border-gray-700"
            {
                div class="p-6 space-y-4 md:space-y-6 sm:p-8"
                {
                    h1
                        class="text-xl font-bold md:text-2xl"
                    {
                        "Forgot your password?"
                    }

                    p class="text-justify"
                    {
                        "Kids can ask a parent to reset their password. Adults can
                        reset any password by running the program 'reset_password'
                        from the directory this server runs in, giving it the
                        database file and the login of the account, e.g. "
                        code { "reset_password --db-path family.db --login alice" }
                        "."
                    }

                    p
                    {
                        a href=(endpoints::LOG_IN_VIEW) class=(LINK_STYLE) { "Back to log in" }
                    }
                }
            }
        }
    };

    base("Forgot Password", &content)
}

/// Renders a page describing how the user's password can be reset.
pub async fn get_forgot_password_page() -> Response {
    forgot_password_template().into_response()
}
