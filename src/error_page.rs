//! Full pages shown in place of the requested page when something goes wrong.
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{endpoints, html::error_view};

/// An error page with a short description of what went wrong and how to fix it.
pub struct ErrorPage {
    status: StatusCode,
    title: &'static str,
    description: String,
    fix: String,
}

impl ErrorPage {
    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            title: "Not Found",
            description: "Something's missing.".to_owned(),
            fix: "Sorry, we can't find that page. Check the address or go back to your dashboard."
                .to_owned(),
        }
    }

    pub fn forbidden(description: impl Into<String>, fix: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            title: "Forbidden",
            description: description.into(),
            fix: fix.into(),
        }
    }

    pub fn internal(description: impl Into<String>, fix: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            title: "Internal Server Error",
            description: description.into(),
            fix: fix.into(),
        }
    }

    pub fn internal_default() -> Self {
        Self::internal(
            "Sorry, something went wrong.",
            "Try again later or check the server logs.",
        )
    }
}

impl IntoResponse for ErrorPage {
    fn into_response(self) -> Response {
        let markup = error_view(
            self.title,
            self.status.as_str(),
            &self.description,
            &self.fix,
        );

        (self.status, Html(markup.into_string())).into_response()
    }
}

pub async fn get_404_not_found() -> Response {
    ErrorPage::not_found().into_response()
}

pub async fn get_internal_server_error_page() -> Response {
    ErrorPage::internal_default().into_response()
}

/// Send the browser of an HTMX request to the internal server error page.
pub fn get_internal_server_error_redirect() -> Response {
    (
        HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
        .into_response()
}
