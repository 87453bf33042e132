//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use time::Date;

use crate::{alert::Alert, category::CategoryId, error_page::ErrorPage};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of login and password.
    #[error("invalid login or password")]
    InvalidCredentials,

    /// The user's account has been blocked by an adult in their family.
    #[error("the account has been blocked")]
    AccountBlocked,

    /// The auth token cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// There was an error parsing the date in the cookie or creating the new
    /// expiry date time.
    ///
    /// Callers should pass in the original error as a string and the date
    /// string that caused the error.
    #[error("could not format expiry cookie date-time string \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A required text field was empty or only contained whitespace.
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    /// A login contained whitespace.
    #[error("login \"{0}\" must not contain spaces")]
    InvalidLogin(String),

    /// The string is not a valid email address.
    #[error("{0} is not a valid email address")]
    InvalidEmail(String),

    /// The login is already used by another user.
    #[error("the login \"{0}\" is already taken")]
    DuplicateLogin(String),

    /// The email is already used by another adult.
    #[error("the email \"{0}\" is already registered")]
    DuplicateEmail(String),

    /// A family with the same name already exists.
    #[error("a family named \"{0}\" already exists")]
    DuplicateFamilyName(String),

    /// The owner already has a category with the same name and kind.
    #[error("the category \"{0}\" already exists")]
    DuplicateCategoryName(String),

    /// The user already has a pending request to join the family.
    #[error("you have already asked to join this family")]
    DuplicateJoinRequest,

    /// The category ID used for a transaction does not refer to a category the
    /// user can see or the category is for the other kind of transaction.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory(Option<CategoryId>),

    /// A transaction amount must be a positive number.
    #[error("{0} is not a valid amount, the amount must be greater than zero")]
    InvalidAmount(f64),

    /// A date in the future was used to create a transaction.
    ///
    /// Transactions record events that have already happened, therefore future
    /// dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// No invitation exists with the given access code.
    #[error("invalid access code")]
    InvalidAccessCode,

    /// The invitation has expired or was already used.
    #[error("the access code has expired or has already been used")]
    ExpiredAccessCode,

    /// The family name does not match the family of the invitation.
    #[error("the family name does not match the invitation")]
    FamilyNameMismatch,

    /// Only one of the family name and access code was provided.
    #[error("enter both the family name and the access code, or leave both empty")]
    IncompleteFamilyDetails,

    /// The user is already a member of a family.
    #[error("you already belong to a family")]
    AlreadyInFamily,

    /// The operation requires the user to be a member of a family.
    #[error("you do not belong to a family")]
    NotInFamily,

    /// The operation is restricted to the creator of the family.
    #[error("only the creator of the family can do this")]
    NotFamilyCreator,

    /// The operation is restricted to adults.
    #[error("only adults can do this")]
    AdultOnly,

    /// The user tried to change a resource that belongs to someone else.
    #[error("you do not have permission to change this")]
    Forbidden,

    /// The currency code is not a three letter ISO 4217 code.
    #[error("\"{0}\" is not a valid currency code")]
    InvalidCurrencyCode(String),

    /// The request to the exchange rate API failed.
    #[error("the exchange rate service failed: {0}")]
    CurrencyApi(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to update a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// Tried to update a user that does not exist
    #[error("tried to update a user that is not in the database")]
    UpdateMissingUser,

    /// Tried to delete a user that does not exist
    #[error("tried to delete a user that is not in the database")]
    DeleteMissingUser,

    /// Tried to accept or reject a join request that does not exist
    #[error("tried to review a join request that is not in the database")]
    MissingJoinRequest,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// Returns true if `error` is a failed UNIQUE constraint on `column`, e.g. "user.login".
pub(crate) fn is_unique_violation(error: &rusqlite::Error, column: &str) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
            },
            Some(description),
        ) if description.contains(column)
    )
}

/// Returns true if `error` is a failed FOREIGN KEY constraint.
pub(crate) fn is_foreign_key_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
            },
            _,
        )
    )
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => ErrorPage::not_found().into_response(),
            Error::AdultOnly => ErrorPage::forbidden(
                "This page is only for adults.",
                "Ask an adult in your family for help.",
            )
            .into_response(),
            Error::NotFamilyCreator => ErrorPage::forbidden(
                "Only the creator of the family can manage join requests.",
                "Ask the person who created your family to review the requests.",
            )
            .into_response(),
            Error::Forbidden => ErrorPage::forbidden(
                "You are not allowed to see this page.",
                "Go back to your dashboard.",
            )
            .into_response(),
            Error::InvalidTimezoneError(timezone) => ErrorPage::internal(
                "Invalid Timezone Settings",
                format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            )
            .into_response(),
            Error::DatabaseLockError => ErrorPage::internal_default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                ErrorPage::internal_default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            Error::FutureDate(date) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid transaction date".to_owned(),
                    details: format!(
                        "{date} is a date in the future, which is not allowed. \
                        Change the date to today or earlier."
                    ),
                },
            ),
            Error::InvalidAmount(amount) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid amount".to_owned(),
                    details: format!("{amount} is not a valid amount, enter a positive number."),
                },
            ),
            Error::InvalidCategory(category_id) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid category".to_owned(),
                    details: match category_id {
                        Some(id) => format!(
                            "Could not find a matching category with the ID {id}. \
                            Choose a category for this type of transaction."
                        ),
                        None => "Choose a category for this type of transaction.".to_owned(),
                    },
                },
            ),
            Error::AdultOnly => (
                StatusCode::FORBIDDEN,
                Alert::Error {
                    message: "Adults only".to_owned(),
                    details: "Only adults can do this. Ask an adult in your family for help."
                        .to_owned(),
                },
            ),
            Error::NotFamilyCreator => (
                StatusCode::FORBIDDEN,
                Alert::Error {
                    message: "Not allowed".to_owned(),
                    details: "Only the creator of the family can review join requests.".to_owned(),
                },
            ),
            Error::Forbidden => (
                StatusCode::FORBIDDEN,
                Alert::Error {
                    message: "Not allowed".to_owned(),
                    details: "You do not have permission to change this.".to_owned(),
                },
            ),
            Error::NotInFamily => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "No family".to_owned(),
                    details: "You need to create or join a family first.".to_owned(),
                },
            ),
            Error::UpdateMissingTransaction => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update transaction".to_owned(),
                    details: "The transaction could not be found.".to_owned(),
                },
            ),
            Error::DeleteMissingTransaction => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete transaction".to_owned(),
                    details: "The transaction could not be found. \
                    Try refreshing the page to see if the transaction has already been deleted."
                        .to_owned(),
                },
            ),
            Error::UpdateMissingCategory => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update category".to_owned(),
                    details: "The category could not be found.".to_owned(),
                },
            ),
            Error::DeleteMissingCategory => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete category".to_owned(),
                    details: "The category could not be found. \
                    Try refreshing the page to see if the category has already been deleted."
                        .to_owned(),
                },
            ),
            Error::UpdateMissingUser | Error::DeleteMissingUser => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not find user".to_owned(),
                    details: "The user could not be found. Try refreshing the page.".to_owned(),
                },
            ),
            Error::MissingJoinRequest => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Invalid join request".to_owned(),
                    details: "The join request could not be found. \
                    Try refreshing the page to see if it has already been reviewed."
                        .to_owned(),
                },
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Not found".to_owned(),
                    details: "The requested item could not be found. Try refreshing the page."
                        .to_owned(),
                },
            ),
            Error::CurrencyApi(details) => (
                StatusCode::BAD_GATEWAY,
                Alert::Error {
                    message: "Currency conversion failed".to_owned(),
                    details: format!("The exchange rate service returned an error: {details}"),
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details:
                        "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                },
            ),
        };

        (status_code, alert.into_html()).into_response()
    }
}
