//! Family Budget is a web app for tracking the income and expenses of a household.
//!
//! Users can form a family, invite other adults with an access code and
//! create accounts for their kids. Adults see the transactions of the whole
//! family while kids only see their own.
//!
//! This library provides a web server that directly serves HTML pages,
//! a small JSON reporting API and a currency converter.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod category;
mod currency;
mod dashboard;
mod db;
mod endpoints;
mod error;
mod error_page;
mod family;
mod html;
mod logging;
mod navigation;
mod password;
mod routing;
mod timezone;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use category::{CategoryKind, CategoryName, create_category};
pub use currency::{CurrencyClient, CurrencyCode, DEFAULT_CURRENCY_API_URL, DEFAULT_FROM_CURRENCY};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use family::{FamilyName, create_family};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use transaction::{Transaction, TransactionKind, create_transaction};
pub use user::{
    Email, Login, NewUser, PersonName, Role, User, UserID, create_user, get_user_by_id,
    get_user_by_login, update_user_password,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
