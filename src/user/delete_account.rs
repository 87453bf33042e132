//! Deleting the current user's account.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::invalidate_auth_cookie,
    endpoints,
    html::{FORM_CONTAINER_STYLE, base, link},
    navigation::NavBar,
    user::{
        UserID,
        change_password::{
            INCORRECT_PASSWORD_ERROR_MSG, check_current_password, current_password_input,
        },
        delete_user,
    },
};

/// The state needed to delete an account.
#[derive(Debug, Clone)]
pub struct DeleteAccountState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<DeleteAccountState> for Key {
    fn from_ref(state: &DeleteAccountState) -> Self {
        state.cookie_key.clone()
    }
}

#[derive(Deserialize)]
pub struct DeleteAccountForm {
    pub current_password: String,
}

fn delete_account_form(error_message: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::DELETE_ACCOUNT_API)
            hx-swap="outerHTML"
            hx-confirm="Delete your account? This cannot be undone."
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            p
            {
                "Your transactions, categories and join requests will be deleted with your account."
            }

            (current_password_input(error_message))

            button
                type="submit"
                class="w-full px-4 py-2 bg-red-600 hover:bg-red-700 text-white rounded"
            {
                "Delete Account"
            }
        }
    }
}

/// Render the page for deleting the current user's account.
pub async fn get_delete_account_page() -> Response {
    let nav_bar = NavBar::new(endpoints::DELETE_ACCOUNT_VIEW).into_html();
    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h2 class="text-xl font-bold mb-4" { "Delete Account" }
            (delete_account_form(None))

            div class="mt-4" { (link(endpoints::PROFILE_VIEW, "Keep my account")) }
        }
    };

    base("Delete Account", &content).into_response()
}

/// Delete the user's account after checking their password, then log them out.
pub async fn delete_account_endpoint(
    State(state): State<DeleteAccountState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
    Form(form): Form<DeleteAccountForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match check_current_password(user_id, &form.current_password, &connection) {
        Ok(true) => {}
        Ok(false) => {
            tracing::info!("User {user_id} entered the wrong password when deleting their account");
            return delete_account_form(Some(INCORRECT_PASSWORD_ERROR_MSG)).into_response();
        }
        Err(error) => {
            tracing::error!("Could not check the password of user {user_id}: {error}");
            return error.into_alert_response();
        }
    }

    match delete_user(user_id, &connection) {
        Ok(()) => {
            tracing::info!("User {user_id} deleted their account");

            (
                StatusCode::SEE_OTHER,
                HxRedirect(endpoints::LOG_IN_VIEW.to_owned()),
                invalidate_auth_cookie(jar),
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not delete user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Form,
        extract::State,
        http::{StatusCode, header::SET_COOKIE},
    };
    use axum_extra::extract::{PrivateCookieJar, cookie::Cookie};
    use time::OffsetDateTime;

    use crate::{
        Error,
        app_state::create_cookie_key,
        auth::COOKIE_TOKEN,
        category::CategoryKind,
        endpoints,
        test_utils::{
            TEST_PASSWORD, assert_hx_redirect, assert_valid_html, create_test_category,
            create_test_transaction, create_test_user, get_test_connection, must_get_form,
            parse_html_document, parse_html_fragment, past_date, select_text,
        },
        transaction::{TransactionKind, count_transactions},
        user::get_user_by_id,
    };

    use super::{
        DeleteAccountForm, DeleteAccountState, delete_account_endpoint, get_delete_account_page,
    };

    fn new_state(conn: rusqlite::Connection) -> DeleteAccountState {
        DeleteAccountState {
            cookie_key: create_cookie_key("foobar"),
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    fn form(password: &str) -> Form<DeleteAccountForm> {
        Form(DeleteAccountForm {
            current_password: password.to_owned(),
        })
    }

    #[tokio::test]
    async fn render_page() {
        let response = get_delete_account_page().await;

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_eq!(
            form.value().attr("hx-post"),
            Some(endpoints::DELETE_ACCOUNT_API)
        );
    }

    #[tokio::test]
    async fn deletes_account_and_logs_out() {
        let conn = get_test_connection();
        let alice = create_test_user("alice", &conn);
        create_test_category("Food", CategoryKind::Expense, &alice, &conn);
        create_test_transaction(&alice, TransactionKind::Expense, 12.5, past_date(), &conn);
        let state = new_state(conn);
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response = delete_account_endpoint(
            State(state.clone()),
            Extension(alice.id),
            jar,
            form(TEST_PASSWORD),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::LOG_IN_VIEW);
        let cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|header| header.to_str().ok())
            .filter_map(|header| Cookie::parse(header.to_owned()).ok())
            .find(|cookie| cookie.name() == COOKIE_TOKEN)
            .expect("expected the auth cookie to be replaced");
        assert!(cookie.expires_datetime() <= Some(OffsetDateTime::now_utc()));

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_user_by_id(alice.id, &connection), Err(Error::NotFound));
        assert_eq!(count_transactions(&connection).unwrap(), 0);
    }

    #[tokio::test]
    async fn wrong_password_keeps_account() {
        let conn = get_test_connection();
        let alice = create_test_user("alice", &conn);
        let state = new_state(conn);
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response = delete_account_endpoint(
            State(state.clone()),
            Extension(alice.id),
            jar,
            form("wrong"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_eq!(
            select_text(&html, "p[data-error-for=current_password]"),
            ["Your current password is incorrect."]
        );
        assert!(get_user_by_id(alice.id, &state.db_connection.lock().unwrap()).is_ok());
    }
}
