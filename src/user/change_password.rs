//! Changing the password of the current user.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword, endpoints,
    error_page::get_internal_server_error_redirect,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        confirm_password_input, field_error, link, password_input,
    },
    navigation::NavBar,
    user::{UserID, get_user_by_id, register::PASSWORD_INPUT_MIN_LENGTH, update_user_password},
};

/// The state needed to change a password.
#[derive(Debug, Clone)]
pub struct ChangePasswordState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ChangePasswordState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

#[derive(Deserialize)]
pub struct ChangePasswordForm {
    pub current_password: String,
    /// The new password.
    pub password: String,
    pub confirm_password: String,
}

pub(crate) const INCORRECT_PASSWORD_ERROR_MSG: &str = "Your current password is incorrect.";

#[derive(Debug, Default)]
struct PasswordErrors {
    current_password: Option<String>,
    password: Option<String>,
    confirm_password: Option<String>,
}

/// A password input for confirming who the user is before a sensitive change.
pub(crate) fn current_password_input(error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label for="current-password" class=(FORM_LABEL_STYLE) { "Current Password" }

            input
                type="password"
                name="current_password"
                id="current-password"
                autocomplete="current-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                autofocus;

            (field_error("current_password", error_message))
        }
    }
}

fn change_password_form(errors: &PasswordErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::CHANGE_PASSWORD_API)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            (current_password_input(errors.current_password.as_deref()))
            (password_input("", PASSWORD_INPUT_MIN_LENGTH, errors.password.as_deref()))
            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, errors.confirm_password.as_deref()))

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Change Password" }
        }
    }
}

/// Render the change password page.
pub async fn get_change_password_page() -> Response {
    let nav_bar = NavBar::new(endpoints::CHANGE_PASSWORD_VIEW).into_html();
    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h2 class="text-xl font-bold mb-4" { "Change Password" }
            (change_password_form(&PasswordErrors::default()))

            div class="mt-4" { (link(endpoints::PROFILE_VIEW, "Back to profile")) }
        }
    };

    base("Change Password", &content).into_response()
}

/// Check whether `password` is the password of the user with `user_id`.
pub(crate) fn check_current_password(
    user_id: UserID,
    password: &str,
    connection: &Connection,
) -> Result<bool, Error> {
    let user = get_user_by_id(user_id, connection)?;

    user.password_hash
        .verify(password)
        .map_err(|error| Error::HashingError(error.to_string()))
}

/// Replace the user's password after checking their current one.
pub async fn change_password_endpoint(
    State(state): State<ChangePasswordState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ChangePasswordForm>,
) -> Response {
    let mut errors = PasswordErrors::default();

    let new_password = ValidatedPassword::new(&form.password)
        .inspect_err(|error| errors.password = Some(error.to_string()))
        .ok();

    if form.password != form.confirm_password {
        errors.confirm_password = Some("Passwords do not match".to_owned());
    }

    let is_current_password = match state.db_connection.lock() {
        Ok(connection) => check_current_password(user_id, &form.current_password, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            Err(Error::DatabaseLockError)
        }
    };

    match is_current_password {
        Ok(true) => {}
        Ok(false) => {
            tracing::info!("User {user_id} entered the wrong password when changing it");
            errors.current_password = Some(INCORRECT_PASSWORD_ERROR_MSG.to_owned());
        }
        Err(error) => {
            tracing::error!("Could not check the password of user {user_id}: {error}");
            return error.into_alert_response();
        }
    }

    let new_password = match new_password {
        Some(password) if errors.current_password.is_none() && errors.confirm_password.is_none() => {
            password
        }
        _ => return change_password_form(&errors).into_response(),
    };

    let password_hash = match PasswordHash::new(new_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing a password: {error}");

            return get_internal_server_error_redirect();
        }
    };

    let updated = match state.db_connection.lock() {
        Ok(connection) => update_user_password(user_id, &password_hash, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            Err(Error::DatabaseLockError)
        }
    };

    match updated {
        Ok(()) => {
            tracing::info!("User {user_id} changed their password");

            (
                HxRedirect(endpoints::PROFILE_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not update the password of user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Form, extract::State, http::StatusCode};

    use crate::{
        endpoints,
        test_utils::{
            TEST_PASSWORD, assert_form_input, assert_hx_endpoint, assert_hx_redirect,
            assert_valid_html, create_test_user, get_test_connection, must_get_form,
            parse_html_document, parse_html_fragment, select_text,
        },
        user::get_user_by_id,
    };

    use super::{
        ChangePasswordForm, ChangePasswordState, INCORRECT_PASSWORD_ERROR_MSG,
        change_password_endpoint, get_change_password_page,
    };

    const NEW_PASSWORD: &str = "Another very long phrase 99?";

    fn form(current: &str, new: &str, confirm: &str) -> Form<ChangePasswordForm> {
        Form(ChangePasswordForm {
            current_password: current.to_owned(),
            password: new.to_owned(),
            confirm_password: confirm.to_owned(),
        })
    }

    #[tokio::test]
    async fn render_page() {
        let response = get_change_password_page().await;

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::CHANGE_PASSWORD_API, "hx-post");
        assert_form_input(&form, "current_password", "password");
        assert_form_input(&form, "password", "password");
        assert_form_input(&form, "confirm_password", "password");
    }

    #[tokio::test]
    async fn changes_password() {
        let conn = get_test_connection();
        let alice = create_test_user("alice", &conn);
        let state = ChangePasswordState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = change_password_endpoint(
            State(state.clone()),
            Extension(alice.id),
            form(TEST_PASSWORD, NEW_PASSWORD, NEW_PASSWORD),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::PROFILE_VIEW);
        let alice = get_user_by_id(alice.id, &state.db_connection.lock().unwrap()).unwrap();
        assert!(alice.password_hash.verify(NEW_PASSWORD).unwrap());
        assert!(!alice.password_hash.verify(TEST_PASSWORD).unwrap());
    }

    #[tokio::test]
    async fn wrong_current_password_is_rejected() {
        let conn = get_test_connection();
        let alice = create_test_user("alice", &conn);
        let state = ChangePasswordState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = change_password_endpoint(
            State(state.clone()),
            Extension(alice.id),
            form("not my password", NEW_PASSWORD, NEW_PASSWORD),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_eq!(
            select_text(&html, "p[data-error-for=current_password]"),
            [INCORRECT_PASSWORD_ERROR_MSG]
        );
        let alice = get_user_by_id(alice.id, &state.db_connection.lock().unwrap()).unwrap();
        assert!(alice.password_hash.verify(TEST_PASSWORD).unwrap());
    }

    #[tokio::test]
    async fn new_password_must_match_confirmation() {
        let conn = get_test_connection();
        let alice = create_test_user("alice", &conn);
        let state = ChangePasswordState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = change_password_endpoint(
            State(state),
            Extension(alice.id),
            form(TEST_PASSWORD, NEW_PASSWORD, "something else"),
        )
        .await;

        let html = parse_html_fragment(response).await;
        assert_eq!(
            select_text(&html, "p[data-error-for=confirm_password]"),
            ["Passwords do not match"]
        );
    }

    #[tokio::test]
    async fn weak_new_password_is_rejected() {
        let conn = get_test_connection();
        let alice = create_test_user("alice", &conn);
        let state = ChangePasswordState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = change_password_endpoint(
            State(state),
            Extension(alice.id),
            form(TEST_PASSWORD, "short", "short"),
        )
        .await;

        let html = parse_html_fragment(response).await;
        let errors = select_text(&html, "p[data-error-for=password]");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("password is too weak"), "got {errors:?}");
    }
}
