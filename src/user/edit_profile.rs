//! Editing the name, surname and email of the current user.

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
    AppState, Error, endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, field_error, link, text_input},
    navigation::NavBar,
    user::{Email, PersonName, UserID, get_user_by_id, update_user_profile},
};

/// The state needed to edit a profile.
#[derive(Debug, Clone)]
pub struct EditProfileState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub name: String,
    pub surname: String,
    pub email: String,
}

#[derive(Debug, Default)]
struct ProfileErrors {
    name: Option<String>,
    surname: Option<String>,
    email: Option<String>,
}

fn profile_form(form: &ProfileForm, errors: &ProfileErrors) -> Markup {
    html! {
        form
            hx-put=(endpoints::PROFILE_API)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            (text_input("name", "First Name", "text", &form.name, true))
            (field_error("name", errors.name.as_deref()))

            (text_input("surname", "Surname", "text", &form.surname, true))
            (field_error("surname", errors.surname.as_deref()))

            (text_input("email", "Email", "email", &form.email, true))
            (field_error("email", errors.email.as_deref()))

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save" }
        }
    }
}

/// Render the form for editing the current user's profile.
pub async fn get_edit_profile_page(
    State(state): State<EditProfileState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)?;
    let form = ProfileForm {
        name: user.name.to_string(),
        surname: user.surname.to_string(),
        email: user.email.to_string(),
    };

    let nav_bar = NavBar::new(endpoints::EDIT_PROFILE_VIEW).into_html();
    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h2 class="text-xl font-bold mb-4" { "Edit Profile" }
            (profile_form(&form, &ProfileErrors::default()))

            div class="mt-4" { (link(endpoints::PROFILE_VIEW, "Back to profile")) }
        }
    };

    Ok(base("Edit Profile", &content).into_response())
}

/// Save the name, surname and email from the profile form.
pub async fn update_profile_endpoint(
    State(state): State<EditProfileState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ProfileForm>,
) -> Response {
    let mut errors = ProfileErrors::default();

    let name = PersonName::new(&form.name, "name")
        .inspect_err(|error| errors.name = Some(error.to_string()))
        .ok();
    let surname = PersonName::new(&form.surname, "surname")
        .inspect_err(|error| errors.surname = Some(error.to_string()))
        .ok();
    let email = Email::new(&form.email)
        .inspect_err(|error| errors.email = Some(error.to_string()))
        .ok();

    let (Some(name), Some(surname), Some(email)) = (name, surname, email) else {
        return profile_form(&form, &errors).into_response();
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_user_profile(user_id, &name, &surname, &email, &connection) {
        Ok(()) => {
            tracing::info!("User {user_id} updated their profile");

            (
                HxRedirect(endpoints::PROFILE_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error @ Error::DuplicateEmail(_)) => {
            let errors = ProfileErrors {
                email: Some(error.to_string()),
                ..Default::default()
            };
            profile_form(&form, &errors).into_response()
        }
        Err(error) => {
            tracing::error!("Could not update profile of user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Form, extract::State, http::StatusCode};
    use rusqlite::Connection;

    use crate::{
        endpoints,
        test_utils::{
            assert_form_input_with_value, assert_hx_endpoint, assert_hx_redirect,
            assert_valid_html, create_test_family, create_test_kid, create_test_user,
            get_test_connection, must_get_form, parse_html_document, parse_html_fragment,
            select_text,
        },
        user::get_user_by_id,
    };

    use super::{EditProfileState, ProfileForm, get_edit_profile_page, update_profile_endpoint};

    fn state(conn: Connection) -> EditProfileState {
        EditProfileState {
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    fn form(name: &str, surname: &str, email: &str) -> Form<ProfileForm> {
        Form(ProfileForm {
            name: name.to_owned(),
            surname: surname.to_owned(),
            email: email.to_owned(),
        })
    }

    #[tokio::test]
    async fn page_is_prefilled() {
        let conn = get_test_connection();
        let alice = create_test_user("alice", &conn);

        let response = get_edit_profile_page(State(state(conn)), Extension(alice.id))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::PROFILE_API, "hx-put");
        assert_form_input_with_value(&form, "name", "text", "alice");
        assert_form_input_with_value(&form, "surname", "text", "Tester");
        assert_form_input_with_value(&form, "email", "email", "alice@example.com");
    }

    #[tokio::test]
    async fn updates_profile() {
        let conn = get_test_connection();
        let alice = create_test_user("alice", &conn);
        let state = state(conn);

        let response = update_profile_endpoint(
            State(state.clone()),
            Extension(alice.id),
            form(" Alice ", "Smith", "alice.smith@example.com"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::PROFILE_VIEW);
        let alice = get_user_by_id(alice.id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(alice.full_name(), "Alice Smith");
        assert_eq!(alice.email.as_ref(), "alice.smith@example.com");
    }

    #[tokio::test]
    async fn shows_field_errors() {
        let conn = get_test_connection();
        let alice = create_test_user("alice", &conn);

        let response =
            update_profile_endpoint(State(state(conn)), Extension(alice.id), form("", "Smith", "nope"))
                .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_eq!(
            select_text(&html, "p[data-error-for]"),
            ["name cannot be empty", "nope is not a valid email address"]
        );
    }

    #[tokio::test]
    async fn email_of_other_adult_is_rejected() {
        let conn = get_test_connection();
        let alice = create_test_user("alice", &conn);
        create_test_user("bob", &conn);

        let response = update_profile_endpoint(
            State(state(conn)),
            Extension(alice.id),
            form("Alice", "Tester", "bob@example.com"),
        )
        .await;

        let html = parse_html_fragment(response).await;
        assert_eq!(
            select_text(&html, "p[data-error-for=email]"),
            ["the email \"bob@example.com\" is already registered"]
        );
    }

    #[tokio::test]
    async fn kid_may_keep_parents_email() {
        let conn = get_test_connection();
        let alice = create_test_user("alice", &conn);
        let (_, alice) = create_test_family("Smith", &alice, &conn);
        let timmy = create_test_kid("timmy", &alice, &conn);

        let response = update_profile_endpoint(
            State(state(conn)),
            Extension(timmy.id),
            form("Timmy", "Smith", "alice@example.com"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}
