//! The registration page, optionally joining a family with an invitation.
use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    app_state::create_cookie_key,
    auth::{DEFAULT_COOKIE_DURATION, set_auth_cookie},
    endpoints,
    error_page::get_internal_server_error_redirect,
    family::{
        AccessCode, FamilyName, get_invitation_family, get_usable_invitation,
        mark_invitation_accepted,
    },
    html::{
        BUTTON_PRIMARY_STYLE, base, confirm_password_input, field_error, loading_spinner,
        password_input, public_form_card, text_input,
    },
    password::MIN_PASSWORD_LENGTH,
    timezone::get_local_offset,
    user::{Email, Login, NewUser, PersonName, Role, User, create_user},
};

/// The minimum password length checked on the client side, the server checks the rest.
pub(crate) const PASSWORD_INPUT_MIN_LENGTH: u8 = MIN_PASSWORD_LENGTH as u8;

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Europe/Warsaw".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl RegistrationState {
    /// Create the cookie key from a string and set the default cookie duration.
    pub fn new(
        cookie_secret: &str,
        local_timezone: &str,
        db_connection: Arc<Mutex<Connection>>,
    ) -> Self {
        Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            db_connection,
        }
    }
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data entered in the registration form.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub login: String,
    pub password: String,
    pub confirm_password: String,
    /// Together with `access_code`, the family to join.
    #[serde(default)]
    pub family_name: String,
    #[serde(default)]
    pub access_code: String,
}

/// Error messages for each field of the registration form.
#[derive(Debug, Default, PartialEq)]
struct RegistrationErrors {
    name: Option<String>,
    surname: Option<String>,
    email: Option<String>,
    login: Option<String>,
    password: Option<String>,
    confirm_password: Option<String>,
    family: Option<String>,
}

impl RegistrationErrors {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The registration form after every field passed validation.
struct ValidRegistration {
    name: PersonName,
    surname: PersonName,
    email: Email,
    login: Login,
    password: ValidatedPassword,
    family: Option<(FamilyName, AccessCode)>,
}

fn validate(form: &RegisterForm) -> Result<ValidRegistration, RegistrationErrors> {
    let mut errors = RegistrationErrors::default();

    let name = PersonName::new(&form.name, "name")
        .inspect_err(|error| errors.name = Some(error.to_string()))
        .ok();
    let surname = PersonName::new(&form.surname, "surname")
        .inspect_err(|error| errors.surname = Some(error.to_string()))
        .ok();
    let email = Email::new(&form.email)
        .inspect_err(|error| errors.email = Some(error.to_string()))
        .ok();
    let login = Login::new(&form.login)
        .inspect_err(|error| errors.login = Some(error.to_string()))
        .ok();
    let password = ValidatedPassword::new(&form.password)
        .inspect_err(|error| errors.password = Some(error.to_string()))
        .ok();

    if form.password != form.confirm_password {
        errors.confirm_password = Some("Passwords do not match".to_owned());
    }

    let family = match (form.family_name.trim(), form.access_code.trim()) {
        ("", "") => None,
        ("", _) | (_, "") => {
            errors.family = Some(Error::IncompleteFamilyDetails.to_string());
            None
        }
        (family_name, access_code) => FamilyName::new(family_name)
            .and_then(|family_name| Ok((family_name, AccessCode::new(access_code)?)))
            .inspect_err(|error| errors.family = Some(error.to_string()))
            .ok(),
    };

    match (name, surname, email, login, password) {
        (Some(name), Some(surname), Some(email), Some(login), Some(password))
            if errors.is_empty() =>
        {
            Ok(ValidRegistration {
                name,
                surname,
                email,
                login,
                password,
                family,
            })
        }
        _ => Err(errors),
    }
}

fn registration_form(form: &RegisterForm, errors: &RegistrationErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            (text_input("name", "First Name", "text", &form.name, true))
            (field_error("name", errors.name.as_deref()))

            (text_input("surname", "Surname", "text", &form.surname, true))
            (field_error("surname", errors.surname.as_deref()))

            (text_input("email", "Email", "email", &form.email, true))
            (field_error("email", errors.email.as_deref()))

            (text_input("login", "Login", "text", &form.login, true))
            (field_error("login", errors.login.as_deref()))

            (password_input(&form.password, PASSWORD_INPUT_MIN_LENGTH, errors.password.as_deref()))
            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, errors.confirm_password.as_deref()))

            fieldset class="space-y-4"
            {
                legend class="text-sm text-gray-500 dark:text-gray-400"
                {
                    "Have an invitation? Enter the family name and access code you were given."
                }

                (text_input("family_name", "Family Name", "text", &form.family_name, false))
                (text_input("access_code", "Access Code", "text", &form.access_code, false))
                (field_error("family", errors.family.as_deref()))
            }

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Register"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a
                    href=(endpoints::LOG_IN_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form =
        registration_form(&RegisterForm::default(), &RegistrationErrors::default());
    let content = public_form_card("Create an account", &registration_form);
    base("Register", &content).into_response()
}

/// Insert the user and, when they registered with an invitation, use it to
/// join its family.
fn insert_user(
    registration: ValidRegistration,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    let family = match &registration.family {
        Some((family_name, access_code)) => {
            let invitation =
                get_usable_invitation(access_code, OffsetDateTime::now_utc(), connection)?;
            let family = get_invitation_family(&invitation, family_name, connection)?;
            Some((invitation, family))
        }
        None => None,
    };

    let transaction = connection.unchecked_transaction()?;

    let user = create_user(
        NewUser {
            name: registration.name,
            surname: registration.surname,
            email: registration.email,
            login: registration.login,
            password_hash,
            role: Role::Adult,
            family_id: family.as_ref().map(|(_, family)| family.id),
            parent_id: None,
        },
        &transaction,
    )?;

    if let Some((invitation, _)) = &family {
        mark_invitation_accepted(invitation.id, &transaction)?;
    }

    transaction.commit()?;

    Ok(user)
}

/// Map the errors from inserting a user to the form field they relate to.
fn into_field_errors(error: Error) -> Result<RegistrationErrors, Error> {
    let message = Some(error.to_string());

    match error {
        Error::DuplicateLogin(_) => Ok(RegistrationErrors {
            login: message,
            ..Default::default()
        }),
        Error::DuplicateEmail(_) => Ok(RegistrationErrors {
            email: message,
            ..Default::default()
        }),
        Error::InvalidAccessCode | Error::ExpiredAccessCode | Error::FamilyNameMismatch => {
            Ok(RegistrationErrors {
                family: message,
                ..Default::default()
            })
        }
        error => Err(error),
    }
}

/// Create an adult account from the registration form and log the new user in.
///
/// Validation errors are shown next to the field they relate to.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    let registration = match validate(&form) {
        Ok(registration) => registration,
        Err(errors) => return registration_form(&form, &errors).into_response(),
    };

    let local_timezone = match get_local_offset(&state.local_timezone) {
        Some(offset) => offset,
        None => return Error::InvalidTimezoneError(state.local_timezone).into_response(),
    };

    let password = registration.password.clone();
    let password_hash = match PasswordHash::new(password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing a password: {error}");

            return get_internal_server_error_redirect();
        }
    };

    let inserted = match state.db_connection.lock() {
        Ok(connection) => insert_user(registration, password_hash, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let user = match inserted.map_err(into_field_errors) {
        Ok(user) => user,
        Err(Ok(errors)) => return registration_form(&form, &errors).into_response(),
        Err(Err(error)) => {
            tracing::error!("An unhandled error occurred while inserting a new user: {error}");
            return error.into_alert_response();
        }
    };

    tracing::info!(
        "Registered user {} ({}) in family {:?}",
        user.id,
        user.login,
        user.family_id
    );

    match set_auth_cookie(jar, user.id, state.cookie_duration, local_timezone) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An error occurred while setting the auth cookie: {error}");

            get_internal_server_error_redirect()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form,
        body::Body,
        extract::State,
        http::{Response, StatusCode, header::SET_COOKIE},
    };
    use axum_extra::extract::PrivateCookieJar;
    use time::OffsetDateTime;

    use crate::{
        auth::COOKIE_TOKEN,
        endpoints,
        family::{create_invitation, get_invitation_by_code},
        test_utils::{
            TEST_PASSWORD, assert_form_input, assert_hx_endpoint, assert_hx_redirect,
            assert_optional_form_input, assert_valid_html, create_test_family, create_test_user,
            get_test_connection, must_get_form, parse_html_document, parse_html_fragment,
            select_text,
        },
        user::{Login, Role, count_users, get_user_by_login},
    };

    use super::{RegisterForm, RegistrationState, get_register_page, register_user};

    fn form(login: &str) -> RegisterForm {
        RegisterForm {
            name: "Bob".to_owned(),
            surname: "Builder".to_owned(),
            email: format!("{login}@example.com"),
            login: login.to_owned(),
            password: TEST_PASSWORD.to_owned(),
            confirm_password: TEST_PASSWORD.to_owned(),
            family_name: String::new(),
            access_code: String::new(),
        }
    }

    async fn register(state: &RegistrationState, form: RegisterForm) -> Response<Body> {
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        register_user(State(state.clone()), jar, Form(form)).await
    }

    fn new_state(connection: rusqlite::Connection) -> RegistrationState {
        RegistrationState::new("foobar", "Etc/UTC", Arc::new(Mutex::new(connection)))
    }

    async fn field_error(response: Response<Body>, field: &str) -> String {
        let html = parse_html_fragment(response).await;
        select_text(&html, &format!("p[data-error-for={field}]"))
            .into_iter()
            .next()
            .unwrap_or_else(|| panic!("expected an error for {field}"))
    }

    #[tokio::test]
    async fn render_register_page() {
        let response = get_register_page().await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::USERS, "hx-post");
        assert_form_input(&form, "name", "text");
        assert_form_input(&form, "surname", "text");
        assert_form_input(&form, "email", "email");
        assert_form_input(&form, "login", "text");
        assert_form_input(&form, "password", "password");
        assert_form_input(&form, "confirm_password", "password");
        assert_optional_form_input(&form, "family_name", "text");
        assert_optional_form_input(&form, "access_code", "text");
    }

    #[tokio::test]
    async fn registers_adult_and_logs_in() {
        let state = new_state(get_test_connection());

        let response = register(&state, form("Bob")).await;

        assert_hx_redirect(&response, endpoints::DASHBOARD_VIEW);
        let cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.starts_with(COOKIE_TOKEN));
        assert!(cookie.is_some(), "expected the auth cookie to be set");

        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_login(&Login::new_unchecked("bob"), &connection).unwrap();
        assert_eq!(user.role, Role::Adult);
        assert_eq!(user.family_id, None);
        assert_eq!(user.full_name(), "Bob Builder");
    }

    #[tokio::test]
    async fn joins_family_with_invitation() {
        let connection = get_test_connection();
        let alice = create_test_user("alice", &connection);
        let (family, alice) = create_test_family("Smith", &alice, &connection);
        let invitation = create_invitation(
            family.id,
            "bob@example.com",
            alice.id,
            OffsetDateTime::now_utc(),
            &connection,
        )
        .unwrap();
        let state = new_state(connection);
        let mut form = form("bob");
        form.family_name = "Smith".to_owned();
        form.access_code = invitation.access_code.as_ref().to_lowercase();

        let response = register(&state, form).await;

        assert_hx_redirect(&response, endpoints::DASHBOARD_VIEW);
        let connection = state.db_connection.lock().unwrap();
        let bob = get_user_by_login(&Login::new_unchecked("bob"), &connection).unwrap();
        assert_eq!(bob.family_id, Some(family.id));
        let invitation = get_invitation_by_code(&invitation.access_code, &connection).unwrap();
        assert!(invitation.accepted);
    }

    #[tokio::test]
    async fn family_name_without_code_is_rejected() {
        let state = new_state(get_test_connection());
        let mut form = form("bob");
        form.family_name = "Smith".to_owned();

        let response = register(&state, form).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            field_error(response, "family").await,
            "enter both the family name and the access code, or leave both empty"
        );
        assert_eq!(count_users(&state.db_connection.lock().unwrap()).unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_access_code_is_rejected() {
        let connection = get_test_connection();
        let alice = create_test_user("alice", &connection);
        create_test_family("Smith", &alice, &connection);
        let state = new_state(connection);
        let mut form = form("bob");
        form.family_name = "Smith".to_owned();
        form.access_code = "NOPE1234".to_owned();

        let response = register(&state, form).await;

        assert_eq!(field_error(response, "family").await, "invalid access code");
        assert_eq!(count_users(&state.db_connection.lock().unwrap()).unwrap(), 1);
    }

    #[tokio::test]
    async fn access_code_for_other_family_is_rejected() {
        let connection = get_test_connection();
        let alice = create_test_user("alice", &connection);
        let (family, alice) = create_test_family("Smith", &alice, &connection);
        let invitation = create_invitation(
            family.id,
            "bob@example.com",
            alice.id,
            OffsetDateTime::now_utc(),
            &connection,
        )
        .unwrap();
        let state = new_state(connection);
        let mut form = form("bob");
        form.family_name = "Jones".to_owned();
        form.access_code = invitation.access_code.as_ref().to_owned();

        let response = register(&state, form).await;

        assert_eq!(
            field_error(response, "family").await,
            "the family name does not match the invitation"
        );
    }

    #[tokio::test]
    async fn mismatched_passwords_are_rejected() {
        let state = new_state(get_test_connection());
        let mut form = form("bob");
        form.confirm_password = "something else".to_owned();

        let response = register(&state, form).await;

        let html = parse_html_fragment(response).await;
        assert_eq!(
            select_text(&html, "p[data-error-for=confirm_password]"),
            ["Passwords do not match"]
        );
    }

    #[tokio::test]
    async fn weak_password_is_rejected() {
        let state = new_state(get_test_connection());
        let mut form = form("bob");
        form.password = "password".to_owned();
        form.confirm_password = "password".to_owned();

        let response = register(&state, form).await;

        let html = parse_html_fragment(response).await;
        let errors = select_text(&html, "p[data-error-for=password]");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("password is too weak"), "got {errors:?}");
    }

    #[tokio::test]
    async fn duplicate_login_is_shown_on_login_field() {
        let connection = get_test_connection();
        create_test_user("bob", &connection);
        let state = new_state(connection);
        let mut form = form("BOB");
        form.email = "other@example.com".to_owned();

        let response = register(&state, form).await;

        assert_eq!(
            field_error(response, "login").await,
            "the login \"bob\" is already taken"
        );
    }

    #[tokio::test]
    async fn every_invalid_field_gets_an_error() {
        let state = new_state(get_test_connection());
        let form = RegisterForm {
            email: "not-an-email".to_owned(),
            login: "bob smith".to_owned(),
            ..RegisterForm::default()
        };

        let response = register(&state, form).await;

        let html = parse_html_fragment(response).await;
        assert_eq!(
            select_text(&html, "p[data-error-for]:not([data-error-for=password])"),
            [
                "name cannot be empty",
                "surname cannot be empty",
                "not-an-email is not a valid email address",
                "login \"bob smith\" must not contain spaces",
            ]
        );
    }
}
