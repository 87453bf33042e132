//! Kid accounts: adults create them in their family and can block them.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    endpoints::{self, format_endpoint},
    error_page::get_internal_server_error_redirect,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, LINK_STYLE,
        TABLE_CELL_STYLE, TABLE_ROW_STYLE, base, confirm_password_input, field_error,
        password_input, text_input,
    },
    navigation::NavBar,
    user::{
        Email, Login, NewUser, PersonName, Role, User, UserID, create_user, get_user_by_id,
        register::PASSWORD_INPUT_MIN_LENGTH, require_adult, set_user_blocked,
    },
};

/// The state needed for managing kids.
#[derive(Debug, Clone)]
pub struct KidState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for KidState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The raw data entered in the new kid form.
#[derive(Debug, Default, Deserialize)]
pub struct KidForm {
    pub name: String,
    pub surname: String,
    pub login: String,
    /// Leave empty to use the parent's email.
    #[serde(default)]
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Default, PartialEq)]
struct KidErrors {
    name: Option<String>,
    surname: Option<String>,
    login: Option<String>,
    email: Option<String>,
    password: Option<String>,
    confirm_password: Option<String>,
    form: Option<String>,
}

struct ValidKid {
    name: PersonName,
    surname: PersonName,
    login: Login,
    email: Option<Email>,
    password: ValidatedPassword,
}

fn validate(form: &KidForm) -> Result<ValidKid, KidErrors> {
    let mut errors = KidErrors::default();

    let name = PersonName::new(&form.name, "name")
        .inspect_err(|error| errors.name = Some(error.to_string()))
        .ok();
    let surname = PersonName::new(&form.surname, "surname")
        .inspect_err(|error| errors.surname = Some(error.to_string()))
        .ok();
    let login = Login::new(&form.login)
        .inspect_err(|error| errors.login = Some(error.to_string()))
        .ok();
    let email = match form.email.trim() {
        "" => Some(None),
        email => Email::new(email)
            .inspect_err(|error| errors.email = Some(error.to_string()))
            .ok()
            .map(Some),
    };
    let password = ValidatedPassword::new(&form.password)
        .inspect_err(|error| errors.password = Some(error.to_string()))
        .ok();

    if form.password != form.confirm_password {
        errors.confirm_password = Some("Passwords do not match".to_owned());
    }

    match (name, surname, login, email, password) {
        (Some(name), Some(surname), Some(login), Some(email), Some(password))
            if errors == KidErrors::default() =>
        {
            Ok(ValidKid {
                name,
                surname,
                login,
                email,
                password,
            })
        }
        _ => Err(errors),
    }
}

fn kid_form(form: &KidForm, errors: &KidErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::KIDS_API)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            (text_input("name", "First Name", "text", &form.name, true))
            (field_error("name", errors.name.as_deref()))

            (text_input("surname", "Surname", "text", &form.surname, true))
            (field_error("surname", errors.surname.as_deref()))

            (text_input("login", "Login", "text", &form.login, true))
            (field_error("login", errors.login.as_deref()))

            (text_input("email", "Email (leave empty to use yours)", "email", &form.email, false))
            (field_error("email", errors.email.as_deref()))

            (password_input(&form.password, PASSWORD_INPUT_MIN_LENGTH, errors.password.as_deref()))
            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, errors.confirm_password.as_deref()))

            (field_error("form", errors.form.as_deref()))

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Kid Account" }
        }
    }
}

/// Render the page for creating a kid account.
///
/// Adults without a family are sent to the create family page.
pub async fn get_new_kid_page(
    State(state): State<KidState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)?;
    require_adult(&user)?;

    if user.family_id.is_none() {
        return Ok(Redirect::to(endpoints::NEW_FAMILY_VIEW).into_response());
    }

    let nav_bar = NavBar::new(endpoints::NEW_KID_VIEW).into_html();
    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h2 class="text-xl font-bold mb-4" { "Create a Kid Account" }
            (kid_form(&KidForm::default(), &KidErrors::default()))
        }
    };

    Ok(base("New Kid", &content).into_response())
}

/// Create a kid account in the adult's family with the adult as its parent.
pub async fn create_kid_endpoint(
    State(state): State<KidState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<KidForm>,
) -> Response {
    let kid = match validate(&form) {
        Ok(kid) => kid,
        Err(errors) => return kid_form(&form, &errors).into_response(),
    };

    let password_hash = match PasswordHash::new(kid.password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing a password: {error}");

            return get_internal_server_error_redirect();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let parent = match get_user_by_id(user_id, &connection) {
        Ok(parent) => parent,
        Err(error) => return error.into_alert_response(),
    };

    if let Err(error) = require_adult(&parent) {
        return error.into_alert_response();
    }

    let Some(family_id) = parent.family_id else {
        let errors = KidErrors {
            form: Some(Error::NotInFamily.to_string()),
            ..Default::default()
        };
        return kid_form(&form, &errors).into_response();
    };

    let new_kid = NewUser {
        name: kid.name,
        surname: kid.surname,
        email: kid.email.unwrap_or_else(|| parent.email.clone()),
        login: kid.login,
        password_hash,
        role: Role::Kid,
        family_id: Some(family_id),
        parent_id: Some(parent.id),
    };

    match create_user(new_kid, &connection) {
        Ok(kid) => {
            tracing::info!("User {user_id} created kid {} ({})", kid.id, kid.login);

            (
                HxRedirect(endpoints::PROFILE_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error @ Error::DuplicateLogin(_)) => {
            let errors = KidErrors {
                login: Some(error.to_string()),
                ..Default::default()
            };
            kid_form(&form, &errors).into_response()
        }
        Err(error @ Error::DuplicateEmail(_)) => {
            let errors = KidErrors {
                email: Some(error.to_string()),
                ..Default::default()
            };
            kid_form(&form, &errors).into_response()
        }
        Err(error) => {
            tracing::error!("Could not create kid: {error}");
            error.into_alert_response()
        }
    }
}

/// A table row for a kid with a button that blocks or unblocks them.
pub(crate) fn kid_row(kid: &User) -> Markup {
    html! {
        tr class=(TABLE_ROW_STYLE) data-kid-id=(kid.id)
        {
            td class=(TABLE_CELL_STYLE) { (kid.full_name()) }
            td class=(TABLE_CELL_STYLE) { (kid.login) }
            td class=(TABLE_CELL_STYLE) data-kid-status
            {
                @if kid.is_blocked { "Blocked" } @else { "Active" }
            }
            td class=(TABLE_CELL_STYLE)
            {
                @if kid.is_blocked {
                    button
                        type="button"
                        hx-post=(format_endpoint(endpoints::UNBLOCK_KID, kid.id.as_i64()))
                        hx-target="closest tr"
                        hx-target-error="#alert-container"
                        hx-swap="outerHTML"
                        class=(LINK_STYLE)
                    {
                        "Unblock"
                    }
                } @else {
                    button
                        type="button"
                        hx-post=(format_endpoint(endpoints::BLOCK_KID, kid.id.as_i64()))
                        hx-confirm={ "Block " (kid.login) "? They will not be able to log in." }
                        hx-target="closest tr"
                        hx-target-error="#alert-container"
                        hx-swap="outerHTML"
                        class=(BUTTON_DELETE_STYLE)
                    {
                        "Block"
                    }
                }
            }
        }
    }
}

/// Get the kid with `kid_id`, checking that `adult_id` may manage them.
///
/// # Errors
///
/// - [Error::AdultOnly] if the current user is a kid,
/// - [Error::NotFound] if there is no user with `kid_id`,
/// - [Error::Forbidden] if the user is not a kid in the adult's family.
fn get_managed_kid(adult_id: UserID, kid_id: UserID, connection: &Connection) -> Result<User, Error> {
    let adult = get_user_by_id(adult_id, connection)?;
    require_adult(&adult)?;

    let kid = get_user_by_id(kid_id, connection)?;

    let same_family = adult.family_id.is_some() && adult.family_id == kid.family_id;

    if kid.role != Role::Kid || !same_family {
        return Err(Error::Forbidden);
    }

    Ok(kid)
}

fn set_kid_blocked(
    state: KidState,
    user_id: UserID,
    kid_id: UserID,
    is_blocked: bool,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = get_managed_kid(user_id, kid_id, &connection).and_then(|kid| {
        set_user_blocked(kid.id, is_blocked, &connection)?;
        get_user_by_id(kid.id, &connection)
    });

    match result {
        Ok(kid) => {
            tracing::info!("User {user_id} set blocked={is_blocked} for kid {kid_id}");
            kid_row(&kid).into_response()
        }
        Err(error) => {
            tracing::warn!("User {user_id} could not change blocked status of {kid_id}: {error}");
            error.into_alert_response()
        }
    }
}

/// Block a kid in the adult's family so they can no longer log in.
pub async fn block_kid_endpoint(
    Path(kid_id): Path<i64>,
    State(state): State<KidState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    set_kid_blocked(state, user_id, UserID::new(kid_id), true)
}

/// Unblock a kid in the adult's family.
pub async fn unblock_kid_endpoint(
    Path(kid_id): Path<i64>,
    State(state): State<KidState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    set_kid_blocked(state, user_id, UserID::new(kid_id), false)
}


#[cfg(test)]
mod block_kid_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };

    use crate::{
        test_utils::{
            create_test_family, create_test_kid, create_test_user, get_test_connection,
            parse_table_rows, select_text,
        },
        user::{User, get_user_by_id, set_user_family},
    };

    use super::{KidState, block_kid_endpoint, unblock_kid_endpoint};

    struct Fixture {
        state: KidState,
        parent: User,
        kid: User,
    }

    fn setup() -> Fixture {
        let conn = get_test_connection();
        let alice = create_test_user("alice", &conn);
        let (_, alice) = create_test_family("Smith", &alice, &conn);
        let kid = create_test_kid("timmy", &alice, &conn);

        Fixture {
            state: KidState {
                db_connection: Arc::new(Mutex::new(conn)),
            },
            parent: alice,
            kid,
        }
    }

    #[tokio::test]
    async fn parent_blocks_and_unblocks_kid() {
        let Fixture { state, parent, kid } = setup();

        let response = block_kid_endpoint(
            Path(kid.id.as_i64()),
            State(state.clone()),
            Extension(parent.id),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_table_rows(response).await;
        assert_eq!(select_text(&html, "td[data-kid-status]"), ["Blocked"]);
        assert!(
            get_user_by_id(kid.id, &state.db_connection.lock().unwrap())
                .unwrap()
                .is_blocked
        );

        let response = unblock_kid_endpoint(
            Path(kid.id.as_i64()),
            State(state.clone()),
            Extension(parent.id),
        )
        .await;

        let html = parse_table_rows(response).await;
        assert_eq!(select_text(&html, "td[data-kid-status]"), ["Active"]);
        assert!(
            !get_user_by_id(kid.id, &state.db_connection.lock().unwrap())
                .unwrap()
                .is_blocked
        );
    }

    #[tokio::test]
    async fn other_adult_in_family_can_block_kid() {
        let Fixture { state, parent, kid } = setup();
        let bob = {
            let connection = state.db_connection.lock().unwrap();
            let bob = create_test_user("bob", &connection);
            set_user_family(bob.id, parent.family_id, &connection).unwrap();
            bob
        };

        let response =
            block_kid_endpoint(Path(kid.id.as_i64()), State(state), Extension(bob.id)).await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn adult_outside_family_cannot_block_kid() {
        let Fixture { state, kid, .. } = setup();
        let eve = create_test_user("eve", &state.db_connection.lock().unwrap());

        let response =
            block_kid_endpoint(Path(kid.id.as_i64()), State(state.clone()), Extension(eve.id))
                .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(
            !get_user_by_id(kid.id, &state.db_connection.lock().unwrap())
                .unwrap()
                .is_blocked
        );
    }

    #[tokio::test]
    async fn adults_cannot_be_blocked() {
        let Fixture { state, parent, .. } = setup();

        let response =
            block_kid_endpoint(Path(parent.id.as_i64()), State(state), Extension(parent.id)).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn kids_cannot_block() {
        let Fixture { state, kid, .. } = setup();

        let response =
            block_kid_endpoint(Path(kid.id.as_i64()), State(state), Extension(kid.id)).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unknown_kid_is_not_found() {
        let Fixture { state, parent, .. } = setup();

        let response = block_kid_endpoint(Path(999), State(state), Extension(parent.id)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
