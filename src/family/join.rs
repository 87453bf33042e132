//! Joining a family with an access code, and the page with the join forms.

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
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    endpoints,
    family::{
        AccessCode, Family, FamilyInvitation, FamilyName, get_family, get_invitation_by_code,
        mark_invitation_accepted,
    },
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, base, text_input,
    },
    navigation::NavBar,
    user::{User, UserID, get_user_by_id, set_user_family},
};

/// Get the invitation for `access_code` if it can still be used.
///
/// # Errors
///
/// Returns [Error::InvalidAccessCode] if no invitation uses the code and
/// [Error::ExpiredAccessCode] if it has expired or was already accepted.
pub(crate) fn get_usable_invitation(
    access_code: &AccessCode,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<FamilyInvitation, Error> {
    let invitation = match get_invitation_by_code(access_code, connection) {
        Ok(invitation) => invitation,
        Err(Error::NotFound) => return Err(Error::InvalidAccessCode),
        Err(error) => return Err(error),
    };

    if !invitation.is_valid(now) {
        return Err(Error::ExpiredAccessCode);
    }

    Ok(invitation)
}

/// Get the family of `invitation`, checking that its name is `family_name`.
pub(crate) fn get_invitation_family(
    invitation: &FamilyInvitation,
    family_name: &FamilyName,
    connection: &Connection,
) -> Result<Family, Error> {
    let family = get_family(invitation.family_id, connection)?;

    if family.name != *family_name {
        return Err(Error::FamilyNameMismatch);
    }

    Ok(family)
}

/// Move `user` into the family of the invitation with `access_code`.
///
/// The invitation is marked as accepted so the code cannot be used again.
///
/// # Errors
///
/// - [Error::InvalidAccessCode] if no invitation uses the code,
/// - [Error::ExpiredAccessCode] if the invitation expired or was used,
/// - [Error::AlreadyInFamily] if the user already belongs to a family,
/// - [Error::FamilyNameMismatch] if the invitation is for another family.
pub fn join_family_with_code(
    user: &User,
    family_name: &FamilyName,
    access_code: &AccessCode,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Family, Error> {
    let invitation = get_usable_invitation(access_code, now, connection)?;

    if user.family_id.is_some() {
        return Err(Error::AlreadyInFamily);
    }

    let family = get_invitation_family(&invitation, family_name, connection)?;

    let transaction = connection.unchecked_transaction()?;
    set_user_family(user.id, Some(family.id), &transaction)?;
    mark_invitation_accepted(invitation.id, &transaction)?;
    transaction.commit()?;

    Ok(family)
}

/// The state needed for the join family page and endpoint.
#[derive(Debug, Clone)]
pub struct JoinFamilyState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for JoinFamilyState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form for joining a family with an access code.
#[derive(Debug, Deserialize)]
pub struct JoinFamilyForm {
    pub family_name: String,
    pub access_code: String,
}

/// Render the page with the forms for joining a family with a code and for
/// asking to join a family.
pub async fn get_join_family_page(
    State(state): State<JoinFamilyState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)?;
    let current_family = match user.family_id {
        Some(family_id) => Some(get_family(family_id, &connection)?),
        None => None,
    };

    Ok(join_family_view(current_family.as_ref()).into_response())
}

fn join_family_view(current_family: Option<&Family>) -> Markup {
    let nav_bar = NavBar::new(endpoints::JOIN_FAMILY_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            div class="w-full space-y-8"
            {
                @if let Some(family) = current_family {
                    div id="current-family" class="text-sm"
                    {
                        "You already belong to the family " strong { (family.name) } "."
                    }
                }

                section class="space-y-4"
                {
                    h2 class="text-xl font-bold" { "Join with an access code" }
                    (join_family_form("", "", None))
                }

                section class="space-y-4"
                {
                    h2 class="text-xl font-bold" { "Ask to join a family" }
                    (join_request_form("", "", None))
                }
            }
        }
    };

    base("Join a Family", &content)
}

/// A message shown under a form.
pub(crate) enum FormMessage<'a> {
    Error(&'a str),
    Success(&'a str),
}

impl FormMessage<'_> {
    pub(crate) fn into_html(self) -> Markup {
        match self {
            FormMessage::Error(message) => html!( p class=(FORM_ERROR_STYLE) { (message) } ),
            FormMessage::Success(message) => {
                html!( p class="text-green-700 dark:text-green-400" { (message) } )
            }
        }
    }
}

fn join_family_form(family_name: &str, access_code: &str, message: Option<FormMessage>) -> Markup {
    html! {
        form
            id="join-family-form"
            hx-post=(endpoints::JOIN_FAMILY_API)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            (text_input("family_name", "Family Name", "text", family_name, true))

            div
            {
                label for="access_code" class=(FORM_LABEL_STYLE) { "Access Code" }

                input
                    type="text"
                    name="access_code"
                    id="access_code"
                    value=(access_code)
                    maxlength="16"
                    autocomplete="off"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            @if let Some(message) = message {
                (message.into_html())
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Join Family" }
        }
    }
}

/// The form for asking the creator of a family to let the user in.
pub(crate) fn join_request_form(
    family_name: &str,
    message_text: &str,
    message: Option<FormMessage>,
) -> Markup {
    html! {
        form
            id="join-request-form"
            hx-post=(endpoints::JOIN_REQUESTS_API)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            (text_input("family_name", "Family Name", "text", family_name, true))

            div
            {
                label for="message" class=(FORM_LABEL_STYLE) { "Message (optional)" }

                textarea
                    name="message"
                    id="message"
                    rows="3"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    (message_text)
                }
            }

            @if let Some(message) = message {
                (message.into_html())
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Send Request" }
        }
    }
}

/// Join a family with an access code, redirects to the profile page on success.
pub async fn join_family_endpoint(
    State(state): State<JoinFamilyState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<JoinFamilyForm>,
) -> Response {
    let render_error = |message: &str| {
        join_family_form(
            &form.family_name,
            &form.access_code,
            Some(FormMessage::Error(message)),
        )
        .into_response()
    };

    let family_name = match FamilyName::new(&form.family_name) {
        Ok(name) => name,
        Err(error) => return render_error(&format!("Error: {error}")),
    };
    let access_code = match AccessCode::new(&form.access_code) {
        Ok(code) => code,
        Err(error) => return render_error(&format!("Error: {error}")),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let user = match get_user_by_id(user_id, &connection) {
        Ok(user) => user,
        Err(error) => return error.into_alert_response(),
    };

    match join_family_with_code(
        &user,
        &family_name,
        &access_code,
        OffsetDateTime::now_utc(),
        &connection,
    ) {
        Ok(family) => {
            tracing::info!("User {user_id} joined family {} with an access code", family.id);

            (
                HxRedirect(endpoints::PROFILE_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(
            error @ (Error::InvalidAccessCode
            | Error::ExpiredAccessCode
            | Error::AlreadyInFamily
            | Error::FamilyNameMismatch),
        ) => render_error(&format!("Error: {error}")),
        Err(error) => {
            tracing::error!("Could not join family: {error}");
            error.into_alert_response()
        }
    }
}
