//! Inviting people to a family with an access code.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error, endpoints,
    family::{
        Family, FamilyInvitation, create_invitation, get_family, get_family_invitations,
        join::FormMessage,
    },
    html::{
        BUTTON_PRIMARY_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, text_input,
    },
    navigation::NavBar,
    user::{Email, UserID, get_user_by_id, require_adult},
};

/// The state needed for the invitations page and endpoint.
#[derive(Debug, Clone)]
pub struct InvitationState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for InvitationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InvitationForm {
    pub email: String,
}

/// Render the form for inviting someone and the family's past invitations.
///
/// Adults without a family are sent to the create family page.
pub async fn get_invitations_page(
    State(state): State<InvitationState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)?;
    require_adult(&user)?;

    let Some(family_id) = user.family_id else {
        return Ok(Redirect::to(endpoints::NEW_FAMILY_VIEW).into_response());
    };
    let family = get_family(family_id, &connection)?;
    let invitations = get_family_invitations(family.id, &connection)?;

    Ok(invitations_view(&family, &invitations, OffsetDateTime::now_utc()).into_response())
}

fn invitation_status(invitation: &FamilyInvitation, now: OffsetDateTime) -> &'static str {
    if invitation.accepted {
        "Accepted"
    } else if invitation.is_valid(now) {
        "Active"
    } else {
        "Expired"
    }
}

fn invitations_view(family: &Family, invitations: &[FamilyInvitation], now: OffsetDateTime) -> Markup {
    let nav_bar = NavBar::new(endpoints::INVITATIONS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-8 w-full lg:max-w-5xl lg:mx-auto"
            {
                div class="max-w-md space-y-4"
                {
                    h1 class="text-xl font-bold" { "Invite someone to " (family.name) }
                    (invitation_form("", None))
                }

                table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Email" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Access Code" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Expires" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                        }
                    }

                    tbody
                    {
                        @for invitation in invitations {
                            tr class=(TABLE_ROW_STYLE) data-invitation-id=(invitation.id)
                            {
                                td class=(TABLE_CELL_STYLE) { (invitation.email) }
                                td class=(TABLE_CELL_STYLE) { code { (invitation.access_code) } }
                                td class=(TABLE_CELL_STYLE) { (invitation.expires_at.date()) }
                                td class=(TABLE_CELL_STYLE) data-status
                                {
                                    (invitation_status(invitation, now))
                                }
                            }
                        }

                        @if invitations.is_empty() {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td colspan="4" class=(TABLE_CELL_STYLE) data-empty-state
                                {
                                    "No one has been invited yet."
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Invitations", &content)
}

fn invitation_form(email: &str, message: Option<FormMessage>) -> Markup {
    html! {
        form
            hx-post=(endpoints::INVITATIONS_API)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            (text_input("email", "Email", "email", email, true))

            @if let Some(message) = message {
                (message.into_html())
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Invitation" }
        }
    }
}

/// Create an invitation and show its access code.
///
/// Invitations are not e-mailed, the inviter shares the code and the family
/// name with the person they invited.
pub async fn create_invitation_endpoint(
    State(state): State<InvitationState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<InvitationForm>,
) -> Response {
    let render_error = |message: &str| {
        invitation_form(&form.email, Some(FormMessage::Error(message))).into_response()
    };

    let email = match Email::new(&form.email) {
        Ok(email) => email,
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

    if let Err(error) = require_adult(&user) {
        return error.into_alert_response();
    }

    let Some(family_id) = user.family_id else {
        return render_error(&format!("Error: {}", Error::NotInFamily));
    };

    let result = get_family(family_id, &connection).and_then(|family| {
        create_invitation(
            family.id,
            email.as_ref(),
            user.id,
            OffsetDateTime::now_utc(),
            &connection,
        )
        .map(|invitation| (family, invitation))
    });

    match result {
        Ok((family, invitation)) => {
            tracing::info!("User {user_id} created invitation {}", invitation.id);

            invitation_form(
                "",
                Some(FormMessage::Success(&format!(
                    "Share the family name {} and the access code {} with {}. \
                    The code can be used once before {}.",
                    family.name,
                    invitation.access_code,
                    invitation.email,
                    invitation.expires_at.date()
                ))),
            )
            .into_response()
        }
        Err(error) => {
            tracing::error!("Could not create invitation: {error}");
            error.into_alert_response()
        }
    }
}
