//! The page and endpoint for creating a family.

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
    family::{FamilyName, create_family, join::FormMessage},
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, text_input},
    navigation::NavBar,
    user::{UserID, get_user_by_id, require_adult},
};

/// The state needed for creating a family.
#[derive(Debug, Clone)]
pub struct CreateFamilyState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateFamilyState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FamilyForm {
    pub name: String,
}

/// Render the page for creating a family, adults only.
pub async fn get_new_family_page(
    State(state): State<CreateFamilyState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)?;
    require_adult(&user)?;

    let nav_bar = NavBar::new(endpoints::NEW_FAMILY_VIEW).into_html();
    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h2 class="text-xl font-bold mb-4" { "Create a Family" }
            (family_form("", None))
        }
    };

    Ok(base("Create Family", &content).into_response())
}

fn family_form(name: &str, message: Option<FormMessage>) -> Markup {
    html! {
        form
            hx-post=(endpoints::FAMILIES_API)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            (text_input("name", "Family Name", "text", name, true))

            @if let Some(message) = message {
                (message.into_html())
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Family" }
        }
    }
}

/// Create a family with the current user as its creator and first member.
pub async fn create_family_endpoint(
    State(state): State<CreateFamilyState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<FamilyForm>,
) -> Response {
    let render_error =
        |message: &str| family_form(&form.name, Some(FormMessage::Error(message))).into_response();

    let name = match FamilyName::new(&form.name) {
        Ok(name) => name,
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

    if user.family_id.is_some() {
        return render_error(&format!("Error: {}", Error::AlreadyInFamily));
    }

    match create_family(name, user.id, &connection) {
        Ok(family) => {
            tracing::info!("User {user_id} created family {}", family.id);

            (
                HxRedirect(endpoints::PROFILE_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error @ Error::DuplicateFamilyName(_)) => render_error(&format!("Error: {error}")),
        Err(error) => {
            tracing::error!("Could not create family: {error}");
            error.into_alert_response()
        }
    }
}
