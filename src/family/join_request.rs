//! Asking to join a family and reviewing those requests.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    alert::Alert,
    endpoints::{self, format_endpoint},
    family::{
        Family, FamilyName, JoinRequest, JoinRequestId, create_join_request, delete_join_request,
        get_family, get_family_by_name, get_join_request, get_pending_join_requests,
        join::{FormMessage, join_request_form},
        mark_join_request_accepted,
    },
    html::{
        BUTTON_DELETE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
    },
    navigation::NavBar,
    user::{User, UserID, get_user_by_id, set_user_family},
};

/// The state needed for creating and reviewing join requests.
#[derive(Debug, Clone)]
pub struct JoinRequestState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for JoinRequestState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form for asking to join a family.
#[derive(Debug, Deserialize)]
pub struct JoinRequestForm {
    pub family_name: String,
    #[serde(default)]
    pub message: String,
}

/// Ask the creator of a family to let the current user join.
///
/// Responds with the form and a message saying whether the request was sent.
pub async fn create_join_request_endpoint(
    State(state): State<JoinRequestState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<JoinRequestForm>,
) -> Response {
    let render_error = |message: &str| {
        join_request_form(
            &form.family_name,
            &form.message,
            Some(FormMessage::Error(message)),
        )
        .into_response()
    };

    let family_name = match FamilyName::new(&form.family_name) {
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

    if user.family_id.is_some() {
        return render_error(&format!("Error: {}", Error::AlreadyInFamily));
    }

    let family = match get_family_by_name(&family_name, &connection) {
        Ok(family) => family,
        Err(Error::NotFound) => {
            return render_error(&format!("Error: there is no family named \"{family_name}\""));
        }
        Err(error) => return error.into_alert_response(),
    };

    match create_join_request(user.id, family.id, form.message.trim(), &connection) {
        Ok(request) => {
            tracing::info!("User {user_id} asked to join family {} ({})", family.id, request.id);

            join_request_form(
                "",
                "",
                Some(FormMessage::Success(&format!(
                    "Your request to join the family {family_name} was sent. \
                    Wait for the family's creator to accept it."
                ))),
            )
            .into_response()
        }
        Err(error @ Error::DuplicateJoinRequest) => render_error(&format!("Error: {error}")),
        Err(error) => {
            tracing::error!("Could not create join request: {error}");
            error.into_alert_response()
        }
    }
}

/// Get the family that `user` created.
///
/// # Errors
///
/// Returns [Error::NotInFamily] if the user has no family and
/// [Error::NotFamilyCreator] if someone else created it.
pub(crate) fn get_created_family(user: &User, connection: &Connection) -> Result<Family, Error> {
    let family_id = user.family_id.ok_or(Error::NotInFamily)?;
    let family = get_family(family_id, connection)?;

    if family.created_by != Some(user.id) {
        return Err(Error::NotFamilyCreator);
    }

    Ok(family)
}

/// A pending join request and the user that sent it.
pub(crate) struct JoinRequestRow {
    pub request: JoinRequest,
    pub requester: User,
}

pub(crate) fn get_join_request_rows(
    family: &Family,
    connection: &Connection,
) -> Result<Vec<JoinRequestRow>, Error> {
    get_pending_join_requests(family.id, connection)?
        .into_iter()
        .map(|request| {
            get_user_by_id(request.user_id, connection)
                .map(|requester| JoinRequestRow { request, requester })
        })
        .collect()
}

/// The pending requests with buttons to accept or reject each one.
pub(crate) fn join_requests_table(rows: &[JoinRequestRow]) -> Markup {
    html! {
        table id="join-requests" class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "User" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Message" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Sent" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                }
            }

            tbody
            {
                @for row in rows {
                    tr class=(TABLE_ROW_STYLE) data-join-request-id=(row.request.id)
                    {
                        td class=(TABLE_CELL_STYLE)
                        {
                            (row.requester.full_name()) " (" (row.requester.login) ")"
                        }
                        td class=(TABLE_CELL_STYLE) { (row.request.message) }
                        td class=(TABLE_CELL_STYLE) { (row.request.created_at.date()) }
                        td class=(TABLE_CELL_STYLE)
                        {
                            div class="flex gap-4"
                            {
                                button
                                    type="button"
                                    hx-post=(format_endpoint(endpoints::ACCEPT_JOIN_REQUEST, row.request.id))
                                    hx-target="closest tr"
                                    hx-target-error="#alert-container"
                                    hx-swap="delete"
                                    class=(LINK_STYLE)
                                {
                                    "Accept"
                                }

                                button
                                    type="button"
                                    hx-post=(format_endpoint(endpoints::REJECT_JOIN_REQUEST, row.request.id))
                                    hx-confirm="Reject this request?"
                                    hx-target="closest tr"
                                    hx-target-error="#alert-container"
                                    hx-swap="delete"
                                    class=(BUTTON_DELETE_STYLE)
                                {
                                    "Reject"
                                }
                            }
                        }
                    }
                }

                @if rows.is_empty() {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        td colspan="4" class=(TABLE_CELL_STYLE) data-empty-state
                        {
                            "There are no pending requests."
                        }
                    }
                }
            }
        }
    }
}

/// Render the pending join requests of the family the user created.
///
/// Users without a family are sent to the join family page.
pub async fn get_join_requests_page(
    State(state): State<JoinRequestState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)?;
    let family = match get_created_family(&user, &connection) {
        Ok(family) => family,
        Err(Error::NotInFamily) => {
            return Ok(Redirect::to(endpoints::JOIN_FAMILY_VIEW).into_response());
        }
        Err(error) => return Err(error),
    };
    let rows = get_join_request_rows(&family, &connection)?;

    let nav_bar = NavBar::new(endpoints::JOIN_REQUESTS_VIEW).into_html();
    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 lg:max-w-5xl lg:w-full lg:mx-auto"
            {
                h1 class="text-xl font-bold" { "Requests to join " (family.name) }
                (join_requests_table(&rows))
            }
        }
    };

    Ok(base("Join Requests", &content).into_response())
}

/// Get a pending request sent to `family`.
fn get_pending_request_for(
    request_id: JoinRequestId,
    family: &Family,
    connection: &Connection,
) -> Result<JoinRequest, Error> {
    match get_join_request(request_id, connection) {
        Ok(request) if request.family_id == family.id && !request.accepted => Ok(request),
        Ok(_) => Err(Error::MissingJoinRequest),
        Err(error) => Err(error),
    }
}

/// Accept a join request, moving the requester into the family.
///
/// Only the creator of the family can accept requests.
pub async fn accept_join_request_endpoint(
    Path(request_id): Path<JoinRequestId>,
    State(state): State<JoinRequestState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = get_user_by_id(user_id, &connection)
        .and_then(|user| get_created_family(&user, &connection))
        .and_then(|family| {
            let request = get_pending_request_for(request_id, &family, &connection)?;
            let requester = get_user_by_id(request.user_id, &connection)?;
            Ok((family, request, requester))
        });

    let (family, request, requester) = match result {
        Ok(found) => found,
        Err(error) => return error.into_alert_response(),
    };

    if requester.family_id.is_some() {
        return (
            StatusCode::CONFLICT,
            Alert::Error {
                message: "Could not accept request".to_owned(),
                details: format!("{} already belongs to a family.", requester.login),
            },
        )
            .into_response();
    }

    let accepted = connection
        .unchecked_transaction()
        .map_err(Error::from)
        .and_then(|transaction| {
            set_user_family(requester.id, Some(family.id), &transaction)?;
            mark_join_request_accepted(request.id, &transaction)?;
            transaction.commit().map_err(Error::from)
        });

    match accepted {
        Ok(()) => {
            tracing::info!("User {user_id} accepted join request {request_id}");

            Alert::SuccessSimple {
                message: format!("{} joined your family", requester.login),
            }
            .into_response()
        }
        Err(error) => {
            tracing::error!("Could not accept join request {request_id}: {error}");
            error.into_alert_response()
        }
    }
}

/// Reject a join request by deleting it.
///
/// Only the creator of the family can reject requests.
pub async fn reject_join_request_endpoint(
    Path(request_id): Path<JoinRequestId>,
    State(state): State<JoinRequestState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = get_user_by_id(user_id, &connection)
        .and_then(|user| get_created_family(&user, &connection))
        .and_then(|family| get_pending_request_for(request_id, &family, &connection))
        .and_then(|request| delete_join_request(request.id, &connection));

    match result {
        Ok(()) => {
            tracing::info!("User {user_id} rejected join request {request_id}");

            Alert::SuccessSimple {
                message: "Request rejected".to_owned(),
            }
            .into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}
