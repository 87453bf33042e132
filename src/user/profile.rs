//! The profile page: account details, the family and the user's kids.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    family::{
        Family, JoinRequestRow, get_created_family, get_family, get_join_request_rows,
        join_requests_table,
    },
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, link,
    },
    navigation::NavBar,
    user::{User, UserID, get_family_members, get_kids_of, get_user_by_id, kid::kid_row},
};

/// The state needed for the profile page.
#[derive(Debug, Clone)]
pub struct ProfileState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

struct FamilyDetails {
    family: Family,
    members: Vec<User>,
    /// Only set when the user created the family.
    join_requests: Option<Vec<JoinRequestRow>>,
}

/// Render the profile page of the current user.
pub async fn get_profile_page(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)?;

    let family = match user.family_id {
        Some(family_id) => {
            let family = get_family(family_id, &connection)?;
            let members = get_family_members(family.id, &connection)?;
            let join_requests = match get_created_family(&user, &connection) {
                Ok(family) => Some(get_join_request_rows(&family, &connection)?),
                Err(Error::NotFamilyCreator) => None,
                Err(error) => return Err(error),
            };

            Some(FamilyDetails {
                family,
                members,
                join_requests,
            })
        }
        None => None,
    };

    let kids = if user.is_adult() {
        get_kids_of(user.id, &connection)?
    } else {
        Vec::new()
    };

    Ok(profile_view(&user, family.as_ref(), &kids).into_response())
}

fn profile_view(user: &User, family: Option<&FamilyDetails>, kids: &[User]) -> Markup {
    let nav_bar = NavBar::new(endpoints::PROFILE_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-8 w-full lg:max-w-5xl lg:mx-auto"
            {
                (account_section(user))
                (family_section(user, family))

                @if user.is_adult() && family.is_some() {
                    (kids_section(kids))
                }

                @if let Some(join_requests) = family.and_then(|details| details.join_requests.as_ref()) {
                    div class="space-y-4"
                    {
                        h2 class="text-lg font-semibold" { "Requests to Join" }
                        (join_requests_table(join_requests))
                    }
                }
            }
        }
    };

    base("Profile", &content)
}

fn account_section(user: &User) -> Markup {
    html! {
        div class="space-y-4"
        {
            h1 class="text-xl font-bold" { "Profile" }

            dl id="account-details" class="grid grid-cols-[max-content_1fr] gap-x-6 gap-y-2"
            {
                dt class="font-medium" { "Name" }
                dd data-field="name" { (user.full_name()) }
                dt class="font-medium" { "Login" }
                dd data-field="login" { (user.login) }
                dt class="font-medium" { "Email" }
                dd data-field="email" { (user.email) }
                dt class="font-medium" { "Role" }
                dd data-field="role" { (user.role) }
                dt class="font-medium" { "Member since" }
                dd data-field="date-joined" { (user.date_joined.date()) }
            }

            div class="flex flex-wrap gap-4"
            {
                (link(endpoints::EDIT_PROFILE_VIEW, "Edit profile"))
                (link(endpoints::CHANGE_PASSWORD_VIEW, "Change password"))
                (link(endpoints::DELETE_ACCOUNT_VIEW, "Delete account"))
            }
        }
    }
}

fn family_section(user: &User, family: Option<&FamilyDetails>) -> Markup {
    html! {
        div class="space-y-4"
        {
            @match family {
                Some(details) => {
                    h2 class="text-lg font-semibold"
                    {
                        "Family: " span data-field="family" { (details.family.name) }
                    }

                    table id="family-members" class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Login" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Role" }
                            }
                        }

                        tbody
                        {
                            @for member in &details.members {
                                tr class=(TABLE_ROW_STYLE) data-member-id=(member.id)
                                {
                                    td class=(TABLE_CELL_STYLE) { (member.full_name()) }
                                    td class=(TABLE_CELL_STYLE) { (member.login) }
                                    td class=(TABLE_CELL_STYLE) { (member.role) }
                                }
                            }
                        }
                    }

                    @if user.is_adult() {
                        div class="flex flex-wrap gap-4"
                        {
                            (link(endpoints::INVITATIONS_VIEW, "Invite someone"))
                            (link(endpoints::NEW_KID_VIEW, "Add a kid"))
                        }
                    }
                }
                None => {
                    h2 class="text-lg font-semibold" { "Family" }

                    p id="no-family"
                    {
                        "You do not belong to a family yet. "

                        @if user.is_adult() {
                            a href=(endpoints::NEW_FAMILY_VIEW) class=(LINK_STYLE) { "Create a family" }
                            " or "
                        }

                        a href=(endpoints::JOIN_FAMILY_VIEW) class=(LINK_STYLE) { "join one" }
                        "."
                    }
                }
            }
        }
    }
}

fn kids_section(kids: &[User]) -> Markup {
    html! {
        div class="space-y-4"
        {
            h2 class="text-lg font-semibold" { "Your Kids" }

            table id="kids" class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Login" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                    }
                }

                tbody
                {
                    @for kid in kids {
                        (kid_row(kid))
                    }

                    @if kids.is_empty() {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td colspan="4" class=(TABLE_CELL_STYLE) data-empty-state
                            {
                                "You have not added any kids."
                            }
                        }
                    }
                }
            }
        }
    }
}
