//! The dashboard: a welcome and this month's totals for the user and their family.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error, endpoints,
    family::{Family, get_family},
    html::{
        EXPENSE_TEXT_STYLE, INCOME_TEXT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base,
        format_currency,
    },
    navigation::NavBar,
    transaction::{Summary, TransactionFilter, local_today, query_transactions},
    user::{User, UserID, get_user_by_id, visible_user_ids},
};

/// The state needed for the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The local timezone as a canonical timezone name, e.g. "Europe/Warsaw".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Redirect the index page to the dashboard.
pub async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}

/// The totals of the transactions of `user_ids` from the first of the month to `today`.
fn month_to_date_summary(
    user_ids: Vec<UserID>,
    today: Date,
    connection: &Connection,
) -> Result<Summary, Error> {
    let filter = TransactionFilter {
        date_from: Some(today.replace_day(1).unwrap_or(today)),
        date_to: Some(today),
        ..TransactionFilter::for_users(user_ids)
    };

    let rows = query_transactions(&filter, connection)?;

    Ok(Summary::from_transactions(
        rows.iter().map(|row| &row.transaction),
    ))
}

/// Display the dashboard page.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)?;
    let family = user
        .family_id
        .map(|family_id| get_family(family_id, &connection))
        .transpose()?;

    let own_summary = month_to_date_summary(vec![user.id], today, &connection)?;
    let family_summary = match (&family, user.is_adult()) {
        (Some(_), true) => Some(month_to_date_summary(
            visible_user_ids(&user, &connection)?,
            today,
            &connection,
        )?),
        _ => None,
    };

    Ok(dashboard_view(
        &user,
        family.as_ref(),
        today,
        &own_summary,
        family_summary.as_ref(),
    )
    .into_response())
}

fn summary_card(id: &str, title: &str, summary: &Summary) -> Markup {
    html! {
        div
            id=(id)
            class="bg-white dark:bg-gray-800 border border-gray-200 dark:border-gray-700
                   rounded-lg p-4 shadow-md space-y-2"
        {
            h3 class="text-lg font-semibold" { (title) }

            dl class="grid grid-cols-2 gap-y-1"
            {
                dt { "Income" }
                dd class=(INCOME_TEXT_STYLE) data-total="income" { (format_currency(summary.income)) }
                dt { "Expenses" }
                dd class=(EXPENSE_TEXT_STYLE) data-total="expense" { (format_currency(summary.expense)) }
                dt class="font-semibold" { "Balance" }
                dd class="font-semibold" data-total="balance" { (format_currency(summary.balance)) }
            }
        }
    }
}

fn dashboard_view(
    user: &User,
    family: Option<&Family>,
    today: Date,
    own_summary: &Summary,
    family_summary: Option<&Summary>,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();
    let month = format!("{} {}", today.month(), today.year());

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6 w-full lg:max-w-5xl lg:mx-auto"
            {
                div
                {
                    h1 class="text-2xl font-bold" { "Welcome, " (user.name) "!" }
                    p class="text-gray-600 dark:text-gray-400" id="welcome-details"
                    {
                        (user.role)
                        @if let Some(family) = family {
                            " in the " (family.name) " family"
                        }
                    }
                }

                h2 class="text-xl font-semibold" { (month) }

                div class="grid grid-cols-1 md:grid-cols-2 gap-4"
                {
                    (summary_card("own-summary", "Your transactions", own_summary))

                    @if let Some(family_summary) = family_summary {
                        (summary_card("family-summary", "Family transactions", family_summary))
                    }
                }

                div id="quick-links" class="flex flex-wrap gap-4"
                {
                    a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE) { "Add a transaction" }
                    a href=(endpoints::TRANSACTIONS_VIEW) class=(LINK_STYLE) { "See transactions" }
                    a href=(endpoints::CATEGORIES_VIEW) class=(LINK_STYLE) { "Categories" }

                    @if family.is_none() {
                        a href=(endpoints::JOIN_FAMILY_VIEW) class=(LINK_STYLE) { "Join a family" }
                    }
                }
            }
        }
    };

    base("Dashboard", &content)
}
