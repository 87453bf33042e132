//! The transaction list pages: all transactions, expenses and incomes.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    category::get_visible_categories,
    transaction::{
        query::{SortOrder, Summary, TransactionFilter, parse_filter_date, query_transactions},
        view::{TransactionList, TransactionsView, transactions_view},
    },
    user::{User, UserID, get_user_by_id, visible_user_ids},
};

/// The state needed for the transaction list pages.
#[derive(Debug, Clone)]
pub struct TransactionsViewState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionsViewState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The filters in the query string of a transaction list page.
///
/// Every field is kept as text so that a bad value is ignored instead of
/// rejecting the whole request.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionsQuery {
    pub kind: Option<String>,
    pub category_id: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub member: Option<String>,
    pub sort: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Turn the query string into a filter over `visible_ids`.
///
/// Returns the filter and the selected member. A member that is not in
/// `visible_ids` is ignored.
fn build_filter(
    query: &TransactionsQuery,
    list: TransactionList,
    visible_ids: Vec<UserID>,
) -> (TransactionFilter, Option<UserID>) {
    let member = non_empty(&query.member)
        .and_then(|raw| raw.parse::<i64>().ok())
        .map(UserID::new)
        .filter(|member| visible_ids.contains(member));

    let user_ids = match member {
        Some(member) => vec![member],
        None => visible_ids,
    };

    let kind = list
        .fixed_kind()
        .or_else(|| non_empty(&query.kind).and_then(|raw| raw.parse().ok()));

    let filter = TransactionFilter {
        user_ids,
        kind,
        category_id: non_empty(&query.category_id).and_then(|raw| raw.parse().ok()),
        date_from: non_empty(&query.date_from).and_then(parse_filter_date),
        date_to: non_empty(&query.date_to).and_then(parse_filter_date),
        sort: non_empty(&query.sort)
            .and_then(SortOrder::parse)
            .unwrap_or_default(),
    };

    (filter, member)
}

/// Render the list of every transaction the user can see.
pub async fn get_transactions_page(
    State(state): State<TransactionsViewState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Response, Error> {
    render_transaction_list(state, user_id, query, TransactionList::All)
}

/// Render the list of expenses the user can see.
pub async fn get_expenses_page(
    State(state): State<TransactionsViewState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Response, Error> {
    render_transaction_list(state, user_id, query, TransactionList::Expenses)
}

/// Render the list of incomes the user can see.
pub async fn get_incomes_page(
    State(state): State<TransactionsViewState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Response, Error> {
    render_transaction_list(state, user_id, query, TransactionList::Incomes)
}

fn render_transaction_list(
    state: TransactionsViewState,
    user_id: UserID,
    query: TransactionsQuery,
    list: TransactionList,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)?;
    let visible_ids = visible_user_ids(&user, &connection)?;
    let members = visible_ids
        .iter()
        .map(|id| get_user_by_id(*id, &connection))
        .collect::<Result<Vec<User>, Error>>()?;

    let (filter, member) = build_filter(&query, list, visible_ids);
    let rows = query_transactions(&filter, &connection)
        .inspect_err(|error| tracing::error!("Could not query transactions: {error}"))?;
    let summary = Summary::from_transactions(rows.iter().map(|row| &row.transaction));
    let categories = get_visible_categories(&user, None, &connection)?;

    Ok(transactions_view(&TransactionsView {
        list,
        rows: &rows,
        summary,
        filter: &filter,
        member,
        categories: &categories,
        members: &members,
        current_user: user_id,
    })
    .into_response())
}
