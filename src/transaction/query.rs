//! Filtering, sorting and totals for lists of transactions.

use rusqlite::{Connection, ToSql, params_from_iter};
use serde::{Deserialize, Serialize};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    category::CategoryId,
    transaction::{Transaction, TransactionKind, core::map_transaction_row},
    user::UserID,
};

const ISO_DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");
const US_DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[month]/[day]/[year]");

/// Parse a date in the `YYYY-MM-DD` format.
pub fn parse_iso_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), ISO_DATE_FORMAT).ok()
}

/// Parse a date filter, accepting `YYYY-MM-DD` or `MM/DD/YYYY`.
///
/// Returns `None` for anything else so that invalid filters are ignored.
pub fn parse_filter_date(raw: &str) -> Option<Date> {
    let raw = raw.trim();

    parse_iso_date(raw).or_else(|| Date::parse(raw, US_DATE_FORMAT).ok())
}

/// The order to sort transactions in a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Newest first.
    #[default]
    DateDesc,
    /// Oldest first.
    DateAsc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::DateDesc => "date_desc",
            SortOrder::DateAsc => "date_asc",
        }
    }

    /// Parse a sort order from a query string, `None` if it is not recognised.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "date_desc" => Some(SortOrder::DateDesc),
            "date_asc" => Some(SortOrder::DateAsc),
            _ => None,
        }
    }
}

/// Which transactions to fetch.
///
/// Only transactions owned by `user_ids` are returned, so an empty list of
/// users gives no transactions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub user_ids: Vec<UserID>,
    pub kind: Option<TransactionKind>,
    pub category_id: Option<CategoryId>,
    /// Inclusive lower bound.
    pub date_from: Option<Date>,
    /// Inclusive upper bound.
    pub date_to: Option<Date>,
    pub sort: SortOrder,
}

impl TransactionFilter {
    /// A filter for every transaction owned by `user_ids`, newest first.
    pub fn for_users(user_ids: Vec<UserID>) -> Self {
        Self {
            user_ids,
            ..Default::default()
        }
    }
}

/// A transaction with the names needed to display it.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRow {
    pub transaction: Transaction,
    pub category_name: Option<String>,
    /// The login of the user who recorded the transaction.
    pub owner_login: String,
}

/// Get the transactions matching `filter` with their category and owner.
///
/// Transactions on the same date are ordered by ID in the same direction as
/// the dates, which keeps the order stable after updates.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn query_transactions(
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<TransactionRow>, Error> {
    if filter.user_ids.is_empty() {
        return Ok(Vec::new());
    }

    let owner_ids: Vec<i64> = filter.user_ids.iter().map(UserID::as_i64).collect();
    let placeholders = std::iter::repeat_n("?", owner_ids.len())
        .collect::<Vec<_>>()
        .join(", ");

    let mut clauses = vec![format!("t.user_id IN ({placeholders})")];
    let mut params: Vec<&dyn ToSql> = Vec::with_capacity(owner_ids.len() + 3);
    for owner_id in &owner_ids {
        params.push(owner_id);
    }

    match filter.kind {
        Some(TransactionKind::Income) => clauses.push("t.income IS NOT NULL".to_owned()),
        Some(TransactionKind::Expense) => clauses.push("t.expense IS NOT NULL".to_owned()),
        None => {}
    }
    if let Some(category_id) = &filter.category_id {
        clauses.push("t.category_id = ?".to_owned());
        params.push(category_id);
    }
    if let Some(date_from) = &filter.date_from {
        clauses.push("t.date >= ?".to_owned());
        params.push(date_from);
    }
    if let Some(date_to) = &filter.date_to {
        clauses.push("t.date <= ?".to_owned());
        params.push(date_to);
    }

    let order_clause = match filter.sort {
        SortOrder::DateDesc => "ORDER BY t.date DESC, t.id DESC",
        SortOrder::DateAsc => "ORDER BY t.date ASC, t.id ASC",
    };

    let query = format!(
        "SELECT t.id, t.user_id, t.date, t.income, t.expense, t.description, t.category_id,
            category.name, user.login
        FROM \"transaction\" t
        LEFT JOIN category ON t.category_id = category.id
        INNER JOIN user ON t.user_id = user.id
        WHERE {}
        {order_clause}",
        clauses.join(" AND ")
    );

    connection
        .prepare(&query)?
        .query_map(params_from_iter(params), |row| {
            Ok(TransactionRow {
                transaction: map_transaction_row(row)?,
                category_name: row.get(7)?,
                owner_login: row.get(8)?,
            })
        })?
        .map(|maybe_row| maybe_row.map_err(|error| error.into()))
        .collect()
}

/// The totals of a list of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    pub income: f64,
    pub expense: f64,
    /// Income minus expense.
    pub balance: f64,
}

impl Summary {
    pub fn from_transactions<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Self {
        let (income, expense) =
            transactions
                .into_iter()
                .fold((0.0, 0.0), |(income, expense), transaction| {
                    match transaction.kind {
                        TransactionKind::Income => (income + transaction.amount, expense),
                        TransactionKind::Expense => (income, expense + transaction.amount),
                    }
                });

        Self {
            income,
            expense,
            balance: income - expense,
        }
    }
}
