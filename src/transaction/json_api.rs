//! JSON reports of the transactions a user can see.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::Date;

use crate::{
    AppState, Error,
    transaction::{
        TransactionKind, TransactionId,
        query::{SortOrder, Summary, TransactionFilter, TransactionRow, parse_iso_date, query_transactions},
    },
    user::{UserID, get_user_by_id, visible_user_ids},
};

/// The state needed for the JSON reports.
#[derive(Debug, Clone)]
pub struct ReportState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query string of the report endpoints.
///
/// Fields are kept as text so that missing and malformed values can be
/// reported with a JSON error.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub kind: Option<String>,
}

/// A transaction as it appears in a report.
#[derive(Debug, Serialize, PartialEq)]
pub struct ReportItem {
    pub id: TransactionId,
    /// The date in the `YYYY-MM-DD` format.
    pub date: String,
    pub income: Option<f64>,
    pub expense: Option<f64>,
    pub description: String,
    /// The name of the category, if any.
    pub category: Option<String>,
    pub user_id: UserID,
}

impl From<TransactionRow> for ReportItem {
    fn from(row: TransactionRow) -> Self {
        let TransactionRow {
            transaction,
            category_name,
            ..
        } = row;

        Self {
            id: transaction.id,
            date: transaction.date.to_string(),
            income: transaction.income(),
            expense: transaction.expense(),
            description: transaction.description,
            category: category_name,
            user_id: transaction.user_id,
        }
    }
}

/// An error answered with a status code and `{"error": message}`.
#[derive(Debug, PartialEq)]
struct ReportError {
    status: StatusCode,
    message: String,
}

impl ReportError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<Error> for ReportError {
    fn from(error: Error) -> Self {
        tracing::error!("Could not build transaction report: {error}");

        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "an unexpected error occurred".to_owned(),
        }
    }
}

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

fn required_date(raw: &Option<String>, name: &str) -> Result<Date, ReportError> {
    let raw = raw
        .as_deref()
        .filter(|raw| !raw.trim().is_empty())
        .ok_or_else(|| {
            ReportError::bad_request(format!("the {name} parameter is required (YYYY-MM-DD)"))
        })?;

    parse_iso_date(raw).ok_or_else(|| {
        ReportError::bad_request(format!("invalid {name} \"{raw}\", use the YYYY-MM-DD format"))
    })
}

fn optional_kind(raw: &Option<String>) -> Result<Option<TransactionKind>, ReportError> {
    match raw.as_deref().map(str::trim).filter(|raw| !raw.is_empty()) {
        None => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|_| {
            ReportError::bad_request(format!(
                "invalid kind \"{raw}\", use \"income\" or \"expense\""
            ))
        }),
    }
}

fn parse_plural_kind(raw: &str) -> Result<TransactionKind, ReportError> {
    match raw {
        "expenses" => Ok(TransactionKind::Expense),
        "incomes" => Ok(TransactionKind::Income),
        other => Err(ReportError::bad_request(format!(
            "invalid kind \"{other}\", use \"expenses\" or \"incomes\""
        ))),
    }
}

fn report_items(
    state: &ReportState,
    user_id: UserID,
    kind: Option<TransactionKind>,
    date_from: Option<Date>,
    date_to: Option<Date>,
) -> Result<(Vec<ReportItem>, Summary), ReportError> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)?;
    let filter = TransactionFilter {
        kind,
        date_from,
        date_to,
        sort: SortOrder::DateAsc,
        ..TransactionFilter::for_users(visible_user_ids(&user, &connection)?)
    };
    let rows = query_transactions(&filter, &connection)?;
    let summary = Summary::from_transactions(rows.iter().map(|row| &row.transaction));

    Ok((rows.into_iter().map(ReportItem::from).collect(), summary))
}

/// `GET /api/reports/range?start_date&end_date`, both dates inclusive.
pub async fn get_range_report(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ReportQuery>,
) -> Response {
    range_report(&state, user_id, &query)
        .map(|(items, summary)| Json(json!({ "transactions": items, "summary": summary })))
        .into_response()
}

fn range_report(
    state: &ReportState,
    user_id: UserID,
    query: &ReportQuery,
) -> Result<(Vec<ReportItem>, Summary), ReportError> {
    let start_date = required_date(&query.start_date, "start_date")?;
    let end_date = required_date(&query.end_date, "end_date")?;
    let kind = optional_kind(&query.kind)?;

    report_items(state, user_id, kind, Some(start_date), Some(end_date))
}

/// `GET /api/reports/range/{kind}` where `kind` is `expenses` or `incomes`.
///
/// The transactions are listed under the key `kind`.
pub async fn get_range_report_by_kind(
    Path(kind): Path<String>,
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ReportQuery>,
) -> Response {
    let result = parse_plural_kind(&kind).and_then(|transaction_kind| {
        let start_date = required_date(&query.start_date, "start_date")?;
        let end_date = required_date(&query.end_date, "end_date")?;

        report_items(
            &state,
            user_id,
            Some(transaction_kind),
            Some(start_date),
            Some(end_date),
        )
    });

    result
        .map(|(items, summary)| {
            let mut body = json!({ "summary": summary });
            body[kind.as_str()] = json!(items);
            Json(body)
        })
        .into_response()
}

/// `GET /api/reports/since?start_date`, the start date is inclusive.
pub async fn get_since_report(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ReportQuery>,
) -> Response {
    let result = required_date(&query.start_date, "start_date").and_then(|start_date| {
        let kind = optional_kind(&query.kind)?;
        report_items(&state, user_id, kind, Some(start_date), None)
    });

    result
        .map(|(items, summary)| Json(json!({ "transactions": items, "summary": summary })))
        .into_response()
}

/// `GET /api/reports/until?end_date`, the end date is inclusive.
pub async fn get_until_report(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ReportQuery>,
) -> Response {
    let result = required_date(&query.end_date, "end_date").and_then(|end_date| {
        let kind = optional_kind(&query.kind)?;
        report_items(&state, user_id, kind, None, Some(end_date))
    });

    result
        .map(|(items, summary)| Json(json!({ "transactions": items, "summary": summary })))
        .into_response()
}
