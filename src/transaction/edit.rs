//! The page and endpoint for editing a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    category::{Category, get_visible_categories},
    endpoints::{self, format_endpoint},
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, loading_spinner},
    navigation::NavBar,
    transaction::{
        Transaction, TransactionId, get_owned_transaction, update_transaction,
        form::{
            TransactionForm, TransactionFormDefaults, local_today, transaction_form_fields,
            validate_transaction_form,
        },
    },
    user::{UserID, get_user_by_id},
};

/// The state needed for the edit transaction page and endpoint.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The local timezone as a canonical timezone name, e.g. "Europe/Warsaw".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for editing a transaction owned by the current user.
pub async fn get_edit_transaction_page(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)?;
    let transaction = get_owned_transaction(transaction_id, user_id, &connection)?;
    let categories = get_visible_categories(&user, None, &connection)?;

    Ok(edit_transaction_view(&transaction, today, &categories).into_response())
}

fn edit_transaction_view(transaction: &Transaction, today: Date, categories: &[Category]) -> Markup {
    let edit_page = format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id);
    let update_endpoint = format_endpoint(endpoints::TRANSACTION, transaction.id);
    let nav_bar = NavBar::new(&edit_page).into_html();
    let spinner = loading_spinner();
    let fields = transaction_form_fields(
        &TransactionFormDefaults {
            kind: transaction.kind,
            amount: Some(transaction.amount),
            date: transaction.date,
            description: Some(&transaction.description),
            category_id: transaction.category_id,
            max_date: today,
            autofocus_amount: false,
        },
        categories,
    );

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-put=(update_endpoint)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "Edit Transaction" }

                (fields)

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span class="inline htmx-indicator" { (spinner) }
                    "Update Transaction"
                }
            }
        }
    };

    base("Edit Transaction", &content)
}

/// A route handler for updating a transaction, redirects to the transactions view on success.
pub async fn update_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
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

    match get_owned_transaction(transaction_id, user_id, &connection) {
        Ok(_) => {}
        Err(Error::NotFound) => return Error::UpdateMissingTransaction.into_alert_response(),
        Err(error) => return error.into_alert_response(),
    }

    let builder = match validate_transaction_form(&form, &user, today, &connection) {
        Ok(builder) => builder,
        Err(error) => return error.into_alert_response(),
    };

    match update_transaction(transaction_id, builder, &connection) {
        Ok(()) => (
            HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("could not update transaction {transaction_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use axum_extra::extract::Form;
    use rusqlite::Connection;
    use time::{Duration, OffsetDateTime};

    use crate::{
        Error,
        endpoints::{self, format_endpoint},
        test_utils::{
            assert_form_input_with_value, assert_form_submit_button_with_text,
            assert_hx_endpoint, assert_hx_redirect, assert_valid_html, create_test_transaction,
            create_test_user, get_test_connection, must_get_form, parse_html_document,
            past_date,
        },
        transaction::{
            TransactionKind,
            edit::{EditTransactionState, get_edit_transaction_page, update_transaction_endpoint},
            form::TransactionForm,
            get_transaction,
        },
    };

    fn get_state(conn: Connection) -> EditTransactionState {
        EditTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    fn income_form() -> TransactionForm {
        TransactionForm {
            kind: TransactionKind::Income,
            amount: 99.0,
            date: OffsetDateTime::now_utc().date(),
            description: "Refund".to_owned(),
            category_id: None,
        }
    }

    #[tokio::test]
    async fn edit_page_is_prefilled() {
        let conn = get_test_connection();
        let user = create_test_user("alice", &conn);
        let transaction =
            create_test_transaction(&user, TransactionKind::Expense, 12.5, past_date(), &conn);
        let state = get_state(conn);

        let response =
            get_edit_transaction_page(Path(transaction.id), State(state), Extension(user.id))
                .await
                .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &format_endpoint(endpoints::TRANSACTION, transaction.id),
            "hx-put",
        );
        assert_form_input_with_value(&form, "amount", "number", "12.50");
        assert_form_input_with_value(&form, "date", "date", &past_date().to_string());
        assert_form_input_with_value(&form, "description", "text", "test transaction");
        assert_form_submit_button_with_text(&form, "Update Transaction");
    }

    #[tokio::test]
    async fn edit_page_of_other_user_is_forbidden() {
        let conn = get_test_connection();
        let alice = create_test_user("alice", &conn);
        let eve = create_test_user("eve", &conn);
        let transaction =
            create_test_transaction(&alice, TransactionKind::Expense, 12.5, past_date(), &conn);
        let state = get_state(conn);

        let result =
            get_edit_transaction_page(Path(transaction.id), State(state), Extension(eve.id)).await;

        assert_eq!(result.err(), Some(Error::Forbidden));
    }

    #[tokio::test]
    async fn can_update_transaction() {
        let conn = get_test_connection();
        let user = create_test_user("alice", &conn);
        let transaction =
            create_test_transaction(&user, TransactionKind::Expense, 12.5, past_date(), &conn);
        let state = get_state(conn);

        let response = update_transaction_endpoint(
            Path(transaction.id),
            State(state.clone()),
            Extension(user.id),
            Form(income_form()),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::TRANSACTIONS_VIEW);
        let connection = state.db_connection.lock().unwrap();
        let got = get_transaction(transaction.id, &connection).unwrap();
        assert_eq!(got.kind, TransactionKind::Income);
        assert_eq!(got.amount, 99.0);
        assert_eq!(got.description, "Refund");
    }

    #[tokio::test]
    async fn update_of_other_user_is_forbidden() {
        let conn = get_test_connection();
        let alice = create_test_user("alice", &conn);
        let eve = create_test_user("eve", &conn);
        let transaction =
            create_test_transaction(&alice, TransactionKind::Expense, 12.5, past_date(), &conn);
        let state = get_state(conn);

        let response = update_transaction_endpoint(
            Path(transaction.id),
            State(state.clone()),
            Extension(eve.id),
            Form(income_form()),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_transaction(transaction.id, &connection).unwrap(), transaction);
    }

    #[tokio::test]
    async fn update_missing_transaction_is_not_found() {
        let conn = get_test_connection();
        let user = create_test_user("alice", &conn);
        let state = get_state(conn);

        let response = update_transaction_endpoint(
            Path(42),
            State(state),
            Extension(user.id),
            Form(income_form()),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_rejects_future_date() {
        let conn = get_test_connection();
        let user = create_test_user("alice", &conn);
        let transaction =
            create_test_transaction(&user, TransactionKind::Expense, 12.5, past_date(), &conn);
        let state = get_state(conn);
        let mut form = income_form();
        form.date = OffsetDateTime::now_utc().date() + Duration::days(2);

        let response = update_transaction_endpoint(
            Path(transaction.id),
            State(state),
            Extension(user.id),
            Form(form),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
