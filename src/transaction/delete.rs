//! Transaction deletion endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    transaction::{TransactionId, delete_transaction, get_owned_transaction},
    user::UserID,
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a transaction, responds with an alert.
///
/// The status code is 200 OK on success so that HTMX removes the table row.
pub async fn delete_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<DeleteTransactionState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = get_owned_transaction(transaction_id, user_id, &connection)
        .and_then(|transaction| delete_transaction(transaction.id, &connection));

    match result {
        Ok(()) => {
            tracing::info!("User {user_id} deleted transaction {transaction_id}");

            Alert::SuccessSimple {
                message: "Transaction deleted successfully".to_owned(),
            }
            .into_response()
        }
        Err(Error::NotFound | Error::DeleteMissingTransaction) => {
            Error::DeleteMissingTransaction.into_alert_response()
        }
        Err(Error::Forbidden) => Error::Forbidden.into_alert_response(),
        Err(error) => {
            tracing::error!("Could not delete transaction {transaction_id}: {error}");
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
    };

    use crate::{
        Error,
        test_utils::{
            assert_valid_html, create_test_family, create_test_transaction, create_test_user,
            get_test_connection, parse_html_fragment, past_date, select_text,
        },
        transaction::{TransactionKind, get_transaction},
        user::set_user_family,
    };

    use super::{DeleteTransactionState, delete_transaction_endpoint};

    #[tokio::test]
    async fn can_delete_own_transaction() {
        let conn = get_test_connection();
        let user = create_test_user("alice", &conn);
        let transaction =
            create_test_transaction(&user, TransactionKind::Expense, 1.0, past_date(), &conn);
        let state = DeleteTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response =
            delete_transaction_endpoint(Path(transaction.id), State(state.clone()), Extension(user.id))
                .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        assert_eq!(
            select_text(&html, "p").first().map(String::as_str),
            Some("Transaction deleted successfully")
        );
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_transaction(transaction.id, &connection), Err(Error::NotFound));
    }

    #[tokio::test]
    async fn cannot_delete_family_members_transaction() {
        let conn = get_test_connection();
        let alice = create_test_user("alice", &conn);
        let (family, alice) = create_test_family("Smith", &alice, &conn);
        let bob = create_test_user("bob", &conn);
        set_user_family(bob.id, Some(family.id), &conn).unwrap();
        let transaction =
            create_test_transaction(&alice, TransactionKind::Expense, 1.0, past_date(), &conn);
        let state = DeleteTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response =
            delete_transaction_endpoint(Path(transaction.id), State(state.clone()), Extension(bob.id))
                .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let connection = state.db_connection.lock().unwrap();
        assert!(get_transaction(transaction.id, &connection).is_ok());
    }

    #[tokio::test]
    async fn delete_missing_transaction_is_not_found() {
        let conn = get_test_connection();
        let user = create_test_user("alice", &conn);
        let state = DeleteTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = delete_transaction_endpoint(Path(1), State(state), Extension(user.id)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let html = parse_html_fragment(response).await;
        assert_eq!(
            select_text(&html, "p").first().map(String::as_str),
            Some("Could not delete transaction")
        );
    }
}
