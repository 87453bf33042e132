//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{Connection, Row, ToSql, types::ToSqlOutput};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    category::{CategoryId, CategoryKind},
    error::is_foreign_key_violation,
    user::UserID,
};

// ============================================================================
// MODELS
// ============================================================================

/// The ID of a transaction in the database.
pub type TransactionId = i64;

/// Whether money was earned or spent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// The lowercase name used in URLs and forms.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// The capitalised name shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        }
    }

    /// The kind of category that can be used with this kind of transaction.
    pub fn category_kind(&self) -> CategoryKind {
        match self {
            TransactionKind::Income => CategoryKind::Income,
            TransactionKind::Expense => CategoryKind::Expense,
        }
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(format!("invalid transaction kind \"{other}\"")),
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user who recorded the transaction.
    pub user_id: UserID,
    /// When the transaction happened.
    pub date: Date,
    pub kind: TransactionKind,
    /// The amount of money spent or earned, always greater than zero.
    pub amount: f64,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The ID of the category the transaction belongs to.
    pub category_id: Option<CategoryId>,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        kind: TransactionKind,
        amount: f64,
        date: Date,
        description: &str,
    ) -> TransactionBuilder {
        TransactionBuilder {
            kind,
            amount,
            date,
            description: description.to_owned(),
            category_id: None,
        }
    }

    /// The amount earned, `None` for expenses.
    pub fn income(&self) -> Option<f64> {
        (self.kind == TransactionKind::Income).then_some(self.amount)
    }

    /// The amount spent, `None` for incomes.
    pub fn expense(&self) -> Option<f64> {
        (self.kind == TransactionKind::Expense).then_some(self.amount)
    }
}

/// A builder for creating [Transaction] instances.
///
/// The builder is passed to [create_transaction] or [update_transaction],
/// which check the amount and assign the ID and owner.
///
/// # Examples
///
/// ```ignore
/// use time::macros::date;
///
/// use crate::transaction::{Transaction, TransactionKind};
///
/// let builder = Transaction::build(
///         TransactionKind::Expense,
///         45.99,
///         date!(2025-01-15),
///         "Groceries",
///     )
///     .category_id(Some(3));
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    pub kind: TransactionKind,
    /// The amount of money, must be greater than zero.
    pub amount: f64,
    /// The date when the transaction occurred.
    ///
    /// Handlers reject dates later than today in the server's timezone.
    pub date: Date,
    pub description: String,
    pub category_id: Option<CategoryId>,
}

impl TransactionBuilder {
    /// Set the category for the transaction.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    fn income(&self) -> Option<f64> {
        (self.kind == TransactionKind::Income).then_some(self.amount)
    }

    fn expense(&self) -> Option<f64> {
        (self.kind == TransactionKind::Expense).then_some(self.amount)
    }

    fn check_amount(&self) -> Result<(), Error> {
        if self.amount.is_finite() && self.amount > 0.0 {
            Ok(())
        } else {
            Err(Error::InvalidAmount(self.amount))
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

pub(crate) const TRANSACTION_COLUMNS: &str =
    "id, user_id, date, income, expense, description, category_id";

/// Create a new transaction owned by `user_id` in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is not greater than zero,
/// - [Error::InvalidCategory] if the category ID does not refer to a real category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    builder.check_amount()?;

    connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" (user_id, date, income, expense, description, category_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                builder.date,
                builder.income(),
                builder.expense(),
                &builder.description,
                builder.category_id,
            ),
            map_transaction_row,
        )
        .map_err(|error| map_category_error(error, builder.category_id))
}

fn map_category_error(error: rusqlite::Error, category_id: Option<CategoryId>) -> Error {
    if is_foreign_key_violation(&error) {
        Error::InvalidCategory(category_id)
    } else {
        error.into()
    }
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id"
        ))?
        .query_one(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Get the transaction `id` if it was recorded by `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such transaction and
/// [Error::Forbidden] if it belongs to another user.
pub fn get_owned_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = get_transaction(id, connection)?;

    if transaction.user_id != user_id {
        tracing::warn!("User {user_id} tried to access transaction {id} of another user");
        return Err(Error::Forbidden);
    }

    Ok(transaction)
}

/// Replace the details of the transaction `id` with those in `builder`.
///
/// The owner of the transaction does not change.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is not greater than zero,
/// - [Error::UpdateMissingTransaction] if `id` does not refer to a transaction,
/// - [Error::InvalidCategory] if the category ID does not refer to a real category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<(), Error> {
    builder.check_amount()?;

    let rows_affected = connection
        .execute(
            "UPDATE \"transaction\"
             SET date = ?1, income = ?2, expense = ?3, description = ?4, category_id = ?5
             WHERE id = ?6",
            (
                builder.date,
                builder.income(),
                builder.expense(),
                &builder.description,
                builder.category_id,
                id,
            ),
        )
        .map_err(|error| map_category_error(error, builder.category_id))?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTransaction);
    }

    Ok(())
}

/// Delete the transaction `id`.
///
/// # Errors
/// Returns [Error::DeleteMissingTransaction] if there is no such transaction.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM \"transaction\" WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// Exactly one of the `income` and `expense` columns holds a positive amount.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            date TEXT NOT NULL,
            income REAL,
            expense REAL,
            description TEXT NOT NULL,
            category_id INTEGER REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL,
            CHECK (
                (income IS NOT NULL AND expense IS NULL AND income > 0)
                OR (expense IS NOT NULL AND income IS NULL AND expense > 0)
            )
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
///
/// The row must have the columns in [TRANSACTION_COLUMNS] in that order.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = row.get(1).map(UserID::new)?;
    let date = row.get(2)?;
    let income: Option<f64> = row.get(3)?;
    let expense: Option<f64> = row.get(4)?;
    let description = row.get(5)?;
    let category_id = row.get(6)?;

    let (kind, amount) = match (income, expense) {
        (Some(income), _) => (TransactionKind::Income, income),
        (None, Some(expense)) => (TransactionKind::Expense, expense),
        (None, None) => {
            return Err(rusqlite::Error::InvalidColumnType(
                3,
                "income".to_owned(),
                rusqlite::types::Type::Null,
            ));
        }
    };

    Ok(Transaction {
        id,
        user_id,
        date,
        kind,
        amount,
        description,
        category_id,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use time::macros::date;

    use crate::{
        Error,
        category::CategoryKind,
        test_utils::{create_test_category, create_test_user, get_test_connection},
        transaction::{
            Transaction, TransactionKind, count_transactions, create_transaction,
            delete_transaction, get_transaction, update_transaction,
        },
    };

    #[test]
    fn create_expense() {
        let conn = get_test_connection();
        let user = create_test_user("alice", &conn);

        let transaction = create_transaction(
            Transaction::build(TransactionKind::Expense, 12.3, date!(2025 - 01 - 02), "Bread"),
            user.id,
            &conn,
        )
        .unwrap();

        assert_eq!(transaction.kind, TransactionKind::Expense);
        assert_eq!(transaction.amount, 12.3);
        assert_eq!(transaction.expense(), Some(12.3));
        assert_eq!(transaction.income(), None);
        assert_eq!(transaction.user_id, user.id);
        assert_eq!(transaction.description, "Bread");
    }

    #[test]
    fn create_income_stores_income_column() {
        let conn = get_test_connection();
        let user = create_test_user("alice", &conn);

        let transaction = create_transaction(
            Transaction::build(TransactionKind::Income, 1000.0, date!(2025 - 01 - 02), "Salary"),
            user.id,
            &conn,
        )
        .unwrap();

        let (income, expense): (Option<f64>, Option<f64>) = conn
            .query_row(
                "SELECT income, expense FROM \"transaction\" WHERE id = ?1",
                [transaction.id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(income, Some(1000.0));
        assert_eq!(expense, None);
    }

    #[test]
    fn create_fails_on_non_positive_amount() {
        let conn = get_test_connection();
        let user = create_test_user("alice", &conn);

        for amount in [0.0, -5.0, f64::NAN] {
            let result = create_transaction(
                Transaction::build(TransactionKind::Expense, amount, date!(2025 - 01 - 02), ""),
                user.id,
                &conn,
            );

            assert!(matches!(result, Err(Error::InvalidAmount(_))), "got {result:?}");
        }
        assert_eq!(count_transactions(&conn).unwrap(), 0);
    }

    #[test]
    fn create_fails_on_missing_category() {
        let conn = get_test_connection();
        let user = create_test_user("alice", &conn);

        let result = create_transaction(
            Transaction::build(TransactionKind::Expense, 5.0, date!(2025 - 01 - 02), "")
                .category_id(Some(42)),
            user.id,
            &conn,
        );

        assert_eq!(result, Err(Error::InvalidCategory(Some(42))));
    }

    #[test]
    fn get_transaction_round_trips_category() {
        let conn = get_test_connection();
        let user = create_test_user("alice", &conn);
        let category = create_test_category("Food", CategoryKind::Expense, &user, &conn);
        let created = create_transaction(
            Transaction::build(TransactionKind::Expense, 5.0, date!(2025 - 01 - 02), "Apples")
                .category_id(Some(category.id)),
            user.id,
            &conn,
        )
        .unwrap();

        let got = get_transaction(created.id, &conn).unwrap();

        assert_eq!(got, created);
        assert_eq!(got.category_id, Some(category.id));
    }

    #[test]
    fn get_missing_transaction_is_not_found() {
        let conn = get_test_connection();

        assert_eq!(get_transaction(1, &conn), Err(Error::NotFound));
    }

    #[test]
    fn update_can_change_kind() {
        let conn = get_test_connection();
        let user = create_test_user("alice", &conn);
        let created = create_transaction(
            Transaction::build(TransactionKind::Expense, 5.0, date!(2025 - 01 - 02), "Oops"),
            user.id,
            &conn,
        )
        .unwrap();

        update_transaction(
            created.id,
            Transaction::build(TransactionKind::Income, 7.5, date!(2025 - 01 - 03), "Refund"),
            &conn,
        )
        .unwrap();

        let got = get_transaction(created.id, &conn).unwrap();
        assert_eq!(got.kind, TransactionKind::Income);
        assert_eq!(got.income(), Some(7.5));
        assert_eq!(got.date, date!(2025 - 01 - 03));
        assert_eq!(got.description, "Refund");
        assert_eq!(got.user_id, user.id);
    }

    #[test]
    fn update_missing_transaction() {
        let conn = get_test_connection();

        let result = update_transaction(
            1,
            Transaction::build(TransactionKind::Income, 7.5, date!(2025 - 01 - 03), ""),
            &conn,
        );

        assert_eq!(result, Err(Error::UpdateMissingTransaction));
    }

    #[test]
    fn delete_removes_transaction() {
        let conn = get_test_connection();
        let user = create_test_user("alice", &conn);
        let created = create_transaction(
            Transaction::build(TransactionKind::Expense, 5.0, date!(2025 - 01 - 02), ""),
            user.id,
            &conn,
        )
        .unwrap();

        delete_transaction(created.id, &conn).unwrap();

        assert_eq!(get_transaction(created.id, &conn), Err(Error::NotFound));
        assert_eq!(
            delete_transaction(created.id, &conn),
            Err(Error::DeleteMissingTransaction)
        );
    }

    #[test]
    fn check_constraint_rejects_both_columns() {
        let conn = get_test_connection();
        let user = create_test_user("alice", &conn);

        let result = conn.execute(
            "INSERT INTO \"transaction\" (user_id, date, income, expense, description)
             VALUES (?1, '2025-01-01', 1.0, 2.0, '')",
            [user.id.as_i64()],
        );

        assert!(result.is_err());
    }
}
