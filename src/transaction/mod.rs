//! Income and expense transactions.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and managing transactions
//! - View handlers for the transaction pages and the JSON reports

mod core;
mod create;
mod delete;
mod edit;
mod form;
mod json_api;
mod query;
mod transactions_page;
mod view;

pub use core::{
    Transaction, TransactionBuilder, TransactionId, TransactionKind, create_transaction,
    create_transaction_table, delete_transaction, get_owned_transaction, get_transaction,
    map_transaction_row, update_transaction,
};
pub use create::{create_transaction_endpoint, get_new_transaction_page};
pub use delete::delete_transaction_endpoint;
pub use edit::{get_edit_transaction_page, update_transaction_endpoint};
pub use form::local_today;
pub use json_api::{get_range_report, get_range_report_by_kind, get_since_report, get_until_report};
pub use query::{SortOrder, Summary, TransactionFilter, query_transactions};
pub use transactions_page::{get_expenses_page, get_incomes_page, get_transactions_page};

#[cfg(test)]
pub use core::count_transactions;
