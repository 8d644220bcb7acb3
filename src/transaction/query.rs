//! Database queries that select many transactions.
//!
//! Every query returns transactions newest first. Transactions on the same
//! date are ordered by ID, newest first, to keep the order stable.

use rusqlite::{Connection, ToSql};
use time::Date;

use crate::{
    Error, TransactionType,
    transaction::core::{TRANSACTION_COLUMNS, Transaction, map_transaction_row},
};

/// Defines which transactions a query selects.
enum TransactionFilter<'a> {
    All,
    DateRange { start: Date, end: Date },
    Type(TransactionType),
    Category(&'a str),
}

impl TransactionFilter<'_> {
    fn where_clause(&self) -> &'static str {
        match self {
            TransactionFilter::All => "",
            TransactionFilter::DateRange { .. } => "WHERE date BETWEEN ?1 AND ?2",
            TransactionFilter::Type(_) => "WHERE type = ?1",
            TransactionFilter::Category(_) => "WHERE category = ?1",
        }
    }

    fn params(&self) -> Vec<&dyn ToSql> {
        match self {
            TransactionFilter::All => vec![],
            TransactionFilter::DateRange { start, end } => vec![start as &dyn ToSql, end],
            TransactionFilter::Type(transaction_type) => vec![transaction_type as &dyn ToSql],
            TransactionFilter::Category(category) => vec![category as &dyn ToSql],
        }
    }
}

fn query_transactions(
    filter: TransactionFilter,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let query = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM transactions {} ORDER BY date DESC, id DESC",
        filter.where_clause()
    );

    connection
        .prepare(&query)?
        .query_map(filter.params().as_slice(), map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::from))
        .collect()
}

/// Get every transaction, newest first.
///
/// # Errors
/// Returns an [Error::Integrity] if a stored row is not a valid transaction, or
/// an [Error::SqlError] if there is some other SQL error.
pub fn get_all_transactions(connection: &Connection) -> Result<Vec<Transaction>, Error> {
    query_transactions(TransactionFilter::All, connection)
}

/// Get the transactions dated between `start` and `end` (inclusive), newest
/// first.
///
/// If `start` is after `end` no transactions are returned.
///
/// # Errors
/// Returns an [Error::Integrity] if a stored row is not a valid transaction, or
/// an [Error::SqlError] if there is some other SQL error.
pub fn get_transactions_by_date_range(
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    query_transactions(TransactionFilter::DateRange { start, end }, connection)
}

/// Get the transactions of `transaction_type`, newest first.
///
/// # Errors
/// Returns an [Error::Integrity] if a stored row is not a valid transaction, or
/// an [Error::SqlError] if there is some other SQL error.
pub fn get_transactions_by_type(
    transaction_type: TransactionType,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    query_transactions(TransactionFilter::Type(transaction_type), connection)
}

/// Get the transactions filed under `category`, newest first.
///
/// Since "Other" is both an income and an expense category, querying for it
/// returns transactions of both types.
///
/// # Errors
/// Returns an [Error::Integrity] if a stored row is not a valid transaction, or
/// an [Error::SqlError] if there is some other SQL error.
pub fn get_transactions_by_category(
    category: &str,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    query_transactions(TransactionFilter::Category(category), connection)
}
