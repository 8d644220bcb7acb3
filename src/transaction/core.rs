//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row, types::Type};
use serde::Serialize;
use time::Date;

use crate::{
    Error, IntegrityError, TransactionType, ValidationError,
    category::is_valid_category_for,
    database_id::TransactionId,
    transaction::validation::{parse_date, validate_fields},
};

// ============================================================================
// MODELS
// ============================================================================

/// An income or expense, i.e. an event where money was either earned or spent.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The amount of money earned or spent. Never negative.
    pub amount: f64,
    /// When the transaction happened.
    pub date: Date,
    /// Whether the money was earned or spent.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The category the transaction is filed under, e.g. "Package Tours".
    pub category: String,
    /// A text description of what the transaction was for.
    pub description: String,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [NewTransaction] for discoverability.
    pub fn build(
        amount: f64,
        date: Date,
        transaction_type: TransactionType,
        category: &str,
    ) -> NewTransaction {
        NewTransaction {
            amount,
            date,
            transaction_type,
            category: category.to_owned(),
            description: String::new(),
        }
    }
}

/// A transaction that has not been stored yet, i.e. a [Transaction] without
/// an ID.
///
/// # Examples
///
/// ```
/// use ledger_rs::{Transaction, TransactionType};
/// use time::macros::date;
///
/// let transaction = Transaction::build(
///         1250.0,
///         date!(2025 - 01 - 15),
///         TransactionType::Income,
///         "Package Tours",
///     )
///     .description("Coastal tour, group of five");
///
/// assert_eq!(transaction.description, "Coastal tour, group of five");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTransaction {
    /// The amount of money earned or spent.
    ///
    /// Amounts are always zero or positive, the direction of the money is
    /// given by `transaction_type`.
    pub amount: f64,

    /// The date when the transaction occurred.
    pub date: Date,

    /// Whether the money was earned or spent.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,

    /// The category of the transaction.
    ///
    /// Must be one of [crate::INCOME_CATEGORIES] for income and one of
    /// [crate::EXPENSE_CATEGORIES] for expenses.
    pub category: String,

    /// A human-readable description of the transaction.
    ///
    /// Defaults to an empty string.
    pub description: String,
}

impl NewTransaction {
    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Check the transaction can be stored.
    ///
    /// # Errors
    /// Returns a [ValidationError] if the amount is negative or not finite, or
    /// if the category does not belong to the transaction type.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(
            Some(self.amount),
            Some(self.transaction_type),
            Some(&self.category),
        )
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// The columns of the transactions table, in the order [map_transaction_row]
/// expects them.
pub(crate) const TRANSACTION_COLUMNS: &str = "id, amount, date, type, category, description";

/// Create a new transaction in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if `transaction` fails validation,
/// - [Error::Internal] if the insert did not return the new row,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    transaction.validate()?;

    insert_transaction(&transaction, connection)
}

/// Create many transactions in the database in a single SQL transaction.
///
/// Either every transaction is created or none are. The returned transactions
/// are in the same order as `transactions`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidBatchItem] if any transaction fails validation,
/// - [Error::Internal] if an insert did not return the new row,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_many_transactions(
    transactions: Vec<NewTransaction>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    for (index, transaction) in transactions.iter().enumerate() {
        transaction
            .validate()
            .map_err(|error| Error::InvalidBatchItem { index, error })?;
    }

    let tx = connection.unchecked_transaction()?;
    let mut created = Vec::with_capacity(transactions.len());

    for transaction in &transactions {
        created.push(insert_transaction(transaction, &tx)?);
    }

    tx.commit()?;

    Ok(created)
}

fn insert_transaction(
    transaction: &NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let query = format!(
        "INSERT INTO transactions (amount, date, type, category, description)
         VALUES (?1, ?2, ?3, ?4, ?5)
         RETURNING {TRANSACTION_COLUMNS}"
    );

    connection
        .prepare_cached(&query)?
        .query_row(
            (
                transaction.amount,
                transaction.date,
                transaction.transaction_type,
                &transaction.category,
                &transaction.description,
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => {
                Error::Internal("failed to create transaction, the insert returned no row".into())
            }
            error => error.into(),
        })
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - [Error::Integrity] if the stored row is not a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = :id"
        ))?
        .query_one(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Delete the transaction with `id`.
///
/// Deleting a transaction that does not exist is not an error.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is a SQL error.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM transactions WHERE id = :id", &[(":id", &id)])?;

    if rows_affected == 0 {
        tracing::debug!("transaction {id} was already absent, nothing to delete");
    }

    Ok(())
}

/// Map a database row to a Transaction.
///
/// The row must contain the columns in [TRANSACTION_COLUMNS], in order.
///
/// # Errors
/// Fails with a conversion error wrapping an [IntegrityError] if the stored
/// type is unknown, or the stored category is missing or not allowed for the
/// stored type.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id: TransactionId = row.get(0)?;
    let amount = row.get(1)?;
    let date = check_stored_date(2, row.get(2)?)?;
    let transaction_type: TransactionType = row.get(3)?;
    let category: Option<String> = row.get(4)?;
    let description: Option<String> = row.get(5)?;

    let category = check_stored_category(4, id, transaction_type, category)?;

    Ok(Transaction {
        id,
        amount,
        date,
        transaction_type,
        category,
        description: description.unwrap_or_default(),
    })
}

/// Parse a date read from column `index`.
fn check_stored_date(index: usize, text: String) -> Result<Date, rusqlite::Error> {
    parse_date(&text).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            Type::Text,
            Box::new(IntegrityError::InvalidDate(text)),
        )
    })
}

/// Check that a category read from column `index` is present and legal for
/// `transaction_type`.
///
/// `id` identifies the row in the error if the category is missing.
pub(crate) fn check_stored_category(
    index: usize,
    id: TransactionId,
    transaction_type: TransactionType,
    category: Option<String>,
) -> Result<String, rusqlite::Error> {
    match category {
        Some(category) if is_valid_category_for(transaction_type, &category) => Ok(category),
        Some(category) => Err(rusqlite::Error::FromSqlConversionFailure(
            index,
            Type::Text,
            Box::new(IntegrityError::IllegalCategory {
                transaction_type,
                category,
            }),
        )),
        None => Err(rusqlite::Error::FromSqlConversionFailure(
            index,
            Type::Null,
            Box::new(IntegrityError::MissingCategory(id)),
        )),
    }
}

// ============================================================================
// TESTS
// ============================================================================
