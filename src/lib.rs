//! Ledger is the persistence layer for the income and expense records of a
//! small tour business.
//!
//! This library stores transactions in a SQLite database and provides CRUD
//! operations, filtered queries and a financial summary report through the
//! [TransactionRepository] trait and its SQLite implementation
//! [TransactionStore].

#![warn(missing_docs)]

mod category;
mod database_id;
mod db;
mod logging;
mod repository;
mod summary;
mod transaction;

pub use category::{
    EXPENSE_CATEGORIES, INCOME_CATEGORIES, OTHER_CATEGORY, ParseTransactionTypeError,
    TransactionType, is_valid_category_for,
};
pub use database_id::TransactionId;
pub use db::{initialize as initialize_db, latest_schema_version};
pub use logging::setup_logging;
pub use repository::{TransactionRepository, TransactionStore};
pub use summary::{CategoryBreakdown, FinancialSummary, get_financial_summary};
pub use transaction::{
    NewTransaction, Transaction, TransactionPatch, create_many_transactions, create_transaction,
    delete_transaction, get_all_transactions, get_transaction, get_transactions_by_category,
    get_transactions_by_date_range, get_transactions_by_type, parse_date, update_transaction,
};

/// The reasons a transaction may be rejected before it is written.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// The amount was less than zero. Zero is allowed.
    #[error("Amount must be positive")]
    NegativeAmount(f64),

    /// The amount was NaN or infinite, which cannot be stored.
    #[error("Amount must be a finite number")]
    NonFiniteAmount,

    /// The date could not be parsed as a calendar date.
    ///
    /// Holds the text that failed to parse.
    #[error("\"{0}\" is not a valid date, expected YYYY-MM-DD")]
    InvalidDate(String),

    /// The category does not belong to the category set for the transaction
    /// type, e.g., an income filed under "Accommodation".
    #[error("\"{category}\" is not a valid category for {transaction_type} transactions")]
    CategoryMismatch {
        /// The type of the transaction.
        transaction_type: TransactionType,
        /// The category that was rejected.
        category: String,
    },
}

/// The reasons a row read from the database may be rejected.
///
/// These errors indicate the database was modified outside of this library or
/// the schema has drifted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntegrityError {
    /// The stored transaction type is neither "income" nor "expense".
    #[error("unknown transaction type \"{0}\"")]
    UnknownType(String),

    /// The stored date is not a calendar date in the `YYYY-MM-DD` format.
    #[error("\"{0}\" is not a valid date")]
    InvalidDate(String),

    /// The stored transaction has no category.
    #[error("transaction {0} has no category")]
    MissingCategory(TransactionId),

    /// The stored category does not belong to the set for the stored type.
    #[error("\"{category}\" is not a valid category for {transaction_type} transactions")]
    IllegalCategory {
        /// The stored transaction type.
        transaction_type: TransactionType,
        /// The stored category.
        category: String,
    },
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The transaction failed validation and nothing was written.
    #[error("{0}")]
    Validation(ValidationError),

    /// An item in a batch failed validation and none of the batch was written.
    #[error("item {index} is invalid: {error}")]
    InvalidBatchItem {
        /// The position of the invalid item in the batch.
        index: usize,
        /// Why the item was rejected.
        error: ValidationError,
    },

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A row in the database does not describe a valid transaction.
    #[error("corrupt transaction row: {0}")]
    Integrity(IntegrityError),

    /// A write succeeded but did not produce the expected row.
    #[error("internal error: {0}")]
    Internal(String),

    /// An operation failed, `source` describes why.
    ///
    /// Use [Error::root_cause] to get the underlying error.
    #[error("could not {operation}: {source}")]
    Operation {
        /// The operation that failed, e.g. "create transaction".
        operation: &'static str,
        /// The error that caused the operation to fail.
        source: Box<Error>,
    },

    /// The database was created by a newer version of this library.
    #[error(
        "the database schema version {db_version} is newer than the latest supported version {latest_supported}"
    )]
    UnsupportedSchemaVersion {
        /// The schema version recorded in the database.
        db_version: u32,
        /// The newest schema version this library knows about.
        latest_supported: u32,
    },

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl Error {
    /// The underlying error with any operation context removed.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Operation { source, .. } => source.root_cause(),
            error => error,
        }
    }

    /// Wrap `self` with the name of the operation that failed.
    pub(crate) fn during(self, operation: &'static str) -> Self {
        Error::Operation {
            operation,
            source: Box::new(self),
        }
    }
}

impl From<ValidationError> for Error {
    fn from(value: ValidationError) -> Self {
        Error::Validation(value)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            rusqlite::Error::FromSqlConversionFailure(index, data_type, cause)
                if cause.is::<IntegrityError>() =>
            {
                match cause.downcast::<IntegrityError>() {
                    Ok(integrity_error) => {
                        tracing::error!("read a corrupt transaction row: {}", integrity_error);
                        Error::Integrity(*integrity_error)
                    }
                    Err(cause) => Error::SqlError(rusqlite::Error::FromSqlConversionFailure(
                        index, data_type, cause,
                    )),
                }
            }
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}
