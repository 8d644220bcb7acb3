//! Transaction storage for the ledger.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the `NewTransaction` builder for creating transactions
//! - The `TransactionPatch` type for partial updates
//! - Validation of transaction fields before they are written
//! - Database functions for storing, querying, and deleting transactions

mod core;
mod patch;
mod query;
mod validation;

pub use core::{
    NewTransaction, Transaction, create_many_transactions, create_transaction, delete_transaction,
    get_transaction,
};
pub use patch::{TransactionPatch, update_transaction};
pub use query::{
    get_all_transactions, get_transactions_by_category, get_transactions_by_date_range,
    get_transactions_by_type,
};
pub use validation::parse_date;

pub(crate) use core::check_stored_category;
