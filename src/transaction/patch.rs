//! Partial updates of stored transactions.

use rusqlite::{Connection, ToSql};
use serde::Serialize;
use time::Date;

use crate::{
    Error, TransactionType, ValidationError,
    database_id::TransactionId,
    transaction::{
        core::{TRANSACTION_COLUMNS, Transaction, get_transaction, map_transaction_row},
        validation::{validate_category, validate_fields},
    },
};

/// A set of changes to apply to a stored transaction.
///
/// Fields set to `None` keep their stored value. There is no ID field since
/// the ID of a transaction never changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionPatch {
    /// The new amount.
    pub amount: Option<f64>,
    /// The new date.
    pub date: Option<Date>,
    /// The new transaction type.
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    /// The new category.
    pub category: Option<String>,
    /// The new description.
    pub description: Option<String>,
}

impl TransactionPatch {
    /// Set the new amount.
    pub fn amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Set the new date.
    pub fn date(mut self, date: Date) -> Self {
        self.date = Some(date);
        self
    }

    /// Set the new transaction type.
    pub fn transaction_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = Some(transaction_type);
        self
    }

    /// Set the new category.
    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_owned());
        self
    }

    /// Set the new description.
    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_owned());
        self
    }

    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.assignments().is_empty()
    }

    /// Check the fields present in the patch.
    ///
    /// # Errors
    /// Returns a [ValidationError] if the amount is negative or not finite, or
    /// if both a type and category are given and they do not match.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(
            self.amount,
            self.transaction_type,
            self.category.as_deref(),
        )
    }

    /// The column assignments for the fields that are present, in column order.
    fn assignments(&self) -> Vec<(&'static str, &dyn ToSql)> {
        let mut assignments: Vec<(&'static str, &dyn ToSql)> = Vec::new();

        if let Some(amount) = &self.amount {
            assignments.push(("amount", amount));
        }
        if let Some(date) = &self.date {
            assignments.push(("date", date));
        }
        if let Some(transaction_type) = &self.transaction_type {
            assignments.push(("type", transaction_type));
        }
        if let Some(category) = &self.category {
            assignments.push(("category", category));
        }
        if let Some(description) = &self.description {
            assignments.push(("description", description));
        }

        assignments
    }
}

/// Apply `patch` to the transaction with `id` and return the updated
/// transaction.
///
/// Only the fields present in `patch` are written. The type and category of
/// the resulting transaction are checked together, so a patch that only
/// changes the category must still match the stored type.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if the patch or the patched transaction is invalid,
/// - [Error::NotFound] if `id` does not refer to a stored transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    patch: TransactionPatch,
    connection: &Connection,
) -> Result<Transaction, Error> {
    patch.validate()?;

    let tx = connection.unchecked_transaction()?;
    let current = get_transaction(id, &tx)?;

    let transaction_type = patch.transaction_type.unwrap_or(current.transaction_type);
    let category = patch.category.as_deref().unwrap_or(&current.category);
    validate_category(transaction_type, category)?;

    let assignments = patch.assignments();
    if assignments.is_empty() {
        return Ok(current);
    }

    let set_clause = assignments
        .iter()
        .enumerate()
        .map(|(i, (column, _))| format!("{column} = ?{}", i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let query = format!(
        "UPDATE transactions SET {set_clause} WHERE id = ?{} RETURNING {TRANSACTION_COLUMNS}",
        assignments.len() + 1
    );

    let mut params: Vec<&dyn ToSql> = assignments.iter().map(|(_, value)| *value).collect();
    params.push(&id);

    let updated = tx
        .prepare(&query)?
        .query_row(params.as_slice(), map_transaction_row)?;

    tx.commit()?;

    Ok(updated)
}
