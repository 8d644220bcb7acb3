//! This file defines the transaction type and the closed sets of categories
//! that each type of transaction may use.
//!
//! Income transactions may only use [INCOME_CATEGORIES] and expense
//! transactions may only use [EXPENSE_CATEGORIES]. Both sets include
//! [OTHER_CATEGORY] as a fallback, so the two sets are not disjoint.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::Serialize;

use crate::IntegrityError;

/// The fallback category shared by both category sets.
pub const OTHER_CATEGORY: &str = "Other";

/// The categories an expense may be filed under.
pub const EXPENSE_CATEGORIES: [&str; 12] = [
    "Accommodation",
    "Transportation",
    "Meals",
    "Activities & Tickets",
    "Guide Fees",
    "Marketing",
    "Office Supplies",
    "Utilities",
    "Insurance",
    "Salaries",
    "Equipment",
    OTHER_CATEGORY,
];

/// The categories an income may be filed under.
pub const INCOME_CATEGORIES: [&str; 8] = [
    "Package Tours",
    "Custom Tours",
    "Day Trips",
    "Activity Bookings",
    "Transportation Services",
    "Commissions",
    "Merchandise",
    OTHER_CATEGORY,
];

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionType {
    /// The string used to store the type in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    /// The categories that transactions of this type may use.
    pub fn categories(&self) -> &'static [&'static str] {
        match self {
            TransactionType::Income => &INCOME_CATEGORIES,
            TransactionType::Expense => &EXPENSE_CATEGORIES,
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The error returned when a string is neither "income" nor "expense".
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("\"{0}\" is not a transaction type, expected \"income\" or \"expense\"")]
pub struct ParseTransactionTypeError(pub String);

impl FromStr for TransactionType {
    type Err = ParseTransactionTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(ParseTransactionTypeError(other.to_owned())),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;

        text.parse()
            .map_err(|_| FromSqlError::Other(Box::new(IntegrityError::UnknownType(text.to_owned()))))
    }
}

/// Check whether `category` belongs to the category set for `transaction_type`.
pub fn is_valid_category_for(transaction_type: TransactionType, category: &str) -> bool {
    transaction_type.categories().contains(&category)
}
