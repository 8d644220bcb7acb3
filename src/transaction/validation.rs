//! Checks applied to transaction fields before they are written.

use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{TransactionType, ValidationError, category::is_valid_category_for};

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Parse an ISO-8601 calendar date, e.g. "2025-03-31".
///
/// # Errors
/// Returns [ValidationError::InvalidDate] if `text` is not a real calendar
/// date in the `YYYY-MM-DD` format, e.g. "2025-02-30".
pub fn parse_date(text: &str) -> Result<Date, ValidationError> {
    Date::parse(text.trim(), &DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(text.to_owned()))
}

/// Validate the fields that are present, in a fixed order.
///
/// The amount is checked first, then the type and category. The first failing
/// check determines the error. Dates arrive as [Date] values which are always
/// valid calendar dates, so they need no further checks here.
pub(crate) fn validate_fields(
    amount: Option<f64>,
    transaction_type: Option<TransactionType>,
    category: Option<&str>,
) -> Result<(), ValidationError> {
    if let Some(amount) = amount {
        if !amount.is_finite() {
            return Err(ValidationError::NonFiniteAmount);
        }

        if amount < 0.0 {
            return Err(ValidationError::NegativeAmount(amount));
        }
    }

    if let (Some(transaction_type), Some(category)) = (transaction_type, category) {
        validate_category(transaction_type, category)?;
    }

    Ok(())
}

/// Check that `category` belongs to the category set of `transaction_type`.
pub(crate) fn validate_category(
    transaction_type: TransactionType,
    category: &str,
) -> Result<(), ValidationError> {
    if is_valid_category_for(transaction_type, category) {
        Ok(())
    } else {
        Err(ValidationError::CategoryMismatch {
            transaction_type,
            category: category.to_owned(),
        })
    }
}
