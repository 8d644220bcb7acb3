//! The financial summary report: income, expenses and per-category totals
//! over a date range.

use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::Serialize;
use time::Date;

use crate::{Error, TransactionType, transaction::check_stored_category};

/// Totals per category, kept separately for income and expenses.
///
/// Both category sets contain "Other", so a category name alone does not
/// identify a total. Use [CategoryBreakdown::get] to read the total for a
/// type and category, or [CategoryBreakdown::total_for] for the sum of a name
/// across both types.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    /// Total income per income category.
    pub income: BTreeMap<String, f64>,
    /// Total spending per expense category.
    pub expense: BTreeMap<String, f64>,
}

impl CategoryBreakdown {
    /// The total for `category` within transactions of `transaction_type`.
    ///
    /// Returns `None` if there were no such transactions in the range.
    pub fn get(&self, transaction_type: TransactionType, category: &str) -> Option<f64> {
        self.totals(transaction_type).get(category).copied()
    }

    /// The sum of `category` over both income and expenses.
    pub fn total_for(&self, category: &str) -> f64 {
        self.income.get(category).copied().unwrap_or(0.0)
            + self.expense.get(category).copied().unwrap_or(0.0)
    }

    /// Whether there are no totals at all.
    pub fn is_empty(&self) -> bool {
        self.income.is_empty() && self.expense.is_empty()
    }

    fn totals(&self, transaction_type: TransactionType) -> &BTreeMap<String, f64> {
        match transaction_type {
            TransactionType::Income => &self.income,
            TransactionType::Expense => &self.expense,
        }
    }

    fn totals_mut(&mut self, transaction_type: TransactionType) -> &mut BTreeMap<String, f64> {
        match transaction_type {
            TransactionType::Income => &mut self.income,
            TransactionType::Expense => &mut self.expense,
        }
    }
}

/// Income, expenses and profit over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialSummary {
    /// The first date in the range.
    pub start: Date,
    /// The last date in the range.
    pub end: Date,
    /// The sum of all income in the range.
    pub total_income: f64,
    /// The sum of all expenses in the range.
    pub total_expenses: f64,
    /// Income minus expenses.
    pub net_profit: f64,
    /// The totals per category.
    pub category_breakdown: CategoryBreakdown,
}

impl FinancialSummary {
    fn empty(start: Date, end: Date) -> Self {
        Self {
            start,
            end,
            total_income: 0.0,
            total_expenses: 0.0,
            net_profit: 0.0,
            category_breakdown: CategoryBreakdown::default(),
        }
    }

    fn add(&mut self, transaction_type: TransactionType, category: String, total: f64) {
        match transaction_type {
            TransactionType::Income => self.total_income += total,
            TransactionType::Expense => self.total_expenses += total,
        }

        *self
            .category_breakdown
            .totals_mut(transaction_type)
            .entry(category)
            .or_insert(0.0) += total;

        self.net_profit = self.total_income - self.total_expenses;
    }
}

/// Summarise the transactions dated between `start` and `end` (inclusive).
///
/// The totals are calculated by the database in a single query grouped by
/// transaction type and category. Whole-number amounts are stored as integers,
/// so the query uses `TOTAL` rather than `SUM`, which fails on integer overflow.
///
/// # Errors
/// This function will return a:
/// - [Error::Integrity] if a stored type or category is not valid,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_financial_summary(
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<FinancialSummary, Error> {
    let mut statement = connection.prepare(
        "SELECT type, category, TOTAL(amount), MIN(id) FROM transactions
         WHERE date BETWEEN ?1 AND ?2
         GROUP BY type, category",
    )?;

    let groups = statement.query_map((start, end), |row| {
        let transaction_type: TransactionType = row.get(0)?;
        let category = check_stored_category(1, row.get(3)?, transaction_type, row.get(1)?)?;
        let total: f64 = row.get(2)?;

        Ok((transaction_type, category, total))
    })?;

    let mut summary = FinancialSummary::empty(start, end);

    for group in groups {
        let (transaction_type, category, total) = group?;
        summary.add(transaction_type, category, total);
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::{Date, macros::date};

    use crate::{
        Error, IntegrityError, TransactionType,
        db::initialize,
        summary::{CategoryBreakdown, FinancialSummary, get_financial_summary},
        transaction::{Transaction, create_transaction},
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn insert(
        conn: &Connection,
        amount: f64,
        date: Date,
        transaction_type: TransactionType,
        category: &str,
    ) {
        create_transaction(
            Transaction::build(amount, date, transaction_type, category),
            conn,
        )
        .expect("Could not create transaction");
    }

    #[test]
    fn summary_of_income_and_expense() {
        let conn = get_test_connection();
        insert(
            &conn,
            100.0,
            date!(2025 - 06 - 01),
            TransactionType::Income,
            "Package Tours",
        );
        insert(
            &conn,
            40.0,
            date!(2025 - 06 - 15),
            TransactionType::Expense,
            "Accommodation",
        );

        let summary =
            get_financial_summary(date!(2025 - 06 - 01), date!(2025 - 06 - 30), &conn).unwrap();

        assert_eq!(summary.total_income, 100.0);
        assert_eq!(summary.total_expenses, 40.0);
        assert_eq!(summary.net_profit, 60.0);
        assert_eq!(
            summary.category_breakdown.get(TransactionType::Income, "Package Tours"),
            Some(100.0)
        );
        assert_eq!(
            summary.category_breakdown.get(TransactionType::Expense, "Accommodation"),
            Some(40.0)
        );
        assert_eq!(summary.category_breakdown.income.len(), 1);
        assert_eq!(summary.category_breakdown.expense.len(), 1);
    }

    #[test]
    fn summary_sums_each_category() {
        let conn = get_test_connection();
        let day = date!(2025 - 06 - 10);
        insert(&conn, 100.0, day, TransactionType::Income, "Day Trips");
        insert(&conn, 150.5, day, TransactionType::Income, "Day Trips");
        insert(&conn, 20.25, day, TransactionType::Expense, "Meals");
        insert(&conn, 9.75, day, TransactionType::Expense, "Meals");

        let summary = get_financial_summary(day, day, &conn).unwrap();

        assert_eq!(summary.total_income, 250.5);
        assert_eq!(summary.total_expenses, 30.0);
        assert_eq!(summary.net_profit, 220.5);
        assert_eq!(
            summary.category_breakdown.get(TransactionType::Income, "Day Trips"),
            Some(250.5)
        );
        assert_eq!(
            summary.category_breakdown.get(TransactionType::Expense, "Meals"),
            Some(30.0)
        );
    }

    #[test]
    fn other_is_kept_separate_for_income_and_expenses() {
        let conn = get_test_connection();
        let day = date!(2025 - 06 - 10);
        insert(&conn, 70.0, day, TransactionType::Income, "Other");
        insert(&conn, 30.0, day, TransactionType::Expense, "Other");

        let summary = get_financial_summary(day, day, &conn).unwrap();

        assert_eq!(
            summary.category_breakdown.get(TransactionType::Income, "Other"),
            Some(70.0)
        );
        assert_eq!(
            summary.category_breakdown.get(TransactionType::Expense, "Other"),
            Some(30.0)
        );
        assert_eq!(summary.category_breakdown.total_for("Other"), 100.0);
        assert_eq!(summary.net_profit, 40.0);
    }

    #[test]
    fn summary_excludes_transactions_outside_range() {
        let conn = get_test_connection();
        insert(
            &conn,
            500.0,
            date!(2025 - 05 - 31),
            TransactionType::Income,
            "Custom Tours",
        );
        insert(
            &conn,
            10.0,
            date!(2025 - 06 - 01),
            TransactionType::Income,
            "Merchandise",
        );
        insert(
            &conn,
            20.0,
            date!(2025 - 06 - 30),
            TransactionType::Expense,
            "Marketing",
        );
        insert(
            &conn,
            900.0,
            date!(2025 - 07 - 01),
            TransactionType::Expense,
            "Salaries",
        );

        let summary =
            get_financial_summary(date!(2025 - 06 - 01), date!(2025 - 06 - 30), &conn).unwrap();

        assert_eq!(summary.total_income, 10.0);
        assert_eq!(summary.total_expenses, 20.0);
        assert_eq!(summary.net_profit, -10.0);
        assert_eq!(summary.category_breakdown.total_for("Custom Tours"), 0.0);
        assert_eq!(summary.category_breakdown.total_for("Salaries"), 0.0);
    }

    #[test]
    fn summary_of_empty_range() {
        let conn = get_test_connection();
        let start = date!(2025 - 01 - 01);
        let end = date!(2025 - 12 - 31);

        let summary = get_financial_summary(start, end, &conn).unwrap();

        assert_eq!(
            summary,
            FinancialSummary {
                start,
                end,
                total_income: 0.0,
                total_expenses: 0.0,
                net_profit: 0.0,
                category_breakdown: CategoryBreakdown::default(),
            }
        );
        assert!(summary.category_breakdown.is_empty());
    }

    #[test]
    fn summary_fails_on_corrupt_row() {
        let conn = get_test_connection();
        conn.execute(
            "INSERT INTO transactions (amount, date, type, category) VALUES (1, '2025-06-01', 'income', 'Meals')",
            (),
        )
        .unwrap();

        let result = get_financial_summary(date!(2025 - 06 - 01), date!(2025 - 06 - 30), &conn);

        assert_eq!(
            result,
            Err(Error::Integrity(IntegrityError::IllegalCategory {
                transaction_type: TransactionType::Income,
                category: "Meals".to_owned(),
            }))
        );
    }

    #[test]
    fn summary_of_large_whole_amounts_does_not_overflow() {
        let conn = get_test_connection();
        let day = date!(2025 - 06 - 10);
        insert(&conn, 9.0e18, day, TransactionType::Income, "Day Trips");
        insert(&conn, 9.0e18, day, TransactionType::Income, "Day Trips");

        let summary = get_financial_summary(day, day, &conn).unwrap();

        assert_eq!(summary.total_income, 1.8e19);
        assert_eq!(summary.net_profit, 1.8e19);
        assert_eq!(
            summary.category_breakdown.get(TransactionType::Income, "Day Trips"),
            Some(1.8e19)
        );
    }
}
