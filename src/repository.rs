//! Defines the transaction repository trait and its SQLite implementation.

use std::sync::Arc;

use rusqlite::Connection;
use time::Date;
use tokio::sync::Mutex;

use crate::{
    Error, TransactionType,
    database_id::TransactionId,
    summary::{FinancialSummary, get_financial_summary},
    transaction::{
        NewTransaction, Transaction, TransactionPatch, create_many_transactions,
        create_transaction, delete_transaction, get_all_transactions, get_transaction,
        get_transactions_by_category, get_transactions_by_date_range, get_transactions_by_type,
        update_transaction,
    },
};

/// Handles the creation, retrieval, update and deletion of transactions.
///
/// Queries that return many transactions order them by date, newest first.
pub trait TransactionRepository {
    /// Retrieve every transaction.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Transaction>, Error>> + Send;

    /// Retrieve a transaction by its `id`, or `None` if there is no such
    /// transaction.
    fn get_by_id(
        &self,
        id: TransactionId,
    ) -> impl Future<Output = Result<Option<Transaction>, Error>> + Send;

    /// Validate and store a new transaction.
    fn create(
        &self,
        transaction: NewTransaction,
    ) -> impl Future<Output = Result<Transaction, Error>> + Send;

    /// Apply `patch` to the transaction with `id`.
    fn update(
        &self,
        id: TransactionId,
        patch: TransactionPatch,
    ) -> impl Future<Output = Result<Transaction, Error>> + Send;

    /// Delete the transaction with `id`. Deleting a missing transaction is not
    /// an error.
    fn delete(&self, id: TransactionId) -> impl Future<Output = Result<(), Error>> + Send;

    /// Retrieve the transactions dated between `start` and `end` (inclusive).
    fn get_by_date_range(
        &self,
        start: Date,
        end: Date,
    ) -> impl Future<Output = Result<Vec<Transaction>, Error>> + Send;

    /// Retrieve the transactions of `transaction_type`.
    fn get_by_type(
        &self,
        transaction_type: TransactionType,
    ) -> impl Future<Output = Result<Vec<Transaction>, Error>> + Send;

    /// Retrieve the transactions filed under `category`.
    fn get_by_category(
        &self,
        category: &str,
    ) -> impl Future<Output = Result<Vec<Transaction>, Error>> + Send;

    /// Summarise the transactions dated between `start` and `end` (inclusive).
    fn get_financial_summary(
        &self,
        start: Date,
        end: Date,
    ) -> impl Future<Output = Result<FinancialSummary, Error>> + Send;

    /// Validate and store many transactions, all or nothing.
    ///
    /// The created transactions are returned in the same order as
    /// `transactions`.
    fn create_many(
        &self,
        transactions: Vec<NewTransaction>,
    ) -> impl Future<Output = Result<Vec<Transaction>, Error>> + Send;
}

/// Stores transactions in a SQLite database.
///
/// The store does not open or close the database, it is given a connection
/// that has already been set up with [crate::initialize_db].
#[derive(Debug, Clone)]
pub struct TransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl TransactionStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl TransactionRepository for TransactionStore {
    async fn get_all(&self) -> Result<Vec<Transaction>, Error> {
        let connection = self.connection.lock().await;

        get_all_transactions(&connection)
    }

    async fn get_by_id(&self, id: TransactionId) -> Result<Option<Transaction>, Error> {
        let connection = self.connection.lock().await;

        match get_transaction(id, &connection) {
            Ok(transaction) => Ok(Some(transaction)),
            Err(Error::NotFound) => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Create a new transaction in the database.
    ///
    /// # Errors
    /// Returns an [Error::Operation] wrapping a:
    /// - [Error::Validation] if the transaction is invalid,
    /// - [Error::Internal] if the new row could not be read back,
    /// - or [Error::SqlError] if there is some other SQL error.
    async fn create(&self, transaction: NewTransaction) -> Result<Transaction, Error> {
        let connection = self.connection.lock().await;

        let created = create_transaction(transaction, &connection).map_err(|error| {
            tracing::warn!("Could not create transaction: {error}");
            error.during("create transaction")
        })?;

        tracing::debug!("Created transaction {}", created.id);

        Ok(created)
    }

    /// Update a transaction in the database.
    ///
    /// # Errors
    /// Returns an [Error::Operation] wrapping a:
    /// - [Error::Validation] if the patch is invalid,
    /// - [Error::NotFound] if there is no transaction with `id`,
    /// - or [Error::SqlError] if there is some other SQL error.
    async fn update(
        &self,
        id: TransactionId,
        patch: TransactionPatch,
    ) -> Result<Transaction, Error> {
        let connection = self.connection.lock().await;

        let updated = update_transaction(id, patch, &connection).map_err(|error| {
            tracing::warn!("Could not update transaction {id}: {error}");
            error.during("update transaction")
        })?;

        tracing::debug!("Updated transaction {id}");

        Ok(updated)
    }

    async fn delete(&self, id: TransactionId) -> Result<(), Error> {
        let connection = self.connection.lock().await;

        delete_transaction(id, &connection).map_err(|error| error.during("delete transaction"))?;

        tracing::debug!("Deleted transaction {id}");

        Ok(())
    }

    async fn get_by_date_range(&self, start: Date, end: Date) -> Result<Vec<Transaction>, Error> {
        let connection = self.connection.lock().await;

        get_transactions_by_date_range(start, end, &connection)
    }

    async fn get_by_type(
        &self,
        transaction_type: TransactionType,
    ) -> Result<Vec<Transaction>, Error> {
        let connection = self.connection.lock().await;

        get_transactions_by_type(transaction_type, &connection)
    }

    async fn get_by_category(&self, category: &str) -> Result<Vec<Transaction>, Error> {
        let connection = self.connection.lock().await;

        get_transactions_by_category(category, &connection)
    }

    async fn get_financial_summary(
        &self,
        start: Date,
        end: Date,
    ) -> Result<FinancialSummary, Error> {
        let connection = self.connection.lock().await;

        get_financial_summary(start, end, &connection)
    }

    /// Create many transactions in a single SQL transaction.
    ///
    /// # Errors
    /// Returns an [Error::Operation] wrapping a:
    /// - [Error::InvalidBatchItem] if any transaction is invalid,
    /// - or [Error::SqlError] if there is some other SQL error.
    ///
    /// Nothing is written when an error is returned.
    async fn create_many(
        &self,
        transactions: Vec<NewTransaction>,
    ) -> Result<Vec<Transaction>, Error> {
        let connection = self.connection.lock().await;
        let count = transactions.len();

        let created = create_many_transactions(transactions, &connection).map_err(|error| {
            tracing::warn!("Could not create batch of {count} transactions: {error}");
            error.during("create transactions")
        })?;

        tracing::debug!("Created {} transactions", created.len());

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rusqlite::Connection;
    use time::macros::date;
    use tokio::sync::Mutex;

    use crate::{
        Error, TransactionType, ValidationError,
        db::initialize,
        repository::{TransactionRepository, TransactionStore},
        transaction::{Transaction, TransactionPatch},
    };

    fn get_store() -> TransactionStore {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        TransactionStore::new(Arc::new(Mutex::new(conn)))
    }

    #[tokio::test]
    async fn create_then_get_by_id() {
        let store = get_store();
        let created = store
            .create(
                Transaction::build(
                    99.99,
                    date!(2025 - 08 - 20),
                    TransactionType::Income,
                    "Package Tours",
                )
                .description("Alpine package"),
            )
            .await
            .expect("Could not create transaction");

        let got = store.get_by_id(created.id).await;

        assert_eq!(got, Ok(Some(created)));
    }

    #[tokio::test]
    async fn get_by_id_of_missing_transaction_is_none() {
        let store = get_store();

        assert_eq!(store.get_by_id(1).await, Ok(None));
    }

    #[tokio::test]
    async fn create_wraps_validation_error() {
        let store = get_store();

        let error = store
            .create(Transaction::build(
                -5.0,
                date!(2025 - 08 - 20),
                TransactionType::Expense,
                "Meals",
            ))
            .await
            .unwrap_err();

        assert_eq!(
            error.root_cause(),
            &Error::Validation(ValidationError::NegativeAmount(-5.0))
        );
        assert_eq!(
            error.to_string(),
            "could not create transaction: Amount must be positive"
        );
    }

    #[tokio::test]
    async fn create_rejects_income_in_expense_category() {
        let store = get_store();

        let result = store
            .create(Transaction::build(
                10.0,
                date!(2025 - 08 - 20),
                TransactionType::Income,
                "Accommodation",
            ))
            .await;

        assert!(matches!(
            result.as_ref().map_err(Error::root_cause),
            Err(Error::Validation(ValidationError::CategoryMismatch { .. }))
        ));
        assert_eq!(store.get_all().await, Ok(vec![]));
    }

    #[tokio::test]
    async fn update_keeps_unspecified_fields() {
        let store = get_store();
        let original = store
            .create(
                Transaction::build(
                    40.0,
                    date!(2025 - 08 - 01),
                    TransactionType::Expense,
                    "Accommodation",
                )
                .description("Hostel"),
            )
            .await
            .unwrap();

        let updated = store
            .update(
                original.id,
                TransactionPatch::default().description("Hostel, two nights"),
            )
            .await
            .unwrap();

        assert_eq!(
            updated,
            Transaction {
                description: "Hostel, two nights".to_owned(),
                ..original.clone()
            }
        );
        assert_eq!(store.get_by_id(original.id).await, Ok(Some(updated)));
    }

    #[tokio::test]
    async fn update_of_missing_transaction_is_not_found() {
        let store = get_store();

        let error = store
            .update(7, TransactionPatch::default().amount(1.0))
            .await
            .unwrap_err();

        assert_eq!(error.root_cause(), &Error::NotFound);
        assert!(error.to_string().starts_with("could not update transaction"));
    }

    #[tokio::test]
    async fn delete_twice_succeeds() {
        let store = get_store();
        let created = store
            .create(Transaction::build(
                1.0,
                date!(2025 - 08 - 01),
                TransactionType::Expense,
                "Utilities",
            ))
            .await
            .unwrap();

        assert_eq!(store.delete(created.id).await, Ok(()));
        assert_eq!(store.delete(created.id).await, Ok(()));
        assert_eq!(store.get_by_id(created.id).await, Ok(None));
    }

    #[tokio::test]
    async fn filtered_queries() {
        let store = get_store();
        let created = store
            .create_many(vec![
                Transaction::build(
                    100.0,
                    date!(2025 - 07 - 01),
                    TransactionType::Income,
                    "Package Tours",
                ),
                Transaction::build(
                    40.0,
                    date!(2025 - 07 - 02),
                    TransactionType::Expense,
                    "Accommodation",
                ),
                Transaction::build(
                    25.0,
                    date!(2025 - 08 - 02),
                    TransactionType::Expense,
                    "Accommodation",
                ),
            ])
            .await
            .unwrap();

        let in_july = store
            .get_by_date_range(date!(2025 - 07 - 01), date!(2025 - 07 - 31))
            .await
            .unwrap();
        let expenses = store.get_by_type(TransactionType::Expense).await.unwrap();
        let accommodation = store.get_by_category("Accommodation").await.unwrap();

        assert_eq!(in_july, vec![created[1].clone(), created[0].clone()]);
        assert_eq!(expenses, vec![created[2].clone(), created[1].clone()]);
        assert_eq!(accommodation, expenses);
    }

    #[tokio::test]
    async fn financial_summary() {
        let store = get_store();
        store
            .create_many(vec![
                Transaction::build(
                    100.0,
                    date!(2025 - 07 - 01),
                    TransactionType::Income,
                    "Package Tours",
                ),
                Transaction::build(
                    40.0,
                    date!(2025 - 07 - 31),
                    TransactionType::Expense,
                    "Accommodation",
                ),
            ])
            .await
            .unwrap();

        let summary = store
            .get_financial_summary(date!(2025 - 07 - 01), date!(2025 - 07 - 31))
            .await
            .unwrap();

        assert_eq!(summary.total_income, 100.0);
        assert_eq!(summary.total_expenses, 40.0);
        assert_eq!(summary.net_profit, 60.0);
        assert_eq!(summary.category_breakdown.total_for("Package Tours"), 100.0);
        assert_eq!(summary.category_breakdown.total_for("Accommodation"), 40.0);
    }

    #[tokio::test]
    async fn create_many_with_invalid_item_commits_nothing() {
        let store = get_store();
        let mut batch: Vec<_> = (1..=5)
            .map(|day| {
                Transaction::build(
                    day as f64 * 10.0,
                    date!(2025 - 07 - 01).replace_day(day).unwrap(),
                    TransactionType::Income,
                    "Day Trips",
                )
            })
            .collect();
        batch.insert(
            3,
            Transaction::build(
                -1.0,
                date!(2025 - 07 - 10),
                TransactionType::Expense,
                "Meals",
            ),
        );

        let error = store.create_many(batch).await.unwrap_err();

        assert_eq!(
            error.root_cause(),
            &Error::InvalidBatchItem {
                index: 3,
                error: ValidationError::NegativeAmount(-1.0),
            }
        );
        assert_eq!(store.get_all().await, Ok(vec![]));
    }
}
