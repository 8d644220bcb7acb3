//! Creates and migrates the application's database schema.
//!
//! The schema is defined by the SQL scripts in the `migrations` directory,
//! which are embedded in the binary. Scripts are applied in order of their
//! version, and the version of the last applied script is stored in
//! `PRAGMA user_version`. Every script must be safe to run twice.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::Error;

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "0001_create_transactions",
        sql: include_str!("../migrations/0001_create_transactions.sql"),
    },
    Migration {
        version: 2,
        name: "0002_index_type_and_category",
        sql: include_str!("../migrations/0002_index_type_and_category.sql"),
    },
];

/// The schema version created by the latest migration.
pub fn latest_schema_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Create the tables for the domain models, applying any migrations the
/// database has not seen yet.
///
/// All pending migrations are applied in a single SQL transaction, so a failed
/// migration leaves the database unchanged.
///
/// # Errors
/// Returns an [Error::UnsupportedSchemaVersion] if the database was created by
/// a newer version of this library, or an [Error::SqlError] if a migration
/// fails.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    let db_version = schema_version(&transaction)?;
    let latest_supported = latest_schema_version();

    if db_version > latest_supported {
        return Err(Error::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        });
    }

    for migration in MIGRATIONS
        .iter()
        .filter(|migration| migration.version > db_version)
    {
        tracing::info!("Applying migration {}", migration.name);
        transaction.execute_batch(migration.sql)?;
        transaction.pragma_update(None, "user_version", migration.version)?;
    }

    transaction.commit()?;

    Ok(())
}

fn schema_version(connection: &Connection) -> Result<u32, Error> {
    let version = connection.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    Ok(version)
}
