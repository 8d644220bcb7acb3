use std::{error::Error, process::exit, sync::Arc};

use clap::{Parser, Subcommand};
use rusqlite::Connection;
use time::{Date, Duration, OffsetDateTime};
use tokio::sync::Mutex;

use ledger_rs::{
    NewTransaction, Transaction, TransactionRepository, TransactionStore, TransactionType,
    initialize_db, parse_date, setup_logging,
};

/// A command line interface for the ledger of a small tour business.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "LEDGER_DB_PATH")]
    db_path: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database tables, or migrate an existing database.
    Init,

    /// Add a set of sample transactions from the last 30 days.
    Seed,

    /// Record a single transaction.
    Add {
        /// Either "income" or "expense".
        #[arg(long = "type", value_parser = parse_type)]
        transaction_type: TransactionType,

        /// The amount of money earned or spent.
        #[arg(long)]
        amount: f64,

        /// The category, e.g. "Package Tours" or "Accommodation".
        #[arg(long)]
        category: String,

        /// The date in the format YYYY-MM-DD. Defaults to today.
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<Date>,

        /// What the transaction was for.
        #[arg(long, default_value = "")]
        description: String,
    },

    /// List transactions, newest first, as JSON.
    List {
        /// Only list transactions of this type.
        #[arg(long = "type", value_parser = parse_type, conflicts_with_all = ["category", "start"])]
        transaction_type: Option<TransactionType>,

        /// Only list transactions in this category.
        #[arg(long, conflicts_with = "start")]
        category: Option<String>,

        /// Only list transactions on or after this date.
        #[arg(long, value_parser = parse_date_arg, requires = "end")]
        start: Option<Date>,

        /// Only list transactions on or before this date.
        #[arg(long, value_parser = parse_date_arg, requires = "start")]
        end: Option<Date>,
    },

    /// Print the financial summary of a date range as JSON.
    Summary {
        /// The first date of the range.
        #[arg(long, value_parser = parse_date_arg)]
        start: Date,

        /// The last date of the range.
        #[arg(long, value_parser = parse_date_arg)]
        end: Date,
    },
}

fn parse_type(text: &str) -> Result<TransactionType, String> {
    text.parse().map_err(|error| format!("{error}"))
}

fn parse_date_arg(text: &str) -> Result<Date, String> {
    parse_date(text).map_err(|error| format!("{error}"))
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    if let Err(error) = run(args).await {
        tracing::error!("{error}");
        eprintln!("Error: {error}");
        exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let connection = Connection::open(&args.db_path)?;
    // Refuse to run against a database that cannot be migrated.
    initialize_db(&connection)?;

    let store = TransactionStore::new(Arc::new(Mutex::new(connection)));

    match args.command {
        Command::Init => {
            tracing::info!("Database at {} is ready", args.db_path);
        }
        Command::Seed => {
            let created = store.create_many(sample_transactions(today())).await?;
            tracing::info!("Created {} sample transactions", created.len());
        }
        Command::Add {
            transaction_type,
            amount,
            category,
            date,
            description,
        } => {
            let transaction = Transaction::build(
                amount,
                date.unwrap_or_else(today),
                transaction_type,
                &category,
            )
            .description(&description);
            let created = store.create(transaction).await?;
            println!("{}", serde_json::to_string_pretty(&created)?);
        }
        Command::List {
            transaction_type,
            category,
            start,
            end,
        } => {
            let transactions = match (transaction_type, category, start, end) {
                (Some(transaction_type), _, _, _) => store.get_by_type(transaction_type).await?,
                (_, Some(category), _, _) => store.get_by_category(&category).await?,
                (_, _, Some(start), Some(end)) => store.get_by_date_range(start, end).await?,
                _ => store.get_all().await?,
            };
            println!("{}", serde_json::to_string_pretty(&transactions)?);
        }
        Command::Summary { start, end } => {
            let summary = store.get_financial_summary(start, end).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

fn sample_transactions(today: Date) -> Vec<NewTransaction> {
    let days_ago = |days: i64| today - Duration::days(days);

    vec![
        Transaction::build(
            1850.0,
            days_ago(28),
            TransactionType::Income,
            "Package Tours",
        )
        .description("Five day coastal package, group of four"),
        Transaction::build(
            620.0,
            days_ago(27),
            TransactionType::Expense,
            "Accommodation",
        )
        .description("Lodge booking for coastal package"),
        Transaction::build(240.0, days_ago(21), TransactionType::Income, "Day Trips")
            .description("Glacier day trip"),
        Transaction::build(
            85.5,
            days_ago(21),
            TransactionType::Expense,
            "Transportation",
        )
        .description("Fuel"),
        Transaction::build(150.0, days_ago(14), TransactionType::Expense, "Guide Fees")
            .description("Guide for glacier trip"),
        Transaction::build(95.0, days_ago(10), TransactionType::Income, "Commissions")
            .description("Referral from partner hostel"),
        Transaction::build(
            120.0,
            days_ago(7),
            TransactionType::Expense,
            "Marketing",
        )
        .description("Social media ads"),
        Transaction::build(45.0, days_ago(3), TransactionType::Income, "Merchandise")
            .description("Maps and postcards"),
        Transaction::build(30.0, days_ago(1), TransactionType::Expense, "Other")
            .description("Bank fees"),
    ]
}
