use clap::Parser;
use course_ledger::application::ledger::TransactionLedger;
use course_ledger::domain::order::CourseId;
use course_ledger::domain::ports::{OrderStoreBox, TransactionStoreBox};
use course_ledger::domain::transaction::TransactionType;
use course_ledger::infrastructure::in_memory::{InMemoryOrderStore, InMemoryTransactionStore};
use course_ledger::interfaces::csv::order_reader::OrderReader;
use course_ledger::interfaces::csv::totals_writer::TotalsWriter;
use course_ledger::interfaces::csv::transaction_reader::TransactionReader;
use miette::{IntoDiagnostic, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input CSV of payment-processor transactions
    input: PathBuf,

    /// CSV of orders and their course items
    #[arg(long)]
    orders: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "COURSE_LEDGER_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Only report this course
    #[arg(long)]
    course: Option<String>,

    /// Only count transactions of this type
    #[arg(long = "type", value_parser = parse_transaction_type)]
    transaction_type: Option<TransactionType>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn parse_transaction_type(value: &str) -> std::result::Result<TransactionType, String> {
    match value.to_ascii_lowercase().as_str() {
        "purchase" => Ok(TransactionType::Purchase),
        "refund" => Ok(TransactionType::Refund),
        other => Err(format!("unknown transaction type {other:?}")),
    }
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();
}

#[cfg(feature = "storage-rocksdb")]
fn open_stores(db_path: Option<PathBuf>) -> Result<(OrderStoreBox, TransactionStoreBox)> {
    use course_ledger::infrastructure::rocksdb::RocksDBStore;

    if let Some(db_path) = db_path {
        tracing::info!(path = %db_path.display(), "Opening RocksDB store");
        let store = RocksDBStore::open(db_path).into_diagnostic()?;
        return Ok((Box::new(store.clone()), Box::new(store)));
    }
    Ok(in_memory_stores())
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_stores(db_path: Option<PathBuf>) -> Result<(OrderStoreBox, TransactionStoreBox)> {
    if db_path.is_some() {
        tracing::warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
        );
    }
    Ok(in_memory_stores())
}

fn in_memory_stores() -> (OrderStoreBox, TransactionStoreBox) {
    (
        Box::new(InMemoryOrderStore::new()),
        Box::new(InMemoryTransactionStore::new()),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let (order_store, transaction_store) = open_stores(cli.db_path)?;
    let ledger = TransactionLedger::new(order_store, transaction_store);

    let orders = OrderReader::new(File::open(&cli.orders).into_diagnostic()?)
        .orders()
        .into_diagnostic()?;
    for order in orders {
        ledger.save_order(order).await.into_diagnostic()?;
    }

    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = TransactionReader::new(file);
    for (row, tx_result) in reader.transactions().enumerate() {
        let tx = match tx_result {
            Ok(tx) => tx,
            Err(e) => {
                error!(row = row + 1, error = %e, "Error reading transaction");
                continue;
            }
        };
        let remote_id = tx.remote_transaction_id.clone();
        if let Err(e) = ledger.record(tx).await {
            error!(row = row + 1, remote_id = %remote_id, error = %e, "Error recording transaction");
        }
    }

    let totals = match cli.course {
        Some(course) => {
            let course_id = CourseId::new(&course).into_diagnostic()?;
            let totals = ledger
                .totals_for_course(&course_id, cli.transaction_type)
                .await
                .into_diagnostic()?;
            BTreeMap::from([(course_id, totals)])
        }
        None => ledger
            .totals_by_course(cli.transaction_type)
            .await
            .into_diagnostic()?,
    };

    let stdout = io::stdout();
    let mut writer = TotalsWriter::new(stdout.lock());
    writer.write_totals(&totals).into_diagnostic()?;

    Ok(())
}
