use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing::info;
use wirepay::application::service::PaymentService;
use wirepay::config::PaymentConfig;
use wirepay::domain::ports::TransactionStoreBox;
use wirepay::infrastructure::in_memory::InMemoryTransactionStore;
use wirepay::interfaces::batch::BatchRunner;
use wirepay::interfaces::csv::command_reader::CommandReader;
use wirepay::interfaces::csv::transaction_writer::TransactionWriter;
use wirepay::logging::{LogFormat, init_logging};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input batch of payment commands (CSV)
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// JSON file overriding the default payment policy
    #[arg(long)]
    config: Option<PathBuf>,

    /// Default log filter when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

fn open_store(db_path: Option<PathBuf>) -> Result<TransactionStoreBox> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store = wirepay::infrastructure::rocksdb::RocksDBStore::open(&path).into_diagnostic()?;
            info!(path = %path.display(), "using RocksDB storage");
            Ok(Box::new(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            tracing::warn!(
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
            );
            Ok(Box::new(InMemoryTransactionStore::new()))
        }
        None => Ok(Box::new(InMemoryTransactionStore::new())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_format);

    let config = match &cli.config {
        Some(path) => PaymentConfig::from_json_file(path).into_diagnostic()?,
        None => PaymentConfig::default(),
    };
    let store = open_store(cli.db_path)?;
    let service = PaymentService::new(store, config).into_diagnostic()?;

    let file = File::open(&cli.input).into_diagnostic()?;
    let summary = BatchRunner::new(&service)
        .run(CommandReader::new(file))
        .await;
    info!(
        applied = summary.applied,
        rejected = summary.rejected,
        unreadable = summary.unreadable,
        "batch finished"
    );

    let transactions = service.into_transactions().await.into_diagnostic()?;

    let stdout = io::stdout();
    let mut writer = TransactionWriter::new(stdout.lock());
    writer.write_transactions(&transactions).into_diagnostic()?;

    Ok(())
}
