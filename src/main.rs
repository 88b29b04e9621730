use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tinybase::errors::Error;
use tinybase::repl;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// A minimal single-file embedded database with a paged, disk-backed B-tree.
#[derive(Parser)]
#[command(name = "tinybase", version = VERSION)]
struct Cli {
    /// Path to the database file. Created if it doesn't already exist.
    db_path: PathBuf,

    /// Where to write structured logs.
    #[arg(long, env = "TINYBASE_LOG_FILE", default_value = "tinybase.log")]
    log_file: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let log_file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(&cli.log_file)
        .expect("failed to open log file");

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match repl::start(&cli.db_path) {
        Ok(()) => (),
        Err(Error::Io(e)) if e.kind() == io::ErrorKind::Interrupted => (),
        Err(e) => {
            eprintln!("\nError: {}", e);
            std::process::exit(1);
        }
    }
}
