//! Annotated disk cache admin tool.
//!
//! Runs one command against a cache directory, e.g.
//!
//! ```bash
//! diskcache --dir ./cache put greeting hello --meta lang=en
//! diskcache --dir ./cache get greeting --with-meta
//! diskcache --dir ./cache index "red fox" doc1 doc2
//! diskcache --dir ./cache find fox --limit 5
//! ```

use clap::Parser;
use std::io;
use tracing_subscriber::{fmt, EnvFilter};

use annotated_disk_cache::cli::{self, Cli};

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let stdout = io::stdout();
    if let Err(err) = cli::run(cli, &mut stdout.lock()) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
