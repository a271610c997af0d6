mod seed;
mod serve;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Workforce approval workflow service.
#[derive(Parser)]
#[command(name = "lodgeflow", version, about = "Workforce approval workflow service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP JSON API server
    Serve {
        /// Port to listen on
        #[arg(long, default_value_t = 3000)]
        port: u16,

        /// Path to the user directory JSON file (see `lodgeflow seed`)
        #[arg(long)]
        users: PathBuf,

        /// Per-IP rate limit in requests per minute (overrides
        /// LODGEFLOW_RATE_LIMIT)
        #[arg(long)]
        rate_limit: Option<u64>,

        /// TLS certificate path (PEM; requires the `tls` feature)
        #[arg(long)]
        tls_cert: Option<PathBuf>,

        /// TLS private key path (PEM; requires the `tls` feature)
        #[arg(long)]
        tls_key: Option<PathBuf>,
    },

    /// Write the demo user directory to a JSON file
    Seed {
        /// Output path
        #[arg(long, default_value = "users.json")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve {
            port,
            users,
            rate_limit,
            tls_cert,
            tls_key,
        } => serve::start_server(port, users, rate_limit, tls_cert, tls_key).await,
        Commands::Seed { out } => seed::write_seed(&out),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        process::exit(1);
    }
}
