/// Main entry point for the Dhikr Tracker MCP server
///
/// Sets up logging, parses command line arguments and serves the tracker
/// over stdin/stdout following the MCP protocol.

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use dhikr_tracker_mcp::DhikrTrackerServer;

const DATABASE_FILE: &str = "dhikr.db";

/// Get the default database path, falling back through the usual locations
fn get_default_database_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let potential_paths = [
        dirs::home_dir().map(|p| p.join(".dhikr_tracker")),
        dirs::data_dir().map(|p| p.join("dhikr_tracker")),
        dirs::config_dir().map(|p| p.join("dhikr_tracker")),
        std::env::current_dir().ok().map(|p| p.join(".dhikr_tracker")),
    ];

    for potential_path in potential_paths.iter().flatten() {
        if std::fs::create_dir_all(potential_path).is_ok() {
            // Must be writable, not just present
            let test_file = potential_path.join(".test_write");
            if std::fs::write(&test_file, "test").is_ok() {
                let _ = std::fs::remove_file(&test_file);
                return Ok(potential_path.join(DATABASE_FILE));
            }
        }
    }

    let temp_path = std::env::temp_dir().join("dhikr_tracker");
    std::fs::create_dir_all(&temp_path)?;

    tracing::warn!("Using temporary directory for database: {}", temp_path.display());
    Ok(temp_path.join(DATABASE_FILE))
}

/// Command line arguments for the Dhikr Tracker MCP server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    /// If not provided, uses ~/.dhikr_tracker/dhikr.db
    #[arg(long)]
    database: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,

    /// Do not add the starter dhikr to an empty library
    #[arg(long)]
    no_seed: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = if args.verbose {
        "debug"
    } else if args.debug {
        "info"
    } else {
        "warn"
    };

    // stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(format!("dhikr_tracker_mcp={}", log_level))
        .with_writer(std::io::stderr)
        .init();

    info!("Starting Dhikr Tracker MCP server");

    let db_path = match args.database {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            path
        }
        None => get_default_database_path()?,
    };

    info!("Using database at: {}", db_path.display());

    let server = DhikrTrackerServer::new(db_path, !args.no_seed).await?;
    server.run().await?;

    info!("Dhikr Tracker MCP server shutdown complete");
    Ok(())
}
