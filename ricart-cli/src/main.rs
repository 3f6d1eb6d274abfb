mod storage;

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ricart_core::simulation::{Simulation, SimulationConfig};
use tracing_subscriber::EnvFilter;

use crate::storage::{create_access_log, create_store, StorageSpec};

#[derive(Parser)]
#[command(
    name = "ricart",
    about = "Ricart — permission-based mutual exclusion for shared files",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run clients that each write then read one shared file
    Simulate {
        /// Number of participating clients (prompted for when omitted)
        #[arg(short, long, env = "RICART_CLIENTS")]
        clients: Option<u32>,

        /// Name of the shared file
        #[arg(short, long, default_value = "file1.txt")]
        resource: String,

        /// Storage backend: "memory", "dir:<path>" or "sqlite:<path>"
        #[arg(long, default_value = "memory", env = "RICART_STORAGE")]
        storage: String,

        /// Append access records to this file
        #[arg(long, env = "RICART_ACCESS_LOG")]
        access_log: Option<PathBuf>,

        /// Initial content if the file does not exist yet
        #[arg(long)]
        seed: Option<String>,
    },

    /// Print version information
    Version,
}

/// Ask for the client count. The prompt goes to stderr so stdout stays
/// pure JSON.
fn prompt_clients(input: &mut impl BufRead, prompt: &mut impl Write) -> Result<u32, String> {
    write!(prompt, "Enter the number of clients: ")
        .and_then(|_| prompt.flush())
        .map_err(|e| format!("Failed to write prompt: {}", e))?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .map_err(|e| format!("Failed to read stdin: {}", e))?;
    parse_clients(&line)
}

fn parse_clients(line: &str) -> Result<u32, String> {
    line.trim()
        .parse()
        .map_err(|_| format!("Invalid number of clients: '{}'", line.trim()))
}

async fn simulate(
    clients: Option<u32>,
    resource: String,
    storage: &str,
    access_log: Option<PathBuf>,
    seed: Option<String>,
) -> Result<bool, String> {
    let clients = match clients {
        Some(clients) => clients,
        None => prompt_clients(&mut std::io::stdin().lock(), &mut std::io::stderr())?,
    };

    let spec = StorageSpec::parse(storage)?;
    let seed = seed.or_else(|| spec.needs_seed().then(String::new));
    let store = create_store(&spec)?;
    let log = create_access_log(access_log.as_ref());

    let mut config = SimulationConfig::new(clients, resource);
    config.seed = seed;

    let report = Simulation::new(store, log)
        .run(&config)
        .await
        .map_err(|e| e.to_string())?;

    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|e| format!("Failed to render report: {}", e))?;
    println!("{}", rendered);

    Ok(report.succeeded())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            clients,
            resource,
            storage,
            access_log,
            seed,
        } => match simulate(clients, resource, &storage, access_log, seed).await {
            Ok(true) => {}
            Ok(false) => std::process::exit(1),
            Err(e) => {
                eprintln!("error: {}", e);
                std::process::exit(2);
            }
        },
        Commands::Version => {
            println!("ricart {}", env!("CARGO_PKG_VERSION"));
            println!("Ricart-Agrawala mutual exclusion for shared files");
        }
    }
}
