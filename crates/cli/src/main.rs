mod fixture;
mod serve;

use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Approvals workflow API server.
#[derive(Parser)]
#[command(name = "approvals", version, about = "Approvals workflow API server")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the approvals HTTP API over an in-memory backend
    Serve {
        /// Port to listen on
        #[arg(long, env = "APPROVALS_PORT", default_value = "8080")]
        port: u16,
        /// JSON fixture seeding the backend
        #[arg(long, env = "APPROVALS_FIXTURE")]
        fixture: Option<PathBuf>,
        /// Lifetime of cached security and person lookups, in seconds
        #[arg(long, env = "APPROVALS_CACHE_TTL_SECS", default_value = "93600")]
        cache_ttl_secs: u64,
        /// Domain assumed when the remote user carries no DOMAIN\ prefix
        #[arg(long, env = "APPROVALS_DEFAULT_DOMAIN", default_value = "PNL")]
        default_domain: String,
    },

    /// Parse a fixture and report problems the backend would trip over
    CheckFixture {
        /// Path to the JSON fixture
        fixture: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Serve {
            port,
            fixture,
            cache_ttl_secs,
            default_domain,
        } => {
            let config = serve::ServeConfig {
                port,
                fixture,
                cache_ttl: Duration::from_secs(cache_ttl_secs),
                default_domain,
            };
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    report_error(
                        &format!("failed to create tokio runtime: {e}"),
                        cli.output,
                        cli.quiet,
                    );
                    process::exit(1);
                }
            };
            if let Err(e) = rt.block_on(serve::start_server(config)) {
                report_error(&format!("server error: {e}"), cli.output, cli.quiet);
                process::exit(1);
            }
        }
        Commands::CheckFixture { fixture } => {
            cmd_check_fixture(&fixture, cli.output, cli.quiet);
        }
    }
}

/// Install the fmt subscriber. `RUST_LOG` wins over `--log-level`.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_check_fixture(path: &Path, output: OutputFormat, quiet: bool) {
    let loaded = match fixture::load(path) {
        Ok(f) => f,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    };
    let summary = fixture::summarize(&loaded);

    match output {
        OutputFormat::Json => match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                report_error(&format!("cannot serialize summary: {e}"), output, quiet);
                process::exit(1);
            }
        },
        OutputFormat::Text => {
            if !quiet {
                println!(
                    "{}: {} definitions, {} processes, {} people, {} metadata nodes",
                    path.display(),
                    summary.definitions,
                    summary.processes,
                    summary.people,
                    summary.nodes
                );
            }
            for problem in &summary.problems {
                println!("  problem: {problem}");
            }
        }
    }

    if !summary.problems.is_empty() {
        process::exit(1);
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{msg}"),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
