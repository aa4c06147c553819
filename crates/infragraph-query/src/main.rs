//! CLI entry point for infragraph.
//!
//! Every command loads the configured sources into a fresh in-memory store
//! first. Results are written to stdout as JSON; logs go to stderr.

use std::io::Read;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use infragraph_core::config::AppConfig;
use infragraph_query::{AppContext, IntentRequest};

#[derive(Parser)]
#[command(name = "infragraph")]
#[command(about = "Infrastructure topology graph: ownership, dependencies and blast radius")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: infragraph).
    #[arg(short, long, default_value = "infragraph", global = true)]
    config: String,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest all sources and print the load report.
    Load,
    /// Print node and edge counts.
    Stats,
    /// Dump every node and edge.
    Graph,
    /// Answer one intent read as JSON from stdin.
    Query,
    /// Print statistics and node names per type.
    Schema,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = AppConfig::load(&cli.config)?;
    let (context, report) = AppContext::bootstrap(config).await?;
    let engine = context.engine();

    match cli.command {
        Command::Load => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Stats => {
            println!("{}", serde_json::to_string_pretty(&engine.get_graph_stats()?)?);
        }
        Command::Graph => {
            println!("{}", serde_json::to_string(&engine.graph_snapshot()?)?);
        }
        Command::Query => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            let request: IntentRequest = serde_json::from_str(&input)?;
            let result = engine.execute_intent(&request);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&engine.graph_schema()?)?);
        }
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
