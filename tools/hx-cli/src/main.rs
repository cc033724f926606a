//! hx CLI - Developer tool for the hx edge request router.
//!
//! Commands:
//! - `hx routes` - Parse a route manifest and list routes and the cache manifest
//! - `hx rpc` - Invoke a remote procedure with the JSON-RPC client
//! - `hx config` - Inspect and check worker configuration

mod commands;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use hx_observability::{init_tracing, LogLevel};

use commands::{ConfigArgs, RoutesArgs, RpcArgs};

/// hx CLI - Inspect routes, call procedures and check worker configuration
#[derive(Parser)]
#[command(name = "hx")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a route manifest and list its routes
    Routes(RoutesArgs),

    /// Invoke a remote procedure
    Rpc(RpcArgs),

    /// Inspect worker configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(if cli.verbose { LogLevel::Debug } else { LogLevel::Warn });

    let output = output::Output::new(cli.verbose, cli.json);

    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    let result = match cli.command {
        Commands::Routes(args) => commands::routes::run(args, &ctx).await,
        Commands::Rpc(args) => commands::rpc::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
