//! CLI command implementations.

pub mod config;
pub mod routes;
pub mod rpc;

use clap::{Args, Subcommand};

/// Arguments for the routes command.
#[derive(Args)]
pub struct RoutesArgs {
    /// Route manifest file (JSON).
    #[arg(default_value = "routes.json")]
    pub manifest: String,

    /// Origin to resolve routes against (overrides config).
    #[arg(long)]
    pub origin: Option<String>,

    /// Base path to resolve routes against (overrides config).
    #[arg(long)]
    pub base_path: Option<String>,
}

/// Arguments for the rpc command.
#[derive(Args)]
pub struct RpcArgs {
    /// RPC endpoint, absolute or relative to the configured scope.
    pub url: String,

    /// Method name.
    pub method: String,

    /// Parameter object (JSON).
    #[arg(short, long, default_value = "{}")]
    pub params: String,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration.
    Show,
    /// Load and validate a config file.
    Check {
        /// Config file (default: the discovered one).
        path: Option<String>,
    },
}
