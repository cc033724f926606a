//! Configuration commands.

use anyhow::{anyhow, Context as _, Result};
use hx_core::WorkerConfig;

use super::{ConfigArgs, ConfigCommand};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx).await,
        ConfigCommand::Check { path } => check_config(path.as_deref(), ctx).await,
    }
}

async fn show_config(ctx: &Context) -> Result<()> {
    let config = ctx
        .config
        .as_ref()
        .ok_or_else(|| anyhow!("No config found. Pass --config or create hx.toml."))?;

    if ctx.output.is_json() {
        ctx.output.json(config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    if let Some(path) = &ctx.config_path {
        ctx.output.kv("file", &path.display().to_string());
    }
    println!();
    print!("{}", toml::to_string_pretty(config).context("Failed to format config")?);

    Ok(())
}

async fn check_config(path: Option<&str>, ctx: &Context) -> Result<()> {
    let (config, source) = match path {
        Some(path) => {
            let resolved = ctx.resolve_path(path);
            let config = WorkerConfig::load(&resolved)
                .with_context(|| format!("Invalid config {}", resolved.display()))?;
            (config, resolved.display().to_string())
        }
        None => {
            let config = ctx
                .config
                .clone()
                .ok_or_else(|| anyhow!("No config found. Pass a path or create hx.toml."))?;
            let source = ctx
                .config_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            (config, source)
        }
    };

    let scope = config.scope()?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "valid": true,
            "file": source,
            "scope": scope.base_url().as_str(),
            "cache_name": config.cache_name,
        }));
        return Ok(());
    }

    ctx.output.success(&format!("{} is valid", source));
    ctx.output.kv("scope", scope.base_url().as_str());
    ctx.output.kv("cache_name", &config.cache_name);
    ctx.output.kv("routes_file", &config.routes_file);
    ctx.output.kv("flag_header", &config.flag_header);
    if config.static_assets.is_empty() {
        ctx.output.warn("No static assets configured; install caches templates only");
    }

    Ok(())
}
