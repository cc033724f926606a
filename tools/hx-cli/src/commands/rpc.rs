//! Remote procedure invocation.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use hx_core::WorkerScope;
use hx_fetch::ReqwestNetwork;
use hx_rpc::RpcClient;
use serde_json::Value;

use super::RpcArgs;
use crate::context::Context;

/// Run the rpc command.
pub async fn run(args: RpcArgs, ctx: &Context) -> Result<()> {
    let params: Value =
        serde_json::from_str(&args.params).context("--params must be valid JSON")?;

    // Absolute URLs resolve to themselves against any scope.
    let scope = match &ctx.config {
        Some(config) => config.scope()?,
        None => WorkerScope::new(&args.url, "/")
            .context("URL must be absolute when no config is available")?,
    };

    ctx.output
        .debug(&format!("Calling {} at {}", args.method, scope.resolve(&args.url)?));

    let client = RpcClient::new(scope, Arc::new(ReqwestNetwork::new()));
    let result = client.invoke(&args.url, &args.method, params).await?;

    if result.is_null() && !ctx.output.is_json() {
        ctx.output.success("null (no content)");
        return Ok(());
    }

    ctx.output.json(&result);
    Ok(())
}
