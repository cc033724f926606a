//! Route manifest inspection.

use std::fs;

use anyhow::{Context as _, Result};
use hx_core::WorkerConfig;
use hx_router::{RouteDescriptor, RouteManifest, RouteTable};
use serde::Serialize;

use super::RoutesArgs;
use crate::context::Context;
use crate::output::or_dash;

/// Origin used when neither the config nor `--origin` names one.
const FALLBACK_ORIGIN: &str = "http://localhost";

#[derive(Serialize)]
struct RouteRow<'a> {
    path: &'a str,
    #[serde(flatten)]
    route: &'a RouteDescriptor,
}

#[derive(Serialize)]
struct RoutesReport<'a> {
    scope: &'a str,
    routes: Vec<RouteRow<'a>>,
    cache_manifest: &'a [String],
}

/// Run the routes command.
pub async fn run(args: RoutesArgs, ctx: &Context) -> Result<()> {
    let mut config = ctx
        .config
        .clone()
        .unwrap_or_else(|| WorkerConfig::new(FALLBACK_ORIGIN));
    if let Some(origin) = args.origin {
        config.origin = origin;
    }
    if let Some(base_path) = args.base_path {
        config.base_path = base_path;
    }

    let path = ctx.resolve_path(&args.manifest);
    ctx.output.debug(&format!("Reading {}", path.display()));
    let bytes = fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let manifest = RouteManifest::from_slice(&bytes)?;

    let mut table = RouteTable::from_config(&config)?;
    table.register_manifest(&manifest);

    let report = RoutesReport {
        scope: table.scope().base_url().as_str(),
        routes: table
            .routes()
            .into_iter()
            .map(|(path, route)| RouteRow { path, route })
            .collect(),
        cache_manifest: table.cache_manifest().paths(),
    };

    if ctx.output.is_json() {
        ctx.output.json(&report);
        return Ok(());
    }

    ctx.output.header(&format!("Routes ({})", report.routes.len()));
    let widths = [28, 16, 20, 24];
    ctx.output.table_row(&["PATH", "FUNCTION", "RPC PATH", "TEMPLATE"], &widths);
    for row in &report.routes {
        ctx.output.table_row(
            &[
                row.path,
                or_dash(row.route.rpc_function.as_deref()),
                or_dash(row.route.rpc_path.as_deref()),
                or_dash(row.route.template_path.as_deref()),
            ],
            &widths,
        );
    }

    ctx.output.header(&format!("Cache manifest ({})", report.cache_manifest.len()));
    for entry in report.cache_manifest {
        ctx.output.list_item(entry);
    }

    Ok(())
}
