//! The event-driven controller.

use std::sync::{Arc, RwLock};

use http::Method;
use hx_cache::{CacheManager, CacheStorage};
use hx_core::{
    HttpRequest, HttpResponse, RequestId, RequestKind, TimingContext, WorkerConfig, WorkerPhase,
    WorkerScope,
};
use hx_fetch::Network;
use hx_observability::{LogFormat, LogLevel, StructuredLogger};
use hx_router::RouteTable;
use hx_rpc::RpcClient;
use hx_template::TemplateEngine;
use serde_json::Value;

use crate::error::InterceptError;
use crate::params::gather_params;
use crate::response::{empty_response, error_response, html_response};

/// An event delivered by the host.
#[derive(Debug)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(HttpRequest),
}

/// What handling an event produced.
#[derive(Debug)]
pub enum EventOutcome {
    /// Number of resources stored.
    Installed(usize),
    /// Names of the pruned generations.
    Activated(Vec<String>),
    Response(HttpResponse),
}

/// Routes flagged requests and serves everything else cache-first.
///
/// Constructed once per worker instance. The route table is fixed after
/// [`Interceptor::load_routes`]; the template memo fills in as requests arrive.
pub struct Interceptor {
    config: WorkerConfig,
    scope: WorkerScope,
    routes: RouteTable,
    cache: Arc<CacheManager>,
    templates: TemplateEngine,
    rpc: RpcClient,
    network: Arc<dyn Network>,
    phase: RwLock<WorkerPhase>,
    log_level: LogLevel,
}

impl Interceptor {
    /// Build an interceptor with an empty route table.
    pub fn new(
        config: WorkerConfig,
        network: Arc<dyn Network>,
        storage: Arc<dyn CacheStorage>,
    ) -> Result<Self, InterceptError> {
        let scope = config.scope()?;
        let routes = RouteTable::from_config(&config)?;
        let cache = Arc::new(CacheManager::new(
            storage,
            Arc::clone(&network),
            scope.clone(),
            config.cache_name.clone(),
        ));
        let templates = TemplateEngine::new(
            scope.clone(),
            Arc::clone(&cache),
            Arc::clone(&network),
            config.partial_dir.clone(),
        );
        let rpc = RpcClient::new(scope.clone(), Arc::clone(&network));
        let log_level = config.log_level.parse().unwrap_or(LogLevel::Info);

        Ok(Self {
            config,
            scope,
            routes,
            cache,
            templates,
            rpc,
            network,
            phase: RwLock::new(WorkerPhase::Parsed),
            log_level,
        })
    }

    /// Build an interceptor and load the configured route manifest.
    ///
    /// A manifest that cannot be loaded is logged and leaves the table empty.
    pub async fn bootstrap(
        config: WorkerConfig,
        network: Arc<dyn Network>,
        storage: Arc<dyn CacheStorage>,
    ) -> Result<Self, InterceptError> {
        let mut interceptor = Self::new(config, network, storage)?;
        interceptor.load_routes().await;
        Ok(interceptor)
    }

    /// Load the configured route manifest. Returns the number of routes read.
    pub async fn load_routes(&mut self) -> usize {
        let source = self.config.routes_file.clone();
        self.routes
            .load_routes_or_log(self.network.as_ref(), &self.cache, &source)
            .await
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.cache
    }

    pub fn templates(&self) -> &TemplateEngine {
        &self.templates
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> WorkerPhase {
        self.phase
            .read()
            .map(|phase| *phase)
            .unwrap_or(WorkerPhase::Redundant)
    }

    fn set_phase(&self, phase: WorkerPhase) {
        if let Ok(mut current) = self.phase.write() {
            *current = phase;
        }
        tracing::debug!(phase = %phase, "worker phase changed");
    }

    /// Dispatch one host event.
    pub async fn handle_event(&self, event: WorkerEvent) -> Result<EventOutcome, InterceptError> {
        match event {
            WorkerEvent::Install => self.on_install().await.map(EventOutcome::Installed),
            WorkerEvent::Activate => self.on_activate().await.map(EventOutcome::Activated),
            WorkerEvent::Fetch(request) => self.on_fetch(request).await.map(EventOutcome::Response),
        }
    }

    /// Store the whole cache manifest in the current generation.
    ///
    /// If any resource fails the worker becomes redundant.
    pub async fn on_install(&self) -> Result<usize, InterceptError> {
        self.set_phase(WorkerPhase::Installing);
        match self.cache.install(self.routes.cache_manifest()).await {
            Ok(count) => {
                self.set_phase(WorkerPhase::Installed);
                Ok(count)
            }
            Err(e) => {
                tracing::error!(error = %e, "install failed");
                self.set_phase(WorkerPhase::Redundant);
                Err(e.into())
            }
        }
    }

    /// Mark the worker active if the current generation was already
    /// activated by an earlier instance. Returns whether it was.
    pub async fn resume(&self) -> Result<bool, InterceptError> {
        if !self.cache.is_ready().await? {
            return Ok(false);
        }
        self.set_phase(WorkerPhase::Activated);
        Ok(true)
    }

    /// Delete every cache generation except the current one.
    pub async fn on_activate(&self) -> Result<Vec<String>, InterceptError> {
        self.set_phase(WorkerPhase::Activating);
        let pruned = self.cache.activate().await?;
        self.cache.mark_ready().await?;
        self.set_phase(WorkerPhase::Activated);
        Ok(pruned)
    }

    /// Handle an intercepted request.
    ///
    /// Until the worker is activated every request goes straight to the
    /// network, unrouted and uncached. Once active, routed requests always
    /// produce a response; their failures become 404 or 500. A pass-through
    /// request fails only when the network does.
    pub async fn on_fetch(&self, request: HttpRequest) -> Result<HttpResponse, InterceptError> {
        let logger = self.logger(request.uri().path());

        let phase = self.phase();
        if !phase.serves_fetches() {
            logger
                .debug_builder("worker not active, forwarding")
                .field("phase", phase.to_string())
                .emit();
            return Ok(self.network.fetch(request).await?);
        }

        match RequestKind::classify(request.headers(), &self.config.flag_header) {
            RequestKind::Routed => Ok(self.handle_routed(&request, &logger).await),
            RequestKind::PassThrough => self.handle_pass_through(request, &logger).await,
        }
    }

    async fn handle_routed(&self, request: &HttpRequest, logger: &StructuredLogger) -> HttpResponse {
        let mut timing = TimingContext::new();

        match self.route(request, &mut timing).await {
            Ok(response) => {
                let mut entry = logger
                    .info_builder("routed request handled")
                    .field("method", request.method().as_str())
                    .field_i64("status", i64::from(response.status().as_u16()))
                    .duration_ms("duration", timing.elapsed());
                if let Some(rpc) = timing.since_start("rpc") {
                    entry = entry.duration_ms("rpc", rpc);
                }
                entry.emit();
                response
            }
            Err(e @ InterceptError::RouteNotFound(_)) => {
                logger
                    .warn_builder("no route for request")
                    .field("error", e.to_string())
                    .emit();
                error_response(&e)
            }
            Err(e) => {
                logger
                    .error_builder("Error handling request")
                    .field("error", e.to_string())
                    .duration_ms("duration", timing.elapsed())
                    .emit();
                error_response(&e)
            }
        }
    }

    async fn route(
        &self,
        request: &HttpRequest,
        timing: &mut TimingContext,
    ) -> Result<HttpResponse, InterceptError> {
        let path = request.uri().path();
        let route = self
            .routes
            .lookup(path)
            .ok_or_else(|| InterceptError::RouteNotFound(path.to_string()))?;

        let mut data = Value::Null;
        if let Some((rpc_path, function)) = route.rpc_binding() {
            let params = gather_params(request, &self.config.header_prefix)?;
            data = self.rpc.invoke(rpc_path, function, params).await?;
            timing.mark("rpc");

            if data.is_null() {
                return Ok(empty_response());
            }
        }

        let Some(template) = &route.template_path else {
            return Ok(empty_response());
        };

        let renderer = self.templates.get_template(template).await?;
        let html = renderer.render(&data)?;
        timing.mark("render");
        Ok(html_response(html))
    }

    async fn handle_pass_through(
        &self,
        request: HttpRequest,
        logger: &StructuredLogger,
    ) -> Result<HttpResponse, InterceptError> {
        let cached = if matches!(*request.method(), Method::GET | Method::HEAD) {
            self.match_cache(&request, logger).await
        } else {
            None
        };

        logger
            .debug_builder("pass-through request")
            .field("method", request.method().as_str())
            .field_bool("cached", cached.is_some())
            .emit();

        match cached {
            Some(response) => Ok(response),
            None => Ok(self.network.fetch(request).await?),
        }
    }

    /// A cache failure is treated as a miss.
    async fn match_cache(&self, request: &HttpRequest, logger: &StructuredLogger) -> Option<HttpResponse> {
        let url = self.scope.resolve(&request.uri().to_string()).ok()?;
        match self.cache.match_url(&url).await {
            Ok(found) => found,
            Err(e) => {
                logger
                    .warn_builder("cache lookup failed")
                    .field("url", url.to_string())
                    .field("error", e.to_string())
                    .emit();
                None
            }
        }
    }

    fn logger(&self, route: &str) -> StructuredLogger {
        StructuredLogger::new(RequestId::generate())
            .with_route(route)
            .with_min_level(self.log_level)
            .with_format(LogFormat::from(self.config.log_format))
    }
}
