//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, metrics)
//! - Guard the check route with the admission filter
//! - Bind server to listener (plain TCP or TLS)
//! - Graceful shutdown on the lifecycle broadcast

use axum::{
    body::Body,
    http::{header::InvalidHeaderName, Request},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::http::handlers::{check_adult_status, health, not_found};
use crate::http::request::{request_id, MakeRequestUuidV4};
use crate::net::tls::load_tls_config;
use crate::observability::metrics;
use crate::resilience::CooldownGate;
use crate::resolver::UserResolver;
use crate::security::{admission_middleware, AdmissionFilter};
use crate::session::SessionManager;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionManager>,
    pub resolver: Arc<UserResolver>,
}

impl AppState {
    /// Wire the resolver to a session using the configured cooldown and page size.
    pub fn new(config: &RelayConfig, session: Arc<SessionManager>) -> Self {
        let cooldown = Arc::new(CooldownGate::from_config(&config.cooldown));
        let resolver = Arc::new(UserResolver::new(
            session.clone(),
            cooldown,
            config.upstream.search_page_size,
        ));
        Self { session, resolver }
    }
}

/// HTTP server for the relay.
pub struct RelayServer {
    router: Router,
    config: RelayConfig,
}

impl RelayServer {
    /// Create a new HTTP server around an (possibly not yet initialized) session.
    pub fn new(config: RelayConfig, session: Arc<SessionManager>) -> Result<Self, InvalidHeaderName> {
        let router = build_router(&config, AppState::new(&config, session))?;
        Ok(Self { router, config })
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run with TLS from the configured PEM files.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let tls = self.config.listener.tls.as_ref().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "listener.tls is not configured")
        })?;
        let rustls = load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path)).await?;

        let handle = axum_server::Handle::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            shutdown_handle.graceful_shutdown(Some(Duration::from_secs(10)));
        });

        tracing::info!(address = %addr, "HTTPS server starting");
        axum_server::bind_rustls(addr, rustls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// The fully layered router (used by in-process tests).
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Build the Axum router with all middleware layers.
///
/// No inbound timeout: a check parked at the cooldown gate must keep its
/// place, and VRChat calls are bounded by the client's own timeout.
pub fn build_router(config: &RelayConfig, state: AppState) -> Result<Router, InvalidHeaderName> {
    let admission = Arc::new(AdmissionFilter::from_config(&config.admission)?);

    let check_routes = Router::new()
        .route("/checkAdultStatus", get(check_adult_status).fallback(not_found))
        .route_layer(middleware::from_fn_with_state(admission, admission_middleware));

    Ok(Router::new()
        .route("/health", get(health).fallback(not_found))
        .merge(check_routes)
        .fallback(not_found)
        .with_state(state)
        .layer(middleware::from_fn(track_request))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4)))
}

/// Per-request metrics and a completion log line.
async fn track_request(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    // Unknown paths share one label to keep metric cardinality bounded
    let route = match req.uri().path() {
        known @ ("/health" | "/checkAdultStatus") => known.to_string(),
        _ => "other".to_string(),
    };
    let id = request_id(&req).to_string();

    let response = next.run(req).await;
    let status = response.status().as_u16();

    tracing::debug!(
        request_id = %id,
        route = %route,
        status,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );
    metrics::record_request(&route, status, start);

    response
}
