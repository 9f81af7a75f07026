use crate::config::Config;
use crate::error::Result;
use crate::handlers::{
    delete_rate_limit, get_rate_limit, get_settings, health_check, not_found, readiness_check,
    AppState,
};
use crate::janitor;
use crate::middleware::{logging_middleware, rate_limit_middleware};
use crate::path_filter::PathFilter;
use crate::rate_limiter::RateLimiter;
use axum::routing::get;
use axum::{middleware, Router};
use std::future::IntoFuture;
use std::net::SocketAddr;
use tokio::signal;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the client-facing router with every route behind the rate limit gate.
pub fn create_app(limiter: RateLimiter, path_filter: PathFilter) -> Router {
    let state = AppState::new(limiter, path_filter);

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(logging_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    rate_limit_middleware,
                )),
        )
        .with_state(state)
}

/// Build the operator router for inspecting and clearing client windows.
///
/// Served on its own listener; it must not be reachable by rate limited clients.
pub fn create_admin_app(limiter: RateLimiter, path_filter: PathFilter) -> Router {
    let state = AppState::new(limiter, path_filter);

    Router::new()
        .route("/health", get(health_check))
        .route("/rate-limit", get(get_settings))
        .route("/rate-limit/:key", get(get_rate_limit).delete(delete_rate_limit))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(logging_middleware)),
        )
        .with_state(state)
}

pub struct Server {
    app: Router,
    admin_app: Router,
    limiter: RateLimiter,
    bind_addr: SocketAddr,
    admin_addr: SocketAddr,
    background_sweep: bool,
}

impl Server {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let limiter = RateLimiter::new(config.rate_limit());
        let path_filter = config.path_filter()?;
        let app = create_app(limiter.clone(), path_filter.clone());
        let admin_app = create_admin_app(limiter.clone(), path_filter);

        Ok(Self {
            app,
            admin_app,
            limiter,
            bind_addr: config.bind_addr,
            admin_addr: config.admin_addr,
            background_sweep: config.background_sweep,
        })
    }

    pub async fn run(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(self.bind_addr).await?;
        let admin_listener = tokio::net::TcpListener::bind(self.admin_addr).await?;

        let sweeper = self
            .background_sweep
            .then(|| janitor::spawn(self.limiter.clone()));

        tracing::info!("Gatekeeper listening on {}", self.bind_addr);
        tracing::info!("Admin endpoints listening on {}", self.admin_addr);
        tracing::info!(
            window_ms = self.limiter.config().window_ms,
            max_requests = self.limiter.config().max_requests,
            background_sweep = self.background_sweep,
            "Rate limiter configured"
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        });

        let public = axum::serve(listener, self.app)
            .with_graceful_shutdown(wait_for_shutdown(shutdown_rx.clone()))
            .into_future();
        let admin = axum::serve(admin_listener, self.admin_app)
            .with_graceful_shutdown(wait_for_shutdown(shutdown_rx))
            .into_future();

        let served = tokio::try_join!(public, admin);

        if let Some(sweeper) = sweeper {
            sweeper.abort();
        }

        served?;
        Ok(())
    }
}

async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    // an error means the signal task is gone, which only happens after it sent
    let _ = shutdown.wait_for(|stopping| *stopping).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}
