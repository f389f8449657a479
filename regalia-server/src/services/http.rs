use crate::core::{Config, ServerState};
use axum::{Router, middleware};
use std::net::SocketAddr;
use std::time::Instant;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;

/// HTTP 请求日志中间件
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis();

    tracing::info!(target: "http_access", "{} {} {} {}ms", method, uri, status, elapsed_ms);

    response
}

/// Build the Axum router (without state)
pub fn build_app() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(crate::api::health::router())
        // Catalog read model
        .merge(crate::api::filters::router())
        // Admin catalog APIs
        .merge(crate::api::taxonomy::router())
        .merge(crate::api::products::router())
        .merge(crate::api::admin::router())
}

/// Router bound to state with the tower-http layers applied
pub fn build_router(state: ServerState) -> Router {
    build_app()
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(log_request))
}

#[derive(Clone, Debug)]
pub struct HttpService {
    config: Config,
}

impl HttpService {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Serve until `shutdown_signal` resolves, then drain for `shutdown_timeout`
    pub async fn start_server<F>(
        &self,
        state: ServerState,
        shutdown_signal: F,
    ) -> Result<(), crate::utils::AppError>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let app = build_router(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        tracing::info!("Starting HTTP server on {}", addr);

        let handle = axum_server::Handle::new();

        let handle_clone = handle.clone();
        let grace = self.config.shutdown_timeout();
        tokio::spawn(async move {
            shutdown_signal.await;
            handle_clone.graceful_shutdown(Some(grace));
        });

        axum_server::bind(addr)
            .handle(handle)
            .serve(app.into_make_service())
            .await
            .map_err(|e| crate::utils::AppError::internal(format!("Server error: {}", e)))?;

        Ok(())
    }
}
