//! Server Implementation
//!
//! HTTP 服务器启动和管理

use crate::core::{Config, Result, ServerError, ServerState};
use crate::services::HttpService;

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> Result<()> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config).await?,
        };

        let tasks = state.start_background_tasks();

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        tracing::info!("Regalia catalog server starting on {}", addr);

        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        };

        let served = HttpService::new(self.config.clone())
            .start_server(state, shutdown)
            .await
            .map_err(|e| ServerError::Internal(anyhow::anyhow!(e.message)));

        tasks.shutdown().await;
        served
    }
}
