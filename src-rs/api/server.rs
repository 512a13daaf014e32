use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use tracing::info;

use crate::agent::Agent;
use crate::api::handlers::{handle_execute, handle_health, handle_invoke, handle_tools, AppState};

pub struct AgentServer {
    pub port: u16,
    pub state: AppState,
}

impl AgentServer {
    pub fn new(port: u16, agent: Agent) -> Self {
        Self {
            port,
            state: AppState::new(agent),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handle_health))
            .route("/tools", get(handle_tools))
            .route("/tools/:name/invoke", post(handle_invoke))
            .route("/execute", post(handle_execute))
            .with_state(self.state.clone())
    }

    pub async fn start(&self) -> Result<(), String> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!(%addr, "paylink-agent listening");
        axum::Server::bind(&addr)
            .serve(self.router().into_make_service())
            .await
            .map_err(|err| err.to_string())
    }
}
