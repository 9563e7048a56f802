pub mod handlers;
pub mod types;

use crate::agent::Orchestrator;
use crate::extract::Extractor;
use crate::llm::{LlmClient, OpenAiClient};
use crate::los::{HttpLosClient, LosClient};
use crate::schema::SchemaRegistry;
use crate::store::ChatStore;
use crate::tools::ToolRegistry;
use crate::{Result, config::Config};
use axum::{
    Router,
    routing::{get, patch, post},
};
use handlers::AppState;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/chat",
            post(handlers::chat).delete(handlers::delete_chat),
        )
        .route("/api/reservation", patch(handlers::confirm_reservation))
        .route("/api/applications", get(handlers::search_applications))
        .route("/api/auth/sign-in", post(handlers::sign_in))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(config: Config) -> Result<()> {
    // Initialize chat store
    let db_path =
        std::env::var("CHAT_DB_PATH").unwrap_or_else(|_| config.server.database_path.clone());
    let store = Arc::new(ChatStore::new(&db_path).await?);

    // Wire the pipeline: one provider client, one schema registry, one tool
    // registry, all built here and passed by reference from now on.
    let llm: Arc<dyn LlmClient> = Arc::new(OpenAiClient::new(config.llm.clone()));
    let registry = Arc::new(SchemaRegistry::bootstrap());
    let extractor = Extractor::new(Arc::clone(&llm), registry);
    let los: Arc<dyn LosClient> = Arc::new(HttpLosClient::new(config.los.clone()));
    let tools = Arc::new(ToolRegistry::new(Arc::clone(&los), extractor));
    let orchestrator = Arc::new(Orchestrator::new(
        llm,
        tools,
        Arc::clone(&store),
        config.llm.system_prompt.clone(),
    ));

    let app_state = AppState {
        store,
        orchestrator,
        los,
    };

    let app = router(app_state);

    // Start server
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
