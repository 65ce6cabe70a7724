use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::infrastructure::config::Config;
use crate::{
    controllers::{
        generate::GenerationController,
        health::{self, HealthState},
        proposals::ProposalController,
        usage::UsageController,
    },
    domain::auth::IdentityVerifier,
    infrastructure::auth::{auth_middleware, request_id_middleware},
};

/// Build the application router. Shared by the binary and the e2e tests.
pub fn create_router(
    health_state: HealthState,
    identity: Arc<dyn IdentityVerifier>,
    generation_controller: Arc<GenerationController>,
    proposal_controller: Arc<ProposalController>,
    usage_controller: Arc<UsageController>,
) -> Router {
    // Generation route (credential optional, resolved inside the handler)
    let generation_routes = Router::new()
        .route("/api/generate", post(GenerationController::generate))
        .with_state(generation_controller);

    // Usage route (requires authentication)
    let usage_routes = Router::new()
        .route("/api/usage", get(UsageController::get_usage))
        .with_state(usage_controller)
        .layer(middleware::from_fn_with_state(
            identity.clone(),
            auth_middleware,
        ));

    // Saved proposal routes (require authentication)
    let proposal_routes = Router::new()
        .route(
            "/api/proposals",
            get(ProposalController::list_proposals).post(ProposalController::create_proposal),
        )
        .route(
            "/api/proposals/:proposalId",
            delete(ProposalController::delete_proposal),
        )
        .with_state(proposal_controller)
        .layer(middleware::from_fn_with_state(
            identity.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(health_state)
        .merge(generation_routes)
        .merge(usage_routes)
        .merge(proposal_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(request_id_middleware)),
        )
}

/// Start the HTTP server with all routes configured
pub async fn start_http_server(
    config: Arc<Config>,
    app: Router,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
