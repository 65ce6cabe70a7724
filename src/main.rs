use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use pitchbutter_backend::controllers::{
    generate::GenerationController, health::HealthState, proposals::ProposalController,
    usage::UsageController,
};
use pitchbutter_backend::domain::{
    auth::{IdentityVerifier, JwtIdentityVerifier, JwtManager},
    generation::GenerationService,
    proposals::ProposalService,
    quota::QuotaService,
};
use pitchbutter_backend::infrastructure::config::{Config, LogFormat};
use pitchbutter_backend::infrastructure::db::{check_connection, create_pool, run_migrations};
use pitchbutter_backend::infrastructure::http::{create_router, start_http_server};
use pitchbutter_backend::infrastructure::repositories::{
    GenerationRepository, MemoryRateLimitRepository, OpenAiGenerationRepository,
    PostgresProposalRepository, PostgresRevocationRepository, PostgresUsageRepository,
    RateLimitRepository, RedisRateLimitRepository,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting PitchButter Backend on {}:{}",
        config.host,
        config.port
    );

    // Create database connection pool
    let pool = create_pool(&config.database_url).await?;
    tracing::info!("Database connection pool created");

    // Verify database connection
    check_connection(&pool).await?;
    tracing::info!("Database connection verified");

    run_migrations(&pool).await?;
    tracing::info!("Database migrations applied");

    let pool = Arc::new(pool);
    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Instantiate repositories (inject db pool and external clients)
    tracing::info!("Instantiating repositories...");
    let usage_repo = Arc::new(PostgresUsageRepository::new(pool.clone()));
    let proposal_repo = Arc::new(PostgresProposalRepository::new(pool.clone()));
    let revocation_repo = Arc::new(PostgresRevocationRepository::new(pool.clone()));

    let rate_limiter: Arc<dyn RateLimitRepository> = match &config.redis_url {
        Some(redis_url) => {
            let limiter = RedisRateLimitRepository::connect(
                redis_url,
                config.visitor_limit,
                config.visitor_window(),
            )
            .await?;
            tracing::info!("Visitor rate limiter backed by Redis");
            Arc::new(limiter)
        }
        None => {
            if !config.is_development() {
                tracing::warn!(
                    "REDIS_URL not set. Visitor limits are enforced per instance only"
                );
            }
            Arc::new(MemoryRateLimitRepository::new(
                config.visitor_limit,
                config.visitor_window(),
            ))
        }
    };

    let generation_repo: Option<Arc<dyn GenerationRepository>> = match &config.openai_api_key {
        Some(api_key) => {
            tracing::info!(model = %config.openai_model, "OpenAI generation backend configured");
            Some(Arc::new(OpenAiGenerationRepository::from_api_key(
                api_key,
                config.openai_model.clone(),
            )))
        }
        None => {
            tracing::error!(
                "OPENAI_API_KEY not set. Generation requests will fail until it is provided"
            );
            None
        }
    };

    // 2. Instantiate services (inject repositories and clients)
    tracing::info!("Instantiating services...");
    let identity: Arc<dyn IdentityVerifier> = Arc::new(JwtIdentityVerifier::new(
        JwtManager::new(config.jwt_secret.clone(), config.jwt_issuer.clone()),
        revocation_repo,
    ));
    let generation_service = Arc::new(GenerationService::new(
        identity.clone(),
        usage_repo.clone(),
        rate_limiter,
        generation_repo,
        config.generation_max_tokens,
        config.generation_timeout(),
    ));
    let quota_service = Arc::new(QuotaService::new(usage_repo));
    let proposal_service = Arc::new(ProposalService::new(proposal_repo));

    // 3. Instantiate controllers (inject services)
    tracing::info!("Instantiating controllers...");
    let generation_controller = Arc::new(GenerationController::new(generation_service));
    let proposal_controller = Arc::new(ProposalController::new(proposal_service));
    let usage_controller = Arc::new(UsageController::new(quota_service));

    let health_state = HealthState {
        pool: pool.clone(),
        generation_configured: config.generation_configured(),
    };

    let app = create_router(
        health_state,
        identity,
        generation_controller,
        proposal_controller,
        usage_controller,
    );

    // Start HTTP server with all routes
    start_http_server(config, app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pitchbutter_backend=debug,tower_http=debug".into());

    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
