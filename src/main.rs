mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::{Config, KnowledgeConfig};
use crate::core::extractor::IdentityPolicy;
use crate::core::middleware;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::features::console::ConsoleSession;
use crate::features::knowledge::IngestionService;
use crate::features::legal_advisor::handlers::AskState;
use crate::features::legal_advisor::{routes as legal_advisor_routes, AnswerService};
use crate::features::rate_limits::{
    routes as rate_limits_routes, ActivityLog, ActivitySweeper, RateLimiter,
};
use crate::modules::agent::{GeminiAgent, LegalAgent};
use crate::modules::knowledge::{DisabledKnowledgeStore, HttpKnowledgeStore, KnowledgeStore};
use axum::extract::DefaultBodyLimit;
use axum::{middleware::from_fn, Extension, Router};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(Parser)]
#[command(name = "legal-advisor", version, about = "AI legal information assistant for Indian law")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Ask questions interactively in the terminal
    Chat,
    /// Ingest the legal documents into the knowledge store and exit
    Ingest {
        /// Ingest even if a previous run already did
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli, worker_threads))
}

async fn async_main(cli: Cli, worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    // Logs go to stderr so they never interleave with the chat transcript
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!("Configuration loaded successfully");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, worker_threads).await,
        Command::Chat => chat(config).await,
        Command::Ingest { force } => ingest(config, force).await,
    }
}

fn knowledge_store(config: &KnowledgeConfig) -> anyhow::Result<Arc<dyn KnowledgeStore>> {
    match &config.base_url {
        Some(base_url) => {
            let store = HttpKnowledgeStore::new(base_url, &config.collection)?;
            tracing::info!(
                "Knowledge store: {} (collection: {})",
                base_url,
                config.collection
            );
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("KNOWLEDGE_BASE_URL not set, answering without retrieved passages");
            Ok(Arc::new(DisabledKnowledgeStore))
        }
    }
}

fn legal_agent(
    config: &Config,
    knowledge: Arc<dyn KnowledgeStore>,
) -> anyhow::Result<Arc<dyn LegalAgent>> {
    let agent = GeminiAgent::new(&config.agent, knowledge, config.knowledge.search_limit)
        .map_err(|e| anyhow::anyhow!("Failed to initialize legal agent: {}", e))?;
    Ok(Arc::new(agent))
}

async fn ingest(config: Config, force: bool) -> anyhow::Result<()> {
    let store = knowledge_store(&config.knowledge)?;
    let service = IngestionService::new(
        store,
        config.knowledge.dir.clone(),
        config.knowledge.sources.clone(),
    );

    let outcome = service
        .ingest_once(force)
        .await
        .map_err(|e| anyhow::anyhow!("Knowledge ingestion failed: {}", e))?;
    tracing::info!("Ingestion finished: {:?}", outcome);

    Ok(())
}

async fn chat(config: Config) -> anyhow::Result<()> {
    let knowledge = knowledge_store(&config.knowledge)?;
    let agent = legal_agent(&config, knowledge)?;
    let answer_service = Arc::new(AnswerService::unthrottled(agent, config.agent.timeout));

    let session = ConsoleSession::new(answer_service);
    tracing::info!("Console session {} started", session.identity());

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    session.run(stdin, tokio::io::stdout()).await?;

    Ok(())
}

async fn serve(config: Config, worker_threads: usize) -> anyhow::Result<()> {
    // Log system info
    let available_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    tracing::info!(
        "System info: available_cpus={}, tokio_worker_threads={}, pid={}",
        available_cpus,
        worker_threads,
        std::process::id()
    );

    // Initialize collaborators
    let knowledge = knowledge_store(&config.knowledge)?;
    let agent = legal_agent(&config, Arc::clone(&knowledge))?;

    // Initialize Rate Limiter
    let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit, ActivityLog::new()));
    tracing::info!(
        "Rate limiter initialized ({} requests per {}s)",
        config.rate_limit.max_requests,
        config.rate_limit.window_seconds()
    );

    if let Some(every) = config.rate_limit.sweep_interval {
        let sweeper = ActivitySweeper::new(Arc::clone(&rate_limiter), every);
        tokio::spawn(async move {
            sweeper.run().await;
        });
        tracing::info!("Activity sweeper worker spawned");
    }

    // Initialize Answer Service
    let answer_service = Arc::new(AnswerService::new(
        agent,
        Arc::clone(&rate_limiter),
        config.agent.timeout,
    ));
    tracing::info!("Answer service initialized");

    if config.knowledge.ingest_on_startup {
        let ingestion = IngestionService::new(
            knowledge,
            config.knowledge.dir.clone(),
            config.knowledge.sources.clone(),
        );
        tokio::spawn(async move {
            if let Err(e) = ingestion.ingest_once(false).await {
                tracing::error!("Knowledge ingestion failed: {}", e);
            }
        });
        tracing::info!("Knowledge ingestion task spawned");
    }

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    // Build swagger router
    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(Arc::new(
                credentials,
            ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Simple health check endpoint
    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    // Public routes, keyed by caller address
    let public_routes = Router::new()
        .merge(legal_advisor_routes::routes(AskState {
            answer_service,
            errors_in_band: config.agent.errors_in_band,
        }))
        .merge(rate_limits_routes::routes(Arc::clone(&rate_limiter)));

    if config.app.trust_forwarded_for {
        tracing::info!("Client identity taken from X-Forwarded-For / X-Real-IP");
    }

    let app = Router::new()
        .merge(swagger)
        .merge(public_routes)
        .merge(health_route)
        .layer(DefaultBodyLimit::max(config.app.max_request_body_size))
        .layer(Extension(IdentityPolicy {
            trust_forwarded_for: config.app.trust_forwarded_for,
        }))
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nodelay(true)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
