use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use genie_api::{
    config::Config,
    handlers::stream,
    middleware::logging,
    routes::{agents, documents, feedback, health, history, mcp_servers, prompts, threads},
    state::AppState,
};
use genie_graph::GraphClient;
use genie_llm::ModelFactory;
use genie_persist::PersistClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting Genie API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    // Model factory for local completions (title summarization)
    let models = ModelFactory::new(config.credentials());

    // Client for the external agent-graph engine
    tracing::info!("Graph engine at {}", config.engine.url);
    let graph = GraphClient::new(&config.engine.url);

    tracing::info!("Connecting to MongoDB");
    let persist = PersistClient::connect(&config.mongodb_uri, &config.mongodb.database).await?;
    tracing::info!("MongoDB connected");

    let state = AppState::new(config.clone(), persist, graph, models);

    let app = build_router(state.clone());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Streaming turn + history
        .route("/agent/stream", get(stream::send_turn_stream))
        .route("/agent/history/:thread_id", get(history::get_history))
        // Threads
        .route("/agent/threads", get(threads::list_threads))
        .route("/agent/threads", post(threads::create_thread))
        .route("/agent/threads", patch(threads::rename_thread))
        .route("/agent/threads", delete(threads::delete_thread))
        .route("/agent/threads/:id", get(threads::get_thread))
        // Feedback
        .route("/agent/feedback", get(feedback::get_feedback))
        .route("/agent/feedback", post(feedback::save_feedback))
        .route("/agent/feedback", delete(feedback::delete_feedback))
        // Agent definitions
        .route("/custom-agents", get(agents::list_agents))
        .route("/custom-agents", post(agents::create_agent))
        .route("/custom-agents/:id", get(agents::get_agent))
        .route("/custom-agents/:id", put(agents::update_agent))
        .route("/custom-agents/:id", delete(agents::delete_agent))
        // MCP server registrations
        .route("/mcp-servers", get(mcp_servers::list_servers))
        .route("/mcp-servers", post(mcp_servers::create_server))
        .route("/mcp-servers", patch(mcp_servers::update_server))
        .route("/mcp-servers", delete(mcp_servers::delete_server))
        // Prompts
        .route("/prompts", get(prompts::list_prompts))
        .route("/prompts", post(prompts::create_prompt))
        .route("/prompts/:id", put(prompts::update_prompt))
        .route("/prompts/:id", delete(prompts::delete_prompt))
        // Documents
        .route("/documents/:id", get(documents::get_document))
        .route("/documents/:id", delete(documents::delete_document));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes)
        .layer(middleware::from_fn(logging::log_request))
        .layer(TimeoutLayer::new(std::time::Duration::from_secs(300))) // 5 min for streaming
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.cors.enabled {
        let mut cors = CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::PATCH,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers(Any);

        if config.cors.origins.iter().any(|o| o == "*") {
            cors = cors.allow_origin(Any);
        } else {
            for origin in &config.cors.origins {
                if let Ok(parsed_origin) = origin.parse::<axum::http::HeaderValue>() {
                    cors = cors.allow_origin(parsed_origin);
                }
            }
        }

        cors
    } else {
        CorsLayer::permissive()
    }
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
