use axum::{
    routing::{get, patch, post},
    Router,
};
use leadhub_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    let base_routes = Router::new().route("/health", get(routes::health::health));

    // Meta requires the webhook group to answer fast and never 429.
    let webhook_api = Router::new().route(
        "/api/webhook/meta",
        get(routes::webhook::verify_webhook).post(routes::webhook::handle_webhook),
    );

    let dashboard_api = Router::new()
        .route("/api/messages/send", post(routes::messages::send_text))
        .route(
            "/api/messages/send-template",
            post(routes::messages::send_template),
        )
        .route(
            "/api/messages/send-media",
            post(routes::messages::send_media),
        )
        .route(
            "/api/messages/delete",
            post(routes::messages::delete_message),
        )
        .route("/api/templates", get(routes::messages::list_templates))
        .route("/api/leads", get(routes::leads::list_leads))
        .route(
            "/api/leads/:id/messages",
            get(routes::leads::get_lead_messages),
        )
        .route("/api/leads/:id/notes", patch(routes::leads::update_notes))
        .layer(axum::middleware::from_fn_with_state(
            leadhub_backend::middleware::rate_limit::ApiRateLimiter::new(config.api_rps),
            leadhub_backend::middleware::rate_limit::rps_middleware,
        ));

    let app = base_routes
        .merge(webhook_api)
        .merge(dashboard_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
