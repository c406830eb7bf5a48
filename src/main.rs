use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use exam_archive_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    middleware, routes, AppState,
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

    let report_api = Router::new()
        .route(
            "/api/report/quiz/:quiz_id",
            get(routes::report::report_view),
        )
        .route(
            "/api/report/quiz/:quiz_id/action",
            post(routes::report::perform_action),
        )
        .route(
            "/api/report/quiz/:quiz_id/files/:category/*path",
            get(routes::report::download_file),
        )
        .route(
            "/api/engine/attempts/:attempt_id/submitted",
            post(routes::engine::attempt_submitted),
        )
        .layer(axum::middleware::from_fn(
            middleware::auth::require_bearer_auth,
        ));

    let app = Router::new()
        .route("/health", get(routes::health::health))
        .merge(report_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
