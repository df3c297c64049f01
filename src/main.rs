use {
    axum::{
        Router,
        extract::DefaultBodyLimit,
        routing::{get, post},
    },
    pay_recon::{
        AppEnv, AppState,
        adapters::{api, provider_client::HttpProvider, rate_limit::PollLimiter},
        infra::postgres::store::PgStore,
    },
    sqlx::postgres::PgPoolOptions,
    std::{env, sync::Arc, time::Duration},
    tokio::signal,
    tower_http::timeout::TimeoutLayer,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let provider_base_url =
        env::var("PROVIDER_BASE_URL").expect("PROVIDER_BASE_URL must be set");
    let server_key = env::var("PROVIDER_SERVER_KEY").expect("PROVIDER_SERVER_KEY must be set");
    let provider_timeout = env::var("PROVIDER_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10u64);
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let app_env = AppEnv::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&database_url)
        .await
        .expect("failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");

    let provider = HttpProvider::new(
        provider_base_url,
        server_key.clone(),
        Duration::from_secs(provider_timeout),
    )
    .expect("failed to build provider client");

    let state = AppState {
        store: Arc::new(PgStore::new(pool)),
        provider: Arc::new(provider),
        poll_limiter: PollLimiter::new(Duration::from_secs(1)),
        server_key: server_key.into(),
        app_env,
    };

    let app = Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/transactions", post(api::create_transaction_handler))
        .route("/notifications", post(api::notification_handler))
        .route(
            "/transactions/{order_id}/status",
            get(api::status_handler),
        )
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(DefaultBodyLimit::max(64 * 1024)) // provider notifications are small
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();
    tracing::info!("listening on {bind_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl+c, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
