use smartbot_portal::{
    config::{get_config, init_config, LogFormat},
    middleware::cors::portal_cors,
    routes::{self, demo::DemoState},
    AppState,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

const INTERVIEW_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config();
    init_tracing(config.log_format);

    let app_state = AppState::new(config)?;
    app_state.interviews.spawn_sweeper(INTERVIEW_SWEEP_INTERVAL);
    let mut app = routes::portal_router(app_state);

    if config.demo_backend {
        info!(
            seeded = config.seed_test_data,
            "Serving the demo backend from this process"
        );
        let demo = DemoState::from_config(config).await?;
        app = app.merge(routes::demo::router(demo));
    } else {
        info!(backend = %config.backend_url, "Using remote recruitment backend");
    }

    let app = app
        .layer(portal_cors())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
