mod api;
mod config;
mod domain;
mod error;
mod services;
mod state;
mod web;

use crate::config::Config;
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn cors(config: &Config) -> anyhow::Result<CorsLayer> {
    let Some(origin) = config.cors_origin.as_deref() else {
        return Ok(CorsLayer::new());
    };
    Ok(CorsLayer::new()
        .allow_origin(HeaderValue::from_str(origin)?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!("Using CesiZen API at {}", config.api_base_url);
    if config.secure_cookies {
        tracing::info!("Session cookies are marked Secure");
    }

    let cors = cors(&config)?;
    let addr = config.bind_addr.clone();
    let shared = state::AppState::new(config);

    let app = Router::new().merge(web::routes(shared)).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new())
            .layer(cors),
    );

    tracing::info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
