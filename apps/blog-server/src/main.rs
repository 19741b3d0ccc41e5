//! # Inkwell Blog Server
//!
//! The Actix-web entry point: categories, posts, moderation and search.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

mod config;
mod handlers;
mod middleware;
mod observability;
mod services;
mod state;
mod telemetry;

use config::AppConfig;
use observability::RequestIdMiddleware;
use state::AppState;
use telemetry::TelemetryConfig;

#[cfg(feature = "rate-limit")]
fn build_rate_limiter(
    config: &AppConfig,
) -> anyhow::Result<Option<std::sync::Arc<dyn inkwell_core::ports::RateLimiter>>> {
    use inkwell_infra::{InMemoryRateLimiter, RateLimitConfig};

    let Some(settings) = &config.rate_limit else {
        return Ok(None);
    };
    let limiter = InMemoryRateLimiter::new(RateLimitConfig {
        max_requests: settings.max_requests,
        window: settings.window,
    })?;
    tracing::info!(
        max_requests = settings.max_requests,
        window_secs = settings.window.as_secs(),
        "Rate limiting enabled"
    );
    Ok(Some(std::sync::Arc::new(limiter)))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let telemetry = TelemetryConfig::from_env();
    telemetry::init_telemetry(&telemetry);

    let config = AppConfig::from_env()?;
    tracing::info!(
        service = %telemetry.service_name,
        "Starting Inkwell blog server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::new(&config).await?;
    services::search::reindex(&state).await?;

    #[cfg(feature = "rate-limit")]
    let limiter = build_rate_limiter(&config)?;
    #[cfg(not(feature = "rate-limit"))]
    if config.rate_limit.is_some() {
        tracing::warn!("RATE_LIMIT_ENABLED is set but the rate-limit feature is disabled");
    }

    let data = web::Data::new(state);
    HttpServer::new(move || {
        let app = App::new().app_data(data.clone());
        #[cfg(feature = "rate-limit")]
        let app = app.wrap(middleware::rate_limit::RateLimitMiddleware::new(
            limiter.clone(),
        ));
        app.wrap(RequestIdMiddleware)
            .wrap(TracingLogger::default())
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
