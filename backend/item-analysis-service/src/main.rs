//! Item Analysis Service - Main entry point

use actix_web::{middleware, web, App, HttpServer};
use anyhow::Result;
use item_analysis_service::{
    handlers, Config, CredentialSource, EnvCredentials, ExaSearchClient, GeminiClient, ItemAnalyzer,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing; LOG_FORMAT=json for structured output
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "item_analysis_service=debug,actix_web=info,info".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    info!(
        "Configuration loaded: model={}, precision_model={}, max_attempts={}, deadline={}s",
        config.gemini_model,
        config.gemini_precision_model,
        config.retry_max_attempts,
        config.analysis_deadline_secs
    );

    let credentials: Arc<dyn CredentialSource> = Arc::new(EnvCredentials);
    {
        let startup = credentials.load();
        if startup.gemini_api_key().is_none() {
            warn!("GEMINI_API_KEY is not set; analysis requests will fail until it is configured");
        }
        if startup.exa_api_key().is_none() {
            info!("EXA_API_KEY is not set; market enrichment disabled");
        }
    }

    let vision = Arc::new(GeminiClient::new(
        config.gemini_api_base.clone(),
        config.provider_timeout(),
    ));
    let market = Arc::new(ExaSearchClient::new(
        config.exa_api_base.clone(),
        config.provider_timeout(),
    ));
    let analyzer = web::Data::new(
        ItemAnalyzer::new(vision, config.analyzer_settings()).with_market_search(market),
    );

    let bind_address = format!("{}:{}", config.server_host, config.server_port);
    info!("Starting HTTP server on {}", bind_address);

    let config = web::Data::new(config);
    let credentials = web::Data::from(credentials);

    HttpServer::new(move || {
        App::new()
            .app_data(analyzer.clone())
            .app_data(credentials.clone())
            .app_data(config.clone())
            .wrap(middleware::Logger::default())
            .configure(handlers::configure)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    info!("Item analysis service stopped");
    Ok(())
}
