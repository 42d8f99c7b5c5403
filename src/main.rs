use roomie::config::{LoggingSettings, Settings};
use roomie::core::{GeoScopeResolver, GestureConfig, MatchingSession};
use roomie::engine::{EngineNotice, MatchingEngine};
use roomie::models::Credential;
use roomie::services::{ApiClient, GeocodingClient};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if settings.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match std::env::var("ROOMIE_CONFIG") {
        Ok(path) => Settings::load_from(path)?,
        Err(_) => Settings::load()?,
    };
    init_logging(&settings.logging);

    info!("Starting Roomie matching session...");

    let credential = match std::env::var("ROOMIE_TOKEN") {
        Ok(token) => Credential::new(token),
        Err(_) => {
            error!("ROOMIE_TOKEN is not set");
            return Err("missing ROOMIE_TOKEN".into());
        }
    };

    let api = Arc::new(ApiClient::from_settings(&settings.api));
    let geocoder = Arc::new(GeocodingClient::from_settings(&settings.geocoding));
    info!("Backend at {}", settings.api.base_url);

    let session = MatchingSession::new(GestureConfig::from(&settings.gesture));
    let resolver = GeoScopeResolver::new(Arc::clone(&api), geocoder);
    let mut engine = MatchingEngine::new(
        session,
        Arc::clone(&api),
        resolver,
        credential,
        settings.matching.radius_km,
    );

    let mut notices = engine.subscribe();
    engine.load_default_scope();
    engine.refresh_matches();
    engine.run_until_idle().await;

    while let Ok(notice) = notices.try_recv() {
        if let EngineNotice::Matched(signal) = notice {
            info!("Matched with {}", signal.counterpart_name);
        }
    }
    for signal in engine.take_undelivered_matches() {
        info!("Matched with {}", signal.counterpart_name);
    }

    let session = engine.session();
    if session.needs_location() {
        warn!("Profile has no location; pick a city and district to start");
    }
    if let Some(error) = session.current_error() {
        error!("Session error: {}", error);
    }

    match session.scope() {
        Some(scope) => info!(
            "{} candidates around {} (radius {} km), {} matches",
            session.queue().len(),
            scope.label,
            settings.matching.radius_km,
            session.matches().len()
        ),
        None => info!("No active scope"),
    }

    for slot in session.visible_stack() {
        info!(
            "[{}] {} ({}% compatible, {:?})",
            slot.depth,
            slot.candidate.name(),
            slot.candidate.compatibility_score,
            slot.candidate.compatibility_tier()
        );
    }

    Ok(())
}
