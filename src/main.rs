use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use std::io;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use weight_tracker::application::auth_service::AuthService;
use weight_tracker::application::service::TrackerService;
use weight_tracker::data::Repositories;
use weight_tracker::data::session_store::InMemorySessionStore;
use weight_tracker::infrastructure::config::{AppConfig, DEFAULT_SECRET_KEY};
use weight_tracker::infrastructure::logging::init_logging;
use weight_tracker::presentation::handlers::AppState;
use weight_tracker::presentation::middleware::{
    RequestIdMiddleware, SessionMiddleware, TimingMiddleware,
};
use weight_tracker::presentation::routes::configure;

#[tokio::main]
#[instrument]
async fn main() -> io::Result<()> {
    let config = AppConfig::from_env().map_err(io::Error::other)?;

    init_logging(config.log_level());
    info!(debug = config.debug, "Logging initialized");
    if config.secret_key == DEFAULT_SECRET_KEY {
        warn!("Using the built-in development SECRET_KEY; set SECRET_KEY in production");
    }

    info!(database = ?config.database, "Opening record store");
    let repositories = Repositories::open(&config.database).map_err(io::Error::other)?;
    info!("Record store ready");

    let sessions = Arc::new(InMemorySessionStore::new());
    let auth_service = Arc::new(AuthService::new(
        repositories.users.clone(),
        sessions,
        config.secret_key.clone(),
        config.session_ttl_secs,
    ));
    let tracker = TrackerService::new(repositories.users.clone(), repositories.records.clone());

    let state = web::Data::new(AppState {
        tracker,
        auth_service: auth_service.clone(),
    });
    info!("Application state initialized");

    let cors_origin = config.cors_origin.clone();
    let server = HttpServer::new(move || {
        tracing::trace!("Creating new application instance");
        let cors = match &cors_origin {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header()
                .supports_credentials(),
            None => Cors::default(),
        };

        App::new()
            .app_data(state.clone())
            .wrap(SessionMiddleware::new(auth_service.clone()))
            .wrap(cors)
            .wrap(TimingMiddleware)
            .wrap(RequestIdMiddleware)
            .configure(configure)
    });

    let bind_addr = format!("{}:{}", config.bind_address, config.port);
    info!(address = %bind_addr, "Binding server to address");
    let server = server.bind((config.bind_address.as_str(), config.port))?;

    info!(
        address = %bind_addr,
        routes = %"GET /health, GET|POST /auth/register, GET|POST /auth/login, GET /auth/logout, GET /, GET|POST /add_weight, GET|POST /set_goal, GET /weight_history, GET /bmi_history",
        "Starting HTTP server"
    );
    server.run().await
}
