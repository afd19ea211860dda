use actix_cors::Cors;
use actix_files::{Files, NamedFile};
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;

mod ai;
mod auth;
mod config;
mod controllers;
mod db;
mod error;
mod gateway;
mod integrations;
mod middleware;
mod models;
mod services;
#[cfg(test)]
mod test_support;

use config::Config;
use db::Database;
use gateway::Gateway;
use services::Providers;

pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
    pub gateway: Arc<Gateway>,
    pub providers: Arc<Providers>,
}

/// SPA fallback handler - serves index.html for client-side routing
async fn spa_fallback(index: web::Data<PathBuf>) -> actix_web::Result<NamedFile> {
    Ok(NamedFile::open(index.get_ref())?)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = Database::new(&config.database_url).map_err(|e| {
        log::error!("Failed to initialize database: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;
    let db = Arc::new(db);

    log::info!("Initializing Gateway");
    let gateway = Arc::new(Gateway::new());

    log::info!("Using mock transcription, summarization, calendar and mail providers");
    let providers = Arc::new(Providers::mock());

    let frontend_dist = config.frontend_dist.clone();
    match &frontend_dist {
        Some(dist) => log::info!("Serving frontend from: {}", dist),
        None => log::info!("Frontend static file serving disabled"),
    }

    log::info!("Starting MeetAssist server on port {}", port);
    log::info!("WebSocket Gateway available at /ws");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        let mut app = App::new()
            .app_data(web::Data::new(AppState {
                db: Arc::clone(&db),
                config: config.clone(),
                gateway: Arc::clone(&gateway),
                providers: Arc::clone(&providers),
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::configure)
            // WebSocket Gateway route (same port as HTTP, required for single-port platforms)
            .route("/ws", web::get().to(gateway::actix_ws::ws_handler));

        // Serve static files only if frontend dist exists
        if let Some(dist) = &frontend_dist {
            app = app
                .app_data(web::Data::new(PathBuf::from(dist).join("index.html")))
                .service(
                    Files::new("/", dist.clone())
                        .index_file("index.html")
                        .default_handler(web::to(spa_fallback)),
                );
        }

        app
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
