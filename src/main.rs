mod api;
mod config;
mod database;
mod middleware;
mod models;
mod services;
mod state;
mod utils;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{Config, StoreBackend};
use crate::database::{DocumentStore, MemoryStore, MongoDB};
use crate::state::AppState;

fn io_error(e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
}

async fn connect_store(config: &Config) -> std::io::Result<Arc<dyn DocumentStore>> {
    match config.store_backend {
        StoreBackend::Mongo => {
            log::info!("📊 Database: {} / {}", config.database_url, config.database_name);
            let db = MongoDB::new(&config.database_url, &config.database_name)
                .await
                .map_err(io_error)?;
            log::info!("✅ MongoDB connected successfully");
            Ok(Arc::new(db))
        }
        StoreBackend::Memory => {
            log::warn!("⚠️  Using in-memory store, data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env();
    let bind_address = config.bind_address();

    log::info!("🚀 Starting SciWeb backend...");

    let store = connect_store(&config).await?;
    let state = AppState::new(store, config).map_err(io_error)?;
    let state_data = web::Data::new(state.clone());

    let static_dir = state.config.static_dir.clone();
    let serve_static = static_dir.is_dir();
    if !serve_static {
        log::warn!("⚠️  Static directory {} not found, /static disabled", static_dir.display());
    }

    log::info!("🌐 Server starting on {}", bind_address);
    log::info!("📚 Swagger UI available at: http://{}/swagger-ui/", bind_address);
    log::info!("📄 OpenAPI spec at: http://{}/api-docs/openapi.json", bind_address);

    let allowed_origins = state.config.allowed_origins.clone();

    HttpServer::new(move || {
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
                actix_web::http::header::CACHE_CONTROL,
            ])
            .expose_headers(vec![actix_web::http::header::CONTENT_TYPE])
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        let mut app = App::new()
            .app_data(state_data.clone())
            .wrap(cors)
            .wrap(middleware::ApiHeaders)
            .wrap(Logger::default())
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi));

        if serve_static {
            app = app.service(actix_files::Files::new("/static", &static_dir));
        }

        app.configure(api::configure)
    })
    .bind(bind_address)?
    .run()
    .await
}
