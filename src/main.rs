use std::sync::Arc;
use std::time::Duration;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod routes;
mod service;
mod store;
mod subjects;
mod utils;

use config::{Config, StoreBackend};
use db::{init_db, run_migrations};

use crate::docs::ApiDoc;
use crate::service::AttendanceService;
use crate::store::{AttendanceStore, MemoryAttendanceStore, MySqlAttendanceStore};
use crate::subjects::{MySqlSubjectDirectory, StaticSubjectDirectory, SubjectDirectory};
use crate::utils::subject_cache::CachedSubjectDirectory;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

/// Opens the configured record store and the subject directory that goes with it.
async fn open_backends(
    config: &Config,
) -> anyhow::Result<(Arc<dyn AttendanceStore>, Arc<dyn SubjectDirectory>)> {
    match config.store_backend {
        StoreBackend::MySql => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
            let pool = init_db(url, config.db_max_connections).await?;
            if config.run_migrations {
                run_migrations(&pool).await?;
                info!("Database migrations applied");
            }
            Ok((
                Arc::new(MySqlAttendanceStore::new(pool.clone())),
                Arc::new(MySqlSubjectDirectory::new(pool)),
            ))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory attendance store, records are lost on shutdown");
            Ok((
                Arc::new(MemoryAttendanceStore::new()),
                Arc::new(StaticSubjectDirectory::new(config.default_subjects.clone())),
            ))
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "attendance.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(backend = ?config.store_backend, "Server starting...");

    let (store, directory) = open_backends(&config).await?;
    let directory: Arc<dyn SubjectDirectory> = Arc::new(CachedSubjectDirectory::new(
        directory,
        Duration::from_secs(config.subject_cache_ttl_secs),
    ));
    let service = Data::new(AttendanceService::new(store, directory));

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();
    let app_service = service.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(app_service.clone())
            .app_data(Data::new(config_data.clone()))
            // Configure protected routes with auth + rate limiting
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(&server_addr)?
    .run()
    .await?;

    info!("Server stopped, closing store");
    service.shutdown().await;

    Ok(())
}
