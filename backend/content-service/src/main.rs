use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use chrono::Utc;
use content_service::config::{AuthConfig, StorageBackend};
use content_service::db::{MemoryStore, PgContentStore, PgPurchaseLedger, MIGRATOR};
use content_service::handlers::{self, AppState};
use content_service::middleware::MetricsMiddleware;
use crypto_core::JwtValidator;
use db_pool::{create_pool as create_pg_pool, DbConfig as DbPoolConfig};
use serde::Serialize;
use std::io;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct HealthState {
    db_pool: Option<sqlx::PgPool>,
    storage: StorageBackend,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    status: ComponentStatus,
    storage: StorageBackend,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
    timestamp: String,
}

impl HealthState {
    async fn check_postgres(&self) -> Result<(), sqlx::Error> {
        match &self.db_pool {
            Some(pool) => sqlx::query("SELECT 1").fetch_one(pool).await.map(|_| ()),
            None => Ok(()),
        }
    }
}

async fn health_summary(state: web::Data<HealthState>) -> HttpResponse {
    match state.check_postgres().await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "content-service",
            "storage": state.storage,
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("PostgreSQL connection failed: {}", e),
            "service": "content-service"
        })),
    }
}

async fn readiness_summary(state: web::Data<HealthState>) -> HttpResponse {
    let start = Instant::now();
    let result = state.check_postgres().await;
    let latency_ms = state
        .db_pool
        .as_ref()
        .map(|_| start.elapsed().as_millis() as u64);

    let (ready, message) = match result {
        Ok(_) => (true, "storage reachable".to_string()),
        Err(e) => (false, format!("PostgreSQL connection failed: {}", e)),
    };

    let response = ReadinessResponse {
        ready,
        status: if ready {
            ComponentStatus::Healthy
        } else {
            ComponentStatus::Unhealthy
        },
        storage: state.storage,
        message,
        latency_ms,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}

async fn shutdown_signal() -> io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
    }

    Ok(())
}

fn build_validator(auth: &AuthConfig) -> io::Result<Option<Arc<JwtValidator>>> {
    let validator = if let Some(pem) = &auth.jwt_public_key_pem {
        Some(JwtValidator::from_rsa_pem(pem))
    } else {
        auth.jwt_secret
            .as_ref()
            .map(|secret| JwtValidator::from_secret(secret.as_bytes()))
    };

    validator
        .transpose()
        .map(|v| v.map(Arc::new))
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Failed to initialize JWT validation: {e:#}"),
            )
        })
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Content Service
///
/// Serves the BlockTube content interaction and feed API.
///
/// # Routes
///
/// - `/api/v1/content/*` - Feed listing, single reads, owner CRUD, likes, comments, purchases
/// - `/api/v1/search` - Ranked search over published content
/// - `/api/v1/subscriptions` - The caller's purchases with renewal metadata
/// - `/api/v1/dashboard/*` - Creator stats and earnings
/// - `/api/v1/health*`, `/metrics` - Probes and Prometheus metrics
///
/// # Deployment
///
/// Listens on port 8081 by default (CONTENT_SERVICE_PORT). Storage is
/// PostgreSQL unless STORAGE_BACKEND=memory is set for local development.
#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    // Load configuration
    let config = match content_service::Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting content-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let validator = build_validator(&config.auth)?;
    if validator.is_none() {
        tracing::warn!(
            "JWT key not configured (JWT_PUBLIC_KEY_PEM / JWT_SECRET); authenticated routes will answer 401"
        );
    }

    let (state, db_pool) = match config.database.backend {
        StorageBackend::Postgres => {
            let mut db_cfg = DbPoolConfig::from_env("content-service", &config.database.url);
            if let Some(max_connections) = config.database.max_connections {
                db_cfg.max_connections = max_connections;
            }
            db_cfg.log_config();

            let pool = match create_pg_pool(db_cfg).await {
                Ok(pool) => pool,
                Err(e) => {
                    tracing::error!("Database pool creation failed: {:#}", e);
                    eprintln!("ERROR: Failed to create database pool: {}", e);
                    std::process::exit(1);
                }
            };

            if let Err(e) = MIGRATOR.run(&pool).await {
                tracing::error!("Database migration failed: {:#}", e);
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("Failed to run migrations: {e}"),
                ));
            }
            tracing::info!("Connected to database via db-pool crate, migrations applied");

            let state = AppState::new(
                Arc::new(PgContentStore::new(pool.clone())),
                Arc::new(PgPurchaseLedger::new(pool.clone())),
                config.feed.clone(),
            );
            (state, Some(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            let store = Arc::new(MemoryStore::new());
            (
                AppState::new(store.clone(), store, config.feed.clone()),
                None,
            )
        }
    };

    let app_state = web::Data::new(state);
    let health_state = web::Data::new(HealthState {
        db_pool: db_pool.clone(),
        storage: config.database.backend,
    });

    let http_bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", http_bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    let server = HttpServer::new(move || {
        // Build CORS configuration
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        let validator = validator.clone();
        App::new()
            .app_data(app_state.clone())
            .app_data(health_state.clone())
            .wrap(cors)
            .wrap(MetricsMiddleware)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route(
                "/metrics",
                web::get().to(content_service::metrics::serve_metrics),
            )
            // Health check endpoints
            .route("/api/v1/health", web::get().to(health_summary))
            .route("/api/v1/health/ready", web::get().to(readiness_summary))
            .route("/api/v1/health/live", web::get().to(liveness_check))
            .configure(move |cfg| handlers::configure(cfg, validator))
    })
    .bind(&http_bind_address)?
    .shutdown_timeout(30)
    .run();

    let server_handle = server.handle();
    let mut server_task = tokio::spawn(async move {
        tracing::info!("HTTP server is running");
        server.await
    });

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let result = tokio::select! {
        joined = &mut server_task => match joined {
            Ok(result) => result,
            Err(e) => Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
        },
        signal = &mut shutdown => {
            if let Err(e) = signal {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
            match server_task.await {
                Ok(result) => result,
                Err(e) => Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
            }
        }
    };

    if let Some(pool) = db_pool {
        pool.close().await;
    }
    tracing::info!("Content-service shutting down");
    result
}
