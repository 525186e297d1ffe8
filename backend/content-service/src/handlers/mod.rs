/// HTTP handlers for content-service endpoints
///
/// This module contains handlers for:
/// - Content: feed listing, single reads, owner CRUD, likes
/// - Comments: list, add, delete, comment likes
/// - Search: ranked published-content search
/// - Purchases: ledger writes, purchase checks, subscriptions
/// - Dashboard: creator stats and earnings
///
/// Every route lives under `/api/v1` behind [`IdentityMiddleware`].
pub mod comments;
pub mod content;
pub mod dashboard;
pub mod purchases;
pub mod response;
pub mod search;

pub use response::ApiResponse;

use crate::config::FeedConfig;
use crate::db::{ContentStore, MemoryStore, PurchaseLedger};
use crate::error::AppError;
use crate::middleware::IdentityMiddleware;
use actix_web::web;
use crypto_core::JwtValidator;
use std::sync::Arc;

/// Shared handler state; services are built per request from these handles.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub ledger: Arc<dyn PurchaseLedger>,
    pub feed: FeedConfig,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ContentStore>,
        ledger: Arc<dyn PurchaseLedger>,
        feed: FeedConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            feed,
        }
    }

    /// State backed by one process-local [`MemoryStore`]
    pub fn in_memory(feed: FeedConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(store.clone(), store, feed)
    }
}

const JSON_BODY_LIMIT: usize = 256 * 1024;

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_BODY_LIMIT)
        .error_handler(|err, _req| {
            AppError::InvalidInput(format!("invalid JSON body: {}", err)).into()
        })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::InvalidInput(format!("invalid query: {}", err)).into())
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req| AppError::NotFound(format!("no such resource: {}", err)).into())
}

/// Register the `/api/v1` API. `validator` is `None` when no token key is
/// configured; every authenticated route then answers 401.
pub fn configure(cfg: &mut web::ServiceConfig, validator: Option<Arc<JwtValidator>>) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .service(
            web::scope("/api/v1")
                .wrap(IdentityMiddleware::new(validator))
                .configure(routes),
        );
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/content")
            .route(web::get().to(content::list_content))
            .route(web::post().to(content::create_content)),
    )
    // Registered before `/content/{id}` so "purchase" is never read as an id.
    .service(web::resource("/content/purchase").route(web::post().to(purchases::record_purchase)))
    .service(
        web::resource("/content/purchase/{content_id}")
            .route(web::get().to(purchases::purchase_status)),
    )
    .service(
        web::resource("/content/{id}")
            .route(web::get().to(content::get_content))
            .route(web::put().to(content::update_content))
            .route(web::delete().to(content::delete_content)),
    )
    .service(web::resource("/content/{id}/like").route(web::post().to(content::toggle_like)))
    .service(
        web::resource("/content/{id}/comments")
            .route(web::get().to(comments::list_comments))
            .route(web::post().to(comments::add_comment))
            .route(web::delete().to(comments::delete_comment)),
    )
    .service(
        web::resource("/content/{id}/comments/{comment_id}/like")
            .route(web::post().to(comments::toggle_comment_like)),
    )
    .route("/search", web::get().to(search::search_content))
    .route("/subscriptions", web::get().to(purchases::list_subscriptions))
    .route("/dashboard/stats", web::get().to(dashboard::stats))
    .route("/dashboard/earnings", web::get().to(dashboard::earnings));
}
