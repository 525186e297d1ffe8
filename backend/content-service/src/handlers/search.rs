use super::{ApiResponse, AppState};
use crate::error::Result;
use crate::services::FeedService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// GET /search?q=
pub async fn search_content(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse> {
    let service = FeedService::new(state.store.clone(), state.feed.clone());
    let hits = service.search(&query.q).await?;

    Ok(ApiResponse::ok(hits))
}
