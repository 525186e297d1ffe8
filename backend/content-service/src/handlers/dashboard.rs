use super::{ApiResponse, AppState};
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::services::DashboardService;
use actix_web::{web, HttpResponse};
use chrono::Utc;

/// GET /dashboard/stats
pub async fn stats(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse> {
    let service = DashboardService::new(state.store.clone(), state.ledger.clone());
    let stats = service.stats(&user.id).await?;

    Ok(ApiResponse::ok(stats))
}

/// GET /dashboard/earnings
pub async fn earnings(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse> {
    let service = DashboardService::new(state.store.clone(), state.ledger.clone());
    let report = service.earnings(&user.id, Utc::now()).await?;

    Ok(ApiResponse::ok(report))
}
