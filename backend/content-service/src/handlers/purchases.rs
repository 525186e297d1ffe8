/// Purchase handlers - ledger writes, purchase checks and subscriptions
use super::{ApiResponse, AppState};
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::services::PurchaseService;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordPurchaseRequest {
    pub content_id: Uuid,
    #[validate(length(min = 1, max = 256))]
    pub transaction_hash: String,
}

fn service(state: &AppState) -> PurchaseService {
    PurchaseService::new(state.store.clone(), state.ledger.clone())
}

/// POST /content/purchase
pub async fn record_purchase(
    state: web::Data<AppState>,
    user: AuthUser,
    req: web::Json<RecordPurchaseRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let purchase = service(&state)
        .record_purchase(&user.id, req.content_id, &req.transaction_hash)
        .await?;

    Ok(ApiResponse::created(purchase))
}

/// GET /content/purchase/{content_id}
pub async fn purchase_status(
    state: web::Data<AppState>,
    user: AuthUser,
    content_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let status = service(&state).check_status(&user.id, *content_id).await?;
    Ok(ApiResponse::ok(status))
}

/// GET /subscriptions
pub async fn list_subscriptions(
    state: web::Data<AppState>,
    user: AuthUser,
) -> Result<HttpResponse> {
    let subscriptions = service(&state)
        .list_subscriptions(&user.id, Utc::now())
        .await?;

    Ok(ApiResponse::ok(subscriptions))
}
