/// Content handlers - feed listing, single reads, owner CRUD and likes
use super::{ApiResponse, AppState};
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::{ContentDraft, ContentPatch, ContentType, CreatorInfo, SubscriptionTier};
use crate::services::{ContentService, FeedQuery, FeedService, InteractionService, Visibility};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListContentQuery {
    #[serde(rename = "type")]
    pub content_type: Option<ContentType>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub filter: Option<String>,
    pub user_id: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatorRequest {
    #[validate(length(max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 128))]
    pub wallet_id: Option<String>,
    #[validate(length(max = 1000))]
    pub bio: Option<String>,
    #[serde(default)]
    pub social_links: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateContentRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub content_type: ContentType,
    #[serde(rename = "contentURL")]
    #[validate(length(min = 1, max = 2048))]
    pub content_url: String,
    #[serde(rename = "thumbnailURL")]
    #[validate(length(max = 2048))]
    pub thumbnail_url: Option<String>,
    #[validate(nested)]
    pub creator: Option<CreatorRequest>,
    pub subscription_tier: Option<SubscriptionTier>,
    pub price: Option<f64>,
    pub categories: Option<Vec<String>>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContentRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub content_type: Option<ContentType>,
    #[serde(rename = "contentURL")]
    #[validate(length(min = 1, max = 2048))]
    pub content_url: Option<String>,
    #[serde(rename = "thumbnailURL")]
    #[validate(length(max = 2048))]
    pub thumbnail_url: Option<String>,
    pub subscription_tier: Option<SubscriptionTier>,
    pub price: Option<f64>,
    pub categories: Option<Vec<String>>,
    pub is_published: Option<bool>,
}

impl From<UpdateContentRequest> for ContentPatch {
    fn from(req: UpdateContentRequest) -> Self {
        ContentPatch {
            title: req.title,
            description: req.description,
            content_type: req.content_type,
            content_url: req.content_url,
            thumbnail_url: req.thumbnail_url,
            subscription_tier: req.subscription_tier,
            price: req.price,
            categories: req.categories,
            is_published: req.is_published,
        }
    }
}

/// Build the draft, snapshotting the creator profile from the request with
/// the caller's token profile as fallback.
fn draft_from_request(req: CreateContentRequest, user: &AuthUser) -> ContentDraft {
    let creator = req.creator.unwrap_or_default();
    let name = creator
        .name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| user.display_name());

    ContentDraft {
        title: req.title,
        description: req.description.unwrap_or_default(),
        content_type: req.content_type,
        content_url: req.content_url,
        thumbnail_url: req.thumbnail_url,
        creator: CreatorInfo {
            name,
            wallet_id: creator.wallet_id,
            bio: creator.bio,
            social_links: creator.social_links,
        },
        subscription_tier: req.subscription_tier.unwrap_or_default(),
        price: req.price.unwrap_or(0.0),
        categories: req.categories.unwrap_or_default(),
        is_published: req.is_published.unwrap_or(true),
    }
}

/// GET /content
pub async fn list_content(
    state: web::Data<AppState>,
    user: Option<AuthUser>,
    query: web::Query<ListContentQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let visibility = match query.filter.as_deref() {
        Some(raw) => raw.parse::<Visibility>()?,
        None => Visibility::default(),
    };

    let service = FeedService::new(state.store.clone(), state.feed.clone());
    let page = service
        .list_content(
            FeedQuery {
                content_type: query.content_type,
                owner_id: query.user_id,
                category: query.category,
                visibility,
                page: query.page,
                limit: query.limit,
            },
            user.as_ref().map(|u| u.id.as_str()),
        )
        .await?;

    Ok(ApiResponse::ok(page))
}

/// GET /content/{id}
pub async fn get_content(
    state: web::Data<AppState>,
    user: Option<AuthUser>,
    content_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = FeedService::new(state.store.clone(), state.feed.clone());
    let view = service
        .get_single_content(*content_id, user.as_ref().map(|u| u.id.as_str()))
        .await?;

    Ok(ApiResponse::ok(view))
}

/// POST /content
pub async fn create_content(
    state: web::Data<AppState>,
    user: AuthUser,
    req: web::Json<CreateContentRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    req.validate()?;

    let service = ContentService::new(state.store.clone());
    let item = service
        .create(&user.id, draft_from_request(req, &user))
        .await?;

    Ok(ApiResponse::created(item))
}

/// PUT /content/{id}
pub async fn update_content(
    state: web::Data<AppState>,
    user: AuthUser,
    content_id: web::Path<Uuid>,
    req: web::Json<UpdateContentRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    req.validate()?;

    let service = ContentService::new(state.store.clone());
    let item = service.update(*content_id, &user.id, req.into()).await?;

    Ok(ApiResponse::ok(item))
}

/// DELETE /content/{id}
pub async fn delete_content(
    state: web::Data<AppState>,
    user: AuthUser,
    content_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = ContentService::new(state.store.clone());
    service.delete(*content_id, &user.id).await?;

    Ok(ApiResponse::ok(json!({ "id": *content_id, "deleted": true })))
}

/// POST /content/{id}/like
pub async fn toggle_like(
    state: web::Data<AppState>,
    user: AuthUser,
    content_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = InteractionService::new(state.store.clone());
    let toggle = service.toggle_content_like(*content_id, &user.id).await?;

    Ok(ApiResponse::ok(toggle))
}
