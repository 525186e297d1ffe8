/// Comment handlers - HTTP endpoints for comment operations
use super::{ApiResponse, AppState};
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::PageRequest;
use crate::services::{CommentAuthor, InteractionService};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct CommentPageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddCommentRequest {
    #[validate(length(max = 4000))]
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCommentQuery {
    pub comment_id: Uuid,
}

/// GET /content/{id}/comments
pub async fn list_comments(
    state: web::Data<AppState>,
    content_id: web::Path<Uuid>,
    query: web::Query<CommentPageQuery>,
) -> Result<HttpResponse> {
    let page = PageRequest::resolve(
        query.page,
        Some(query.limit.unwrap_or(state.feed.default_page_size)),
        state.feed.max_page_size,
    )?;

    let service = InteractionService::new(state.store.clone());
    let comments = service.list_comments(*content_id, page).await?;

    Ok(ApiResponse::ok(comments))
}

/// POST /content/{id}/comments
pub async fn add_comment(
    state: web::Data<AppState>,
    user: AuthUser,
    content_id: web::Path<Uuid>,
    req: web::Json<AddCommentRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let author = CommentAuthor {
        name: user.display_name(),
        image: user.picture.clone(),
        user_id: user.id,
    };

    let service = InteractionService::new(state.store.clone());
    let comment = service.add_comment(*content_id, author, &req.text).await?;

    Ok(ApiResponse::created(comment))
}

/// DELETE /content/{id}/comments?commentId=
pub async fn delete_comment(
    state: web::Data<AppState>,
    user: AuthUser,
    content_id: web::Path<Uuid>,
    query: web::Query<DeleteCommentQuery>,
) -> Result<HttpResponse> {
    let service = InteractionService::new(state.store.clone());
    service
        .delete_comment(*content_id, query.comment_id, &user.id)
        .await?;

    Ok(ApiResponse::ok(json!({ "commentId": query.comment_id, "deleted": true })))
}

/// POST /content/{id}/comments/{comment_id}/like
pub async fn toggle_comment_like(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let (content_id, comment_id) = path.into_inner();

    let service = InteractionService::new(state.store.clone());
    let toggle = service
        .toggle_comment_like(content_id, comment_id, &user.id)
        .await?;

    Ok(ApiResponse::ok(toggle))
}
