//! HTTP API tests for content-service
//!
//! Coverage:
//! - Content CRUD ownership and the creator snapshot
//! - Like toggles (involution, concurrent callers)
//! - Comment add/delete permissions and counters
//! - Feed paging, drafts and search ranking
//! - Purchase ledger uniqueness and subscriptions
//! - Bearer token handling
//!
//! Every test runs against a fresh in-memory store.

mod common;

use actix_web::test;
use common::{
    bearer, bearer_named, create_content, get_content, init_app, read_json, state, video_body,
};
use serde_json::json;

// =============================================================================
// Authentication
// =============================================================================

#[actix_web::test]
async fn test_create_without_token_is_unauthorized() {
    let app = init_app(state()).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/content")
        .set_json(video_body("no token"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 401);
    let body = read_json(resp).await;
    assert_eq!(body["status"], "error");
}

#[actix_web::test]
async fn test_invalid_token_is_rejected() {
    let app = init_app(state()).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/content")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();

    match test::try_call_service(&app, req).await {
        Ok(resp) => assert_eq!(resp.status(), 401),
        Err(err) => assert_eq!(err.as_response_error().status_code(), 401),
    }
}

#[actix_web::test]
async fn test_anonymous_reads_are_allowed() {
    let app = init_app(state()).await;
    let id = create_content(&app, "alice", video_body("public")).await;

    let item = get_content(&app, &id).await;
    assert_eq!(item["title"], "public");
    assert_eq!(item["isLiked"], false);
}

// =============================================================================
// Content CRUD
// =============================================================================

#[actix_web::test]
async fn test_creator_snapshot_is_kept_verbatim() {
    let app = init_app(state()).await;
    let id = create_content(&app, "alice", video_body("snapshot")).await;

    let item = get_content(&app, &id).await;
    assert_eq!(item["ownerId"], "alice");
    assert_eq!(item["creator"]["name"], "Alice");
    assert_eq!(item["creator"]["walletId"], "0xabc");
    assert_eq!(item["contentURL"], "https://cdn.example.com/video.mp4");
}

#[actix_web::test]
async fn test_creator_name_falls_back_to_token_profile() {
    let app = init_app(state()).await;
    let mut body = video_body("anonymous creator");
    body.as_object_mut().unwrap().remove("creator");

    let id = create_content(&app, "bob", body).await;

    let item = get_content(&app, &id).await;
    assert_eq!(item["creator"]["name"], "bob name");
}

#[actix_web::test]
async fn test_creator_name_is_snapshotted_at_creation() {
    let app = init_app(state()).await;
    let unnamed = || {
        let mut body = video_body("renamed later");
        body["creator"] = json!({ "walletId": "0xabc" });
        body
    };

    let req = test::TestRequest::post()
        .uri("/api/v1/content")
        .insert_header(bearer_named("alice", "A1"))
        .set_json(unnamed())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let first = read_json(resp).await["data"]["id"]
        .as_str()
        .expect("id")
        .to_string();

    let req = test::TestRequest::post()
        .uri("/api/v1/content")
        .insert_header(bearer_named("alice", "A2"))
        .set_json(unnamed())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let second = read_json(resp).await["data"]["id"]
        .as_str()
        .expect("id")
        .to_string();

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/content/{}", first))
        .insert_header(bearer_named("alice", "A2"))
        .set_json(json!({ "title": "edited under new name" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    let item = get_content(&app, &first).await;
    assert_eq!(item["title"], "edited under new name");
    assert_eq!(item["creator"]["name"], "A1");
    assert_eq!(item["creator"]["walletId"], "0xabc");
    assert_eq!(get_content(&app, &second).await["creator"]["name"], "A2");
}

#[actix_web::test]
async fn test_paid_tier_without_price_is_rejected() {
    let app = init_app(state()).await;
    let mut body = video_body("premium");
    body["subscriptionTier"] = json!("premium");
    body["price"] = json!(0);

    let req = test::TestRequest::post()
        .uri("/api/v1/content")
        .insert_header(bearer("alice"))
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_only_owner_can_update_or_delete() {
    let app = init_app(state()).await;
    let id = create_content(&app, "alice", video_body("mine")).await;

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/content/{}", id))
        .insert_header(bearer("mallory"))
        .set_json(json!({ "title": "stolen" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/content/{}", id))
        .insert_header(bearer("mallory"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/content/{}", id))
        .insert_header(bearer("alice"))
        .set_json(json!({ "title": "renamed" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(read_json(resp).await["data"]["title"], "renamed");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/content/{}", id))
        .insert_header(bearer("alice"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/content/{}", id))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}

#[actix_web::test]
async fn test_malformed_id_is_not_found() {
    let app = init_app(state()).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/content/not-a-uuid")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}

#[actix_web::test]
async fn test_each_read_counts_one_view() {
    let app = init_app(state()).await;
    let id = create_content(&app, "alice", video_body("views")).await;

    let first = get_content(&app, &id).await;
    let second = get_content(&app, &id).await;
    let third = get_content(&app, &id).await;

    assert_eq!(first["views"], 1);
    assert_eq!(second["views"], 2);
    assert_eq!(third["views"], 3);
}

// =============================================================================
// Likes
// =============================================================================

#[actix_web::test]
async fn test_like_toggle_is_an_involution() {
    let app = init_app(state()).await;
    let id = create_content(&app, "alice", video_body("likeable")).await;

    let like = || {
        test::TestRequest::post()
            .uri(&format!("/api/v1/content/{}/like", id))
            .insert_header(bearer("bob"))
            .to_request()
    };

    let first = read_json(test::call_service(&app, like()).await).await;
    assert_eq!(first["data"], json!({ "isLiked": true, "likesCount": 1 }));

    let second = read_json(test::call_service(&app, like()).await).await;
    assert_eq!(second["data"], json!({ "isLiked": false, "likesCount": 0 }));

    let item = get_content(&app, &id).await;
    assert_eq!(item["likesCount"], 0);
    assert_eq!(item["likes"], json!([]));
}

#[actix_web::test]
async fn test_concurrent_likes_from_different_users_both_count() {
    let app = init_app(state()).await;
    let id = create_content(&app, "alice", video_body("popular")).await;

    let uri = format!("/api/v1/content/{}/like", id);
    let bob = test::TestRequest::post()
        .uri(&uri)
        .insert_header(bearer("bob"))
        .to_request();
    let carol = test::TestRequest::post()
        .uri(&uri)
        .insert_header(bearer("carol"))
        .to_request();

    let (a, b) = futures::join!(
        test::call_service(&app, bob),
        test::call_service(&app, carol)
    );
    assert_eq!(a.status(), 200);
    assert_eq!(b.status(), 200);

    let item = get_content(&app, &id).await;
    assert_eq!(item["likesCount"], 2);
    assert_eq!(item["likes"].as_array().map(Vec::len), Some(2));
}

#[actix_web::test]
async fn test_viewer_like_state_is_reported() {
    let app = init_app(state()).await;
    let id = create_content(&app, "alice", video_body("liked")).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/content/{}/like", id))
        .insert_header(bearer("bob"))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/content/{}", id))
        .insert_header(bearer("bob"))
        .to_request();
    let body = read_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["isLiked"], true);
}

// =============================================================================
// Comments
// =============================================================================

async fn add_comment<S>(app: &S, content_id: &str, user: &str, text: &str) -> String
where
    S: actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
{
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/content/{}/comments", content_id))
        .insert_header(bearer(user))
        .set_json(json!({ "text": text }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 201);
    read_json(resp).await["data"]["id"]
        .as_str()
        .expect("comment id")
        .to_string()
}

#[actix_web::test]
async fn test_stranger_cannot_delete_comment() {
    let app = init_app(state()).await;
    let id = create_content(&app, "alice", video_body("discussed")).await;
    let comment_id = add_comment(&app, &id, "bob", "first!").await;

    let req = test::TestRequest::delete()
        .uri(&format!(
            "/api/v1/content/{}/comments?commentId={}",
            id, comment_id
        ))
        .insert_header(bearer("mallory"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let item = get_content(&app, &id).await;
    assert_eq!(item["commentsCount"], 1);
}

#[actix_web::test]
async fn test_author_and_owner_can_delete_comments() {
    let app = init_app(state()).await;
    let id = create_content(&app, "alice", video_body("moderated")).await;
    let by_bob = add_comment(&app, &id, "bob", "hello").await;
    let by_carol = add_comment(&app, &id, "carol", "spam").await;

    for (user, comment_id) in [("bob", &by_bob), ("alice", &by_carol)] {
        let req = test::TestRequest::delete()
            .uri(&format!(
                "/api/v1/content/{}/comments?commentId={}",
                id, comment_id
            ))
            .insert_header(bearer(user))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);
    }

    let item = get_content(&app, &id).await;
    assert_eq!(item["commentsCount"], 0);
}

#[actix_web::test]
async fn test_comment_author_comes_from_token_and_list_is_newest_first() {
    let app = init_app(state()).await;
    let id = create_content(&app, "alice", video_body("thread")).await;
    add_comment(&app, &id, "bob", "older").await;
    add_comment(&app, &id, "carol", "newer").await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/content/{}/comments", id))
        .to_request();
    let body = read_json(test::call_service(&app, req).await).await;

    let items = body["data"]["items"].as_array().expect("items");
    assert_eq!(items[0]["text"], "newer");
    assert_eq!(items[0]["userName"], "carol name");
    assert_eq!(items[1]["userId"], "bob");
    assert_eq!(body["data"]["pagination"]["total"], 2);
}

#[actix_web::test]
async fn test_blank_comment_is_rejected() {
    let app = init_app(state()).await;
    let id = create_content(&app, "alice", video_body("quiet")).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/content/{}/comments", id))
        .insert_header(bearer("bob"))
        .set_json(json!({ "text": "   " }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);
}

#[actix_web::test]
async fn test_comment_like_toggles() {
    let app = init_app(state()).await;
    let id = create_content(&app, "alice", video_body("comment likes")).await;
    let comment_id = add_comment(&app, &id, "bob", "like me").await;

    let uri = format!("/api/v1/content/{}/comments/{}/like", id, comment_id);
    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(bearer("carol"))
        .to_request();
    let body = read_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"], json!({ "isLiked": true, "likesCount": 1 }));

    let item = get_content(&app, &id).await;
    assert_eq!(item["comments"][0]["likesCount"], 1);
}

// =============================================================================
// Feed and search
// =============================================================================

#[actix_web::test]
async fn test_feed_pages_newest_first() {
    let app = init_app(state()).await;
    for i in 0..25 {
        create_content(&app, "alice", video_body(&format!("video {}", i))).await;
    }

    let req = test::TestRequest::get()
        .uri("/api/v1/content?type=video&page=2&limit=10")
        .to_request();
    let body = read_json(test::call_service(&app, req).await).await;

    let items = body["data"]["items"].as_array().expect("items");
    assert_eq!(items.len(), 10);
    assert_eq!(items[0]["title"], "video 14");
    assert_eq!(items[9]["title"], "video 5");
    assert!(items[0].get("likes").is_none(), "summaries carry counters only");

    let pagination = &body["data"]["pagination"];
    assert_eq!(pagination["total"], 25);
    assert_eq!(pagination["pages"], 3);
    assert_eq!(pagination["hasMore"], true);

    let req = test::TestRequest::get()
        .uri("/api/v1/content?type=video&page=3&limit=10")
        .to_request();
    let body = read_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(5));
    assert_eq!(body["data"]["pagination"]["hasMore"], false);
}

#[actix_web::test]
async fn test_drafts_are_listed_only_for_their_owner() {
    let app = init_app(state()).await;
    let mut draft = video_body("work in progress");
    draft["isPublished"] = json!(false);
    create_content(&app, "alice", draft).await;
    create_content(&app, "alice", video_body("released")).await;

    let req = test::TestRequest::get().uri("/api/v1/content").to_request();
    let body = read_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["pagination"]["total"], 1);

    let req = test::TestRequest::get()
        .uri("/api/v1/content?filter=draft&userId=alice")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);

    let req = test::TestRequest::get()
        .uri("/api/v1/content?filter=draft&userId=alice")
        .insert_header(bearer("bob"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = test::TestRequest::get()
        .uri("/api/v1/content?filter=draft&userId=alice")
        .insert_header(bearer("alice"))
        .to_request();
    let body = read_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["items"][0]["title"], "work in progress");
}

#[actix_web::test]
async fn test_search_requires_query() {
    let app = init_app(state()).await;

    let req = test::TestRequest::get().uri("/api/v1/search?q=%20").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    let req = test::TestRequest::get().uri("/api/v1/search").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);
}

#[actix_web::test]
async fn test_search_ranks_title_matches_first_and_caps_results() {
    let app = init_app(state()).await;

    let mut described = video_body("unrelated");
    described["description"] = json!("all about solana");
    create_content(&app, "alice", described).await;
    create_content(&app, "alice", video_body("Solana deep dive")).await;
    for i in 0..12 {
        let mut body = video_body(&format!("filler {}", i));
        body["categories"] = json!(["solana"]);
        create_content(&app, "alice", body).await;
    }

    let req = test::TestRequest::get()
        .uri("/api/v1/search?q=SOLANA")
        .to_request();
    let body = read_json(test::call_service(&app, req).await).await;

    let hits = body["data"].as_array().expect("hits");
    assert_eq!(hits.len(), 10);
    assert_eq!(hits[0]["title"], "Solana deep dive");
    assert!(hits
        .windows(2)
        .all(|w| w[0]["score"].as_i64() >= w[1]["score"].as_i64()));
    assert!(hits.iter().all(|h| h["title"] != "unrelated"));
}

// =============================================================================
// Purchases and dashboard
// =============================================================================

fn premium_body(title: &str) -> serde_json::Value {
    let mut body = video_body(title);
    body["subscriptionTier"] = json!("premium");
    body["price"] = json!(2.5);
    body
}

#[actix_web::test]
async fn test_duplicate_purchase_conflicts() {
    let app = init_app(state()).await;
    let id = create_content(&app, "alice", premium_body("course")).await;

    let purchase = |hash: &str| {
        test::TestRequest::post()
            .uri("/api/v1/content/purchase")
            .insert_header(bearer("bob"))
            .set_json(json!({ "contentId": id, "transactionHash": hash }))
            .to_request()
    };

    let resp = test::call_service(&app, purchase("0xhash-1")).await;
    assert_eq!(resp.status(), 201);
    let body = read_json(resp).await;
    assert_eq!(body["data"]["amount"], 2.5);
    assert_eq!(body["data"]["creatorId"], "alice");
    assert_eq!(body["data"]["status"], "completed");

    let resp = test::call_service(&app, purchase("0xhash-2")).await;
    assert_eq!(resp.status(), 409);

    let req = test::TestRequest::get()
        .uri("/api/v1/subscriptions")
        .insert_header(bearer("bob"))
        .to_request();
    let body = read_json(test::call_service(&app, req).await).await;
    let subscriptions = body["data"].as_array().expect("subscriptions");
    assert_eq!(subscriptions.len(), 1);
    assert_eq!(subscriptions[0]["isActive"], true);
    assert_eq!(subscriptions[0]["content"]["title"], "course");
}

#[actix_web::test]
async fn test_purchase_status_reflects_ledger() {
    let app = init_app(state()).await;
    let id = create_content(&app, "alice", premium_body("gated")).await;

    let status = || {
        test::TestRequest::get()
            .uri(&format!("/api/v1/content/purchase/{}", id))
            .insert_header(bearer("bob"))
            .to_request()
    };

    let body = read_json(test::call_service(&app, status()).await).await;
    assert_eq!(body["data"]["hasPurchased"], false);

    let req = test::TestRequest::post()
        .uri("/api/v1/content/purchase")
        .insert_header(bearer("bob"))
        .set_json(json!({ "contentId": id, "transactionHash": "0xfeed" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    let body = read_json(test::call_service(&app, status()).await).await;
    assert_eq!(body["data"]["hasPurchased"], true);
    assert_eq!(body["data"]["purchase"]["transactionHash"], "0xfeed");
}

#[actix_web::test]
async fn test_purchase_of_missing_content_is_not_found() {
    let app = init_app(state()).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/content/purchase")
        .insert_header(bearer("bob"))
        .set_json(json!({
            "contentId": uuid::Uuid::new_v4(),
            "transactionHash": "0xdead"
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}

#[actix_web::test]
async fn test_dashboard_totals_follow_sales() {
    let app = init_app(state()).await;
    let first = create_content(&app, "alice", premium_body("one")).await;
    let second = create_content(&app, "alice", premium_body("two")).await;

    for (buyer, id, hash) in [("bob", &first, "0x1"), ("carol", &second, "0x2")] {
        let req = test::TestRequest::post()
            .uri("/api/v1/content/purchase")
            .insert_header(bearer(buyer))
            .set_json(json!({ "contentId": id, "transactionHash": hash }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 201);
    }

    let req = test::TestRequest::get()
        .uri("/api/v1/dashboard/stats")
        .insert_header(bearer("alice"))
        .to_request();
    let body = read_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["totalContent"], 2);
    assert_eq!(body["data"]["totalSales"], 2);
    assert_eq!(body["data"]["totalEarnings"], 5.0);

    let req = test::TestRequest::get()
        .uri("/api/v1/dashboard/earnings")
        .insert_header(bearer("alice"))
        .to_request();
    let body = read_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["lifetime"]["sales"], 2);
    assert_eq!(body["data"]["byContent"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["data"]["recentSales"].as_array().map(Vec::len), Some(2));
}
