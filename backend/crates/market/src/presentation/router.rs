//! Market Router

use auth::require_auth;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use platform::kv::SharedKv;
use platform::mail::SharedMailer;

use crate::domain::repository::SharedMarketRepository;
use crate::presentation::handlers::{self, MarketAppState};
use crate::presentation::live;

/// Item, bid, comment and location routes, to be nested under `/api`.
/// Reads are public; writes go through the auth gate.
pub fn market_router<R, K, M>(state: MarketAppState<R, K, M>) -> Router
where
    R: SharedMarketRepository,
    K: SharedKv,
    M: SharedMailer,
{
    let auth = middleware::from_fn_with_state(state.gate.clone(), require_auth::<K>);

    Router::new()
        .route(
            "/items",
            get(handlers::get_item::<R, K, M>).merge(
                post(handlers::create_item::<R, K, M>)
                    .put(handlers::update_item::<R, K, M>)
                    .patch(handlers::close_item::<R, K, M>)
                    .route_layer(auth.clone()),
            ),
        )
        .route("/items/live", get(live::live_items::<R, K, M>))
        .route("/items/location", get(live::location_items::<R, K, M>))
        .route(
            "/items/bid",
            post(handlers::place_bid::<R, K, M>)
                .get(handlers::get_bids::<R, K, M>)
                .route_layer(auth.clone()),
        )
        .route(
            "/comments",
            get(handlers::get_comment::<R, K, M>).merge(
                post(handlers::create_comment::<R, K, M>)
                    .put(handlers::update_comment::<R, K, M>)
                    .delete(handlers::delete_comment::<R, K, M>)
                    .route_layer(auth.clone()),
            ),
        )
        .route("/comments/item", get(handlers::item_comments::<R, K, M>))
        .route(
            "/comments/{comment_id}/reply",
            get(handlers::list_replies::<R, K, M>).merge(
                post(handlers::create_reply::<R, K, M>)
                    .put(handlers::update_reply::<R, K, M>)
                    .delete(handlers::delete_reply::<R, K, M>)
                    .route_layer(auth.clone()),
            ),
        )
        .route(
            "/locations",
            get(handlers::list_locations::<R, K, M>).merge(
                post(handlers::create_location::<R, K, M>)
                    .put(handlers::update_location::<R, K, M>)
                    .route_layer(auth),
            ),
        )
        .route("/locations/location", get(handlers::get_location::<R, K, M>))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use auth::application::token::open_session;
    use auth::infra::session_cache::SessionCache;
    use auth::{AuthConfig, AuthGate, SessionUser, TokenIssuer};
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use kernel::id::UserId;
    use platform::kv::MemoryKv;
    use platform::mail::MemoryMailer;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::application::MarketConfig;
    use crate::infra::MemoryMarketRepository;

    struct TestApp {
        router: Router,
        issuer: Arc<TokenIssuer>,
        sessions: SessionCache<MemoryKv>,
    }

    impl TestApp {
        fn new() -> Self {
            let kv = MemoryKv::new();
            let config = AuthConfig::development();
            let issuer = Arc::new(TokenIssuer::new(&config.signing_key, config.token_ttl));
            let sessions = SessionCache::new(kv.clone(), config.session_ttl);
            let gate = AuthGate::new(issuer.clone(), sessions.clone());
            let state = MarketAppState::new(
                MemoryMarketRepository::new(),
                kv,
                MemoryMailer::new(),
                MarketConfig::default(),
                gate,
            );
            Self {
                router: market_router(state),
                issuer,
                sessions,
            }
        }

        async fn token_for(&self, display_name: &str, active: bool) -> String {
            let user = SessionUser {
                user_id: UserId::new(),
                first_name: "Test".into(),
                last_name: "User".into(),
                display_name: display_name.into(),
                active,
                avatar: None,
                email: Some(format!("{display_name}@example.com")),
            };
            open_session(&self.issuer, &self.sessions, &user)
                .await
                .unwrap()
                .token
        }

        async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
            let res = self.router.clone().oneshot(req).await.unwrap();
            let status = res.status();
            let bytes = res.into_body().collect().await.unwrap().to_bytes();
            let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, body)
        }
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn seed_item(app: &TestApp, token: &str) -> (String, String) {
        let (status, location) = app
            .send(request(
                "POST",
                "/locations",
                Some(token),
                Some(json!({ "city": "Ikeja", "state": "Lagos", "country_code": "NG" })),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let location_id = location["id"].as_str().unwrap().to_string();

        let (status, item) = app
            .send(request(
                "POST",
                "/items",
                Some(token),
                Some(json!({
                    "name": "Standing fan",
                    "phone_no": "0803 000 0000",
                    "location_id": location_id,
                })),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        (item["id"].as_str().unwrap().to_string(), location_id)
    }

    #[tokio::test]
    async fn test_listing_lifecycle() {
        let app = TestApp::new();
        let seller = app.token_for("ada", true).await;
        let buyer = app.token_for("bob", true).await;
        let (item_id, _) = seed_item(&app, &seller).await;

        let (status, item) = app
            .send(request("GET", &format!("/items?id={item_id}"), None, None))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(item["display_name"], "ada");
        assert_eq!(item["location"]["city"], "IKEJA");
        assert!(item["location"].get("user_id").is_none());
        assert_eq!(item["comments"], json!([]));

        let (status, _) = app
            .send(request(
                "POST",
                &format!("/items/bid?id={item_id}"),
                Some(&buyer),
                Some(json!({ "message": "10000 naira" })),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app
            .send(request("GET", &format!("/items/bid?id={item_id}"), Some(&buyer), None))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, bids) = app
            .send(request("GET", &format!("/items/bid?id={item_id}"), Some(&seller), None))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bids["bids"]["bob"], "10000 naira");

        let (status, closed) = app
            .send(request("PATCH", &format!("/items?id={item_id}"), Some(&seller), None))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(closed["closed"], true);

        let (status, body) = app
            .send(request(
                "POST",
                &format!("/items/bid?id={item_id}"),
                Some(&buyer),
                Some(json!({ "message": "20000 naira" })),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Sorry item has been closed");
    }

    #[tokio::test]
    async fn test_comment_and_replies_over_http() {
        let app = TestApp::new();
        let ada = app.token_for("ada", true).await;
        let (item_id, _) = seed_item(&app, &ada).await;

        let (status, comment) = app
            .send(request(
                "POST",
                "/comments",
                Some(&ada),
                Some(json!({ "item_id": item_id, "comment": "Available" })),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let comment_id = comment["id"].as_str().unwrap().to_string();

        let (status, _) = app
            .send(request(
                "POST",
                &format!("/comments/{comment_id}/reply"),
                Some(&ada),
                Some(json!({ "reply": "Still available" })),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, thread) = app
            .send(request("GET", &format!("/comments?id={comment_id}"), None, None))
            .await;
        assert_eq!(thread["reply_count"], 1);
        assert_eq!(thread["replies"][0]["reply"], "Still available");

        let (_, comments) = app
            .send(request("GET", &format!("/comments/item?id={item_id}"), None, None))
            .await;
        assert_eq!(comments.as_array().map(Vec::len), Some(1));
        assert!(comments[0].get("replies").is_none());
    }

    #[tokio::test]
    async fn test_writes_require_a_token() {
        let app = TestApp::new();
        let (status, body) = app
            .send(request("POST", "/locations", None, Some(json!({}))))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Please supply a token");

        let (status, _) = app.send(request("GET", "/locations", None, None)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_inactive_account_is_forbidden() {
        let app = TestApp::new();
        let token = app.token_for("ada", false).await;
        let (status, body) = app
            .send(request(
                "POST",
                "/locations",
                Some(&token),
                Some(json!({ "city": "Ikeja", "state": "Lagos", "country_code": "NG" })),
            ))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Sorry your account isn't activated yet");
    }

    #[tokio::test]
    async fn test_malformed_and_unknown_ids() {
        let app = TestApp::new();
        let (status, _) = app.send(request("GET", "/items?id=nope", None, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .send(request(
                "GET",
                &format!("/items?id={}", kernel::id::ItemId::new()),
                None,
                None,
            ))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_location_update_rejects_unknown_fields() {
        let app = TestApp::new();
        let ada = app.token_for("ada", true).await;
        let (_, location_id) = seed_item(&app, &ada).await;

        let (status, _) = app
            .send(request(
                "PUT",
                &format!("/locations?id={location_id}"),
                Some(&ada),
                Some(json!({ "user_id": "someone-else" })),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, location) = app
            .send(request(
                "PUT",
                &format!("/locations?id={location_id}"),
                Some(&ada),
                Some(json!({ "city": "Yaba" })),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(location["city"], "YABA");
    }
}
