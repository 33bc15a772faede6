mod common;

use std::sync::Arc;

use axum::http::{header, Method, Request, StatusCode};
use axum::body::Body;
use blog_api::{rest, AppState};
use chrono::{Duration, Utc};
use common::{request, seed_user, TestApp};
use serde_json::json;

#[tokio::test]
async fn missing_token_is_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app.call(request(Method::GET, "/api/posts", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Unauthorized"}));
}

#[tokio::test]
async fn every_reject_reason_looks_the_same() {
    let app = TestApp::new().await;
    let id = seed_user(&app.db, "Ada", "ada@example.com").await;

    let expired = app
        .tokens
        .issue_at(id, Utc::now() - Duration::days(31))
        .unwrap();
    let foreign = blog_api::auth::TokenCodec::new(Some("other"))
        .issue(id)
        .unwrap();
    let unknown_user = app.token_for(id + 100);

    for token in [expired.as_str(), foreign.as_str(), unknown_user.as_str(), "garbage"] {
        let (status, body) = app
            .call(request(Method::GET, "/api/users", Some(token), None))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "token {token}");
        assert_eq!(body, json!({"error": "Unauthorized"}));
    }
}

#[tokio::test]
async fn valid_cookie_passes_the_gate() {
    let app = TestApp::new().await;
    let id = seed_user(&app.db, "Ada", "ada@example.com").await;
    let token = app.token_for(id);

    let (status, body) = app
        .call(request(Method::GET, "/api/users", Some(&token), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["total"], 1);
}

#[tokio::test]
async fn bearer_header_is_accepted() {
    let app = TestApp::new().await;
    let id = seed_user(&app.db, "Ada", "ada@example.com").await;
    let token = app.token_for(id);

    let req = Request::builder()
        .uri("/api/categories")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.call(req).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn deleted_user_token_stops_working() {
    let app = TestApp::new().await;
    let id = seed_user(&app.db, "Ada", "ada@example.com").await;
    let token = app.token_for(id);

    let (status, _) = app
        .call(request(Method::DELETE, &format!("/api/users/{id}"), Some(&token), None))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call(request(Method::GET, "/api/users", Some(&token), None))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn public_routes_skip_the_gate() {
    let app = TestApp::new().await;
    let (status, _) = app
        .call(request(
            Method::POST,
            "/api/log-in",
            None,
            Some(json!({"email": "nobody@example.com", "password": "secret1"})),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sign_up_log_in_and_log_out() {
    let app = TestApp::new().await;

    let (status, body) = app
        .call(request(
            Method::POST,
            "/api/sign-up",
            None,
            Some(json!({"name": "Ada", "email": "ada@example.com", "password": "secret1"})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert!(body["user"].get("passwordHash").is_none());

    let (status, body) = app
        .call(request(
            Method::POST,
            "/api/sign-up",
            None,
            Some(json!({"name": "Ada", "email": "ada@example.com", "password": "secret1"})),
        ))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["validation"]["email"], "email already exists");

    let (status, _) = app
        .call(request(
            Method::POST,
            "/api/log-in",
            None,
            Some(json!({"email": "ada@example.com", "password": "wrong-password"})),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let response = app
        .send(request(
            Method::POST,
            "/api/log-in",
            None,
            Some(json!({"email": "ada@example.com", "password": "secret1"})),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("Authorization="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=2592000"));
    assert!(!cookie.contains("Secure"));

    let token = cookie
        .trim_start_matches("Authorization=")
        .split(';')
        .next()
        .unwrap()
        .to_string();
    let claims = app.tokens.verify(&token).unwrap();

    let response = app
        .send(request(Method::POST, "/api/log-out", Some(&token), None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cleared = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cleared.starts_with("Authorization=;"));
    assert!(cleared.contains("Max-Age=0"));

    let (status, body) = app
        .call(request(Method::GET, "/api/users", Some(&token), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["data"][0]["id"], claims.sub);
}

#[tokio::test]
async fn secure_cookie_is_configurable() {
    let db = common::test_pool().await;
    let app = rest::router(AppState::new(db, common::codec(), true));

    let response = tower::ServiceExt::oneshot(
        app.clone(),
        request(
            Method::POST,
            "/api/sign-up",
            None,
            Some(json!({"name": "Ada", "email": "ada@example.com", "password": "secret1"})),
        ),
    )
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = tower::ServiceExt::oneshot(
        app,
        request(
            Method::POST,
            "/api/log-in",
            None,
            Some(json!({"email": "ada@example.com", "password": "secret1"})),
        ),
    )
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.contains("; Secure"));
}

#[tokio::test]
async fn log_in_without_secret_fails_closed() {
    let db = common::test_pool().await;
    let state = AppState::with_user_lookup(
        db.clone(),
        blog_api::auth::TokenCodec::new(None),
        Arc::new(blog_api::db::SqliteStore::new(db.clone())),
        false,
    );
    let app = rest::router(state);

    let response = tower::ServiceExt::oneshot(
        app.clone(),
        request(
            Method::POST,
            "/api/sign-up",
            None,
            Some(json!({"name": "Ada", "email": "ada@example.com", "password": "secret1"})),
        ),
    )
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = tower::ServiceExt::oneshot(
        app,
        request(
            Method::POST,
            "/api/log-in",
            None,
            Some(json!({"email": "ada@example.com", "password": "secret1"})),
        ),
    )
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn stale_cookie_falls_back_to_bearer_header() {
    let app = TestApp::new().await;
    let id = seed_user(&app.db, "Ada", "ada@example.com").await;
    let token = app.token_for(id);

    let req = Request::builder()
        .uri("/api/users")
        .header(header::COOKIE, "Authorization=stale")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.call(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["total"], 1);

    let req = Request::builder()
        .uri("/api/users")
        .header(header::COOKIE, "Authorization=stale")
        .header(header::AUTHORIZATION, "Bearer also-stale")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.call(req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Unauthorized"}));
}
