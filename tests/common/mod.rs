#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, Response, StatusCode},
    Router,
};
use blog_api::{auth::TokenCodec, db::UserLookup, models::user::Identity, rest, AppState};
use serde_json::Value;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tower::ServiceExt;

pub const SECRET: &str = "test-secret";

/// One connection so every query sees the same in-memory database.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    blog_api::db::migrate(&pool).await.expect("migrations");
    pool
}

pub fn codec() -> TokenCodec {
    TokenCodec::new(Some(SECRET))
}

pub struct TestApp {
    pub db: SqlitePool,
    pub router: Router,
    pub tokens: TokenCodec,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = test_pool().await;
        let tokens = codec();
        let router = rest::router(AppState::new(db.clone(), tokens.clone(), false));
        Self { db, router, tokens }
    }

    pub fn token_for(&self, user_id: i64) -> String {
        self.tokens.issue(user_id).expect("issue token")
    }

    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.expect("router is infallible")
    }

    /// Sends `req` and decodes the JSON body (Null when empty).
    pub async fn call(&self, req: Request<Body>) -> (StatusCode, Value) {
        let response = self.send(req).await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("Authorization={token}"));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub async fn seed_user(db: &SqlitePool, name: &str, email: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO users (name, email, password_hash) VALUES (?, ?, 'x') RETURNING id")
        .bind(name)
        .bind(email)
        .fetch_one(db)
        .await
        .expect("seed user")
}

pub async fn seed_category(db: &SqlitePool, name: &str, slug: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO categories (name, slug) VALUES (?, ?) RETURNING id")
        .bind(name)
        .bind(slug)
        .fetch_one(db)
        .await
        .expect("seed category")
}

pub async fn seed_post(db: &SqlitePool, user_id: i64, category_id: i64, title: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO posts (title, body, user_id, category_id) VALUES (?, 'body', ?, ?) RETURNING id",
    )
    .bind(title)
    .bind(user_id)
    .bind(category_id)
    .fetch_one(db)
    .await
    .expect("seed post")
}

/// In-memory user lookup standing in for the database.
#[derive(Default, Clone)]
pub struct MockUsers {
    users: Arc<Mutex<HashMap<i64, Identity>>>,
    failing: Arc<Mutex<bool>>,
}

impl MockUsers {
    pub fn insert(&self, identity: Identity) {
        self.users.lock().unwrap().insert(identity.id, identity);
    }

    pub fn remove(&self, id: i64) {
        self.users.lock().unwrap().remove(&id);
    }

    pub fn fail_lookups(&self) {
        *self.failing.lock().unwrap() = true;
    }
}

#[async_trait]
impl UserLookup for MockUsers {
    async fn find_identity(&self, id: i64) -> Result<Option<Identity>, sqlx::Error> {
        if *self.failing.lock().unwrap() {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }
}
