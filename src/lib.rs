pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod pagination;
pub mod rest;

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::{SessionResolver, TokenCodec};
use crate::db::{SqliteStore, UserLookup};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub tokens: TokenCodec,
    pub sessions: SessionResolver,
    /// Sets the `Secure` attribute on the session cookie.
    pub cookie_secure: bool,
}

impl AppState {
    /// State backed by the pool for both resource queries and session lookups.
    pub fn new(db: SqlitePool, tokens: TokenCodec, cookie_secure: bool) -> Self {
        let users = Arc::new(SqliteStore::new(db.clone()));
        Self::with_user_lookup(db, tokens, users, cookie_secure)
    }

    pub fn with_user_lookup(
        db: SqlitePool,
        tokens: TokenCodec,
        users: Arc<dyn UserLookup>,
        cookie_secure: bool,
    ) -> Self {
        let sessions = SessionResolver::new(tokens.clone(), users);
        Self {
            db,
            tokens,
            sessions,
            cookie_secure,
        }
    }
}
