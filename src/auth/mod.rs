//! Session tokens and the request gate that turns them into an [`Identity`].
//!
//! [`Identity`]: crate::models::user::Identity

pub mod middleware;
pub mod session;
pub mod token;

pub use middleware::{require_auth, CurrentUser, SESSION_COOKIE};
pub use session::SessionResolver;
pub use token::{Claims, TokenCodec, TokenError, SESSION_TTL_DAYS};

use thiserror::Error;

/// Outcome of a failed session check. Reject reasons never leave this module
/// except through logs.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("user lookup failed")]
    Store(#[from] sqlx::Error),
}
