use std::sync::Arc;

use super::{AuthError, TokenCodec};
use crate::db::UserLookup;
use crate::models::user::Identity;

/// Turns a raw session token into the identity of a user that still exists.
#[derive(Clone)]
pub struct SessionResolver {
    codec: TokenCodec,
    users: Arc<dyn UserLookup>,
}

impl SessionResolver {
    pub fn new(codec: TokenCodec, users: Arc<dyn UserLookup>) -> Self {
        Self { codec, users }
    }

    /// A valid signature is not enough: the subject is looked up on every call
    /// so tokens of deleted users stop resolving before they expire.
    pub async fn resolve(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self.codec.verify(token)?;

        match self.users.find_identity(claims.sub).await? {
            Some(identity) => Ok(identity),
            None => {
                tracing::debug!(subject = claims.sub, "token subject no longer exists");
                Err(AuthError::Unauthenticated)
            }
        }
    }
}
