pub mod category;
pub mod comment;
pub mod post;
pub mod user;

use serde::Serialize;

/// Minimal view of a user attached to posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
}
