use serde::{Deserialize, Serialize};

use super::{category::CategoryRef, comment::CommentView, Author};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub user_id: i64,
    pub category_id: i64,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPayload {
    pub title: String,
    pub body: String,
    pub category_id: i64,
}

/// Post joined with its category and author.
#[derive(Debug, sqlx::FromRow)]
pub struct PostRow {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub user_id: i64,
    pub category_id: i64,
    pub created_at: chrono::NaiveDateTime,
    pub category_name: String,
    pub category_slug: String,
    pub user_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub created_at: chrono::NaiveDateTime,
    pub category: CategoryRef,
    pub user: Author,
}

impl From<PostRow> for PostSummary {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            body: row.body,
            created_at: row.created_at,
            category: CategoryRef {
                id: row.category_id,
                name: row.category_name,
                slug: row.category_slug,
            },
            user: Author {
                id: row.user_id,
                name: row.user_name,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: PostSummary,
    pub comments: Vec<CommentView>,
}
