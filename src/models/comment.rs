use serde::{Deserialize, Serialize};

use super::Author;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub body: String,
    pub post_id: i64,
    pub user_id: i64,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateComment {
    pub post_id: i64,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateComment {
    pub body: String,
}

#[derive(Debug, sqlx::FromRow)]
pub struct CommentRow {
    pub id: i64,
    pub body: String,
    pub user_id: i64,
    pub created_at: chrono::NaiveDateTime,
    pub user_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: i64,
    pub body: String,
    pub created_at: chrono::NaiveDateTime,
    pub user: Author,
}

impl From<CommentRow> for CommentView {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            body: row.body,
            created_at: row.created_at,
            user: Author {
                id: row.user_id,
                name: row.user_name,
            },
        }
    }
}
