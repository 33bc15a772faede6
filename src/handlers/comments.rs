use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use super::validation::{field_error, Validator};
use crate::{
    auth::CurrentUser,
    db,
    error::AppError,
    models::comment::{Comment, CreateComment, UpdateComment},
    AppState,
};

async fn comment_owner(state: &AppState, id: i64) -> Result<i64, AppError> {
    sqlx::query_scalar::<_, i64>("SELECT user_id FROM comments WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Comment"))
}

pub async fn create_comment(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Json(payload): Json<CreateComment>,
) -> Result<Json<Value>, AppError> {
    Validator::new()
        .required("body", &payload.body)
        .positive("postId", payload.post_id)
        .finish()?;

    if !db::id_exists(&state.db, "posts", payload.post_id).await? {
        return Err(field_error("postId", "The post doesn't exist"));
    }

    let comment = sqlx::query_as::<_, Comment>(
        "INSERT INTO comments (body, post_id, user_id) VALUES (?, ?, ?) \
         RETURNING id, body, post_id, user_id, created_at",
    )
    .bind(&payload.body)
    .bind(payload.post_id)
    .bind(me.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(json!({ "comment": comment })))
}

pub async fn update_comment(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateComment>,
) -> Result<Json<Value>, AppError> {
    if comment_owner(&state, id).await? != me.id {
        return Err(AppError::Forbidden(
            "You are not allowed to update this comment",
        ));
    }
    Validator::new().required("body", &payload.body).finish()?;

    let comment = sqlx::query_as::<_, Comment>(
        "UPDATE comments SET body = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ? \
         RETURNING id, body, post_id, user_id, created_at",
    )
    .bind(&payload.body)
    .bind(id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(json!({ "comment": comment })))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    if comment_owner(&state, id).await? != me.id {
        return Err(AppError::Forbidden(
            "You are not allowed to delete this comment",
        ));
    }

    sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    Ok(Json(json!({ "message": "comment deleted successfully" })))
}
