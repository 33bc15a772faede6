use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use super::validation::{field_error, Validator};
use crate::{
    auth::CurrentUser,
    db,
    error::AppError,
    models::user::{UpdateUser, User},
    pagination::{paginate, Listing, PageParams},
    AppState,
};

const USERS: Listing<'static> = Listing {
    select: "SELECT id, name, email, created_at FROM users",
    order_by: "id",
};

pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>, AppError> {
    let page = paginate::<User>(&state.db, USERS, params.to_request(), None).await?;
    Ok(Json(json!({ "result": page })))
}

async fn find_user(state: &AppState, id: i64) -> Result<User, AppError> {
    sqlx::query_as::<_, User>("SELECT id, name, email, created_at FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("User"))
}

pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUser>,
) -> Result<Json<Value>, AppError> {
    let user = find_user(&state, id).await?;
    if user.id != me.id {
        return Err(AppError::Forbidden(
            "You are not allowed to update this profile",
        ));
    }

    Validator::new()
        .length("name", &payload.name, 2, 50)
        .email("email", &payload.email)
        .finish()?;

    let email = payload.email.trim();
    if db::value_taken(&state.db, "users", "email", email, Some(user.id)).await? {
        return Err(field_error("email", "email already exists"));
    }

    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET name = ?, email = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ? RETURNING id, name, email, created_at",
    )
    .bind(payload.name.trim())
    .bind(email)
    .bind(user.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(json!({ "user": user })))
}

pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let user = find_user(&state, id).await?;
    if user.id != me.id {
        return Err(AppError::Forbidden(
            "You are not allowed to delete this profile",
        ));
    }

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user.id)
        .execute(&state.db)
        .await?;

    tracing::info!(user_id = user.id, "user deleted");
    Ok(Json(json!({ "message": "User successfully deleted" })))
}
