use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use super::validation::{field_error, Validator};
use crate::{
    db,
    error::AppError,
    models::category::{Category, CategoryPayload},
    pagination::{paginate, Listing, PageParams},
    AppState,
};

const CATEGORIES: Listing<'static> = Listing {
    select: "SELECT id, name, slug, created_at FROM categories",
    order_by: "id",
};

pub async fn list_categories(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>, AppError> {
    let page = paginate::<Category>(&state.db, CATEGORIES, params.to_request(), None).await?;
    Ok(Json(json!({ "result": page })))
}

async fn validate(
    state: &AppState,
    payload: &CategoryPayload,
    except_id: Option<i64>,
) -> Result<(), AppError> {
    Validator::new()
        .length("name", &payload.name, 2, 50)
        .length("slug", &payload.slug, 2, 60)
        .finish()?;

    if db::value_taken(&state.db, "categories", "name", payload.name.trim(), except_id).await? {
        return Err(field_error("name", "name already exists"));
    }
    if db::value_taken(&state.db, "categories", "slug", payload.slug.trim(), except_id).await? {
        return Err(field_error("slug", "slug already exists"));
    }
    Ok(())
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CategoryPayload>,
) -> Result<Json<Value>, AppError> {
    validate(&state, &payload, None).await?;

    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (name, slug) VALUES (?, ?) RETURNING id, name, slug, created_at",
    )
    .bind(payload.name.trim())
    .bind(payload.slug.trim())
    .fetch_one(&state.db)
    .await?;

    Ok(Json(json!({ "category": category })))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryPayload>,
) -> Result<Json<Value>, AppError> {
    if !db::id_exists(&state.db, "categories", id).await? {
        return Err(AppError::NotFound("Category"));
    }
    validate(&state, &payload, Some(id)).await?;

    let category = sqlx::query_as::<_, Category>(
        "UPDATE categories SET name = ?, slug = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ? RETURNING id, name, slug, created_at",
    )
    .bind(payload.name.trim())
    .bind(payload.slug.trim())
    .bind(id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(json!({ "category": category })))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Category"));
    }

    Ok(Json(json!({ "message": "category deleted successfully" })))
}
