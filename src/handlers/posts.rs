use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::{QueryBuilder, Sqlite};

use super::validation::{field_error, Validator};
use crate::{
    auth::CurrentUser,
    db,
    error::AppError,
    models::{
        comment::{CommentRow, CommentView},
        post::{Post, PostDetail, PostPayload, PostRow, PostSummary},
    },
    pagination::{paginate, Listing, PageParams, Shape},
    AppState,
};

const POSTS: Listing<'static> = Listing {
    select: "SELECT p.id, p.title, p.body, p.user_id, p.category_id, p.created_at, \
             c.name AS category_name, c.slug AS category_slug, u.name AS user_name \
             FROM posts p",
    order_by: "p.id DESC",
};

/// Eager-loads the category and author columns selected by [`POSTS`].
fn with_relations(query: &mut QueryBuilder<'_, Sqlite>) {
    query.push(" JOIN categories c ON c.id = p.category_id JOIN users u ON u.id = p.user_id");
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFilter {
    pub category_id: Option<i64>,
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
    Query(filter): Query<PostFilter>,
) -> Result<Json<Value>, AppError> {
    let category_id = filter.category_id;
    let shape: Shape = &move |query| {
        with_relations(query);
        if let Some(category_id) = category_id {
            query.push(" WHERE p.category_id = ").push_bind(category_id);
        }
    };

    let page = paginate::<PostRow>(&state.db, POSTS, params.to_request(), Some(shape))
        .await?
        .map(PostSummary::from);
    Ok(Json(json!({ "result": page })))
}

pub async fn read_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let mut query = QueryBuilder::<Sqlite>::new(POSTS.select);
    with_relations(&mut query);
    query.push(" WHERE p.id = ").push_bind(id);

    let post = query
        .build_query_as::<PostRow>()
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Post"))?;

    let comments = sqlx::query_as::<_, CommentRow>(
        "SELECT cm.id, cm.body, cm.user_id, cm.created_at, u.name AS user_name \
         FROM comments cm JOIN users u ON u.id = cm.user_id \
         WHERE cm.post_id = ? ORDER BY cm.id",
    )
    .bind(id)
    .fetch_all(&state.db)
    .await?;

    let detail = PostDetail {
        post: post.into(),
        comments: comments.into_iter().map(CommentView::from).collect(),
    };
    Ok(Json(json!({ "post": detail })))
}

async fn validate(state: &AppState, payload: &PostPayload) -> Result<(), AppError> {
    Validator::new()
        .length("title", &payload.title, 2, 200)
        .required("body", &payload.body)
        .positive("categoryId", payload.category_id)
        .finish()?;

    if !db::id_exists(&state.db, "categories", payload.category_id).await? {
        return Err(field_error("categoryId", "The category doesn't exist"));
    }
    Ok(())
}

/// Owner of the post, or 404.
async fn post_owner(state: &AppState, id: i64) -> Result<i64, AppError> {
    sqlx::query_scalar::<_, i64>("SELECT user_id FROM posts WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Post"))
}

pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Json(payload): Json<PostPayload>,
) -> Result<Json<Value>, AppError> {
    validate(&state, &payload).await?;

    let post = sqlx::query_as::<_, Post>(
        "INSERT INTO posts (title, body, user_id, category_id) VALUES (?, ?, ?, ?) \
         RETURNING id, title, body, user_id, category_id, created_at",
    )
    .bind(payload.title.trim())
    .bind(&payload.body)
    .bind(me.id)
    .bind(payload.category_id)
    .fetch_one(&state.db)
    .await?;

    tracing::debug!(post_id = post.id, user_id = me.id, "post created");
    Ok(Json(json!({ "post": post })))
}

/// The raw post for its author to edit.
pub async fn edit_post(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    if post_owner(&state, id).await? != me.id {
        return Err(AppError::Forbidden("You are not allowed to edit this post"));
    }

    let post = sqlx::query_as::<_, Post>(
        "SELECT id, title, body, user_id, category_id, created_at FROM posts WHERE id = ?",
    )
    .bind(id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(json!({ "post": post })))
}

pub async fn update_post(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<PostPayload>,
) -> Result<Json<Value>, AppError> {
    if post_owner(&state, id).await? != me.id {
        return Err(AppError::Forbidden(
            "You are not allowed to update this post",
        ));
    }
    validate(&state, &payload).await?;

    let post = sqlx::query_as::<_, Post>(
        "UPDATE posts SET title = ?, body = ?, category_id = ?, updated_at = CURRENT_TIMESTAMP \
         WHERE id = ? RETURNING id, title, body, user_id, category_id, created_at",
    )
    .bind(payload.title.trim())
    .bind(&payload.body)
    .bind(payload.category_id)
    .bind(id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(json!({ "post": post })))
}

pub async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    if post_owner(&state, id).await? != me.id {
        return Err(AppError::Forbidden(
            "You are not allowed to delete this post",
        ));
    }

    sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    Ok(Json(json!({ "message": "post deleted successfully" })))
}
