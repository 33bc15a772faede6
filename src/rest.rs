use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{
    auth::require_auth,
    handlers::{auth, categories, comments, posts, users},
    AppState,
};

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/log-out", post(auth::log_out))
        .route("/api/users", get(users::list_users))
        .route(
            "/api/users/:id",
            put(users::update_user).delete(users::delete_user),
        )
        .route(
            "/api/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/api/categories/:id",
            put(categories::update_category).delete(categories::delete_category),
        )
        .route(
            "/api/posts",
            get(posts::list_posts).post(posts::create_post),
        )
        .route(
            "/api/posts/:id",
            get(posts::read_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/api/posts/:id/edit", get(posts::edit_post))
        .route("/api/comments", post(comments::create_comment))
        .route(
            "/api/comments/:id",
            put(comments::update_comment).delete(comments::delete_comment),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/api/sign-up", post(auth::sign_up))
        .route("/api/log-in", post(auth::log_in))
        .merge(protected)
        .with_state(state)
}
