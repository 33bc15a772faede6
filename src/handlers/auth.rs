use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, Json};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{json, Value};

use super::validation::{field_error, Validator};
use crate::{
    auth::middleware::{cleared_session_cookie, session_cookie},
    db,
    error::AppError,
    models::user::{AuthResponse, CreateUser, Credentials, LoginPayload, User},
    AppState,
};

pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<CreateUser>,
) -> Result<Json<Value>, AppError> {
    Validator::new()
        .length("name", &payload.name, 2, 50)
        .email("email", &payload.email)
        .length("password", &payload.password, 6, 128)
        .finish()?;

    let email = payload.email.trim();
    if db::value_taken(&state.db, "users", "email", email, None).await? {
        return Err(field_error("email", "email already exists"));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(payload.password.as_bytes(), &salt)?
        .to_string();

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (name, email, password_hash) VALUES (?, ?, ?) RETURNING id, name, email, created_at",
    )
    .bind(payload.name.trim())
    .bind(email)
    .bind(&password_hash)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(user_id = user.id, "user signed up");
    Ok(Json(json!({ "user": user })))
}

pub async fn log_in(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginPayload>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let user = sqlx::query_as::<_, Credentials>(
        "SELECT id, password_hash FROM users WHERE email = ?",
    )
    .bind(payload.email.trim())
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::LoginFail)?;

    let parsed_hash = PasswordHash::new(&user.password_hash)?;
    Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::LoginFail)?;

    let token = state.tokens.issue(user.id)?;
    tracing::info!(user_id = user.id, "user logged in");

    let jar = jar.add(session_cookie(token.clone(), state.cookie_secure));
    Ok((jar, Json(AuthResponse { token })))
}

pub async fn log_out(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<Value>) {
    let jar = jar.add(cleared_session_cookie(state.cookie_secure));
    (jar, Json(json!({ "message": "log out successfully" })))
}
