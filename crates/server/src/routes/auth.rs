//! Authentication routes (register, login, me).

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, Json};
use wiredesk_shared::{validate_password, AuthTokens, LoginRequest, RegisterRequest, User};

use crate::error::{ApiProblem, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Register a new user account
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    tracing::info!("Registering user: {}", payload.email);

    let email = payload.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(ApiProblem::unprocessable("Invalid email address"));
    }
    if let Some(error) = validate_password(&payload.password) {
        return Err(ApiProblem::unprocessable(error.message));
    }
    if state.store.user_by_email(&email).await.is_some() {
        return Err(ApiProblem::bad_request("Email already registered"));
    }

    // Hash password
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let password_hash = Argon2::default()
        .hash_password(payload.password.as_bytes(), &salt)
        .map_err(|e| ApiProblem::internal(format!("Hashing error: {e}")))?
        .to_string();

    let user = state
        .store
        .create_user(&email, password_hash)
        .await
        .ok_or_else(|| ApiProblem::bad_request("Email already registered"))?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Exchange credentials for a token pair
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthTokens>> {
    tracing::info!("Logging in user: {}", payload.email);

    let email = payload.email.trim().to_lowercase();
    let invalid = || ApiProblem::unauthorized("Incorrect email or password");

    let record = state.store.user_by_email(&email).await.ok_or_else(invalid)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&record.password_hash)
        .map_err(|e| ApiProblem::internal(format!("Invalid hash: {e}")))?;
    Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .map_err(|_| invalid())?;

    if !record.user.is_active {
        return Err(ApiProblem::bad_request("Inactive user"));
    }

    Ok(Json(state.store.issue_tokens(record.user.id).await))
}

/// The user owning the bearer token
pub async fn me(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}
