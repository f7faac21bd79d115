//! Account registration, login and bearer-token authentication
//!
//! Identity is a locally registered account: bcrypt-hashed password, JWT
//! bearer token signed with the configured secret. The middleware validates
//! the `Authorization: Bearer` header on protected routes and hands the
//! authenticated user id to handlers as a request extension.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use localnoise_common::db::{User, UserProfile};

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Minimum password length accepted at registration
const MIN_PASSWORD_LEN: usize = 6;

/// JWT claims: the user id and expiry
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// Authenticated user id, attached to the request by the middleware
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

/// Sign a bearer token for a user
fn create_token(state: &AppState, user_id: Uuid) -> ApiResult<String> {
    let expiry = Utc::now() + Duration::hours(state.config.token_ttl_hours);
    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiry.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.config.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Failed to sign token: {}", e)))
}

/// Validate a bearer token and return the user id it names
fn verify_token(state: &AppState, token: &str) -> ApiResult<Uuid> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| ApiError::Unauthorized(format!("Invalid token: {}", e)))?;

    Uuid::parse_str(&data.claims.sub)
        .map_err(|_| ApiError::Unauthorized("Invalid token subject".to_string()))
}

/// Bearer-token middleware for routes that mutate data
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Expected a Bearer token".to_string()))?;

    let user_id = verify_token(&state, token)?;

    request.extensions_mut().insert(AuthUser(user_id));
    Ok(next.run(request).await)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub city: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token plus the profile of the account it belongs to
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let username = request.username.trim();
    let email = request.email.trim();

    if username.len() < 3 {
        return Err(ApiError::BadRequest(
            "Username must be at least 3 characters".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    if request.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    if db::users::username_or_email_taken(&state.db, username, email).await? {
        return Err(ApiError::Conflict(
            "Username or email already registered".to_string(),
        ));
    }

    let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))?;

    let user = User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: email.to_string(),
        password_hash,
        city: request.city,
        country: request.country,
        profile_photo: None,
        created_at: String::new(),
        updated_at: String::new(),
    };

    db::users::insert_user(&state.db, &user).await?;

    info!(username = %user.username, "Registered new user");

    let token = create_token(&state, user.id)?;
    Ok(Json(AuthResponse {
        token,
        user: user.profile(),
    }))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let user = db::users::find_user_by_email(&state.db, request.email.trim())
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = bcrypt::verify(&request.password, &user.password_hash)
        .map_err(|e| ApiError::Internal(format!("Failed to verify password: {}", e)))?;

    if !valid {
        warn!(email = %request.email, "Failed login attempt");
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let token = create_token(&state, user.id)?;
    Ok(Json(AuthResponse {
        token,
        user: user.profile(),
    }))
}

/// GET /api/auth/profile (requires auth)
pub async fn profile(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> ApiResult<Json<UserProfile>> {
    let user = db::users::find_user_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User no longer exists".to_string()))?;

    Ok(Json(user.profile()))
}
