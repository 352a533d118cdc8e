use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        jwt::{AuthUser, JwtKeys},
        password::{hash_password_blocking, verify_dummy_blocking, verify_password_blocking},
    },
    error::{AppError, AppResult},
    state::AppState,
    users::{
        dto::{ListUsersResponse, LoginRequest, LoginResponse, PublicUser, RegisterRequest},
        model::NewUser,
        store::UniqueField,
        validation::{normalize_email, validate_email, validate_password, validate_username},
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<PublicUser>)> {
    let Json(mut payload) = payload?;
    payload.email = normalize_email(&payload.email);
    payload.username = payload.username.trim().to_string();

    validate_username(&payload.username).map_err(|msg| {
        warn!(username = %payload.username, "invalid username");
        AppError::BadRequest(msg)
    })?;
    validate_email(&payload.email).map_err(|msg| {
        warn!(email = %payload.email, "invalid email");
        AppError::BadRequest(msg)
    })?;
    validate_password(&payload.password).map_err(|msg| {
        warn!("invalid password");
        AppError::BadRequest(msg)
    })?;

    if state.users.find_by_email(&payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::Conflict(UniqueField::Email.conflict_message().into()));
    }
    if state.users.find_by_username(&payload.username).await?.is_some() {
        warn!(username = %payload.username, "username already taken");
        return Err(AppError::Conflict(UniqueField::Username.conflict_message().into()));
    }

    let password_hash = hash_password_blocking(payload.password).await?;
    let user = state
        .users
        .create(NewUser {
            username: payload.username,
            email: payload.email,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<LoginResponse>> {
    let Json(payload) = payload?;

    if payload.password.is_empty() {
        return Err(AppError::BadRequest("Password is required".into()));
    }

    let email = payload
        .email
        .as_deref()
        .map(normalize_email)
        .filter(|e| !e.is_empty());
    let username = payload
        .username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty());

    let found = match (email, username) {
        (Some(email), _) => {
            validate_email(&email).map_err(AppError::BadRequest)?;
            state.users.find_by_email(&email).await?
        }
        (None, Some(username)) => state.users.find_by_username(username).await?,
        (None, None) => {
            return Err(AppError::BadRequest("Email or username is required".into()));
        }
    };

    let Some(user) = found else {
        verify_dummy_blocking(payload.password).await?;
        warn!("login unknown user");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    };

    if !verify_password_blocking(payload.password, user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer",
        expires_in: keys.ttl.as_secs() as i64,
        user: user.into(),
    }))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Response {
    match state.users.list().await {
        Ok(users) => Json(ListUsersResponse {
            users: users.into_iter().map(PublicUser::from).collect(),
            message: None,
        })
        .into_response(),
        Err(e) => {
            error!(error = %e, "list users failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ListUsersResponse {
                    users: Vec::new(),
                    message: Some("Internal server error".into()),
                }),
            )
                .into_response()
        }
    }
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<PublicUser>> {
    let user = state.users.find_by_id(user_id).await?.ok_or_else(|| {
        warn!(user_id = %user_id, "token names a missing user");
        AppError::Unauthorized("User not found".into())
    })?;
    Ok(Json(user.into()))
}
