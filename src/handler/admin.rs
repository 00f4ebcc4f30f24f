// handler/admin.rs
use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::userdtos::{CreateUserDto, FilterUserDto, Response, RoleUpdateDto, UserData, UserListResponseDto, UserResponseDto},
    error::HttpError,
    middleware::{role_check, JWTAuthMiddeware},
    models::usermodel::UserRole,
    AppState,
};

/// Account management. Every route requires `ADMIN`.
pub fn admin_handler() -> Router {
    Router::new()
        .route("/users", get(get_users).post(create_user))
        .route("/users/:user_id/role", put(update_user_role))
        .route("/users/:user_id", axum::routing::delete(delete_user))
        .route("/users/role/:role", get(get_users_by_role))
        .layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserRole::Admin])
        }))
}

pub async fn get_users(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let users = app_state.user_service.list_users().await?;

    Ok(Json(UserListResponseDto {
        status: "success".to_string(),
        results: users.len(),
        users: FilterUserDto::filter_users(&users),
    }))
}

pub async fn create_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CreateUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .user_service
        .create_user(body.name, body.email, body.password, body.role.unwrap_or(UserRole::User))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponseDto {
            status: "success".to_string(),
            data: UserData {
                user: FilterUserDto::filter_user(&user),
            },
        }),
    ))
}

pub async fn update_user_role(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<RoleUpdateDto>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state
        .user_service
        .update_user_role(&auth.user, user_id, body.role)
        .await?;

    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&user),
        },
    }))
}

pub async fn delete_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    app_state.user_service.delete_user(&auth.user, user_id).await?;

    Ok(Json(Response {
        status: "success",
        message: "User deleted".to_string(),
    }))
}

pub async fn get_users_by_role(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(role): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let role: UserRole = serde_json::from_value(serde_json::Value::String(role.to_uppercase()))
        .map_err(|_| HttpError::bad_request(format!("Unknown role: {}", role)))?;

    let users = app_state.user_service.users_by_role(role).await?;

    Ok(Json(UserListResponseDto {
        status: "success".to_string(),
        results: users.len(),
        users: FilterUserDto::filter_users(&users),
    }))
}
