// handler/tickets.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::ticketdtos::*,
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::ticketmodel::{TicketFilter, TicketWithUsers},
    AppState,
};

pub fn tickets_handler() -> Router {
    Router::new()
        .route("/", get(get_tickets).post(create_ticket))
        .route("/search", get(search_tickets))
        .route("/filter/status", get(filter_by_status))
        .route("/filter/priority", get(filter_by_priority))
        .route("/:ticket_id", get(get_ticket))
        .route("/:ticket_id/status", put(update_ticket_status))
        .route("/:ticket_id/assign", put(assign_ticket))
        .route("/:ticket_id/rate", post(rate_ticket))
        .route("/:ticket_id/comments", get(get_comments).post(add_comment))
        .route("/:ticket_id/attachments", get(get_attachments))
}

fn ticket_response(ticket: &TicketWithUsers) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "success",
        "data": TicketResponseDto::from_ticket(ticket)
    }))
}

async fn list(
    app_state: &AppState,
    auth: &JWTAuthMiddeware,
    filter: TicketFilter,
) -> Result<Json<serde_json::Value>, HttpError> {
    let tickets = app_state.ticket_service.list_tickets(&auth.user, filter).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "results": tickets.len(),
        "data": TicketResponseDto::from_tickets(&tickets)
    })))
}

pub async fn create_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateTicketDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let ticket = app_state
        .ticket_service
        .create_ticket(&auth.user, body.subject, body.description, body.priority)
        .await?;

    Ok((StatusCode::CREATED, ticket_response(&ticket)))
}

pub async fn get_tickets(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    list(&app_state, &auth, TicketFilter::All).await
}

pub async fn search_tickets(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Query(params): Query<SearchQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    list(&app_state, &auth, TicketFilter::Search(params.query)).await
}

pub async fn filter_by_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Query(params): Query<StatusFilterDto>,
) -> Result<impl IntoResponse, HttpError> {
    list(&app_state, &auth, TicketFilter::Status(params.status)).await
}

pub async fn filter_by_priority(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Query(params): Query<PriorityFilterDto>,
) -> Result<impl IntoResponse, HttpError> {
    list(&app_state, &auth, TicketFilter::Priority(params.priority)).await
}

pub async fn get_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let details = app_state.ticket_service.get_ticket(&auth.user, ticket_id).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": TicketDetailsDto::from_details(&details)
    })))
}

pub async fn update_ticket_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<Uuid>,
    Json(body): Json<UpdateStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let ticket = app_state
        .ticket_service
        .update_status(&auth.user, ticket_id, body.status)
        .await?;

    Ok(ticket_response(&ticket))
}

pub async fn assign_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<Uuid>,
    Json(body): Json<AssignTicketDto>,
) -> Result<impl IntoResponse, HttpError> {
    let ticket = app_state
        .ticket_service
        .assign_ticket(&auth.user, ticket_id, body.assignee_id)
        .await?;

    Ok(ticket_response(&ticket))
}

pub async fn rate_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<Uuid>,
    Json(body): Json<RateTicketDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let ticket = app_state
        .ticket_service
        .rate_ticket(&auth.user, ticket_id, body.rating, body.feedback)
        .await?;

    Ok(ticket_response(&ticket))
}

pub async fn get_comments(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let comments = app_state.ticket_service.get_comments(&auth.user, ticket_id).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "results": comments.len(),
        "data": CommentResponseDto::from_comments(&comments)
    })))
}

pub async fn add_comment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<Uuid>,
    Json(body): Json<CreateCommentDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let comment = app_state
        .ticket_service
        .add_comment(&auth.user, ticket_id, body.content)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "data": CommentResponseDto::from_comment(&comment)
        })),
    ))
}

pub async fn get_attachments(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let attachments = app_state
        .attachment_service
        .list_for_ticket(&auth.user, ticket_id)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "results": attachments.len(),
        "data": AttachmentResponseDto::from_attachments(&attachments)
    })))
}
