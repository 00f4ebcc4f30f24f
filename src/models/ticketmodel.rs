// src/models/ticketmodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use uuid::Uuid;

use super::usermodel::UserRole;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "ticket_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    /// Statuses in which the creator may leave a rating.
    pub fn is_rateable(&self) -> bool {
        matches!(self, TicketStatus::Resolved | TicketStatus::Closed)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "ticket_priority", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ticket {
    pub id: Uuid,
    pub subject: String,
    pub description: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub creator_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub rating: Option<i32>,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TicketWithUsers {
    #[sqlx(flatten)]
    pub ticket: Ticket,
    pub creator_name: String,
    pub creator_email: String,
    pub creator_role: UserRole,
    pub assignee_name: Option<String>,
    pub assignee_email: Option<String>,
    pub assignee_role: Option<UserRole>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentWithUser {
    #[sqlx(flatten)]
    pub comment: Comment,
    pub user_name: String,
    pub user_email: String,
    pub user_role: UserRole,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attachment {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub file_name: String,
    /// Handle issued by the content store, not a filesystem path.
    pub file_path: String,
    pub file_type: String,
    pub file_size: i64,
    pub uploaded_by: Uuid,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttachmentWithUser {
    #[sqlx(flatten)]
    pub attachment: Attachment,
    pub uploader_name: String,
    pub uploader_email: String,
    pub uploader_role: UserRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketDetails {
    pub ticket: TicketWithUsers,
    pub comments: Vec<CommentWithUser>,
    pub attachments: Vec<AttachmentWithUser>,
}

/// Candidate sets the ticket store can produce. Visibility is applied by the
/// access policy afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum TicketQuery {
    All,
    CreatedBy(Uuid),
    CreatedByOrAssignedTo(Uuid),
    Status(TicketStatus),
    Priority(TicketPriority),
    SubjectContains(String),
}

/// What a caller asks to list.
#[derive(Debug, Clone, PartialEq)]
pub enum TicketFilter {
    All,
    Status(TicketStatus),
    Priority(TicketPriority),
    Search(String),
}
