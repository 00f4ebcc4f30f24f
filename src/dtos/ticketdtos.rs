// dtos/ticketdtos.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::userdtos::UserSummaryDto;
use crate::models::{
    ticketmodel::*,
    usermodel::UserRole,
};

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateTicketDto {
    #[validate(length(min = 1, max = 200, message = "Subject must be between 1 and 200 characters"))]
    pub subject: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    pub priority: Option<TicketPriority>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusDto {
    pub status: TicketStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignTicketDto {
    #[serde(rename = "assigneeId", alias = "assignee_id")]
    pub assignee_id: Uuid,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct RateTicketDto {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    #[validate(length(max = 2000, message = "Feedback is too long"))]
    pub feedback: Option<String>,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentDto {
    #[validate(length(min = 1, max = 5000, message = "Comment must be between 1 and 5000 characters"))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQueryDto {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusFilterDto {
    pub status: TicketStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityFilterDto {
    pub priority: TicketPriority,
}

fn summary(id: Uuid, name: &str, email: &str, role: UserRole) -> UserSummaryDto {
    UserSummaryDto {
        id: id.to_string(),
        name: name.to_owned(),
        email: email.to_owned(),
        role,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponseDto {
    pub id: String,
    pub subject: String,
    pub description: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub creator: UserSummaryDto,
    pub assignee: Option<UserSummaryDto>,
    pub rating: Option<i32>,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TicketResponseDto {
    pub fn from_ticket(row: &TicketWithUsers) -> Self {
        let t = &row.ticket;

        let assignee = match (t.assignee_id, &row.assignee_name, &row.assignee_email, row.assignee_role) {
            (Some(id), Some(name), Some(email), Some(role)) => Some(summary(id, name, email, role)),
            _ => None,
        };

        TicketResponseDto {
            id: t.id.to_string(),
            subject: t.subject.clone(),
            description: t.description.clone(),
            priority: t.priority,
            status: t.status,
            creator: summary(t.creator_id, &row.creator_name, &row.creator_email, row.creator_role),
            assignee,
            rating: t.rating,
            feedback: t.feedback.clone(),
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }

    pub fn from_tickets(rows: &[TicketWithUsers]) -> Vec<Self> {
        rows.iter().map(Self::from_ticket).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponseDto {
    pub id: String,
    pub ticket_id: String,
    pub content: String,
    pub user: UserSummaryDto,
    pub created_at: DateTime<Utc>,
}

impl CommentResponseDto {
    pub fn from_comment(row: &CommentWithUser) -> Self {
        let c = &row.comment;
        CommentResponseDto {
            id: c.id.to_string(),
            ticket_id: c.ticket_id.to_string(),
            content: c.content.clone(),
            user: summary(c.user_id, &row.user_name, &row.user_email, row.user_role),
            created_at: c.created_at,
        }
    }

    pub fn from_comments(rows: &[CommentWithUser]) -> Vec<Self> {
        rows.iter().map(Self::from_comment).collect()
    }
}

/// Attachment metadata. The storage handle is never exposed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentResponseDto {
    pub id: String,
    pub ticket_id: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub uploaded_by: UserSummaryDto,
    pub uploaded_at: DateTime<Utc>,
}

impl AttachmentResponseDto {
    pub fn from_attachment(row: &AttachmentWithUser) -> Self {
        let a = &row.attachment;
        AttachmentResponseDto {
            id: a.id.to_string(),
            ticket_id: a.ticket_id.to_string(),
            file_name: a.file_name.clone(),
            file_type: a.file_type.clone(),
            file_size: a.file_size,
            uploaded_by: summary(a.uploaded_by, &row.uploader_name, &row.uploader_email, row.uploader_role),
            uploaded_at: a.uploaded_at,
        }
    }

    pub fn from_attachments(rows: &[AttachmentWithUser]) -> Vec<Self> {
        rows.iter().map(Self::from_attachment).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketDetailsDto {
    #[serde(flatten)]
    pub ticket: TicketResponseDto,
    pub comments: Vec<CommentResponseDto>,
    pub attachments: Vec<AttachmentResponseDto>,
}

impl TicketDetailsDto {
    pub fn from_details(details: &TicketDetails) -> Self {
        TicketDetailsDto {
            ticket: TicketResponseDto::from_ticket(&details.ticket),
            comments: CommentResponseDto::from_comments(&details.comments),
            attachments: AttachmentResponseDto::from_attachments(&details.attachments),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(assigned: bool) -> TicketWithUsers {
        let now = Utc::now();
        TicketWithUsers {
            ticket: Ticket {
                id: Uuid::new_v4(),
                subject: "Printer".into(),
                description: "Jammed".into(),
                priority: TicketPriority::Medium,
                status: TicketStatus::Open,
                creator_id: Uuid::new_v4(),
                assignee_id: assigned.then(Uuid::new_v4),
                rating: None,
                feedback: None,
                created_at: now,
                updated_at: now,
            },
            creator_name: "Alice".into(),
            creator_email: "alice@example.com".into(),
            creator_role: UserRole::User,
            assignee_name: assigned.then(|| "Xavier".to_string()),
            assignee_email: assigned.then(|| "x@example.com".to_string()),
            assignee_role: assigned.then_some(UserRole::SupportAgent),
        }
    }

    #[test]
    fn ticket_json_shape() {
        let json = serde_json::to_value(TicketResponseDto::from_ticket(&row(true))).unwrap();
        assert_eq!(json["status"], "OPEN");
        assert_eq!(json["priority"], "MEDIUM");
        assert_eq!(json["creator"]["name"], "Alice");
        assert_eq!(json["assignee"]["role"], "SUPPORT_AGENT");
        assert!(json.get("createdAt").is_some());

        let json = serde_json::to_value(TicketResponseDto::from_ticket(&row(false))).unwrap();
        assert!(json["assignee"].is_null());
    }

    #[test]
    fn rating_outside_range_fails_validation() {
        for rating in [0, 6] {
            let dto = RateTicketDto { rating, feedback: None };
            assert!(dto.validate().is_err());
        }
        let dto = RateTicketDto {
            rating: 5,
            feedback: Some("great".into()),
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn enums_parse_from_wire_names() {
        let dto: UpdateStatusDto = serde_json::from_str(r#"{"status":"IN_PROGRESS"}"#).unwrap();
        assert_eq!(dto.status, TicketStatus::InProgress);

        let dto: CreateTicketDto =
            serde_json::from_str(r#"{"subject":"s","description":"d"}"#).unwrap();
        assert!(dto.priority.is_none());

        assert!(serde_json::from_str::<UpdateStatusDto>(r#"{"status":"DONE"}"#).is_err());
    }
}
