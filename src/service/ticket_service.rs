// service/ticket_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{attachmentdb::AttachmentExt, db::HelpdeskDb, ticketdb::TicketExt, userdb::UserExt},
    models::{
        ticketmodel::*,
        usermodel::{User, UserRole},
    },
    service::{access_policy, error::ServiceError},
};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

#[derive(Debug, Clone)]
pub struct TicketService {
    db_client: Arc<dyn HelpdeskDb>,
}

impl TicketService {
    pub fn new(db_client: Arc<dyn HelpdeskDb>) -> Self {
        Self { db_client }
    }

    async fn load_ticket(&self, ticket_id: Uuid) -> Result<TicketWithUsers, ServiceError> {
        self.db_client
            .get_ticket(ticket_id)
            .await?
            .ok_or(ServiceError::TicketNotFound(ticket_id))
    }

    /// Loads a ticket the actor is allowed to see. Absent tickets are
    /// `TicketNotFound`, hidden ones `Forbidden`.
    pub async fn load_accessible(
        &self,
        actor: &User,
        ticket_id: Uuid,
    ) -> Result<TicketWithUsers, ServiceError> {
        let ticket = self.load_ticket(ticket_id).await?;
        access_policy::ensure_can_access(actor, &ticket.ticket)?;
        Ok(ticket)
    }

    pub async fn create_ticket(
        &self,
        actor: &User,
        subject: String,
        description: String,
        priority: Option<TicketPriority>,
    ) -> Result<TicketWithUsers, ServiceError> {
        if subject.trim().is_empty() || description.trim().is_empty() {
            return Err(ServiceError::Validation(
                "Subject and description are required".to_string(),
            ));
        }

        let ticket = self
            .db_client
            .create_ticket(
                actor.id,
                subject.trim().to_string(),
                description,
                priority.unwrap_or_default(),
            )
            .await?;

        tracing::info!("Ticket {} opened by {}", ticket.ticket.id, actor.id);
        Ok(ticket)
    }

    pub async fn get_ticket(
        &self,
        actor: &User,
        ticket_id: Uuid,
    ) -> Result<TicketDetails, ServiceError> {
        let ticket = self.load_accessible(actor, ticket_id).await?;
        let comments = self.db_client.get_ticket_comments(ticket_id).await?;
        let attachments = self.db_client.get_ticket_attachments(ticket_id).await?;

        Ok(TicketDetails {
            ticket,
            comments,
            attachments,
        })
    }

    /// Tickets matching `filter` that the actor may see, in creation order.
    /// Never fails on visibility: hidden rows are dropped.
    pub async fn list_tickets(
        &self,
        actor: &User,
        filter: TicketFilter,
    ) -> Result<Vec<TicketWithUsers>, ServiceError> {
        let query = match filter {
            // Role-scoped fetch; equivalent to filtering everything.
            TicketFilter::All => match actor.role {
                UserRole::Admin => TicketQuery::All,
                UserRole::SupportAgent => TicketQuery::CreatedByOrAssignedTo(actor.id),
                UserRole::User => TicketQuery::CreatedBy(actor.id),
            },
            TicketFilter::Status(status) => TicketQuery::Status(status),
            TicketFilter::Priority(priority) => TicketQuery::Priority(priority),
            TicketFilter::Search(needle) => {
                let needle = needle.trim();
                if needle.is_empty() {
                    return Ok(Vec::new());
                }
                TicketQuery::SubjectContains(needle.to_string())
            }
        };

        let candidates = self.db_client.get_tickets(&query).await?;
        let visible: Vec<TicketWithUsers> = candidates
            .into_iter()
            .filter(|t| access_policy::can_access(actor, &t.ticket))
            .collect();

        tracing::debug!("{:?} -> {} visible ticket(s) for {}", query, visible.len(), actor.id);
        Ok(visible)
    }

    pub async fn update_status(
        &self,
        actor: &User,
        ticket_id: Uuid,
        status: TicketStatus,
    ) -> Result<TicketWithUsers, ServiceError> {
        let ticket = self.load_ticket(ticket_id).await?;
        access_policy::authorize_status_update(actor, &ticket.ticket)?;

        let updated = self.db_client.update_ticket_status(ticket_id, status).await?;
        tracing::info!(
            "Ticket {} status {:?} -> {:?} by {}",
            ticket_id,
            ticket.ticket.status,
            status,
            actor.id
        );
        Ok(updated)
    }

    pub async fn assign_ticket(
        &self,
        actor: &User,
        ticket_id: Uuid,
        assignee_id: Uuid,
    ) -> Result<TicketWithUsers, ServiceError> {
        let ticket = self.load_ticket(ticket_id).await?;
        access_policy::authorize_assign(actor, &ticket.ticket)?;

        let assignee = self
            .db_client
            .get_user(Some(assignee_id), None)
            .await?
            .ok_or(ServiceError::AssigneeNotFound(assignee_id))?;
        access_policy::ensure_assignable(&assignee)?;

        // The role is checked again in the write; a concurrent demotion wins.
        let updated = self
            .db_client
            .assign_ticket(ticket_id, assignee.id)
            .await?
            .ok_or_else(|| ServiceError::forbidden("Can only assign to support agents or admins"))?;
        tracing::info!("Ticket {} assigned to {} by {}", ticket_id, assignee.id, actor.id);
        Ok(updated)
    }

    pub async fn rate_ticket(
        &self,
        actor: &User,
        ticket_id: Uuid,
        rating: i32,
        feedback: Option<String>,
    ) -> Result<TicketWithUsers, ServiceError> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(ServiceError::Validation(format!(
                "Rating must be between {} and {}",
                MIN_RATING, MAX_RATING
            )));
        }

        let ticket = self.load_ticket(ticket_id).await?;
        access_policy::authorize_rate(actor, &ticket.ticket)?;

        let feedback = feedback
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());
        let updated = self
            .db_client
            .rate_ticket(ticket_id, rating, feedback)
            .await?
            .ok_or_else(|| ServiceError::forbidden("Can only rate resolved or closed tickets"))?;
        tracing::info!("Ticket {} rated {} by {}", ticket_id, rating, actor.id);
        Ok(updated)
    }

    pub async fn add_comment(
        &self,
        actor: &User,
        ticket_id: Uuid,
        content: String,
    ) -> Result<CommentWithUser, ServiceError> {
        if content.trim().is_empty() {
            return Err(ServiceError::Validation("Comment cannot be empty".to_string()));
        }

        let ticket = self.load_ticket(ticket_id).await?;
        access_policy::authorize_comment(actor, &ticket.ticket)?;

        let comment = self
            .db_client
            .add_ticket_comment(ticket_id, actor.id, content)
            .await?;
        Ok(comment)
    }

    pub async fn get_comments(
        &self,
        actor: &User,
        ticket_id: Uuid,
    ) -> Result<Vec<CommentWithUser>, ServiceError> {
        self.load_accessible(actor, ticket_id).await?;
        let comments = self.db_client.get_ticket_comments(ticket_id).await?;
        Ok(comments)
    }
}
