// db/memorydb.rs
//! In-memory implementation of the storage traits for unit tests. Mirrors the
//! Postgres schema's behavior: insertion order is creation order, the users'
//! email column is unique, and deletes cascade the same way.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{attachmentdb::AttachmentExt, ticketdb::TicketExt, userdb::UserExt};
use crate::models::{
    ticketmodel::*,
    usermodel::{User, UserRole},
};

#[derive(Debug, Default)]
struct State {
    users: Vec<User>,
    tickets: Vec<Ticket>,
    comments: Vec<Comment>,
    attachments: Vec<Attachment>,
}

impl State {
    fn user(&self, id: Uuid) -> Result<&User, sqlx::Error> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .ok_or(sqlx::Error::RowNotFound)
    }

    fn with_users(&self, ticket: &Ticket) -> Result<TicketWithUsers, sqlx::Error> {
        let creator = self.user(ticket.creator_id)?;
        let assignee = ticket.assignee_id.and_then(|id| self.user(id).ok());

        Ok(TicketWithUsers {
            ticket: ticket.clone(),
            creator_name: creator.name.clone(),
            creator_email: creator.email.clone(),
            creator_role: creator.role,
            assignee_name: assignee.map(|a| a.name.clone()),
            assignee_email: assignee.map(|a| a.email.clone()),
            assignee_role: assignee.map(|a| a.role),
        })
    }

    fn comment_with_user(&self, comment: &Comment) -> Result<CommentWithUser, sqlx::Error> {
        let author = self.user(comment.user_id)?;
        Ok(CommentWithUser {
            comment: comment.clone(),
            user_name: author.name.clone(),
            user_email: author.email.clone(),
            user_role: author.role,
        })
    }

    fn attachment_with_user(&self, attachment: &Attachment) -> Result<AttachmentWithUser, sqlx::Error> {
        let uploader = self.user(attachment.uploaded_by)?;
        Ok(AttachmentWithUser {
            attachment: attachment.clone(),
            uploader_name: uploader.name.clone(),
            uploader_email: uploader.email.clone(),
            uploader_role: uploader.role,
        })
    }

    fn update_ticket<F>(&mut self, ticket_id: Uuid, apply: F) -> Result<TicketWithUsers, sqlx::Error>
    where
        F: FnOnce(&mut Ticket),
    {
        let ticket = self
            .tickets
            .iter_mut()
            .find(|t| t.id == ticket_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        apply(ticket);
        ticket.updated_at = Utc::now();
        let ticket = ticket.clone();
        self.with_users(&ticket)
    }
}

#[derive(Debug, Default)]
pub struct MemoryDB {
    state: Mutex<State>,
    reject_attachments: AtomicBool,
    reject_user_reads: AtomicBool,
}

impl MemoryDB {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later `save_attachment` fail as if the database went away.
    pub fn reject_attachment_saves(&self) {
        self.reject_attachments.store(true, Ordering::SeqCst);
    }

    /// Makes every later `get_user` fail.
    pub fn reject_user_reads(&self) {
        self.reject_user_reads.store(true, Ordering::SeqCst);
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("memory db lock poisoned")
    }
}

#[async_trait]
impl UserExt for MemoryDB {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        if self.reject_user_reads.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolClosed);
        }

        let state = self.state();
        let found = if let Some(user_id) = user_id {
            state.users.iter().find(|u| u.id == user_id)
        } else if let Some(email) = email {
            state.users.iter().find(|u| u.email == email)
        } else {
            None
        };
        Ok(found.cloned())
    }

    async fn get_users(&self) -> Result<Vec<User>, sqlx::Error> {
        Ok(self.state().users.clone())
    }

    async fn get_users_by_role(&self, role: UserRole) -> Result<Vec<User>, sqlx::Error> {
        Ok(self
            .state()
            .users
            .iter()
            .filter(|u| u.role == role)
            .cloned()
            .collect())
    }

    async fn get_assignable_users(&self) -> Result<Vec<User>, sqlx::Error> {
        let mut users: Vec<User> = self
            .state()
            .users
            .iter()
            .filter(|u| u.role.is_support_side())
            .cloned()
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn save_user(
        &self,
        name: String,
        email: String,
        password: String,
        role: UserRole,
    ) -> Result<User, sqlx::Error> {
        let mut state = self.state();
        if state.users.iter().any(|u| u.email == email) {
            return Err(sqlx::Error::Protocol(format!("duplicate email {}", email)));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name,
            email,
            password,
            role,
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn update_user_role(
        &self,
        user_id: Uuid,
        role: UserRole,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut state = self.state();
        let Some(user) = state.users.iter_mut().find(|u| u.id == user_id) else {
            return Ok(None);
        };
        user.role = role;
        user.updated_at = Utc::now();
        let user = user.clone();

        if !role.is_support_side() {
            for ticket in state.tickets.iter_mut().filter(|t| t.assignee_id == Some(user_id)) {
                ticket.assignee_id = None;
                ticket.updated_at = Utc::now();
            }
        }

        Ok(Some(user))
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let mut state = self.state();
        let before = state.users.len();
        state.users.retain(|u| u.id != user_id);
        if state.users.len() == before {
            return Ok(false);
        }

        let removed: Vec<Uuid> = state
            .tickets
            .iter()
            .filter(|t| t.creator_id == user_id)
            .map(|t| t.id)
            .collect();
        state.tickets.retain(|t| t.creator_id != user_id);
        for ticket in state.tickets.iter_mut().filter(|t| t.assignee_id == Some(user_id)) {
            ticket.assignee_id = None;
        }
        state
            .comments
            .retain(|c| c.user_id != user_id && !removed.contains(&c.ticket_id));
        state
            .attachments
            .retain(|a| a.uploaded_by != user_id && !removed.contains(&a.ticket_id));

        Ok(true)
    }
}

#[async_trait]
impl TicketExt for MemoryDB {
    async fn create_ticket(
        &self,
        creator_id: Uuid,
        subject: String,
        description: String,
        priority: TicketPriority,
    ) -> Result<TicketWithUsers, sqlx::Error> {
        let mut state = self.state();
        state.user(creator_id)?;

        let now = Utc::now();
        let ticket = Ticket {
            id: Uuid::new_v4(),
            subject,
            description,
            priority,
            status: TicketStatus::Open,
            creator_id,
            assignee_id: None,
            rating: None,
            feedback: None,
            created_at: now,
            updated_at: now,
        };
        state.tickets.push(ticket.clone());
        state.with_users(&ticket)
    }

    async fn get_ticket(&self, ticket_id: Uuid) -> Result<Option<TicketWithUsers>, sqlx::Error> {
        let state = self.state();
        match state.tickets.iter().find(|t| t.id == ticket_id) {
            Some(ticket) => Ok(Some(state.with_users(ticket)?)),
            None => Ok(None),
        }
    }

    async fn get_tickets(&self, query: &TicketQuery) -> Result<Vec<TicketWithUsers>, sqlx::Error> {
        let state = self.state();
        state
            .tickets
            .iter()
            .filter(|t| match query {
                TicketQuery::All => true,
                TicketQuery::CreatedBy(id) => t.creator_id == *id,
                TicketQuery::CreatedByOrAssignedTo(id) => {
                    t.creator_id == *id || t.assignee_id == Some(*id)
                }
                TicketQuery::Status(status) => t.status == *status,
                TicketQuery::Priority(priority) => t.priority == *priority,
                TicketQuery::SubjectContains(needle) => {
                    t.subject.to_lowercase().contains(&needle.to_lowercase())
                }
            })
            .map(|t| state.with_users(t))
            .collect()
    }

    async fn update_ticket_status(
        &self,
        ticket_id: Uuid,
        status: TicketStatus,
    ) -> Result<TicketWithUsers, sqlx::Error> {
        self.state().update_ticket(ticket_id, |t| t.status = status)
    }

    async fn assign_ticket(
        &self,
        ticket_id: Uuid,
        assignee_id: Uuid,
    ) -> Result<Option<TicketWithUsers>, sqlx::Error> {
        let mut state = self.state();
        let qualifies = state
            .user(assignee_id)
            .map(|u| u.role.is_support_side())
            .unwrap_or(false);
        if !qualifies || !state.tickets.iter().any(|t| t.id == ticket_id) {
            return Ok(None);
        }
        state
            .update_ticket(ticket_id, |t| t.assignee_id = Some(assignee_id))
            .map(Some)
    }

    async fn rate_ticket(
        &self,
        ticket_id: Uuid,
        rating: i32,
        feedback: Option<String>,
    ) -> Result<Option<TicketWithUsers>, sqlx::Error> {
        let mut state = self.state();
        let rateable = state
            .tickets
            .iter()
            .any(|t| t.id == ticket_id && t.status.is_rateable());
        if !rateable {
            return Ok(None);
        }
        state
            .update_ticket(ticket_id, |t| {
                t.rating = Some(rating);
                t.feedback = feedback;
            })
            .map(Some)
    }

    async fn add_ticket_comment(
        &self,
        ticket_id: Uuid,
        user_id: Uuid,
        content: String,
    ) -> Result<CommentWithUser, sqlx::Error> {
        let mut state = self.state();
        if !state.tickets.iter().any(|t| t.id == ticket_id) {
            return Err(sqlx::Error::RowNotFound);
        }

        let comment = Comment {
            id: Uuid::new_v4(),
            ticket_id,
            user_id,
            content,
            created_at: Utc::now(),
        };
        let with_user = state.comment_with_user(&comment)?;
        state.comments.push(comment);
        Ok(with_user)
    }

    async fn get_ticket_comments(&self, ticket_id: Uuid) -> Result<Vec<CommentWithUser>, sqlx::Error> {
        let state = self.state();
        state
            .comments
            .iter()
            .filter(|c| c.ticket_id == ticket_id)
            .map(|c| state.comment_with_user(c))
            .collect()
    }
}

#[async_trait]
impl AttachmentExt for MemoryDB {
    async fn save_attachment(
        &self,
        ticket_id: Uuid,
        uploaded_by: Uuid,
        file_name: String,
        file_path: String,
        file_type: String,
        file_size: i64,
    ) -> Result<AttachmentWithUser, sqlx::Error> {
        if self.reject_attachments.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolClosed);
        }

        let mut state = self.state();
        if !state.tickets.iter().any(|t| t.id == ticket_id) {
            return Err(sqlx::Error::RowNotFound);
        }

        let attachment = Attachment {
            id: Uuid::new_v4(),
            ticket_id,
            file_name,
            file_path,
            file_type,
            file_size,
            uploaded_by,
            uploaded_at: Utc::now(),
        };
        let with_user = state.attachment_with_user(&attachment)?;
        state.attachments.push(attachment);
        Ok(with_user)
    }

    async fn get_attachment(&self, attachment_id: Uuid) -> Result<Option<Attachment>, sqlx::Error> {
        Ok(self
            .state()
            .attachments
            .iter()
            .find(|a| a.id == attachment_id)
            .cloned())
    }

    async fn get_ticket_attachments(
        &self,
        ticket_id: Uuid,
    ) -> Result<Vec<AttachmentWithUser>, sqlx::Error> {
        let state = self.state();
        state
            .attachments
            .iter()
            .filter(|a| a.ticket_id == ticket_id)
            .map(|a| state.attachment_with_user(a))
            .collect()
    }
}
