// db/ticketdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::ticketmodel::*;

/// Select list shared by every query returning `TicketWithUsers`. The ticket
/// row must be aliased `t`.
const TICKET_COLUMNS: &str = r#"
    t.*,
    c.name AS creator_name,
    c.email AS creator_email,
    c.role AS creator_role,
    a.name AS assignee_name,
    a.email AS assignee_email,
    a.role AS assignee_role
"#;

const TICKET_JOINS: &str = r#"
    JOIN users c ON t.creator_id = c.id
    LEFT JOIN users a ON t.assignee_id = a.id
"#;

const COMMENT_COLUMNS: &str = r#"
    cm.*,
    u.name AS user_name,
    u.email AS user_email,
    u.role AS user_role
"#;

#[async_trait]
pub trait TicketExt {
    async fn create_ticket(
        &self,
        creator_id: Uuid,
        subject: String,
        description: String,
        priority: TicketPriority,
    ) -> Result<TicketWithUsers, sqlx::Error>;

    async fn get_ticket(
        &self,
        ticket_id: Uuid,
    ) -> Result<Option<TicketWithUsers>, sqlx::Error>;

    /// Candidate tickets in creation order.
    async fn get_tickets(
        &self,
        query: &TicketQuery,
    ) -> Result<Vec<TicketWithUsers>, sqlx::Error>;

    async fn update_ticket_status(
        &self,
        ticket_id: Uuid,
        status: TicketStatus,
    ) -> Result<TicketWithUsers, sqlx::Error>;

    /// Sets the assignee only while they still hold a support-side role.
    /// `None` when the ticket is gone or the assignee no longer qualifies.
    async fn assign_ticket(
        &self,
        ticket_id: Uuid,
        assignee_id: Uuid,
    ) -> Result<Option<TicketWithUsers>, sqlx::Error>;

    /// Records a rating only while the ticket is resolved or closed.
    async fn rate_ticket(
        &self,
        ticket_id: Uuid,
        rating: i32,
        feedback: Option<String>,
    ) -> Result<Option<TicketWithUsers>, sqlx::Error>;

    async fn add_ticket_comment(
        &self,
        ticket_id: Uuid,
        user_id: Uuid,
        content: String,
    ) -> Result<CommentWithUser, sqlx::Error>;

    async fn get_ticket_comments(
        &self,
        ticket_id: Uuid,
    ) -> Result<Vec<CommentWithUser>, sqlx::Error>;
}

#[async_trait]
impl TicketExt for DBClient {
    async fn create_ticket(
        &self,
        creator_id: Uuid,
        subject: String,
        description: String,
        priority: TicketPriority,
    ) -> Result<TicketWithUsers, sqlx::Error> {
        let sql = format!(
            r#"
            WITH t AS (
                INSERT INTO tickets (subject, description, priority, status, creator_id)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            SELECT {TICKET_COLUMNS} FROM t {TICKET_JOINS}
            "#
        );

        let ticket = sqlx::query_as::<_, TicketWithUsers>(&sql)
            .bind(subject)
            .bind(description)
            .bind(priority)
            .bind(TicketStatus::Open)
            .bind(creator_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(ticket)
    }

    async fn get_ticket(
        &self,
        ticket_id: Uuid,
    ) -> Result<Option<TicketWithUsers>, sqlx::Error> {
        let sql = format!(
            r#"SELECT {TICKET_COLUMNS} FROM tickets t {TICKET_JOINS} WHERE t.id = $1"#
        );

        let ticket = sqlx::query_as::<_, TicketWithUsers>(&sql)
            .bind(ticket_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(ticket)
    }

    async fn get_tickets(
        &self,
        query: &TicketQuery,
    ) -> Result<Vec<TicketWithUsers>, sqlx::Error> {
        let condition = match query {
            TicketQuery::All => "TRUE",
            TicketQuery::CreatedBy(_) => "t.creator_id = $1",
            TicketQuery::CreatedByOrAssignedTo(_) => "(t.creator_id = $1 OR t.assignee_id = $1)",
            TicketQuery::Status(_) => "t.status = $1",
            TicketQuery::Priority(_) => "t.priority = $1",
            TicketQuery::SubjectContains(_) => "strpos(lower(t.subject), lower($1)) > 0",
        };

        let sql = format!(
            r#"
            SELECT {TICKET_COLUMNS}
            FROM tickets t
            {TICKET_JOINS}
            WHERE {condition}
            ORDER BY t.created_at ASC, t.id ASC
            "#
        );

        let base = sqlx::query_as::<_, TicketWithUsers>(&sql);
        let bound = match query {
            TicketQuery::All => base,
            TicketQuery::CreatedBy(user_id)
            | TicketQuery::CreatedByOrAssignedTo(user_id) => base.bind(*user_id),
            TicketQuery::Status(status) => base.bind(*status),
            TicketQuery::Priority(priority) => base.bind(*priority),
            TicketQuery::SubjectContains(needle) => base.bind(needle.clone()),
        };

        let tickets = bound.fetch_all(&self.pool).await?;
        Ok(tickets)
    }

    async fn update_ticket_status(
        &self,
        ticket_id: Uuid,
        status: TicketStatus,
    ) -> Result<TicketWithUsers, sqlx::Error> {
        let sql = format!(
            r#"
            WITH t AS (
                UPDATE tickets
                SET status = $1, updated_at = NOW()
                WHERE id = $2
                RETURNING *
            )
            SELECT {TICKET_COLUMNS} FROM t {TICKET_JOINS}
            "#
        );

        let ticket = sqlx::query_as::<_, TicketWithUsers>(&sql)
            .bind(status)
            .bind(ticket_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(ticket)
    }

    async fn assign_ticket(
        &self,
        ticket_id: Uuid,
        assignee_id: Uuid,
    ) -> Result<Option<TicketWithUsers>, sqlx::Error> {
        let sql = format!(
            r#"
            WITH t AS (
                UPDATE tickets
                SET assignee_id = $1, updated_at = NOW()
                WHERE id = $2
                  AND EXISTS (
                      SELECT 1 FROM users
                      WHERE id = $1 AND role IN ('support_agent', 'admin')
                  )
                RETURNING *
            )
            SELECT {TICKET_COLUMNS} FROM t {TICKET_JOINS}
            "#
        );

        let ticket = sqlx::query_as::<_, TicketWithUsers>(&sql)
            .bind(assignee_id)
            .bind(ticket_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(ticket)
    }

    async fn rate_ticket(
        &self,
        ticket_id: Uuid,
        rating: i32,
        feedback: Option<String>,
    ) -> Result<Option<TicketWithUsers>, sqlx::Error> {
        let sql = format!(
            r#"
            WITH t AS (
                UPDATE tickets
                SET rating = $1, feedback = $2, updated_at = NOW()
                WHERE id = $3 AND status IN ('resolved', 'closed')
                RETURNING *
            )
            SELECT {TICKET_COLUMNS} FROM t {TICKET_JOINS}
            "#
        );

        let ticket = sqlx::query_as::<_, TicketWithUsers>(&sql)
            .bind(rating)
            .bind(feedback)
            .bind(ticket_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(ticket)
    }

    async fn add_ticket_comment(
        &self,
        ticket_id: Uuid,
        user_id: Uuid,
        content: String,
    ) -> Result<CommentWithUser, sqlx::Error> {
        let sql = format!(
            r#"
            WITH cm AS (
                INSERT INTO comments (ticket_id, user_id, content)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            SELECT {COMMENT_COLUMNS}
            FROM cm
            JOIN users u ON cm.user_id = u.id
            "#
        );

        let comment = sqlx::query_as::<_, CommentWithUser>(&sql)
            .bind(ticket_id)
            .bind(user_id)
            .bind(content)
            .fetch_one(&self.pool)
            .await?;

        Ok(comment)
    }

    async fn get_ticket_comments(
        &self,
        ticket_id: Uuid,
    ) -> Result<Vec<CommentWithUser>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments cm
            JOIN users u ON cm.user_id = u.id
            WHERE cm.ticket_id = $1
            ORDER BY cm.created_at ASC, cm.id ASC
            "#
        );

        let comments = sqlx::query_as::<_, CommentWithUser>(&sql)
            .bind(ticket_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(comments)
    }
}
