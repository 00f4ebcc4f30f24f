// db/attachmentdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::ticketmodel::{Attachment, AttachmentWithUser};

const ATTACHMENT_COLUMNS: &str = r#"
    att.*,
    u.name AS uploader_name,
    u.email AS uploader_email,
    u.role AS uploader_role
"#;

#[async_trait]
pub trait AttachmentExt {
    async fn save_attachment(
        &self,
        ticket_id: Uuid,
        uploaded_by: Uuid,
        file_name: String,
        file_path: String,
        file_type: String,
        file_size: i64,
    ) -> Result<AttachmentWithUser, sqlx::Error>;

    async fn get_attachment(
        &self,
        attachment_id: Uuid,
    ) -> Result<Option<Attachment>, sqlx::Error>;

    async fn get_ticket_attachments(
        &self,
        ticket_id: Uuid,
    ) -> Result<Vec<AttachmentWithUser>, sqlx::Error>;
}

#[async_trait]
impl AttachmentExt for DBClient {
    async fn save_attachment(
        &self,
        ticket_id: Uuid,
        uploaded_by: Uuid,
        file_name: String,
        file_path: String,
        file_type: String,
        file_size: i64,
    ) -> Result<AttachmentWithUser, sqlx::Error> {
        let sql = format!(
            r#"
            WITH att AS (
                INSERT INTO attachments (ticket_id, uploaded_by, file_name, file_path, file_type, file_size)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
            )
            SELECT {ATTACHMENT_COLUMNS}
            FROM att
            JOIN users u ON att.uploaded_by = u.id
            "#
        );

        let attachment = sqlx::query_as::<_, AttachmentWithUser>(&sql)
            .bind(ticket_id)
            .bind(uploaded_by)
            .bind(file_name)
            .bind(file_path)
            .bind(file_type)
            .bind(file_size)
            .fetch_one(&self.pool)
            .await?;

        Ok(attachment)
    }

    async fn get_attachment(
        &self,
        attachment_id: Uuid,
    ) -> Result<Option<Attachment>, sqlx::Error> {
        let attachment = sqlx::query_as::<_, Attachment>(
            r#"SELECT * FROM attachments WHERE id = $1"#
        )
        .bind(attachment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attachment)
    }

    async fn get_ticket_attachments(
        &self,
        ticket_id: Uuid,
    ) -> Result<Vec<AttachmentWithUser>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {ATTACHMENT_COLUMNS}
            FROM attachments att
            JOIN users u ON att.uploaded_by = u.id
            WHERE att.ticket_id = $1
            ORDER BY att.uploaded_at ASC, att.id ASC
            "#
        );

        let attachments = sqlx::query_as::<_, AttachmentWithUser>(&sql)
            .bind(ticket_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(attachments)
    }
}
