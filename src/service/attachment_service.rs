// service/attachment_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{attachmentdb::AttachmentExt, db::HelpdeskDb, ticketdb::TicketExt},
    models::{
        ticketmodel::{Attachment, AttachmentWithUser},
        usermodel::User,
    },
    service::{access_policy, error::ServiceError, file_storage::ContentStore},
};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone)]
pub struct AttachmentService {
    db_client: Arc<dyn HelpdeskDb>,
    content_store: Arc<dyn ContentStore>,
    max_upload_bytes: usize,
}

impl AttachmentService {
    pub fn new(
        db_client: Arc<dyn HelpdeskDb>,
        content_store: Arc<dyn ContentStore>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            db_client,
            content_store,
            max_upload_bytes,
        }
    }

    async fn ensure_ticket_access(&self, actor: &User, ticket_id: Uuid) -> Result<(), ServiceError> {
        let ticket = self
            .db_client
            .get_ticket(ticket_id)
            .await?
            .ok_or(ServiceError::TicketNotFound(ticket_id))?;
        access_policy::ensure_can_access(actor, &ticket.ticket)
    }

    pub async fn upload(
        &self,
        actor: &User,
        ticket_id: Uuid,
        file_name: String,
        content_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Result<AttachmentWithUser, ServiceError> {
        self.ensure_ticket_access(actor, ticket_id).await?;

        if bytes.is_empty() {
            return Err(ServiceError::Validation("Uploaded file is empty".to_string()));
        }
        if bytes.len() > self.max_upload_bytes {
            return Err(ServiceError::Validation(format!(
                "File exceeds the {} byte upload limit",
                self.max_upload_bytes
            )));
        }

        let file_name = match file_name.trim() {
            "" => "file".to_string(),
            name => name.to_string(),
        };
        let file_type = content_type
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        let file_size = bytes.len() as i64;

        let handle = self.content_store.put(&file_name, &bytes).await?;

        let saved = self
            .db_client
            .save_attachment(ticket_id, actor.id, file_name, handle.clone(), file_type, file_size)
            .await;

        match saved {
            Ok(attachment) => {
                tracing::info!(
                    "Attachment {} ({} bytes) added to ticket {} by {}",
                    attachment.attachment.id,
                    file_size,
                    ticket_id,
                    actor.id
                );
                Ok(attachment)
            }
            Err(e) => {
                if let Err(cleanup) = self.content_store.delete(&handle).await {
                    tracing::warn!("Failed to remove orphaned upload {}: {}", handle, cleanup);
                }
                Err(e.into())
            }
        }
    }

    pub async fn list_for_ticket(
        &self,
        actor: &User,
        ticket_id: Uuid,
    ) -> Result<Vec<AttachmentWithUser>, ServiceError> {
        self.ensure_ticket_access(actor, ticket_id).await?;
        let attachments = self.db_client.get_ticket_attachments(ticket_id).await?;
        Ok(attachments)
    }

    /// Attachment metadata plus its bytes. Access follows the parent ticket.
    pub async fn download(
        &self,
        actor: &User,
        attachment_id: Uuid,
    ) -> Result<(Attachment, Vec<u8>), ServiceError> {
        let attachment = self
            .db_client
            .get_attachment(attachment_id)
            .await?
            .ok_or(ServiceError::AttachmentNotFound(attachment_id))?;

        self.ensure_ticket_access(actor, attachment.ticket_id).await?;

        let bytes = self
            .content_store
            .get(&attachment.file_path)
            .await?
            .ok_or_else(|| ServiceError::FileNotFound(attachment.file_name.clone()))?;

        Ok((attachment, bytes))
    }
}
