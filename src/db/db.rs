// db/db.rs
use sqlx::{Pool, Postgres};

use super::{attachmentdb::AttachmentExt, ticketdb::TicketExt, userdb::UserExt};

#[derive(Clone)]
pub struct DBClient {
    pub pool: Pool<Postgres>,
}

impl std::fmt::Debug for DBClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DBClient")
            .field("pool", &"Pool<Postgres>")
            .finish()
    }
}

impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }
}

/// Everything the services need from storage. Implemented by [`DBClient`] for
/// Postgres and by the in-memory store used in tests.
pub trait HelpdeskDb: UserExt + TicketExt + AttachmentExt + std::fmt::Debug + Send + Sync {}

impl<T> HelpdeskDb for T where T: UserExt + TicketExt + AttachmentExt + std::fmt::Debug + Send + Sync {}
