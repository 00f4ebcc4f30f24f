// service/user_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{db::HelpdeskDb, userdb::UserExt},
    error::ErrorMessage,
    models::usermodel::{User, UserRole},
    service::error::ServiceError,
    utils::password,
};

#[derive(Debug, Clone)]
pub struct UserService {
    db_client: Arc<dyn HelpdeskDb>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn password_error(err: ErrorMessage) -> ServiceError {
    match err {
        ErrorMessage::HashingError => ServiceError::Other(err.to_string()),
        _ => ServiceError::Validation(err.to_string()),
    }
}

impl UserService {
    pub fn new(db_client: Arc<dyn HelpdeskDb>) -> Self {
        Self { db_client }
    }

    /// Self-service sign up. Always creates a plain `USER`.
    pub async fn register(
        &self,
        name: String,
        email: String,
        password: String,
    ) -> Result<User, ServiceError> {
        self.create_user(name, email, password, UserRole::User).await
    }

    pub async fn create_user(
        &self,
        name: String,
        email: String,
        password: String,
        role: UserRole,
    ) -> Result<User, ServiceError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::Validation("Name is required".to_string()));
        }
        let email = normalize_email(&email);

        if self.db_client.get_user(None, Some(&email)).await?.is_some() {
            return Err(ServiceError::Conflict(ErrorMessage::EmailExist.to_string()));
        }

        let hashed_password = password::hash(password).map_err(password_error)?;

        let user = self
            .db_client
            .save_user(name, email, hashed_password, role)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    ServiceError::Conflict(ErrorMessage::EmailExist.to_string())
                }
                e => ServiceError::Database(e),
            })?;

        tracing::info!("Created {} account {}", user.role.to_str(), user.id);
        Ok(user)
    }

    /// Checks credentials. Unknown email and wrong password fail the same way.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        let wrong_credentials =
            || ServiceError::Unauthorized(ErrorMessage::WrongCredentials.to_string());

        let user = self
            .db_client
            .get_user(None, Some(&normalize_email(email)))
            .await?
            .ok_or_else(wrong_credentials)?;

        // Length rules on the submitted password must not reveal that the account exists.
        let matched = password::compare(password, &user.password).map_err(|e| match e {
            ErrorMessage::EmptyPassword | ErrorMessage::ExceededMaxPasswordLength(_) => {
                wrong_credentials()
            }
            e => ServiceError::Other(e.to_string()),
        })?;
        if !matched {
            tracing::debug!("Failed login for {}", user.id);
            return Err(wrong_credentials());
        }

        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        Ok(self.db_client.get_users().await?)
    }

    pub async fn users_by_role(&self, role: UserRole) -> Result<Vec<User>, ServiceError> {
        Ok(self.db_client.get_users_by_role(role).await?)
    }

    /// Support agents and admins, the users a ticket can be assigned to.
    pub async fn assignable_users(&self) -> Result<Vec<User>, ServiceError> {
        Ok(self.db_client.get_assignable_users().await?)
    }

    pub async fn update_user_role(
        &self,
        admin: &User,
        user_id: Uuid,
        role: UserRole,
    ) -> Result<User, ServiceError> {
        let user = self
            .db_client
            .update_user_role(user_id, role)
            .await?
            .ok_or(ServiceError::UserNotFound(user_id))?;

        tracing::info!("Admin {} set role of {} to {}", admin.id, user_id, role.to_str());
        Ok(user)
    }

    pub async fn delete_user(&self, admin: &User, user_id: Uuid) -> Result<(), ServiceError> {
        if admin.id == user_id {
            return Err(ServiceError::Validation(
                "You cannot delete your own account".to_string(),
            ));
        }

        if !self.db_client.delete_user(user_id).await? {
            return Err(ServiceError::UserNotFound(user_id));
        }

        tracing::info!("Admin {} deleted user {}", admin.id, user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{memorydb::MemoryDB, ticketdb::TicketExt},
        models::ticketmodel::{TicketPriority, TicketQuery},
    };

    fn service() -> (Arc<MemoryDB>, UserService) {
        let db = Arc::new(MemoryDB::new());
        (db.clone(), UserService::new(db))
    }

    #[tokio::test]
    async fn register_creates_plain_user_with_hashed_password() {
        let (_, service) = service();
        let user = service
            .register("Alice".into(), "  Alice@Example.com ".into(), "password123".into())
            .await
            .unwrap();

        assert_eq!(user.role, UserRole::User);
        assert_eq!(user.email, "alice@example.com");
        assert_ne!(user.password, "password123");
        assert!(password::compare("password123", &user.password).unwrap());
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let (_, service) = service();
        service
            .register("Alice".into(), "alice@example.com".into(), "password123".into())
            .await
            .unwrap();

        let err = service
            .register("Other".into(), "ALICE@example.com".into(), "password456".into())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(err.to_string(), "A user with this email already exists");
    }

    #[tokio::test]
    async fn authenticate_hides_which_part_was_wrong() {
        let (_, service) = service();
        let created = service
            .create_user(
                "Agent".into(),
                "agent@example.com".into(),
                "password123".into(),
                UserRole::SupportAgent,
            )
            .await
            .unwrap();

        let user = service
            .authenticate("Agent@example.com", "password123")
            .await
            .unwrap();
        assert_eq!(user.id, created.id);
        assert_eq!(user.role, UserRole::SupportAgent);

        let wrong_password = service
            .authenticate("agent@example.com", "nope-nope")
            .await
            .unwrap_err();
        let unknown_email = service
            .authenticate("ghost@example.com", "password123")
            .await
            .unwrap_err();
        assert!(matches!(wrong_password, ServiceError::Unauthorized(_)));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn authenticate_rejects_bad_password_shapes_like_wrong_credentials() {
        let (_, service) = service();
        service
            .register("Alice".into(), "alice@example.com".into(), "password123".into())
            .await
            .unwrap();

        let too_long = "x".repeat(65);
        for attempt in [too_long.as_str(), ""] {
            let known = service
                .authenticate("alice@example.com", attempt)
                .await
                .unwrap_err();
            let unknown = service
                .authenticate("ghost@example.com", attempt)
                .await
                .unwrap_err();

            assert!(matches!(known, ServiceError::Unauthorized(_)));
            assert_eq!(known.status_code(), unknown.status_code());
            assert_eq!(known.to_string(), unknown.to_string());
        }
    }

    #[tokio::test]
    async fn demotion_clears_assignments() {
        let (db, service) = service();
        let admin = service
            .create_user("Root".into(), "root@example.com".into(), "password123".into(), UserRole::Admin)
            .await
            .unwrap();
        let agent = service
            .create_user("Xavier".into(), "x@example.com".into(), "password123".into(), UserRole::SupportAgent)
            .await
            .unwrap();
        let ticket = db
            .create_ticket(admin.id, "Fan noise".into(), "loud".into(), TicketPriority::Low)
            .await
            .unwrap();
        db.assign_ticket(ticket.ticket.id, agent.id).await.unwrap().unwrap();

        let demoted = service
            .update_user_role(&admin, agent.id, UserRole::User)
            .await
            .unwrap();
        assert_eq!(demoted.role, UserRole::User);

        let tickets = db.get_tickets(&TicketQuery::All).await.unwrap();
        assert_eq!(tickets[0].ticket.assignee_id, None);
        assert!(service.assignable_users().await.unwrap().iter().all(|u| u.id != agent.id));

        let err = service
            .update_user_role(&admin, Uuid::new_v4(), UserRole::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn delete_user_rules() {
        let (db, service) = service();
        let admin = service
            .create_user("Root".into(), "root@example.com".into(), "password123".into(), UserRole::Admin)
            .await
            .unwrap();
        let alice = service
            .register("Alice".into(), "alice@example.com".into(), "password123".into())
            .await
            .unwrap();
        let agent = service
            .create_user("Xavier".into(), "x@example.com".into(), "password123".into(), UserRole::SupportAgent)
            .await
            .unwrap();
        let admin_ticket = db
            .create_ticket(admin.id, "Printer".into(), "jammed".into(), TicketPriority::High)
            .await
            .unwrap();
        db.assign_ticket(admin_ticket.ticket.id, agent.id)
            .await
            .unwrap()
            .unwrap();
        db.create_ticket(alice.id, "Mouse".into(), "double click".into(), TicketPriority::Medium)
            .await
            .unwrap();

        let err = service.delete_user(&admin, admin.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        service.delete_user(&admin, agent.id).await.unwrap();
        let remaining = db.get_tickets(&TicketQuery::All).await.unwrap();
        assert_eq!(remaining.len(), 2);
        let printer = db.get_ticket(admin_ticket.ticket.id).await.unwrap().unwrap();
        assert_eq!(printer.ticket.assignee_id, None);

        service.delete_user(&admin, alice.id).await.unwrap();
        let remaining = db.get_tickets(&TicketQuery::All).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].ticket.id, admin_ticket.ticket.id);
        assert_eq!(service.users_by_role(UserRole::User).await.unwrap().len(), 0);

        let err = service.delete_user(&admin, alice.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::UserNotFound(_)));
    }
}
