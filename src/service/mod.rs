pub mod access_policy;
pub mod attachment_service;
pub mod error;
pub mod file_storage;
pub mod ticket_service;
pub mod user_service;
