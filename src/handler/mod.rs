pub mod admin;
pub mod auth;
pub mod files;
pub mod tickets;
pub mod users;
