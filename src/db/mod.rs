pub mod db;
pub mod userdb;
pub mod ticketdb;
pub mod attachmentdb;
#[cfg(test)]
pub mod memorydb;
