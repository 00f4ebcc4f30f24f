pub mod usermodel;
pub mod ticketmodel;
