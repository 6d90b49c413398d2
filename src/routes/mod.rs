pub mod health;
pub mod leads;
pub mod messages;
pub mod webhook;
