pub mod identity;
pub mod lead;
pub mod message;
