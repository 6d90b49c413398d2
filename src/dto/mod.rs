pub mod send_dto;
pub mod webhook_dto;
