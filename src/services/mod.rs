pub mod event_service;
pub mod graph_service;
pub mod lead_service;
pub mod media_service;
pub mod message_service;
pub mod send_service;
pub mod sheet_service;
