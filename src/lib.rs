pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    graph_service::GraphService, lead_service::LeadService, media_service::MediaService,
    message_service::MessageService, send_service::SendService, sheet_service::SheetService,
};
use reqwest::Client;
use sqlx::PgPool;

/// Trusted server-side execution context. Handlers receive their
/// capabilities through this state rather than module-level singletons, so
/// tests can inject scoped fakes (a lazy pool, an overridden Graph base).
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub lead_service: LeadService,
    pub message_service: MessageService,
    pub graph_service: GraphService,
    pub media_service: MediaService,
    pub send_service: SendService,
    pub sheet_service: SheetService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        let lead_service = LeadService::new(pool.clone());
        let message_service = MessageService::new(pool.clone());
        let graph_service = GraphService::new(http_client.clone());
        let media_service = MediaService::new(http_client.clone());
        let send_service = SendService::new(
            graph_service.clone(),
            lead_service.clone(),
            message_service.clone(),
        );
        let sheet_service = SheetService::new(http_client, config.sheet_sync_url.clone());

        Self {
            pool,
            lead_service,
            message_service,
            graph_service,
            media_service,
            send_service,
            sheet_service,
        }
    }
}
