use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    /// Meta app secret, HMAC key for X-Hub-Signature-256.
    pub meta_app_secret: String,
    /// Shared token echoed back during the GET subscription handshake.
    pub meta_verify_token: String,
    pub page_access_token: String,
    pub wa_access_token: String,
    pub wa_phone_number_id: String,
    pub wa_business_account_id: String,
    pub graph_api_base: String,
    pub storage_url: String,
    pub storage_bucket: String,
    pub storage_service_key: String,
    pub sheet_sync_url: Option<String>,
    pub api_rps: u32,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            meta_app_secret: get_env("META_APP_SECRET")?,
            meta_verify_token: get_env("META_VERIFY_TOKEN")?,
            page_access_token: get_env("PAGE_ACCESS_TOKEN")?,
            wa_access_token: get_env("WA_ACCESS_TOKEN")?,
            wa_phone_number_id: get_env("WA_PHONE_NUMBER_ID")?,
            wa_business_account_id: get_env("WA_BUSINESS_ACCOUNT_ID")?,
            graph_api_base: env::var("GRAPH_API_BASE")
                .unwrap_or_else(|_| "https://graph.facebook.com/v21.0".to_string()),
            storage_url: get_env("STORAGE_URL")?,
            storage_bucket: get_env("STORAGE_BUCKET")?,
            storage_service_key: get_env("STORAGE_SERVICE_KEY")?,
            sheet_sync_url: env::var("SHEET_SYNC_URL").ok(),
            api_rps: get_env_parse("API_RPS")?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse<T>(name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(name)?;
    raw.parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
