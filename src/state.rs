use std::sync::Arc;

use crate::config::Config;
use crate::database::DocumentStore;
use crate::services::{JupiterClient, OpenAiClient};
use crate::utils::AppError;

/// Shared, read-only application state handed to every handler through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub openai: OpenAiClient,
    pub jupiter: JupiterClient,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: Config) -> Result<Self, AppError> {
        Ok(Self {
            store,
            openai: OpenAiClient::new(&config)?,
            jupiter: JupiterClient::new(&config)?,
            config: Arc::new(config),
        })
    }
}
