//! Service configuration, read from the environment (and `.env`) at startup.
//!
//! Every setting has a default so the service starts locally with only a
//! store backend available.

use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Env: `HOST`. Default: `0.0.0.0`
    pub host: String,

    /// Env: `PORT`. Default: `5000`
    pub port: u16,

    /// Env: `STORE_BACKEND` (`mongo` | `memory`). Default: `mongo`
    pub store_backend: StoreBackend,

    /// Env: `DATABASE_URL`. Default: `mongodb://localhost:27017`
    pub database_url: String,

    /// Non-default database holding the SciWeb collections.
    /// Env: `DATABASE_NAME`. Default: `sciwebdb`
    pub database_name: String,

    /// Env: `OPENAI_API_KEY`, else `OpenAiAPIKey` from the file named by `API_KEYS_FILE`
    /// (default `api_keys.json`).
    pub openai_api_key: Option<String>,

    /// Env: `OPENAI_BASE_URL`. Default: `https://api.openai.com/v1`
    pub openai_base_url: String,

    /// Env: `OPENAI_CHAT_MODEL`. Default: `gpt-4.1-mini`
    pub chat_model: String,

    /// Env: `OPENAI_TRANSCRIBE_MODEL`. Default: `whisper-1`
    pub transcribe_model: String,

    /// Env: `OPENAI_REALTIME_MODEL`. Default: `gpt-4o-realtime-preview`
    pub realtime_model: String,

    /// School-data API queried by `/ai/fetch_jupiter_data`.
    /// Env: `JUPITER_API_URL`. Default: unset (fallback file only)
    pub jupiter_api_url: Option<String>,

    /// Env: `JUPITER_FALLBACK_FILE`. Default: `jupiter_fallback.json`
    pub jupiter_fallback_file: PathBuf,

    /// Env: `STATIC_DIR`. Default: `static`
    pub static_dir: PathBuf,

    /// Comma separated. Env: `ALLOWED_ORIGINS`. Default: localhost dev origins
    pub allowed_origins: Vec<String>,

    /// Outbound HTTP timeout. Env: `HTTP_TIMEOUT_SECS`. Default: `60`
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            store_backend: StoreBackend::Mongo,
            database_url: "mongodb://localhost:27017".to_string(),
            database_name: "sciwebdb".to_string(),
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-4.1-mini".to_string(),
            transcribe_model: "whisper-1".to_string(),
            realtime_model: "gpt-4o-realtime-preview".to_string(),
            jupiter_api_url: None,
            jupiter_fallback_file: PathBuf::from("jupiter_fallback.json"),
            static_dir: PathBuf::from("static"),
            allowed_origins: vec![
                "http://localhost:5000".to_string(),
                "http://127.0.0.1:5000".to_string(),
                "http://localhost:3000".to_string(),
            ],
            http_timeout: Duration::from_secs(60),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("HOST") {
            config.host = host;
        }

        if let Some(port) = get("PORT") {
            match port.parse() {
                Ok(port) => config.port = port,
                Err(_) => log::warn!("⚠️  Invalid PORT '{}', using {}", port, config.port),
            }
        }

        if let Some(backend) = get("STORE_BACKEND") {
            config.store_backend = match backend.to_ascii_lowercase().as_str() {
                "memory" => StoreBackend::Memory,
                "mongo" | "mongodb" => StoreBackend::Mongo,
                other => {
                    log::warn!("⚠️  Unknown STORE_BACKEND '{}', using mongo", other);
                    StoreBackend::Mongo
                }
            };
        }

        if let Some(url) = get("DATABASE_URL") {
            config.database_url = url;
        }

        if let Some(name) = get("DATABASE_NAME") {
            config.database_name = name;
        }

        config.openai_api_key = get("OPENAI_API_KEY").or_else(|| {
            let path = get("API_KEYS_FILE").unwrap_or_else(|| "api_keys.json".to_string());
            load_api_key_file(Path::new(&path))
        });

        if let Some(url) = get("OPENAI_BASE_URL") {
            config.openai_base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(model) = get("OPENAI_CHAT_MODEL") {
            config.chat_model = model;
        }

        if let Some(model) = get("OPENAI_TRANSCRIBE_MODEL") {
            config.transcribe_model = model;
        }

        if let Some(model) = get("OPENAI_REALTIME_MODEL") {
            config.realtime_model = model;
        }

        config.jupiter_api_url = get("JUPITER_API_URL");

        if let Some(path) = get("JUPITER_FALLBACK_FILE") {
            config.jupiter_fallback_file = PathBuf::from(path);
        }

        if let Some(dir) = get("STATIC_DIR") {
            config.static_dir = PathBuf::from(dir);
        }

        if let Some(origins) = get("ALLOWED_ORIGINS") {
            config.allowed_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }

        if let Some(secs) = get("HTTP_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(secs) if secs > 0 => config.http_timeout = Duration::from_secs(secs),
                _ => log::warn!("⚠️  Invalid HTTP_TIMEOUT_SECS '{}', using default", secs),
            }
        }

        config
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Reads `OpenAiAPIKey` from a JSON credentials file.
fn load_api_key_file(path: &Path) -> Option<String> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            log::debug!("No API key file at {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(keys) => keys
            .get("OpenAiAPIKey")
            .and_then(|v| v.as_str())
            .filter(|k| !k.is_empty())
            .map(str::to_string),
        Err(e) => {
            log::warn!("⚠️  {} is not valid JSON: {}", path.display(), e);
            None
        }
    }
}
