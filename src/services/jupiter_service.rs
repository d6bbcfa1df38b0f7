use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{json, Value};

use crate::config::Config;
use crate::utils::AppError;

/// Where a class list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassSource {
    Jupiter,
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct JupiterClasses {
    pub classes: Vec<Value>,
    pub source: ClassSource,
}

/// Client for the school-data API, with a local file used when it is unreachable.
#[derive(Clone)]
pub struct JupiterClient {
    http: reqwest::Client,
    api_url: Option<String>,
    fallback_file: PathBuf,
}

/// Accepts either `{"classes": [...]}` or a bare array.
fn extract_classes(payload: Value) -> Option<Vec<Value>> {
    match payload {
        Value::Array(classes) => Some(classes),
        Value::Object(mut fields) => match fields.remove("classes") {
            Some(Value::Array(classes)) => Some(classes),
            _ => None,
        },
        _ => None,
    }
}

impl JupiterClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_url: config.jupiter_api_url.clone(),
            fallback_file: config.jupiter_fallback_file.clone(),
        })
    }

    async fn fetch_remote(&self, url: &str, osis: &str, password: &str) -> Result<Vec<Value>, String> {
        let response = self
            .http
            .post(url)
            .json(&json!({ "osis": osis, "password": password }))
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("status {}", response.status()));
        }

        let payload: Value = response.json().await.map_err(|e| format!("invalid JSON: {}", e))?;
        extract_classes(payload).ok_or_else(|| "response has no class list".to_string())
    }

    async fn read_fallback(path: &Path) -> Result<Vec<Value>, String> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("{}: {}", path.display(), e))?;
        let payload: Value = serde_json::from_str(&raw).map_err(|e| format!("{}: {}", path.display(), e))?;
        extract_classes(payload).ok_or_else(|| format!("{}: no class list", path.display()))
    }

    /// Fetches the student's classes, falling back to the local file on any upstream failure.
    ///
    /// Without credentials the upstream call is skipped and only the fallback file is read.
    pub async fn fetch_classes(&self, osis: &str, password: &str) -> Result<JupiterClasses, AppError> {
        let has_credentials = !osis.is_empty() && !password.is_empty();

        match &self.api_url {
            Some(url) if has_credentials => match self.fetch_remote(url, osis, password).await {
                Ok(classes) => {
                    log::info!("🏫 Fetched {} classes from Jupiter", classes.len());
                    return Ok(JupiterClasses { classes, source: ClassSource::Jupiter });
                }
                Err(e) => log::warn!("⚠️  Jupiter fetch failed ({}), using fallback file", e),
            },
            Some(_) => log::warn!("⚠️  No Jupiter credentials given, using fallback file"),
            None => {}
        }

        match Self::read_fallback(&self.fallback_file).await {
            Ok(classes) => {
                log::info!("📂 Loaded {} classes from fallback file", classes.len());
                Ok(JupiterClasses { classes, source: ClassSource::Fallback })
            }
            Err(e) => {
                log::error!("❌ Jupiter fallback unavailable: {}", e);
                Err(AppError::Unavailable("School data is unavailable".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use wiremock::matchers::{body_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(api_url: Option<String>, fallback_file: PathBuf) -> JupiterClient {
        let config = Config {
            jupiter_api_url: api_url,
            jupiter_fallback_file: fallback_file,
            ..Config::default()
        };
        JupiterClient::new(&config).unwrap()
    }

    fn fallback_with(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[tokio::test]
    async fn test_upstream_classes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({"osis": "123", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"classes": [{"name": "AP Bio"}]})))
            .mount(&server)
            .await;

        let jupiter = client(Some(server.uri()), PathBuf::from("/nonexistent.json"));
        let result = jupiter.fetch_classes("123", "pw").await.unwrap();
        assert_eq!(result.source, ClassSource::Jupiter);
        assert_eq!(result.classes, vec![json!({"name": "AP Bio"})]);
    }

    #[tokio::test]
    async fn test_falls_back_when_upstream_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let file = fallback_with(r#"[{"name": "Chemistry"}]"#);

        let jupiter = client(Some(server.uri()), file.path().to_path_buf());
        let result = jupiter.fetch_classes("123", "pw").await.unwrap();
        assert_eq!(result.source, ClassSource::Fallback);
        assert_eq!(result.classes, vec![json!({"name": "Chemistry"})]);
    }

    #[tokio::test]
    async fn test_fallback_only_when_unconfigured() {
        let file = fallback_with(r#"{"classes": [{"name": "Physics"}, {"name": "Calc"}]}"#);
        let jupiter = client(None, file.path().to_path_buf());
        let result = jupiter.fetch_classes("123", "pw").await.unwrap();
        assert_eq!(result.source, ClassSource::Fallback);
        assert_eq!(result.classes.len(), 2);
    }

    #[tokio::test]
    async fn test_no_source_available() {
        let jupiter = client(None, PathBuf::from("/nonexistent/jupiter.json"));
        assert!(matches!(jupiter.fetch_classes("123", "pw").await, Err(AppError::Unavailable(_))));
        assert!(matches!(jupiter.fetch_classes("", "").await, Err(AppError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_missing_credentials_use_fallback() {
        let file = fallback_with(r#"[{"name": "Biology"}]"#);
        let jupiter = client(None, file.path().to_path_buf());
        let result = jupiter.fetch_classes("", "").await.unwrap();
        assert_eq!(result.source, ClassSource::Fallback);
        assert_eq!(result.classes, vec![json!({"name": "Biology"})]);

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"classes": []})))
            .expect(0)
            .mount(&server)
            .await;
        let jupiter = client(Some(server.uri()), file.path().to_path_buf());
        let result = jupiter.fetch_classes("", "pw").await.unwrap();
        assert_eq!(result.source, ClassSource::Fallback);
    }

    #[test]
    fn test_source_serializes_lowercase() {
        let value = serde_json::to_value(JupiterClasses { classes: vec![], source: ClassSource::Fallback }).unwrap();
        assert_eq!(value, json!({"classes": [], "source": "fallback"}));
    }
}
