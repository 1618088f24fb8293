//! HTTP client for the usuarios REST resource.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use tracing::{debug, info, warn};

use crate::error::{ApiError, Result};
use crate::model::{UserPayload, Usuario};

pub const DEFAULT_API_URL: &str = "http://localhost:3002/api/usuarios";

const CREATE_FAILED: &str = "No se pudo crear el usuario";
const UPDATE_FAILED: &str = "No se pudo editar el usuario";
const DELETE_FAILED: &str = "No se pudo eliminar el usuario";

/// Client for `GET/POST /api/usuarios` and `PUT/DELETE /api/usuarios/{id}`.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone, Debug)]
pub struct UsuariosClient {
    http: Client,
    base_url: String,
}

impl UsuariosClient {
    /// Build a client for the collection at `base_url`, e.g. `http://host/api/usuarios`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ApiError::InvalidUrl("URL cannot be empty".to_string()));
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ApiError::InvalidUrl(format!(
                "URL must start with http:// or https://: {base_url}"
            )));
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn record_url(&self, id: u64) -> String {
        format!("{}/{}", self.base_url, id)
    }

    /// Fetch the whole collection.
    pub async fn list(&self) -> Result<Vec<Usuario>> {
        debug!(url = %self.base_url, "Fetching usuarios");
        let response = self.http.get(&self.base_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Listing usuarios failed");
            return Err(ApiError::Http {
                status: status.as_u16(),
            });
        }
        let usuarios: Vec<Usuario> = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(format!("usuarios list: {e}")))?;
        debug!(count = usuarios.len(), "Fetched usuarios");
        Ok(usuarios)
    }

    pub async fn create(&self, payload: &UserPayload) -> Result<()> {
        debug!(url = %self.base_url, name = %payload.name, "Creating usuario");
        let response = self.http.post(&self.base_url).json(payload).send().await?;
        if !response.status().is_success() {
            return Err(rejection(response, "error", CREATE_FAILED).await);
        }
        info!(name = %payload.name, "Usuario created");
        Ok(())
    }

    pub async fn update(&self, id: u64, payload: &UserPayload) -> Result<()> {
        let url = self.record_url(id);
        debug!(url = %url, "Updating usuario");
        let response = self.http.put(&url).json(payload).send().await?;
        if !response.status().is_success() {
            return Err(rejection(response, "error", UPDATE_FAILED).await);
        }
        info!(id, "Usuario updated");
        Ok(())
    }

    pub async fn delete(&self, id: u64) -> Result<()> {
        let url = self.record_url(id);
        debug!(url = %url, "Deleting usuario");
        let response = self
            .http
            .delete(&url)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(rejection(response, "message", DELETE_FAILED).await);
        }
        info!(id, "Usuario deleted");
        Ok(())
    }
}

/// Turn a non-2xx mutation response into [`ApiError::Rejected`].
///
/// The message is taken from `key` in a JSON body, then from the other
/// conventional key (`error`/`message`), then `fallback`.
async fn rejection(response: Response, key: &str, fallback: &str) -> ApiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body, key).unwrap_or_else(|| fallback.to_string());
    warn!(status, message = %message, "Request rejected");
    ApiError::Rejected { status, message }
}

fn error_message(body: &str, key: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let other = if key == "error" { "message" } else { "error" };
    [key, other]
        .into_iter()
        .filter_map(|k| value.get(k).and_then(|v| v.as_str()))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_schemeless_urls() {
        let t = Duration::from_secs(1);
        assert!(matches!(UsuariosClient::new("", t), Err(ApiError::InvalidUrl(_))));
        assert!(matches!(UsuariosClient::new("localhost/api", t), Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn trailing_slash_is_dropped() {
        let c = UsuariosClient::new("http://h:1/api/usuarios/", Duration::from_secs(1)).unwrap();
        assert_eq!(c.base_url(), "http://h:1/api/usuarios");
        assert_eq!(c.record_url(4), "http://h:1/api/usuarios/4");
    }

    #[test]
    fn error_message_prefers_key_then_other_key() {
        assert_eq!(error_message(r#"{"error":"dup"}"#, "error").as_deref(), Some("dup"));
        assert_eq!(error_message(r#"{"message":"not found"}"#, "message").as_deref(), Some("not found"));
        assert_eq!(error_message(r#"{"message":"m"}"#, "error").as_deref(), Some("m"));
        assert_eq!(error_message(r#"{"error":""}"#, "error"), None);
        assert_eq!(error_message("<html>", "error"), None);
    }
}
