//! HTTP client for the opencrm server.
//!
//! ```ignore
//! use opencrm_client::CrmClient;
//!
//! let login = CrmClient::new("http://localhost:5000").login("admin", "secret").await?;
//! let client = CrmClient::new("http://localhost:5000").with_token(login.token);
//! let customers = client.list_customers(&CustomerQuery::default()).await?;
//! ```

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub use auth::LoginResponse;
pub use customer::{Customer, ImportMode};
pub use holiday::Holiday;
pub use worklog::WorkLog;

/// Header the server reads the session token from.
pub const TOKEN_HEADER: &str = "x-auth-token";

// ── Error ───────────────────────────────────────────────────────────

/// Client-side API error.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP {status}: {message}")]
    Server { status: u16, message: String },

    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    #[error("not logged in")]
    NoToken,

    #[error("decode: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ── Wire types ──────────────────────────────────────────────────────

/// Query for `GET /api/customers`. Unset fields are left off the URL.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CustomerQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

/// Response of the bulk import endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImportSummary {
    pub message: String,
    pub inserted: usize,
    pub errors: usize,
    pub total: usize,
}

/// One day's work log as `GET /api/worklog/{date}` returns it. A day
/// without an entry has an empty log.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DayLog {
    pub date: String,
    pub log: String,
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

// ── Client ──────────────────────────────────────────────────────────

/// Client for the opencrm HTTP API. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CrmClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl CrmClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// Build a request that carries the session token.
    fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let token = self.token.as_deref().ok_or(ApiError::NoToken)?;
        Ok(self.http.request(method, self.url(path)).header(TOKEN_HEADER, token))
    }

    /// Parse an API response, mapping HTTP errors to `ApiError`.
    async fn parse<R: DeserializeOwned>(resp: Response) -> Result<R, ApiError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Server { status: status.as_u16(), message: error_message(&body) });
        }
        resp.json::<R>()
            .await
            .map_err(|e| ApiError::Decode(format!("response body: {}", e)))
    }

    async fn send<R: DeserializeOwned>(req: RequestBuilder) -> Result<R, ApiError> {
        Self::parse(req.send().await?).await
    }

    // ── Auth ──

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let req = self
            .http
            .post(self.url("/auth/login"))
            .json(&json!({"username": username, "password": password}));
        Self::send(req).await
    }

    // ── Customers ──

    pub async fn list_customers(&self, query: &CustomerQuery) -> Result<Vec<Customer>, ApiError> {
        Self::send(self.authed(Method::GET, "/customers")?.query(query)).await
    }

    pub async fn get_customer(&self, id: &str) -> Result<Customer, ApiError> {
        Self::send(self.authed(Method::GET, &format!("/customers/{}", id))?).await
    }

    pub async fn create_customer(&self, fields: &Value) -> Result<Customer, ApiError> {
        Self::send(self.authed(Method::POST, "/customers")?.json(fields)).await
    }

    /// Merge-patch a customer. `null` values clear fields.
    pub async fn update_customer(&self, id: &str, patch: &Value) -> Result<Customer, ApiError> {
        Self::send(self.authed(Method::PATCH, &format!("/customers/{}", id))?.json(patch)).await
    }

    pub async fn delete_customer(&self, id: &str) -> Result<String, ApiError> {
        let body: MessageBody = Self::send(self.authed(Method::DELETE, &format!("/customers/{}", id))?).await?;
        Ok(body.message)
    }

    /// Upload a batch of rows. `Replace` swaps the whole table, `Append`
    /// adds after the current maximum serial number.
    pub async fn import<T: Serialize>(&self, mode: ImportMode, rows: &[T]) -> Result<ImportSummary, ApiError> {
        let path = match mode {
            ImportMode::Replace => "/customers/replace",
            ImportMode::Append => "/customers/add",
        };
        tracing::debug!(mode = mode.as_str(), rows = rows.len(), "uploading customer batch");
        Self::send(self.authed(Method::POST, path)?.json(rows)).await
    }

    // ── Work log ──

    pub async fn list_worklog(&self) -> Result<Vec<WorkLog>, ApiError> {
        Self::send(self.authed(Method::GET, "/worklog")?).await
    }

    pub async fn get_worklog(&self, date: &str) -> Result<DayLog, ApiError> {
        Self::send(self.authed(Method::GET, &format!("/worklog/{}", date))?).await
    }

    /// Create or overwrite the entry for `date`.
    pub async fn save_worklog(&self, date: &str, log: &str) -> Result<WorkLog, ApiError> {
        let req = self
            .authed(Method::POST, "/worklog")?
            .json(&json!({"date": date, "log": log}));
        Self::send(req).await
    }

    pub async fn update_worklog(&self, date: &str, log: &str) -> Result<WorkLog, ApiError> {
        let req = self
            .authed(Method::PUT, &format!("/worklog/{}", date))?
            .json(&json!({"log": log}));
        Self::send(req).await
    }

    pub async fn delete_worklog(&self, date: &str) -> Result<String, ApiError> {
        let body: MessageBody = Self::send(self.authed(Method::DELETE, &format!("/worklog/{}", date))?).await?;
        Ok(body.message)
    }

    // ── Holidays ──

    pub async fn holidays(&self, year: u16) -> Result<Vec<Holiday>, ApiError> {
        Self::send(self.http.get(self.url(&format!("/holidays/{}", year)))).await
    }
}

/// Pull `message` out of a `{"code","message"}` error body, falling back
/// to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<MessageBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.to_string())
}
