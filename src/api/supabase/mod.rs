//! Client for the hosted backend-as-a-service.
//!
//! Three services share one project URL and anon key:
//!
//! - `auth/v1`: sessions and user accounts ([`auth`])
//! - `rest/v1`: the `tasks` and `profiles` tables ([`rest`])
//! - `realtime/v1`: row-change notifications over a websocket ([`realtime`])
//!
//! The session is cached in memory and persisted encrypted in the data
//! directory so a later invocation starts signed in.

pub mod auth;
pub mod realtime;
pub mod rest;

use super::{AuthError, RemoteError};
use crate::libs::config::{Config, ConfigModule};
use crate::libs::messages::Message;
use crate::libs::secret::Secret;
use crate::{msg_error_anyhow, msg_print};
use anyhow::Result;
use auth::Session;
use dialoguer::{theme::ColorfulTheme, Input};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

const SESSION_FILE: &str = ".session";

/// Connection settings of a hosted project.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

impl SupabaseConfig {
    pub fn module() -> ConfigModule {
        ConfigModule {
            key: "backend".to_string(),
            name: "Backend".to_string(),
        }
    }

    pub fn init(config: &Option<SupabaseConfig>) -> Result<Self> {
        let config = config.clone().unwrap_or(Self {
            url: String::new(),
            anon_key: String::new(),
        });
        msg_print!(Message::ConfigModuleBackend);
        Ok(Self {
            url: Input::with_theme(&ColorfulTheme::default())
                .with_prompt(Message::PromptBackendUrl.to_string())
                .default(config.url)
                .validate_with(|input: &String| Url::parse(input).map(|_| ()).map_err(|e| e.to_string()))
                .interact_text()?,
            anon_key: Input::with_theme(&ColorfulTheme::default())
                .with_prompt(Message::PromptBackendAnonKey.to_string())
                .default(config.anon_key)
                .interact_text()?,
        })
    }
}

pub struct SupabaseClient {
    http: Client,
    base: Url,
    anon_key: String,
    vault: Secret,
    session: parking_lot::Mutex<Option<Session>>,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl SupabaseClient {
    /// Builds a client from the backend section of the configuration,
    /// restoring a persisted session if there is one.
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend = config.backend.as_ref().ok_or_else(|| msg_error_anyhow!(Message::BackendNotConfigured))?;
        Self::new(backend, Secret::new(SESSION_FILE))
    }

    /// Builds a client that keeps its session in `vault`.
    pub fn new(config: &SupabaseConfig, vault: Secret) -> Result<Self> {
        let mut base = Url::parse(&config.url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let session = Session::restore(&vault);
        if let Some(session) = &session {
            tracing::debug!(user = %session.user.id, "restored session");
        }

        Ok(Self {
            http: Client::new(),
            base,
            anon_key: config.anon_key.clone(),
            vault,
            session: parking_lot::Mutex::new(session),
            refresh_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
        self.base.join(path).map_err(|e| RemoteError::Transport(e.to_string()))
    }

    /// Request carrying the project key and, when given, a user token.
    pub(crate) fn request(&self, builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        let bearer = token.unwrap_or(&self.anon_key);
        builder.header("apikey", &self.anon_key).bearer_auth(bearer)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    pub(crate) fn anon_key(&self) -> &str {
        &self.anon_key
    }

    pub(crate) fn base(&self) -> &Url {
        &self.base
    }

    /// Sends a request built by `build` with the current access token.
    ///
    /// A `401` triggers one session refresh and one retry. A session that
    /// cannot be refreshed is dropped and reported as not authorized.
    pub(crate) async fn send_authorized<F>(&self, build: F) -> Result<Response, RemoteError>
    where
        F: Fn(&str) -> RequestBuilder,
    {
        let token = self.access_token().await?;
        let response = build(&token).send().await.map_err(transport)?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::debug!("access token rejected, refreshing session");
        let token = self.refresh(&token).await?;
        let response = build(&token).send().await.map_err(transport)?;
        if response.status() == StatusCode::UNAUTHORIZED {
            self.forget_session();
            return Err(AuthError::NotAuthorized("session was rejected".to_string()).into());
        }
        Ok(response)
    }
}

pub(crate) fn transport(error: reqwest::Error) -> RemoteError {
    RemoteError::Transport(error.to_string())
}

/// Error body shapes used by the REST and auth services.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    /// Machine-readable code, if the service sent one.
    pub fn code(&self) -> Option<&str> {
        self.error_code
            .as_deref()
            .or(self.error.as_deref())
            .or_else(|| self.code.as_ref().and_then(|c| c.as_str()))
    }

    pub fn text(&self, fallback: &str) -> String {
        self.msg
            .as_deref()
            .or(self.message.as_deref())
            .or(self.error_description.as_deref())
            .or(self.error.as_deref())
            .unwrap_or(fallback)
            .to_string()
    }
}

/// Reads a failed response into a [`RemoteError`].
pub(crate) async fn rejection(response: Response) -> RemoteError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    remote_error(status, &body)
}

pub(crate) fn remote_error(status: StatusCode, body: &str) -> RemoteError {
    let message = ErrorBody::parse(body).text(status.canonical_reason().unwrap_or("request failed"));
    match status {
        StatusCode::UNAUTHORIZED => RemoteError::Unauthorized(message),
        StatusCode::NOT_FOUND => RemoteError::NotFound(message),
        _ => RemoteError::Rejected {
            status: status.as_u16(),
            message,
        },
    }
}
