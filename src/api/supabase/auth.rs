//! Session handling and the [`AuthProvider`] implementation.

use super::{rejection, transport, ErrorBody, SupabaseClient};
use crate::api::{AuthError, AuthProvider, RemoteError, User};
use crate::libs::secret::Secret;
use crate::libs::task::UserId;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Refresh this long before the access token actually expires.
const EXPIRY_MARGIN_SECS: i64 = 30;

/// A signed-in session as persisted at rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) >= self.expires_at
    }

    /// Loads the persisted session; anything unreadable counts as signed out.
    pub fn restore(vault: &Secret) -> Option<Self> {
        if !vault.exists() {
            return None;
        }
        match vault.load().and_then(|raw| Ok(serde_json::from_str::<Session>(&raw)?)) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable session");
                let _ = vault.clear();
                None
            }
        }
    }

    pub fn persist(&self, vault: &Secret) {
        let stored = serde_json::to_string(self).map_err(anyhow::Error::from).and_then(|raw| vault.store(&raw));
        if let Err(e) = stored {
            tracing::warn!(error = %e, "failed to persist session");
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: AccountUser,
}

#[derive(Debug, Deserialize)]
struct AccountUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: serde_json::Map<String, serde_json::Value>,
}

impl From<AccountUser> for User {
    fn from(account: AccountUser) -> Self {
        let name = account.user_metadata.get("name").and_then(|v| v.as_str()).map(str::to_string);
        User {
            id: UserId::new(account.id),
            email: account.email.unwrap_or_default(),
            name,
        }
    }
}

/// Sign-up answers with a session when email confirmation is off and with
/// the bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(AccountUser),
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: now + Duration::seconds(self.expires_in),
            user: self.user.into(),
        }
    }
}

/// Classifies an auth service failure.
pub(crate) fn auth_error(status: StatusCode, body: &str) -> AuthError {
    let parsed = ErrorBody::parse(body);
    let message = parsed.text(status.canonical_reason().unwrap_or("authentication failed"));
    match parsed.code() {
        Some("invalid_credentials") | Some("invalid_grant") => AuthError::InvalidCredentials,
        Some("user_not_found") => AuthError::UserNotFound,
        Some("email_address_not_authorized") => AuthError::NotAuthorized(message),
        _ if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN => AuthError::NotAuthorized(message),
        _ => AuthError::Unknown(message),
    }
}

async fn auth_failure(response: Response) -> AuthError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    auth_error(status, &body)
}

fn auth_transport(error: reqwest::Error) -> AuthError {
    AuthError::Unknown(format!("Network error: {}", error))
}

fn endpoint_error(error: RemoteError) -> AuthError {
    match error {
        RemoteError::Auth(e) => e,
        other => AuthError::Unknown(other.to_string()),
    }
}

impl SupabaseClient {
    fn adopt(&self, session: Session) -> User {
        session.persist(&self.vault);
        let user = session.user.clone();
        *self.session.lock() = Some(session);
        user
    }

    pub(crate) fn forget_session(&self) {
        *self.session.lock() = None;
        if let Err(e) = self.vault.clear() {
            tracing::warn!(error = %e, "failed to remove stored session");
        }
    }

    fn cached_session(&self) -> Option<Session> {
        self.session.lock().clone()
    }

    /// A valid access token, refreshing an expired session first.
    pub(crate) async fn access_token(&self) -> Result<String, RemoteError> {
        let session = self
            .cached_session()
            .ok_or_else(|| AuthError::NotAuthorized("no session".to_string()))?;
        if session.is_expired(Utc::now()) {
            return self.refresh(&session.access_token).await;
        }
        Ok(session.access_token)
    }

    /// Exchanges the refresh token for a new session.
    ///
    /// `stale` is the token that was found wanting. If another caller already
    /// replaced it, the newer token is returned without a second exchange.
    pub(crate) async fn refresh(&self, stale: &str) -> Result<String, RemoteError> {
        let _guard = self.refresh_lock.lock().await;
        let session = self
            .cached_session()
            .ok_or_else(|| AuthError::NotAuthorized("no session".to_string()))?;
        if session.access_token != stale {
            return Ok(session.access_token);
        }

        let url = self.endpoint("auth/v1/token?grant_type=refresh_token")?;
        let response = self
            .request(self.http().post(url), None)
            .json(&json!({ "refresh_token": session.refresh_token }))
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let error = rejection(response).await;
            if status.is_client_error() {
                tracing::info!("session refresh rejected, signing out locally");
                self.forget_session();
                return Err(AuthError::NotAuthorized(error.to_string()).into());
            }
            return Err(error);
        }

        let token: TokenResponse = response.json().await.map_err(|e| RemoteError::Decode(e.to_string()))?;
        let session = token.into_session(Utc::now());
        let access = session.access_token.clone();
        self.adopt(session);
        tracing::debug!("session refreshed");
        Ok(access)
    }
}

impl AuthProvider for SupabaseClient {
    async fn current_user(&self) -> Result<Option<User>, AuthError> {
        let Some(session) = self.cached_session() else {
            return Ok(None);
        };
        if !session.is_expired(Utc::now()) {
            return Ok(Some(session.user));
        }
        match self.refresh(&session.access_token).await {
            Ok(_) => Ok(self.cached_session().map(|s| s.user)),
            Err(RemoteError::Auth(AuthError::NotAuthorized(_))) => Ok(None),
            Err(e) => Err(endpoint_error(e)),
        }
    }

    async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<User, AuthError> {
        let url = self.endpoint("auth/v1/signup").map_err(endpoint_error)?;
        tracing::debug!(%email, "signing up");
        let response = self
            .request(self.http().post(url), None)
            .json(&json!({ "email": email, "password": password, "data": { "name": name } }))
            .send()
            .await
            .map_err(auth_transport)?;
        if !response.status().is_success() {
            return Err(auth_failure(response).await);
        }

        match response.json::<SignUpResponse>().await.map_err(|e| AuthError::Unknown(e.to_string()))? {
            SignUpResponse::Session(token) => Ok(self.adopt(token.into_session(Utc::now()))),
            SignUpResponse::User(user) => Ok(user.into()),
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let url = self.endpoint("auth/v1/token?grant_type=password").map_err(endpoint_error)?;
        tracing::debug!(%email, "signing in");
        let response = self
            .request(self.http().post(url), None)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(auth_transport)?;
        if !response.status().is_success() {
            return Err(auth_failure(response).await);
        }

        let token: TokenResponse = response.json().await.map_err(|e| AuthError::Unknown(e.to_string()))?;
        Ok(self.adopt(token.into_session(Utc::now())))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let Some(session) = self.cached_session() else {
            return Ok(());
        };
        // The local session goes away whatever the server says.
        self.forget_session();

        let url = self.endpoint("auth/v1/logout").map_err(endpoint_error)?;
        let response = self
            .request(self.http().post(url), Some(&session.access_token))
            .send()
            .await
            .map_err(auth_transport)?;
        if response.status().is_success() || response.status() == StatusCode::UNAUTHORIZED {
            Ok(())
        } else {
            Err(auth_failure(response).await)
        }
    }

    async fn update_profile(&self, name: &str) -> Result<(), AuthError> {
        let user_url = self.endpoint("auth/v1/user").map_err(endpoint_error)?;
        let response = self
            .send_authorized(|token| {
                self.request(self.http().put(user_url.clone()), Some(token))
                    .json(&json!({ "data": { "name": name } }))
            })
            .await
            .map_err(endpoint_error)?;
        if !response.status().is_success() {
            return Err(auth_failure(response).await);
        }

        let Some(mut session) = self.cached_session() else {
            return Err(AuthError::NotAuthorized("no session".to_string()));
        };
        let mut profile_url = self.endpoint("rest/v1/profiles").map_err(endpoint_error)?;
        profile_url
            .query_pairs_mut()
            .append_pair("id", &format!("eq.{}", session.user.id));
        let response = self
            .send_authorized(|token| {
                self.request(self.http().patch(profile_url.clone()), Some(token))
                    .json(&json!({ "name": name }))
            })
            .await
            .map_err(endpoint_error)?;
        if !response.status().is_success() {
            return Err(auth_failure(response).await);
        }

        session.user.name = Some(name.to_string());
        self.adopt(session);
        Ok(())
    }

    async fn update_password(&self, new_password: &str) -> Result<(), AuthError> {
        let url = self.endpoint("auth/v1/user").map_err(endpoint_error)?;
        let response = self
            .send_authorized(|token| {
                self.request(self.http().put(url.clone()), Some(token))
                    .json(&json!({ "password": new_password }))
            })
            .await
            .map_err(endpoint_error)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(auth_failure(response).await)
        }
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let url = self.endpoint("auth/v1/recover").map_err(endpoint_error)?;
        let response = self
            .request(self.http().post(url), None)
            .json(&json!({ "email": email }))
            .send()
            .await
            .map_err(auth_transport)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(auth_failure(response).await)
        }
    }
}
