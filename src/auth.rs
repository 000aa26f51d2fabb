//! Authentication gate for the admin dashboard.
//!
//! Consumers only need two things from it: whether someone is signed in,
//! and a way to sign out. Two implementations exist:
//! - [`StaticAuthenticator`]: one configured admin credential, with the
//!   signed-in user remembered in key/value storage.
//! - [`HostedAuthenticator`]: email/password accounts on a hosted identity
//!   endpoint.

use crate::db::KeyValueStorage;
use crate::error::StoreError;
use crate::store::remote::backend_message;
use crate::store::RestClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

/// Storage key for the signed-in marker.
pub const AUTH_KEY: &str = "church_auth";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub name: String,
    pub role: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("username and password are required")]
    MissingCredentials,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("{0} is not supported by this authenticator")]
    Unsupported(&'static str),

    /// The identity service refused the request.
    #[error("identity service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Store(StoreError::Http(err))
    }
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<User, AuthError>;

    async fn signup(&self, _email: &str, _password: &str) -> Result<User, AuthError> {
        Err(AuthError::Unsupported("signup"))
    }

    async fn logout(&self) -> Result<(), AuthError>;

    fn current_user(&self) -> Option<User>;

    fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }
}

fn require_credentials(username: &str, password: &str) -> Result<(), AuthError> {
    if username.trim().is_empty() || password.trim().is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    Ok(())
}

// ============================================================================
// STATIC CREDENTIAL
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
    pub name: String,
    pub role: String,
}

impl Default for AdminCredentials {
    fn default() -> Self {
        AdminCredentials {
            username: "admin".to_string(),
            password: "admin123".to_string(),
            name: "Admin Gereja".to_string(),
            role: "Administrator".to_string(),
        }
    }
}

pub struct StaticAuthenticator {
    credentials: AdminCredentials,
    storage: Arc<dyn KeyValueStorage>,
    user: RwLock<Option<User>>,
}

impl StaticAuthenticator {
    /// Restores a previous sign-in from `storage` if one was persisted.
    pub fn new(credentials: AdminCredentials, storage: Arc<dyn KeyValueStorage>) -> Self {
        let restored = match storage.get_item(AUTH_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, "ignoring malformed sign-in marker");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "could not read sign-in marker");
                None
            }
        };

        StaticAuthenticator {
            credentials,
            storage,
            user: RwLock::new(restored),
        }
    }

    fn set_user(&self, user: Option<User>) {
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = user;
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        require_credentials(username, password)?;

        if username != self.credentials.username || password != self.credentials.password {
            warn!(username, "failed sign-in");
            return Err(AuthError::InvalidCredentials);
        }

        let user = User {
            username: self.credentials.username.clone(),
            name: self.credentials.name.clone(),
            role: self.credentials.role.clone(),
        };
        self.storage
            .set_item(AUTH_KEY, &serde_json::to_string(&user).map_err(StoreError::from)?)?;
        self.set_user(Some(user.clone()));

        info!(username, "signed in");
        Ok(user)
    }

    async fn logout(&self) -> Result<(), AuthError> {
        self.set_user(None);
        self.storage.remove_item(AUTH_KEY)?;
        info!("signed out");
        Ok(())
    }

    fn current_user(&self) -> Option<User> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

// ============================================================================
// HOSTED IDENTITY SERVICE
// ============================================================================

#[derive(Debug, Clone)]
struct Session {
    access_token: Option<String>,
    user: User,
}

#[derive(Debug, Deserialize)]
struct RemoteUser {
    email: Option<String>,
    role: Option<String>,
}

/// Token grant response; signup may return only the user when email
/// confirmation is pending.
#[derive(Debug, Deserialize)]
struct AuthResponse {
    access_token: Option<String>,
    user: Option<RemoteUser>,
    email: Option<String>,
    role: Option<String>,
}

impl AuthResponse {
    fn into_session(self, fallback_email: &str) -> Session {
        let (email, role) = match self.user {
            Some(u) => (u.email, u.role),
            None => (self.email, self.role),
        };
        let email = email.unwrap_or_else(|| fallback_email.to_string());

        Session {
            access_token: self.access_token,
            user: User {
                username: email.clone(),
                name: email,
                role: role.unwrap_or_else(|| "authenticated".to_string()),
            },
        }
    }
}

pub struct HostedAuthenticator {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    session: RwLock<Option<Session>>,
    // Data client that should act as the signed-in user.
    data_client: Option<RestClient>,
}

impl HostedAuthenticator {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        HostedAuthenticator {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            session: RwLock::new(None),
            data_client: None,
        }
    }

    /// Share the project of `client`; its data calls carry the user's token
    /// while signed in.
    pub fn for_client(client: RestClient) -> Self {
        HostedAuthenticator {
            data_client: Some(client.clone()),
            ..Self::new(client.http().clone(), client.base_url(), client.api_key())
        }
    }

    /// Token of the signed-in user, for data calls made on their behalf.
    pub fn access_token(&self) -> Option<String> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(|s| s.access_token.clone())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    async fn post_credentials(
        &self,
        url: String,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        require_credentials(email, password)?;

        let resp = self
            .http
            .post(url)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = backend_message(&body).unwrap_or(body);

            if status.as_u16() == 400 || status.as_u16() == 401 {
                warn!(email, %message, "identity service refused credentials");
            }
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: AuthResponse = resp.json().await?;
        Ok(parsed.into_session(email))
    }

    fn store_session(&self, session: Option<Session>) {
        if let Some(client) = &self.data_client {
            client.set_access_token(session.as_ref().and_then(|s| s.access_token.clone()));
        }
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session;
    }
}

#[async_trait]
impl Authenticator for HostedAuthenticator {
    async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let url = self.endpoint("token?grant_type=password");
        let session = self.post_credentials(url, username, password).await?;
        let user = session.user.clone();
        self.store_session(Some(session));

        info!(email = %user.username, "signed in");
        Ok(user)
    }

    async fn signup(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let session = self
            .post_credentials(self.endpoint("signup"), email, password)
            .await?;
        let user = session.user.clone();
        // Signup only signs the user in when the service issued a token.
        if session.access_token.is_some() {
            self.store_session(Some(session));
        }

        info!(email = %user.username, "signed up");
        Ok(user)
    }

    async fn logout(&self) -> Result<(), AuthError> {
        let token = self.access_token();
        self.store_session(None);

        if let Some(token) = token {
            let resp = self
                .http
                .post(self.endpoint("logout"))
                .header("apikey", &self.api_key)
                .bearer_auth(token)
                .send()
                .await?;
            if !resp.status().is_success() {
                // The local session is gone either way.
                warn!(status = resp.status().as_u16(), "identity service logout failed");
            }
        }

        info!("signed out");
        Ok(())
    }

    fn current_user(&self) -> Option<User> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| s.user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStorage;

    fn static_auth(storage: Arc<dyn KeyValueStorage>) -> StaticAuthenticator {
        StaticAuthenticator::new(AdminCredentials::default(), storage)
    }

    #[tokio::test]
    async fn test_static_login_success_persists_marker() {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        let auth = static_auth(storage.clone());
        assert!(!auth.is_authenticated());

        let user = auth.login("admin", "admin123").await.unwrap();
        assert_eq!(user.name, "Admin Gereja");
        assert_eq!(user.role, "Administrator");
        assert!(auth.is_authenticated());
        assert!(storage.get_item(AUTH_KEY).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_static_login_rejects_wrong_password() {
        let auth = static_auth(Arc::new(MemoryStorage::new()));

        let err = auth.login("admin", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(!auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_static_login_requires_both_fields() {
        let auth = static_auth(Arc::new(MemoryStorage::new()));

        let err = auth.login("  ", "admin123").await.unwrap_err();
        assert!(matches!(err, AuthError::MissingCredentials));
    }

    #[tokio::test]
    async fn test_sign_in_restored_and_cleared() {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        static_auth(storage.clone())
            .login("admin", "admin123")
            .await
            .unwrap();

        let restored = static_auth(storage.clone());
        assert_eq!(
            restored.current_user().map(|u| u.username),
            Some("admin".to_string())
        );

        restored.logout().await.unwrap();
        assert!(!restored.is_authenticated());
        assert!(storage.get_item(AUTH_KEY).unwrap().is_none());
        assert!(!static_auth(storage).is_authenticated());
    }

    #[test]
    fn test_malformed_marker_ignored() {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        storage.set_item(AUTH_KEY, "not json").unwrap();

        assert!(!static_auth(storage).is_authenticated());
    }

    #[tokio::test]
    async fn test_static_signup_unsupported() {
        let auth = static_auth(Arc::new(MemoryStorage::new()));
        let err = auth.signup("a@b.c", "secret").await.unwrap_err();
        assert!(matches!(err, AuthError::Unsupported("signup")));
    }

    #[test]
    fn test_auth_response_shapes() {
        let token_grant: AuthResponse = serde_json::from_value(serde_json::json!({
            "access_token": "jwt",
            "token_type": "bearer",
            "user": {"id": "u1", "email": "pendeta@gereja.id", "role": "authenticated"}
        }))
        .unwrap();
        let session = token_grant.into_session("fallback@x.y");
        assert_eq!(session.access_token.as_deref(), Some("jwt"));
        assert_eq!(session.user.username, "pendeta@gereja.id");

        let pending: AuthResponse = serde_json::from_value(serde_json::json!({
            "id": "u2",
            "email": "baru@gereja.id"
        }))
        .unwrap();
        let session = pending.into_session("fallback@x.y");
        assert!(session.access_token.is_none());
        assert_eq!(session.user.username, "baru@gereja.id");
        assert_eq!(session.user.role, "authenticated");
    }
}
