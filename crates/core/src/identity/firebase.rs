use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use super::{AuthListener, IdentityProvider, User};
use crate::{config::FirebaseConfig, error::AuthError, models::UserId};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Identity provider backed by the Identity Toolkit REST API.
///
/// Sign-in state lives in memory only; listeners are notified on every
/// transition and dropped once their receiver is gone.
#[derive(Clone)]
pub struct FirebaseIdentity {
    http: Client,
    api_key: String,
    auth_url: String,
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    current: Option<User>,
    listeners: Vec<AuthListener>,
}

impl FirebaseIdentity {
    /// Build a provider from configuration.
    pub fn new(config: &FirebaseConfig) -> Result<Self, AuthError> {
        let http = Client::builder()
            .build()
            .map_err(|err| AuthError::Unknown(err.to_string()))?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            auth_url: config.auth_url.trim_end_matches('/').to_string(),
            inner: Arc::new(RwLock::new(Inner::default())),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &impl Serialize,
    ) -> Result<T, AuthError> {
        if self.api_key.trim().is_empty() {
            return Err(AuthError::Unknown("no Firebase API key configured".to_string()));
        }

        let url = format!("{}/accounts:{method}", self.auth_url);
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|err| AuthError::Unknown(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let code = response
                .json::<ErrorEnvelope>()
                .await
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| status.to_string());
            return Err(AuthError::from_code(&code));
        }

        response
            .json::<T>()
            .await
            .map_err(|err| AuthError::Unknown(format!("failed to decode identity response: {err}")))
    }

    async fn password_call(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let request = PasswordRequest {
            email: email.trim(),
            password,
            return_secure_token: true,
        };
        let account: AccountResponse = self.call(method, &request).await?;
        let user = User {
            id: UserId::new(account.local_id),
            email: account.email,
            id_token: account.id_token,
        };
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    fn set_current(&self, user: Option<User>) {
        let mut inner = self.inner.write();
        inner.current = user.clone();
        inner
            .listeners
            .retain(|listener| listener.send(user.clone()).is_ok());
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self
            .password_call("signInWithPassword", email, password)
            .await?;
        info!(user_id = %user.id, "signed in");
        Ok(user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self.password_call("signUp", email, password).await?;
        info!(user_id = %user.id, "account created");
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.set_current(None);
        Ok(())
    }

    async fn delete_account(&self) -> Result<(), AuthError> {
        let user = self.current_user().ok_or(AuthError::UserNotFound)?;
        let _: serde_json::Value = self
            .call("delete", &json!({ "idToken": user.id_token }))
            .await
            .map_err(|err| {
                warn!(user_id = %user.id, %err, "account deletion failed");
                err
            })?;
        info!(user_id = %user.id, "account deleted");
        self.set_current(None);
        Ok(())
    }

    fn current_user(&self) -> Option<User> {
        self.inner.read().current.clone()
    }

    fn on_auth_state_changed(&self, listener: AuthListener) {
        let mut inner = self.inner.write();
        if listener.send(inner.current.clone()).is_ok() {
            inner.listeners.push(listener);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn provider() -> FirebaseIdentity {
        FirebaseIdentity::new(&FirebaseConfig::default()).expect("provider should build")
    }

    #[tokio::test]
    async fn listeners_receive_initial_state() {
        let identity = provider();
        let (tx, mut rx) = mpsc::unbounded_channel();
        identity.on_auth_state_changed(tx);
        assert_eq!(rx.recv().await, Some(None));
    }

    #[tokio::test]
    async fn sign_out_notifies_listeners() {
        let identity = provider();
        identity.set_current(Some(User::new("u1", "u1@example.com")));

        let (tx, mut rx) = mpsc::unbounded_channel();
        identity.on_auth_state_changed(tx);
        assert_eq!(
            rx.recv().await.flatten().map(|user| user.id),
            Some(UserId::new("u1"))
        );

        identity.sign_out().await.expect("local sign out succeeds");
        assert_eq!(rx.recv().await, Some(None));
        assert!(identity.current_user().is_none());
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_request() {
        let identity = provider();
        let err = identity
            .sign_in("user@example.com", "secret")
            .await
            .expect_err("sign in must fail");
        assert!(matches!(err, AuthError::Unknown(_)));
        assert!(identity.current_user().is_none());
    }

    #[tokio::test]
    async fn delete_requires_signed_in_user() {
        let identity = provider();
        assert_eq!(
            identity.delete_account().await,
            Err(AuthError::UserNotFound)
        );
    }
}
