//! Identity provider boundary and the auth service built on it.
//!
//! [`IdentityBackend`] is the seam to the external provider SDK. The
//! [`AuthService`] wraps one backend, enforces the sign-in rules (verified
//! email only, sign out after registering) and tracks whether a user is
//! currently signed in. It is created once at startup and handed to whoever
//! needs it.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use thiserror::Error;

/// Failures from the identity provider or the sign-in rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Email is not verified. Please check your inbox.")]
    EmailNotVerified,

    #[error("Federated sign-in is not configured")]
    MissingClientId,

    #[error("Federated sign-in returned no identity token")]
    MissingIdToken,

    /// Human-readable reason reported by the provider.
    #[error("{0}")]
    Provider(String),
}

/// The provider's view of a signed-in account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub email: String,
    pub email_verified: bool,
}

/// What the platform needs to run a federated consent flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FederatedContext {
    /// OAuth client id from the app's provider configuration
    pub client_id: Option<String>,
}

/// Tokens returned by a federated consent flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedTokens {
    pub id_token: Option<String>,
    pub access_token: String,
}

/// A complete credential to exchange for a provider session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedCredential {
    pub id_token: String,
    pub access_token: String,
}

/// Calls into the external identity provider.
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    /// The account of the persisted provider session, if any.
    fn current_account(&self) -> Option<Account>;

    async fn authenticate(&self, email: &str, password: &str) -> Result<Account, AuthError>;

    async fn create_account(&self, email: &str, password: &str) -> Result<Account, AuthError>;

    async fn send_verification(&self, account: &Account) -> Result<(), AuthError>;

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError>;

    /// Run the federated consent flow.
    async fn federated_tokens(&self, context: &FederatedContext)
        -> Result<FederatedTokens, AuthError>;

    async fn sign_in_with_credential(
        &self,
        credential: FederatedCredential,
    ) -> Result<Account, AuthError>;

    /// End the provider session.
    fn end_session(&self) -> Result<(), AuthError>;
}

/// Sign-in state on top of an [`IdentityBackend`].
#[derive(Debug)]
pub struct AuthService<B> {
    backend: B,
    authenticated: AtomicBool,
}

impl<B: IdentityBackend> AuthService<B> {
    /// Starts authenticated if the backend already holds a session.
    pub fn new(backend: B) -> Self {
        let authenticated = backend.current_account().is_some();
        Self {
            backend,
            authenticated: AtomicBool::new(authenticated),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::Acquire)
    }

    fn set_authenticated(&self, value: bool) {
        self.authenticated.store(value, Ordering::Release);
    }

    /// Sign in with email and password. Unverified accounts are signed
    /// straight back out.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let account = self.backend.authenticate(email, password).await?;

        if !account.email_verified {
            self.backend.end_session()?;
            self.set_authenticated(false);
            tracing::info!("sign-in rejected: email not verified");
            return Err(AuthError::EmailNotVerified);
        }

        self.set_authenticated(true);
        tracing::info!("signed in");
        Ok(())
    }

    /// Create an account and send the verification email. The user stays
    /// signed out until they verify and sign in.
    pub async fn register(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let account = self.backend.create_account(email, password).await?;
        self.backend.send_verification(&account).await?;

        self.backend.end_session()?;
        self.set_authenticated(false);
        tracing::info!("account registered, verification sent");
        Ok(())
    }

    /// Always ends up signed out; a provider failure is only logged.
    pub fn sign_out(&self) {
        if let Err(e) = self.backend.end_session() {
            tracing::warn!(error = %e, "provider sign-out failed");
        }
        self.set_authenticated(false);
        tracing::info!("signed out");
    }

    pub async fn sign_in_with_google(&self, context: &FederatedContext) -> Result<(), AuthError> {
        if context.client_id.is_none() {
            return Err(AuthError::MissingClientId);
        }

        let tokens = self.backend.federated_tokens(context).await?;
        let id_token = tokens.id_token.ok_or(AuthError::MissingIdToken)?;

        self.backend
            .sign_in_with_credential(FederatedCredential {
                id_token,
                access_token: tokens.access_token,
            })
            .await?;

        self.set_authenticated(true);
        tracing::info!("signed in with federated provider");
        Ok(())
    }

    pub async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        self.backend.send_password_reset(email).await?;
        tracing::info!("password reset email requested");
        Ok(())
    }
}
