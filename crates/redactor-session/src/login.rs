//! Login screen state.
//!
//! Field errors are shown inline and cleared when that field is edited
//! again. Provider failures become a single dismissible message. Nothing is
//! sent to the provider while a field is invalid.

use crate::auth::{AuthService, FederatedContext, IdentityBackend};
use crate::validation::{validate_email, validate_password, ValidationError};

/// Which action the submit button performs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoginMode {
    #[default]
    SignIn,
    Register,
}

/// Result of pressing submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A field failed validation; no provider call was made.
    Invalid,
    /// Signed in; the caller should move on to the main screen.
    SignedIn,
    /// Account created and a verification email sent.
    VerificationSent,
    /// The provider rejected the request; see [`LoginForm::error_message`].
    Failed,
}

pub const VERIFICATION_SENT_MESSAGE: &str =
    "A confirmation email has been sent. Please check your inbox.";

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    email: String,
    password: String,
    mode: LoginMode,
    email_error: Option<ValidationError>,
    password_error: Option<ValidationError>,
    error_message: Option<String>,
    info_message: Option<String>,
    reset_email: String,
    reset_sheet_open: bool,
    success_message: Option<String>,
}

impl LoginForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn mode(&self) -> LoginMode {
        self.mode
    }

    pub fn email_error(&self) -> Option<ValidationError> {
        self.email_error
    }

    pub fn password_error(&self) -> Option<ValidationError> {
        self.password_error
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn info_message(&self) -> Option<&str> {
        self.info_message.as_deref()
    }

    pub fn success_message(&self) -> Option<&str> {
        self.success_message.as_deref()
    }

    pub fn reset_email(&self) -> &str {
        &self.reset_email
    }

    pub fn is_reset_sheet_open(&self) -> bool {
        self.reset_sheet_open
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
        self.email_error = None;
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
        self.password_error = None;
    }

    pub fn set_mode(&mut self, mode: LoginMode) {
        self.mode = mode;
    }

    pub fn set_reset_email(&mut self, email: impl Into<String>) {
        self.reset_email = email.into();
    }

    pub fn open_reset_sheet(&mut self) {
        self.reset_sheet_open = true;
    }

    pub fn dismiss_error(&mut self) {
        self.error_message = None;
    }

    pub fn clear_errors(&mut self) {
        self.email_error = None;
        self.password_error = None;
    }

    /// Check both fields, recording an inline error for each bad one.
    pub fn validate_fields(&mut self) -> bool {
        self.email_error = validate_email(&self.email).err();
        self.password_error = validate_password(&self.password).err();
        self.email_error.is_none() && self.password_error.is_none()
    }

    /// Sign in or register, depending on the mode.
    pub async fn submit<B: IdentityBackend>(&mut self, auth: &AuthService<B>) -> SubmitOutcome {
        self.clear_errors();
        if !self.validate_fields() {
            tracing::debug!("login form invalid, not contacting provider");
            return SubmitOutcome::Invalid;
        }

        let result = match self.mode {
            LoginMode::SignIn => auth
                .sign_in(&self.email, &self.password)
                .await
                .map(|()| SubmitOutcome::SignedIn),
            LoginMode::Register => auth
                .register(&self.email, &self.password)
                .await
                .map(|()| SubmitOutcome::VerificationSent),
        };

        match result {
            Ok(outcome) => {
                if outcome == SubmitOutcome::VerificationSent {
                    self.info_message = Some(VERIFICATION_SENT_MESSAGE.to_string());
                }
                outcome
            }
            Err(e) => {
                self.error_message = Some(e.to_string());
                SubmitOutcome::Failed
            }
        }
    }

    /// Returns true when the user is signed in.
    pub async fn sign_in_with_google<B: IdentityBackend>(
        &mut self,
        auth: &AuthService<B>,
        context: &FederatedContext,
    ) -> bool {
        match auth.sign_in_with_google(context).await {
            Ok(()) => true,
            Err(e) => {
                self.error_message = Some(e.to_string());
                false
            }
        }
    }

    /// Request a reset email for the address in the reset sheet. An empty
    /// address does nothing.
    pub async fn reset_password<B: IdentityBackend>(&mut self, auth: &AuthService<B>) {
        if self.reset_email.is_empty() {
            return;
        }

        match auth.reset_password(&self.reset_email).await {
            Ok(()) => {
                self.success_message =
                    Some(format!("A password reset email was sent to {}", self.reset_email));
                self.reset_email.clear();
                self.reset_sheet_open = false;
            }
            Err(e) => self.error_message = Some(e.to_string()),
        }
    }
}
