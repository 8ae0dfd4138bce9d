//! Application shell: gates the editor behind sign-in.

use std::sync::Arc;

use redactor_core::Compositor;
use thiserror::Error;

use crate::auth::{AuthService, IdentityBackend};
use crate::config::EditorConfig;
use crate::editor::EditorSession;
use crate::photos::{load_picked, PhotoError, PhotoLibrary};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Sign in to edit photos")]
    NotAuthenticated,

    #[error("The picked photo could not be read")]
    UnreadablePhoto,

    #[error(transparent)]
    Photo(#[from] PhotoError),
}

/// Owns the long-lived services and opens editing sessions.
pub struct App<B> {
    auth: Arc<AuthService<B>>,
    config: EditorConfig,
    compositor: Compositor,
}

impl<B: IdentityBackend> App<B> {
    pub fn new(auth: Arc<AuthService<B>>, config: EditorConfig, compositor: Compositor) -> Self {
        Self {
            auth,
            config,
            compositor,
        }
    }

    pub fn auth(&self) -> &Arc<AuthService<B>> {
        &self.auth
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    /// Decode a picked photo and start editing it.
    pub async fn open_editor(&self, bytes: Vec<u8>) -> Result<EditorSession, AppError> {
        if !self.is_authenticated() {
            return Err(AppError::NotAuthenticated);
        }
        let image = load_picked(bytes).await.ok_or(AppError::UnreadablePhoto)?;
        Ok(EditorSession::new(
            image,
            self.config.clone(),
            self.compositor.clone(),
        ))
    }

    /// Ask the library for a photo and open it. `Ok(None)` if the user
    /// cancelled the picker.
    pub async fn pick_and_open<L: PhotoLibrary + ?Sized>(
        &self,
        library: &L,
    ) -> Result<Option<EditorSession>, AppError> {
        if !self.is_authenticated() {
            return Err(AppError::NotAuthenticated);
        }
        match library.pick().await? {
            Some(bytes) => self.open_editor(bytes).await.map(Some),
            None => Ok(None),
        }
    }

    pub fn sign_out(&self) {
        self.auth.sign_out();
    }
}
