//! Redactor Session - editing session, sign-in flow and platform boundaries
//!
//! This crate drives the pixel pipeline in `redactor-core` from plain state
//! objects. Platform services (identity provider, photo library, share
//! sheet) are traits implemented by the host.
//!
//! # Module Structure
//!
//! - `app` - Application shell gating the editor behind sign-in
//! - `auth` - Identity provider boundary and the auth service
//! - `login` - Login screen state
//! - `validation` - Credential validation
//! - `editor` - Editing session state and background work
//! - `events` - Session change notifications
//! - `photos` - Photo library, persistence and share boundaries
//! - `config` - Editor configuration
//! - `telemetry` - Logging setup

pub mod app;
pub mod auth;
pub mod config;
pub mod editor;
pub mod events;
pub mod login;
pub mod photos;
pub mod telemetry;
pub mod validation;

pub use app::{App, AppError};
pub use auth::{Account, AuthError, AuthService, FederatedContext, IdentityBackend};
pub use config::{ConfigError, EditorConfig};
pub use editor::{EditorSession, EditorTool};
pub use events::SessionEvent;
pub use login::{LoginForm, LoginMode, SubmitOutcome};
pub use photos::{
    load_picked, ChannelShare, DirectorySink, PersistenceSink, PhotoError, PhotoLibrary,
    SaveError, ShareSink,
};
pub use telemetry::init_tracing;
pub use validation::ValidationError;

/// Get the version of the crate
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
