//! Photo library, persistence and share boundaries.
//!
//! - [`PhotoLibrary`] yields the raw bytes of a photo the user picked
//! - [`PersistenceSink`] stores a finished image and reports the outcome once
//! - [`ShareSink`] hands a finished image to the platform, fire-and-forget
//!
//! [`DirectorySink`] and [`ChannelShare`] are concrete implementations for
//! hosts without a system photo library.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use redactor_core::encode::{encode_jpeg, encode_png, EncodeError};
use redactor_core::{decode_image, Bitmap};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinError;

/// Errors from the photo picker.
#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("Photo library access denied")]
    AccessDenied,

    #[error("Failed to read picked photo: {0}")]
    Read(String),
}

/// Why a save did not complete. Reported once; the sink never retries.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Failed to encode image: {0}")]
    Encode(#[from] EncodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Photo library rejected the image: {0}")]
    Rejected(String),

    #[error("Background task failed: {0}")]
    Task(#[from] JoinError),
}

#[async_trait]
pub trait PhotoLibrary: Send + Sync {
    /// Let the user pick a photo. `Ok(None)` when the picker was cancelled.
    async fn pick(&self) -> Result<Option<Vec<u8>>, PhotoError>;
}

#[async_trait]
pub trait PersistenceSink: Send + Sync {
    async fn save(&self, image: Arc<Bitmap>) -> Result<(), SaveError>;
}

pub trait ShareSink: Send + Sync {
    /// No result is observed.
    fn share(&self, image: Arc<Bitmap>);
}

/// Decode picked bytes on a blocking thread.
///
/// Undecodable photos are logged and yield `None`.
pub async fn load_picked(bytes: Vec<u8>) -> Option<Arc<Bitmap>> {
    match tokio::task::spawn_blocking(move || decode_image(&bytes)).await {
        Ok(Ok(image)) => {
            tracing::debug!(width = image.width, height = image.height, "picked photo decoded");
            Some(Arc::new(image))
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "picked photo could not be decoded");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "photo decode task failed");
            None
        }
    }
}

/// Saves each image as a new PNG file in a directory.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    counter: AtomicU64,
}

impl DirectorySink {
    /// The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            counter: AtomicU64::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn next_path(&self) -> PathBuf {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        self.dir.join(format!("redacted-{millis}-{n}.png"))
    }
}

#[async_trait]
impl PersistenceSink for DirectorySink {
    async fn save(&self, image: Arc<Bitmap>) -> Result<(), SaveError> {
        let png = tokio::task::spawn_blocking(move || encode_png(&image)).await??;

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.next_path();
        tokio::fs::write(&path, &png).await?;

        tracing::info!(path = %path.display(), bytes = png.len(), "image saved");
        Ok(())
    }
}

/// Hands JPEG-encoded images to a channel consumed by the platform share
/// sheet.
#[derive(Debug, Clone)]
pub struct ChannelShare {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    quality: u8,
}

impl ChannelShare {
    pub fn new(quality: u8) -> (Self, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, quality }, rx)
    }
}

impl ShareSink for ChannelShare {
    fn share(&self, image: Arc<Bitmap>) {
        let jpeg = match encode_jpeg(&image, self.quality) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "share skipped: encoding failed");
                return;
            }
        };
        if self.tx.send(jpeg).is_err() {
            tracing::warn!("share skipped: no receiver");
        }
    }
}
