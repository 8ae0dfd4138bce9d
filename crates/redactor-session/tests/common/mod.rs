//! Shared fakes for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use redactor_core::{Bitmap, GlyphRasterizer, TextMask};
use redactor_session::auth::{FederatedCredential, FederatedTokens};
use redactor_session::{
    Account, AuthError, FederatedContext, IdentityBackend, PersistenceSink, SaveError,
};

pub const RED: [u8; 4] = [255, 0, 0, 255];
pub const GREEN: [u8; 4] = [0, 255, 0, 255];
pub const BLUE: [u8; 4] = [0, 0, 255, 255];
pub const YELLOW: [u8; 4] = [255, 255, 0, 255];
pub const WHITE: [u8; 4] = [255, 255, 255, 255];

/// A square photo split into four colored quadrants with a white square of
/// `size / 10` pixels on each side of the center.
pub fn quadrant_photo(size: u32) -> Bitmap {
    let half = size / 2;
    let inner = size / 10;
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let near_center = x >= half - inner && x < half + inner && y >= half - inner && y < half + inner;
            let px = if near_center {
                WHITE
            } else {
                match (x < half, y < half) {
                    (true, true) => RED,
                    (false, true) => GREEN,
                    (true, false) => BLUE,
                    (false, false) => YELLOW,
                }
            };
            pixels.extend_from_slice(&px);
        }
    }
    Bitmap::new(size, size, pixels)
}

/// Draws every character as a solid box, `size / 2` wide and `size` tall.
pub struct BlockGlyphs;

impl GlyphRasterizer for BlockGlyphs {
    fn rasterize(&self, text: &str, font_size: f32) -> Option<TextMask> {
        if text.is_empty() {
            return None;
        }
        let height = font_size as u32;
        let width = (height / 2).max(1) * text.chars().count() as u32;
        let mut mask = TextMask::new(width, height);
        mask.coverage.fill(255);
        Some(mask)
    }
}

/// Identity backend that records how often it was called.
#[derive(Default)]
pub struct MockBackend {
    pub unverified: bool,
    pub calls: AtomicUsize,
}

impl MockBackend {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn account(&self, email: &str) -> Account {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Account {
            email: email.to_string(),
            email_verified: !self.unverified,
        }
    }
}

#[async_trait]
impl IdentityBackend for MockBackend {
    fn current_account(&self) -> Option<Account> {
        None
    }

    async fn authenticate(&self, email: &str, _password: &str) -> Result<Account, AuthError> {
        Ok(self.account(email))
    }

    async fn create_account(&self, email: &str, _password: &str) -> Result<Account, AuthError> {
        Ok(self.account(email))
    }

    async fn send_verification(&self, _account: &Account) -> Result<(), AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn send_password_reset(&self, _email: &str) -> Result<(), AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn federated_tokens(
        &self,
        _context: &FederatedContext,
    ) -> Result<FederatedTokens, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(FederatedTokens {
            id_token: Some("id".into()),
            access_token: "access".into(),
        })
    }

    async fn sign_in_with_credential(
        &self,
        _credential: FederatedCredential,
    ) -> Result<Account, AuthError> {
        Ok(self.account("federated@example.com"))
    }

    fn end_session(&self) -> Result<(), AuthError> {
        Ok(())
    }
}

/// Keeps every saved image in memory.
#[derive(Default)]
pub struct MemorySink {
    pub saved: Mutex<Vec<Arc<Bitmap>>>,
}

#[async_trait]
impl PersistenceSink for MemorySink {
    async fn save(&self, image: Arc<Bitmap>) -> Result<(), SaveError> {
        self.saved.lock().unwrap().push(image);
        Ok(())
    }
}

/// Rejects every save.
#[derive(Default)]
pub struct FailingSink {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl PersistenceSink for FailingSink {
    async fn save(&self, _image: Arc<Bitmap>) -> Result<(), SaveError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SaveError::Rejected("storage full".into()))
    }
}
