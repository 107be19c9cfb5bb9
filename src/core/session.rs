//! Session collaborator seam.
//!
//! Credential issuance lives outside this crate. The protocol core only needs
//! a snapshot of the current bearer token at send time, plus an optional way
//! to observe sign-in/sign-out so a front end can react.

use async_trait::async_trait;
use std::fmt;
use tokio::sync::watch;

/// An opaque bearer token.
///
/// Construction rejects empty or whitespace-only tokens, so holding a
/// `Credential` always means there is something worth sending.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn token(&self) -> &str {
        &self.0
    }

    pub fn bearer_header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The credential to attach to a request sent right now.
    async fn current_credential(&self) -> Option<Credential>;

    /// Receives every sign-in/sign-out transition after subscription.
    fn subscribe(&self) -> watch::Receiver<Option<Credential>>;
}

/// In-memory session backed by a watch channel.
pub struct StaticSession {
    tx: watch::Sender<Option<Credential>>,
}

impl StaticSession {
    pub fn new(credential: Option<Credential>) -> Self {
        let (tx, _rx) = watch::channel(credential);
        Self { tx }
    }

    pub fn signed_out() -> Self {
        Self::new(None)
    }

    pub fn sign_in(&self, credential: Credential) {
        self.tx.send_replace(Some(credential));
    }

    pub fn sign_out(&self) {
        self.tx.send_replace(None);
    }
}

#[async_trait]
impl SessionProvider for StaticSession {
    async fn current_credential(&self) -> Option<Credential> {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Credential>> {
        self.tx.subscribe()
    }
}
