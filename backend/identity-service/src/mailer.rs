/// Outgoing verification and password reset mail
use crate::error::MailError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailKind {
    Verification,
    PasswordReset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub kind: MailKind,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    /// Opaque token embedded in the link
    pub token: String,
}

impl OutgoingMail {
    pub fn verification(recipient: &str, token: &str, base_url: &str) -> Self {
        Self {
            kind: MailKind::Verification,
            recipient: recipient.to_string(),
            subject: "Verify your SocialSphere account".to_string(),
            body: format!(
                "Welcome to SocialSphere!\n\nPlease open the following link to verify your email:\n{}/verify-email?token={}\n\nIf you did not sign up, please ignore this email.",
                base_url, token
            ),
            token: token.to_string(),
        }
    }

    pub fn password_reset(recipient: &str, token: &str, base_url: &str) -> Self {
        Self {
            kind: MailKind::PasswordReset,
            recipient: recipient.to_string(),
            subject: "SocialSphere password reset".to_string(),
            body: format!(
                "We received your password reset request.\n\nOpen the following link to choose a new password:\n{}/reset-password?token={}\n\nIf you did not request this, please ignore this email.",
                base_url, token
            ),
            token: token.to_string(),
        }
    }
}

#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError>;
}

/// Mailer that keeps every message in an in-memory outbox
#[derive(Default)]
pub struct MemoryMailer {
    outbox: Mutex<Vec<OutgoingMail>>,
    failing: AtomicBool,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every send fails with `Unavailable`
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn outbox(&self) -> Vec<OutgoingMail> {
        self.outbox
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Token of the most recent mail of `kind` sent to `recipient`
    pub fn last_token(&self, kind: MailKind, recipient: &str) -> Option<String> {
        self.outbox()
            .into_iter()
            .rev()
            .find(|m| m.kind == kind && m.recipient.eq_ignore_ascii_case(recipient))
            .map(|m| m.token)
    }
}

#[async_trait::async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::Unavailable("outbox offline".to_string()));
        }
        if !mail.recipient.contains('@') {
            return Err(MailError::InvalidRecipient(mail.recipient));
        }
        info!(subject = %mail.subject, recipient = %mail.recipient, "Mail queued");
        self.outbox
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(mail);
        Ok(())
    }
}
