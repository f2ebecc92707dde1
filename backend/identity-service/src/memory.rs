//! In-process identity provider
//!
//! Accounts are keyed by lower-cased email and hold Argon2id hashes.
//! Verification and reset tokens are single use and delivered through the
//! injected [`Mailer`].

use crate::mailer::{Mailer, OutgoingMail};
use crate::provider::{AuthUser, IdentityProvider};
use crate::security::{hash_password, verify_password};
use crate::validators::check_password;
use dashmap::DashMap;
use error_types::{AuthError, AuthResult};
use rand::{distributions::Alphanumeric, Rng};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

const TOKEN_LEN: usize = 32;

#[derive(Debug, Clone)]
struct Account {
    uid: String,
    email: String,
    password_hash: String,
    email_verified: bool,
}

impl Account {
    fn to_user(&self) -> AuthUser {
        AuthUser {
            uid: self.uid.clone(),
            email: self.email.clone(),
            email_verified: self.email_verified,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenPurpose {
    VerifyEmail,
    ResetPassword,
}

#[derive(Debug, Clone)]
struct PendingToken {
    purpose: TokenPurpose,
    email_key: String,
}

pub struct MemoryIdentityProvider {
    accounts: DashMap<String, Account>,
    tokens: DashMap<String, PendingToken>,
    session: RwLock<Option<AuthUser>>,
    mailer: Arc<dyn Mailer>,
    link_base_url: String,
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

impl MemoryIdentityProvider {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self::with_link_base(mailer, "https://socialsphere.dev")
    }

    pub fn with_link_base(mailer: Arc<dyn Mailer>, link_base_url: &str) -> Self {
        Self {
            accounts: DashMap::new(),
            tokens: DashMap::new(),
            session: RwLock::new(None),
            mailer,
            link_base_url: link_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn account_exists(&self, email: &str) -> bool {
        self.accounts.contains_key(&email_key(email))
    }

    /// Redeem a verification token
    pub fn verify_email(&self, token: &str) -> AuthResult<()> {
        let pending = self.redeem(token, TokenPurpose::VerifyEmail)?;
        let mut account = self
            .accounts
            .get_mut(&pending.email_key)
            .ok_or(AuthError::UserNotFound)?;
        account.email_verified = true;

        let mut session = self.session.write().unwrap_or_else(|e| e.into_inner());
        if let Some(user) = session.as_mut().filter(|u| u.uid == account.uid) {
            user.email_verified = true;
        }
        info!(uid = %account.uid, "Email verified");
        Ok(())
    }

    /// Redeem a reset token and replace the password
    /// Redeem a reset token; a too-short password leaves the token usable
    pub fn reset_password(&self, token: &str, new_password: &str) -> AuthResult<()> {
        check_password(new_password)?;
        let pending = self.redeem(token, TokenPurpose::ResetPassword)?;
        let password_hash = hash_password(new_password)?;
        let mut account = self
            .accounts
            .get_mut(&pending.email_key)
            .ok_or(AuthError::UserNotFound)?;
        account.password_hash = password_hash;
        info!(uid = %account.uid, "Password reset");
        Ok(())
    }

    fn redeem(&self, token: &str, purpose: TokenPurpose) -> AuthResult<PendingToken> {
        match self.tokens.remove(token) {
            Some((_, pending)) if pending.purpose == purpose => Ok(pending),
            Some((token, pending)) => {
                // wrong purpose: leave it redeemable for the right flow
                self.tokens.insert(token, pending);
                Err(AuthError::InvalidToken)
            }
            None => Err(AuthError::InvalidToken),
        }
    }

    fn open_session(&self, user: &AuthUser) {
        *self.session.write().unwrap_or_else(|e| e.into_inner()) = Some(user.clone());
    }
}

#[async_trait::async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn create_account(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        let key = email_key(email);
        let password_hash = hash_password(password)?;

        let user = match self.accounts.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(AuthError::EmailAlreadyInUse);
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                let account = Account {
                    uid: Uuid::new_v4().simple().to_string(),
                    email: email.trim().to_string(),
                    password_hash,
                    email_verified: false,
                };
                let user = account.to_user();
                slot.insert(account);
                user
            }
        };

        self.open_session(&user);
        info!(uid = %user.uid, "Account created");
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        let account = self
            .accounts
            .get(&email_key(email))
            .map(|a| a.value().clone())
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &account.password_hash)? {
            debug!(uid = %account.uid, "Password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let user = account.to_user();
        self.open_session(&user);
        Ok(user)
    }

    async fn send_verification_email(&self, user: &AuthUser) -> AuthResult<()> {
        let key = email_key(&user.email);
        if !self.accounts.contains_key(&key) {
            return Err(AuthError::UserNotFound);
        }

        let token = generate_token();
        self.tokens.insert(
            token.clone(),
            PendingToken {
                purpose: TokenPurpose::VerifyEmail,
                email_key: key,
            },
        );

        let mail = OutgoingMail::verification(&user.email, &token, &self.link_base_url);
        if let Err(e) = self.mailer.send(mail).await {
            self.tokens.remove(&token);
            warn!(uid = %user.uid, error = %e, "Verification mail not sent");
            return Err(AuthError::VerificationDispatch(e.to_string()));
        }
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> AuthResult<()> {
        let key = email_key(email);
        let recipient = self
            .accounts
            .get(&key)
            .map(|a| a.email.clone())
            .ok_or(AuthError::UserNotFound)?;

        let token = generate_token();
        self.tokens.insert(
            token.clone(),
            PendingToken {
                purpose: TokenPurpose::ResetPassword,
                email_key: key,
            },
        );

        let mail = OutgoingMail::password_reset(&recipient, &token, &self.link_base_url);
        if let Err(e) = self.mailer.send(mail).await {
            self.tokens.remove(&token);
            return Err(AuthError::Provider(e.to_string()));
        }
        Ok(())
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.session
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    async fn sign_out(&self) -> AuthResult<()> {
        *self.session.write().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}
