use identity_service::{
    AuthError, IdentityGateway, IdentityProvider, MailKind, MemoryIdentityProvider, MemoryMailer,
};
use std::sync::Arc;

struct Harness {
    gateway: IdentityGateway,
    provider: Arc<MemoryIdentityProvider>,
    mailer: Arc<MemoryMailer>,
}

fn harness() -> Harness {
    let mailer = Arc::new(MemoryMailer::new());
    let provider = Arc::new(MemoryIdentityProvider::new(mailer.clone()));
    Harness {
        gateway: IdentityGateway::new(provider.clone()),
        provider,
        mailer,
    }
}

#[tokio::test]
async fn register_verify_then_sign_in() {
    let h = harness();

    let uid = h.gateway.register("ana@example.com", "secret1").await.unwrap();
    assert!(h.gateway.current_user().is_none());

    let err = h
        .gateway
        .sign_in("ana@example.com", "secret1")
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::EmailNotVerified);
    assert!(h.gateway.current_user().is_none());

    let token = h
        .mailer
        .last_token(MailKind::Verification, "ana@example.com")
        .expect("verification mail sent");
    h.provider.verify_email(&token).unwrap();

    let user = h.gateway.sign_in("ana@example.com", "secret1").await.unwrap();
    assert_eq!(user.uid, uid);
    assert_eq!(h.gateway.current_user(), Some(user));

    h.gateway.sign_out().await.unwrap();
    assert!(h.gateway.current_user().is_none());
}

#[tokio::test]
async fn register_fails_when_verification_cannot_be_sent() {
    let h = harness();
    h.mailer.set_failing(true);

    let err = h
        .gateway
        .register("lee@example.com", "secret1")
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::VerificationDispatch(_)));
    // the account was still created
    assert!(h.provider.account_exists("lee@example.com"));
    let err = h
        .gateway
        .register("lee@example.com", "secret1")
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::EmailAlreadyInUse);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let h = harness();
    h.gateway.register("ana@example.com", "secret1").await.unwrap();

    let err = h
        .gateway
        .sign_in("ana@example.com", "secret2")
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::InvalidCredentials);

    let err = h
        .gateway
        .sign_in("nobody@example.com", "secret1")
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::InvalidCredentials);
}

#[tokio::test]
async fn password_reset_round_trip() {
    let h = harness();
    h.gateway.register("ana@example.com", "secret1").await.unwrap();
    let verify = h
        .mailer
        .last_token(MailKind::Verification, "ana@example.com")
        .unwrap();
    h.provider.verify_email(&verify).unwrap();

    h.gateway
        .send_password_reset("ana@example.com")
        .await
        .unwrap();
    let token = h
        .mailer
        .last_token(MailKind::PasswordReset, "ana@example.com")
        .unwrap();
    h.provider.reset_password(&token, "brandnew").unwrap();

    assert!(h.gateway.sign_in("ana@example.com", "secret1").await.is_err());
    h.gateway
        .sign_in("ana@example.com", "brandnew")
        .await
        .unwrap();

    let err = h
        .gateway
        .send_password_reset("nobody@example.com")
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::UserNotFound);
}

#[tokio::test]
async fn provider_session_follows_account_creation() {
    let h = harness();
    let user = h
        .provider
        .create_account("raw@example.com", "secret1")
        .await
        .unwrap();
    assert_eq!(h.provider.current_user(), Some(user));
}
