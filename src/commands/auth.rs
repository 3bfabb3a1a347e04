use anyhow::Result;

use ticketflow::forms::{validate_login, validate_signup};
use ticketflow::AppContext;

use crate::commands::check_form;

pub async fn signup(ctx: &AppContext, email: &str, password: &str, confirm: &str) -> Result<()> {
    check_form(ctx, validate_signup(email, password, confirm))?;
    let user = ctx.session.signup(email, password, confirm).await?;
    println!("Signed up and logged in as {} (user {})", user.email, user.id);
    Ok(())
}

pub async fn login(ctx: &AppContext, email: &str, password: &str) -> Result<()> {
    check_form(ctx, validate_login(email, password))?;
    let user = ctx.session.login(email, password).await?;
    println!("Logged in as {}", user.email);
    Ok(())
}

pub fn logout(ctx: &AppContext) -> Result<()> {
    ctx.session.logout();
    Ok(())
}

pub fn whoami(ctx: &AppContext) -> Result<()> {
    match ctx.session.current_user() {
        Some(user) => println!("{} (user {})", user.email, user.id),
        None => println!("Not logged in."),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::setup_test_ctx;
    use ticketflow::notify::NotificationKind;
    use ticketflow::StoreError;

    #[tokio::test]
    async fn test_signup_then_login() {
        let (ctx, _dir) = setup_test_ctx();
        signup(&ctx, "a@x.com", "secret1", "secret1").await.unwrap();
        logout(&ctx).unwrap();
        assert!(!ctx.session.is_authenticated());

        login(&ctx, "a@x.com", "secret1").await.unwrap();
        assert_eq!(ctx.session.current_user().unwrap().email, "a@x.com");
    }

    #[tokio::test]
    async fn test_invalid_email_never_reaches_store() {
        let (ctx, _dir) = setup_test_ctx();
        let err = signup(&ctx, "nope", "secret1", "secret1").await.unwrap_err();

        assert_eq!(err.to_string(), "Email is invalid");
        assert!(err.downcast_ref::<StoreError>().is_some());
        assert!(ctx.session.current_user().is_none());
        let toasts = ctx.notifier.active();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].kind, NotificationKind::Error);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let (ctx, _dir) = setup_test_ctx();
        signup(&ctx, "a@x.com", "secret1", "secret1").await.unwrap();
        logout(&ctx).unwrap();

        let err = login(&ctx, "a@x.com", "secret2").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::InvalidCredentials)
        ));
        assert!(!ctx.session.is_authenticated());
    }

    #[tokio::test]
    async fn test_duplicate_signup_conflicts() {
        let (ctx, _dir) = setup_test_ctx();
        signup(&ctx, "a@x.com", "secret1", "secret1").await.unwrap();

        let err = signup(&ctx, "a@x.com", "secret1", "secret1").await.unwrap_err();
        assert!(matches!(err.downcast_ref::<StoreError>(), Some(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_whoami_without_session() {
        let (ctx, _dir) = setup_test_ctx();
        assert!(whoami(&ctx).is_ok());
    }
}
