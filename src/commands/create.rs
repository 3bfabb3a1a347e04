use anyhow::Result;

use ticketflow::forms::validate_ticket;
use ticketflow::models::{NewTicket, Priority, TicketStatus};
use ticketflow::AppContext;

use crate::commands::{check_form, require_login};

pub async fn run(
    ctx: &AppContext,
    title: &str,
    description: Option<&str>,
    status: TicketStatus,
    priority: Priority,
    assignee: Option<&str>,
) -> Result<()> {
    require_login(ctx)?;
    check_form(ctx, validate_ticket(title))?;

    let ticket = ctx
        .tickets
        .create(NewTicket {
            title: title.to_string(),
            description: description.map(str::to_string),
            status,
            priority: Some(priority),
            assignee: assignee.map(str::to_string),
        })
        .await?;

    println!("Created ticket #{}", ticket.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{setup_logged_in, setup_test_ctx};
    use proptest::prelude::*;

    // ==================== Unit Tests ====================

    #[tokio::test]
    async fn test_create_basic() {
        let (ctx, _dir) = setup_logged_in().await;
        run(&ctx, "Printer jam", None, TicketStatus::Open, Priority::Medium, None)
            .await
            .unwrap();

        let newest = &ctx.tickets.all_tickets()[0];
        assert_eq!(newest.title, "Printer jam");
        assert_eq!(newest.assignee, "Unassigned");
    }

    #[tokio::test]
    async fn test_create_all_fields() {
        let (ctx, _dir) = setup_logged_in().await;
        run(
            &ctx,
            "VPN drops",
            Some("Every 10 minutes"),
            TicketStatus::InProgress,
            Priority::High,
            Some("Sarah Chen"),
        )
        .await
        .unwrap();

        let newest = &ctx.tickets.all_tickets()[0];
        assert_eq!(newest.description, "Every 10 minutes");
        assert_eq!(newest.status, TicketStatus::InProgress);
        assert_eq!(newest.priority, Priority::High);
        assert_eq!(newest.assignee, "Sarah Chen");
    }

    #[tokio::test]
    async fn test_create_requires_login() {
        let (ctx, _dir) = setup_test_ctx();
        let before = ctx.tickets.stats().total;

        let result = run(&ctx, "Nope", None, TicketStatus::Open, Priority::Low, None).await;
        assert!(result.is_err());
        assert_eq!(ctx.tickets.stats().total, before);
    }

    #[tokio::test]
    async fn test_create_short_title_rejected() {
        let (ctx, _dir) = setup_logged_in().await;
        let before = ctx.tickets.stats().total;

        let err = run(&ctx, "ab", None, TicketStatus::Open, Priority::Low, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("at least 3 characters"));
        assert_eq!(ctx.tickets.stats().total, before);
    }

    #[tokio::test]
    async fn test_create_sql_injection_title() {
        let (ctx, _dir) = setup_logged_in().await;
        let malicious = "'; DROP TABLE kv; --";
        run(&ctx, malicious, None, TicketStatus::Open, Priority::Low, None)
            .await
            .unwrap();
        assert_eq!(ctx.tickets.all_tickets()[0].title, malicious);
    }

    // ==================== Property-Based Tests ====================

    proptest! {
        #[test]
        fn prop_create_title_roundtrip(title in "[a-zA-Z0-9 ]{3,40}".prop_filter("non-blank", |s| !s.trim().is_empty())) {
            let rt = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
            let stored = rt.block_on(async {
                let (ctx, _dir) = setup_logged_in().await;
                run(&ctx, &title, None, TicketStatus::Open, Priority::Medium, None).await.unwrap();
                ctx.tickets.all_tickets()[0].title.clone()
            });
            prop_assert_eq!(stored, title);
        }
    }
}
