use anyhow::Result;

use ticketflow::models::{TicketPatch, TicketStatus};
use ticketflow::AppContext;

use crate::commands::{require_login, resolve_ticket};

async fn set_status(ctx: &AppContext, id: &str, status: TicketStatus) -> Result<Option<String>> {
    require_login(ctx)?;
    let ticket = resolve_ticket(ctx, id)?;

    if ticket.status == status {
        println!("Ticket #{} is already {}", ticket.id, status);
        return Ok(None);
    }

    ctx.tickets.update(&ticket.id, TicketPatch::status(status)).await?;
    Ok(Some(ticket.id))
}

pub async fn close(ctx: &AppContext, id: &str) -> Result<()> {
    if let Some(id) = set_status(ctx, id, TicketStatus::Closed).await? {
        println!("Closed ticket #{}", id);
    }
    Ok(())
}

pub async fn reopen(ctx: &AppContext, id: &str) -> Result<()> {
    if let Some(id) = set_status(ctx, id, TicketStatus::Open).await? {
        println!("Reopened ticket #{}", id);
    }
    Ok(())
}

pub async fn start(ctx: &AppContext, id: &str) -> Result<()> {
    if let Some(id) = set_status(ctx, id, TicketStatus::InProgress).await? {
        println!("Started work on ticket #{}", id);
    }
    Ok(())
}
