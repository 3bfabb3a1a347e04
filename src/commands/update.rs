use anyhow::{bail, Result};

use ticketflow::forms::validate_ticket;
use ticketflow::models::TicketPatch;
use ticketflow::AppContext;

use crate::commands::{check_form, require_login, resolve_ticket};

pub async fn run(ctx: &AppContext, id: &str, patch: TicketPatch) -> Result<()> {
    require_login(ctx)?;

    if patch.is_empty() {
        bail!("Nothing to update. Use --title, --description, --status, --priority or --assignee");
    }

    if let Some(title) = &patch.title {
        check_form(ctx, validate_ticket(title))?;
    }

    let target = resolve_ticket(ctx, id)?;
    let ticket = ctx.tickets.update(&target.id, patch).await?;
    println!("Updated ticket #{}", ticket.id);
    Ok(())
}
