use anyhow::{bail, Result};
use std::io::{self, Write};

use ticketflow::AppContext;

use crate::commands::{require_login, resolve_ticket};

pub async fn run(ctx: &AppContext, id: &str, force: bool) -> Result<()> {
    require_login(ctx)?;

    let ticket = resolve_ticket(ctx, id)?;

    if !force {
        print!("Delete ticket #{} \"{}\"? [y/N] ", ticket.id, ticket.title);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    if ctx.tickets.delete(&ticket.id).await? {
        println!("Deleted ticket #{}", ticket.id);
    } else {
        bail!("Ticket #{} not found", ticket.id);
    }

    Ok(())
}

/// Internal function for testing without stdin interaction
#[cfg(test)]
pub async fn run_force(ctx: &AppContext, id: &str) -> Result<()> {
    run(ctx, id, true).await
}
