use anyhow::Result;

use ticketflow::models::{Ticket, TicketFilter};
use ticketflow::AppContext;

use crate::commands::{require_login, truncate};

pub fn run(ctx: &AppContext, filter: TicketFilter, search: Option<&str>) -> Result<()> {
    require_login(ctx)?;

    ctx.tickets.set_filter(filter);
    let tickets = ctx.tickets.visible(search.unwrap_or(""));

    if tickets.is_empty() {
        match search {
            Some(term) if !term.is_empty() => println!("No tickets match '{}'.", term),
            _ => println!("No {} tickets found.", filter.label().to_lowercase()),
        }
        return Ok(());
    }

    for ticket in &tickets {
        println!("{}", format_row(ticket));
    }

    Ok(())
}

fn format_row(ticket: &Ticket) -> String {
    let status_display = format!("[{}]", ticket.status);
    format!(
        "#{:<13} {:13} {:<40} {:6} {:<14} {}",
        ticket.id,
        status_display,
        truncate(&ticket.title, 40),
        ticket.priority,
        truncate(&ticket.assignee, 14),
        ticket.created_at.format("%Y-%m-%d")
    )
}
