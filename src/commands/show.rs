use anyhow::Result;

use ticketflow::AppContext;

use crate::commands::{require_login, resolve_ticket};

pub fn run(ctx: &AppContext, id: &str) -> Result<()> {
    require_login(ctx)?;

    let ticket = resolve_ticket(ctx, id)?;

    println!("Ticket #{}: {}", ticket.id, ticket.title);
    println!("Status: {}", ticket.status);
    println!("Priority: {}", ticket.priority);
    println!("Assignee: {}", ticket.assignee);
    println!("Created: {}", ticket.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Updated: {}", ticket.updated_at.format("%Y-%m-%d %H:%M:%S"));

    if !ticket.description.is_empty() {
        println!("\nDescription:");
        for line in ticket.description.lines() {
            println!("  {}", line);
        }
    }

    let history: Vec<_> = ctx
        .tickets
        .activities()
        .into_iter()
        .filter(|a| a.ticket_id == ticket.id)
        .collect();
    if !history.is_empty() {
        println!("\nRecent activity:");
        for activity in history {
            println!(
                "  [{}] {} {} by {}",
                activity.time.format("%Y-%m-%d %H:%M"),
                activity.icon,
                activity.action.as_str(),
                activity.user
            );
        }
    }

    Ok(())
}
