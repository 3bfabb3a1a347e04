use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};

use ticketflow::models::{Activity, Ticket, TicketFilter, TicketStatus};
use ticketflow::AppContext;

use crate::commands::require_login;

pub const EXPORT_VERSION: i32 = 1;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub version: i32,
    pub exported_at: String,
    pub tickets: Vec<Ticket>,
    pub activities: Vec<Activity>,
}

fn snapshot(ctx: &AppContext) -> ExportData {
    ExportData {
        version: EXPORT_VERSION,
        exported_at: ctx.clock.now().to_rfc3339(),
        tickets: ctx.tickets.all_tickets(),
        activities: ctx.tickets.activities(),
    }
}

pub fn run_json(ctx: &AppContext, output_path: Option<&str>) -> Result<()> {
    require_login(ctx)?;

    let data = snapshot(ctx);
    let json = serde_json::to_string_pretty(&data)?;

    match output_path {
        Some(path) => {
            fs::write(path, json).context("Failed to write export file")?;
            eprintln!("Exported {} tickets to {}", data.tickets.len(), path);
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }
    Ok(())
}

pub fn run_markdown(ctx: &AppContext, output_path: Option<&str>) -> Result<()> {
    require_login(ctx)?;

    let data = snapshot(ctx);
    let mut md = String::new();

    md.push_str("# TicketFlow Export\n\n");
    md.push_str(&format!(
        "Exported: {}\n\n",
        ctx.clock.now().format("%Y-%m-%d %H:%M:%S UTC")
    ));

    for status in TicketStatus::ALL {
        let group: Vec<_> = data.tickets.iter().filter(|t| t.status == status).collect();
        if group.is_empty() {
            continue;
        }
        md.push_str(&format!("## {}\n\n", TicketFilter::Status(status).label()));
        for ticket in group {
            write_ticket_md(&mut md, ticket);
        }
    }

    match output_path {
        Some(path) => {
            fs::write(path, md).context("Failed to write export file")?;
            eprintln!("Exported {} tickets to {}", data.tickets.len(), path);
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", md)?;
        }
    }
    Ok(())
}

fn write_ticket_md(md: &mut String, ticket: &Ticket) {
    let checkbox = if ticket.status == TicketStatus::Closed {
        "[x]"
    } else {
        "[ ]"
    };

    md.push_str(&format!("### {} #{}: {}\n\n", checkbox, ticket.id, ticket.title));
    md.push_str(&format!("- **Priority:** {}\n", ticket.priority));
    md.push_str(&format!("- **Assignee:** {}\n", ticket.assignee));
    md.push_str(&format!("- **Created:** {}\n", ticket.created_at.format("%Y-%m-%d")));

    if !ticket.description.is_empty() {
        md.push_str(&format!("\n{}\n", ticket.description));
    }

    md.push_str("\n---\n\n");
}
