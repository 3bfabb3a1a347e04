use anyhow::Result;

use ticketflow::tickets::format_time_ago;
use ticketflow::AppContext;

use crate::commands::{require_login, truncate};

const RECENT_ACTIVITY_SHOWN: usize = 4;

pub fn run(ctx: &AppContext) -> Result<()> {
    let user = require_login(ctx)?;
    let stats = ctx.tickets.stats();

    println!("Welcome back, {}", user.email);
    println!();
    println!(
        "Total: {}  Open: {}  In Progress: {}  Closed: {}",
        stats.total, stats.open, stats.in_progress, stats.closed
    );
    println!();

    println!("Filters:");
    for (filter, count) in ctx.tickets.filter_counts() {
        let marker = if filter == ctx.tickets.filter() { "*" } else { " " };
        println!("  {} {:<16} {}", marker, filter.label(), count);
    }
    println!();

    let recent = ctx.tickets.recent_activities(RECENT_ACTIVITY_SHOWN);
    println!("Recent Activity:");
    if recent.is_empty() {
        println!("  No activity yet.");
        return Ok(());
    }

    let now = ctx.clock.now();
    for activity in recent {
        println!(
            "  {} {} #{} {:<30} {} ({})",
            activity.icon,
            activity.action.as_str(),
            activity.ticket_id,
            truncate(&activity.ticket_title, 30),
            activity.user,
            format_time_ago(activity.time, now)
        );
    }

    Ok(())
}
