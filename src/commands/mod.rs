pub mod auth;
pub mod create;
pub mod dashboard;
pub mod delete;
pub mod export;
pub mod init;
pub mod list;
pub mod show;
pub mod status;
pub mod update;

use anyhow::{bail, Result};

use ticketflow::forms::FormErrors;
use ticketflow::models::{SessionUser, Ticket};
use ticketflow::{AppContext, StoreError};

/// Guard for commands that need a signed-in user.
pub fn require_login(ctx: &AppContext) -> Result<SessionUser> {
    ctx.session.require_user().map_err(|e| {
        ctx.notifier.publish(e.to_string(), e.kind(), None);
        e.into()
    })
}

/// Reject invalid form input before it reaches a store.
pub fn check_form(ctx: &AppContext, errors: FormErrors) -> Result<()> {
    errors.into_result().map_err(|e| {
        ctx.notifier.publish(e.to_string(), e.kind(), None);
        e.into()
    })
}

/// Look a ticket up by its full id, or by an id suffix that matches exactly
/// one ticket. A leading `#` is ignored.
pub fn resolve_ticket(ctx: &AppContext, id: &str) -> Result<Ticket> {
    let id = id.trim().trim_start_matches('#');
    if let Some(ticket) = ctx.tickets.get_by_id(id) {
        return Ok(ticket);
    }

    let mut matches: Vec<Ticket> = if id.is_empty() {
        Vec::new()
    } else {
        ctx.tickets
            .all_tickets()
            .into_iter()
            .filter(|t| t.id.ends_with(id))
            .collect()
    };

    match matches.len() {
        0 => {
            let e = StoreError::TicketNotFound(id.to_string());
            ctx.notifier.publish(e.to_string(), e.kind(), None);
            Err(e.into())
        }
        1 => Ok(matches.remove(0)),
        _ => {
            let ids: Vec<&str> = matches.iter().map(|t| t.id.as_str()).collect();
            bail!("Ticket id '{}' is ambiguous: {}", id, ids.join(", "))
        }
    }
}

pub fn truncate(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
