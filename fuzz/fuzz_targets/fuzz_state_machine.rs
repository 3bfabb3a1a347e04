#![no_main]

//! Random sequences of ticket operations. Checks that stats stay
//! consistent and that a reopened store sees exactly what was committed.

use std::sync::Arc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use ticketflow::config::Config;
use ticketflow::models::{NewTicket, Priority, TicketFilter, TicketPatch, TicketStatus};
use ticketflow::storage::MemoryMedium;
use ticketflow::tickets::ACTIVITY_LOG_LIMIT;
use ticketflow::AppContext;

#[derive(Arbitrary, Debug)]
enum Op {
    Create { title: String, status: u8, priority: u8 },
    Update { index: u8, title: Option<String>, status: Option<u8> },
    Delete { index: u8 },
    DeleteUnknown { id: String },
    Search { filter: u8, term: String },
}

fn status(n: u8) -> TicketStatus {
    TicketStatus::ALL[n as usize % TicketStatus::ALL.len()]
}

fn priority(n: u8) -> Priority {
    Priority::ALL[n as usize % Priority::ALL.len()]
}

fuzz_target!(|ops: Vec<Op>| {
    if ops.len() > 64 {
        return;
    }
    let rt = match tokio::runtime::Builder::new_current_thread().enable_time().build() {
        Ok(rt) => rt,
        Err(_) => return,
    };

    rt.block_on(async {
        let medium = Arc::new(MemoryMedium::new());
        let ctx = AppContext::open(medium.clone(), Config::default().instant());

        for op in ops {
            match op {
                Op::Create { title, status: s, priority: p } => {
                    let mut data = NewTicket::new(title);
                    data.status = status(s);
                    data.priority = Some(priority(p));
                    let _ = ctx.tickets.create(data).await;
                }
                Op::Update { index, title, status: s } => {
                    let tickets = ctx.tickets.all_tickets();
                    if tickets.is_empty() {
                        continue;
                    }
                    let id = tickets[index as usize % tickets.len()].id.clone();
                    let patch = TicketPatch {
                        title,
                        status: s.map(status),
                        ..TicketPatch::default()
                    };
                    assert!(ctx.tickets.update(&id, patch).await.is_ok());
                }
                Op::Delete { index } => {
                    let tickets = ctx.tickets.all_tickets();
                    if tickets.is_empty() {
                        continue;
                    }
                    let id = tickets[index as usize % tickets.len()].id.clone();
                    assert_eq!(ctx.tickets.delete(&id).await.ok(), Some(true));
                    assert!(ctx.tickets.get_by_id(&id).is_none());
                }
                Op::DeleteUnknown { id } => {
                    if ctx.tickets.get_by_id(&id).is_none() {
                        let before = ctx.tickets.activities();
                        assert_eq!(ctx.tickets.delete(&id).await.ok(), Some(false));
                        assert_eq!(ctx.tickets.activities(), before);
                    }
                }
                Op::Search { filter, term } => {
                    let filter = TicketFilter::TABS[filter as usize % TicketFilter::TABS.len()];
                    let all = ctx.tickets.filtered_view(filter, "");
                    let found = ctx.tickets.filtered_view(filter, &term);
                    assert!(found.len() <= all.len());
                }
            }

            let stats = ctx.tickets.stats();
            assert_eq!(stats.total, stats.open + stats.in_progress + stats.closed);
            assert_eq!(stats.total, stats.high + stats.medium + stats.low);
            assert!(ctx.tickets.activities().len() <= ACTIVITY_LOG_LIMIT);
        }

        let expected = ctx.tickets.all_tickets();
        drop(ctx);
        let reopened = AppContext::open(medium, Config::default().instant());
        assert_eq!(reopened.tickets.all_tickets(), expected);
    });
});
