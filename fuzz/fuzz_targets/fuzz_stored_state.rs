#![no_main]

//! Opening the stores over arbitrary persisted values must never panic.
//! Undecodable keys are cleared and the stores fall back to their defaults.

use std::sync::Arc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use ticketflow::config::Config;
use ticketflow::storage::{MemoryMedium, StorageMedium};
use ticketflow::AppContext;

#[derive(Arbitrary, Debug)]
struct StoredValues {
    session: Option<String>,
    users: Option<String>,
    tickets: Option<String>,
    activities: Option<String>,
}

fuzz_target!(|input: StoredValues| {
    let medium = Arc::new(MemoryMedium::new());
    let entries = [
        ("ticketapp_session", &input.session),
        ("ticketapp_users", &input.users),
        ("ticketapp_tickets", &input.tickets),
        ("ticketapp_activities", &input.activities),
    ];
    for (key, value) in entries {
        if let Some(value) = value {
            let _ = medium.set(key, value);
        }
    }

    let ctx = AppContext::open(medium, Config::default().instant());
    let stats = ctx.tickets.stats();
    assert_eq!(stats.total, stats.open + stats.in_progress + stats.closed);
    assert!(ctx.tickets.activities().len() <= ticketflow::tickets::ACTIVITY_LOG_LIMIT);
});
