use std::sync::Arc;

use crate::clock::{Clock, IdGenerator};
use crate::config::Config;
use crate::notify::Notifier;
use crate::session::SessionStore;
use crate::storage::{PersistentStore, StorageMedium};
use crate::tickets::TicketRepository;

/// The stores of one data directory, constructed once and shared by handle.
pub struct AppContext {
    pub config: Config,
    pub clock: Clock,
    pub store: Arc<PersistentStore>,
    pub notifier: Arc<Notifier>,
    pub session: Arc<SessionStore>,
    pub tickets: Arc<TicketRepository>,
}

impl AppContext {
    pub fn open(medium: Arc<dyn StorageMedium>, config: Config) -> Self {
        let clock = Clock::new();
        let ids = Arc::new(IdGenerator::new());
        let store = Arc::new(PersistentStore::new(medium, &config.namespace));
        let notifier = Arc::new(Notifier::from_config(&config));

        let session = Arc::new(SessionStore::open(
            store.clone(),
            notifier.clone(),
            clock,
            ids.clone(),
            config.auth_latency(),
        ));
        let tickets = Arc::new(TicketRepository::open(
            store.clone(),
            notifier.clone(),
            clock,
            ids,
            config.mutation_latency(),
        ));

        AppContext {
            config,
            clock,
            store,
            notifier,
            session,
            tickets,
        }
    }
}
