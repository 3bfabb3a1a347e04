use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::clock::{Clock, IdGenerator};
use crate::demo::demo_data;
use crate::error::{StoreError, StoreResult};
use crate::models::{
    filter_tickets, Activity, ActivityAction, NewTicket, Ticket, TicketFilter, TicketPatch, TicketStats,
    DEFAULT_ASSIGNEE,
};
use crate::notify::Notifier;
use crate::storage::{PersistentStore, ACTIVITIES_KEY, TICKETS_KEY};

/// Maximum number of entries kept in the activity log.
pub const ACTIVITY_LOG_LIMIT: usize = 10;

const ACTIVITY_USER: &str = "You";
const CREATED_BY: &str = "current-user";

#[derive(Debug, Clone, Default)]
struct TicketState {
    tickets: Vec<Ticket>,
    activities: Vec<Activity>,
}

/// Prepend `entry`, evicting the oldest entries beyond the log limit.
pub fn push_activity(log: &mut Vec<Activity>, entry: Activity) {
    log.insert(0, entry);
    log.truncate(ACTIVITY_LOG_LIMIT);
}

/// Owns the ticket collection and the activity log.
///
/// Mutations are deferred: each waits out the configured latency first and
/// only then reads the latest state, so overlapping calls never overwrite
/// each other. A mutation runs on a copy of the state; the copy is persisted
/// and only then becomes current.
pub struct TicketRepository {
    state: Mutex<TicketState>,
    filter: Mutex<TicketFilter>,
    store: Arc<PersistentStore>,
    notifier: Arc<Notifier>,
    clock: Clock,
    ids: Arc<IdGenerator>,
    latency: Duration,
}

impl TicketRepository {
    pub fn open(
        store: Arc<PersistentStore>,
        notifier: Arc<Notifier>,
        clock: Clock,
        ids: Arc<IdGenerator>,
        latency: Duration,
    ) -> Self {
        let state = bootstrap(&store, &clock);
        TicketRepository {
            state: Mutex::new(state),
            filter: Mutex::new(TicketFilter::All),
            store,
            notifier,
            clock,
            ids,
            latency,
        }
    }

    fn state(&self) -> MutexGuard<'_, TicketState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, state: &TicketState) -> StoreResult<()> {
        self.store.save(TICKETS_KEY, &state.tickets)?;
        self.store.save(ACTIVITIES_KEY, &state.activities)?;
        Ok(())
    }

    /// Apply `f` to the latest state and persist the result.
    ///
    /// On failure nothing changes and an error notification is emitted;
    /// storage failures are reported with `failure`, other errors with
    /// their own message.
    fn commit<R>(
        &self,
        failure: &str,
        f: impl FnOnce(&mut TicketState) -> StoreResult<R>,
    ) -> StoreResult<R> {
        let mut state = self.state();
        let mut next = state.clone();
        let result = f(&mut next).and_then(|value| {
            self.persist(&next)?;
            Ok(value)
        });

        match result {
            Ok(value) => {
                *state = next;
                Ok(value)
            }
            Err(e) => {
                match &e {
                    StoreError::Storage(cause) => {
                        let cause = format!("{:#}", cause);
                        tracing::error!(error = %cause, "ticket mutation failed");
                        self.notifier.error(failure);
                    }
                    other => {
                        self.notifier.error(other.to_string());
                    }
                }
                Err(e)
            }
        }
    }

    fn activity(&self, action: ActivityAction, ticket: &Ticket, now: DateTime<Utc>) -> Activity {
        Activity::record(self.ids.next(&self.clock), action, ticket, ACTIVITY_USER, now)
    }

    pub async fn create(&self, data: NewTicket) -> StoreResult<Ticket> {
        self.clock.settle_after(self.latency).await;

        let ticket = self.commit("Failed to create ticket. Please try again.", |state| {
            let now = self.clock.now();
            let ticket = Ticket {
                id: self.ids.next(&self.clock),
                title: data.title,
                description: data.description.unwrap_or_default(),
                status: data.status,
                priority: data.priority.unwrap_or_default(),
                assignee: data
                    .assignee
                    .filter(|a| !a.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_ASSIGNEE.to_string()),
                created_at: now,
                updated_at: now,
                created_by: CREATED_BY.to_string(),
            };
            state.tickets.insert(0, ticket.clone());
            let entry = self.activity(ActivityAction::Created, &ticket, now);
            push_activity(&mut state.activities, entry);
            Ok(ticket)
        })?;

        tracing::info!(id = %ticket.id, title = %ticket.title, "ticket created");
        self.notifier.success("Ticket created successfully!");
        Ok(ticket)
    }

    /// Merge `patch` onto the ticket with `id` and refresh its `updated_at`.
    pub async fn update(&self, id: &str, patch: TicketPatch) -> StoreResult<Ticket> {
        self.clock.settle_after(self.latency).await;

        let ticket = self.commit("Failed to update ticket. Please try again.", |state| {
            let ticket = state
                .tickets
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| StoreError::TicketNotFound(id.to_string()))?;
            let now = self.clock.now();
            patch.apply(ticket);
            ticket.updated_at = now;
            let updated = ticket.clone();
            let entry = self.activity(ActivityAction::Updated, &updated, now);
            push_activity(&mut state.activities, entry);
            Ok(updated)
        })?;

        tracing::info!(id = %ticket.id, "ticket updated");
        self.notifier.success("Ticket updated successfully!");
        Ok(ticket)
    }

    /// Remove the ticket with `id`. Returns whether a ticket was removed;
    /// an unknown id still resolves successfully.
    pub async fn delete(&self, id: &str) -> StoreResult<bool> {
        self.clock.settle_after(self.latency).await;

        let removed = self.commit("Failed to delete ticket. Please try again.", |state| {
            let Some(pos) = state.tickets.iter().position(|t| t.id == id) else {
                return Ok(false);
            };
            let snapshot = state.tickets.remove(pos);
            let entry = self.activity(ActivityAction::Deleted, &snapshot, self.clock.now());
            push_activity(&mut state.activities, entry);
            Ok(true)
        })?;

        if removed {
            tracing::info!(id = %id, "ticket deleted");
        } else {
            tracing::debug!(id = %id, "delete of unknown ticket ignored");
        }
        self.notifier.success("Ticket deleted successfully!");
        Ok(removed)
    }

    pub fn get_by_id(&self, id: &str) -> Option<Ticket> {
        self.state().tickets.iter().find(|t| t.id == id).cloned()
    }

    pub fn all_tickets(&self) -> Vec<Ticket> {
        self.state().tickets.clone()
    }

    /// Activity log, newest first.
    pub fn activities(&self) -> Vec<Activity> {
        self.state().activities.clone()
    }

    pub fn recent_activities(&self, limit: usize) -> Vec<Activity> {
        self.state().activities.iter().take(limit).cloned().collect()
    }

    pub fn filtered_view(&self, filter: TicketFilter, search: &str) -> Vec<Ticket> {
        filter_tickets(&self.state().tickets, filter, search)
    }

    pub fn filter(&self) -> TicketFilter {
        *self.filter.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_filter(&self, filter: TicketFilter) {
        *self.filter.lock().unwrap_or_else(PoisonError::into_inner) = filter;
    }

    /// Tickets matching the current filter and `search`.
    pub fn visible(&self, search: &str) -> Vec<Ticket> {
        self.filtered_view(self.filter(), search)
    }

    pub fn stats(&self) -> TicketStats {
        TicketStats::compute(&self.state().tickets)
    }

    /// Ticket count for every filter tab, in tab order.
    pub fn filter_counts(&self) -> Vec<(TicketFilter, usize)> {
        let stats = self.stats();
        TicketFilter::TABS.iter().map(|f| (*f, stats.count(*f))).collect()
    }
}

fn bootstrap(store: &PersistentStore, clock: &Clock) -> TicketState {
    let mut state = TicketState::default();

    match store.load::<Vec<Ticket>>(TICKETS_KEY) {
        Some(tickets) => state.tickets = tickets,
        None => match demo_data(clock.now()) {
            Ok((tickets, activities)) => {
                tracing::info!(tickets = tickets.len(), "seeding demo tickets");
                state.tickets = tickets;
                state.activities = activities;
            }
            Err(e) => tracing::error!(error = %e, "demo data unavailable, starting empty"),
        },
    }

    if let Some(mut activities) = store.load::<Vec<Activity>>(ACTIVITIES_KEY) {
        activities.truncate(ACTIVITY_LOG_LIMIT);
        state.activities = activities;
    }

    // Written once so the seed never runs again, even if every ticket is later deleted.
    if let Err(e) = store
        .save(TICKETS_KEY, &state.tickets)
        .and_then(|_| store.save(ACTIVITIES_KEY, &state.activities))
    {
        let cause = format!("{:#}", e);
        tracing::warn!(error = %cause, "failed to persist ticket store on open");
    }

    state
}

/// Human-readable age of `then` relative to `now`.
pub fn format_time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds();
    if seconds < 60 {
        "Just now".to_string()
    } else if seconds < 3600 {
        format!("{} minutes ago", seconds / 60)
    } else if seconds < 86_400 {
        format!("{} hours ago", seconds / 3600)
    } else if seconds < 604_800 {
        format!("{} days ago", seconds / 86_400)
    } else {
        then.format("%Y-%m-%d").to_string()
    }
}
