use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Closed,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 3] = [Self::Open, Self::InProgress, Self::Closed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "closed" => Ok(Self::Closed),
            other => Err(format!(
                "Invalid status '{}'. Must be one of: open, in_progress, closed",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Self::High, Self::Medium, Self::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!(
                "Invalid priority '{}'. Must be one of: low, medium, high",
                other
            )),
        }
    }
}

pub const DEFAULT_ASSIGNEE: &str = "Unassigned";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TicketStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_assignee")]
    pub assignee: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: String,
}

impl Ticket {
    fn matches_search(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.description.to_lowercase().contains(needle)
    }
}

fn default_assignee() -> String {
    DEFAULT_ASSIGNEE.to_string()
}

/// Input for a new ticket. Unset fields are defaulted by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    pub title: String,
    pub description: Option<String>,
    pub status: TicketStatus,
    pub priority: Option<Priority>,
    pub assignee: Option<String>,
}

impl NewTicket {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            status: TicketStatus::Open,
            priority: None,
            assignee: None,
        }
    }
}

/// Partial update; `None` leaves the attribute untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TicketStatus>,
    pub priority: Option<Priority>,
    pub assignee: Option<String>,
}

impl TicketPatch {
    pub fn status(status: TicketStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.assignee.is_none()
    }

    pub fn apply(&self, ticket: &mut Ticket) {
        if let Some(title) = &self.title {
            ticket.title = title.clone();
        }
        if let Some(description) = &self.description {
            ticket.description = description.clone();
        }
        if let Some(status) = self.status {
            ticket.status = status;
        }
        if let Some(priority) = self.priority {
            ticket.priority = priority;
        }
        if let Some(assignee) = &self.assignee {
            ticket.assignee = assignee.clone();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TicketFilter {
    #[default]
    All,
    Status(TicketStatus),
    Priority(Priority),
}

impl TicketFilter {
    /// Every filter tab, in display order.
    pub const TABS: [TicketFilter; 7] = [
        Self::All,
        Self::Status(TicketStatus::Open),
        Self::Status(TicketStatus::InProgress),
        Self::Status(TicketStatus::Closed),
        Self::Priority(Priority::High),
        Self::Priority(Priority::Medium),
        Self::Priority(Priority::Low),
    ];

    pub fn matches(&self, ticket: &Ticket) -> bool {
        match self {
            Self::All => true,
            Self::Status(status) => ticket.status == *status,
            Self::Priority(priority) => ticket.priority == *priority,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Status(status) => status.as_str(),
            Self::Priority(priority) => priority.as_str(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "All Tickets",
            Self::Status(TicketStatus::Open) => "Open",
            Self::Status(TicketStatus::InProgress) => "In Progress",
            Self::Status(TicketStatus::Closed) => "Closed",
            Self::Priority(Priority::High) => "High Priority",
            Self::Priority(Priority::Medium) => "Medium Priority",
            Self::Priority(Priority::Low) => "Low Priority",
        }
    }
}

impl fmt::Display for TicketFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(Self::All);
        }
        if let Ok(status) = s.parse() {
            return Ok(Self::Status(status));
        }
        if let Ok(priority) = s.parse() {
            return Ok(Self::Priority(priority));
        }
        Err(format!(
            "Invalid filter '{}'. Must be one of: all, open, in_progress, closed, high, medium, low",
            s
        ))
    }
}

/// Filter first, then restrict to tickets whose title or description
/// contains `search` case-insensitively. Relative order is preserved.
pub fn filter_tickets(tickets: &[Ticket], filter: TicketFilter, search: &str) -> Vec<Ticket> {
    let needle = search.to_lowercase();
    tickets
        .iter()
        .filter(|t| filter.matches(t))
        .filter(|t| needle.is_empty() || t.matches_search(&needle))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketStats {
    pub total: usize,
    pub open: usize,
    pub in_progress: usize,
    pub closed: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl TicketStats {
    pub fn compute(tickets: &[Ticket]) -> Self {
        let mut stats = Self {
            total: tickets.len(),
            ..Self::default()
        };
        for ticket in tickets {
            match ticket.status {
                TicketStatus::Open => stats.open += 1,
                TicketStatus::InProgress => stats.in_progress += 1,
                TicketStatus::Closed => stats.closed += 1,
            }
            match ticket.priority {
                Priority::High => stats.high += 1,
                Priority::Medium => stats.medium += 1,
                Priority::Low => stats.low += 1,
            }
        }
        stats
    }

    pub fn count(&self, filter: TicketFilter) -> usize {
        match filter {
            TicketFilter::All => self.total,
            TicketFilter::Status(TicketStatus::Open) => self.open,
            TicketFilter::Status(TicketStatus::InProgress) => self.in_progress,
            TicketFilter::Status(TicketStatus::Closed) => self.closed,
            TicketFilter::Priority(Priority::High) => self.high,
            TicketFilter::Priority(Priority::Medium) => self.medium,
            TicketFilter::Priority(Priority::Low) => self.low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityAction {
    Created,
    Updated,
    Deleted,
    Resolved,
    Commented,
}

impl ActivityAction {
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Created => "➕",
            Self::Updated => "✏️",
            Self::Deleted => "🗑️",
            Self::Resolved => "✅",
            Self::Commented => "💬",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Resolved => "resolved",
            Self::Commented => "commented",
        }
    }
}

/// Log entry. `ticket_title` is a copy taken when the entry was written and
/// is never refreshed from the live ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub action: ActivityAction,
    pub ticket_id: String,
    #[serde(alias = "ticket")]
    pub ticket_title: String,
    pub user: String,
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub icon: String,
}

impl Activity {
    pub fn record(
        id: String,
        action: ActivityAction,
        ticket: &Ticket,
        user: &str,
        time: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            action,
            ticket_id: ticket.id.clone(),
            ticket_title: ticket.title.clone(),
            user: user.to_string(),
            time,
            icon: action.icon().to_string(),
        }
    }
}

/// Entry in the registered-user table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub email: String,
    pub password: String,
    pub id: String,
    pub created_at: DateTime<Utc>,
}

/// The persisted session record. Never carries the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub email: String,
    pub id: String,
}
