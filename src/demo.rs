//! Seed dataset installed the first time a ticket store is opened.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;

use crate::models::{Activity, ActivityAction, Priority, Ticket, TicketStatus};

const DEMO_JSON: &str = include_str!("../resources/demo.json");

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DemoFile {
    tickets: Vec<DemoTicket>,
    activities: Vec<DemoActivity>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DemoTicket {
    id: String,
    title: String,
    description: String,
    status: TicketStatus,
    priority: Priority,
    assignee: String,
    created_minutes_ago: i64,
    updated_minutes_ago: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DemoActivity {
    id: String,
    action: ActivityAction,
    ticket_id: String,
    ticket_title: String,
    user: String,
    minutes_ago: i64,
}

/// Demo tickets and activities with timestamps relative to `now`.
pub fn demo_data(now: DateTime<Utc>) -> Result<(Vec<Ticket>, Vec<Activity>)> {
    let file: DemoFile = serde_json::from_str(DEMO_JSON).context("Embedded demo data is invalid")?;
    let ago = |minutes: i64| now - TimeDelta::minutes(minutes);

    let tickets = file
        .tickets
        .into_iter()
        .map(|t| Ticket {
            id: t.id,
            title: t.title,
            description: t.description,
            status: t.status,
            priority: t.priority,
            assignee: t.assignee,
            created_at: ago(t.created_minutes_ago),
            updated_at: ago(t.updated_minutes_ago),
            created_by: "system".to_string(),
        })
        .collect();

    let activities = file
        .activities
        .into_iter()
        .map(|a| Activity {
            id: a.id,
            action: a.action,
            ticket_id: a.ticket_id,
            ticket_title: a.ticket_title,
            user: a.user,
            time: ago(a.minutes_ago),
            icon: a.action.icon().to_string(),
        })
        .collect();

    Ok((tickets, activities))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_data_shape() {
        let now = Utc::now();
        let (tickets, activities) = demo_data(now).unwrap();
        assert_eq!(tickets.len(), 6);
        assert_eq!(activities.len(), 4);
    }

    #[test]
    fn test_demo_timestamps_in_the_past() {
        let now = Utc::now();
        let (tickets, activities) = demo_data(now).unwrap();
        for ticket in &tickets {
            assert!(ticket.created_at <= ticket.updated_at);
            assert!(ticket.updated_at < now);
        }
        assert!(activities.iter().all(|a| a.time < now));
    }

    #[test]
    fn test_demo_ids_unique() {
        let (tickets, _) = demo_data(Utc::now()).unwrap();
        let mut ids: Vec<&str> = tickets.iter().map(|t| t.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), tickets.len());
    }

    #[test]
    fn test_demo_activities_reference_demo_titles() {
        let (tickets, activities) = demo_data(Utc::now()).unwrap();
        for activity in &activities {
            let ticket = tickets.iter().find(|t| t.id == activity.ticket_id).unwrap();
            assert_eq!(ticket.title, activity.ticket_title);
            assert_eq!(activity.icon, activity.action.icon());
        }
    }
}
