use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::Serialize;

use crate::models::User;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEvent {
    /// Provider id, stable across syncs
    pub event_id: String,
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub meeting_url: Option<String>,
    pub attendees: Vec<String>,
}

#[async_trait]
pub trait CalendarProvider: Send + Sync {
    async fn fetch_events(&self, user: &User) -> Result<Vec<CalendarEvent>, String>;
}

/// (slug, title, days ahead, start hour, minutes, teammates)
const MOCK_SCHEDULE: &[(&str, &str, i64, u32, i64, &[&str])] = &[
    ("standup", "Daily standup", 1, 9, 15, &["alex@example.com", "sam@example.com"]),
    ("planning", "Sprint planning", 2, 14, 60, &["alex@example.com", "priya@example.com"]),
    ("client", "Client check-in", 3, 16, 30, &["client@example.org"]),
];

/// Fixed upcoming schedule relative to the current day
pub struct MockCalendar;

impl MockCalendar {
    pub fn events_for(user: &User, now: DateTime<Utc>) -> Vec<CalendarEvent> {
        let today = now.date_naive();
        MOCK_SCHEDULE
            .iter()
            .filter_map(|(slug, title, days, hour, minutes, teammates)| {
                let day = today + Duration::days(*days);
                let start = day.and_time(NaiveTime::from_hms_opt(*hour, 0, 0)?).and_utc();
                let mut attendees = vec![user.email.clone()];
                attendees.extend(teammates.iter().map(|s| s.to_string()));
                Some(CalendarEvent {
                    event_id: format!("mock-{}-{}-{}", user.id, slug, day.format("%Y%m%d")),
                    title: title.to_string(),
                    description: Some(format!("Imported from calendar for {}", user.name)),
                    start,
                    end: start + Duration::minutes(*minutes),
                    meeting_url: Some(format!("https://meet.example.com/{}-{}", slug, user.id)),
                    attendees,
                })
            })
            .collect()
    }
}

#[async_trait]
impl CalendarProvider for MockCalendar {
    async fn fetch_events(&self, user: &User) -> Result<Vec<CalendarEvent>, String> {
        let events = Self::events_for(user, Utc::now());
        log::info!("Mock calendar returned {} events for user {}", events.len(), user.id);
        Ok(events)
    }
}
