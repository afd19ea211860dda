use std::fmt::Write;

use crate::models::{ActionItem, Meeting, Participant, ParticipantRole, Summary};

pub struct ComposedEmail {
    pub subject: String,
    pub body: String,
    pub recipients: Vec<String>,
}

/// Participant addresses, agents excluded
pub fn default_recipients(participants: &[Participant]) -> Vec<String> {
    let mut recipients: Vec<String> = Vec::new();
    for p in participants.iter().filter(|p| p.role != ParticipantRole::Agent) {
        if let Some(email) = &p.email {
            if !recipients.contains(email) {
                recipients.push(email.clone());
            }
        }
    }
    recipients
}

/// Draft a recap from the meeting summary and its action items
pub fn compose(
    meeting: &Meeting,
    summary: Option<&Summary>,
    action_items: &[ActionItem],
    participants: &[Participant],
) -> ComposedEmail {
    let mut body = String::new();
    let held_on = meeting
        .actual_start
        .or(meeting.scheduled_start)
        .map(|d| format!(" on {}", d.format("%B %-d, %Y")))
        .unwrap_or_default();
    let _ = writeln!(body, "Hi all,\n\nThanks for joining \"{}\"{}.", meeting.title, held_on);

    match summary {
        Some(summary) => {
            let _ = writeln!(body, "\nSummary\n{}", summary.content.trim());
            if !summary.decisions.is_empty() {
                let _ = writeln!(body, "\nDecisions");
                for decision in &summary.decisions {
                    let _ = writeln!(body, "- {}", decision);
                }
            }
        }
        None => {
            let _ = writeln!(body, "\nNo summary is available for this meeting yet.");
        }
    }

    let open: Vec<&ActionItem> = action_items.iter().filter(|i| i.status.is_open()).collect();
    if !open.is_empty() {
        let _ = writeln!(body, "\nAction items");
        for item in open {
            let mut line = format!("- {}", item.title);
            let owner = item.assignee.as_deref().map(str::to_string);
            let due = item.due_date.map(|d| format!("due {}", d.format("%Y-%m-%d")));
            let details: Vec<String> = owner.into_iter().chain(due).collect();
            if !details.is_empty() {
                let _ = write!(line, " ({})", details.join(", "));
            }
            let _ = writeln!(body, "{}", line);
        }
    }
    body.push_str("\nBest regards");

    ComposedEmail {
        subject: format!("Follow-up: {}", meeting.title),
        body,
        recipients: default_recipients(participants),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActionItemStatus, MeetingStatus, Priority};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn meeting() -> Meeting {
        let at = Utc.with_ymd_and_hms(2026, 4, 9, 15, 0, 0).unwrap();
        Meeting {
            id: 1,
            user_id: 1,
            agent_id: None,
            title: "Roadmap review".to_string(),
            description: None,
            status: MeetingStatus::Completed,
            scheduled_start: Some(at),
            scheduled_end: None,
            actual_start: None,
            actual_end: None,
            meeting_url: None,
            recording_url: None,
            calendar_event_id: None,
            created_at: at,
            updated_at: at,
        }
    }

    fn participant(name: &str, email: Option<&str>, role: ParticipantRole) -> Participant {
        Participant {
            id: 0,
            meeting_id: 1,
            name: name.to_string(),
            email: email.map(str::to_string),
            role,
            joined_at: None,
            left_at: None,
            created_at: Utc::now(),
        }
    }

    fn item(title: &str, status: ActionItemStatus) -> ActionItem {
        ActionItem {
            id: 0,
            meeting_id: Some(1),
            user_id: 1,
            title: title.to_string(),
            description: None,
            assignee: Some("Ana".to_string()),
            due_date: NaiveDate::from_ymd_opt(2026, 4, 15),
            priority: Priority::Medium,
            status,
            completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_compose_with_summary() {
        let summary = Summary {
            id: 1,
            meeting_id: 1,
            content: "We walked through Q3.".to_string(),
            key_points: vec![],
            decisions: vec!["Ship the beta in May.".to_string()],
            topics: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let items = vec![
            item("Draft the launch plan", ActionItemStatus::Pending),
            item("Old task", ActionItemStatus::Completed),
        ];
        let participants = vec![
            participant("Ana", Some("ana@example.com"), ParticipantRole::Host),
            participant("Scribe", Some("bot@example.com"), ParticipantRole::Agent),
            participant("Ben", None, ParticipantRole::Attendee),
        ];

        let email = compose(&meeting(), Some(&summary), &items, &participants);
        assert_eq!(email.subject, "Follow-up: Roadmap review");
        assert!(email.body.contains("\"Roadmap review\" on April 9, 2026."));
        assert!(email.body.contains("- Ship the beta in May."));
        assert!(email.body.contains("- Draft the launch plan (Ana, due 2026-04-15)"));
        assert!(!email.body.contains("Old task"));
        assert_eq!(email.recipients, vec!["ana@example.com"]);
    }

    #[test]
    fn test_compose_without_summary() {
        let email = compose(&meeting(), None, &[], &[]);
        assert!(email.body.contains("No summary is available"));
        assert!(!email.body.contains("Action items"));
        assert!(email.recipients.is_empty());
    }
}
