//! Work run once a meeting completes: summary, action items, analytics.
//! Each step logs its own failure and the next one still runs.

use serde::Serialize;

use super::{analytics, Providers};
use crate::db::Database;
use crate::models::{ActionItem, Meeting, MeetingAnalytics, Summary};

#[derive(Debug, Default, Serialize)]
pub struct FinalizeReport {
    pub summary: Option<Summary>,
    pub action_items: Vec<ActionItem>,
    pub analytics: Option<MeetingAnalytics>,
}

pub async fn finalize(db: &Database, providers: &Providers, meeting: &Meeting) -> FinalizeReport {
    let mut report = FinalizeReport::default();

    let transcripts = match db.list_transcripts(meeting.id, None) {
        Ok(t) => t,
        Err(e) => {
            log::error!("Failed to load transcripts for meeting {}: {}", meeting.id, e);
            Vec::new()
        }
    };

    if transcripts.is_empty() {
        log::info!("Meeting {} has no transcripts, skipping summary", meeting.id);
    } else {
        match providers.summarizer.summarize(&transcripts).await {
            Ok(draft) => match db.upsert_summary(meeting.id, &draft) {
                Ok(summary) => report.summary = Some(summary),
                Err(e) => log::error!("Failed to store summary for meeting {}: {}", meeting.id, e),
            },
            Err(e) => log::warn!("Summarizer failed for meeting {}: {}", meeting.id, e),
        }

        match providers.summarizer.extract_action_items(&transcripts).await {
            Ok(drafts) => match db.insert_action_item_drafts(meeting.user_id, meeting.id, &drafts) {
                Ok(items) => report.action_items = items,
                Err(e) => log::error!("Failed to store action items for meeting {}: {}", meeting.id, e),
            },
            Err(e) => log::warn!("Action item extraction failed for meeting {}: {}", meeting.id, e),
        }
    }

    match analytics::refresh(db, meeting) {
        Ok(stats) => report.analytics = Some(stats),
        Err(e) => log::error!("Failed to compute analytics for meeting {}: {}", meeting.id, e),
    }

    log::info!(
        "Finalized meeting {}: summary={}, action_items={}",
        meeting.id,
        report.summary.is_some(),
        report.action_items.len()
    );
    report
}
