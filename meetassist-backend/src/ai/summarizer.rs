use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};

use super::split_sentences;
use crate::models::{ActionItemDraft, Priority, SummaryDraft, Transcript};

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, transcripts: &[Transcript]) -> Result<SummaryDraft, String>;

    async fn extract_action_items(&self, transcripts: &[Transcript]) -> Result<Vec<ActionItemDraft>, String>;
}

const LEAD_SENTENCES: usize = 3;
const MAX_KEY_POINTS: usize = 5;
const MAX_TOPICS: usize = 5;
const MAX_TITLE_CHARS: usize = 200;

static ACTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(i will|i'll|we need to|action item|follow up|follow-up|todo|to-do)\b|\bby (monday|tuesday|wednesday|thursday|friday|saturday|sunday|tomorrow|next week)\b",
    )
    .expect("valid action regex")
});

static URGENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(urgent|urgently|asap)\b").expect("valid urgency regex"));

static ACTION_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(action item|todo|to-do)\s*[:\-]\s*").expect("valid prefix regex"));

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-zA-Z][a-zA-Z'-]+").expect("valid word regex"));

const DECISION_MARKERS: &[&str] = &["decide", "agreed", "will go with"];

const STOPWORDS: &[&str] = &[
    "about", "after", "again", "also", "because", "been", "before", "being", "both", "could",
    "does", "doing", "down", "each", "from", "further", "have", "having", "here", "into", "just",
    "like", "make", "more", "most", "much", "need", "only", "other", "over", "really", "same",
    "should", "some", "such", "than", "that", "their", "them", "then", "there", "these", "they",
    "thing", "things", "think", "this", "those", "through", "under", "until", "very", "want",
    "were", "what", "when", "where", "which", "while", "will", "with", "would", "yeah", "your",
    "we'll", "i'll", "let's", "it's", "that's", "going", "okay", "right", "know", "everyone",
];

/// Segments spoken by humans, or everything when only agents spoke
fn human_segments(transcripts: &[Transcript]) -> Vec<&Transcript> {
    let humans: Vec<&Transcript> = transcripts.iter().filter(|t| !t.is_agent).collect();
    if humans.is_empty() {
        transcripts.iter().collect()
    } else {
        humans
    }
}

/// Sentence-picking summarizer with no model behind it
pub struct ExtractiveSummarizer;

#[async_trait]
impl Summarizer for ExtractiveSummarizer {
    async fn summarize(&self, transcripts: &[Transcript]) -> Result<SummaryDraft, String> {
        if transcripts.is_empty() {
            return Err("No transcripts to summarize".to_string());
        }
        let segments = human_segments(transcripts);

        let mut speakers: Vec<&str> = Vec::new();
        let mut sentences: Vec<String> = Vec::new();
        for segment in &segments {
            if !speakers.contains(&segment.speaker.as_str()) {
                speakers.push(segment.speaker.as_str());
            }
            sentences.extend(split_sentences(&segment.content));
        }

        let lead = sentences
            .iter()
            .take(LEAD_SENTENCES)
            .cloned()
            .collect::<Vec<_>>()
            .join(" ");
        let content = format!("{}\n\nSpeakers: {}", lead, speakers.join(", "));

        Ok(SummaryDraft {
            content,
            key_points: key_points(&sentences),
            decisions: decisions(&sentences),
            topics: topics(&sentences),
        })
    }

    async fn extract_action_items(&self, transcripts: &[Transcript]) -> Result<Vec<ActionItemDraft>, String> {
        let mut seen = HashSet::new();
        let mut drafts = Vec::new();

        for segment in transcripts.iter().filter(|t| !t.is_agent) {
            for sentence in split_sentences(&segment.content) {
                if !ACTION_RE.is_match(&sentence) {
                    continue;
                }
                let title = action_title(&sentence);
                if title.is_empty() || !seen.insert(title.to_lowercase()) {
                    continue;
                }
                let priority = if URGENT_RE.is_match(&sentence) {
                    Priority::High
                } else {
                    Priority::Medium
                };
                drafts.push(ActionItemDraft {
                    title,
                    assignee: Some(segment.speaker.clone()),
                    priority,
                });
            }
        }
        Ok(drafts)
    }
}

/// Longest distinct sentences, longest first
fn key_points(sentences: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut distinct: Vec<&String> = sentences
        .iter()
        .filter(|s| seen.insert(s.to_lowercase()))
        .collect();
    // stable sort keeps spoken order among equal lengths
    distinct.sort_by(|a, b| b.len().cmp(&a.len()));
    distinct.into_iter().take(MAX_KEY_POINTS).cloned().collect()
}

fn decisions(sentences: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    sentences
        .iter()
        .filter(|s| {
            let lower = s.to_lowercase();
            DECISION_MARKERS.iter().any(|m| lower.contains(m))
        })
        .filter(|s| seen.insert(s.to_lowercase()))
        .cloned()
        .collect()
}

/// Most frequent non-stopword terms, ties broken alphabetically
fn topics(sentences: &[String]) -> Vec<String> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for sentence in sentences {
        for word in WORD_RE.find_iter(sentence) {
            let word = word.as_str().to_lowercase();
            if word.len() < 4 || STOPWORDS.contains(&word.as_str()) {
                continue;
            }
            *counts.entry(word).or_insert(0) += 1;
        }
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.into_iter().take(MAX_TOPICS).map(|(word, _)| word).collect()
}

fn action_title(sentence: &str) -> String {
    let stripped = ACTION_PREFIX_RE.replace(sentence.trim(), "");
    let title = stripped.trim_end_matches(|c: char| matches!(c, '.' | '!' | '?')).trim();
    title.chars().take(MAX_TITLE_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn segment(speaker: &str, content: &str, is_agent: bool) -> Transcript {
        Transcript {
            id: 0,
            meeting_id: 1,
            speaker: speaker.to_string(),
            content: content.to_string(),
            start_time: None,
            end_time: None,
            confidence: None,
            is_agent,
            created_at: Utc::now(),
        }
    }

    fn standup() -> Vec<Transcript> {
        vec![
            segment("Ana", "Welcome everyone. The budget review is first on the agenda.", false),
            segment("Ben", "We agreed to move the launch to June. The budget looks tight.", false),
            segment("Ana", "I will send the budget spreadsheet by Friday. This is urgent.", false),
            segment("Scribe", "Noted, I will keep track of budget.", true),
        ]
    }

    #[actix_web::test]
    async fn test_summary_sections() {
        let draft = ExtractiveSummarizer.summarize(&standup()).await.unwrap();

        assert!(draft.content.starts_with("Welcome everyone."));
        assert!(draft.content.ends_with("Speakers: Ana, Ben"));
        assert_eq!(draft.decisions, vec!["We agreed to move the launch to June."]);
        assert!(draft.key_points.len() <= MAX_KEY_POINTS);
        assert_eq!(draft.topics.first().map(String::as_str), Some("budget"));
        assert!(!draft.topics.contains(&"will".to_string()));
    }

    #[actix_web::test]
    async fn test_summary_requires_transcripts() {
        assert!(ExtractiveSummarizer.summarize(&[]).await.is_err());
    }

    #[actix_web::test]
    async fn test_action_items_extracted_with_assignee() {
        let items = ExtractiveSummarizer.extract_action_items(&standup()).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "I will send the budget spreadsheet by Friday");
        assert_eq!(items[0].assignee.as_deref(), Some("Ana"));
        // urgency lives in the next sentence, so this one stays medium
        assert_eq!(items[0].priority, Priority::Medium);
    }

    #[actix_web::test]
    async fn test_action_item_prefix_and_priority() {
        let transcripts = vec![
            segment("Cam", "Action item: fix the login bug asap.", false),
            segment("Cam", "action item - fix the login bug asap", false),
            segment("Dee", "Nothing else from me.", false),
        ];
        let items = ExtractiveSummarizer.extract_action_items(&transcripts).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "fix the login bug asap");
        assert_eq!(items[0].priority, Priority::High);
    }

    #[test]
    fn test_key_points_longest_first() {
        let sentences = vec![
            "Short one.".to_string(),
            "This is the longest sentence here.".to_string(),
            "short one.".to_string(),
        ];
        let points = key_points(&sentences);
        assert_eq!(points, vec!["This is the longest sentence here.", "Short one."]);
    }
}
