use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// What part an agent plays in a meeting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AgentType {
    NoteTaker,
    Facilitator,
    Analyst,
    #[default]
    Assistant,
}

impl AgentType {
    /// Fallback line used when an agent has triggers but no templates
    pub fn default_response(&self) -> &'static str {
        match self {
            Self::NoteTaker => "Noted, {speaker}. I've captured that point about {keyword}.",
            Self::Facilitator => "Thanks {speaker}. Let's make sure everyone has weighed in on {keyword}.",
            Self::Analyst => "{speaker}, I can pull the numbers on {keyword} after the meeting.",
            Self::Assistant => "I'm {agent}. I'll keep track of {keyword} for follow-up.",
        }
    }
}

/// Simulated AI meeting participant: triggers plus response templates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub agent_type: AgentType,
    pub instructions: Option<String>,
    pub trigger_keywords: Vec<String>,
    pub response_templates: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAgentRequest {
    pub name: String,
    pub description: Option<String>,
    pub agent_type: Option<AgentType>,
    pub instructions: Option<String>,
    #[serde(default)]
    pub trigger_keywords: Vec<String>,
    #[serde(default)]
    pub response_templates: Vec<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAgentRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub agent_type: Option<AgentType>,
    pub instructions: Option<String>,
    pub trigger_keywords: Option<Vec<String>>,
    pub response_templates: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

impl UpdateAgentRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.agent_type.is_none()
            && self.instructions.is_none()
            && self.trigger_keywords.is_none()
            && self.response_templates.is_none()
            && self.is_active.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentQuery {
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestAgentRequest {
    pub text: String,
    pub speaker: Option<String>,
}

/// Normalize keyword lists: trimmed, lowercased, deduplicated, order kept
pub fn normalize_keywords(keywords: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(keywords.len());
    for kw in keywords {
        let kw = kw.trim().to_lowercase();
        if !kw.is_empty() && !out.contains(&kw) {
            out.push(kw);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_type_parsing() {
        assert_eq!("note_taker".parse::<AgentType>().unwrap(), AgentType::NoteTaker);
        assert_eq!(AgentType::Facilitator.as_ref(), "facilitator");
        assert!("moderator".parse::<AgentType>().is_err());
        assert_eq!(AgentType::default(), AgentType::Assistant);
    }

    #[test]
    fn test_normalize_keywords() {
        let raw = vec![
            " Budget ".to_string(),
            "budget".to_string(),
            "".to_string(),
            "Deadline".to_string(),
        ];
        assert_eq!(normalize_keywords(&raw), vec!["budget", "deadline"]);
    }
}
