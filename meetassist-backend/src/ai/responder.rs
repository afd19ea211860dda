use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;

use crate::models::Agent;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentReply {
    pub keyword: String,
    pub response: String,
}

#[async_trait]
pub trait AgentResponder: Send + Sync {
    /// None when the agent stays silent
    async fn respond(&self, agent: &Agent, speaker: &str, text: &str) -> Option<AgentReply>;
}

/// Answers when a trigger keyword is spoken, using the agent's templates
pub struct KeywordResponder;

fn contains_word(text: &str, keyword: &str) -> bool {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(keyword)))
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

fn render(template: &str, agent: &Agent, speaker: &str, keyword: &str) -> String {
    template
        .replace("{agent}", &agent.name)
        .replace("{speaker}", speaker)
        .replace("{keyword}", keyword)
}

#[async_trait]
impl AgentResponder for KeywordResponder {
    async fn respond(&self, agent: &Agent, speaker: &str, text: &str) -> Option<AgentReply> {
        if !agent.is_active {
            return None;
        }
        let (index, keyword) = agent
            .trigger_keywords
            .iter()
            .enumerate()
            .find(|(_, kw)| contains_word(text, kw))?;

        let template = if agent.response_templates.is_empty() {
            agent.agent_type.default_response()
        } else {
            agent.response_templates[index % agent.response_templates.len()].as_str()
        };

        Some(AgentReply {
            keyword: keyword.clone(),
            response: render(template, agent, speaker, keyword),
        })
    }
}
