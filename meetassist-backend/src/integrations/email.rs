use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::FollowUpEmail;

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReceipt {
    pub message_id: String,
    pub accepted: Vec<String>,
    pub sent_at: DateTime<Utc>,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &FollowUpEmail) -> Result<DeliveryReceipt, String>;
}

/// Logs instead of sending. Addresses under `.invalid` bounce.
pub struct MockMailer;

#[async_trait]
impl EmailSender for MockMailer {
    async fn send(&self, email: &FollowUpEmail) -> Result<DeliveryReceipt, String> {
        if email.recipients.is_empty() {
            return Err("Email has no recipients".to_string());
        }
        let rejected: Vec<&str> = email
            .recipients
            .iter()
            .map(String::as_str)
            .filter(|r| r.trim().to_lowercase().ends_with(".invalid"))
            .collect();
        if !rejected.is_empty() {
            log::warn!("Mock delivery of email {} rejected for {:?}", email.id, rejected);
            return Err(format!("Delivery failed for {}", rejected.join(", ")));
        }

        let message_id = uuid::Uuid::new_v4().to_string();
        log::info!(
            "Mock delivery of email {} \"{}\" to {} recipients ({})",
            email.id,
            email.subject,
            email.recipients.len(),
            message_id
        );
        Ok(DeliveryReceipt {
            message_id,
            accepted: email.recipients.clone(),
            sent_at: Utc::now(),
        })
    }
}
