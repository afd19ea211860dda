mod action_item;
mod agent;
mod analytics;
mod follow_up_email;
mod meeting;
mod summary;
mod transcript;
mod user;

pub use action_item::*;
pub use agent::*;
pub use analytics::*;
pub use follow_up_email::*;
pub use meeting::*;
pub use summary::*;
pub use transcript::*;
pub use user::*;

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Loose address shape check, delivery is the mailer's business
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Trimmed, non-empty text or None
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
