//! Database model modules - extends Database with domain-specific methods
//!
//! Each module adds `impl Database` blocks with methods for a specific table group.

mod action_items;     // action_items
mod agents;           // agents
mod analytics;        // meeting_analytics + overview aggregates
mod follow_up_emails; // follow_up_emails
mod meetings;         // meetings
mod participants;     // meeting_participants
mod summaries;        // summaries
mod transcripts;      // transcripts
mod users;            // users
