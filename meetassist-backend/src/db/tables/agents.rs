//! Agent configuration database operations

use chrono::Utc;
use rusqlite::{OptionalExtension, Result as SqliteResult};

use crate::models::{normalize_keywords, Agent, CreateAgentRequest, UpdateAgentRequest};
use super::super::sqlite::{enum_column, json_list, timestamp, to_json_list, UpdateSet};
use super::super::Database;

const AGENT_COLUMNS: &str = "id, user_id, name, description, agent_type, instructions, \
     trigger_keywords, response_templates, is_active, created_at, updated_at";

fn row_to_agent(row: &rusqlite::Row) -> SqliteResult<Agent> {
    let is_active: i64 = row.get(8)?;
    Ok(Agent {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        agent_type: enum_column(row, 4)?,
        instructions: row.get(5)?,
        trigger_keywords: json_list(row, 6)?,
        response_templates: json_list(row, 7)?,
        is_active: is_active != 0,
        created_at: timestamp(row, 9)?,
        updated_at: timestamp(row, 10)?,
    })
}

impl Database {
    pub fn create_agent(&self, user_id: i64, request: &CreateAgentRequest) -> SqliteResult<Agent> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        let agent_type = request.agent_type.unwrap_or_default();

        conn.execute(
            "INSERT INTO agents (user_id, name, description, agent_type, instructions,
                 trigger_keywords, response_templates, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            rusqlite::params![
                user_id,
                request.name.trim(),
                request.description,
                agent_type.as_ref(),
                request.instructions,
                to_json_list(&normalize_keywords(&request.trigger_keywords)),
                to_json_list(&request.response_templates),
                request.is_active.unwrap_or(true) as i64,
                &now,
            ],
        )?;
        let id = conn.last_insert_rowid();
        drop(conn);

        self.get_agent(id, user_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    /// Get an agent owned by the given user
    pub fn get_agent(&self, id: i64, user_id: i64) -> SqliteResult<Option<Agent>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {} FROM agents WHERE id = ?1 AND user_id = ?2", AGENT_COLUMNS),
            [id, user_id],
            row_to_agent,
        )
        .optional()
    }

    /// Get an agent regardless of owner (gateway lookups after ownership of the meeting is known)
    pub fn get_agent_by_id(&self, id: i64) -> SqliteResult<Option<Agent>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {} FROM agents WHERE id = ?1", AGENT_COLUMNS),
            [id],
            row_to_agent,
        )
        .optional()
    }

    pub fn list_agents(&self, user_id: i64, active: Option<bool>) -> SqliteResult<Vec<Agent>> {
        let conn = self.conn();
        let agents = match active {
            Some(active) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM agents WHERE user_id = ?1 AND is_active = ?2 ORDER BY name",
                    AGENT_COLUMNS
                ))?;
                stmt.query_map(rusqlite::params![user_id, active as i64], row_to_agent)?
                    .collect::<SqliteResult<Vec<_>>>()?
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM agents WHERE user_id = ?1 ORDER BY name",
                    AGENT_COLUMNS
                ))?;
                stmt.query_map([user_id], row_to_agent)?
                    .collect::<SqliteResult<Vec<_>>>()?
            }
        };
        Ok(agents)
    }

    pub fn update_agent(
        &self,
        id: i64,
        user_id: i64,
        request: &UpdateAgentRequest,
    ) -> SqliteResult<Option<Agent>> {
        let mut set = UpdateSet::new();
        set.set_opt("name", request.name.as_ref().map(|s| s.trim().to_string()));
        set.set_opt("description", request.description.clone());
        set.set_opt("agent_type", request.agent_type.map(|t| t.as_ref().to_string()));
        set.set_opt("instructions", request.instructions.clone());
        set.set_opt(
            "trigger_keywords",
            request
                .trigger_keywords
                .as_ref()
                .map(|k| to_json_list(&normalize_keywords(k))),
        );
        set.set_opt(
            "response_templates",
            request.response_templates.as_ref().map(|t| to_json_list(t)),
        );
        set.set_opt("is_active", request.is_active);

        if !set.is_empty() {
            let conn = self.conn();
            set.execute(&conn, "agents", &[("id", id), ("user_id", user_id)])?;
        }
        self.get_agent(id, user_id)
    }

    pub fn delete_agent(&self, id: i64, user_id: i64) -> SqliteResult<bool> {
        let conn = self.conn();
        let rows = conn.execute(
            "DELETE FROM agents WHERE id = ?1 AND user_id = ?2",
            [id, user_id],
        )?;
        Ok(rows > 0)
    }

    pub fn count_active_agents(&self, user_id: i64) -> SqliteResult<i64> {
        let conn = self.conn();
        conn.query_row(
            "SELECT COUNT(*) FROM agents WHERE user_id = ?1 AND is_active = 1",
            [user_id],
            |row| row.get(0),
        )
    }
}
