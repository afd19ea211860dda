//! Action item database operations

use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{OptionalExtension, Result as SqliteResult};

use crate::models::{
    ActionItem, ActionItemDraft, ActionItemQuery, ActionItemStatus, CreateActionItemRequest,
    UpdateActionItemRequest,
};
use super::super::sqlite::{enum_column, opt_date, opt_timestamp, timestamp, UpdateSet};
use super::super::Database;

const ACTION_ITEM_COLUMNS: &str = "id, meeting_id, user_id, title, description, assignee, due_date, \
     priority, status, completed_at, created_at, updated_at";

/// Due items first (soonest first), undated items last
const ACTION_ITEM_ORDER: &str = "ORDER BY due_date IS NULL, due_date, created_at, id";

fn row_to_action_item(row: &rusqlite::Row) -> SqliteResult<ActionItem> {
    Ok(ActionItem {
        id: row.get(0)?,
        meeting_id: row.get(1)?,
        user_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        assignee: row.get(5)?,
        due_date: opt_date(row, 6)?,
        priority: enum_column(row, 7)?,
        status: enum_column(row, 8)?,
        completed_at: opt_timestamp(row, 9)?,
        created_at: timestamp(row, 10)?,
        updated_at: timestamp(row, 11)?,
    })
}

impl Database {
    pub fn create_action_item(&self, user_id: i64, request: &CreateActionItemRequest) -> SqliteResult<ActionItem> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        let status = request.status.unwrap_or_default();
        let completed_at = (status == ActionItemStatus::Completed).then(|| now.clone());

        conn.execute(
            "INSERT INTO action_items (meeting_id, user_id, title, description, assignee, due_date,
                 priority, status, completed_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            rusqlite::params![
                request.meeting_id,
                user_id,
                request.title.trim(),
                request.description,
                request.assignee,
                request.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
                request.priority.unwrap_or_default().as_ref(),
                status.as_ref(),
                completed_at,
                &now,
            ],
        )?;
        let id = conn.last_insert_rowid();
        drop(conn);

        self.get_action_item(id, user_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    /// Store extracted action items for a meeting
    pub fn insert_action_item_drafts(
        &self,
        user_id: i64,
        meeting_id: i64,
        drafts: &[ActionItemDraft],
    ) -> SqliteResult<Vec<ActionItem>> {
        drafts
            .iter()
            .map(|draft| {
                self.create_action_item(
                    user_id,
                    &CreateActionItemRequest {
                        title: draft.title.clone(),
                        description: None,
                        meeting_id: Some(meeting_id),
                        assignee: draft.assignee.clone(),
                        due_date: None,
                        priority: Some(draft.priority),
                        status: None,
                    },
                )
            })
            .collect()
    }

    pub fn get_action_item(&self, id: i64, user_id: i64) -> SqliteResult<Option<ActionItem>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {} FROM action_items WHERE id = ?1 AND user_id = ?2", ACTION_ITEM_COLUMNS),
            [id, user_id],
            row_to_action_item,
        )
        .optional()
    }

    pub fn list_action_items(&self, user_id: i64, query: &ActionItemQuery) -> SqliteResult<Vec<ActionItem>> {
        let mut sql = format!("SELECT {} FROM action_items WHERE user_id = ?1", ACTION_ITEM_COLUMNS);
        let mut values: Vec<Value> = vec![Value::Integer(user_id)];

        if let Some(status) = query.status {
            values.push(Value::Text(status.as_ref().to_string()));
            sql.push_str(&format!(" AND status = ?{}", values.len()));
        }
        if let Some(priority) = query.priority {
            values.push(Value::Text(priority.as_ref().to_string()));
            sql.push_str(&format!(" AND priority = ?{}", values.len()));
        }
        if let Some(meeting_id) = query.meeting_id {
            values.push(Value::Integer(meeting_id));
            sql.push_str(&format!(" AND meeting_id = ?{}", values.len()));
        }
        if let Some(assignee) = &query.assignee {
            values.push(Value::Text(assignee.clone()));
            sql.push_str(&format!(" AND assignee = ?{} COLLATE NOCASE", values.len()));
        }
        sql.push(' ');
        sql.push_str(ACTION_ITEM_ORDER);

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map(rusqlite::params_from_iter(values), row_to_action_item)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(items)
    }

    /// Open items (pending or in progress), soonest due first
    pub fn list_open_action_items(&self, user_id: i64, limit: i64) -> SqliteResult<Vec<ActionItem>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM action_items WHERE user_id = ?1 AND status IN ('pending', 'in_progress') {} LIMIT ?2",
            ACTION_ITEM_COLUMNS, ACTION_ITEM_ORDER
        ))?;
        let items = stmt
            .query_map([user_id, limit], row_to_action_item)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(items)
    }

    pub fn update_action_item(
        &self,
        id: i64,
        user_id: i64,
        request: &UpdateActionItemRequest,
    ) -> SqliteResult<Option<ActionItem>> {
        let mut set = UpdateSet::new();
        set.set_opt("title", request.title.as_ref().map(|s| s.trim().to_string()));
        set.set_opt("description", request.description.clone());
        set.set_opt("assignee", request.assignee.clone());
        set.set_opt("due_date", request.due_date.map(|d| d.format("%Y-%m-%d").to_string()));
        set.set_opt("priority", request.priority.map(|p| p.as_ref().to_string()));
        if let Some(status) = request.status {
            set.set("status", status.as_ref().to_string());
            let completed_at = (status == ActionItemStatus::Completed).then(|| Utc::now().to_rfc3339());
            set.set("completed_at", completed_at);
        }

        if !set.is_empty() {
            let conn = self.conn();
            set.execute(&conn, "action_items", &[("id", id), ("user_id", user_id)])?;
        }
        self.get_action_item(id, user_id)
    }

    pub fn delete_action_item(&self, id: i64, user_id: i64) -> SqliteResult<bool> {
        let conn = self.conn();
        let rows = conn.execute(
            "DELETE FROM action_items WHERE id = ?1 AND user_id = ?2",
            [id, user_id],
        )?;
        Ok(rows > 0)
    }
}
