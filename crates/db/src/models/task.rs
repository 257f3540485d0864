use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Confirmed,
    InProgress,
    Cancelled,
    Completed,
}

/// Kind of work a task involves. Partners are tagged with the kind of work
/// they take on, using the same values.
#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display)]
#[sqlx(type_name = "task_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskType {
    Cleaning,
    Maintenance,
    Inspection,
    Other,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, TS)]
pub struct Task {
    pub id: Uuid,
    pub task_description: String,
    pub property_id: Uuid,
    pub booking_id: Option<Uuid>, // Booking that triggered the task, if any
    pub partner_id: Option<Uuid>, // Partner assigned to carry it out
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub can_start_after: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateTask {
    pub task_description: String,
    pub property_id: Uuid,
    #[serde(default)]
    pub booking_id: Option<Uuid>,
    #[serde(default)]
    pub partner_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub can_start_after: Option<DateTime<Utc>>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

impl CreateTask {
    pub fn new(task_description: impl Into<String>, property_id: Uuid, task_type: TaskType) -> Self {
        Self {
            task_description: task_description.into(),
            property_id,
            booking_id: None,
            partner_id: None,
            task_type,
            status: None,
            due_date: None,
            can_start_after: None,
            start_date: None,
            end_date: None,
        }
    }
}

/// Partial update. Outer `None` leaves a column untouched; for nullable
/// columns `Some(None)` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateTask {
    #[serde(default)]
    pub task_description: Option<String>,
    #[serde(default)]
    pub property_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub booking_id: Option<Option<Uuid>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub partner_id: Option<Option<Uuid>>,
    #[serde(default, rename = "type")]
    pub task_type: Option<TaskType>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub can_start_after: Option<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub start_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub end_date: Option<Option<DateTime<Utc>>>,
}

impl Task {
    fn apply(&mut self, update: UpdateTask) {
        if let Some(task_description) = update.task_description {
            self.task_description = task_description;
        }
        if let Some(property_id) = update.property_id {
            self.property_id = property_id;
        }
        if let Some(booking_id) = update.booking_id {
            self.booking_id = booking_id;
        }
        if let Some(partner_id) = update.partner_id {
            self.partner_id = partner_id;
        }
        if let Some(task_type) = update.task_type {
            self.task_type = task_type;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(due_date) = update.due_date {
            self.due_date = due_date;
        }
        if let Some(can_start_after) = update.can_start_after {
            self.can_start_after = can_start_after;
        }
        if let Some(start_date) = update.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = update.end_date {
            self.end_date = end_date;
        }
    }

    /// All tasks, newest first.
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"SELECT * FROM tasks
               ORDER BY created_at DESC, rowid DESC"#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_booking_id(
        pool: &SqlitePool,
        booking_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"SELECT * FROM tasks
               WHERE booking_id = ?
               ORDER BY created_at DESC, rowid DESC"#,
        )
        .bind(booking_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateTask,
        task_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, Task>(
            r#"INSERT INTO tasks (id, task_description, property_id, booking_id, partner_id, type, status, due_date, can_start_after, start_date, end_date, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               RETURNING *"#,
        )
        .bind(task_id)
        .bind(&data.task_description)
        .bind(data.property_id)
        .bind(data.booking_id)
        .bind(data.partner_id)
        .bind(data.task_type)
        .bind(data.status.unwrap_or_default())
        .bind(data.due_date)
        .bind(data.can_start_after)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
    }

    /// Apply a partial update. Fails with `RowNotFound` for an unknown id.
    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        update: UpdateTask,
    ) -> Result<Self, sqlx::Error> {
        let mut task = Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        task.apply(update);

        sqlx::query_as::<_, Task>(
            r#"UPDATE tasks
               SET task_description = ?, property_id = ?, booking_id = ?, partner_id = ?, type = ?, status = ?,
                   due_date = ?, can_start_after = ?, start_date = ?, end_date = ?, updated_at = ?
               WHERE id = ?
               RETURNING *"#,
        )
        .bind(&task.task_description)
        .bind(task.property_id)
        .bind(task.booking_id)
        .bind(task.partner_id)
        .bind(task.task_type)
        .bind(task.status)
        .bind(task.due_date)
        .bind(task.can_start_after)
        .bind(task.start_date)
        .bind(task.end_date)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(pool)
        .await
    }

    pub async fn update_status(
        pool: &SqlitePool,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"UPDATE tasks SET status = ?, updated_at = ?
               WHERE id = ?
               RETURNING *"#,
        )
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
    }

    /// Delete a task, returning the removed row.
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Task>("DELETE FROM tasks WHERE id = ? RETURNING *")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Empty the table, returning the removed rows.
    pub async fn delete_all<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Task>("DELETE FROM tasks RETURNING *")
            .fetch_all(executor)
            .await
    }
}
