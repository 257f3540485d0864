use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

use super::task::TaskType;

/// An outside company that carries out tasks of one kind.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, TS)]
pub struct Partner {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub partner_type: TaskType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreatePartner {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(rename = "type")]
    pub partner_type: TaskType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdatePartner {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, rename = "type")]
    pub partner_type: Option<TaskType>,
}

impl Partner {
    fn apply(&mut self, update: UpdatePartner) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(phone) = update.phone {
            self.phone = phone;
        }
        if let Some(partner_type) = update.partner_type {
            self.partner_type = partner_type;
        }
    }

    /// Partners newest first, optionally only those doing one kind of work.
    pub async fn find_all(
        pool: &SqlitePool,
        partner_type: Option<TaskType>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        match partner_type {
            Some(partner_type) => {
                sqlx::query_as::<_, Partner>(
                    r#"SELECT * FROM partners
                       WHERE type = ?
                       ORDER BY created_at DESC, rowid DESC"#,
                )
                .bind(partner_type)
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Partner>(
                    r#"SELECT * FROM partners
                       ORDER BY created_at DESC, rowid DESC"#,
                )
                .fetch_all(pool)
                .await
            }
        }
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Partner>("SELECT * FROM partners WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreatePartner,
        partner_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, Partner>(
            r#"INSERT INTO partners (id, name, email, phone, type, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)
               RETURNING *"#,
        )
        .bind(partner_id)
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(data.partner_type)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        update: UpdatePartner,
    ) -> Result<Self, sqlx::Error> {
        let mut partner = Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        partner.apply(update);

        sqlx::query_as::<_, Partner>(
            r#"UPDATE partners
               SET name = ?, email = ?, phone = ?, type = ?, updated_at = ?
               WHERE id = ?
               RETURNING *"#,
        )
        .bind(&partner.name)
        .bind(&partner.email)
        .bind(&partner.phone)
        .bind(partner.partner_type)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(pool)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Partner>("DELETE FROM partners WHERE id = ? RETURNING *")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Empty the table, returning the removed rows.
    pub async fn delete_all<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Partner>("DELETE FROM partners RETURNING *")
            .fetch_all(executor)
            .await
    }
}
