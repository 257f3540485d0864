use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// A question guests ask, with the answer to give. FAQs without a property
/// apply to every property.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, TS)]
pub struct Faq {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub property_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateFaq {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub property_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateFaq {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub property_id: Option<Option<Uuid>>,
}

impl Faq {
    fn apply(&mut self, update: UpdateFaq) {
        if let Some(question) = update.question {
            self.question = question;
        }
        if let Some(answer) = update.answer {
            self.answer = answer;
        }
        if let Some(property_id) = update.property_id {
            self.property_id = property_id;
        }
    }

    /// FAQs newest first, optionally only those attached to one property.
    pub async fn find_all(
        pool: &SqlitePool,
        property_id: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        match property_id {
            Some(property_id) => {
                sqlx::query_as::<_, Faq>(
                    r#"SELECT * FROM faq
                       WHERE property_id = ?
                       ORDER BY created_at DESC, rowid DESC"#,
                )
                .bind(property_id)
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Faq>(
                    r#"SELECT * FROM faq
                       ORDER BY created_at DESC, rowid DESC"#,
                )
                .fetch_all(pool)
                .await
            }
        }
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Faq>("SELECT * FROM faq WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(pool: &SqlitePool, data: &CreateFaq, faq_id: Uuid) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, Faq>(
            r#"INSERT INTO faq (id, question, answer, property_id, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)
               RETURNING *"#,
        )
        .bind(faq_id)
        .bind(&data.question)
        .bind(&data.answer)
        .bind(data.property_id)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
    }

    pub async fn update(pool: &SqlitePool, id: Uuid, update: UpdateFaq) -> Result<Self, sqlx::Error> {
        let mut faq = Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        faq.apply(update);

        sqlx::query_as::<_, Faq>(
            r#"UPDATE faq
               SET question = ?, answer = ?, property_id = ?, updated_at = ?
               WHERE id = ?
               RETURNING *"#,
        )
        .bind(&faq.question)
        .bind(&faq.answer)
        .bind(faq.property_id)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(pool)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Faq>("DELETE FROM faq WHERE id = ? RETURNING *")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Empty the table, returning the removed rows.
    pub async fn delete_all<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Faq>("DELETE FROM faq RETURNING *")
            .fetch_all(executor)
            .await
    }
}
