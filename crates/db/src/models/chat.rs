use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display)]
#[sqlx(type_name = "chat_sender", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatSender {
    System,
    /// The guest of a booking
    User,
    Agent,
    Partner,
}

/// Channel a chat message arrived through.
#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display)]
#[sqlx(type_name = "chat_source", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatSource {
    App,
    Email,
    Sms,
    Other,
}

/// A message in either a booking thread (with the guest) or a task thread
/// (with the partner).
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, TS)]
pub struct ChatMessage {
    pub id: Uuid,
    pub booking_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub message: String,
    pub sender: ChatSender,
    pub source: ChatSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateChatMessage {
    #[serde(default)]
    pub booking_id: Option<Uuid>,
    #[serde(default)]
    pub task_id: Option<Uuid>,
    pub message: String,
    pub sender: ChatSender,
    pub source: ChatSource,
}

/// Editable fields of a stored message; `None` leaves a field untouched.
/// The thread a message belongs to never changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateChatMessage {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub sender: Option<ChatSender>,
    #[serde(default)]
    pub source: Option<ChatSource>,
}

impl CreateChatMessage {
    pub fn for_booking(booking_id: Uuid, message: impl Into<String>, sender: ChatSender) -> Self {
        Self {
            booking_id: Some(booking_id),
            task_id: None,
            message: message.into(),
            sender,
            source: ChatSource::App,
        }
    }

    pub fn for_task(task_id: Uuid, message: impl Into<String>, sender: ChatSender) -> Self {
        Self {
            booking_id: None,
            task_id: Some(task_id),
            message: message.into(),
            sender,
            source: ChatSource::App,
        }
    }
}

impl ChatMessage {
    fn apply(&mut self, update: UpdateChatMessage) {
        if let Some(message) = update.message {
            self.message = message;
        }
        if let Some(sender) = update.sender {
            self.sender = sender;
        }
        if let Some(source) = update.source {
            self.source = source;
        }
    }

    /// Every message across all threads, newest first.
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ChatMessage>(
            r#"SELECT * FROM chat
               ORDER BY created_at DESC, rowid DESC"#,
        )
        .fetch_all(pool)
        .await
    }

    /// Messages of one booking thread, oldest first.
    pub async fn find_by_booking_id(
        pool: &SqlitePool,
        booking_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ChatMessage>(
            r#"SELECT * FROM chat
               WHERE booking_id = ?
               ORDER BY created_at ASC, rowid ASC"#,
        )
        .bind(booking_id)
        .fetch_all(pool)
        .await
    }

    /// Messages of one task thread, oldest first.
    pub async fn find_by_task_id(pool: &SqlitePool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ChatMessage>(
            r#"SELECT * FROM chat
               WHERE task_id = ?
               ORDER BY created_at ASC, rowid ASC"#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ChatMessage>("SELECT * FROM chat WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateChatMessage,
        message_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, ChatMessage>(
            r#"INSERT INTO chat (id, booking_id, task_id, message, sender, source, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)
               RETURNING *"#,
        )
        .bind(message_id)
        .bind(data.booking_id)
        .bind(data.task_id)
        .bind(&data.message)
        .bind(data.sender)
        .bind(data.source)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        update: UpdateChatMessage,
    ) -> Result<Self, sqlx::Error> {
        let mut chat = Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        chat.apply(update);

        sqlx::query_as::<_, ChatMessage>(
            r#"UPDATE chat
               SET message = ?, sender = ?, source = ?, updated_at = ?
               WHERE id = ?
               RETURNING *"#,
        )
        .bind(&chat.message)
        .bind(chat.sender)
        .bind(chat.source)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(pool)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, ChatMessage>("DELETE FROM chat WHERE id = ? RETURNING *")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Empty the table, returning the removed rows.
    pub async fn delete_all<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, ChatMessage>("DELETE FROM chat RETURNING *")
            .fetch_all(executor)
            .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::{
        DBService,
        models::{
            booking::{Booking, CreateBooking},
            property::{CreateProperty, Property},
        },
    };

    #[tokio::test]
    async fn test_booking_thread_is_oldest_first() {
        let db = DBService::new_in_memory().await.unwrap();
        let property = Property::create(&db.pool, &CreateProperty::new("Strandgata 15"), Uuid::new_v4())
            .await
            .unwrap();
        let booking = Booking::create(
            &db.pool,
            &CreateBooking {
                guest_name: "Emma Hansen".to_string(),
                guest_email: "emma.hansen@gmail.com".to_string(),
                property_id: property.id,
                check_in_date_time: Utc.with_ymd_and_hms(2024, 10, 15, 16, 0, 0).unwrap(),
                check_out_date_time: Utc.with_ymd_and_hms(2024, 10, 20, 11, 0, 0).unwrap(),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        for (text, sender) in [
            ("Thanks for your booking!", ChatSender::Agent),
            ("What time is check-in?", ChatSender::User),
            ("Check-in is from 4:00 PM.", ChatSender::Agent),
        ] {
            ChatMessage::create(
                &db.pool,
                &CreateChatMessage::for_booking(booking.id, text, sender),
                Uuid::new_v4(),
            )
            .await
            .unwrap();
        }

        let thread = ChatMessage::find_by_booking_id(&db.pool, booking.id).await.unwrap();
        let senders: Vec<ChatSender> = thread.iter().map(|m| m.sender).collect();
        assert_eq!(senders, [ChatSender::Agent, ChatSender::User, ChatSender::Agent]);
        assert_eq!(thread[1].message, "What time is check-in?");
        assert_eq!(ChatMessage::find_all(&db.pool).await.unwrap()[0].id, thread[2].id);
        assert!(ChatMessage::find_by_task_id(&db.pool, booking.id).await.unwrap().is_empty());

        let edited = ChatMessage::update(
            &db.pool,
            thread[2].id,
            UpdateChatMessage {
                message: Some("Check-in is from 3:00 PM.".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(edited.message, "Check-in is from 3:00 PM.");
        assert_eq!(edited.sender, ChatSender::Agent);
        assert_eq!(edited.booking_id, Some(booking.id));

        let missing = ChatMessage::update(&db.pool, Uuid::new_v4(), UpdateChatMessage::default()).await;
        assert!(matches!(missing, Err(sqlx::Error::RowNotFound)));
    }
}
