//! Guest and partner conversations.
//!
//! Every booking has a thread with its guest and every task a thread with
//! its partner. [`Inbox`] holds the list of threads and at most one selected
//! booking thread and one selected task thread, and folds store changes into
//! them as they are published.

use std::sync::Arc;

use db::{
    DBService,
    change_feed::{ChangeEvent, ChangeKind, Record},
    models::{
        booking::Booking,
        chat::{ChatMessage, ChatSender, CreateChatMessage},
        task::{Task, TaskStatus},
    },
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use strum_macros::{Display, EnumString};
use thiserror::Error;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use super::webhook::MessageSentSink;

#[derive(Debug, Error)]
pub enum InboxError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("task {0} not found")]
    TaskNotFound(Uuid),
    #[error("a chat message needs a booking or a task")]
    MissingThread,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatKind {
    Booking,
    Task,
}

/// One conversation in the inbox list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct InboxChat {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: ChatKind,
    pub title: String,
}

impl From<&Booking> for InboxChat {
    fn from(booking: &Booking) -> Self {
        Self {
            id: booking.id,
            kind: ChatKind::Booking,
            title: booking.guest_name.clone(),
        }
    }
}

impl From<&Task> for InboxChat {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            kind: ChatKind::Task,
            title: task.task_description.clone(),
        }
    }
}

/// Bookings then tasks, each newest first.
pub fn build_chats(bookings: &[Booking], tasks: &[Task]) -> Vec<InboxChat> {
    bookings
        .iter()
        .map(InboxChat::from)
        .chain(tasks.iter().map(InboxChat::from))
        .collect()
}

pub async fn list_chats(pool: &SqlitePool) -> Result<Vec<InboxChat>, InboxError> {
    let bookings = Booking::find_all(pool).await?;
    let tasks = Task::find_all(pool).await?;
    Ok(build_chats(&bookings, &tasks))
}

/// Messages of a booking thread, else of a task thread, oldest first. Empty
/// when neither is given.
pub async fn fetch_thread(
    pool: &SqlitePool,
    booking_id: Option<Uuid>,
    task_id: Option<Uuid>,
) -> Result<Vec<ChatMessage>, InboxError> {
    let messages = match (booking_id, task_id) {
        (Some(booking_id), _) => ChatMessage::find_by_booking_id(pool, booking_id).await?,
        (None, Some(task_id)) => ChatMessage::find_by_task_id(pool, task_id).await?,
        (None, None) => Vec::new(),
    };
    Ok(messages)
}

/// Store a message, announce it on the change feed, then hand it to `sink`.
/// The sink only hears about messages that were stored.
pub async fn add_chat_message(
    db: &DBService,
    sink: &dyn MessageSentSink,
    data: &CreateChatMessage,
) -> Result<ChatMessage, InboxError> {
    if data.booking_id.is_none() && data.task_id.is_none() {
        return Err(InboxError::MissingThread);
    }
    let message = ChatMessage::create(&db.pool, data, Uuid::new_v4()).await?;
    debug!(
        message_id = %message.id,
        booking_id = ?message.booking_id,
        task_id = ?message.task_id,
        sender = %message.sender,
        "chat message stored"
    );
    db.changes.publish(ChangeEvent::insert(message.clone()));
    sink.message_sent(&message).await;
    Ok(message)
}

pub async fn update_task_status(
    db: &DBService,
    task_id: Uuid,
    status: TaskStatus,
) -> Result<Task, InboxError> {
    let task = Task::update_status(&db.pool, task_id, status)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => InboxError::TaskNotFound(task_id),
            e => InboxError::Database(e),
        })?;
    info!(task_id = %task_id, status = %status, "task status changed");
    db.changes.publish(ChangeEvent::update(task.clone()));
    Ok(task)
}

pub struct Inbox {
    db: DBService,
    sink: Arc<dyn MessageSentSink>,
    changes: broadcast::Receiver<ChangeEvent>,
    bookings: Vec<Booking>,
    tasks: Vec<Task>,
    chats: Vec<InboxChat>,
    selected_booking_id: Option<Uuid>,
    selected_task_id: Option<Uuid>,
    booking_thread: Option<Vec<ChatMessage>>,
    task_thread: Option<Vec<ChatMessage>>,
}

impl Inbox {
    pub async fn load(db: DBService, sink: Arc<dyn MessageSentSink>) -> Result<Self, InboxError> {
        let changes = db.changes.subscribe_all();
        let mut inbox = Self {
            db,
            sink,
            changes,
            bookings: Vec::new(),
            tasks: Vec::new(),
            chats: Vec::new(),
            selected_booking_id: None,
            selected_task_id: None,
            booking_thread: None,
            task_thread: None,
        };
        inbox.refresh_chats().await?;
        Ok(inbox)
    }

    pub fn chats(&self) -> &[InboxChat] {
        &self.chats
    }

    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn selected_booking_id(&self) -> Option<Uuid> {
        self.selected_booking_id
    }

    pub fn selected_task_id(&self) -> Option<Uuid> {
        self.selected_task_id
    }

    pub fn selected_task(&self) -> Option<&Task> {
        let id = self.selected_task_id?;
        self.tasks.iter().find(|t| t.id == id)
    }

    /// `None` while no booking is selected.
    pub fn booking_thread(&self) -> Option<&[ChatMessage]> {
        self.booking_thread.as_deref()
    }

    /// `None` while no task is selected.
    pub fn task_thread(&self) -> Option<&[ChatMessage]> {
        self.task_thread.as_deref()
    }

    pub async fn refresh_chats(&mut self) -> Result<(), InboxError> {
        self.bookings = Booking::find_all(&self.db.pool).await?;
        self.tasks = Task::find_all(&self.db.pool).await?;
        self.chats = build_chats(&self.bookings, &self.tasks);
        Ok(())
    }

    pub async fn select_booking(&mut self, booking_id: Option<Uuid>) -> Result<(), InboxError> {
        self.selected_booking_id = booking_id;
        self.booking_thread = match booking_id {
            Some(id) => Some(ChatMessage::find_by_booking_id(&self.db.pool, id).await?),
            None => None,
        };
        Ok(())
    }

    pub async fn select_task(&mut self, task_id: Option<Uuid>) -> Result<(), InboxError> {
        self.selected_task_id = task_id;
        self.task_thread = match task_id {
            Some(id) => Some(ChatMessage::find_by_task_id(&self.db.pool, id).await?),
            None => None,
        };
        Ok(())
    }

    /// Select both threads at once, e.g. when opening a conversation from
    /// the list.
    pub async fn select_chat(
        &mut self,
        booking_id: Option<Uuid>,
        task_id: Option<Uuid>,
    ) -> Result<(), InboxError> {
        self.select_booking(booking_id).await?;
        self.select_task(task_id).await
    }

    /// Fold one store change into the inbox. New chat messages land in the
    /// selected thread they belong to; any booking or task change rebuilds
    /// the conversation list.
    pub async fn apply_change(&mut self, event: &ChangeEvent) -> Result<(), InboxError> {
        match (&event.record, event.kind) {
            (Record::Chat(message), ChangeKind::Insert) => {
                if message.booking_id.is_some() && message.booking_id == self.selected_booking_id {
                    self.booking_thread
                        .get_or_insert_with(Vec::new)
                        .push(message.clone());
                }
                if message.task_id.is_some() && message.task_id == self.selected_task_id {
                    self.task_thread
                        .get_or_insert_with(Vec::new)
                        .push(message.clone());
                }
            }
            (Record::Booking(_), _) | (Record::Task(_), _) => self.refresh_chats().await?,
            _ => {}
        }
        Ok(())
    }

    /// Apply every change published since the last call. If this inbox fell
    /// too far behind, reload everything from the store instead.
    pub async fn sync(&mut self) -> Result<usize, InboxError> {
        let mut applied = 0;
        loop {
            match self.changes.try_recv() {
                Ok(event) => {
                    self.apply_change(&event).await?;
                    applied += 1;
                }
                Err(TryRecvError::Lagged(missed)) => {
                    warn!(missed, "inbox fell behind the change feed, reloading");
                    self.reload().await?;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        Ok(applied)
    }

    async fn reload(&mut self) -> Result<(), InboxError> {
        self.refresh_chats().await?;
        self.select_chat(self.selected_booking_id, self.selected_task_id)
            .await
    }

    /// Message from the guest of the selected booking. Blank text or no
    /// selected booking sends nothing.
    pub async fn send_guest_message(&self, text: &str) -> Result<Option<ChatMessage>, InboxError> {
        let Some(booking_id) = self.selected_booking_id else {
            return Ok(None);
        };
        if text.trim().is_empty() {
            return Ok(None);
        }
        let data = CreateChatMessage::for_booking(booking_id, text, ChatSender::User);
        add_chat_message(&self.db, self.sink.as_ref(), &data)
            .await
            .map(Some)
    }

    /// Message from the partner of the selected task. Blank text or no
    /// selected task sends nothing.
    pub async fn send_partner_message(
        &self,
        text: &str,
    ) -> Result<Option<ChatMessage>, InboxError> {
        let Some(task_id) = self.selected_task_id else {
            return Ok(None);
        };
        if text.trim().is_empty() {
            return Ok(None);
        }
        let data = CreateChatMessage::for_task(task_id, text, ChatSender::Partner);
        add_chat_message(&self.db, self.sink.as_ref(), &data)
            .await
            .map(Some)
    }

    pub async fn update_task_status(
        &self,
        task_id: Uuid,
        status: TaskStatus,
    ) -> Result<Task, InboxError> {
        update_task_status(&self.db, task_id, status).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use db::models::{
        booking::CreateBooking,
        property::{CreateProperty, Property},
        task::{CreateTask, TaskType},
    };

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<ChatMessage>>,
    }

    #[async_trait]
    impl MessageSentSink for RecordingSink {
        async fn message_sent(&self, message: &ChatMessage) {
            self.sent.lock().unwrap().push(message.clone());
        }
    }

    struct Fixture {
        db: DBService,
        sink: Arc<RecordingSink>,
        booking: Booking,
        task: Task,
    }

    async fn fixture() -> Fixture {
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
        let mut task = CreateTask::new("Deep cleaning after guest checkout", property.id, TaskType::Cleaning);
        task.booking_id = Some(booking.id);
        let task = Task::create(&db.pool, &task, Uuid::new_v4()).await.unwrap();
        Fixture {
            db,
            sink: Arc::new(RecordingSink::default()),
            booking,
            task,
        }
    }

    #[tokio::test]
    async fn test_chat_list_bookings_then_tasks() {
        let f = fixture().await;
        let inbox = Inbox::load(f.db.clone(), f.sink.clone()).await.unwrap();

        assert_eq!(
            inbox.chats(),
            [
                InboxChat {
                    id: f.booking.id,
                    kind: ChatKind::Booking,
                    title: "Emma Hansen".to_string(),
                },
                InboxChat {
                    id: f.task.id,
                    kind: ChatKind::Task,
                    title: "Deep cleaning after guest checkout".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_guest_message_reaches_thread_and_sink() {
        let f = fixture().await;
        let mut inbox = Inbox::load(f.db.clone(), f.sink.clone()).await.unwrap();
        inbox.select_booking(Some(f.booking.id)).await.unwrap();
        assert_eq!(inbox.booking_thread().map(<[_]>::len), Some(0));

        let sent = inbox
            .send_guest_message("What time is check-in?")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sent.sender, ChatSender::User);
        assert_eq!(sent.booking_id, Some(f.booking.id));

        assert_eq!(inbox.sync().await.unwrap(), 1);
        let thread = inbox.booking_thread().unwrap();
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].message, "What time is check-in?");
        assert!(inbox.task_thread().is_none());
        assert_eq!(f.sink.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_or_unselected_sends_nothing() {
        let f = fixture().await;
        let mut inbox = Inbox::load(f.db.clone(), f.sink.clone()).await.unwrap();

        assert!(inbox.send_guest_message("hello").await.unwrap().is_none());
        assert!(inbox.send_partner_message("hello").await.unwrap().is_none());

        inbox.select_task(Some(f.task.id)).await.unwrap();
        assert!(inbox.send_partner_message("   \n").await.unwrap().is_none());
        assert!(f.sink.sent.lock().unwrap().is_empty());
        assert!(
            ChatMessage::find_by_task_id(&f.db.pool, f.task.id)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_messages_for_other_threads_ignored() {
        let f = fixture().await;
        let mut inbox = Inbox::load(f.db.clone(), f.sink.clone()).await.unwrap();
        inbox.select_task(Some(f.task.id)).await.unwrap();

        let other = CreateChatMessage::for_booking(f.booking.id, "Welcome!", ChatSender::Agent);
        add_chat_message(&f.db, f.sink.as_ref(), &other).await.unwrap();
        let partner = CreateChatMessage::for_task(f.task.id, "Assigned.", ChatSender::Partner);
        add_chat_message(&f.db, f.sink.as_ref(), &partner).await.unwrap();

        inbox.sync().await.unwrap();
        let thread = inbox.task_thread().unwrap();
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].message, "Assigned.");
        assert!(inbox.booking_thread().is_none());
    }

    #[tokio::test]
    async fn test_status_change_refreshes_tasks() {
        let f = fixture().await;
        let mut inbox = Inbox::load(f.db.clone(), f.sink.clone()).await.unwrap();
        inbox.select_task(Some(f.task.id)).await.unwrap();

        inbox
            .update_task_status(f.task.id, TaskStatus::Completed)
            .await
            .unwrap();
        inbox.sync().await.unwrap();
        assert_eq!(inbox.selected_task().unwrap().status, TaskStatus::Completed);

        let missing = Uuid::new_v4();
        assert!(matches!(
            inbox.update_task_status(missing, TaskStatus::Cancelled).await,
            Err(InboxError::TaskNotFound(id)) if id == missing
        ));
    }

    #[tokio::test]
    async fn test_message_without_thread_rejected() {
        let f = fixture().await;
        let data = CreateChatMessage {
            booking_id: None,
            task_id: None,
            message: "lost".to_string(),
            sender: ChatSender::System,
            source: db::models::chat::ChatSource::Other,
        };
        assert!(matches!(
            add_chat_message(&f.db, f.sink.as_ref(), &data).await,
            Err(InboxError::MissingThread)
        ));
        assert!(f.sink.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_thread_prefers_booking() {
        let f = fixture().await;
        let guest = CreateChatMessage::for_booking(f.booking.id, "Hi", ChatSender::User);
        add_chat_message(&f.db, f.sink.as_ref(), &guest).await.unwrap();

        let thread = fetch_thread(&f.db.pool, Some(f.booking.id), Some(f.task.id))
            .await
            .unwrap();
        assert_eq!(thread.len(), 1);
        assert!(fetch_thread(&f.db.pool, None, None).await.unwrap().is_empty());
    }
}
