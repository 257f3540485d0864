//! In-process row change notifications.
//!
//! Every write that goes through the services layer publishes a
//! [`ChangeEvent`] here. Consumers either pull events for one table through a
//! [`TableSubscription`] or register a callback with [`ChangeFeed::on`].

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, warn};
use ts_rs::TS;

use crate::models::{
    booking::Booking, chat::ChatMessage, faq::Faq, partner::Partner, property::Property,
    task::Task,
};

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Table {
    Properties,
    Partners,
    Bookings,
    Tasks,
    Chat,
    Faq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A row from any of the store's tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "table", content = "row", rename_all = "snake_case")]
pub enum Record {
    #[serde(rename = "properties")]
    Property(Property),
    #[serde(rename = "partners")]
    Partner(Partner),
    #[serde(rename = "bookings")]
    Booking(Booking),
    #[serde(rename = "tasks")]
    Task(Task),
    Chat(ChatMessage),
    Faq(Faq),
}

impl Record {
    pub fn table(&self) -> Table {
        match self {
            Record::Property(_) => Table::Properties,
            Record::Partner(_) => Table::Partners,
            Record::Booking(_) => Table::Bookings,
            Record::Task(_) => Table::Tasks,
            Record::Chat(_) => Table::Chat,
            Record::Faq(_) => Table::Faq,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub record: Record,
}

impl ChangeEvent {
    pub fn insert(record: impl Into<Record>) -> Self {
        Self {
            kind: ChangeKind::Insert,
            record: record.into(),
        }
    }

    pub fn update(record: impl Into<Record>) -> Self {
        Self {
            kind: ChangeKind::Update,
            record: record.into(),
        }
    }

    /// `record` is the row as it was before removal.
    pub fn delete(record: impl Into<Record>) -> Self {
        Self {
            kind: ChangeKind::Delete,
            record: record.into(),
        }
    }

    pub fn table(&self) -> Table {
        self.record.table()
    }
}

macro_rules! impl_into_record {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Record {
                fn from(row: $ty) -> Self {
                    Record::$variant(row)
                }
            }
        )*
    };
}

impl_into_record! {
    Property => Property,
    Partner => Partner,
    Booking => Booking,
    Task => Task,
    ChatMessage => Chat,
    Faq => Faq,
}

#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Returns how many subscribers saw the event.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        let table = event.table();
        let kind = event.kind;
        match self.tx.send(event) {
            Ok(receivers) => {
                debug!(%table, %kind, receivers, "published change");
                receivers
            }
            Err(_) => 0,
        }
    }

    pub fn subscribe(&self, table: Table) -> TableSubscription {
        TableSubscription {
            table,
            rx: self.tx.subscribe(),
        }
    }

    /// Unfiltered stream of every change, for forwarding to clients.
    pub fn subscribe_all(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Runs `callback` for every change to `table` until the returned handle
    /// is unsubscribed or dropped. Must be called inside a tokio runtime.
    pub fn on<F>(&self, table: Table, callback: F) -> SubscriptionHandle
    where
        F: Fn(ChangeEvent) + Send + 'static,
    {
        let mut subscription = self.subscribe(table);
        let task = tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                callback(event);
            }
        });
        SubscriptionHandle { task: Some(task) }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Changes to a single table, in publish order.
#[derive(Debug)]
pub struct TableSubscription {
    table: Table,
    rx: broadcast::Receiver<ChangeEvent>,
}

impl TableSubscription {
    pub fn table(&self) -> Table {
        self.table
    }

    /// Waits for the next change to this table. `None` once the feed is gone.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.table() == self.table => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(table = %self.table, missed, "change subscriber lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next already-published change to this table, without waiting.
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if event.table() == self.table => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    warn!(table = %self.table, missed, "change subscriber lagged, events dropped");
                }
                Err(_) => return None,
            }
        }
    }
}

/// Keeps a callback registered with [`ChangeFeed::on`] alive.
#[derive(Debug)]
pub struct SubscriptionHandle {
    task: Option<JoinHandle<()>>,
}

impl SubscriptionHandle {
    pub fn unsubscribe(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
