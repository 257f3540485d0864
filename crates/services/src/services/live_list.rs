//! Lists that stay current by folding in change events.

use db::{
    change_feed::{ChangeEvent, ChangeKind, Record, Table},
    models::{faq::Faq, partner::Partner, property::Property},
};
use uuid::Uuid;

/// A row type that can be kept in a [`LiveList`].
pub trait LiveRow: Clone {
    const TABLE: Table;

    fn id(&self) -> Uuid;

    fn from_record(record: &Record) -> Option<&Self>;
}

impl LiveRow for Faq {
    const TABLE: Table = Table::Faq;

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_record(record: &Record) -> Option<&Self> {
        match record {
            Record::Faq(faq) => Some(faq),
            _ => None,
        }
    }
}

impl LiveRow for Partner {
    const TABLE: Table = Table::Partners;

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_record(record: &Record) -> Option<&Self> {
        match record {
            Record::Partner(partner) => Some(partner),
            _ => None,
        }
    }
}

impl LiveRow for Property {
    const TABLE: Table = Table::Properties;

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_record(record: &Record) -> Option<&Self> {
        match record {
            Record::Property(property) => Some(property),
            _ => None,
        }
    }
}

/// Rows newest first, plus the filter that decides which change events
/// belong here.
pub struct LiveList<T> {
    rows: Vec<T>,
    filter: Box<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T: LiveRow> LiveList<T> {
    pub fn new(rows: Vec<T>, filter: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        Self {
            rows,
            filter: Box::new(filter),
        }
    }

    pub fn unfiltered(rows: Vec<T>) -> Self {
        Self::new(rows, |_| true)
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<T> {
        self.rows
    }

    pub fn replace(&mut self, rows: Vec<T>) {
        self.rows = rows;
    }

    /// Fold one change into the list. Inserts go to the front, updates
    /// replace the row with the same id, deletes drop it. Events for other
    /// tables or rows outside the filter are ignored. Returns whether the
    /// event was applied.
    pub fn apply(&mut self, event: &ChangeEvent) -> bool {
        let Some(row) = T::from_record(&event.record) else {
            return false;
        };
        if !(self.filter)(row) {
            return false;
        }

        match event.kind {
            ChangeKind::Insert => self.rows.insert(0, row.clone()),
            ChangeKind::Update => {
                for existing in self.rows.iter_mut().filter(|r| r.id() == row.id()) {
                    *existing = row.clone();
                }
            }
            ChangeKind::Delete => self.rows.retain(|r| r.id() != row.id()),
        }
        true
    }
}
