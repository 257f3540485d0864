//! Which dashboard columns are shown, kept in the page URL.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use utils::{
    navigation::Navigator,
    query_params::{self, EncodeOptions, ParameterSet, QueryParams},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, EnumString, Display)]
pub enum Column {
    #[serde(rename = "showGuests")]
    #[strum(serialize = "showGuests")]
    Guests,
    #[serde(rename = "showTasks")]
    #[strum(serialize = "showTasks")]
    Tasks,
    #[serde(rename = "showFAQ")]
    #[strum(serialize = "showFAQ")]
    Faq,
    #[serde(rename = "showPartners")]
    #[strum(serialize = "showPartners")]
    Partners,
    #[serde(rename = "showProperties")]
    #[strum(serialize = "showProperties")]
    Properties,
    #[serde(rename = "showTaskChat")]
    #[strum(serialize = "showTaskChat")]
    TaskChat,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::Guests,
        Column::Tasks,
        Column::Faq,
        Column::Partners,
        Column::Properties,
        Column::TaskChat,
    ];

    /// Query parameter name.
    pub fn key(self) -> &'static str {
        match self {
            Column::Guests => "showGuests",
            Column::Tasks => "showTasks",
            Column::Faq => "showFAQ",
            Column::Partners => "showPartners",
            Column::Properties => "showProperties",
            Column::TaskChat => "showTaskChat",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Column::Guests => "Guests",
            Column::Tasks => "Tasks",
            Column::Faq => "FAQ",
            Column::Partners => "Partners",
            Column::Properties => "Properties",
            Column::TaskChat => "Task Chat",
        }
    }

    fn shown_by_default(self) -> bool {
        !matches!(self, Column::Partners | Column::Properties)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSettings {
    pub show_guests: bool,
    pub show_tasks: bool,
    #[serde(rename = "showFAQ")]
    pub show_faq: bool,
    pub show_partners: bool,
    pub show_properties: bool,
    pub show_task_chat: bool,
}

impl Default for ColumnSettings {
    fn default() -> Self {
        Self::from_params(&Self::defaults())
    }
}

impl ColumnSettings {
    /// Fallback values used when a column is missing from the URL.
    pub fn defaults() -> ParameterSet {
        Column::ALL
            .iter()
            .map(|column| (column.key(), column.shown_by_default()))
            .collect()
    }

    pub fn from_params(params: &ParameterSet) -> Self {
        let mut settings = Self {
            show_guests: false,
            show_tasks: false,
            show_faq: false,
            show_partners: false,
            show_properties: false,
            show_task_chat: false,
        };
        for column in Column::ALL {
            let shown = params
                .bool(column.key())
                .unwrap_or_else(|| column.shown_by_default());
            settings.set(column, shown);
        }
        settings
    }

    pub fn to_params(&self) -> ParameterSet {
        Column::ALL
            .iter()
            .map(|&column| (column.key(), self.is_visible(column)))
            .collect()
    }

    /// Settings described by a URL query string.
    pub fn from_query(query: &str) -> Self {
        Self::from_params(&query_params::decode(query, &Self::defaults()))
    }

    /// Hidden columns are left out of the query string, so a column that is
    /// shown by default reads back as shown.
    pub fn to_query(&self) -> String {
        query_params::encode(&self.to_params(), EncodeOptions::default())
    }

    pub fn is_visible(&self, column: Column) -> bool {
        match column {
            Column::Guests => self.show_guests,
            Column::Tasks => self.show_tasks,
            Column::Faq => self.show_faq,
            Column::Partners => self.show_partners,
            Column::Properties => self.show_properties,
            Column::TaskChat => self.show_task_chat,
        }
    }

    pub fn set(&mut self, column: Column, shown: bool) {
        let slot = match column {
            Column::Guests => &mut self.show_guests,
            Column::Tasks => &mut self.show_tasks,
            Column::Faq => &mut self.show_faq,
            Column::Partners => &mut self.show_partners,
            Column::Properties => &mut self.show_properties,
            Column::TaskChat => &mut self.show_task_chat,
        };
        *slot = shown;
    }

    /// Flip one column, returning whether it is now shown.
    pub fn toggle(&mut self, column: Column) -> bool {
        let shown = !self.is_visible(column);
        self.set(column, shown);
        shown
    }

    pub fn visible_count(&self) -> usize {
        Column::ALL.iter().filter(|&&c| self.is_visible(c)).count()
    }

    /// Grid width for the visible columns: at least 1, at most 6.
    pub fn grid_columns(&self) -> usize {
        self.visible_count().clamp(1, 6)
    }
}

/// Column settings bound to a browser-like history.
pub struct Dashboard {
    params: QueryParams,
}

impl Dashboard {
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self {
            params: QueryParams::new(navigator, ColumnSettings::defaults()),
        }
    }

    /// Read the columns from the current URL and follow back/forward.
    pub fn mount(&mut self) {
        self.params.mount();
    }

    pub fn unmount(&mut self) {
        self.params.unmount();
    }

    pub fn columns(&self) -> ColumnSettings {
        ColumnSettings::from_params(self.params.params())
    }

    /// Flip a column and push the new settings onto the history.
    pub fn toggle_column(&mut self, column: Column) -> ColumnSettings {
        let mut columns = self.columns();
        columns.toggle(column);
        self.params.set_params(columns.to_params());
        columns
    }

    /// Pick up back/forward navigation. Returns true if the columns changed.
    pub fn sync_navigation(&mut self) -> bool {
        self.params.sync_navigation()
    }
}
