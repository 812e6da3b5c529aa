use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The nested board shape exchanged with clients.
///
/// Column order is the list order. Card order inside a column is the order of
/// its `cardIds`. Cards themselves live in a flat map keyed by card id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardDocument {
    pub columns: Vec<ColumnDoc>,
    pub cards: BTreeMap<String, CardDoc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDoc {
    pub id: String,
    pub title: String,
    #[serde(rename = "cardIds")]
    pub card_ids: Vec<String>,
}

/// A card as seen by clients. `created_by` and `assigned_to` carry usernames,
/// not user ids, and are ignored when a document is written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDoc {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
}

impl BoardDocument {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.cards.is_empty()
    }

    pub fn column(&self, id: &str) -> Option<&ColumnDoc> {
        self.columns.iter().find(|c| c.id == id)
    }
}
