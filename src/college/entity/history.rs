// SPDX-License-Identifier: MIT

use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

text_enum! {
    "entity type",
    pub enum EntityType {
        College => "college",
        Evaluation => "evaluation",
    }
}

text_enum! {
    "modification type",
    pub enum ModificationType {
        Update => "update",
        Delete => "delete",
    }
}

/// Audit row: JSON snapshots of an entity before and after a change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModificationHistory {
    pub history_id: i64,
    pub entity_type: EntityType,
    pub entity_id: i64,
    pub old_data: Option<String>,
    /// Empty for deletions
    pub new_data: Option<String>,
    pub user_id: i64,
    pub modification_time: DateTime<Utc>,
    pub modification_type: ModificationType,
}

impl ModificationHistory {
    pub(crate) const COLUMNS: &'static str = "history_id, entity_type, entity_id, old_data, \
        new_data, user_id, modification_time, modification_type";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            history_id: row.get(0)?,
            entity_type: row.get(1)?,
            entity_id: row.get(2)?,
            old_data: row.get(3)?,
            new_data: row.get(4)?,
            user_id: row.get(5)?,
            modification_time: row.get(6)?,
            modification_type: row.get(7)?,
        })
    }
}
