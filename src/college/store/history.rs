// SPDX-License-Identifier: MIT

use crate::college::entity::{EntityType, ModificationHistory, ModificationType};
use crate::error::AppError;
use chrono::Utc;
use rusqlite::{params, Connection};
use serde::Serialize;

/// Append an audit row with JSON snapshots of the entity
pub fn record<T: Serialize>(
    conn: &Connection,
    entity_type: EntityType,
    entity_id: i64,
    old: Option<&T>,
    new: Option<&T>,
    user_id: i64,
    modification_type: ModificationType,
) -> Result<(), AppError> {
    let old_data = old.map(serde_json::to_string).transpose()?;
    let new_data = new.map(serde_json::to_string).transpose()?;
    conn.execute(
        "INSERT INTO modification_history
             (entity_type, entity_id, old_data, new_data, user_id,
              modification_time, modification_type)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            entity_type,
            entity_id,
            old_data,
            new_data,
            user_id,
            Utc::now(),
            modification_type
        ],
    )?;
    Ok(())
}

/// Audit trail for one entity, newest first
pub fn for_entity(
    conn: &Connection,
    entity_type: EntityType,
    entity_id: i64,
) -> Result<Vec<ModificationHistory>, AppError> {
    let sql = format!(
        "SELECT {} FROM modification_history
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY history_id DESC",
        ModificationHistory::COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![entity_type, entity_id],
        ModificationHistory::from_row,
    )?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
