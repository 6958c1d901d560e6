// SPDX-License-Identifier: MIT

use crate::college::entity::{climate_columns, ClimateRecord};
use crate::error::AppError;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

fn select_sql(filter: &str) -> String {
    format!(
        "SELECT admin_code, {} FROM climate_data {} ORDER BY admin_code",
        climate_columns().join(", "),
        filter
    )
}

pub fn get(conn: &Connection, admin_code: &str) -> Result<Option<ClimateRecord>, AppError> {
    Ok(conn
        .query_row(
            &select_sql("WHERE admin_code = ?1"),
            params![admin_code],
            ClimateRecord::from_row,
        )
        .optional()?)
}

pub fn list(conn: &Connection) -> Result<Vec<ClimateRecord>, AppError> {
    let mut stmt = conn.prepare(&select_sql(""))?;
    let rows = stmt.query_map([], ClimateRecord::from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Insert a validated record; absent months are stored as NULL
pub fn insert(conn: &Connection, record: &ClimateRecord) -> Result<(), AppError> {
    let columns = climate_columns();
    let placeholders = (1..=columns.len() + 1)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO climate_data (admin_code, {}) VALUES ({})",
        columns.join(", "),
        placeholders
    );

    let values = std::iter::once(Value::Text(record.admin_code.clone())).chain(
        columns
            .iter()
            .map(|c| record.value(c).map(Value::Real).unwrap_or(Value::Null)),
    );
    conn.execute(&sql, params_from_iter(values))?;
    Ok(())
}
