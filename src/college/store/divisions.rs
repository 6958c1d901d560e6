// SPDX-License-Identifier: MIT

use crate::college::entity::{AdminDivision, NewAdminDivision};
use crate::error::AppError;
use rusqlite::{params, Connection, OptionalExtension};

pub fn get(conn: &Connection, admin_code: &str) -> Result<Option<AdminDivision>, AppError> {
    let sql = format!(
        "SELECT {} FROM admin_divisions WHERE admin_code = ?1",
        AdminDivision::COLUMNS
    );
    Ok(conn
        .query_row(&sql, params![admin_code], AdminDivision::from_row)
        .optional()?)
}

pub fn list(conn: &Connection) -> Result<Vec<AdminDivision>, AppError> {
    let sql = format!(
        "SELECT {} FROM admin_divisions ORDER BY object_id",
        AdminDivision::COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], AdminDivision::from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn insert(conn: &Connection, division: &NewAdminDivision) -> Result<AdminDivision, AppError> {
    conn.execute(
        "INSERT INTO admin_divisions (object_id, admin_code, shape, name)
         VALUES ((SELECT COALESCE(MAX(object_id), 0) + 1 FROM admin_divisions), ?1, ?2, ?3)",
        params![division.admin_code, division.shape, division.name],
    )?;
    get(conn, &division.admin_code)?
        .ok_or_else(|| AppError::other("division vanished after insert"))
}
