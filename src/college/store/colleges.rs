// SPDX-License-Identifier: MIT

use crate::college::entity::{College, CollegeInfo, CollegeQuery};
use crate::error::AppError;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

fn select_sql(filter: &str) -> String {
    format!(
        "SELECT object_id, {} FROM colleges {} ORDER BY college_id",
        CollegeInfo::COLUMNS,
        filter
    )
}

pub fn get(conn: &Connection, college_id: i64) -> Result<Option<College>, AppError> {
    Ok(conn
        .query_row(
            &select_sql("WHERE college_id = ?1"),
            params![college_id],
            College::from_row,
        )
        .optional()?)
}

pub fn list(conn: &Connection) -> Result<Vec<College>, AppError> {
    let mut stmt = conn.prepare(&select_sql(""))?;
    let rows = stmt.query_map([], College::from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn search(conn: &Connection, query: &CollegeQuery) -> Result<Vec<College>, AppError> {
    let mut clauses: Vec<&str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    let text_filters = [
        ("instr(name, ?) > 0", &query.name),
        ("province = ?", &query.province),
        ("city = ?", &query.city),
        ("category = ?", &query.category),
        ("nature = ?", &query.nature),
        ("type = ?", &query.kind),
    ];
    for (clause, value) in text_filters {
        if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
            clauses.push(clause);
            values.push(Value::Text(v.to_string()));
        }
    }

    let flag_filters = [
        ("is_985 = ?", query.is_985),
        ("is_211 = ?", query.is_211),
        ("is_double_first = ?", query.is_double_first),
    ];
    for (clause, value) in flag_filters {
        if let Some(v) = value {
            clauses.push(clause);
            values.push(Value::Integer(i64::from(v)));
        }
    }

    let filter = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };

    let mut stmt = conn.prepare(&select_sql(&filter))?;
    let rows = stmt.query_map(params_from_iter(values.iter()), College::from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// True when another college (other than `except`) already uses `name`
pub fn name_taken(conn: &Connection, name: &str, except: Option<i64>) -> Result<bool, AppError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT college_id FROM colleges WHERE name = ?1 AND college_id IS NOT ?2",
            params![name, except],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn id_taken(conn: &Connection, college_id: i64) -> Result<bool, AppError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM colleges WHERE college_id = ?1",
            params![college_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Smallest id above every existing college id
pub fn next_id(conn: &Connection) -> Result<i64, AppError> {
    Ok(conn.query_row(
        "SELECT COALESCE(MAX(college_id), 0) + 1 FROM colleges",
        [],
        |row| row.get(0),
    )?)
}

pub fn insert(conn: &Connection, info: &CollegeInfo) -> Result<College, AppError> {
    conn.execute(
        &format!(
            "INSERT INTO colleges (object_id, {})
             VALUES ((SELECT COALESCE(MAX(object_id), 0) + 1 FROM colleges),
                     ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            CollegeInfo::COLUMNS
        ),
        params![
            info.college_id,
            info.shape,
            info.province,
            info.name,
            info.category,
            info.nature,
            info.kind,
            info.is_985,
            info.is_211,
            info.is_double_first,
            info.city,
            info.affiliation,
            info.address,
            info.longitude,
            info.latitude,
            info.admin_code,
        ],
    )?;
    get(conn, info.college_id)?.ok_or_else(|| AppError::other("college vanished after insert"))
}

/// Overwrite every column of `college_id` except the id itself
pub fn replace(
    conn: &Connection,
    college_id: i64,
    info: &CollegeInfo,
) -> Result<College, AppError> {
    let changed = conn.execute(
        "UPDATE colleges SET shape = ?2, province = ?3, name = ?4, category = ?5, nature = ?6,
             type = ?7, is_985 = ?8, is_211 = ?9, is_double_first = ?10, city = ?11,
             affiliation = ?12, address = ?13, longitude = ?14, latitude = ?15, admin_code = ?16
         WHERE college_id = ?1",
        params![
            college_id,
            info.shape,
            info.province,
            info.name,
            info.category,
            info.nature,
            info.kind,
            info.is_985,
            info.is_211,
            info.is_double_first,
            info.city,
            info.affiliation,
            info.address,
            info.longitude,
            info.latitude,
            info.admin_code,
        ],
    )?;
    if changed == 0 {
        return Err(AppError::not_found(format!(
            "college {} does not exist",
            college_id
        )));
    }
    get(conn, college_id)?.ok_or_else(|| AppError::other("college vanished after update"))
}

pub fn delete(conn: &Connection, college_id: i64) -> Result<bool, AppError> {
    let changed = conn.execute(
        "DELETE FROM colleges WHERE college_id = ?1",
        params![college_id],
    )?;
    Ok(changed > 0)
}
