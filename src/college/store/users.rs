// SPDX-License-Identifier: MIT

use crate::college::entity::{Role, User};
use crate::error::AppError;
use rusqlite::{params, Connection, OptionalExtension};

/// Column values for a new account
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub province: &'a str,
    pub city: &'a str,
    pub address: &'a str,
    pub location: &'a str,
    pub citycode: &'a str,
    pub adcode: i64,
}

pub fn insert(conn: &Connection, user: &NewUser<'_>) -> Result<i64, AppError> {
    conn.execute(
        "INSERT INTO users
             (username, password, province, city, address, role, location, citycode, adcode)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            user.username,
            user.password_hash,
            user.province,
            user.city,
            user.address,
            Role::User,
            user.location,
            user.citycode,
            user.adcode,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get(conn: &Connection, user_id: i64) -> Result<Option<User>, AppError> {
    let sql = format!("SELECT {} FROM users WHERE user_id = ?1", User::COLUMNS);
    Ok(conn
        .query_row(&sql, params![user_id], User::from_row)
        .optional()?)
}

pub fn find_by_username(conn: &Connection, username: &str) -> Result<Option<User>, AppError> {
    let sql = format!("SELECT {} FROM users WHERE username = ?1", User::COLUMNS);
    Ok(conn
        .query_row(&sql, params![username], User::from_row)
        .optional()?)
}

pub fn list(conn: &Connection) -> Result<Vec<User>, AppError> {
    let sql = format!("SELECT {} FROM users ORDER BY user_id", User::COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], User::from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Returns false when no such user exists
pub fn set_role(conn: &Connection, user_id: i64, role: Role) -> Result<bool, AppError> {
    let changed = conn.execute(
        "UPDATE users SET role = ?1 WHERE user_id = ?2",
        params![role, user_id],
    )?;
    Ok(changed > 0)
}
