// SPDX-License-Identifier: MIT

use crate::college::entity::{Evaluation, EvaluationInput};
use crate::error::AppError;
use rusqlite::{params, Connection, OptionalExtension};

fn query(conn: &Connection, filter: &str, id: i64) -> Result<Vec<Evaluation>, AppError> {
    let sql = format!(
        "SELECT {} FROM evaluations WHERE {} = ?1 ORDER BY evaluation_id",
        Evaluation::COLUMNS,
        filter
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![id], Evaluation::from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn insert(
    conn: &Connection,
    college_id: i64,
    user_id: i64,
    input: &EvaluationInput,
) -> Result<Evaluation, AppError> {
    conn.execute(
        "INSERT INTO evaluations
             (college_id, user_id, dietary_evaluation, traffic_evaluation, evaluation)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![college_id, user_id, input.dietary, input.traffic, input.overall],
    )?;
    let id = conn.last_insert_rowid();
    get(conn, id)?.ok_or_else(|| AppError::other("evaluation vanished after insert"))
}

pub fn get(conn: &Connection, evaluation_id: i64) -> Result<Option<Evaluation>, AppError> {
    let sql = format!(
        "SELECT {} FROM evaluations WHERE evaluation_id = ?1",
        Evaluation::COLUMNS
    );
    Ok(conn
        .query_row(&sql, params![evaluation_id], Evaluation::from_row)
        .optional()?)
}

pub fn for_college(conn: &Connection, college_id: i64) -> Result<Vec<Evaluation>, AppError> {
    query(conn, "college_id", college_id)
}

pub fn for_user(conn: &Connection, user_id: i64) -> Result<Vec<Evaluation>, AppError> {
    query(conn, "user_id", user_id)
}

pub fn update(conn: &Connection, evaluation: &Evaluation) -> Result<(), AppError> {
    conn.execute(
        "UPDATE evaluations SET dietary_evaluation = ?2, traffic_evaluation = ?3, evaluation = ?4
         WHERE evaluation_id = ?1",
        params![
            evaluation.evaluation_id,
            evaluation.dietary,
            evaluation.traffic,
            evaluation.overall
        ],
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, evaluation_id: i64) -> Result<(), AppError> {
    conn.execute(
        "DELETE FROM evaluations WHERE evaluation_id = ?1",
        params![evaluation_id],
    )?;
    Ok(())
}
