// SPDX-License-Identifier: MIT

use crate::college::entity::{CollegeInfo, CollegeReview, PendingCollege, ReviewStatus, ReviewType};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

/// Open a `pending` review and stage the proposed row under it; returns the review id
pub fn submit(
    conn: &Connection,
    review_type: ReviewType,
    college_id: Option<i64>,
    user_id: i64,
    comment: &str,
    proposed: &CollegeInfo,
) -> Result<i64, AppError> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO college_reviews
             (college_id, user_id, status, submit_time, review_comment, review_type)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![college_id, user_id, ReviewStatus::Pending, now, comment, review_type],
    )?;
    let review_id = conn.last_insert_rowid();

    conn.execute(
        &format!(
            "INSERT INTO pending_colleges ({}, {})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                     ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
            PendingCollege::HEAD_COLUMNS,
            CollegeInfo::COLUMNS
        ),
        params![
            review_id,
            user_id,
            now,
            proposed.college_id,
            proposed.shape,
            proposed.province,
            proposed.name,
            proposed.category,
            proposed.nature,
            proposed.kind,
            proposed.is_985,
            proposed.is_211,
            proposed.is_double_first,
            proposed.city,
            proposed.affiliation,
            proposed.address,
            proposed.longitude,
            proposed.latitude,
            proposed.admin_code,
        ],
    )?;
    Ok(review_id)
}

pub fn get(conn: &Connection, review_id: i64) -> Result<Option<CollegeReview>, AppError> {
    let sql = format!(
        "SELECT {} FROM college_reviews WHERE review_id = ?1",
        CollegeReview::COLUMNS
    );
    Ok(conn
        .query_row(&sql, params![review_id], CollegeReview::from_row)
        .optional()?)
}

pub fn with_status(
    conn: &Connection,
    status: ReviewStatus,
) -> Result<Vec<CollegeReview>, AppError> {
    let sql = format!(
        "SELECT {} FROM college_reviews WHERE status = ?1 ORDER BY review_id",
        CollegeReview::COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![status], CollegeReview::from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn by_user(conn: &Connection, user_id: i64) -> Result<Vec<CollegeReview>, AppError> {
    let sql = format!(
        "SELECT {} FROM college_reviews WHERE user_id = ?1 ORDER BY review_id DESC",
        CollegeReview::COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id], CollegeReview::from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn pending_college(
    conn: &Connection,
    review_id: i64,
) -> Result<Option<PendingCollege>, AppError> {
    let sql = format!(
        "SELECT {}, {} FROM pending_colleges WHERE review_id = ?1",
        PendingCollege::HEAD_COLUMNS,
        CollegeInfo::COLUMNS
    );
    Ok(conn
        .query_row(&sql, params![review_id], PendingCollege::from_row)
        .optional()?)
}

/// Close a review. Only rows still `pending` change; returns false otherwise.
pub fn close(
    conn: &Connection,
    review_id: i64,
    status: ReviewStatus,
    reviewer_id: i64,
    comment: Option<&str>,
    reviewed_at: DateTime<Utc>,
    college_id: Option<i64>,
) -> Result<bool, AppError> {
    let changed = conn.execute(
        "UPDATE college_reviews
         SET status = ?2, reviewer_id = ?3, review_comment = COALESCE(?4, review_comment),
             review_time = ?5, college_id = COALESCE(?6, college_id)
         WHERE review_id = ?1 AND status = ?7",
        params![
            review_id,
            status,
            reviewer_id,
            comment,
            reviewed_at,
            college_id,
            ReviewStatus::Pending
        ],
    )?;
    Ok(changed > 0)
}
