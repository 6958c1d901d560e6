// SPDX-License-Identifier: MIT

use super::college::{College, CollegeInfo};
use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

text_enum! {
    "review status",
    pub enum ReviewStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

text_enum! {
    "review type",
    pub enum ReviewType {
        New => "new",
        Update => "update",
    }
}

/// A moderation ticket for a user-submitted college change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollegeReview {
    pub review_id: i64,
    /// Target college; for `new` reviews it stays empty until approval
    pub college_id: Option<i64>,
    pub user_id: i64,
    pub status: ReviewStatus,
    pub submit_time: DateTime<Utc>,
    pub review_time: Option<DateTime<Utc>>,
    pub reviewer_id: Option<i64>,
    pub review_comment: Option<String>,
    pub review_type: ReviewType,
}

impl CollegeReview {
    pub(crate) const COLUMNS: &'static str = "review_id, college_id, user_id, status, \
        submit_time, review_time, reviewer_id, review_comment, review_type";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            review_id: row.get(0)?,
            college_id: row.get(1)?,
            user_id: row.get(2)?,
            status: row.get(3)?,
            submit_time: row.get(4)?,
            review_time: row.get(5)?,
            reviewer_id: row.get(6)?,
            review_comment: row.get(7)?,
            review_type: row.get(8)?,
        })
    }
}

/// The proposed college row staged under a review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingCollege {
    pub review_id: i64,
    pub user_id: i64,
    pub submit_time: DateTime<Utc>,
    #[serde(flatten)]
    pub info: CollegeInfo,
}

impl PendingCollege {
    pub(crate) const HEAD_COLUMNS: &'static str = "review_id, user_id, submit_time";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            review_id: row.get(0)?,
            user_id: row.get(1)?,
            submit_time: row.get(2)?,
            info: CollegeInfo::from_row_at(row, 3)?,
        })
    }
}

/// A pending review as shown to moderators
#[derive(Debug, Clone, Serialize)]
pub struct PendingReview {
    #[serde(flatten)]
    pub review: CollegeReview,
    pub pending_college: Option<PendingCollege>,
    /// Current college for `update` reviews
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_college: Option<College>,
}

/// Outcome of approving or rejecting a review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDecision {
    pub message: String,
    pub review_id: i64,
    pub status: ReviewStatus,
}
