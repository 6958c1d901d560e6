// SPDX-License-Identifier: MIT

//! Moderation of user-submitted college changes
//!
//! A review moves `pending -> approved | rejected` exactly once. Approving
//! applies the staged `PendingCollege` row; rejecting leaves colleges alone.

use super::{actor, admin};
use crate::college::entity::{
    CollegeReview, EntityType, ModificationType, PendingCollege, PendingReview, ReviewDecision,
    ReviewStatus, ReviewType,
};
use crate::college::store::{colleges, history, reviews, Store};
use crate::error::AppError;
use chrono::Utc;
use rusqlite::Connection;

#[derive(Clone)]
pub struct ReviewService {
    store: Store,
}

fn staged(conn: &Connection, review_id: i64) -> Result<PendingCollege, AppError> {
    reviews::pending_college(conn, review_id)?
        .ok_or_else(|| AppError::not_found("pending college not found"))
}

/// Publish the college staged under a `new` review; returns its id
fn approve_new(conn: &Connection, review: &CollegeReview) -> Result<i64, AppError> {
    let mut info = staged(conn, review.review_id)?.info;
    if colleges::name_taken(conn, &info.name, None)? {
        return Err(AppError::conflict("college name already exists"));
    }
    if colleges::id_taken(conn, info.college_id)? {
        info.college_id = colleges::next_id(conn)?;
    }
    Ok(colleges::insert(conn, &info)?.info.college_id)
}

/// Overwrite the target college with the staged row, recording history
fn approve_update(
    conn: &Connection,
    review: &CollegeReview,
    reviewer_id: i64,
) -> Result<i64, AppError> {
    let college_id = review
        .college_id
        .ok_or_else(|| AppError::not_found("update review has no target college"))?;
    let current = colleges::get(conn, college_id)?
        .ok_or_else(|| AppError::not_found("college not found"))?;

    let mut info = staged(conn, review.review_id)?.info;
    info.college_id = college_id;
    if colleges::name_taken(conn, &info.name, Some(college_id))? {
        return Err(AppError::conflict("college name already exists"));
    }

    let updated = colleges::replace(conn, college_id, &info)?;
    history::record(
        conn,
        EntityType::College,
        college_id,
        Some(&current),
        Some(&updated),
        reviewer_id,
        ModificationType::Update,
    )?;
    Ok(college_id)
}

impl ReviewService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Every pending review with its staged row and, for updates, the current college
    pub async fn pending(&self, actor_id: i64) -> Result<Vec<PendingReview>, AppError> {
        self.store
            .call(move |conn| {
                admin(conn, actor_id)?;
                reviews::with_status(conn, ReviewStatus::Pending)?
                    .into_iter()
                    .map(|review| -> Result<PendingReview, AppError> {
                        let pending_college = reviews::pending_college(conn, review.review_id)?;
                        let original_college = match (review.review_type, review.college_id) {
                            (ReviewType::Update, Some(id)) => colleges::get(conn, id)?,
                            _ => None,
                        };
                        Ok(PendingReview {
                            review,
                            pending_college,
                            original_college,
                        })
                    })
                    .collect()
            })
            .await
    }

    pub async fn pending_detail(
        &self,
        actor_id: i64,
        review_id: i64,
    ) -> Result<PendingCollege, AppError> {
        self.store
            .call(move |conn| {
                admin(conn, actor_id)?;
                staged(conn, review_id)
            })
            .await
    }

    /// The acting user's own submissions, newest first
    pub async fn submissions(&self, actor_id: i64) -> Result<Vec<CollegeReview>, AppError> {
        self.store
            .call(move |conn| {
                actor(conn, actor_id)?;
                reviews::by_user(conn, actor_id)
            })
            .await
    }

    /// Approve or reject a pending review. Everything happens in one
    /// transaction; a review that is no longer pending is a conflict.
    pub async fn decide(
        &self,
        actor_id: i64,
        review_id: i64,
        status: ReviewStatus,
        comment: Option<String>,
    ) -> Result<ReviewDecision, AppError> {
        if status == ReviewStatus::Pending {
            return Err(AppError::validation(
                "review status must be 'approved' or 'rejected'",
            ));
        }

        self.store
            .call_tx(move |tx| {
                admin(tx, actor_id)?;
                let review = reviews::get(tx, review_id)?
                    .ok_or_else(|| AppError::not_found("review not found"))?;
                if review.status != ReviewStatus::Pending {
                    return Err(AppError::conflict(format!(
                        "review {} is already {}",
                        review_id, review.status
                    )));
                }

                let college_id = match (status, review.review_type) {
                    (ReviewStatus::Approved, ReviewType::New) => Some(approve_new(tx, &review)?),
                    (ReviewStatus::Approved, ReviewType::Update) => {
                        Some(approve_update(tx, &review, actor_id)?)
                    }
                    _ => None,
                };

                if !reviews::close(
                    tx,
                    review_id,
                    status,
                    actor_id,
                    comment.as_deref(),
                    Utc::now(),
                    college_id,
                )? {
                    return Err(AppError::conflict(format!(
                        "review {} is no longer pending",
                        review_id
                    )));
                }
                log::info!("admin {} {} review {}", actor_id, status, review_id);

                let verb = if status == ReviewStatus::Approved {
                    "approved"
                } else {
                    "rejected"
                };
                Ok(ReviewDecision {
                    message: format!("college review {}", verb),
                    review_id,
                    status,
                })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{fixture, new_college, Fixture};
    use super::*;
    use crate::college::entity::{CollegePatch, WriteOutcome};

    async fn submit_new(fx: &Fixture, college_id: i64, name: &str) -> i64 {
        match fx
            .services
            .colleges
            .add(fx.user_id, new_college(college_id, name))
            .await
            .unwrap()
        {
            WriteOutcome::Submitted(s) => s.review_id,
            other => panic!("expected submission, got {:?}", other),
        }
    }

    fn review(fx: &Fixture, review_id: i64) -> CollegeReview {
        fx.store
            .with_conn(|conn| reviews::get(conn, review_id))
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_approve_new_creates_college() {
        let fx = fixture();
        let review_id = submit_new(&fx, 10533, "中南大学").await;

        let decision = fx
            .services
            .reviews
            .decide(
                fx.admin_id,
                review_id,
                ReviewStatus::Approved,
                Some("ok".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(decision.message, "college review approved");
        assert_eq!(decision.status, ReviewStatus::Approved);

        let college = fx.services.colleges.get(10533).await.unwrap();
        assert_eq!(college.info.name, "中南大学");

        let closed = review(&fx, review_id);
        assert_eq!(closed.status, ReviewStatus::Approved);
        assert_eq!(closed.college_id, Some(10533));
        assert_eq!(closed.reviewer_id, Some(fx.admin_id));
        assert_eq!(closed.review_comment.as_deref(), Some("ok"));
        assert!(closed.review_time.is_some());
    }

    #[tokio::test]
    async fn test_approve_new_with_taken_id_gets_next_id() {
        let fx = fixture();
        let csu = new_college(10533, "中南大学");
        fx.services.colleges.add(fx.admin_id, csu).await.unwrap();
        let review_id = submit_new(&fx, 10533, "湖南大学").await;

        fx.services
            .reviews
            .decide(fx.admin_id, review_id, ReviewStatus::Approved, None)
            .await
            .unwrap();
        let published = fx.services.colleges.get(10534).await.unwrap();
        assert_eq!(published.info.name, "湖南大学");
        assert_eq!(review(&fx, review_id).college_id, Some(10534));
    }

    #[tokio::test]
    async fn test_approve_update_rewrites_and_records_history() {
        let fx = fixture();
        let csu = new_college(10533, "中南大学");
        fx.services.colleges.add(fx.admin_id, csu).await.unwrap();
        let reviews = &fx.services.reviews;
        let patch = CollegePatch {
            affiliation: Some("教育部".to_string()),
            ..CollegePatch::default()
        };
        let outcome = fx.services.colleges.update(fx.user_id, 10533, patch).await;
        let review_id = match outcome.unwrap() {
            WriteOutcome::Submitted(s) => s.review_id,
            other => panic!("expected submission, got {:?}", other),
        };

        let pending = reviews.pending(fx.admin_id).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert!(pending[0].original_college.is_some());
        let staged = pending[0].pending_college.as_ref().unwrap();
        assert_eq!(staged.info.affiliation.as_deref(), Some("教育部"));

        reviews
            .decide(fx.admin_id, review_id, ReviewStatus::Approved, None)
            .await
            .unwrap();
        let college = fx.services.colleges.get(10533).await.unwrap();
        assert_eq!(college.info.affiliation.as_deref(), Some("教育部"));

        let trail = fx
            .services
            .history
            .for_entity(fx.admin_id, EntityType::College, 10533)
            .await
            .unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].user_id, fx.admin_id);
        assert!(reviews.pending(fx.admin_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reject_changes_nothing_and_is_final() {
        let fx = fixture();
        let review_id = submit_new(&fx, 10533, "中南大学").await;
        let reviews = &fx.services.reviews;

        let decision = reviews
            .decide(fx.admin_id, review_id, ReviewStatus::Rejected, None)
            .await
            .unwrap();
        assert_eq!(decision.message, "college review rejected");
        assert!(fx.services.colleges.list().await.unwrap().is_empty());

        let closed = review(&fx, review_id);
        assert_eq!(closed.status, ReviewStatus::Rejected);
        assert_eq!(closed.college_id, None);

        let again = reviews
            .decide(fx.admin_id, review_id, ReviewStatus::Approved, None)
            .await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
        assert!(fx.services.colleges.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_decide_guards() {
        let fx = fixture();
        let review_id = submit_new(&fx, 10533, "中南大学").await;
        let reviews = &fx.services.reviews;

        let pending = reviews
            .decide(fx.admin_id, review_id, ReviewStatus::Pending, None)
            .await;
        assert!(matches!(pending, Err(AppError::Validation(_))));

        let by_user = reviews
            .decide(fx.user_id, review_id, ReviewStatus::Approved, None)
            .await;
        assert!(matches!(by_user, Err(AppError::Forbidden(_))));

        let missing = reviews
            .decide(fx.admin_id, 999, ReviewStatus::Approved, None)
            .await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let listed = reviews.pending(fx.user_id).await;
        assert!(matches!(listed, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_approve_new_rechecks_name() {
        let fx = fixture();
        let review_id = submit_new(&fx, 10533, "中南大学").await;
        let clash = new_college(20000, "中南大学");
        fx.services.colleges.add(fx.admin_id, clash).await.unwrap();

        assert!(matches!(
            fx.services
                .reviews
                .decide(fx.admin_id, review_id, ReviewStatus::Approved, None)
                .await,
            Err(AppError::Conflict(_))
        ));
        assert_eq!(review(&fx, review_id).status, ReviewStatus::Pending);
    }

    #[tokio::test]
    async fn test_submissions_and_detail() {
        let fx = fixture();
        let first = submit_new(&fx, 1, "长沙理工大学").await;
        let second = submit_new(&fx, 2, "湘潭大学").await;
        let reviews = &fx.services.reviews;

        let mine = reviews.submissions(fx.user_id).await.unwrap();
        let ids: Vec<i64> = mine.iter().map(|r| r.review_id).collect();
        assert_eq!(ids, vec![second, first]);
        assert!(reviews.submissions(fx.admin_id).await.unwrap().is_empty());

        let staged = reviews.pending_detail(fx.admin_id, first).await.unwrap();
        assert_eq!(staged.info.name, "长沙理工大学");
        assert_eq!(staged.user_id, fx.user_id);
        assert!(matches!(
            reviews.pending_detail(fx.admin_id, 404).await,
            Err(AppError::NotFound(_))
        ));
    }
}
