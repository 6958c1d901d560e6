// SPDX-License-Identifier: MIT

use super::{actor, admin};
use crate::college::entity::{
    College, CollegeDetail, CollegeInfo, CollegePatch, CollegeQuery, EntityType, Evaluation,
    ModificationType, NewCollege, ReviewType, Submission, WriteOutcome,
};
use crate::college::store::{colleges, evaluations, history, reviews, Store};
use crate::error::AppError;

pub(crate) const NEW_COLLEGE_COMMENT: &str = "user requested a new college";
pub(crate) const UPDATE_COLLEGE_COMMENT: &str = "user requested a college update";

#[derive(Clone)]
pub struct CollegeService {
    store: Store,
}

impl CollegeService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn get(&self, college_id: i64) -> Result<College, AppError> {
        self.store
            .call(move |conn| colleges::get(conn, college_id))
            .await?
            .ok_or_else(|| AppError::not_found("college not found"))
    }

    pub async fn list(&self) -> Result<Vec<College>, AppError> {
        self.store.call(colleges::list).await
    }

    pub async fn search(&self, query: CollegeQuery) -> Result<Vec<College>, AppError> {
        self.store
            .call(move |conn| colleges::search(conn, &query))
            .await
    }

    /// A college together with all of its evaluations
    pub async fn detail(&self, college_id: i64) -> Result<CollegeDetail, AppError> {
        self.store
            .call(move |conn| {
                let college = colleges::get(conn, college_id)?
                    .ok_or_else(|| AppError::not_found("college not found"))?;
                let evaluations = evaluations::for_college(conn, college_id)?;
                Ok(CollegeDetail {
                    college,
                    evaluations,
                })
            })
            .await
    }

    /// Admins insert directly; everyone else opens a `new` review.
    pub async fn add(&self, actor_id: i64, new: NewCollege) -> Result<WriteOutcome, AppError> {
        self.store
            .call_tx(move |tx| {
                let user = actor(tx, actor_id)?;
                if colleges::name_taken(tx, &new.name, None)? {
                    return Err(AppError::conflict("college name already exists"));
                }
                let info = CollegeInfo::from(new);

                if user.is_admin() {
                    if colleges::id_taken(tx, info.college_id)? {
                        return Err(AppError::conflict("college id already exists"));
                    }
                    let college = colleges::insert(tx, &info)?;
                    let college_id = college.info.college_id;
                    log::info!("admin {} added college {}", actor_id, college_id);
                    return Ok(WriteOutcome::Applied(college));
                }

                let review_id = reviews::submit(
                    tx,
                    ReviewType::New,
                    None,
                    actor_id,
                    NEW_COLLEGE_COMMENT,
                    &info,
                )?;
                log::info!(
                    "user {} submitted new college as review {}",
                    actor_id,
                    review_id
                );
                Ok(WriteOutcome::Submitted(Submission {
                    message: "college submitted for review".to_string(),
                    review_id,
                }))
            })
            .await
    }

    /// Admins apply the patch (with an audit row); everyone else opens an
    /// `update` review holding the patched row.
    pub async fn update(
        &self,
        actor_id: i64,
        college_id: i64,
        patch: CollegePatch,
    ) -> Result<WriteOutcome, AppError> {
        self.store
            .call_tx(move |tx| {
                let user = actor(tx, actor_id)?;
                let current = colleges::get(tx, college_id)?
                    .ok_or_else(|| AppError::not_found("college not found"))?;

                let mut merged = current.info.clone();
                patch.apply_to(&mut merged);
                if colleges::name_taken(tx, &merged.name, Some(college_id))? {
                    return Err(AppError::conflict("college name already exists"));
                }

                if user.is_admin() {
                    let updated = colleges::replace(tx, college_id, &merged)?;
                    history::record(
                        tx,
                        EntityType::College,
                        college_id,
                        Some(&current),
                        Some(&updated),
                        actor_id,
                        ModificationType::Update,
                    )?;
                    log::info!("admin {} updated college {}", actor_id, college_id);
                    return Ok(WriteOutcome::Applied(updated));
                }

                let review_id = reviews::submit(
                    tx,
                    ReviewType::Update,
                    Some(college_id),
                    actor_id,
                    UPDATE_COLLEGE_COMMENT,
                    &merged,
                )?;
                log::info!(
                    "user {} submitted update of college {} as review {}",
                    actor_id,
                    college_id,
                    review_id
                );
                Ok(WriteOutcome::Submitted(Submission {
                    message: "college update submitted for review".to_string(),
                    review_id,
                }))
            })
            .await
    }

    /// Delete a college and its evaluations; admin only. Every deleted row
    /// gets a history entry.
    pub async fn delete(&self, actor_id: i64, college_id: i64) -> Result<(), AppError> {
        self.store
            .call_tx(move |tx| {
                admin(tx, actor_id)?;
                let college = colleges::get(tx, college_id)?
                    .ok_or_else(|| AppError::not_found("college not found"))?;

                let evaluations = evaluations::for_college(tx, college_id)?;
                for evaluation in &evaluations {
                    history::record(
                        tx,
                        EntityType::Evaluation,
                        evaluation.evaluation_id,
                        Some(evaluation),
                        None::<&Evaluation>,
                        actor_id,
                        ModificationType::Delete,
                    )?;
                    evaluations::delete(tx, evaluation.evaluation_id)?;
                }

                colleges::delete(tx, college_id)?;
                history::record(
                    tx,
                    EntityType::College,
                    college_id,
                    Some(&college),
                    None::<&College>,
                    actor_id,
                    ModificationType::Delete,
                )?;
                log::info!(
                    "admin {} deleted college {} with {} evaluations",
                    actor_id,
                    college_id,
                    evaluations.len()
                );
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{fixture, new_college};
    use super::*;
    use crate::college::entity::{EvaluationInput, ReviewStatus};

    #[tokio::test]
    async fn test_admin_add_applies_directly() {
        let fx = fixture();
        let colleges = &fx.services.colleges;

        let outcome = colleges
            .add(fx.admin_id, new_college(10533, "中南大学"))
            .await
            .unwrap();
        let college = match outcome {
            WriteOutcome::Applied(c) => c,
            other => panic!("expected applied, got {:?}", other),
        };
        assert_eq!(college.object_id, 1);
        assert_eq!(colleges.get(10533).await.unwrap().info.name, "中南大学");

        let same_name = new_college(10534, "中南大学");
        let same_id = new_college(10533, "湖南大学");
        assert!(matches!(
            colleges.add(fx.admin_id, same_name).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            colleges.add(fx.admin_id, same_id).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_user_add_opens_review() {
        let fx = fixture();
        let outcome = fx
            .services
            .colleges
            .add(fx.user_id, new_college(10533, "中南大学"))
            .await
            .unwrap();
        let review_id = match outcome {
            WriteOutcome::Submitted(s) => s.review_id,
            other => panic!("expected submission, got {:?}", other),
        };

        assert!(fx.services.colleges.list().await.unwrap().is_empty());
        let review = fx
            .store
            .with_conn(|conn| reviews::get(conn, review_id))
            .unwrap()
            .unwrap();
        assert_eq!(review.status, ReviewStatus::Pending);
        assert_eq!(review.review_type, ReviewType::New);
        assert_eq!(review.college_id, None);
        assert_eq!(review.review_comment.as_deref(), Some(NEW_COLLEGE_COMMENT));
    }

    #[tokio::test]
    async fn test_unknown_actor_is_not_found() {
        let fx = fixture();
        assert!(matches!(
            fx.services.colleges.add(999, new_college(1, "x")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_admin_update_records_history() {
        let fx = fixture();
        let colleges = &fx.services.colleges;
        let csu = new_college(10533, "中南大学");
        colleges.add(fx.admin_id, csu).await.unwrap();

        let patch = CollegePatch {
            address: Some("岳麓区左家垅".to_string()),
            is_985: Some(false),
            ..CollegePatch::default()
        };
        colleges.update(fx.admin_id, 10533, patch).await.unwrap();

        let college = colleges.get(10533).await.unwrap();
        assert_eq!(college.info.address.as_deref(), Some("岳麓区左家垅"));
        assert!(!college.info.is_985);
        assert!(college.info.is_211);

        let trail = fx
            .store
            .with_conn(|conn| history::for_entity(conn, EntityType::College, 10533))
            .unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].modification_type, ModificationType::Update);
        let old = trail[0].old_data.as_deref().unwrap();
        let old: serde_json::Value = serde_json::from_str(old).unwrap();
        assert_eq!(old["address"], "麓山南路932号");
    }

    #[tokio::test]
    async fn test_user_update_leaves_college_untouched() {
        let fx = fixture();
        let colleges = &fx.services.colleges;
        let csu = new_college(10533, "中南大学");
        colleges.add(fx.admin_id, csu).await.unwrap();

        let patch = CollegePatch {
            address: Some("岳麓区左家垅".to_string()),
            ..CollegePatch::default()
        };
        let outcome = colleges.update(fx.user_id, 10533, patch).await.unwrap();
        let review_id = match outcome {
            WriteOutcome::Submitted(s) => s.review_id,
            other => panic!("expected submission, got {:?}", other),
        };

        assert_eq!(
            colleges.get(10533).await.unwrap().info.address.as_deref(),
            Some("麓山南路932号")
        );
        let pending = fx
            .store
            .with_conn(|conn| reviews::pending_college(conn, review_id))
            .unwrap()
            .unwrap();
        assert_eq!(pending.info.address.as_deref(), Some("岳麓区左家垅"));
        assert_eq!(pending.info.name, "中南大学");

        let missing = colleges.update(fx.user_id, 404, CollegePatch::default());
        assert!(matches!(missing.await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_cascades_with_history() {
        let fx = fixture();
        let colleges = &fx.services.colleges;
        let csu = new_college(10533, "中南大学");
        colleges.add(fx.admin_id, csu).await.unwrap();
        for text in ["食堂不错", "交通方便"] {
            let input = EvaluationInput {
                overall: Some(text.to_string()),
                ..EvaluationInput::default()
            };
            let evaluations = &fx.services.evaluations;
            evaluations.add(fx.user_id, 10533, input).await.unwrap();
        }

        assert!(matches!(
            colleges.delete(fx.user_id, 10533).await,
            Err(AppError::Forbidden(_))
        ));
        colleges.delete(fx.admin_id, 10533).await.unwrap();

        let gone = colleges.get(10533).await;
        assert!(matches!(gone, Err(AppError::NotFound(_))));
        let (evaluation_rows, deletes): (i64, i64) = fx
            .store
            .with_conn(|conn| {
                let evals = conn.query_row("SELECT COUNT(*) FROM evaluations", [], |r| r.get(0))?;
                let deletes = conn.query_row(
                    "SELECT COUNT(*) FROM modification_history WHERE modification_type = 'delete'",
                    [],
                    |r| r.get(0),
                )?;
                Ok((evals, deletes))
            })
            .unwrap();
        assert_eq!(evaluation_rows, 0);
        assert_eq!(deletes, 3);

        assert!(matches!(
            colleges.delete(fx.admin_id, 10533).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_search_and_detail() {
        let fx = fixture();
        let colleges = &fx.services.colleges;
        let csu = new_college(10533, "中南大学");
        colleges.add(fx.admin_id, csu).await.unwrap();
        let mut other = new_college(10532, "湖南师范大学");
        other.is_985 = false;
        colleges.add(fx.admin_id, other).await.unwrap();

        let query = CollegeQuery {
            name: Some("南".to_string()),
            is_985: Some(true),
            ..CollegeQuery::default()
        };
        let found = colleges.search(query).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].info.name, "中南大学");
        let all = colleges.search(CollegeQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let detail = colleges.detail(10532).await.unwrap();
        assert!(detail.evaluations.is_empty());
        let missing = colleges.detail(1).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }
}
