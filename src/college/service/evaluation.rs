// SPDX-License-Identifier: MIT

use super::actor;
use crate::college::entity::{EntityType, Evaluation, EvaluationInput, ModificationType, User};
use crate::college::store::{colleges, evaluations, history, Store};
use crate::error::AppError;
use rusqlite::Connection;

#[derive(Clone)]
pub struct EvaluationService {
    store: Store,
}

/// Load an evaluation the acting user may modify: their own, or any for admins
fn editable(conn: &Connection, user: &User, evaluation_id: i64) -> Result<Evaluation, AppError> {
    let evaluation = evaluations::get(conn, evaluation_id)?
        .ok_or_else(|| AppError::not_found("evaluation not found"))?;
    if evaluation.user_id != user.user_id && !user.is_admin() {
        return Err(AppError::forbidden(
            "only the author or an admin may modify this evaluation",
        ));
    }
    Ok(evaluation)
}

impl EvaluationService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn add(
        &self,
        actor_id: i64,
        college_id: i64,
        input: EvaluationInput,
    ) -> Result<Evaluation, AppError> {
        self.store
            .call_tx(move |tx| {
                actor(tx, actor_id)?;
                if colleges::get(tx, college_id)?.is_none() {
                    return Err(AppError::not_found("college not found"));
                }
                evaluations::insert(tx, college_id, actor_id, &input)
            })
            .await
    }

    pub async fn list_for_user(&self, actor_id: i64) -> Result<Vec<Evaluation>, AppError> {
        self.store
            .call(move |conn| {
                actor(conn, actor_id)?;
                evaluations::for_user(conn, actor_id)
            })
            .await
    }

    pub async fn update(
        &self,
        actor_id: i64,
        evaluation_id: i64,
        input: EvaluationInput,
    ) -> Result<Evaluation, AppError> {
        self.store
            .call_tx(move |tx| {
                let user = actor(tx, actor_id)?;
                let old = editable(tx, &user, evaluation_id)?;

                let mut new = old.clone();
                input.apply_to(&mut new);
                evaluations::update(tx, &new)?;
                history::record(
                    tx,
                    EntityType::Evaluation,
                    evaluation_id,
                    Some(&old),
                    Some(&new),
                    actor_id,
                    ModificationType::Update,
                )?;
                Ok(new)
            })
            .await
    }

    pub async fn delete(&self, actor_id: i64, evaluation_id: i64) -> Result<(), AppError> {
        self.store
            .call_tx(move |tx| {
                let user = actor(tx, actor_id)?;
                let old = editable(tx, &user, evaluation_id)?;

                evaluations::delete(tx, evaluation_id)?;
                history::record(
                    tx,
                    EntityType::Evaluation,
                    evaluation_id,
                    Some(&old),
                    None,
                    actor_id,
                    ModificationType::Delete,
                )?;
                log::info!("user {} deleted evaluation {}", actor_id, evaluation_id);
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{add_user, fixture, new_college};
    use super::*;

    fn input(dietary: Option<&str>, overall: Option<&str>) -> EvaluationInput {
        EvaluationInput {
            dietary: dietary.map(str::to_string),
            traffic: None,
            overall: overall.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_add_requires_existing_college() {
        let fx = fixture();
        let evaluations = &fx.services.evaluations;
        let orphan = evaluations.add(fx.user_id, 10533, input(None, Some("好")));
        assert!(matches!(orphan.await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_only_author_or_admin_may_modify() {
        let fx = fixture();
        let csu = new_college(10533, "中南大学");
        fx.services.colleges.add(fx.admin_id, csu).await.unwrap();
        let evaluations = &fx.services.evaluations;
        let evaluation = evaluations
            .add(fx.user_id, 10533, input(Some("食堂便宜"), Some("不错")))
            .await
            .unwrap();
        let id = evaluation.evaluation_id;
        let stranger = fx
            .store
            .with_conn(|conn| add_user(conn, "stranger"))
            .unwrap();

        let edit = evaluations.update(stranger, id, input(None, Some("差")));
        assert!(matches!(edit.await, Err(AppError::Forbidden(_))));
        let removal = evaluations.delete(stranger, id).await;
        assert!(matches!(removal, Err(AppError::Forbidden(_))));

        let updated = evaluations
            .update(fx.user_id, id, input(None, Some("很好")))
            .await
            .unwrap();
        assert_eq!(updated.dietary.as_deref(), Some("食堂便宜"));
        assert_eq!(updated.overall.as_deref(), Some("很好"));

        evaluations.delete(fx.admin_id, id).await.unwrap();
        let remaining = evaluations.list_for_user(fx.user_id).await.unwrap();
        assert!(remaining.is_empty());

        let trail = fx
            .store
            .with_conn(|conn| history::for_entity(conn, EntityType::Evaluation, id))
            .unwrap();
        let kinds: Vec<_> = trail.iter().map(|h| h.modification_type).collect();
        let expected = vec![ModificationType::Delete, ModificationType::Update];
        assert_eq!(kinds, expected);
        assert!(trail[0].new_data.is_none());
    }

    #[tokio::test]
    async fn test_missing_evaluation() {
        let fx = fixture();
        assert!(matches!(
            fx.services.evaluations.delete(fx.user_id, 77).await,
            Err(AppError::NotFound(_))
        ));
    }
}
