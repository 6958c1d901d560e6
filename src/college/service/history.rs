// SPDX-License-Identifier: MIT

use super::admin;
use crate::college::entity::{EntityType, ModificationHistory};
use crate::college::store::{history, Store};
use crate::error::AppError;

#[derive(Clone)]
pub struct HistoryService {
    store: Store,
}

impl HistoryService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Audit trail of one college or evaluation, newest first; admin only
    pub async fn for_entity(
        &self,
        actor_id: i64,
        entity_type: EntityType,
        entity_id: i64,
    ) -> Result<Vec<ModificationHistory>, AppError> {
        self.store
            .call(move |conn| {
                admin(conn, actor_id)?;
                history::for_entity(conn, entity_type, entity_id)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::fixture;
    use super::*;

    #[tokio::test]
    async fn test_admin_only() {
        let fx = fixture();
        let history = &fx.services.history;
        let denied = history.for_entity(fx.user_id, EntityType::College, 1).await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));

        let trail = history.for_entity(fx.admin_id, EntityType::College, 1);
        assert!(trail.await.unwrap().is_empty());
    }
}
