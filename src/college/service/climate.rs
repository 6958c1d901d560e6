// SPDX-License-Identifier: MIT

use super::{admin, check_admin_code};
use crate::college::entity::ClimateRecord;
use crate::college::store::{climate, Store};
use crate::error::AppError;

#[derive(Clone)]
pub struct ClimateService {
    store: Store,
}

impl ClimateService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn get(&self, admin_code: &str) -> Result<ClimateRecord, AppError> {
        let admin_code = admin_code.to_string();
        self.store
            .call(move |conn| climate::get(conn, &admin_code))
            .await?
            .ok_or_else(|| AppError::not_found("climate data not found"))
    }

    pub async fn list(&self) -> Result<Vec<ClimateRecord>, AppError> {
        self.store.call(climate::list).await
    }

    /// Admin only; one record per admin code
    pub async fn add(
        &self,
        actor_id: i64,
        record: ClimateRecord,
    ) -> Result<ClimateRecord, AppError> {
        check_admin_code(&record.admin_code)?;
        record.validate()?;
        self.store
            .call_tx(move |tx| {
                admin(tx, actor_id)?;
                if climate::get(tx, &record.admin_code)?.is_some() {
                    return Err(AppError::conflict("climate data already exists"));
                }
                climate::insert(tx, &record)?;
                log::info!(
                    "admin {} added climate data for {}",
                    actor_id,
                    record.admin_code
                );
                climate::get(tx, &record.admin_code)?
                    .ok_or_else(|| AppError::other("climate data vanished after insert"))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::fixture;
    use super::*;
    use serde_json::json;

    fn record(admin_code: &str) -> ClimateRecord {
        serde_json::from_value(json!({
            "admin_code": admin_code,
            "y202201_avg_temp": 5.2,
            "y202207_avg_temp": 30.1,
            "y202107_avg_precip": 120.4
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_add_get_list() {
        let fx = fixture();
        let service = &fx.services.climate;

        let stored = service.add(fx.admin_id, record("430100")).await.unwrap();
        assert_eq!(stored.value("y202207_avg_temp"), Some(30.1));
        assert_eq!(stored.value("y202301_avg_temp"), None);

        assert_eq!(service.get("430100").await.unwrap(), stored);
        assert_eq!(service.list().await.unwrap().len(), 1);
        let missing = service.get("110000").await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_add_guards() {
        let fx = fixture();
        let service = &fx.services.climate;

        assert!(matches!(
            service.add(fx.user_id, record("430100")).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service.add(fx.admin_id, record("1234567890")).await,
            Err(AppError::Validation(_))
        ));

        let mut unknown = record("430100");
        let column = "y201901_avg_temp".to_string();
        unknown.values.insert(column, Some(1.0));
        assert!(matches!(
            service.add(fx.admin_id, unknown).await,
            Err(AppError::Validation(_))
        ));

        service.add(fx.admin_id, record("430100")).await.unwrap();
        assert!(matches!(
            service.add(fx.admin_id, record("430100")).await,
            Err(AppError::Conflict(_))
        ));
    }
}
