// SPDX-License-Identifier: MIT

use super::{admin, check_admin_code};
use crate::college::entity::{AdminDivision, NewAdminDivision};
use crate::college::store::{divisions, Store};
use crate::error::AppError;

#[derive(Clone)]
pub struct DivisionService {
    store: Store,
}

impl DivisionService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn get(&self, admin_code: &str) -> Result<AdminDivision, AppError> {
        let admin_code = admin_code.to_string();
        self.store
            .call(move |conn| divisions::get(conn, &admin_code))
            .await?
            .ok_or_else(|| AppError::not_found("admin division not found"))
    }

    pub async fn list(&self) -> Result<Vec<AdminDivision>, AppError> {
        self.store.call(divisions::list).await
    }

    pub async fn add(
        &self,
        actor_id: i64,
        division: NewAdminDivision,
    ) -> Result<AdminDivision, AppError> {
        check_admin_code(&division.admin_code)?;
        if division.name.trim().is_empty() {
            return Err(AppError::validation("division name must not be empty"));
        }
        self.store
            .call_tx(move |tx| {
                admin(tx, actor_id)?;
                if divisions::get(tx, &division.admin_code)?.is_some() {
                    return Err(AppError::conflict("admin division already exists"));
                }
                let stored = divisions::insert(tx, &division)?;
                log::info!("admin {} added division {}", actor_id, stored.admin_code);
                Ok(stored)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::fixture;
    use super::*;
    use serde_json::json;

    fn division(admin_code: serde_json::Value, name: &str) -> NewAdminDivision {
        serde_json::from_value(json!({
            "admin_code": admin_code,
            "shape": "POLYGON((112 28,113 28,113 29,112 29,112 28))",
            "name": name
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_add_assigns_object_ids() {
        let fx = fixture();
        let service = &fx.services.divisions;

        let changsha = division(json!(430100), "长沙市");
        let first = service.add(fx.admin_id, changsha).await.unwrap();
        let zhuzhou = division(json!("430200"), "株洲市");
        let second = service.add(fx.admin_id, zhuzhou).await.unwrap();
        assert_eq!(first.object_id, 1);
        assert_eq!(second.object_id, 2);
        assert_eq!(first.admin_code, "430100");

        assert_eq!(service.get("430200").await.unwrap().name, "株洲市");
        assert_eq!(service.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_add_guards() {
        let fx = fixture();
        let service = &fx.services.divisions;
        let changsha = || division(json!("430100"), "长沙市");

        assert!(matches!(
            service.add(fx.user_id, changsha()).await,
            Err(AppError::Forbidden(_))
        ));
        let blank = division(json!("430100"), " ");
        assert!(matches!(
            service.add(fx.admin_id, blank).await,
            Err(AppError::Validation(_))
        ));
        service.add(fx.admin_id, changsha()).await.unwrap();
        assert!(matches!(
            service.add(fx.admin_id, changsha()).await,
            Err(AppError::Conflict(_))
        ));
        let missing = service.get("999999").await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }
}
