// SPDX-License-Identifier: MIT

use super::admin;
use crate::college::auth::hash_password;
use crate::college::entity::{RegisterRequest, Role, User};
use crate::college::geo::GeoService;
use crate::college::store::users::{self, NewUser};
use crate::college::store::Store;
use crate::error::AppError;
use std::sync::Arc;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone)]
pub struct UserService {
    store: Store,
    geo: Arc<dyn GeoService>,
}

impl UserService {
    pub fn new(store: Store, geo: Arc<dyn GeoService>) -> Self {
        Self { store, geo }
    }

    /// Create an account with role `user`. The address is geocoded to fill
    /// in `location`, `adcode` and `citycode`.
    pub async fn register(&self, request: RegisterRequest) -> Result<User, AppError> {
        let username = request.username.trim().to_string();
        if username.is_empty() {
            return Err(AppError::validation("username must not be empty"));
        }
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let taken = {
            let username = username.clone();
            self.store
                .call(move |conn| Ok(users::find_by_username(conn, &username)?.is_some()))
                .await?
        };
        if taken {
            return Err(AppError::conflict("username already exists"));
        }

        let geocode = self
            .geo
            .geocode(&request.address, Some(&request.city))
            .await?;
        let adcode: i64 = geocode.adcode.parse().map_err(|_| {
            AppError::upstream("amap", format!("unexpected adcode '{}'", geocode.adcode))
        })?;

        let password_hash = hash_password(&request.password);
        self.store
            .call(move |conn| {
                let user_id = users::insert(
                    conn,
                    &NewUser {
                        username: &username,
                        password_hash: &password_hash,
                        province: &request.province,
                        city: &request.city,
                        address: &request.address,
                        location: &geocode.location,
                        citycode: &geocode.citycode,
                        adcode,
                    },
                )?;
                log::info!("registered user {} ({})", username, user_id);
                users::get(conn, user_id)?
                    .ok_or_else(|| AppError::other("user vanished after insert"))
            })
            .await
    }

    /// `None` for an unknown user or a wrong password
    pub async fn login(&self, username: &str, password: &str) -> Result<Option<User>, AppError> {
        let username = username.to_string();
        let password_hash = hash_password(password);
        self.store
            .call(move |conn| {
                Ok(users::find_by_username(conn, &username)?
                    .filter(|user| user.password == password_hash))
            })
            .await
    }

    pub async fn get(&self, user_id: i64) -> Result<User, AppError> {
        self.store
            .call(move |conn| users::get(conn, user_id))
            .await?
            .ok_or_else(|| AppError::not_found("user not found"))
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        self.store.call(users::list).await
    }

    /// Change a user's role; admin only
    pub async fn set_role(
        &self,
        actor_id: i64,
        user_id: i64,
        role: Role,
    ) -> Result<User, AppError> {
        self.store
            .call_tx(move |tx| {
                admin(tx, actor_id)?;
                if !users::set_role(tx, user_id, role)? {
                    return Err(AppError::not_found("user not found"));
                }
                log::info!("user {} set role of {} to {}", actor_id, user_id, role);
                users::get(tx, user_id)?.ok_or_else(|| AppError::not_found("user not found"))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::fixture;
    use super::*;

    fn request(username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
            province: "湖南".to_string(),
            city: "长沙".to_string(),
            address: "岳麓区麓山南路932号".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_hashes_password_and_geocodes() {
        let fx = fixture();
        let user = fx
            .services
            .users
            .register(request("lisi", "secret1"))
            .await
            .unwrap();

        assert_eq!(user.role, Role::User);
        assert_eq!(user.password, hash_password("secret1"));
        assert_eq!(user.location, "112.938814,28.228209");
        assert_eq!(user.adcode, 430104);
        assert_eq!(user.citycode, "0731");
    }

    #[tokio::test]
    async fn test_register_validation() {
        let fx = fixture();
        let users = &fx.services.users;

        assert!(matches!(
            users.register(request("  ", "secret1")).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            users.register(request("lisi", "12345")).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            users.register(request("student", "secret1")).await,
            Err(AppError::Conflict(_))
        ));

        let mut bad_address = request("wangwu", "secret1");
        bad_address.address = String::new();
        assert!(matches!(
            users.register(bad_address).await,
            Err(AppError::Upstream { .. })
        ));
    }

    #[tokio::test]
    async fn test_login() {
        let fx = fixture();
        let users = &fx.services.users;

        let user = users.login("student", "password123").await.unwrap();
        assert_eq!(user.unwrap().user_id, fx.user_id);
        assert!(users.login("student", "wrong").await.unwrap().is_none());
        let nobody = users.login("nobody", "password123").await.unwrap();
        assert!(nobody.is_none());
    }

    #[tokio::test]
    async fn test_set_role_requires_admin() {
        let fx = fixture();
        let users = &fx.services.users;

        assert!(matches!(
            users.set_role(fx.user_id, fx.user_id, Role::Admin).await,
            Err(AppError::Forbidden(_))
        ));
        let promoted = users
            .set_role(fx.admin_id, fx.user_id, Role::Admin)
            .await
            .unwrap();
        assert!(promoted.is_admin());
        assert!(matches!(
            users.set_role(fx.admin_id, 999, Role::Admin).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_and_list() {
        let fx = fixture();
        let users = &fx.services.users;
        assert_eq!(users.list().await.unwrap().len(), 2);
        let admin = users.get(fx.admin_id).await.unwrap();
        assert_eq!(admin.username, "admin");
        let missing = users.get(404).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }
}
