// SPDX-License-Identifier: MIT

//! Service layer
//!
//! Thin operations over the store. Each service owns a [`Store`] handle;
//! permission checks resolve the acting user by id first.

mod analysis;
mod climate;
mod college;
mod division;
mod evaluation;
mod history;
mod review;
mod user;

pub use analysis::{AnalysisService, CLIMATE_ANALYST_PROMPT, TRAFFIC_ANALYST_PROMPT};
pub use climate::ClimateService;
pub use college::CollegeService;
pub use division::DivisionService;
pub use evaluation::EvaluationService;
pub use history::HistoryService;
pub use review::ReviewService;
pub use user::UserService;

use crate::adk::model::{GenerationConfig, Model};
use crate::college::entity::User;
use crate::college::geo::GeoService;
use crate::college::store::{users, Store};
use crate::error::AppError;
use rusqlite::Connection;
use std::sync::Arc;

/// Every service, cheap to clone into handlers and tools
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub colleges: CollegeService,
    pub evaluations: EvaluationService,
    pub reviews: ReviewService,
    pub climate: ClimateService,
    pub divisions: DivisionService,
    pub history: HistoryService,
    pub analysis: AnalysisService,
    pub geo: Arc<dyn GeoService>,
}

impl Services {
    pub fn new(
        store: Store,
        geo: Arc<dyn GeoService>,
        model: Arc<dyn Model>,
        generation: GenerationConfig,
    ) -> Self {
        Self {
            users: UserService::new(store.clone(), geo.clone()),
            colleges: CollegeService::new(store.clone()),
            evaluations: EvaluationService::new(store.clone()),
            reviews: ReviewService::new(store.clone()),
            climate: ClimateService::new(store.clone()),
            divisions: DivisionService::new(store.clone()),
            history: HistoryService::new(store.clone()),
            analysis: AnalysisService::new(store, geo.clone(), model, generation),
            geo,
        }
    }
}

/// Load the acting user
pub(crate) fn actor(conn: &Connection, user_id: i64) -> Result<User, AppError> {
    users::get(conn, user_id)?.ok_or_else(|| AppError::not_found("user does not exist"))
}

/// Load the acting user and require the admin role
pub(crate) fn admin(conn: &Connection, user_id: i64) -> Result<User, AppError> {
    let user = actor(conn, user_id)?;
    if !user.is_admin() {
        return Err(AppError::forbidden("admin privileges required"));
    }
    Ok(user)
}

/// Administrative codes are non-empty and at most 9 characters
pub(crate) fn check_admin_code(admin_code: &str) -> Result<(), AppError> {
    if admin_code.is_empty() || admin_code.chars().count() > 9 {
        return Err(AppError::validation(format!(
            "admin_code must be 1 to 9 characters, got '{}'",
            admin_code
        )));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixtures shared by the service unit tests

    use super::*;
    use crate::adk::model::{Content, Part};
    use crate::adk::tool::Tool;
    use crate::college::auth::hash_password;
    use crate::college::entity::{NewCollege, Role};
    use crate::college::geo::Geocode;
    use crate::college::store::users::NewUser;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Geocodes every address to the same point; transit returns a canned route
    pub struct FixedGeo;

    #[async_trait]
    impl GeoService for FixedGeo {
        async fn geocode(&self, address: &str, _city: Option<&str>) -> Result<Geocode, AppError> {
            if address.is_empty() {
                return Err(AppError::upstream("amap", "INVALID_PARAMS (20000)"));
            }
            Ok(Geocode {
                location: "112.938814,28.228209".to_string(),
                adcode: "430104".to_string(),
                citycode: "0731".to_string(),
            })
        }

        async fn transit_route(
            &self,
            origin: &str,
            destination: &str,
            _city: &str,
            _cityd: Option<&str>,
        ) -> Result<Value, AppError> {
            Ok(json!({
                "status": "1",
                "route": {
                    "origin": origin,
                    "destination": destination,
                    "transits": [{"cost": "2", "duration": "1800", "segments": [{"bus": {}}]}]
                }
            }))
        }
    }

    /// Records the prompts it receives and answers with fixed text
    #[derive(Default)]
    pub struct RecordingModel {
        pub seen: Mutex<Vec<Vec<Content>>>,
    }

    #[async_trait]
    impl Model for RecordingModel {
        async fn generate_content(
            &self,
            history: &[Content],
            _config: Option<&GenerationConfig>,
            _tools: Option<&[Arc<dyn Tool>]>,
        ) -> Result<Content, AppError> {
            self.seen
                .lock()
                .map_err(|_| AppError::other("poisoned"))?
                .push(history.to_vec());
            Ok(Content {
                role: "model".to_string(),
                parts: vec![Part::Text("分析完成".to_string())],
            })
        }
    }

    pub struct Fixture {
        pub store: Store,
        pub services: Services,
        pub model: Arc<RecordingModel>,
        pub admin_id: i64,
        pub user_id: i64,
    }

    pub fn fixture() -> Fixture {
        let store = Store::open_in_memory().unwrap();
        let (admin_id, user_id) = store
            .with_conn(|conn| {
                let admin_id = add_user(conn, "admin")?;
                users::set_role(conn, admin_id, Role::Admin)?;
                let user_id = add_user(conn, "student")?;
                Ok((admin_id, user_id))
            })
            .unwrap();
        let model = Arc::new(RecordingModel::default());
        let services = Services::new(
            store.clone(),
            Arc::new(FixedGeo),
            model.clone(),
            GenerationConfig::default(),
        );
        Fixture {
            store,
            services,
            model,
            admin_id,
            user_id,
        }
    }

    pub fn add_user(conn: &Connection, username: &str) -> Result<i64, AppError> {
        users::insert(
            conn,
            &NewUser {
                username,
                password_hash: &hash_password("password123"),
                province: "湖南",
                city: "长沙",
                address: "岳麓区麓山南路",
                location: "112.938814,28.228209",
                citycode: "0731",
                adcode: 430104,
            },
        )
    }

    pub fn new_college(college_id: i64, name: &str) -> NewCollege {
        serde_json::from_value(json!({
            "college_id": college_id,
            "shape": "POINT(112.93 28.17)",
            "province": "湖南",
            "name": name,
            "category": "综合类",
            "nature": "公办",
            "type": "普通本科",
            "is_985": 1,
            "is_211": 1,
            "is_double_first": 1,
            "city": "长沙",
            "address": "麓山南路932号",
            "longitude": 112.93,
            "latitude": 28.17,
            "admin_code": "430100"
        }))
        .unwrap()
    }
}
