// SPDX-License-Identifier: MIT

//! Assistant tools. Each one calls a service on behalf of the user who is
//! chatting, so the usual permission checks apply.

use crate::adk::tool::Tool;
use crate::college::entity::{
    code, ClimateRecord, CollegePatch, CollegeQuery, EvaluationInput, NewAdminDivision, NewCollege,
};
use crate::college::geo::strip_segments;
use crate::college::service::Services;
use crate::error::AppError;
use async_trait::async_trait;
use futures::future::BoxFuture;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

type ToolFuture = BoxFuture<'static, Result<Value, AppError>>;
type Handler = fn(Services, i64, Value) -> ToolFuture;

/// A tool backed by one service call
pub struct ServiceTool {
    name: &'static str,
    description: &'static str,
    schema: &'static Lazy<Value>,
    handler: Handler,
    services: Services,
    caller: i64,
}

#[async_trait]
impl Tool for ServiceTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn schema(&self) -> &Value {
        self.schema
    }

    async fn execute(&self, input: Value) -> Result<Value, AppError> {
        (self.handler)(self.services.clone(), self.caller, input).await
    }
}

fn to_value<T: Serialize>(value: T) -> Result<Value, AppError> {
    Ok(serde_json::to_value(value)?)
}

// --- Static schemas ---

static NO_ARGS_SCHEMA: Lazy<Value> = Lazy::new(|| json!({"type": "object", "properties": {}}));

static COLLEGE_ID_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "college_id": {"type": "integer", "description": "College id"}
        },
        "required": ["college_id"]
    })
});

static ADMIN_CODE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "admin_code": {"type": "string", "description": "Administrative division code, at most 9 characters"}
        },
        "required": ["admin_code"]
    })
});

static EVALUATION_ID_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "evaluation_id": {"type": "integer", "description": "Evaluation id"}
        },
        "required": ["evaluation_id"]
    })
});

fn college_fields() -> Value {
    json!({
        "shape": {"type": "string", "description": "WKT geometry, e.g. POINT(112.93 28.17)"},
        "province": {"type": "string", "description": "Province"},
        "name": {"type": "string", "description": "College name"},
        "category": {
            "type": "string",
            "enum": ["综合类", "理工类", "师范类", "医药类", "财经类", "艺术类", "农林类",
                     "政法类", "其他", "语言类", "体育类", "军事类", "民族类"]
        },
        "nature": {"type": "string", "enum": ["公办", "民办", "中外合办"]},
        "type": {"type": "string", "description": "Education level, e.g. 普通本科"},
        "is_985": {"type": "boolean"},
        "is_211": {"type": "boolean"},
        "is_double_first": {"type": "boolean"},
        "city": {"type": "string"},
        "affiliation": {"type": "string", "description": "Supervising authority"},
        "address": {"type": "string"},
        "longitude": {"type": "number"},
        "latitude": {"type": "number"},
        "admin_code": {"type": "string", "description": "Administrative division code"}
    })
}

static ADD_COLLEGE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    let mut properties = college_fields();
    properties["college_id"] = json!({"type": "integer", "description": "College id"});
    json!({
        "type": "object",
        "properties": properties,
        "required": ["college_id", "shape", "province", "name", "category", "nature",
                     "city", "longitude", "latitude"]
    })
});

static UPDATE_COLLEGE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    let mut properties = college_fields();
    properties["college_id"] = json!({"type": "integer", "description": "College to update"});
    json!({
        "type": "object",
        "properties": properties,
        "required": ["college_id"]
    })
});

static SEARCH_COLLEGES_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "name": {"type": "string", "description": "Part of the college name"},
            "province": {"type": "string"},
            "city": {"type": "string"},
            "category": {"type": "string"},
            "nature": {"type": "string"},
            "type": {"type": "string"},
            "is_985": {"type": "boolean"},
            "is_211": {"type": "boolean"},
            "is_double_first": {"type": "boolean"}
        }
    })
});

fn evaluation_fields() -> Value {
    json!({
        "Dietary_evaluation": {"type": "string", "description": "Comments on the food"},
        "Traffic_evaluation": {"type": "string", "description": "Comments on transport"},
        "Evaluation": {"type": "string", "description": "Overall comments"}
    })
}

static ADD_EVALUATION_SCHEMA: Lazy<Value> = Lazy::new(|| {
    let mut properties = evaluation_fields();
    properties["college_id"] = json!({"type": "integer", "description": "College being evaluated"});
    json!({"type": "object", "properties": properties, "required": ["college_id"]})
});

static UPDATE_EVALUATION_SCHEMA: Lazy<Value> = Lazy::new(|| {
    let mut properties = evaluation_fields();
    properties["evaluation_id"] = json!({"type": "integer", "description": "Evaluation to update"});
    json!({"type": "object", "properties": properties, "required": ["evaluation_id"]})
});

static ADD_CLIMATE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "admin_code": {"type": "string", "description": "Administrative division code"}
        },
        "additionalProperties": {
            "type": ["number", "null"],
            "description": "Monthly values named yYYYYMM_avg_temp (2022-2024) or yYYYYMM_avg_precip (2021-2023)"
        },
        "required": ["admin_code"]
    })
});

static ADD_DIVISION_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "admin_code": {"type": "string", "description": "Administrative division code"},
            "shape": {"type": "string", "description": "WKT boundary"},
            "name": {"type": "string", "description": "Division name"}
        },
        "required": ["admin_code", "shape", "name"]
    })
});

static GEOCODE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "address": {"type": "string", "description": "Structured address, e.g. 北京市朝阳区阜通东大街6号"},
            "city": {"type": "string", "description": "City name, citycode or adcode to narrow the search"}
        },
        "required": ["address"]
    })
});

static TRANSIT_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "origin": {"type": "string", "description": "Start point as \"lng,lat\""},
            "destination": {"type": "string", "description": "End point as \"lng,lat\""},
            "city": {"type": "string", "description": "Origin city name or citycode"},
            "cityd": {"type": "string", "description": "Destination city for cross-city trips"}
        },
        "required": ["origin", "destination", "city"]
    })
});

// --- Argument types ---

#[derive(Deserialize)]
struct CollegeIdArgs {
    college_id: i64,
}

#[derive(Deserialize)]
struct EvaluationIdArgs {
    evaluation_id: i64,
}

#[derive(Deserialize)]
struct AdminCodeArgs {
    #[serde(deserialize_with = "code")]
    admin_code: String,
}

#[derive(Deserialize)]
struct UpdateCollegeArgs {
    college_id: i64,
    #[serde(flatten)]
    patch: CollegePatch,
}

#[derive(Deserialize)]
struct AddEvaluationArgs {
    college_id: i64,
    #[serde(flatten)]
    input: EvaluationInput,
}

#[derive(Deserialize)]
struct UpdateEvaluationArgs {
    evaluation_id: i64,
    #[serde(flatten)]
    input: EvaluationInput,
}

#[derive(Deserialize)]
struct GeocodeArgs {
    address: String,
    #[serde(default)]
    city: Option<String>,
}

#[derive(Deserialize)]
struct TransitArgs {
    origin: String,
    destination: String,
    city: String,
    #[serde(default)]
    cityd: Option<String>,
}

// --- Handlers ---

fn list_colleges(s: Services, _caller: i64, _args: Value) -> ToolFuture {
    Box::pin(async move { to_value(s.colleges.list().await?) })
}

fn get_college(s: Services, _caller: i64, args: Value) -> ToolFuture {
    Box::pin(async move {
        let args: CollegeIdArgs = serde_json::from_value(args)?;
        to_value(s.colleges.detail(args.college_id).await?)
    })
}

fn search_colleges(s: Services, _caller: i64, args: Value) -> ToolFuture {
    Box::pin(async move {
        let query: CollegeQuery = serde_json::from_value(args)?;
        to_value(s.colleges.search(query).await?)
    })
}

fn add_college(s: Services, caller: i64, args: Value) -> ToolFuture {
    Box::pin(async move {
        let new: NewCollege = serde_json::from_value(args)?;
        to_value(s.colleges.add(caller, new).await?)
    })
}

fn update_college(s: Services, caller: i64, args: Value) -> ToolFuture {
    Box::pin(async move {
        let args: UpdateCollegeArgs = serde_json::from_value(args)?;
        let id = args.college_id;
        to_value(s.colleges.update(caller, id, args.patch).await?)
    })
}

fn delete_college(s: Services, caller: i64, args: Value) -> ToolFuture {
    Box::pin(async move {
        let args: CollegeIdArgs = serde_json::from_value(args)?;
        let id = args.college_id;
        s.colleges.delete(caller, id).await?;
        Ok(json!({"message": "college deleted", "college_id": id}))
    })
}

fn add_evaluation(s: Services, caller: i64, args: Value) -> ToolFuture {
    Box::pin(async move {
        let args: AddEvaluationArgs = serde_json::from_value(args)?;
        let id = args.college_id;
        to_value(s.evaluations.add(caller, id, args.input).await?)
    })
}

fn update_evaluation(s: Services, caller: i64, args: Value) -> ToolFuture {
    Box::pin(async move {
        let args: UpdateEvaluationArgs = serde_json::from_value(args)?;
        let id = args.evaluation_id;
        to_value(s.evaluations.update(caller, id, args.input).await?)
    })
}

fn delete_evaluation(s: Services, caller: i64, args: Value) -> ToolFuture {
    Box::pin(async move {
        let args: EvaluationIdArgs = serde_json::from_value(args)?;
        let id = args.evaluation_id;
        s.evaluations.delete(caller, id).await?;
        let deleted = json!({"message": "evaluation deleted", "evaluation_id": id});
        Ok(deleted)
    })
}

fn list_my_evaluations(s: Services, caller: i64, _args: Value) -> ToolFuture {
    Box::pin(async move { to_value(s.evaluations.list_for_user(caller).await?) })
}

fn list_climate(s: Services, _caller: i64, _args: Value) -> ToolFuture {
    Box::pin(async move { to_value(s.climate.list().await?) })
}

fn get_climate(s: Services, _caller: i64, args: Value) -> ToolFuture {
    Box::pin(async move {
        let args: AdminCodeArgs = serde_json::from_value(args)?;
        to_value(s.climate.get(&args.admin_code).await?)
    })
}

fn add_climate(s: Services, caller: i64, args: Value) -> ToolFuture {
    Box::pin(async move {
        let record: ClimateRecord = serde_json::from_value(args)?;
        to_value(s.climate.add(caller, record).await?)
    })
}

fn list_divisions(s: Services, _caller: i64, _args: Value) -> ToolFuture {
    Box::pin(async move { to_value(s.divisions.list().await?) })
}

fn get_division(s: Services, _caller: i64, args: Value) -> ToolFuture {
    Box::pin(async move {
        let args: AdminCodeArgs = serde_json::from_value(args)?;
        to_value(s.divisions.get(&args.admin_code).await?)
    })
}

fn add_division(s: Services, caller: i64, args: Value) -> ToolFuture {
    Box::pin(async move {
        let division: NewAdminDivision = serde_json::from_value(args)?;
        to_value(s.divisions.add(caller, division).await?)
    })
}

fn list_users(s: Services, _caller: i64, _args: Value) -> ToolFuture {
    Box::pin(async move { to_value(s.users.list().await?) })
}

fn geocode(s: Services, _caller: i64, args: Value) -> ToolFuture {
    Box::pin(async move {
        let args: GeocodeArgs = serde_json::from_value(args)?;
        to_value(s.geo.geocode(&args.address, args.city.as_deref()).await?)
    })
}

fn plan_transit_route(s: Services, _caller: i64, args: Value) -> ToolFuture {
    Box::pin(async move {
        let args: TransitArgs = serde_json::from_value(args)?;
        let mut route = s
            .geo
            .transit_route(
                &args.origin,
                &args.destination,
                &args.city,
                args.cityd.as_deref(),
            )
            .await?;
        strip_segments(&mut route);
        Ok(route)
    })
}

/// Every assistant tool, bound to `caller`
pub fn service_tools(services: &Services, caller: i64) -> Vec<Arc<dyn Tool>> {
    let specs: [(&'static str, &'static str, &'static Lazy<Value>, Handler); 19] = [
        (
            "list_colleges",
            "List every college",
            &NO_ARGS_SCHEMA,
            list_colleges,
        ),
        (
            "get_college",
            "Get one college with its evaluations",
            &COLLEGE_ID_SCHEMA,
            get_college,
        ),
        (
            "search_colleges",
            "Filter colleges; name matches a substring, other fields must match exactly",
            &SEARCH_COLLEGES_SCHEMA,
            search_colleges,
        ),
        (
            "add_college",
            "Add a college. Admins publish it directly; other users submit it for review.",
            &ADD_COLLEGE_SCHEMA,
            add_college,
        ),
        (
            "update_college",
            "Change fields of a college. Admins apply directly; other users submit a review.",
            &UPDATE_COLLEGE_SCHEMA,
            update_college,
        ),
        (
            "delete_college",
            "Delete a college and its evaluations (admin only)",
            &COLLEGE_ID_SCHEMA,
            delete_college,
        ),
        (
            "add_evaluation",
            "Write an evaluation of a college as the current user",
            &ADD_EVALUATION_SCHEMA,
            add_evaluation,
        ),
        (
            "update_evaluation",
            "Change one of the current user's evaluations",
            &UPDATE_EVALUATION_SCHEMA,
            update_evaluation,
        ),
        (
            "delete_evaluation",
            "Delete one of the current user's evaluations",
            &EVALUATION_ID_SCHEMA,
            delete_evaluation,
        ),
        (
            "list_my_evaluations",
            "List the current user's evaluations",
            &NO_ARGS_SCHEMA,
            list_my_evaluations,
        ),
        (
            "list_climate",
            "List all climate data",
            &NO_ARGS_SCHEMA,
            list_climate,
        ),
        (
            "get_climate",
            "Monthly temperature and precipitation for one administrative division",
            &ADMIN_CODE_SCHEMA,
            get_climate,
        ),
        (
            "add_climate",
            "Add climate data for an administrative division (admin only)",
            &ADD_CLIMATE_SCHEMA,
            add_climate,
        ),
        (
            "list_admin_divisions",
            "List all administrative divisions",
            &NO_ARGS_SCHEMA,
            list_divisions,
        ),
        (
            "get_admin_division",
            "Get one administrative division",
            &ADMIN_CODE_SCHEMA,
            get_division,
        ),
        (
            "add_admin_division",
            "Add an administrative division (admin only)",
            &ADD_DIVISION_SCHEMA,
            add_division,
        ),
        (
            "list_users",
            "List registered users",
            &NO_ARGS_SCHEMA,
            list_users,
        ),
        (
            "geocode",
            "Look up coordinates, adcode and citycode of an address",
            &GEOCODE_SCHEMA,
            geocode,
        ),
        (
            "plan_transit_route",
            "Plan public transit between two \"lng,lat\" points with distance, duration and cost",
            &TRANSIT_SCHEMA,
            plan_transit_route,
        ),
    ];

    specs
        .into_iter()
        .map(|(name, description, schema, handler)| {
            Arc::new(ServiceTool {
                name,
                description,
                schema,
                handler,
                services: services.clone(),
                caller,
            }) as Arc<dyn Tool>
        })
        .collect()
}
