// SPDX-License-Identifier: MIT

//! REST handlers. Each one extracts, calls one service and serializes.

use super::extract::{PathParams, Payload, QueryParams};
use super::AppState;
use crate::college::auth::AuthUser;
use crate::college::entity::{
    AdminDivision, ClimateRecord, College, CollegeDetail, CollegePatch, CollegeQuery, CollegeReview,
    EntityType, Evaluation, EvaluationInput, LoginRequest, ModificationHistory, NewAdminDivision,
    NewCollege, PendingCollege, PendingReview, RegisterRequest, ReviewDecision, ReviewStatus, Role,
    User, WriteOutcome,
};
use crate::error::AppError;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

type ApiResult<T> = Result<Json<T>, AppError>;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// --- Users ---

pub async fn register(
    State(state): State<AppState>,
    Payload(request): Payload<RegisterRequest>,
) -> ApiResult<Value> {
    let user = state.services.users.register(request).await?;
    Ok(Json(json!({
        "message": "User registered successfully",
        "user_id": user.user_id
    })))
}

/// Login response: the user plus a bearer token under `Authorization`
#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: User,
    #[serde(rename = "Authorization")]
    pub authorization: String,
}

pub async fn login(
    State(state): State<AppState>,
    Payload(request): Payload<LoginRequest>,
) -> ApiResult<LoginResponse> {
    if request.username.is_empty() || request.password.is_empty() {
        return Err(AppError::validation("username and password are required"));
    }
    let user = state
        .services
        .users
        .login(&request.username, &request.password)
        .await?
        .ok_or_else(|| AppError::unauthorized("incorrect username or password"))?;
    let authorization = state.tokens.issue(&user)?;
    log::info!("user {} logged in", user.username);
    Ok(Json(LoginResponse {
        user,
        authorization,
    }))
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    Ok(Json(state.services.users.list().await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    PathParams(user_id): PathParams<i64>,
) -> ApiResult<User> {
    Ok(Json(state.services.users.get(user_id).await?))
}

#[derive(Deserialize)]
pub struct RoleChange {
    pub role: Role,
}

pub async fn set_role(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(user_id): PathParams<i64>,
    Payload(change): Payload<RoleChange>,
) -> ApiResult<User> {
    let user = state
        .services
        .users
        .set_role(caller.user_id, user_id, change.role)
        .await?;
    Ok(Json(user))
}

// --- Colleges ---

pub async fn list_colleges(State(state): State<AppState>) -> ApiResult<Vec<College>> {
    Ok(Json(state.services.colleges.list().await?))
}

pub async fn search_colleges(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<CollegeQuery>,
) -> ApiResult<Vec<College>> {
    Ok(Json(state.services.colleges.search(query).await?))
}

pub async fn get_college(
    State(state): State<AppState>,
    PathParams(college_id): PathParams<i64>,
) -> ApiResult<CollegeDetail> {
    Ok(Json(state.services.colleges.detail(college_id).await?))
}

pub async fn add_college(
    State(state): State<AppState>,
    caller: AuthUser,
    Payload(new): Payload<NewCollege>,
) -> ApiResult<WriteOutcome> {
    let outcome = state.services.colleges.add(caller.user_id, new).await?;
    Ok(Json(outcome))
}

pub async fn update_college(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(college_id): PathParams<i64>,
    Payload(patch): Payload<CollegePatch>,
) -> ApiResult<WriteOutcome> {
    let outcome = state
        .services
        .colleges
        .update(caller.user_id, college_id, patch)
        .await?;
    Ok(Json(outcome))
}

pub async fn delete_college(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(college_id): PathParams<i64>,
) -> ApiResult<Value> {
    state
        .services
        .colleges
        .delete(caller.user_id, college_id)
        .await?;
    Ok(Json(json!({
        "message": "college and its evaluations deleted",
        "college_id": college_id
    })))
}

// --- Evaluations ---

pub async fn add_evaluation(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(college_id): PathParams<i64>,
    Payload(input): Payload<EvaluationInput>,
) -> ApiResult<Evaluation> {
    let evaluation = state
        .services
        .evaluations
        .add(caller.user_id, college_id, input)
        .await?;
    Ok(Json(evaluation))
}

pub async fn my_evaluations(
    State(state): State<AppState>,
    caller: AuthUser,
) -> ApiResult<Vec<Evaluation>> {
    let evaluations = state
        .services
        .evaluations
        .list_for_user(caller.user_id)
        .await?;
    Ok(Json(evaluations))
}

pub async fn update_evaluation(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(evaluation_id): PathParams<i64>,
    Payload(input): Payload<EvaluationInput>,
) -> ApiResult<Evaluation> {
    let evaluation = state
        .services
        .evaluations
        .update(caller.user_id, evaluation_id, input)
        .await?;
    Ok(Json(evaluation))
}

pub async fn delete_evaluation(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(evaluation_id): PathParams<i64>,
) -> ApiResult<Value> {
    state
        .services
        .evaluations
        .delete(caller.user_id, evaluation_id)
        .await?;
    Ok(Json(json!({
        "message": "evaluation deleted",
        "evaluation_id": evaluation_id
    })))
}

// --- Reviews ---

pub async fn pending_reviews(
    State(state): State<AppState>,
    caller: AuthUser,
) -> ApiResult<Vec<PendingReview>> {
    Ok(Json(state.services.reviews.pending(caller.user_id).await?))
}

pub async fn my_submissions(
    State(state): State<AppState>,
    caller: AuthUser,
) -> ApiResult<Vec<CollegeReview>> {
    let submissions = state.services.reviews.submissions(caller.user_id).await?;
    Ok(Json(submissions))
}

pub async fn pending_detail(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(review_id): PathParams<i64>,
) -> ApiResult<PendingCollege> {
    let pending = state
        .services
        .reviews
        .pending_detail(caller.user_id, review_id)
        .await?;
    Ok(Json(pending))
}

#[derive(Deserialize)]
pub struct DecisionParams {
    pub status: String,
    #[serde(default)]
    pub comment: Option<String>,
}

pub async fn decide_review(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(review_id): PathParams<i64>,
    QueryParams(params): QueryParams<DecisionParams>,
) -> ApiResult<ReviewDecision> {
    let status: ReviewStatus = params.status.parse()?;
    let decision = state
        .services
        .reviews
        .decide(caller.user_id, review_id, status, params.comment)
        .await?;
    Ok(Json(decision))
}

// --- History ---

pub async fn entity_history(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams((entity_type, entity_id)): PathParams<(String, i64)>,
) -> ApiResult<Vec<ModificationHistory>> {
    let entity_type: EntityType = entity_type.parse()?;
    let trail = state
        .services
        .history
        .for_entity(caller.user_id, entity_type, entity_id)
        .await?;
    Ok(Json(trail))
}

// --- Climate ---

pub async fn list_climate(State(state): State<AppState>) -> ApiResult<Vec<ClimateRecord>> {
    Ok(Json(state.services.climate.list().await?))
}

pub async fn get_climate(
    State(state): State<AppState>,
    PathParams(admin_code): PathParams<String>,
) -> ApiResult<ClimateRecord> {
    Ok(Json(state.services.climate.get(&admin_code).await?))
}

pub async fn add_climate(
    State(state): State<AppState>,
    caller: AuthUser,
    Payload(record): Payload<ClimateRecord>,
) -> ApiResult<ClimateRecord> {
    let record = state.services.climate.add(caller.user_id, record).await?;
    Ok(Json(record))
}

// --- Administrative divisions ---

pub async fn list_divisions(State(state): State<AppState>) -> ApiResult<Vec<AdminDivision>> {
    Ok(Json(state.services.divisions.list().await?))
}

pub async fn get_division(
    State(state): State<AppState>,
    PathParams(admin_code): PathParams<String>,
) -> ApiResult<AdminDivision> {
    Ok(Json(state.services.divisions.get(&admin_code).await?))
}

pub async fn add_division(
    State(state): State<AppState>,
    caller: AuthUser,
    Payload(division): Payload<NewAdminDivision>,
) -> ApiResult<AdminDivision> {
    let division = state
        .services
        .divisions
        .add(caller.user_id, division)
        .await?;
    Ok(Json(division))
}

