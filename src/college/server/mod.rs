// SPDX-License-Identifier: MIT

//! HTTP surface of the college-db service

mod chat;
pub mod extract;
mod handlers;

use crate::adk::model::openai::OpenAIModel;
use crate::adk::model::{GenerationConfig, Model};
use crate::college::assistant::Assistant;
use crate::college::auth::TokenIssuer;
use crate::college::geo::{AmapClient, GeoService};
use crate::college::service::Services;
use crate::college::store::Store;
use crate::config::Settings;
use crate::error::AppError;
use axum::extract::FromRef;
use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub use chat::ChatRequest;

/// Shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub tokens: TokenIssuer,
    pub assistant: Arc<Assistant>,
}

impl FromRef<AppState> for TokenIssuer {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

impl AppState {
    /// Wire services, the assistant and token handling around `store`
    pub fn new(
        settings: &Settings,
        store: Store,
        geo: Arc<dyn GeoService>,
        model: Arc<dyn Model>,
    ) -> Self {
        let generation = GenerationConfig {
            temperature: settings.model.temperature,
            ..GenerationConfig::default()
        };
        let services = Services::new(store, geo, model.clone(), generation.clone());
        let assistant = Assistant::new(
            services.clone(),
            model,
            generation,
            settings.model.max_turns,
            Duration::from_secs(settings.server.chat_timeout_secs),
        );

        Self {
            services,
            tokens: TokenIssuer::new(&settings.auth.jwt_secret, settings.auth.token_ttl_hours),
            assistant: Arc::new(assistant),
        }
    }

    /// Open the database and build the AMap and model clients from settings
    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        let store = Store::open(&settings.database.path)?;
        let geo: Arc<dyn GeoService> = Arc::new(AmapClient::new(&settings.amap)?);
        let model: Arc<dyn Model> = Arc::new(OpenAIModel::new(&settings.model)?);
        log::info!(
            "Using model {} at {}",
            settings.model.name,
            settings.model.base_url
        );
        Ok(Self::new(settings, store, geo, model))
    }
}

/// Request spans and one line per response at INFO, the level `main` logs at
pub fn build_router(state: AppState) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/user", get(handlers::list_users))
        .route("/user/{user_id}", get(handlers::get_user))
        .route("/user/{user_id}/role", put(handlers::set_role))
        .route(
            "/colleges/",
            get(handlers::list_colleges).post(handlers::add_college),
        )
        .route("/colleges/search/", get(handlers::search_colleges))
        .route("/colleges/evaluations/", get(handlers::my_evaluations))
        .route(
            "/colleges/evaluations/{evaluation_id}",
            put(handlers::update_evaluation).delete(handlers::delete_evaluation),
        )
        .route("/colleges/review/pending", get(handlers::pending_reviews))
        .route("/colleges/review/mine", get(handlers::my_submissions))
        .route(
            "/colleges/review/{review_id}",
            get(handlers::pending_detail).put(handlers::decide_review),
        )
        .route(
            "/colleges/{college_id}",
            get(handlers::get_college).delete(handlers::delete_college),
        )
        .route("/colleges/{college_id}/", put(handlers::update_college))
        .route(
            "/colleges/{college_id}/evaluations/",
            post(handlers::add_evaluation),
        )
        .route(
            "/history/{entity_type}/{entity_id}",
            get(handlers::entity_history),
        )
        .route(
            "/climate/",
            get(handlers::list_climate).post(handlers::add_climate),
        )
        .route("/climate/{admin_code}", get(handlers::get_climate))
        .route(
            "/admin/",
            get(handlers::list_divisions).post(handlers::add_division),
        )
        .route("/admin/{admin_code}", get(handlers::get_division))
        .route("/server", post(chat::chat))
        .route("/server/traffic/{college_id}", post(chat::traffic_analysis))
        .route("/server/climate/{college_id}", post(chat::climate_analysis))
        .layer(trace)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(settings: &Settings) -> Result<(), AppError> {
    settings.validate()?;
    let state = AppState::from_settings(settings)?;
    let app = build_router(state);

    let addr = format!("{}:{}", settings.server.bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
