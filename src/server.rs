use crate::{
    auth::{AuthError, Authenticator},
    environment::ConfigError,
    handler,
    store::{DrinkStore, StoreError},
    EnvironmentConfig, Settings,
};
use axum::{
    extract::FromRef,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::Span;

pub async fn start_server(
    environment: &EnvironmentConfig,
    settings: Settings,
) -> anyhow::Result<()> {
    environment.validate()?;

    let addr = match settings.bind {
        Some(addr) => addr,
        None => environment.socket_addr().await?,
    };

    let authenticator = Authenticator::discover(environment.auth0()).await?;
    let store = DrinkStore::new();
    store.reset(settings.seed).await;

    let app = router(AppState::new(authenticator, store, environment.clone()));

    // run it
    tracing::debug!("listening on {}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/drinks", get(handler::list_drinks).post(handler::create_drink))
        .route("/drinks-detail", get(handler::drinks_detail))
        .route(
            "/drinks/:id",
            patch(handler::update_drink).delete(handler::delete_drink),
        )
        .route("/environment", get(handler::environment_json))
        .route("/environment.js", get(handler::environment_js))
        .route("/login", get(handler::login))
        .route("/logout", get(handler::logout))
        .fallback(handler::not_found)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .on_request(|request: &Request<_>, _span: &Span| {
                    tracing::info!("{} {}", request.method(), request.uri());
                })
                .on_response(|response: &Response, latency: Duration, _span: &Span| {
                    tracing::info!("{} in {:?}", response.status(), latency);
                }),
        )
}

#[derive(Clone)]
pub struct AppState {
    authenticator: Authenticator,
    store: DrinkStore,
    environment: EnvironmentConfig,
}

impl AppState {
    pub fn new(
        authenticator: Authenticator,
        store: DrinkStore,
        environment: EnvironmentConfig,
    ) -> Self {
        Self {
            authenticator,
            store,
            environment,
        }
    }
}

impl FromRef<AppState> for Authenticator {
    fn from_ref(state: &AppState) -> Self {
        state.authenticator.clone()
    }
}

impl FromRef<AppState> for DrinkStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for EnvironmentConfig {
    fn from_ref(state: &AppState) -> Self {
        state.environment.clone()
    }
}

/// Every failure a route can answer with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("resource not found")]
    NotFound,
    #[error("unprocessable: {0}")]
    Unprocessable(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("failed to render template: {0}")]
    Template(#[from] askama::Error),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound,
            err => ApiError::Unprocessable(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Auth(err) => (
                err.status,
                json!({
                    "success": false,
                    "error": err.status.as_u16(),
                    "code": err.code,
                    "message": err.description,
                }),
            ),
            ApiError::NotFound => envelope(StatusCode::NOT_FOUND, "resource not found"),
            ApiError::Unprocessable(reason) => {
                tracing::debug!("unprocessable request: {}", reason);
                envelope(StatusCode::UNPROCESSABLE_ENTITY, "unprocessable")
            }
            ApiError::Config(_) | ApiError::Serialization(_) | ApiError::Template(_) => {
                tracing::error!("{}", self);
                envelope(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        };

        (status, Json(body)).into_response()
    }
}

fn envelope(status: StatusCode, message: &str) -> (StatusCode, serde_json::Value) {
    (
        status,
        json!({
            "success": false,
            "error": status.as_u16(),
            "message": message,
        }),
    )
}
