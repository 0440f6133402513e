use super::ScriptTemplate;
use crate::{server::ApiError, EnvironmentConfig};
use askama::Template;
use axum::{extract::State, response::IntoResponse, Json};
use tracing::instrument;

/// `environment.ts` module for the front end, with every string JSON-quoted.
#[derive(Template)]
#[template(path = "environment.js", escape = "none")]
struct EnvironmentTemplate {
    production: bool,
    api_server_url: String,
    url: String,
    audience: String,
    client_id: String,
    callback_url: String,
}

impl EnvironmentTemplate {
    fn new(environment: &EnvironmentConfig) -> Result<Self, serde_json::Error> {
        let auth0 = environment.auth0();

        Ok(Self {
            production: environment.production(),
            api_server_url: serde_json::to_string(environment.api_server_url())?,
            url: serde_json::to_string(auth0.url())?,
            audience: serde_json::to_string(auth0.audience())?,
            client_id: serde_json::to_string(auth0.client_id())?,
            callback_url: serde_json::to_string(auth0.callback_url())?,
        })
    }
}

#[instrument(skip_all)]
pub async fn environment_json(
    State(environment): State<EnvironmentConfig>,
) -> Json<EnvironmentConfig> {
    Json(environment)
}

#[instrument(skip_all)]
pub async fn environment_js(
    State(environment): State<EnvironmentConfig>,
) -> Result<impl IntoResponse, ApiError> {
    let template = EnvironmentTemplate::new(&environment)?;
    Ok(ScriptTemplate(template))
}
