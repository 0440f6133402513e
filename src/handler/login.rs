use crate::{environment::DEFAULT_CALLBACK_PATH, server::ApiError, EnvironmentConfig};
use axum::{
    extract::State,
    response::{IntoResponse, Redirect},
};
use tracing::instrument;

#[instrument(skip_all)]
pub async fn login(
    State(environment): State<EnvironmentConfig>,
) -> Result<impl IntoResponse, ApiError> {
    let login_url = environment.auth0().login_url(DEFAULT_CALLBACK_PATH)?;
    Ok(Redirect::temporary(login_url.as_str()))
}
