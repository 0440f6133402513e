use crate::{server::ApiError, EnvironmentConfig};
use axum::{
    extract::State,
    response::{IntoResponse, Redirect},
};
use tracing::instrument;

#[instrument(skip_all)]
pub async fn logout(
    State(environment): State<EnvironmentConfig>,
) -> Result<impl IntoResponse, ApiError> {
    let logout_url = environment.auth0().logout_url()?;
    Ok(Redirect::temporary(logout_url.as_str()))
}
