use crate::server::ApiError;
use askama::Template;
use axum::{
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};

pub mod drinks;
pub mod environment;
pub mod login;
pub mod logout;

pub use drinks::{create_drink, delete_drink, drinks_detail, list_drinks, update_drink};
pub use environment::{environment_js, environment_json};
pub use login::login;
pub use logout::logout;

pub(crate) struct ScriptTemplate<T>(T);

impl<T> IntoResponse for ScriptTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(script) => ([(CONTENT_TYPE, "application/javascript")], script).into_response(),
            Err(err) => ApiError::from(err).into_response(),
        }
    }
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
