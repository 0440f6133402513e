use crate::auth::{Authenticator, Claims};
use crate::server::ApiError;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use std::marker::PhantomData;

/// A permission an Auth0 access token must grant.
pub trait Permission: Send + Sync + 'static {
    const NAME: &'static str;
}

macro_rules! permissions {
    ($($name:ident => $value:literal,)*) => {
        $(
            #[derive(Debug, Clone, Copy)]
            pub struct $name;

            impl Permission for $name {
                const NAME: &'static str = $value;
            }
        )*
    };
}

permissions! {
    GetDrinks => "get:drinks",
    GetDrinksDetail => "get:drinks-detail",
    PostDrinks => "post:drinks",
    PatchDrinks => "patch:drinks",
    DeleteDrinks => "delete:drinks",
}

/// Verified caller holding permission `P`.
#[derive(Debug, Clone)]
pub struct Authorized<P> {
    claims: Claims,
    _permission: PhantomData<P>,
}

impl<P> Authorized<P> {
    pub fn claims(&self) -> &Claims {
        &self.claims
    }
}

#[async_trait]
impl<S, P> FromRequestParts<S> for Authorized<P>
where
    Authenticator: FromRef<S>,
    S: Send + Sync,
    P: Permission,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = Authenticator::from_ref(state);

        // Values that are not visible ASCII are treated as absent.
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        let token = Authenticator::bearer_token(header)?;
        let claims = auth.verify(token)?;
        claims.check_permission(P::NAME)?;

        tracing::debug!(sub = %claims.sub, permission = P::NAME, "request authorized");

        Ok(Authorized {
            claims,
            _permission: PhantomData,
        })
    }
}
