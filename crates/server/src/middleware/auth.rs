//! Bearer-token authentication.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use wiredesk_shared::User;

use crate::error::ApiProblem;
use crate::state::AppState;

/// The user behind the request's `Authorization: Bearer` token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

fn bearer_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return None;
    }
    Some(token.trim().to_string())
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiProblem;

    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let app_state = AppState::from_ref(state);
        let token = bearer_token(parts);

        async move {
            let token =
                token.ok_or_else(|| ApiProblem::unauthorized("Not authenticated"))?;
            let user = app_state
                .store
                .user_for_access_token(&token)
                .await
                .ok_or_else(|| ApiProblem::unauthorized("Could not validate credentials"))?;
            Ok(AuthUser(user))
        }
    }
}
