//! Login, registration, logout and the route guard.

use wiredesk_shared::{validate_password, ApiError, LoginRequest, RegisterRequest, User};

use crate::api_client::ApiClient;
use crate::routes::{Navigator, Route};
use crate::stores::{QueryCache, QueryKey};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl AuthError {
    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidInput(message) => message.clone(),
            AuthError::Api(e) if e.is_unauthorized() => "Invalid email or password".to_string(),
            AuthError::Api(e) => e.user_message(),
        }
    }
}

#[derive(Clone)]
pub struct AuthController {
    api: ApiClient,
    cache: QueryCache,
    navigator: Navigator,
}

impl AuthController {
    pub fn new(api: ApiClient, cache: QueryCache, navigator: Navigator) -> Self {
        Self {
            api,
            cache,
            navigator,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.api.session().is_authenticated()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(), AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::InvalidInput(
                "Email and password are required".to_string(),
            ));
        }
        self.api
            .login(&LoginRequest {
                email: email.trim().to_string(),
                password: password.to_string(),
            })
            .await?;
        crate::log_info!("Signed in as {}", email.trim());
        self.cache.invalidate(&QueryKey::current_user());
        self.navigator.navigate(Route::WireList);
        Ok(())
    }

    /// Create an account. The caller still has to log in.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        if !email.contains('@') {
            return Err(AuthError::InvalidInput("Enter a valid email".to_string()));
        }
        if let Some(error) = validate_password(password) {
            return Err(AuthError::InvalidInput(error.message));
        }
        let user = self
            .api
            .register(&RegisterRequest {
                email: email.trim().to_string(),
                password: password.to_string(),
            })
            .await?;
        crate::log_info!("Registered {}", user.email);
        Ok(user)
    }

    /// The signed-in user, cached. `Ok(None)` without a session.
    pub async fn current_user(&self) -> Result<Option<User>, ApiError> {
        if !self.is_authenticated() {
            return Ok(None);
        }
        let api = self.api.clone();
        let user = self
            .cache
            .fetch(&QueryKey::current_user(), move || async move {
                api.current_user().await
            })
            .await?;
        Ok(Some(user))
    }

    pub fn logout(&self) {
        self.api.logout();
        self.cache.clear();
        self.navigator.navigate(Route::Login);
        crate::log_info!("Signed out");
    }

    /// Where `route` actually leads: protected routes need a session.
    pub fn guard(&self, route: Route) -> Route {
        if route.requires_auth() && !self.is_authenticated() {
            Route::Login
        } else {
            route
        }
    }

    /// Navigate through the guard.
    pub fn navigate(&self, route: Route) -> Route {
        let target = self.guard(route);
        self.navigator.navigate(target.clone());
        target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth_session::{AuthSession, Session};
    use crate::storage::MemoryStorage;
    use std::sync::Arc;
    use std::time::Duration;

    fn controller() -> (AuthController, AuthSession, Navigator) {
        let navigator = Navigator::new(Route::Login);
        let session = AuthSession::load(Arc::new(MemoryStorage::new())).unwrap();
        let api = ApiClient::new("http://127.0.0.1:9", session.clone(), navigator.clone());
        let controller = AuthController::new(
            api,
            QueryCache::new(Duration::from_secs(60)),
            navigator.clone(),
        );
        (controller, session, navigator)
    }

    #[test]
    fn guard_redirects_only_without_a_session() {
        let (auth, session, _) = controller();
        assert_eq!(auth.guard(Route::WireList), Route::Login);
        assert_eq!(auth.guard(Route::Login), Route::Login);

        session
            .save(Session {
                access_token: "a".into(),
                refresh_token: "r".into(),
            })
            .unwrap();
        assert_eq!(auth.guard(Route::EditWire { id: 1 }), Route::EditWire { id: 1 });
    }

    #[tokio::test]
    async fn signed_out_user_is_none_without_a_request() {
        let (auth, _, _) = controller();
        assert_eq!(auth.current_user().await, Ok(None));
    }

    #[tokio::test]
    async fn short_password_is_rejected_locally() {
        let (auth, _, _) = controller();
        let err = auth.register("a@b.com", "short").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidInput(_)));
        assert!(err.user_message().contains("between 8 and 100"));
    }

    #[test]
    fn logout_clears_session_and_returns_to_login() {
        let (auth, session, navigator) = controller();
        session
            .save(Session {
                access_token: "a".into(),
                refresh_token: "r".into(),
            })
            .unwrap();
        navigator.navigate(Route::WireList);

        auth.logout();
        assert!(!session.is_authenticated());
        assert_eq!(navigator.current(), Route::Login);
    }
}
