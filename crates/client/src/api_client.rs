//! HTTP API client with bearer-token authentication.

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use wiredesk_shared::{
    ApiError, AuthTokens, ListParams, LoginRequest, RegisterRequest, User, Wire, WireCreate,
    WireListResponse, WireUpdate,
};

use crate::auth_session::{AuthSession, Session};
use crate::routes::{Navigator, Route};

/// HTTP client for the wire management REST API.
///
/// Every request carries the session's access token. A 401 from any endpoint
/// signs the user out and sends them to the login route before the error is
/// returned to the caller.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: AuthSession,
    navigator: Navigator,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: impl Into<String>, session: AuthSession, navigator: Navigator) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            session,
            navigator,
        }
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if self.base_url.is_empty() {
            if path.starts_with('/') {
                path.to_string()
            } else {
                format!("/{path}")
            }
        } else {
            let base = self.base_url.trim_end_matches('/');
            let path = path.trim_start_matches('/');
            format!("{base}/{path}")
        }
    }

    /// Attach credentials, send, and map the status. Returns the raw body.
    async fn execute(&self, mut rb: RequestBuilder) -> Result<String, ApiError> {
        if let Some(token) = self.session.access_token() {
            rb = rb.bearer_auth(token);
        }

        let resp = rb.send().await.map_err(|e| ApiError::Network(e.to_string()))?;

        let status = resp.status().as_u16();
        let is_success = resp.status().is_success();

        if status == 401 {
            self.handle_unauthorized();
        }

        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("failed to read body: {e}")))?;

        if !is_success {
            return Err(ApiError::Http { status, body: text });
        }

        Ok(text)
    }

    fn handle_unauthorized(&self) {
        crate::log_warn!("Request rejected with 401; clearing session");
        if let Err(e) = self.session.clear() {
            crate::log_error!("Failed to clear stored session: {}", e);
        }
        self.navigator.navigate(Route::Login);
    }

    fn decode<TRes: DeserializeOwned>(text: &str) -> Result<TRes, ApiError> {
        let text = if text.is_empty() { "null" } else { text };
        serde_json::from_str(text).map_err(|e| ApiError::Deserialize(e.to_string()))
    }

    /// Make an authenticated GET request
    pub async fn get_json<TRes: DeserializeOwned>(&self, path: &str) -> Result<TRes, ApiError> {
        let text = self.execute(self.client.get(self.url(path))).await?;
        Self::decode(&text)
    }

    /// Make an authenticated GET request with query parameters
    pub async fn get_json_with_query<TQuery: Serialize + ?Sized, TRes: DeserializeOwned>(
        &self,
        path: &str,
        query: &TQuery,
    ) -> Result<TRes, ApiError> {
        let text = self
            .execute(self.client.get(self.url(path)).query(query))
            .await?;
        Self::decode(&text)
    }

    /// Make an authenticated POST request with JSON body
    pub async fn post_json<TReq: Serialize + ?Sized, TRes: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TRes, ApiError> {
        let text = self
            .execute(self.client.post(self.url(path)).json(body))
            .await?;
        Self::decode(&text)
    }

    /// Make an authenticated PUT request with JSON body
    pub async fn put_json<TReq: Serialize + ?Sized, TRes: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TRes, ApiError> {
        let text = self
            .execute(self.client.put(self.url(path)).json(body))
            .await?;
        Self::decode(&text)
    }

    /// Make an authenticated DELETE request
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(self.client.delete(self.url(path))).await?;
        Ok(())
    }

    // --- Auth ---

    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        self.post_json("/api/auth/register", request).await
    }

    /// Log in and persist the returned token pair.
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthTokens, ApiError> {
        let tokens: AuthTokens = self.post_json("/api/auth/login", request).await?;
        if let Err(e) = self.session.save(Session::from(tokens.clone())) {
            crate::log_error!("Signed in but could not persist the session: {}", e);
        }
        Ok(tokens)
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.get_json("/api/auth/me").await
    }

    /// Drop the stored tokens. No request is made.
    pub fn logout(&self) {
        if let Err(e) = self.session.clear() {
            crate::log_error!("Failed to clear stored session: {}", e);
        }
    }

    // --- Wires ---

    pub async fn list_wires(&self, params: &ListParams) -> Result<WireListResponse, ApiError> {
        self.get_json_with_query("/api/wires", params).await
    }

    pub async fn get_wire(&self, id: i64) -> Result<Wire, ApiError> {
        self.get_json(&format!("/api/wires/{id}")).await
    }

    pub async fn create_wire(&self, wire: &WireCreate) -> Result<Wire, ApiError> {
        self.post_json("/api/wires", wire).await
    }

    pub async fn update_wire(&self, id: i64, update: &WireUpdate) -> Result<Wire, ApiError> {
        self.put_json(&format!("/api/wires/{id}"), update).await
    }

    pub async fn delete_wire(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/api/wires/{id}")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn client(base: &str) -> ApiClient {
        let session = AuthSession::load(Arc::new(MemoryStorage::new())).unwrap();
        ApiClient::new(base, session, Navigator::default())
    }

    #[test]
    fn joins_urls() {
        let api = client("http://localhost:8000/");
        assert_eq!(api.url("/api/wires"), "http://localhost:8000/api/wires");
        assert_eq!(api.url("api/wires"), "http://localhost:8000/api/wires");
        assert_eq!(api.url("https://other/x"), "https://other/x");

        let relative = client("");
        assert_eq!(relative.url("api/wires"), "/api/wires");
    }

    #[test]
    fn empty_body_decodes_as_unit() {
        ApiClient::decode::<()>("").unwrap();
        assert!(matches!(
            ApiClient::decode::<Wire>("{}"),
            Err(ApiError::Deserialize(_))
        ));
    }

    #[tokio::test]
    async fn unauthorized_signs_out_even_if_the_body_is_cut_short() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = stream.read(&mut request).await;
            // Promise more body than is sent, then hang up.
            stream
                .write_all(b"HTTP/1.1 401 Unauthorized\r\ncontent-length: 100\r\n\r\n{\"detail\"")
                .await
                .unwrap();
            stream.shutdown().await.unwrap();
            let _ = stream.read(&mut request).await;
        });

        let navigator = Navigator::new(Route::WireList);
        let session = AuthSession::load(Arc::new(MemoryStorage::new())).unwrap();
        session
            .save(Session {
                access_token: "expired".into(),
                refresh_token: "expired".into(),
            })
            .unwrap();
        let api = ApiClient::new(format!("http://{addr}"), session.clone(), navigator.clone());

        let err = api.current_user().await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
        assert!(!session.is_authenticated());
        assert_eq!(navigator.current(), Route::Login);
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        let api = client("http://127.0.0.1:9");
        let err = api.current_user().await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }
}
