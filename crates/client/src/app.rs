//! Application context: the long-lived services every view shares.

use std::sync::Arc;

use crate::api_client::ApiClient;
use crate::auth_session::AuthSession;
use crate::config::ClientConfig;
use crate::routes::{Navigator, Route};
use crate::storage::{Storage, StorageError};
use crate::stores::QueryCache;
use crate::views::{AuthController, FormMode, WireFormController, WireListView};
use crate::ws::{Connector, RealtimeChannel, TungsteniteConnector};

#[derive(Clone)]
pub struct AppContext {
    pub config: ClientConfig,
    pub session: AuthSession,
    pub navigator: Navigator,
    pub api: ApiClient,
    pub cache: QueryCache,
    pub channel: RealtimeChannel,
}

impl AppContext {
    pub fn new(config: ClientConfig, storage: Arc<dyn Storage>) -> Result<Self, StorageError> {
        Self::with_connector(config, storage, Arc::new(TungsteniteConnector))
    }

    /// Build the context with a custom socket connector.
    pub fn with_connector(
        config: ClientConfig,
        storage: Arc<dyn Storage>,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, StorageError> {
        let session = AuthSession::load(storage)?;
        let start = if session.is_authenticated() {
            Route::WireList
        } else {
            Route::Login
        };
        let navigator = Navigator::new(start);
        let api = ApiClient::new(config.api_base_url.clone(), session.clone(), navigator.clone());
        let cache = QueryCache::new(config.stale_time);
        let channel =
            RealtimeChannel::new(config.realtime_url(), config.reconnect.clone(), connector);

        Ok(Self {
            config,
            session,
            navigator,
            api,
            cache,
            channel,
        })
    }

    pub fn auth(&self) -> AuthController {
        AuthController::new(self.api.clone(), self.cache.clone(), self.navigator.clone())
    }

    pub fn wire_list(&self) -> WireListView {
        WireListView::new(
            self.api.clone(),
            self.cache.clone(),
            self.channel.clone(),
            self.config.features,
        )
    }

    pub fn wire_form(&self, mode: FormMode) -> WireFormController {
        WireFormController::new(
            self.api.clone(),
            self.cache.clone(),
            self.navigator.clone(),
            mode,
        )
    }
}
