//! Wire list: pagination, status filter, live invalidation and delete.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use wiredesk_shared::{
    ApiError, ListParams, RealtimeEvent, WireListResponse, WireStatus, DEFAULT_PAGE_SIZE,
};

use crate::api_client::ApiClient;
use crate::config::FeatureFlags;
use crate::export::{self, ExportError};
use crate::stores::{QueryCache, QueryKey};
use crate::ws::{RealtimeChannel, Subscription};

pub const PAGE_SIZE_OPTIONS: [u32; 3] = [10, 20, 50];

const DELETE_PROMPT: &str = "Are you sure you want to delete this wire?";

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    fn confirm(&self, message: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

/// Chip colour for a status badge.
pub fn status_color(status: WireStatus) -> &'static str {
    match status {
        WireStatus::Completed => "success",
        WireStatus::Processing => "info",
        WireStatus::Failed => "error",
        WireStatus::Pending => "default",
    }
}

struct ListState {
    page: u32,
    page_size: u32,
    status_filter: Option<WireStatus>,
    last: Option<WireListResponse>,
}

/// Controller behind the wire table.
///
/// The view is live from construction until [`WireListView::unmount`]. After
/// that, loads resolve to `Ok(None)` and realtime events are ignored.
pub struct WireListView {
    api: ApiClient,
    cache: QueryCache,
    channel: RealtimeChannel,
    features: FeatureFlags,
    state: Mutex<ListState>,
    alive: Arc<AtomicBool>,
    subscription: Mutex<Option<Subscription>>,
}

impl WireListView {
    pub fn new(
        api: ApiClient,
        cache: QueryCache,
        channel: RealtimeChannel,
        features: FeatureFlags,
    ) -> Self {
        Self {
            api,
            cache,
            channel,
            features,
            state: Mutex::new(ListState {
                page: 1,
                page_size: DEFAULT_PAGE_SIZE,
                status_filter: None,
                last: None,
            }),
            alive: Arc::new(AtomicBool::new(true)),
            subscription: Mutex::new(None),
        }
    }

    fn state(&self) -> MutexGuard<'_, ListState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn page(&self) -> u32 {
        self.state().page
    }

    pub fn page_size(&self) -> u32 {
        self.state().page_size
    }

    pub fn status_filter(&self) -> Option<WireStatus> {
        self.state().status_filter
    }

    /// Whether the status filter control is shown.
    pub fn filters_enabled(&self) -> bool {
        self.features.advanced_filters
    }

    pub fn params(&self) -> ListParams {
        let state = self.state();
        ListParams {
            page: state.page,
            page_size: state.page_size,
            status: state.status_filter,
        }
    }

    pub fn query_key(&self) -> QueryKey {
        QueryKey::wire_list(&self.params())
    }

    /// Jump to a 1-indexed page. Page 0 is treated as 1.
    pub fn set_page(&self, page: u32) {
        self.state().page = page.max(1);
    }

    pub fn next_page(&self) {
        let mut state = self.state();
        state.page = state.page.saturating_add(1);
    }

    pub fn previous_page(&self) {
        let mut state = self.state();
        state.page = state.page.saturating_sub(1).max(1);
    }

    /// Change the page size and go back to page 1. Sizes outside
    /// [`PAGE_SIZE_OPTIONS`] are rejected.
    pub fn set_page_size(&self, page_size: u32) -> bool {
        if !PAGE_SIZE_OPTIONS.contains(&page_size) {
            crate::log_warn!("Ignoring unsupported page size {}", page_size);
            return false;
        }
        let mut state = self.state();
        state.page_size = page_size;
        state.page = 1;
        true
    }

    /// Change the filter and go back to page 1, even if the filter is unchanged.
    pub fn set_status_filter(&self, status: Option<WireStatus>) {
        let mut state = self.state();
        state.status_filter = status;
        state.page = 1;
    }

    pub fn is_mounted(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Connect the realtime channel and start invalidating on `wire_update`.
    pub fn mount(&self) {
        self.alive.store(true, Ordering::SeqCst);
        self.channel.connect();

        let mut subscription = self
            .subscription
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if subscription.is_some() {
            return;
        }

        let cache = self.cache.clone();
        let alive = Arc::clone(&self.alive);
        *subscription = Some(self.channel.on_message(move |event: &RealtimeEvent| {
            if !alive.load(Ordering::SeqCst) {
                return;
            }
            if let RealtimeEvent::WireUpdate(update) = event {
                crate::log_debug!(
                    "Wire {} is now {}; refreshing list",
                    update.wire_id,
                    update.status
                );
                cache.invalidate(&QueryKey::wires());
                cache.invalidate(&QueryKey::wire(update.wire_id));
            }
        }));
    }

    /// Stop reacting, detach from the channel and close it.
    pub fn unmount(&self) {
        self.alive.store(false, Ordering::SeqCst);
        let subscription = self
            .subscription
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }
        self.channel.disconnect();
    }

    /// Read the current page through the cache. `Ok(None)` once unmounted.
    pub async fn load(&self) -> Result<Option<WireListResponse>, ApiError> {
        let params = self.params();
        let key = QueryKey::wire_list(&params);
        let api = self.api.clone();
        let result = self
            .cache
            .fetch(&key, move || async move { api.list_wires(&params).await })
            .await;

        if !self.is_mounted() {
            return Ok(None);
        }
        let response = result?;
        self.state().last = Some(response.clone());
        Ok(Some(response))
    }

    /// Wait for the cache revision to move, then reload the current page.
    ///
    /// The change is marked seen before loading, so an invalidation that
    /// lands while the load is in flight wakes the next call. `None` once
    /// the cache is gone.
    pub async fn next_update(
        &self,
        revisions: &mut watch::Receiver<u64>,
    ) -> Option<Result<Option<WireListResponse>, ApiError>> {
        revisions.changed().await.ok()?;
        revisions.borrow_and_update();
        Some(self.load().await)
    }

    /// Force a refetch of every page.
    pub async fn refresh(&self) -> Result<Option<WireListResponse>, ApiError> {
        self.cache.invalidate(&QueryKey::wires());
        self.load().await
    }

    /// Delete after confirmation. `Ok(false)` when the user declined.
    pub async fn delete(&self, id: i64, confirm: &impl Confirm) -> Result<bool, ApiError> {
        if !confirm.confirm(DELETE_PROMPT) {
            return Ok(false);
        }
        self.api.delete_wire(id).await?;
        crate::log_info!("Deleted wire {}", id);
        self.cache.invalidate(&QueryKey::wires());
        Ok(true)
    }

    pub fn last_response(&self) -> Option<WireListResponse> {
        self.state().last.clone()
    }

    /// Pages available for the last loaded response; 0 before any load.
    pub fn page_count(&self) -> u64 {
        self.state()
            .last
            .as_ref()
            .map_or(0, WireListResponse::page_count)
    }

    /// CSV of the page currently shown.
    pub fn export_csv(&self) -> Result<String, ExportError> {
        if !self.features.csv_export {
            return Err(ExportError::Disabled);
        }
        let state = self.state();
        let last = state.last.as_ref().ok_or(ExportError::NothingLoaded)?;
        export::wires_to_csv(&last.wires)
    }
}

impl Drop for WireListView {
    fn drop(&mut self) {
        let mounted = self
            .subscription
            .get_mut()
            .map_or(false, |subscription| subscription.is_some());
        if mounted {
            self.unmount();
        }
    }
}
