//! Application routing.

use std::fmt;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    /// The wire list; also the landing page.
    WireList,
    NewWire,
    EditWire { id: i64 },
}

impl Route {
    /// Routes that need a signed-in user.
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::Login)
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::WireList => "/".to_string(),
            Route::NewWire => "/wires/new".to_string(),
            Route::EditWire { id } => format!("/wires/{id}"),
        }
    }

    /// Resolve a path. Unknown paths fall back to the list.
    pub fn from_path(path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "/login" => Route::Login,
            "" => Route::WireList,
            "/wires/new" => Route::NewWire,
            other => other
                .strip_prefix("/wires/")
                .and_then(|id| id.parse().ok())
                .map(|id| Route::EditWire { id })
                .unwrap_or(Route::WireList),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Current-route holder shared by everything that can redirect.
#[derive(Clone)]
pub struct Navigator {
    current: watch::Sender<Route>,
}

impl Navigator {
    pub fn new(initial: Route) -> Self {
        let (current, _) = watch::channel(initial);
        Self { current }
    }

    pub fn current(&self) -> Route {
        self.current.borrow().clone()
    }

    pub fn navigate(&self, route: Route) {
        crate::log_debug!("navigate -> {}", route);
        self.current.send_replace(route);
    }

    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.current.subscribe()
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Route::WireList)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_round_trip() {
        for route in [
            Route::Login,
            Route::WireList,
            Route::NewWire,
            Route::EditWire { id: 12 },
        ] {
            assert_eq!(Route::from_path(&route.path()), route);
        }
        assert_eq!(Route::from_path("/nowhere"), Route::WireList);
        assert_eq!(Route::from_path("/wires/abc"), Route::WireList);
    }

    #[test]
    fn navigator_publishes_changes() {
        let nav = Navigator::default();
        let rx = nav.subscribe();
        nav.navigate(Route::Login);
        assert_eq!(*rx.borrow(), Route::Login);
        assert_eq!(nav.current(), Route::Login);
        assert!(!Route::Login.requires_auth());
        assert!(Route::NewWire.requires_auth());
    }
}
