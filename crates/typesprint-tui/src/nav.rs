//! Screen routing with a browser-like history stack.

use typesprint_core::auth::LOGIN_ROUTE;

/// Screens of the terminal client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Typing,
    History,
    Login,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Typing => "/",
            Route::History => "/history",
            Route::Login => LOGIN_ROUTE,
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        [Route::Typing, Route::History, Route::Login]
            .into_iter()
            .find(|route| route.path() == path)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Typing => "Typing Test",
            Route::History => "History",
            Route::Login => "Login",
        }
    }

    /// Protected screens sit behind the access gate.
    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Login)
    }
}

/// Navigation history. Never empty.
#[derive(Debug, Clone)]
pub struct Navigator {
    stack: Vec<Route>,
}

impl Navigator {
    pub fn new(start: Route) -> Self {
        Self { stack: vec![start] }
    }

    pub fn current(&self) -> Route {
        self.stack.last().copied().unwrap_or(Route::Typing)
    }

    /// Open `route` on top of the current one. Re-opening the current route is a no-op.
    pub fn push(&mut self, route: Route) {
        if self.current() != route {
            self.stack.push(route);
        }
    }

    /// Swap the current entry for `route`, leaving no trace of the old one.
    pub fn replace(&mut self, route: Route) {
        match self.stack.last_mut() {
            Some(top) => *top = route,
            None => self.stack.push(route),
        }
    }

    /// Return to the previous entry. False when already at the root.
    pub fn back(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }
}
