//! Screen stack: which screen is showing and how to move between them.
//!
//! The forward order is Register → VerifyEmail → HelpRequest → Map.
//! Nothing enforces it. Any route can be navigated to at any time;
//! the order only decides what each screen's primary action offers.

use std::fmt;
use std::iter;

use serde::Deserialize;

/// A screen, addressed by its stable name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
pub enum Route {
    #[default]
    Register,
    VerifyEmail,
    HelpRequest,
    Map,
}

impl Route {
    pub const ALL: [Route; 4] = [
        Route::Register,
        Route::VerifyEmail,
        Route::HelpRequest,
        Route::Map,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Register => "Register",
            Self::VerifyEmail => "VerifyEmail",
            Self::HelpRequest => "HelpRequest",
            Self::Map => "Map",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.name() == name)
    }

    /// Header title, or `None` for a headerless screen.
    pub fn title(self) -> Option<&'static str> {
        match self {
            Self::Register => None,
            Self::VerifyEmail => Some("Verify Email"),
            Self::HelpRequest => Some("Post Help Request"),
            Self::Map => Some("Track Location"),
        }
    }

    /// The screen a forward action leads to.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Register => Some(Self::VerifyEmail),
            Self::VerifyEmail => Some(Self::HelpRequest),
            Self::HelpRequest => Some(Self::Map),
            Self::Map => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stack of routes over a fixed root. The top is the visible screen.
#[derive(Debug, Clone)]
pub struct Navigator {
    root: Route,
    above: Vec<Route>,
}

impl Navigator {
    pub fn new(root: Route) -> Self {
        Self {
            root,
            above: Vec::new(),
        }
    }

    pub fn current(&self) -> Route {
        self.above.last().copied().unwrap_or(self.root)
    }

    /// Every route on the stack, root first.
    pub fn stack(&self) -> Vec<Route> {
        iter::once(self.root)
            .chain(self.above.iter().copied())
            .collect()
    }

    pub fn can_go_back(&self) -> bool {
        !self.above.is_empty()
    }

    /// Show `route`. Pops back to it if it is already on the stack,
    /// otherwise pushes it. Returns whether the visible screen changed.
    pub fn navigate(&mut self, route: Route) -> bool {
        if self.current() == route {
            return false;
        }
        if route == self.root {
            self.above.clear();
        } else if let Some(i) = self.above.iter().position(|&r| r == route) {
            self.above.truncate(i + 1);
        } else {
            self.above.push(route);
        }
        tracing::debug!(%route, depth = self.above.len() + 1, "navigated");
        true
    }

    /// Pop the top screen. The root stays.
    pub fn back(&mut self) -> bool {
        self.above.pop().is_some()
    }
}
