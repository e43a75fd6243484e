//! Named destinations of the dashboard.
//!
//! Only the names matter to the session core: which routes skip the guard,
//! and where unauthenticated visitors are sent.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Create,
    Jobs,
    Queue,
    Workers,
    Machines,
    Presets,
    Status,
    Login,
    Register,
    UpdatePassword,
}

impl Route {
    pub const ALL: [Route; 11] = [
        Route::Home,
        Route::Create,
        Route::Jobs,
        Route::Queue,
        Route::Workers,
        Route::Machines,
        Route::Presets,
        Route::Status,
        Route::Login,
        Route::Register,
        Route::UpdatePassword,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Route::Home => "home",
            Route::Create => "create",
            Route::Jobs => "jobs",
            Route::Queue => "queue",
            Route::Workers => "workers",
            Route::Machines => "machines",
            Route::Presets => "presets",
            Route::Status => "status",
            Route::Login => "login",
            Route::Register => "register",
            Route::UpdatePassword => "update-password",
        }
    }

    /// Routes reachable without a session: the guard is never applied here.
    #[must_use]
    pub fn is_guard_exempt(self) -> bool {
        matches!(self, Route::Register | Route::UpdatePassword)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown route: {0}")]
pub struct UnknownRoute(pub String);

impl FromStr for Route {
    type Err = UnknownRoute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().trim_start_matches('/');
        Route::ALL
            .into_iter()
            .find(|route| route.name() == name)
            .ok_or_else(|| UnknownRoute(s.to_owned()))
    }
}

#[cfg(test)]
#[path = "route_test.rs"]
mod tests;
