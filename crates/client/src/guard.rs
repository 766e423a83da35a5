//! Navigation guard.
//!
//! Before each navigation the host asks [`RouteGuard::check`] whether the
//! target may be entered. The guard reads the session and nothing else, so
//! the decision for a given session state and target never changes.

use std::str::FromStr;
use std::sync::Arc;

use hotmeal_core::Role;

use crate::session::SessionStore;

/// Home of the admin console.
pub const ADMIN_DASHBOARD: &str = "/admin/dashboard";

/// Home of the staff console.
pub const STAFF_DASHBOARD: &str = "/staff/dashboard";

/// Paths treated as the generic landing route.
pub const LANDING_PATHS: &[&str] = &["/", "/home"];

/// Which application this client runs as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientKind {
    /// Staff and admin console.
    Admin,
    /// End-customer ordering app.
    #[default]
    Customer,
}

impl ClientKind {
    /// Login route for this kind of client.
    #[must_use]
    pub const fn login_path(&self) -> &'static str {
        match self {
            Self::Admin => "/login",
            Self::Customer => "/pages/auth/login",
        }
    }
}

impl FromStr for ClientKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "customer" => Ok(Self::Customer),
            _ => Err(format!("invalid client kind: {s}")),
        }
    }
}

/// A navigation target, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/` or `/home`.
    Landing,
    /// The configured login route.
    Login,
    AdminDashboard,
    StaffDashboard,
    /// Any other page.
    Page(String),
}

impl Route {
    /// Classify `target` against the configured `login_path`.
    ///
    /// Query strings, fragments and trailing slashes are ignored.
    #[must_use]
    pub fn classify(target: &str, login_path: &str) -> Self {
        let path = normalize(target);
        if path == normalize(login_path) {
            Self::Login
        } else if LANDING_PATHS.contains(&path) {
            Self::Landing
        } else if path == ADMIN_DASHBOARD {
            Self::AdminDashboard
        } else if path == STAFF_DASHBOARD {
            Self::StaffDashboard
        } else {
            Self::Page(path.to_string())
        }
    }

    /// Path for this route.
    #[must_use]
    pub fn path<'a>(&'a self, login_path: &'a str) -> &'a str {
        match self {
            Self::Landing => "/",
            Self::Login => login_path,
            Self::AdminDashboard => ADMIN_DASHBOARD,
            Self::StaffDashboard => STAFF_DASHBOARD,
            Self::Page(path) => path,
        }
    }
}

fn normalize(target: &str) -> &str {
    let end = target.find(['?', '#']).unwrap_or(target.len());
    let path = target.get(..end).unwrap_or(target);
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

/// Who is navigating, as far as the guard is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessState {
    Anonymous,
    Admin,
    Staff,
    User,
}

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Enter the target as requested.
    Proceed,
    /// Go here instead.
    Redirect(String),
}

/// Redirect capability supplied by the host UI.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Decides where a navigation should end up.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    session: Arc<SessionStore>,
    login_path: String,
}

impl RouteGuard {
    #[must_use]
    pub fn new(session: Arc<SessionStore>, login_path: impl Into<String>) -> Self {
        Self {
            session,
            login_path: login_path.into(),
        }
    }

    /// The configured login route.
    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Current access state derived from the session.
    ///
    /// A credential without a recorded role is treated as a plain user.
    #[must_use]
    pub fn access_state(&self) -> AccessState {
        if !self.session.is_logged_in() {
            return AccessState::Anonymous;
        }
        match self.session.role() {
            Some(Role::Admin) => AccessState::Admin,
            Some(Role::Staff) => AccessState::Staff,
            Some(Role::User) | None => AccessState::User,
        }
    }

    /// Decide whether `target` may be entered.
    #[must_use]
    pub fn check(&self, target: &str) -> GuardDecision {
        let route = Route::classify(target, &self.login_path);
        let state = self.access_state();

        if state == AccessState::Anonymous && route != Route::Login {
            return self.redirect_to_login();
        }

        if route == Route::Landing {
            return match state {
                AccessState::Admin => GuardDecision::Redirect(ADMIN_DASHBOARD.to_string()),
                AccessState::Staff => GuardDecision::Redirect(STAFF_DASHBOARD.to_string()),
                AccessState::User | AccessState::Anonymous => self.redirect_to_login(),
            };
        }

        GuardDecision::Proceed
    }

    /// Check `target` and, when redirected, hand the destination to
    /// `navigator`. Returns the decision.
    pub fn navigate(&self, target: &str, navigator: &dyn Navigator) -> GuardDecision {
        let decision = self.check(target);
        if let GuardDecision::Redirect(path) = &decision {
            tracing::debug!(target, redirect = %path, "Navigation redirected");
            navigator.navigate(path);
        }
        decision
    }

    fn redirect_to_login(&self) -> GuardDecision {
        GuardDecision::Redirect(self.login_path.clone())
    }
}
