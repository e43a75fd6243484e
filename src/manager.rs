//! Session manager: login, registration, logout, forced password update and
//! the navigation guard.
//!
//! ARCHITECTURE
//! ============
//! All mutable session data lives in a [`SessionContext`] (token store,
//! in-memory state, clock, current route) that the host owns and lends to
//! every operation. [`SessionManager`] holds only the collaborators: the HTTP
//! client and the navigator. Operations take `&mut SessionContext`, so one
//! context has exactly one writer at a time and no locking is needed.
//!
//! PHASES
//! ======
//! `Anonymous` → `Authenticated` on login; `Anonymous` →
//! `PasswordResetRequired` when the backend refuses a login pending a password
//! change; any phase → `Anonymous` on logout. The phase is derived from the
//! session state, the current route and a reset-pending flag that only a
//! refused login sets.
//!
//! RELOAD
//! ======
//! Login and logout finish with a full reload: in-memory state is dropped and
//! the navigator is told to rebuild its view. After login the guard then
//! re-derives the session from the token store. After logout it does not, so
//! a credential that could not be deleted is never re-adopted.

use std::sync::Arc;

use time::Duration;

use crate::clock::Clock;
use crate::error::AuthError;
use crate::nav::Navigator;
use crate::net::api::{
    Acknowledgement, Credentials, LOGIN_PATH, PasswordUpdate, REFRESH_TOKEN_PATH, REGISTER_PATH, TokenResponse,
    UPDATE_PASSWORD_PATH,
};
use crate::net::{HttpClient, HttpRequest, HttpResponse, NetworkError};
use crate::route::Route;
use crate::session::SessionState;
use crate::store::{DEFAULT_TOKEN_TTL, TokenStore};
use crate::token::{self, Claims};

// =============================================================================
// CONTEXT
// =============================================================================

/// Everything a session operation reads or writes.
pub struct SessionContext {
    store: Box<dyn TokenStore>,
    state: SessionState,
    clock: Arc<dyn Clock>,
    route: Option<Route>,
    reset_pending: bool,
}

impl SessionContext {
    /// Fresh, unauthenticated context over `store`.
    #[must_use]
    pub fn new(store: Box<dyn TokenStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, state: SessionState::new(), clock, route: None, reset_pending: false }
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn store(&self) -> &dyn TokenStore {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn TokenStore {
        self.store.as_mut()
    }

    /// Last route the host entered through the manager.
    #[must_use]
    pub fn current_route(&self) -> Option<Route> {
        self.route
    }

    /// Current phase of the session state machine.
    ///
    /// `PasswordResetRequired` needs both a refused login and the host still
    /// sitting on `update-password`. Merely browsing to that route
    /// anonymously reports `Anonymous`.
    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.state.is_authenticated() {
            Phase::Authenticated
        } else if self.reset_pending && self.route == Some(Route::UpdatePassword) {
            Phase::PasswordResetRequired
        } else {
            Phase::Anonymous
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Anonymous,
    Authenticated,
    PasswordResetRequired,
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// Identity hints taken from a decoded credential. Display only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub role: Option<String>,
}

impl From<&Claims> for Identity {
    fn from(claims: &Claims) -> Self {
        Self { username: claims.subject.clone(), role: claims.role.clone() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Credential stored and session established.
    Authenticated(Identity),
    /// The backend wants a new password first; the host is now on
    /// `update-password`.
    PasswordResetRequired,
}

/// Result of evaluating the guard for one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Route is reachable without a session; nothing was checked.
    Exempt,
    /// A valid stored credential was adopted into session state.
    Authenticated,
    /// No valid credential, but the target is `login` itself.
    Anonymous,
    /// No valid credential; the host was sent to `login`.
    RedirectedToLogin,
}

impl GuardDecision {
    /// Whether the host may proceed to the route it asked for.
    #[must_use]
    pub fn allows_entry(self) -> bool {
        !matches!(self, GuardDecision::RedirectedToLogin)
    }
}

// =============================================================================
// MANAGER
// =============================================================================

pub struct SessionManager {
    http: Arc<dyn HttpClient>,
    navigator: Arc<dyn Navigator>,
    token_ttl: Duration,
}

impl SessionManager {
    #[must_use]
    pub fn new(http: Arc<dyn HttpClient>, navigator: Arc<dyn Navigator>) -> Self {
        Self { http, navigator, token_ttl: DEFAULT_TOKEN_TTL }
    }

    /// Override the lifetime stamped on stored credentials.
    #[must_use]
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Exchange credentials for a session.
    ///
    /// On success the credential is persisted, session state populated, the
    /// host sent to `redirect` (if any) and reloaded. A backend refusal
    /// carrying the password-reset message routes the host to
    /// `update-password` and returns [`LoginOutcome::PasswordResetRequired`].
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Network`] for any other failed request, and
    /// [`AuthError::MalformedToken`], [`AuthError::ExpiredToken`] or
    /// [`AuthError::Store`] if the issued credential cannot be adopted. Nothing
    /// is persisted on error.
    pub async fn login(
        &self,
        ctx: &mut SessionContext,
        credentials: &Credentials,
        redirect: Option<Route>,
    ) -> Result<LoginOutcome, AuthError> {
        let request = HttpRequest::post(LOGIN_PATH).json(serde_json::to_value(credentials).map_err(parse_error)?);

        let response = match self.http.request(request).await {
            Ok(response) => response,
            Err(e) if e.requires_password_reset() => {
                tracing::warn!(username = %credentials.username, "login refused: password reset required");
                ctx.reset_pending = true;
                self.navigate(ctx, Route::UpdatePassword);
                return Ok(LoginOutcome::PasswordResetRequired);
            }
            Err(e) => {
                tracing::warn!(username = %credentials.username, error = %e, "login failed");
                return Err(e.into());
            }
        };

        let body: TokenResponse = response.json()?;
        let claims = self.adopt(ctx, &body.token)?;
        ctx.reset_pending = false;
        tracing::info!(username = %claims.subject, role = ?claims.role, "login succeeded");

        if let Some(route) = redirect {
            self.navigate(ctx, route);
        }
        self.reload(ctx);

        Ok(LoginOutcome::Authenticated(Identity::from(&claims)))
    }

    /// Create an account. Never establishes a session: the user logs in
    /// separately afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Network`] if the request fails; no navigation
    /// happens in that case.
    pub async fn register(
        &self,
        ctx: &mut SessionContext,
        credentials: &Credentials,
        redirect: Option<Route>,
    ) -> Result<Acknowledgement, AuthError> {
        let request = HttpRequest::post(REGISTER_PATH).json(serde_json::to_value(credentials).map_err(parse_error)?);

        let response = self.http.request(request).await.inspect_err(|e| {
            tracing::warn!(username = %credentials.username, error = %e, "registration failed");
        })?;
        let ack = acknowledgement(&response)?;
        tracing::info!(username = %credentials.username, "registration succeeded");

        if let Some(route) = redirect {
            self.navigate(ctx, route);
        }
        Ok(ack)
    }

    /// Submit a password change, typically from the `update-password` route
    /// after a refused login. Attaches the bearer credential when one is held.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Network`] if the request fails. The host stays
    /// where it is, so a pending reset remains pending.
    pub async fn update_password(
        &self,
        ctx: &mut SessionContext,
        update: &PasswordUpdate,
        redirect: Option<Route>,
    ) -> Result<Acknowledgement, AuthError> {
        let request = HttpRequest::post(UPDATE_PASSWORD_PATH)
            .json(serde_json::to_value(update).map_err(parse_error)?)
            .bearer(ctx.state.bearer());

        let response = self.http.request(request).await.inspect_err(|e| {
            tracing::warn!(username = %update.username, error = %e, "password update failed");
        })?;
        let ack = acknowledgement(&response)?;
        ctx.reset_pending = false;
        tracing::info!(username = %update.username, "password updated");

        if let Some(route) = redirect {
            self.navigate(ctx, route);
        }
        Ok(ack)
    }

    /// Drop the session: delete the stored credential, clear state, go to
    /// `login` and reload. Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`] if the stored credential could not be
    /// deleted. In-memory state is cleared and the host is on `login` either
    /// way; a credential left behind on disk is not re-adopted here.
    pub fn logout(&self, ctx: &mut SessionContext) -> Result<(), AuthError> {
        let removed = ctx.store.remove();
        match &removed {
            Ok(()) => tracing::info!("logged out"),
            Err(e) => tracing::error!(error = %e, "logout could not delete stored token"),
        }

        // No guard here: a token that survived a failed removal must stay
        // out of session state.
        ctx.reset_pending = false;
        ctx.state.clear();
        self.enter(ctx, Route::Login);
        self.navigator.force_reload();
        removed.map_err(AuthError::from)
    }

    /// Check the stored credential before entering `route`.
    ///
    /// Exempt routes (`register`, `update-password`) are never checked. A
    /// valid credential is adopted into session state. A missing, expired or
    /// malformed one clears session state and sends the host to `login`,
    /// unless `login` is already the target. The stored credential is left in
    /// place either way.
    pub fn guard(&self, ctx: &mut SessionContext, route: Route) -> GuardDecision {
        if route.is_guard_exempt() {
            return GuardDecision::Exempt;
        }
        if self.rehydrate(ctx).is_some() {
            return GuardDecision::Authenticated;
        }
        if route == Route::Login {
            return GuardDecision::Anonymous;
        }

        tracing::debug!(%route, "no valid session; redirecting to login");
        self.enter(ctx, Route::Login);
        GuardDecision::RedirectedToLogin
    }

    /// Host-initiated navigation: run the guard, then enter `route` if it
    /// allows.
    pub fn navigate(&self, ctx: &mut SessionContext, route: Route) -> GuardDecision {
        let decision = self.guard(ctx, route);
        if decision.allows_entry() {
            self.enter(ctx, route);
        }
        decision
    }

    /// Rebuild session state from the token store without navigating.
    pub fn restore(&self, ctx: &mut SessionContext) -> Option<Identity> {
        self.rehydrate(ctx).map(|claims| Identity::from(&claims))
    }

    /// Trade the current credential for a fresh one with a new expiry.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotAuthenticated`] without a held credential,
    /// [`AuthError::Network`] if the backend refuses, or an adoption error
    /// for an unusable replacement. The previous credential stays in place
    /// on error.
    pub async fn refresh(&self, ctx: &mut SessionContext) -> Result<Identity, AuthError> {
        let bearer = ctx.state.bearer().ok_or(AuthError::NotAuthenticated)?;
        let request = HttpRequest::get(REFRESH_TOKEN_PATH).bearer(Some(bearer));

        let response = self.http.request(request).await.inspect_err(|e| {
            tracing::warn!(error = %e, "token refresh failed");
        })?;
        let body: TokenResponse = response.json()?;
        let claims = self.adopt(ctx, &body.token)?;
        tracing::info!(username = %claims.subject, "token refreshed");

        Ok(Identity::from(&claims))
    }

    /// Send an arbitrary backend request with the held bearer credential.
    ///
    /// Always reaches the server: decoded role hints are never consulted, so
    /// authorization stays the backend's decision.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Network`] if the request fails.
    pub async fn authorized_request(
        &self,
        ctx: &SessionContext,
        request: HttpRequest,
    ) -> Result<HttpResponse, AuthError> {
        let request = request.bearer(ctx.state.bearer());
        Ok(self.http.request(request).await?)
    }

    fn enter(&self, ctx: &mut SessionContext, route: Route) {
        ctx.route = Some(route);
        self.navigator.navigate_to(route);
    }

    fn reload(&self, ctx: &mut SessionContext) {
        ctx.state.clear();
        self.navigator.force_reload();
        let route = ctx.route;
        match route {
            Some(route) if !route.is_guard_exempt() => {
                self.guard(ctx, route);
            }
            _ => {
                self.rehydrate(ctx);
            }
        }
    }

    /// Adopt the stored credential if it is present, decodable and unexpired;
    /// otherwise clear session state. Never deletes from the store.
    fn rehydrate(&self, ctx: &mut SessionContext) -> Option<Claims> {
        let Some(stored) = ctx.store.get() else {
            ctx.state.clear();
            return None;
        };
        match token::decode(&stored) {
            Ok(claims) if !claims.is_expired_at(ctx.clock.now()) => {
                ctx.state.establish(stored, &claims);
                Some(claims)
            }
            Ok(claims) => {
                tracing::debug!(username = %claims.subject, "stored token expired");
                ctx.state.clear();
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "stored token malformed");
                ctx.state.clear();
                None
            }
        }
    }

    /// Persist a freshly issued credential and make it the session.
    fn adopt(&self, ctx: &mut SessionContext, issued: &str) -> Result<Claims, AuthError> {
        let claims = token::decode(issued)?;
        if claims.is_expired_at(ctx.clock.now()) {
            return Err(AuthError::ExpiredToken);
        }
        ctx.store.set(issued, self.token_ttl)?;
        ctx.state.establish(issued, &claims);
        Ok(claims)
    }
}

fn acknowledgement(response: &HttpResponse) -> Result<Acknowledgement, NetworkError> {
    if response.body.is_null() {
        return Ok(Acknowledgement::default());
    }
    response.json()
}

fn parse_error(e: serde_json::Error) -> NetworkError {
    NetworkError::Parse(e.to_string())
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod tests;
