//! Fakes shared by unit tests: pinned clock, scripted HTTP, recording
//! navigator and a credential minter.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};
use time::{Duration, OffsetDateTime};

use crate::clock::Clock;
use crate::manager::{SessionContext, SessionManager};
use crate::nav::Navigator;
use crate::net::{HttpClient, HttpRequest, HttpResponse, NetworkError};
use crate::route::Route;
use crate::store::MemoryTokenStore;

// =========================================================================
// FixedClock
// =========================================================================

pub struct FixedClock {
    now: Mutex<OffsetDateTime>,
}

impl FixedClock {
    #[must_use]
    pub fn at(now: OffsetDateTime) -> Arc<Self> {
        Arc::new(Self { now: Mutex::new(now) })
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock().unwrap()
    }
}

/// A fixed, whole-second instant so `exp` claims round-trip exactly.
#[must_use]
pub fn epoch() -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap()
}

// =========================================================================
// Credentials
// =========================================================================

/// Build an unsigned three-part credential from raw payload claims.
#[must_use]
pub fn mint_raw(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

/// Credential for `subject`/`role` expiring at `expires_at`.
#[must_use]
pub fn mint_token(subject: &str, role: &str, expires_at: OffsetDateTime) -> String {
    mint_raw(&json!({
        "id": subject,
        "role": role,
        "exp": expires_at.unix_timestamp(),
        "orig_iat": expires_at.unix_timestamp() - 3600,
    }))
}

// =========================================================================
// ScriptedHttp
// =========================================================================

/// Replays queued outcomes in order and records every request it receives.
#[derive(Default)]
pub struct ScriptedHttp {
    responses: Mutex<VecDeque<Result<HttpResponse, NetworkError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttp {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, status: u16, body: Value) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(HttpResponse { status, body }));
    }

    pub fn fail(&self, error: NetworkError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Queue a non-2xx response with a JSON body, as the adapter would
    /// classify it.
    pub fn fail_status(&self, status: u16, body: &Value) {
        self.fail(NetworkError::from_status(status, body.to_string()));
    }

    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl HttpClient for ScriptedHttp {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, NetworkError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(NetworkError::Transport("no scripted response".into())))
    }
}

// =========================================================================
// RecordingNavigator
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEvent {
    Navigate(Route),
    Reload,
}

#[derive(Default)]
pub struct RecordingNavigator {
    events: Mutex<Vec<NavEvent>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[must_use]
    pub fn events(&self) -> Vec<NavEvent> {
        self.events.lock().unwrap().clone()
    }

    #[must_use]
    pub fn navigations(&self) -> Vec<Route> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                NavEvent::Navigate(route) => Some(route),
                NavEvent::Reload => None,
            })
            .collect()
    }

    pub fn reset(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl Navigator for RecordingNavigator {
    fn navigate_to(&self, route: Route) {
        self.events.lock().unwrap().push(NavEvent::Navigate(route));
    }

    fn force_reload(&self) {
        self.events.lock().unwrap().push(NavEvent::Reload);
    }
}

// =========================================================================
// Harness
// =========================================================================

pub struct Harness {
    pub clock: Arc<FixedClock>,
    pub http: Arc<ScriptedHttp>,
    pub nav: Arc<RecordingNavigator>,
    pub manager: SessionManager,
    pub ctx: SessionContext,
}

/// Manager over fakes with an empty in-memory store, clock at [`epoch`].
#[must_use]
pub fn harness() -> Harness {
    let clock = FixedClock::at(epoch());
    let http = ScriptedHttp::new();
    let nav = RecordingNavigator::new();
    let manager = SessionManager::new(http.clone(), nav.clone());
    let ctx = SessionContext::new(Box::new(MemoryTokenStore::new(clock.clone())), clock.clone());
    Harness { clock, http, nav, manager, ctx }
}
