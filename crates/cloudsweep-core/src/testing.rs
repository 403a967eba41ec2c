//! Scripted provider doubles for tests.
//!
//! `MockSession` answers `invoke` calls from a table keyed by
//! `(service, region, operation, resource id)`. Unscripted calls return an
//! empty document, which every filter treats as "nothing to report".

use crate::credentials::Account;
use crate::error::{ApiError, CloudsweepError, Result};
use crate::traits::{CallParams, CloudSession, ServiceClient, SessionProvider};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Scripted {
    Respond(Value),
    Fail(ApiError),
    Unexpected(String),
    Panic(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CallKey {
    service: String,
    region: Option<String>,
    operation: String,
    resource: Option<String>,
}

/// A call observed by a [`MockSession`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub service: String,
    pub region: String,
    pub operation: String,
    pub params: CallParams,
}

#[derive(Default)]
struct MockState {
    script: HashMap<CallKey, Scripted>,
    delay: Option<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    event_log: Option<(String, Arc<Mutex<Vec<String>>>)>,
}

/// Scripted [`CloudSession`]
#[derive(Clone, Default)]
pub struct MockSession {
    state: Arc<MockState>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn state_mut(&mut self) -> &mut MockState {
        Arc::get_mut(&mut self.state).expect("MockSession scripted after it was shared")
    }

    fn script(mut self, key: CallKey, entry: Scripted) -> Self {
        self.state_mut().script.insert(key, entry);
        self
    }

    fn key(service: &str, region: Option<&str>, operation: &str, resource: Option<&str>) -> CallKey {
        CallKey {
            service: service.to_string(),
            region: region.map(str::to_string),
            operation: operation.to_string(),
            resource: resource.map(str::to_string),
        }
    }

    /// Respond to `operation` in one region
    pub fn respond(self, service: &str, region: &str, operation: &str, body: Value) -> Self {
        self.script(Self::key(service, Some(region), operation, None), Scripted::Respond(body))
    }

    /// Respond to `operation` in every region without a region-specific script
    pub fn respond_everywhere(self, service: &str, operation: &str, body: Value) -> Self {
        self.script(Self::key(service, None, operation, None), Scripted::Respond(body))
    }

    /// Respond to `operation` for a single resource id, in any region
    pub fn respond_for(self, service: &str, operation: &str, resource: &str, body: Value) -> Self {
        self.script(
            Self::key(service, None, operation, Some(resource)),
            Scripted::Respond(body),
        )
    }

    /// Fail `operation` in one region with a provider error
    pub fn fail(self, service: &str, region: &str, operation: &str, error: ApiError) -> Self {
        self.script(Self::key(service, Some(region), operation, None), Scripted::Fail(error))
    }

    /// Fail `operation` for a single resource id with a provider error
    pub fn fail_for(self, service: &str, operation: &str, resource: &str, error: ApiError) -> Self {
        self.script(Self::key(service, None, operation, Some(resource)), Scripted::Fail(error))
    }

    /// Fail `operation` in one region with a non-provider error
    pub fn unexpected(self, service: &str, region: &str, operation: &str, message: &str) -> Self {
        self.script(
            Self::key(service, Some(region), operation, None),
            Scripted::Unexpected(message.to_string()),
        )
    }

    /// Panic inside `operation` in one region
    pub fn panic_on(self, service: &str, region: &str, operation: &str, message: &str) -> Self {
        self.script(
            Self::key(service, Some(region), operation, None),
            Scripted::Panic(message.to_string()),
        )
    }

    /// Sleep for `delay` inside every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.state_mut().delay = Some(delay);
        self
    }

    /// Append `<label>:<service>.<operation>` to `log` whenever a call starts
    pub fn with_event_log(mut self, label: &str, log: Arc<Mutex<Vec<String>>>) -> Self {
        self.state_mut().event_log = Some((label.to_string(), log));
        self
    }

    /// Calls observed so far, in arrival order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Calls to one operation
    pub fn calls_to(&self, service: &str, operation: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.service == service && c.operation == operation)
            .collect()
    }

    /// Highest number of calls that were running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }
}

impl CloudSession for MockSession {
    fn client(&self, service: &str, region: &str) -> Result<Box<dyn ServiceClient>> {
        Ok(Box::new(MockClient {
            state: Arc::clone(&self.state),
            service: service.to_string(),
            region: region.to_string(),
        }))
    }
}

struct MockClient {
    state: Arc<MockState>,
    service: String,
    region: String,
}

impl MockClient {
    fn lookup(&self, operation: &str, params: &CallParams) -> Option<Scripted> {
        let resource = params.resource_id.as_deref();
        let candidates = [
            MockSession::key(&self.service, Some(&self.region), operation, resource),
            MockSession::key(&self.service, None, operation, resource),
        ];
        candidates
            .iter()
            .find_map(|key| self.state.script.get(key).cloned())
    }
}

impl ServiceClient for MockClient {
    fn invoke(&self, operation: &str, params: &CallParams) -> Result<Value> {
        if let Some((label, log)) = &self.state.event_log {
            if let Ok(mut log) = log.lock() {
                log.push(format!("{}:{}.{}", label, self.service, operation));
            }
        }
        if let Ok(mut calls) = self.state.calls.lock() {
            calls.push(RecordedCall {
                service: self.service.clone(),
                region: self.region.clone(),
                operation: operation.to_string(),
                params: params.clone(),
            });
        }

        let current = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.state.delay {
            std::thread::sleep(delay);
        }
        let scripted = self.lookup(operation, params);
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);

        match scripted {
            Some(Scripted::Respond(body)) => Ok(body),
            Some(Scripted::Fail(error)) => Err(CloudsweepError::Api(error)),
            Some(Scripted::Unexpected(message)) => Err(CloudsweepError::Other(message)),
            Some(Scripted::Panic(message)) => panic!("{}", message),
            None => Ok(Value::Object(Default::default())),
        }
    }
}

/// Scripted [`SessionProvider`] mapping account names to sessions
#[derive(Default)]
pub struct MockProvider {
    sessions: HashMap<String, MockSession>,
    opened: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `session` for the account named `account`
    pub fn with_session(mut self, account: &str, session: MockSession) -> Self {
        self.sessions.insert(account.to_string(), session);
        self
    }

    /// Account names in the order their sessions were opened
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().map(|o| o.clone()).unwrap_or_default()
    }
}

impl SessionProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn open(&self, account: &Account) -> Result<Arc<dyn CloudSession>> {
        if let Ok(mut opened) = self.opened.lock() {
            opened.push(account.name.clone());
        }
        self.sessions
            .get(&account.name)
            .map(|s| Arc::new(s.clone()) as Arc<dyn CloudSession>)
            .ok_or_else(|| CloudsweepError::Session(format!("no session for {}", account.name)))
    }
}

/// Provider error used by tests that only need "some" access failure
pub fn access_denied() -> ApiError {
    ApiError::AccessDenied {
        code: "AccessDenied".to_string(),
        message: "not authorized".to_string(),
    }
}

/// `describe_regions` response listing `regions`
pub fn regions_response(regions: &[&str]) -> Value {
    let regions: Vec<Value> = regions
        .iter()
        .map(|r| serde_json::json!({ "RegionName": r, "OptInStatus": "opt-in-not-required" }))
        .collect();
    serde_json::json!({ "Regions": regions })
}
