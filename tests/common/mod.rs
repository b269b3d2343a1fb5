//! Shared fixtures for the failover integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};

use sentinel_agent::monitor::{
    EventStream, MonitorConnector, MonitorError, MonitorLink, PrimaryInfo, SubscriptionEvent,
};
use sentinel_agent::proxy::{ProxyReloader, ReloadError};

/// Routing file used by most tests.
pub const PROXY_CONFIG: &str = r#"alpha:
  listen: 127.0.0.1:22121
  hash: fnv1a_64
  distribution: ketama
  auto_eject_hosts: false
  redis: true
  server_retry_timeout: 2000
  server_failure_limit: 1
  servers:
  - 10.0.0.1:6379:1 mymaster
  - 10.0.0.3:6379:1 othermaster
"#;

/// Write `content` as the proxy routing file inside a fresh temp dir.
pub fn proxy_config(content: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nutcracker.yml");
    std::fs::write(&path, content).unwrap();
    (dir, path)
}

pub fn primary(name: &str, address: &str, port: u16) -> PrimaryInfo {
    PrimaryInfo {
        name: name.to_string(),
        address: address.to_string(),
        port,
    }
}

pub fn data(payload: &str) -> SubscriptionEvent {
    SubscriptionEvent::Data {
        channel: "+switch-master".to_string(),
        payload: payload.to_string(),
    }
}

pub fn ack() -> SubscriptionEvent {
    SubscriptionEvent::Ack {
        channel: "+switch-master".to_string(),
        count: 1,
    }
}

/// What one accepted connection to a scripted monitor does.
#[derive(Clone)]
pub struct Session {
    pub primaries: Result<Vec<PrimaryInfo>, MonitorError>,
    pub events: Vec<SubscriptionEvent>,
    /// Keep the subscription open after the scripted events.
    pub hold_open: bool,
}

impl Session {
    pub fn new(primaries: Vec<PrimaryInfo>, events: Vec<SubscriptionEvent>) -> Self {
        Self {
            primaries: Ok(primaries),
            events,
            hold_open: true,
        }
    }

    /// The subscription ends after the scripted events.
    pub fn then_drop(mut self) -> Self {
        self.hold_open = false;
        self
    }
}

struct ScriptedLink {
    endpoint: String,
    session: Session,
    subscriptions: Arc<AtomicUsize>,
}

#[async_trait]
impl MonitorLink for ScriptedLink {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn primaries(&mut self) -> Result<Vec<PrimaryInfo>, MonitorError> {
        self.session.primaries.clone()
    }

    async fn subscribe(&mut self, _topic: &str) -> Result<EventStream, MonitorError> {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        let scripted = stream::iter(std::mem::take(&mut self.session.events));
        if self.session.hold_open {
            Ok(scripted.chain(stream::pending()).boxed())
        } else {
            Ok(scripted.boxed())
        }
    }
}

/// Monitor connector driven by per-endpoint queues.
///
/// Each connect to an endpoint consumes its next queued step: a session to
/// serve, or a refusal. An endpoint with nothing queued refuses.
#[derive(Clone, Default)]
pub struct ScriptedConnector {
    sessions: Arc<Mutex<HashMap<String, VecDeque<Option<Session>>>>>,
    attempts: Arc<Mutex<Vec<String>>>,
    subscriptions: Arc<AtomicUsize>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(self, endpoint: &str, session: Session) -> Self {
        self.push(endpoint, Some(session))
    }

    /// Refuse the next connection to `endpoint`.
    pub fn refuse(self, endpoint: &str) -> Self {
        self.push(endpoint, None)
    }

    fn push(self, endpoint: &str, step: Option<Session>) -> Self {
        self.sessions
            .lock()
            .unwrap()
            .entry(endpoint.to_string())
            .or_default()
            .push_back(step);
        self
    }

    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }

    /// Subscriptions opened on any link; startup has finished once this moves.
    pub fn subscriptions(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MonitorConnector for ScriptedConnector {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn MonitorLink>, MonitorError> {
        self.attempts.lock().unwrap().push(endpoint.to_string());
        let session = self
            .sessions
            .lock()
            .unwrap()
            .get_mut(endpoint)
            .and_then(VecDeque::pop_front)
            .flatten();
        match session {
            Some(session) => Ok(Box::new(ScriptedLink {
                endpoint: endpoint.to_string(),
                session,
                subscriptions: self.subscriptions.clone(),
            })),
            None => Err(MonitorError::Unreachable {
                endpoint: endpoint.to_string(),
                reason: "connection refused".to_string(),
            }),
        }
    }
}

/// Reloader that counts calls and can be told to fail.
#[derive(Clone, Default)]
pub struct CountingReloader {
    pub calls: Arc<AtomicUsize>,
    pub fail: bool,
}

impl CountingReloader {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProxyReloader for CountingReloader {
    async fn reload(&self) -> Result<(), ReloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(ReloadError::Failed {
                command: "reload-proxy".to_string(),
                status: Some(1),
                output: "proxy refused to restart".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

/// Poll `check` until it holds or two seconds pass.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
