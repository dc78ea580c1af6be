//! Shared test helpers: a scripted in-memory broker and a recording executor.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use sessionq_core::broker::{QueueSession, SessionClient};
use sessionq_core::error::{AcceptError, CloseError, ExecutionError};
use sessionq_core::executor::{SessionExecutor, SessionInput};

/// Observable lifecycle events, in the order they occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The broker handed out a session.
    Accepted(String),
    /// The executor began handling a session.
    ExecutionStarted(String),
    /// A session close call was made.
    Closed(String),
}

/// Route listener tracing through the test harness so `--nocapture` shows
/// it. Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Append-only event log shared between the fakes and the test body.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Recorder {
    pub fn new() -> Self {
        init_tracing();
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.events
            .lock()
            .expect("recorder lock poisoned")
            .push(event);
    }

    pub fn snapshot(&self) -> Vec<Event> {
        self.events.lock().expect("recorder lock poisoned").clone()
    }

    /// Index of the first occurrence of `event`, if any.
    pub fn position(&self, event: &Event) -> Option<usize> {
        self.snapshot().iter().position(|e| e == event)
    }

    /// Number of close calls recorded for a session id.
    pub fn close_count(&self, session_id: &str) -> usize {
        self.snapshot()
            .iter()
            .filter(|e| matches!(e, Event::Closed(id) if id == session_id))
            .count()
    }

    /// Poll until `predicate` holds over the event log, or give up after
    /// `timeout`. Returns whether the predicate held.
    pub async fn wait_for(
        &self,
        timeout: Duration,
        predicate: impl Fn(&[Event]) -> bool,
    ) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if predicate(&self.snapshot()) {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

/// A session handle from the scripted broker.
pub struct FakeSession {
    id: String,
    recorder: Recorder,
    fail_close: bool,
}

#[async_trait]
impl QueueSession for FakeSession {
    fn session_id(&self) -> &str {
        &self.id
    }

    async fn close(&mut self) -> Result<(), CloseError> {
        self.recorder.push(Event::Closed(self.id.clone()));
        if self.fail_close {
            Err(CloseError("scripted close failure".to_string()))
        } else {
            Ok(())
        }
    }
}

/// One scripted outcome of an accept call.
pub enum AcceptStep {
    /// Hand out a session with the given id.
    Session { id: &'static str, fail_close: bool },
    /// Fail with a routine polling timeout.
    Timeout,
    /// Fail with a non-transient fault.
    Fault(AcceptError),
}

impl AcceptStep {
    pub fn session(id: &'static str) -> Self {
        Self::Session {
            id,
            fail_close: false,
        }
    }
}

/// Broker client that replays a scripted sequence of accept outcomes and
/// then blocks forever, like a broker with no more traffic.
pub struct ScriptedBroker {
    script: Mutex<VecDeque<AcceptStep>>,
    recorder: Recorder,
}

impl ScriptedBroker {
    pub fn new(recorder: Recorder, steps: Vec<AcceptStep>) -> Self {
        Self {
            script: Mutex::new(steps.into()),
            recorder,
        }
    }
}

#[async_trait]
impl SessionClient for ScriptedBroker {
    type Session = FakeSession;

    async fn accept_next_session(&self) -> Result<FakeSession, AcceptError> {
        let step = self.script.lock().expect("script lock poisoned").pop_front();
        match step {
            Some(AcceptStep::Session { id, fail_close }) => {
                self.recorder.push(Event::Accepted(id.to_string()));
                Ok(FakeSession {
                    id: id.to_string(),
                    recorder: self.recorder.clone(),
                    fail_close,
                })
            }
            Some(AcceptStep::Timeout) => Err(AcceptError::Timeout),
            Some(AcceptStep::Fault(fault)) => Err(fault),
            None => std::future::pending().await,
        }
    }
}

/// Executor that records invocation order and tracks peak concurrency.
pub struct RecordingExecutor {
    recorder: Recorder,
    hold: Duration,
    fault_on: Vec<&'static str>,
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl RecordingExecutor {
    pub fn new(recorder: Recorder, hold: Duration) -> Self {
        Self {
            recorder,
            hold,
            fault_on: Vec::new(),
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Make handling of the given session ids fault.
    pub fn with_faults_on(mut self, ids: Vec<&'static str>) -> Self {
        self.fault_on = ids;
        self
    }

    /// Highest number of sessions handled at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionExecutor<FakeSession> for RecordingExecutor {
    async fn try_execute(
        &self,
        input: SessionInput<'_, FakeSession>,
        _shutdown: &CancellationToken,
    ) -> Result<bool, ExecutionError> {
        let id = input.session_id().to_string();
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.recorder.push(Event::ExecutionStarted(id.clone()));

        tokio::time::sleep(self.hold).await;
        self.current.fetch_sub(1, Ordering::SeqCst);

        if self.fault_on.contains(&id.as_str()) {
            Err(ExecutionError(format!("scripted fault for '{}'", id)))
        } else {
            Ok(true)
        }
    }
}
