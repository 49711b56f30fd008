//! Stream controller
//!
//! Owns the connection lifecycle state machine and everything between the
//! engine's event stream and the two output channels. The transition logic
//! lives in [`Controller::handle_event`], a pure function from one event to
//! a list of [`Action`]s, so the whole state machine is unit-testable with
//! no broker and no async. The `run` loop only executes actions.
//!
//! Channel contract: `Action::Forward` lines are the only text written to
//! stdout; every status and diagnostic line goes to stderr via `tracing`.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use mqtail_engine::{EngineEvent, EngineHandle, Grant, SubscriptionSet};

use crate::filter::FilterSet;
use crate::output::Formatter;

/// Bounded wait for the graceful-close confirmation
const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

/// Connection lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Connecting,
    Connected,
    Offline,
    Terminating,
    Terminated,
}

/// What triggered shutdown; determines the exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownCause {
    /// Message-count limit reached
    CountLimit,
    /// External interrupt signal
    Signal,
    /// Broker rejected a subscription, or the subscribe request failed
    SubscribeFailed,
}

impl ShutdownCause {
    fn exit_code(self) -> u8 {
        match self {
            ShutdownCause::CountLimit | ShutdownCause::Signal => 0,
            ShutdownCause::SubscribeFailed => 1,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            ShutdownCause::CountLimit => "message count limit reached",
            ShutdownCause::Signal => "interrupted",
            ShutdownCause::SubscribeFailed => "subscription failed",
        }
    }
}

/// One status line, rendered to stderr by the run loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
    Connected { session_present: bool },
    Reconnected,
    CannotReachBroker,
    ConnectionLost,
    Retrying { attempt: u64 },
    Subscribed { topic: String, qos: u8 },
    SubscriptionRejected { topic: String },
    GrantCountMismatch { requested: usize, granted: usize },
    TransportError { message: String },
    ShuttingDown { reason: &'static str },
}

/// Side effects requested by a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Issue the batch subscribe for the full subscription set
    Subscribe,
    /// Write one formatted message line to stdout
    Forward(String),
    /// Write one status line to stderr
    Status(StatusLine),
    /// Request a graceful disconnect from the engine
    Disconnect,
    /// Terminate the process with this code
    Exit(u8),
}

/// Mutable run state, single-writer: only the controller's own event path
#[derive(Debug)]
pub struct RunState {
    pub phase: Phase,
    pub forwarded: u64,
    pub has_ever_connected: bool,
    pub offline_notice_shown: bool,
    pub reconnect_attempts: u64,
    pub shutting_down: bool,
    pub exit_code: u8,
}

impl RunState {
    fn new() -> Self {
        Self {
            phase: Phase::Init,
            forwarded: 0,
            has_ever_connected: false,
            offline_notice_shown: false,
            reconnect_attempts: 0,
            shutting_down: false,
            exit_code: 0,
        }
    }
}

/// The stream controller
pub struct Controller {
    state: RunState,
    subscriptions: SubscriptionSet,
    filters: FilterSet,
    formatter: Formatter,
    max_messages: Option<u64>,
    broker_url: String,
    shutdown_deadline: Option<Instant>,
}

impl Controller {
    pub fn new(
        subscriptions: SubscriptionSet,
        filters: FilterSet,
        formatter: Formatter,
        max_messages: Option<u64>,
        broker_url: String,
    ) -> Self {
        Self {
            state: RunState::new(),
            subscriptions,
            filters,
            formatter,
            max_messages,
            broker_url,
            shutdown_deadline: None,
        }
    }

    /// Apply one engine event to the state machine
    ///
    /// Pure with respect to the outside world: all side effects are
    /// returned as [`Action`]s in execution order. Once shutdown has
    /// begun, only `Closed` is acted on; everything else is discarded.
    pub fn handle_event(&mut self, event: EngineEvent) -> Vec<Action> {
        let mut actions = Vec::new();

        if let EngineEvent::Closed = event {
            self.state.phase = Phase::Terminated;
            actions.push(Action::Exit(self.state.exit_code));
            return actions;
        }

        if self.state.shutting_down {
            return actions;
        }

        match event {
            EngineEvent::HandshakeAck { session_present } => {
                self.state.phase = Phase::Connected;
                self.state.offline_notice_shown = false;
                if self.state.has_ever_connected {
                    actions.push(Action::Status(StatusLine::Reconnected));
                } else {
                    self.state.has_ever_connected = true;
                    actions.push(Action::Status(StatusLine::Connected { session_present }));
                }
                actions.push(Action::Subscribe);
            }
            EngineEvent::SubAck { grants } => {
                // One grant per requested topic; anything else hides a
                // missing or spurious grant and is treated as a rejection.
                if grants.len() != self.subscriptions.len() {
                    actions.push(Action::Status(StatusLine::GrantCountMismatch {
                        requested: self.subscriptions.len(),
                        granted: grants.len(),
                    }));
                    actions.extend(self.begin_shutdown(ShutdownCause::SubscribeFailed));
                    return actions;
                }
                let mut rejected = false;
                for (sub, grant) in self.subscriptions.iter().zip(grants.iter()) {
                    match grant {
                        Grant::Granted(qos) => actions.push(Action::Status(StatusLine::Subscribed {
                            topic: sub.topic.clone(),
                            qos: *qos,
                        })),
                        Grant::Rejected => {
                            actions.push(Action::Status(StatusLine::SubscriptionRejected {
                                topic: sub.topic.clone(),
                            }));
                            rejected = true;
                        }
                    }
                }
                if rejected {
                    actions.extend(self.begin_shutdown(ShutdownCause::SubscribeFailed));
                }
            }
            EngineEvent::ConnectionLost => {
                self.state.phase = Phase::Offline;
                actions.extend(self.offline_notice());
            }
            EngineEvent::ReconnectAttempt { attempt } => {
                self.state.phase = Phase::Offline;
                self.state.reconnect_attempts += 1;
                actions.extend(self.offline_notice());
                actions.push(Action::Status(StatusLine::Retrying { attempt }));
            }
            EngineEvent::Error { message } => {
                actions.push(Action::Status(StatusLine::TransportError { message }));
            }
            EngineEvent::Message(msg) => {
                if self.state.phase != Phase::Connected || !self.filters.matches(&msg) {
                    return actions;
                }
                actions.push(Action::Forward(self.formatter.format_message(&msg)));
                self.state.forwarded += 1;
                if let Some(max) = self.max_messages {
                    if self.state.forwarded >= max {
                        actions.extend(self.begin_shutdown(ShutdownCause::CountLimit));
                    }
                }
            }
            EngineEvent::Closed => {}
        }

        actions
    }

    /// Start the shutdown procedure, at most once per run
    pub fn begin_shutdown(&mut self, cause: ShutdownCause) -> Vec<Action> {
        if self.state.shutting_down {
            return Vec::new();
        }
        self.state.shutting_down = true;
        self.state.exit_code = cause.exit_code();
        self.state.phase = Phase::Terminating;
        self.shutdown_deadline = Some(Instant::now() + SHUTDOWN_GRACE);
        vec![
            Action::Status(StatusLine::ShuttingDown {
                reason: cause.describe(),
            }),
            Action::Disconnect,
        ]
    }

    /// One notice per unbroken offline interval; wording depends on
    /// whether a connection was ever established.
    fn offline_notice(&mut self) -> Vec<Action> {
        if self.state.offline_notice_shown {
            return Vec::new();
        }
        self.state.offline_notice_shown = true;
        let status = if self.state.has_ever_connected {
            StatusLine::ConnectionLost
        } else {
            StatusLine::CannotReachBroker
        };
        vec![Action::Status(status)]
    }

    /// Drive the controller to completion, returning the process exit code
    pub async fn run(
        mut self,
        handle: EngineHandle,
        mut events: mpsc::Receiver<EngineEvent>,
    ) -> u8 {
        self.state.phase = Phase::Connecting;

        loop {
            if self.state.shutting_down {
                return self.await_close(&mut events).await;
            }

            let event = tokio::select! {
                event = events.recv() => match event {
                    Some(event) => event,
                    // Engine task is gone; nothing left to drive
                    None => return self.state.exit_code,
                },
                _ = tokio::signal::ctrl_c() => {
                    let actions = self.begin_shutdown(ShutdownCause::Signal);
                    if let Some(code) = self.execute(&handle, actions).await {
                        return code;
                    }
                    continue;
                }
            };

            let actions = self.handle_event(event);
            if let Some(code) = self.execute(&handle, actions).await {
                return code;
            }
        }
    }

    /// Wait for the close confirmation, bounded by one deadline fixed when
    /// shutdown began. Events arriving before then share the budget; the
    /// wait never restarts.
    async fn await_close(&mut self, events: &mut mpsc::Receiver<EngineEvent>) -> u8 {
        let deadline = self
            .shutdown_deadline
            .unwrap_or_else(|| Instant::now() + SHUTDOWN_GRACE);

        loop {
            match tokio::time::timeout_at(deadline, events.recv()).await {
                Ok(Some(event)) => {
                    // While shutting down only `Closed` produces an action
                    for action in self.handle_event(event) {
                        if let Action::Exit(code) = action {
                            return code;
                        }
                    }
                }
                Ok(None) => return self.state.exit_code,
                Err(_) => {
                    warn!("graceful disconnect not confirmed, terminating");
                    return self.state.exit_code;
                }
            }
        }
    }

    /// Execute a batch of actions; returns the exit code when one says exit
    async fn execute(&mut self, handle: &EngineHandle, actions: Vec<Action>) -> Option<u8> {
        let mut queue: VecDeque<Action> = actions.into();

        while let Some(action) = queue.pop_front() {
            match action {
                Action::Subscribe => {
                    if let Err(e) = handle.subscribe(&self.subscriptions).await {
                        error!(error = %e, "subscribe request failed");
                        queue.extend(self.begin_shutdown(ShutdownCause::SubscribeFailed));
                    }
                }
                Action::Forward(line) => println!("{line}"),
                Action::Status(status) => self.emit_status(&status),
                Action::Disconnect => handle.disconnect().await,
                Action::Exit(code) => return Some(code),
            }
        }
        None
    }

    fn emit_status(&self, status: &StatusLine) {
        match status {
            StatusLine::Connected { session_present } => {
                info!(broker = %self.broker_url, session_present, "connected");
            }
            StatusLine::Reconnected => info!(broker = %self.broker_url, "reconnected"),
            StatusLine::CannotReachBroker => {
                warn!(broker = %self.broker_url, "cannot reach broker, retrying");
            }
            StatusLine::ConnectionLost => warn!("lost connection, retrying"),
            StatusLine::Retrying { attempt } => debug!(attempt, "reconnect attempt"),
            StatusLine::Subscribed { topic, qos } => {
                info!(topic = %self.formatter.decorate_topic(topic), qos, "subscribed");
            }
            StatusLine::SubscriptionRejected { topic } => {
                error!(topic = %self.formatter.decorate_topic(topic), "subscription rejected by broker");
            }
            StatusLine::GrantCountMismatch { requested, granted } => {
                error!(requested, granted, "broker answered with wrong grant count");
            }
            StatusLine::TransportError { message } => debug!(error = %message, "transport error"),
            StatusLine::ShuttingDown { reason } => info!(reason, "shutting down"),
        }
    }
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;
