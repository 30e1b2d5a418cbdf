//! The new-connection form workflow.
//!
//! Mediates between raw form input and the collaborators: validation first,
//! then the remote call, then user feedback. Outcomes are returned as data so
//! a headless caller can pattern-match, and mirrored to the
//! [`NotificationSink`] so a UI only has to drain toasts.
//!
//! Failure semantics: no retries anywhere. Validation failures are
//! field-level and block the remote call; remote failures become an error
//! notification and never escape the operation.

use crate::models::{ConnectionConfig, ConnectionForm, FieldErrors};
use crate::notify::{Notification, NotificationSink};
use crate::services::{ConnectionStore, ConnectionTester};
use crate::state::ConnectionsState;

use parking_lot::RwLock;
use std::sync::Arc;

/// Fallback description when a save failure carries no message.
const GENERIC_SAVE_FAILURE: &str = "Unexpected error occurred, try again.";

/// Test failures always show this; the probe's own error text is deliberately
/// not surfaced to the user (it still lands in the log).
const GENERIC_TEST_FAILURE: &str = "Could not establish a connection with your Redis server.";

/// Status of one workflow operation.
///
/// Set exactly once per transition; [`is_loading`](Self::is_loading) is
/// derived from it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OperationStatus {
    /// Ready; nothing attempted yet or last attempt fully settled.
    #[default]
    Idle,
    /// The operation's async call is outstanding.
    InFlight,
    /// Last attempt succeeded.
    Succeeded,
    /// Last attempt failed at the collaborator.
    Failed,
}

impl OperationStatus {
    /// Check if the operation's async call is outstanding.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::InFlight)
    }
}

/// Outcome of [`ConnectionWorkflow::submit_create`].
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Saved; carries the persisted snapshot now installed in shared state.
    Saved {
        /// The full list returned by the store.
        connections: Vec<ConnectionConfig>,
    },
    /// Validation failed; the store was never invoked.
    Invalid {
        /// Field violations to display inline.
        errors: FieldErrors,
    },
    /// The store rejected the save; shared state is unchanged.
    Failed {
        /// The message shown to the user.
        message: String,
    },
}

/// Outcome of [`ConnectionWorkflow::test_connection`].
#[derive(Debug)]
pub enum TestOutcome {
    /// The server answered the probe.
    Reachable,
    /// Validation failed; the tester was never invoked.
    Invalid {
        /// Field violations to display inline.
        errors: FieldErrors,
    },
    /// The probe failed.
    Unreachable,
}

/// Orchestrates the new-connection form: validate, test/save, report.
pub struct ConnectionWorkflow<T, S, N> {
    tester: T,
    store: S,
    notifier: N,
    /// Shared snapshot of persisted connections, replaced wholesale on save.
    connections: Arc<ConnectionsState>,
    /// Invoked after a successful save, and by `close()`.
    on_close: Option<Box<dyn Fn() + Send + Sync>>,
    save_status: RwLock<OperationStatus>,
    test_status: RwLock<OperationStatus>,
}

impl<T, S, N> ConnectionWorkflow<T, S, N>
where
    T: ConnectionTester,
    S: ConnectionStore,
    N: NotificationSink,
{
    /// Create a workflow over the given collaborators.
    pub fn new(tester: T, store: S, notifier: N, connections: Arc<ConnectionsState>) -> Self {
        Self {
            tester,
            store,
            notifier,
            connections,
            on_close: None,
            save_status: RwLock::new(OperationStatus::Idle),
            test_status: RwLock::new(OperationStatus::Idle),
        }
    }

    /// Set the close-request callback (e.g. dismissing the modal).
    pub fn with_close_callback(mut self, on_close: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_close = Some(Box::new(on_close));
        self
    }

    /// Validate the form and persist the connection.
    ///
    /// On success the shared snapshot is replaced with the store's returned
    /// list, a success notification is emitted and the close callback runs.
    /// On store failure the snapshot is untouched and the modal stays open.
    pub async fn submit_create(&self, form: ConnectionForm) -> SubmitOutcome {
        *self.save_status.write() = OperationStatus::InFlight;

        let config = match form.validate() {
            Ok(config) => config,
            Err(errors) => {
                tracing::debug!(count = errors.len(), "Connection form invalid");
                *self.save_status.write() = OperationStatus::Idle;
                return SubmitOutcome::Invalid { errors };
            }
        };

        match self.store.save(config).await {
            Ok(connections) => {
                self.connections.replace(connections.clone());
                self.notifier.notify(Notification::success(
                    "Connection saved",
                    "You can now connect to your database!",
                ));
                self.close();
                *self.save_status.write() = OperationStatus::Succeeded;
                SubmitOutcome::Saved { connections }
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to save connection");
                let message = match err.to_string() {
                    m if m.is_empty() => GENERIC_SAVE_FAILURE.to_string(),
                    m => m,
                };
                self.notifier
                    .notify(Notification::error("Error saving connection", message.clone()));
                *self.save_status.write() = OperationStatus::Failed;
                SubmitOutcome::Failed { message }
            }
        }
    }

    /// Validate host/port/password and probe the server.
    ///
    /// The name field plays no part here. Probe failures surface only the
    /// generic message; the underlying reason goes to the log.
    pub async fn test_connection(&self, form: &ConnectionForm) -> TestOutcome {
        *self.test_status.write() = OperationStatus::InFlight;

        let target = match form.validate_for_test() {
            Ok(target) => target,
            Err(errors) => {
                tracing::debug!(count = errors.len(), "Test input invalid");
                *self.test_status.write() = OperationStatus::Idle;
                return TestOutcome::Invalid { errors };
            }
        };

        match self.tester.test(&target).await {
            Ok(()) => {
                self.notifier.notify(Notification::success(
                    "Connection successful",
                    "You can save your connection now!",
                ));
                *self.test_status.write() = OperationStatus::Succeeded;
                TestOutcome::Reachable
            }
            Err(err) => {
                tracing::warn!(error = %err, host = %target.host, port = target.port, "Connection test failed");
                self.notifier
                    .notify(Notification::error("Error on connection", GENERIC_TEST_FAILURE));
                *self.test_status.write() = OperationStatus::Failed;
                TestOutcome::Unreachable
            }
        }
    }

    /// Invoke the close-request callback if one was supplied. No-op otherwise.
    pub fn close(&self) {
        if let Some(on_close) = &self.on_close {
            on_close();
        }
    }

    /// Status of the save operation.
    pub fn save_status(&self) -> OperationStatus {
        *self.save_status.read()
    }

    /// Status of the test operation.
    pub fn test_status(&self) -> OperationStatus {
        *self.test_status.read()
    }

    /// The shared connections state this workflow installs snapshots into.
    pub fn connections(&self) -> &Arc<ConnectionsState> {
        &self.connections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoralError;
    use crate::models::TestTarget;
    use crate::notify::{ChannelNotifier, Severity};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    /// Tester that records calls and fails on demand.
    struct StubTester {
        fail: bool,
        calls: AtomicUsize,
    }

    impl StubTester {
        fn ok() -> Self {
            Self { fail: false, calls: AtomicUsize::new(0) }
        }

        fn failing() -> Self {
            Self { fail: true, calls: AtomicUsize::new(0) }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ConnectionTester for &StubTester {
        async fn test(&self, _target: &TestTarget) -> Result<(), CoralError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(CoralError::connection("connection refused by upstream"))
            } else {
                Ok(())
            }
        }
    }

    /// Store that returns a canned snapshot or a canned failure.
    struct StubStore {
        snapshot: Vec<ConnectionConfig>,
        fail_message: Option<String>,
        calls: AtomicUsize,
    }

    impl StubStore {
        fn returning(snapshot: Vec<ConnectionConfig>) -> Self {
            Self { snapshot, fail_message: None, calls: AtomicUsize::new(0) }
        }

        fn failing(message: &str) -> Self {
            Self {
                snapshot: Vec::new(),
                fail_message: Some(message.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ConnectionStore for &StubStore {
        async fn save(
            &self,
            _config: ConnectionConfig,
        ) -> Result<Vec<ConnectionConfig>, CoralError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.fail_message {
                Some(message) => Err(CoralError::storage(message.clone(), None)),
                None => Ok(self.snapshot.clone()),
            }
        }

        async fn load_all(&self) -> Result<Vec<ConnectionConfig>, CoralError> {
            Ok(self.snapshot.clone())
        }

        async fn delete(&self, _id: Uuid) -> Result<(), CoralError> {
            Ok(())
        }
    }

    fn valid_form() -> ConnectionForm {
        ConnectionForm {
            name: "local".to_string(),
            host: "localhost".to_string(),
            port: "6379".to_string(),
            password: String::new(),
        }
    }

    #[tokio::test]
    async fn test_submit_with_missing_name_skips_store() {
        let tester = StubTester::ok();
        let store = StubStore::returning(vec![]);
        let (notifier, mut rx) = ChannelNotifier::new();
        let workflow =
            ConnectionWorkflow::new(&tester, &store, notifier, Arc::new(ConnectionsState::new()));

        let form = ConnectionForm { name: String::new(), ..valid_form() };
        let outcome = workflow.submit_create(form).await;

        match outcome {
            SubmitOutcome::Invalid { errors } => assert!(errors.contains("name")),
            other => panic!("expected Invalid, got {other:?}"),
        }
        assert_eq!(store.calls(), 0);
        assert!(!workflow.save_status().is_loading());
        assert!(rx.try_recv().is_err(), "no notification for field errors");
    }

    #[tokio::test]
    async fn test_submit_success_installs_snapshot_and_closes() {
        let saved = ConnectionConfig::new("local", "localhost", 6379, "");
        let tester = StubTester::ok();
        let store = StubStore::returning(vec![saved.clone()]);
        let (notifier, mut rx) = ChannelNotifier::new();
        let closed = Arc::new(AtomicUsize::new(0));
        let closed_count = closed.clone();

        let state = Arc::new(ConnectionsState::new());
        let workflow = ConnectionWorkflow::new(&tester, &store, notifier, state.clone())
            .with_close_callback(move || {
                closed_count.fetch_add(1, Ordering::SeqCst);
            });

        let outcome = workflow.submit_create(valid_form()).await;

        match outcome {
            SubmitOutcome::Saved { connections } => assert_eq!(connections, vec![saved.clone()]),
            other => panic!("expected Saved, got {other:?}"),
        }
        assert_eq!(state.snapshot(), vec![saved]);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
        assert_eq!(workflow.save_status(), OperationStatus::Succeeded);

        let notification = rx.try_recv().unwrap();
        assert_eq!(notification.severity, Severity::Success);
        assert_eq!(notification.title, "Connection saved");
        assert!(rx.try_recv().is_err(), "exactly one notification");
    }

    #[tokio::test]
    async fn test_submit_failure_keeps_state_and_modal() {
        let existing = ConnectionConfig::new("old", "localhost", 6379, "");
        let tester = StubTester::ok();
        let store = StubStore::failing("disk full");
        let (notifier, mut rx) = ChannelNotifier::new();
        let closed = Arc::new(AtomicUsize::new(0));
        let closed_count = closed.clone();

        let state = Arc::new(ConnectionsState::with_connections(vec![existing.clone()]));
        let workflow = ConnectionWorkflow::new(&tester, &store, notifier, state.clone())
            .with_close_callback(move || {
                closed_count.fetch_add(1, Ordering::SeqCst);
            });

        let outcome = workflow.submit_create(valid_form()).await;

        match outcome {
            SubmitOutcome::Failed { message } => assert!(message.contains("disk full")),
            other => panic!("expected Failed, got {other:?}"),
        }
        assert_eq!(state.snapshot(), vec![existing], "snapshot unchanged");
        assert_eq!(closed.load(Ordering::SeqCst), 0, "modal stays open");
        assert_eq!(workflow.save_status(), OperationStatus::Failed);

        let notification = rx.try_recv().unwrap();
        assert_eq!(notification.severity, Severity::Error);
        assert_eq!(notification.title, "Error saving connection");
        assert!(notification.description.contains("disk full"));
    }

    #[tokio::test]
    async fn test_non_numeric_port_skips_tester() {
        let tester = StubTester::ok();
        let store = StubStore::returning(vec![]);
        let (notifier, _rx) = ChannelNotifier::new();
        let workflow =
            ConnectionWorkflow::new(&tester, &store, notifier, Arc::new(ConnectionsState::new()));

        let form = ConnectionForm { port: "abc".to_string(), ..valid_form() };
        let outcome = workflow.test_connection(&form).await;

        match outcome {
            TestOutcome::Invalid { errors } => {
                assert_eq!(errors.get("port"), Some("Port must be a number"));
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
        assert_eq!(tester.calls(), 0);
        assert!(!workflow.test_status().is_loading());
    }

    #[tokio::test]
    async fn test_probe_failure_shows_generic_message() {
        let tester = StubTester::failing();
        let store = StubStore::returning(vec![]);
        let (notifier, mut rx) = ChannelNotifier::new();
        let workflow =
            ConnectionWorkflow::new(&tester, &store, notifier, Arc::new(ConnectionsState::new()));

        let outcome = workflow.test_connection(&valid_form()).await;

        assert!(matches!(outcome, TestOutcome::Unreachable));
        assert_eq!(tester.calls(), 1);

        let notification = rx.try_recv().unwrap();
        assert_eq!(notification.severity, Severity::Error);
        assert_eq!(notification.title, "Error on connection");
        // The upstream detail is suppressed in favor of the generic message.
        assert!(!notification.description.contains("refused by upstream"));
        assert_eq!(notification.description, GENERIC_TEST_FAILURE);
    }

    #[tokio::test]
    async fn test_probe_success_notifies() {
        let tester = StubTester::ok();
        let store = StubStore::returning(vec![]);
        let (notifier, mut rx) = ChannelNotifier::new();
        let workflow =
            ConnectionWorkflow::new(&tester, &store, notifier, Arc::new(ConnectionsState::new()));

        let outcome = workflow.test_connection(&valid_form()).await;

        assert!(matches!(outcome, TestOutcome::Reachable));
        assert_eq!(workflow.test_status(), OperationStatus::Succeeded);
        let notification = rx.try_recv().unwrap();
        assert_eq!(notification.title, "Connection successful");
    }

    #[tokio::test]
    async fn test_close_without_callback_is_noop() {
        let tester = StubTester::ok();
        let store = StubStore::returning(vec![]);
        let (notifier, _rx) = ChannelNotifier::new();
        let workflow =
            ConnectionWorkflow::new(&tester, &store, notifier, Arc::new(ConnectionsState::new()));

        // Must not panic and must not change any status.
        workflow.close();
        assert_eq!(workflow.save_status(), OperationStatus::Idle);
        assert_eq!(workflow.test_status(), OperationStatus::Idle);
    }

    #[tokio::test]
    async fn test_saved_scenario_end_to_end() {
        // {name:"local", host:"localhost", port:"6379", password:""} saved
        // against a store returning exactly that single record.
        let record = ConnectionConfig::new("local", "localhost", 6379, "");
        let tester = StubTester::ok();
        let store = StubStore::returning(vec![record.clone()]);
        let (notifier, mut rx) = ChannelNotifier::new();
        let closed = Arc::new(AtomicUsize::new(0));
        let closed_count = closed.clone();

        let state = Arc::new(ConnectionsState::new());
        let workflow = ConnectionWorkflow::new(&tester, &store, notifier, state.clone())
            .with_close_callback(move || {
                closed_count.fetch_add(1, Ordering::SeqCst);
            });

        workflow.submit_create(valid_form()).await;

        let snapshot = state.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].name, "local");
        assert_eq!(snapshot[0].port, 6379);
        assert_eq!(rx.try_recv().unwrap().title, "Connection saved");
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }
}
