//! Fixed-interval status polling.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use silver_core::AthenaConfig;

use crate::client::AthenaError;
use crate::engine::QueryEngine;
use crate::status::{ExecutionInfo, QueryState};

/// How often to poll and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Pause between two status reads.
    pub interval: Duration,
    /// Give up after this long. `None` waits for a terminal state forever.
    pub max_wait: Option<Duration>,
}

impl PollPolicy {
    pub fn fixed(interval: Duration) -> Self {
        Self { interval, max_wait: None }
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    pub fn from_config(config: &AthenaConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            max_wait: config.max_wait(),
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(2))
    }
}

/// Poll `query_id` until it reaches SUCCEEDED, FAILED or CANCELLED and
/// return that terminal snapshot.
///
/// A non-success terminal state is returned as `Ok`; callers decide what a
/// failure means (see [`ensure_succeeded`]). When `max_wait` elapses first,
/// the execution is cancelled best-effort and [`AthenaError::QueryTimeout`]
/// is returned.
pub async fn wait_for_completion(
    engine: &dyn QueryEngine,
    query_id: &str,
    policy: &PollPolicy,
) -> Result<ExecutionInfo, AthenaError> {
    let start = Instant::now();

    loop {
        let info = engine.query_execution(query_id).await?;

        debug!(
            query_id = %query_id,
            state = %info.state(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Polling query status"
        );

        if info.state().is_terminal() {
            return Ok(info);
        }

        if let Some(max_wait) = policy.max_wait {
            if start.elapsed() >= max_wait {
                warn!(
                    query_id = %query_id,
                    max_wait_secs = max_wait.as_secs(),
                    "Query exceeded max wait, cancelling"
                );
                if let Err(e) = engine.cancel_query(query_id).await {
                    warn!(query_id = %query_id, error = %e, "Cancel request failed");
                }
                return Err(AthenaError::QueryTimeout {
                    query_id: query_id.to_string(),
                    waited_secs: start.elapsed().as_secs(),
                });
            }
        }

        tokio::time::sleep(policy.interval).await;
    }
}

/// Turn a terminal snapshot into an error unless it SUCCEEDED.
pub fn ensure_succeeded(info: ExecutionInfo) -> Result<ExecutionInfo, AthenaError> {
    match info.state() {
        QueryState::Succeeded => Ok(info),
        _ => Err(AthenaError::QueryFailed {
            query_id: info.query_id,
            status: info.status,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::engine::QueryRequest;
    use crate::status::QueryStatus;

    /// Engine that walks through a scripted list of states, repeating the last.
    struct ScriptedEngine {
        states: Mutex<VecDeque<QueryState>>,
        polls: AtomicUsize,
        cancels: AtomicUsize,
    }

    impl ScriptedEngine {
        fn new(states: &[QueryState]) -> Self {
            Self {
                states: Mutex::new(states.iter().copied().collect()),
                polls: AtomicUsize::new(0),
                cancels: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl QueryEngine for ScriptedEngine {
        async fn start_query(&self, _request: &QueryRequest) -> Result<String, AthenaError> {
            Ok("q-1".into())
        }

        async fn query_execution(&self, query_id: &str) -> Result<ExecutionInfo, AthenaError> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            let mut states = self.states.lock().unwrap();
            let state = if states.len() > 1 {
                states.pop_front().unwrap()
            } else {
                *states.front().unwrap()
            };
            Ok(ExecutionInfo {
                query_id: query_id.to_string(),
                status: QueryStatus::new(state),
                output_location: None,
                bytes_scanned: 0,
                execution_time_ms: 0,
            })
        }

        async fn cancel_query(&self, _query_id: &str) -> Result<(), AthenaError> {
            self.cancels.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn polls_at_fixed_interval_until_terminal() {
        let engine = ScriptedEngine::new(&[
            QueryState::Queued,
            QueryState::Running,
            QueryState::Running,
            QueryState::Succeeded,
        ]);
        let start = Instant::now();

        let info = wait_for_completion(&engine, "q-1", &PollPolicy::default())
            .await
            .unwrap();

        assert_eq!(info.state(), QueryState::Succeeded);
        assert_eq!(engine.polls.load(Ordering::SeqCst), 4);
        // Three pauses of two seconds each, no backoff.
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_and_cancelled_are_returned_as_terminal() {
        for state in [QueryState::Failed, QueryState::Cancelled] {
            let engine = ScriptedEngine::new(&[QueryState::Running, state]);
            let info = wait_for_completion(&engine, "q-1", &PollPolicy::default())
                .await
                .unwrap();
            assert_eq!(info.state(), state);
            assert_eq!(engine.cancels.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_state_keeps_polling() {
        let engine = ScriptedEngine::new(&[QueryState::Unknown, QueryState::Succeeded]);
        let info = wait_for_completion(&engine, "q-1", &PollPolicy::default())
            .await
            .unwrap();
        assert_eq!(info.state(), QueryState::Succeeded);
        assert_eq!(engine.polls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn max_wait_cancels_and_times_out() {
        let engine = ScriptedEngine::new(&[QueryState::Running]);
        let policy = PollPolicy::fixed(Duration::from_secs(2)).with_max_wait(Duration::from_secs(10));

        let err = wait_for_completion(&engine, "q-1", &policy).await.unwrap_err();

        match err {
            AthenaError::QueryTimeout { query_id, waited_secs } => {
                assert_eq!(query_id, "q-1");
                assert_eq!(waited_secs, 10);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        assert_eq!(engine.cancels.load(Ordering::SeqCst), 1);
        assert_eq!(engine.polls.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn ensure_succeeded_embeds_status() {
        let info = ExecutionInfo {
            query_id: "q-9".into(),
            status: QueryStatus {
                state_change_reason: Some("Query exhausted resources".into()),
                ..QueryStatus::new(QueryState::Failed)
            },
            output_location: None,
            bytes_scanned: 0,
            execution_time_ms: 0,
        };

        let err = ensure_succeeded(info).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("q-9"));
        assert!(msg.contains("Query exhausted resources"));
        assert!(msg.contains(r#""State":"FAILED""#));
    }

    #[test]
    fn policy_from_config() {
        let config = AthenaConfig {
            region: "us-east-1".into(),
            workgroup: None,
            output_location: "s3://bucket/prefix/".into(),
            poll_interval_ms: 500,
            max_wait_seconds: Some(30),
        };
        let policy = PollPolicy::from_config(&config);
        assert_eq!(policy.interval, Duration::from_millis(500));
        assert_eq!(policy.max_wait, Some(Duration::from_secs(30)));
        assert_eq!(PollPolicy::default().max_wait, None);
    }
}
