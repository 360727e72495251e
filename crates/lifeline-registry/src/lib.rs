// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call session registry: exactly one [`CallRecord`] per `call_id`, with
//! updates serialized per call and independent across calls.
//!
//! Locking is striped by `call_id`: each session carries its own async
//! mutex, and the shared map is a `DashMap` touched only to look sessions
//! up or insert/remove them. No lock is ever held across an adapter call,
//! and one call's processing never blocks unrelated calls.
//!
//! Each session also owns the atomic sequence counter from which the
//! orchestrator draws per-call event sequence numbers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use lifeline_core::{CallRecord, LifelineError};

/// Per-call state: the record under its exclusive lock, plus the event
/// sequence counter.
struct CallSession {
    record: Mutex<CallRecord>,
    seq: AtomicU64,
}

impl CallSession {
    fn new(call_id: &str) -> Self {
        Self {
            record: Mutex::new(CallRecord::new(call_id)),
            seq: AtomicU64::new(0),
        }
    }
}

/// Tracks per-call state for the lifetime of the process.
///
/// Re-arrival of a webhook for an existing `call_id` mutates the existing
/// record; a duplicate is never created.
#[derive(Default)]
pub struct CallRegistry {
    sessions: DashMap<String, Arc<CallSession>>,
}

impl CallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn session(&self, call_id: &str) -> Option<Arc<CallSession>> {
        self.sessions.get(call_id).map(|s| Arc::clone(s.value()))
    }

    /// Returns the record for `call_id`, creating it in the `Started` state
    /// if absent. The second element is `true` when a record was created.
    pub async fn get_or_create(&self, call_id: &str) -> (CallRecord, bool) {
        let (session, created) = match self.sessions.entry(call_id.to_string()) {
            Entry::Occupied(entry) => (Arc::clone(entry.get()), false),
            Entry::Vacant(entry) => {
                let session = Arc::new(CallSession::new(call_id));
                entry.insert(Arc::clone(&session));
                debug!(call_sid = call_id, "call record created");
                (session, true)
            }
        };

        let record = session.record.lock().await.clone();
        (record, created)
    }

    /// Applies `mutator` to the record under its per-call exclusive lock,
    /// bumping `updated_at`, and returns a snapshot of the result.
    ///
    /// Fails with `NotFound` if no record exists, and with `Internal` if
    /// the mutation attempts a status transition the lifecycle forbids
    /// (the record is left unchanged in that case).
    pub async fn update<F>(
        &self,
        call_id: &str,
        mutator: F,
    ) -> Result<CallRecord, LifelineError>
    where
        F: FnOnce(&mut CallRecord),
    {
        match self.update_if(call_id, || true, mutator).await? {
            Some(record) => Ok(record),
            None => Err(LifelineError::Internal(format!(
                "unconditional update refused for call {call_id}"
            ))),
        }
    }

    /// Like [`update`], but re-evaluates `guard` after the record lock is
    /// acquired and applies the mutation only if it still holds, returning
    /// `Ok(None)` otherwise.
    ///
    /// The guard runs under the lock, so a caller racing to commit a stage
    /// result can verify it still owns the run at the moment the commit
    /// would land, not just before queueing for the lock.
    ///
    /// [`update`]: CallRegistry::update
    pub async fn update_if<G, F>(
        &self,
        call_id: &str,
        guard: G,
        mutator: F,
    ) -> Result<Option<CallRecord>, LifelineError>
    where
        G: FnOnce() -> bool,
        F: FnOnce(&mut CallRecord),
    {
        let session = self.session(call_id).ok_or_else(|| LifelineError::NotFound {
            call_id: call_id.to_string(),
        })?;

        let mut record = session.record.lock().await;
        if !guard() {
            return Ok(None);
        }

        let before = record.clone();

        mutator(&mut record);

        if record.status != before.status && !before.status.can_transition_to(record.status)
        {
            let attempted = record.status;
            *record = before;
            return Err(LifelineError::Internal(format!(
                "illegal status transition for call {call_id}: {} -> {attempted}",
                record.status
            )));
        }

        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }

    /// Returns a snapshot of the record, if present.
    pub async fn get(&self, call_id: &str) -> Option<CallRecord> {
        let session = self.session(call_id)?;
        let record = session.record.lock().await.clone();
        Some(record)
    }

    /// Removes the record for terminal cleanup. Returns whether it existed.
    pub fn remove(&self, call_id: &str) -> bool {
        self.sessions.remove(call_id).is_some()
    }

    /// Draws the next event sequence number for the call, starting at 1.
    ///
    /// The counter is atomic, so a failure event racing normal progress can
    /// never reuse or reorder a number.
    pub fn next_sequence(&self, call_id: &str) -> Result<u64, LifelineError> {
        let session = self.session(call_id).ok_or_else(|| LifelineError::NotFound {
            call_id: call_id.to_string(),
        })?;
        Ok(session.seq.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Removes terminal (`Completed`/`Failed`) records whose last update is
    /// older than `retention`. Records whose lock is currently held are in
    /// use and skipped until the next sweep. Returns the number removed.
    pub fn sweep_terminal(&self, retention: chrono::Duration) -> usize {
        let cutoff = Utc::now() - retention;
        let mut removed = 0;

        self.sessions.retain(|call_id, session| {
            match session.record.try_lock() {
                Ok(record) if record.status.is_terminal() && record.updated_at < cutoff => {
                    debug!(call_sid = call_id.as_str(), status = %record.status, "retention sweep removed call");
                    removed += 1;
                    false
                }
                _ => true,
            }
        });

        removed
    }

    /// Number of tracked calls.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifeline_core::CallStatus;
    use std::time::Duration;

    #[tokio::test]
    async fn update_on_unknown_call_fails_then_get_or_create_succeeds() {
        let registry = CallRegistry::new();

        let err = registry
            .update("call-42", |r| r.status = CallStatus::Recording)
            .await
            .unwrap_err();
        assert!(matches!(err, LifelineError::NotFound { ref call_id } if call_id == "call-42"));

        let (record, created) = registry.get_or_create("call-42").await;
        assert!(created);
        assert_eq!(record.status, CallStatus::Started);
    }

    #[tokio::test]
    async fn re_arrival_mutates_the_existing_record() {
        let registry = CallRegistry::new();

        let (_, created) = registry.get_or_create("c1").await;
        assert!(created);

        registry
            .update("c1", |r| {
                r.status = CallStatus::Recording;
                r.transcript = vec!["segment one".into()];
            })
            .await
            .unwrap();

        let (record, created) = registry.get_or_create("c1").await;
        assert!(!created);
        assert_eq!(record.status, CallStatus::Recording);
        assert_eq!(record.transcript, vec!["segment one"]);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn backward_status_transition_is_rejected_and_rolled_back() {
        let registry = CallRegistry::new();
        registry.get_or_create("c1").await;
        registry
            .update("c1", |r| r.status = CallStatus::Triaged)
            .await
            .unwrap();

        let err = registry
            .update("c1", |r| {
                r.status = CallStatus::Transcribed;
                r.error = Some("should not persist".into());
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LifelineError::Internal(_)));

        let record = registry.get("c1").await.unwrap();
        assert_eq!(record.status, CallStatus::Triaged);
        assert!(record.error.is_none());
    }

    #[tokio::test]
    async fn guarded_update_applies_only_when_the_guard_holds() {
        let registry = CallRegistry::new();
        registry.get_or_create("c1").await;

        let applied = registry
            .update_if(
                "c1",
                || true,
                |r| r.transcript = vec!["kept".into()],
            )
            .await
            .unwrap();
        assert!(applied.is_some());

        let refused = registry
            .update_if(
                "c1",
                || false,
                |r| r.transcript = vec!["discarded".into()],
            )
            .await
            .unwrap();
        assert!(refused.is_none());

        let record = registry.get("c1").await.unwrap();
        assert_eq!(record.transcript, vec!["kept"]);
    }

    #[tokio::test]
    async fn refused_guard_does_not_bump_updated_at() {
        let registry = CallRegistry::new();
        let (record, _) = registry.get_or_create("c1").await;
        let before = record.updated_at;

        tokio::time::sleep(Duration::from_millis(5)).await;
        registry
            .update_if("c1", || false, |r| r.status = CallStatus::Recording)
            .await
            .unwrap();

        let record = registry.get("c1").await.unwrap();
        assert_eq!(record.updated_at, before);
        assert_eq!(record.status, CallStatus::Started);
    }

    #[tokio::test]
    async fn updated_at_is_bumped_on_update() {
        let registry = CallRegistry::new();
        let (record, _) = registry.get_or_create("c1").await;
        let before = record.updated_at;

        tokio::time::sleep(Duration::from_millis(5)).await;
        let after = registry
            .update("c1", |r| r.status = CallStatus::Recording)
            .await
            .unwrap();
        assert!(after.updated_at > before);
    }

    #[tokio::test]
    async fn sequence_numbers_start_at_one_and_increase() {
        let registry = CallRegistry::new();
        registry.get_or_create("c1").await;
        registry.get_or_create("c2").await;

        assert_eq!(registry.next_sequence("c1").unwrap(), 1);
        assert_eq!(registry.next_sequence("c1").unwrap(), 2);
        // Counters are per call.
        assert_eq!(registry.next_sequence("c2").unwrap(), 1);
        assert_eq!(registry.next_sequence("c1").unwrap(), 3);

        assert!(matches!(
            registry.next_sequence("missing"),
            Err(LifelineError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn concurrent_updates_to_one_call_are_serialized() {
        let registry = Arc::new(CallRegistry::new());
        registry.get_or_create("c1").await;

        let mut handles = Vec::new();
        for i in 0..16 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry
                    .update("c1", |r| r.transcript.push(format!("segment {i}")))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let record = registry.get("c1").await.unwrap();
        assert_eq!(record.transcript.len(), 16);
    }

    #[tokio::test]
    async fn one_calls_lock_does_not_block_other_calls() {
        let registry = Arc::new(CallRegistry::new());
        registry.get_or_create("busy").await;
        registry.get_or_create("free").await;

        // Hold the "busy" session lock by keeping an update's mutator slow
        // via a task that owns the lock for a while.
        let blocker = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                registry
                    .update("busy", |r| {
                        r.status = CallStatus::Recording;
                        std::thread::sleep(Duration::from_millis(100));
                    })
                    .await
                    .unwrap();
            })
        };

        // An unrelated call's update completes well within the blocker window.
        let unrelated = tokio::time::timeout(
            Duration::from_millis(50),
            registry.update("free", |r| r.status = CallStatus::Recording),
        )
        .await;
        assert!(unrelated.is_ok(), "unrelated call must not be serialized");

        blocker.await.unwrap();
    }

    #[tokio::test]
    async fn sweep_removes_only_stale_terminal_records() {
        let registry = CallRegistry::new();
        registry.get_or_create("done").await;
        registry.get_or_create("active").await;

        registry
            .update("done", |r| r.status = CallStatus::Failed)
            .await
            .unwrap();
        registry
            .update("active", |r| r.status = CallStatus::Recording)
            .await
            .unwrap();

        // Nothing is old enough yet.
        assert_eq!(registry.sweep_terminal(chrono::Duration::seconds(60)), 0);

        // With a zero retention window, only the terminal record goes.
        assert_eq!(registry.sweep_terminal(chrono::Duration::zero()), 1);
        assert!(registry.get("done").await.is_none());
        assert!(registry.get("active").await.is_some());
    }

    #[tokio::test]
    async fn remove_clears_the_record() {
        let registry = CallRegistry::new();
        registry.get_or_create("c1").await;
        assert!(registry.remove("c1"));
        assert!(!registry.remove("c1"));
        assert!(registry.get("c1").await.is_none());
        assert!(registry.is_empty());
    }
}
