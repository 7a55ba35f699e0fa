//! Server-side record of started tests.
//!
//! A session remembers which questions were served and when the clock
//! started, so a submission can be checked against its own quiz and time
//! limit. Sessions live in memory only.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("Test {0} not found")]
    NotFound(Uuid),

    #[error("Test {0} has already been submitted")]
    AlreadySubmitted(Uuid),

    #[error("Test {0} is already being graded")]
    SubmissionInProgress(Uuid),

    #[error("Time limit for test {0} has expired")]
    Expired(Uuid),

    #[error("Question {question_id} is not part of test {test_id}")]
    ForeignQuestion { test_id: Uuid, question_id: u32 },

    #[error("Too many tests in progress ({0})")]
    AtCapacity(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Grading,
    Submitted,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    InProgress,
    Grading,
    Submitted,
}

#[derive(Debug, Clone)]
pub struct TestSession {
    pub id: Uuid,
    pub question_ids: HashSet<u32>,
    pub started_at: DateTime<Utc>,
    pub time_limit: Duration,
    phase: Phase,
}

impl TestSession {
    fn elapsed_secs(&self, now: DateTime<Utc>) -> u64 {
        (now - self.started_at).num_seconds().max(0) as u64
    }

    /// Seconds left on the clock; zero once the limit has passed.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u64 {
        self.time_limit
            .as_secs()
            .saturating_sub(self.elapsed_secs(now))
    }

    fn past_grace(&self, now: DateTime<Utc>, grace: Duration) -> bool {
        self.elapsed_secs(now) > self.time_limit.as_secs() + grace.as_secs()
    }

    pub fn status(&self, now: DateTime<Utc>, grace: Duration) -> SessionStatus {
        match self.phase {
            Phase::Submitted => SessionStatus::Submitted,
            Phase::Grading => SessionStatus::Grading,
            Phase::InProgress if self.past_grace(now, grace) => SessionStatus::Expired,
            Phase::InProgress => SessionStatus::InProgress,
        }
    }
}

/// Public view of a session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub test_id: Uuid,
    pub status: SessionStatus,
    pub remaining_seconds: u64,
    pub time_limit_seconds: u64,
    pub question_count: usize,
    pub started_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<Uuid, TestSession>>,
    grace: Duration,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(grace: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            grace,
            max_sessions,
        }
    }

    /// Open a session, purging stale ones first if the store is full.
    ///
    /// The cap is checked before inserting, so concurrent starts may
    /// overshoot it by the number of racing requests.
    pub fn start(
        &self,
        question_ids: impl IntoIterator<Item = u32>,
        time_limit: Duration,
        now: DateTime<Utc>,
    ) -> Result<Uuid, SessionError> {
        if self.sessions.len() >= self.max_sessions {
            self.purge_stale(now);
            if self.sessions.len() >= self.max_sessions {
                return Err(SessionError::AtCapacity(self.max_sessions));
            }
        }

        let session = TestSession {
            id: Uuid::new_v4(),
            question_ids: question_ids.into_iter().collect(),
            started_at: now,
            time_limit,
            phase: Phase::InProgress,
        };
        let id = session.id;
        self.sessions.insert(id, session);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn snapshot(&self, id: Uuid, now: DateTime<Utc>) -> Option<SessionSnapshot> {
        self.sessions.get(&id).map(|s| SessionSnapshot {
            test_id: s.id,
            status: s.status(now, self.grace),
            remaining_seconds: s.remaining_seconds(now),
            time_limit_seconds: s.time_limit.as_secs(),
            question_count: s.question_ids.len(),
            started_at: s.started_at,
        })
    }

    /// Move a session into grading after checking the answered ids belong
    /// to it. The returned claim puts the session back in progress when
    /// dropped without [`SubmissionClaim::complete`], so a failed grading
    /// can be retried.
    pub fn claim(
        &self,
        id: Uuid,
        answered: impl IntoIterator<Item = u32>,
        now: DateTime<Utc>,
    ) -> Result<SubmissionClaim, SessionError> {
        let mut session = self.sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;

        match session.status(now, self.grace) {
            SessionStatus::InProgress => {}
            SessionStatus::Grading => return Err(SessionError::SubmissionInProgress(id)),
            SessionStatus::Submitted => return Err(SessionError::AlreadySubmitted(id)),
            SessionStatus::Expired => return Err(SessionError::Expired(id)),
        }

        for question_id in answered {
            if !session.question_ids.contains(&question_id) {
                return Err(SessionError::ForeignQuestion {
                    test_id: id,
                    question_id,
                });
            }
        }

        session.phase = Phase::Grading;

        Ok(SubmissionClaim {
            store: self.clone(),
            id,
            served: session.question_ids.clone(),
            completed: false,
        })
    }

    fn set_phase(&self, id: Uuid, phase: Phase) {
        if let Some(mut session) = self.sessions.get_mut(&id) {
            session.phase = phase;
        }
    }

    /// Drop sessions whose clock and grace period have both run out.
    pub fn purge_stale(&self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.phase == Phase::Grading || !s.past_grace(now, self.grace));
        before.saturating_sub(self.sessions.len())
    }

    /// Periodically purge stale sessions for the lifetime of the process.
    pub fn spawn_sweeper(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let removed = store.purge_stale(Utc::now());
                if removed > 0 {
                    tracing::debug!(removed, remaining = store.len(), "Purged stale test sessions");
                }
            }
        })
    }
}

/// Exclusive right to grade one session.
pub struct SubmissionClaim {
    store: SessionStore,
    id: Uuid,
    served: HashSet<u32>,
    completed: bool,
}

impl SubmissionClaim {
    /// Question ids handed out when the test started.
    pub fn served_questions(&self) -> &HashSet<u32> {
        &self.served
    }

    pub fn complete(mut self) {
        self.store.set_phase(self.id, Phase::Submitted);
        self.completed = true;
    }
}

impl Drop for SubmissionClaim {
    fn drop(&mut self) {
        if !self.completed {
            self.store.set_phase(self.id, Phase::InProgress);
        }
    }
}
