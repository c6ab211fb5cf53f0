//! Conversation State — the per-session phase machine the Intent Engine and
//! Regenerator read and write.
//!
//! ```text
//! initial ──(modify_canvas)──────► modifying ──(done)──► initial
//! initial ──(ask_clarification)──► awaiting_clarification ──(follow-up)──► modifying | initial
//! initial ──(provide_information)► informing ──(done)──► initial
//! any ──(off_topic)──────────────► initial (no state change except activity touch)
//! any ──(TTL expiry)─────────────► terminated (GC)
//! ```
//!
//! Sessions live in-memory only (persistent storage is out of scope); a
//! process restart terminates all sessions. Per §9's redesign note this is a
//! plain `Mutex<HashMap<String, Arc<Mutex<Entry>>>>`, the same shape as
//! [`crate::gateway::health::ProviderHealthStore`]: the outer lock is held
//! only long enough to find-or-insert the per-session entry, so concurrent
//! requests against different sessions never contend with each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::canvas::QACanvasDocument;
use crate::schema::intent::IntentClassification;
use crate::schema::requests::ClarificationQuestion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Initial,
    AwaitingClarification,
    Modifying,
    Informing,
    Terminated,
}

/// A pending clarification turn: the questions asked and what they targeted,
/// so a follow-up user message can be matched back to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingClarification {
    pub questions: Vec<ClarificationQuestion>,
    pub asked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub session_id: String,
    pub phase: SessionPhase,
    pub last_activity: DateTime<Utc>,
    #[serde(default)]
    pub last_classification: Option<IntentClassification>,
    #[serde(default)]
    pub pending_clarification: Option<PendingClarification>,
    #[serde(default)]
    pub last_canvas: Option<QACanvasDocument>,
}

impl ConversationSession {
    fn new(session_id: String) -> Self {
        Self {
            session_id,
            phase: SessionPhase::Initial,
            last_activity: Utc::now(),
            last_classification: None,
            pending_clarification: None,
            last_canvas: None,
        }
    }

    /// Apply the state machine's transition for a dispatched intent. `now`
    /// always gets a fresh activity timestamp, even for `off_topic` (which
    /// transitions back to `initial` without otherwise touching the session).
    pub fn transition(
        &mut self,
        intent: crate::schema::intent::Intent,
        classification: IntentClassification,
    ) {
        use crate::schema::intent::Intent;
        self.last_activity = Utc::now();
        self.last_classification = Some(classification);
        self.phase = match intent {
            Intent::ModifyCanvas => SessionPhase::Modifying,
            Intent::AskClarification => SessionPhase::AwaitingClarification,
            Intent::ProvideInformation => SessionPhase::Informing,
            Intent::OffTopic => SessionPhase::Initial,
            Intent::Fallback => self.phase,
        };
    }

    /// Return to `initial` once a modify/inform turn has been served.
    pub fn complete_turn(&mut self) {
        self.last_activity = Utc::now();
        if !matches!(self.phase, SessionPhase::Terminated) {
            self.phase = SessionPhase::Initial;
        }
    }

    pub fn set_pending_clarification(&mut self, pending: PendingClarification) {
        self.pending_clarification = Some(pending);
    }

    pub fn clear_pending_clarification(&mut self) {
        self.pending_clarification = None;
    }

    pub fn set_last_canvas(&mut self, canvas: QACanvasDocument) {
        self.last_canvas = Some(canvas);
    }
}

struct SessionEntry {
    session: ConversationSession,
    created_at: Instant,
    touched_at: Instant,
}

/// Owns one `Arc<Mutex<SessionEntry>>` per session id, behind an outer
/// `Mutex<HashMap<...>>` used only for find-or-insert/remove. Mirrors
/// [`crate::gateway::health::ProviderHealthStore`]'s per-entry locking shape.
pub struct ConversationStore {
    entries: Mutex<HashMap<String, Arc<Mutex<SessionEntry>>>>,
    ttl: Duration,
}

impl ConversationStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn shared(ttl: Duration) -> Arc<Self> {
        Arc::new(Self::new(ttl))
    }

    fn entry(&self, session_id: &str) -> Arc<Mutex<SessionEntry>> {
        let mut entries = self.entries.lock().expect("session store mutex poisoned");
        entries
            .entry(session_id.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(SessionEntry {
                    session: ConversationSession::new(session_id.to_string()),
                    created_at: Instant::now(),
                    touched_at: Instant::now(),
                }))
            })
            .clone()
    }

    /// Run `f` against the session's exclusive critical section, creating
    /// the session lazily if this is its first request. Returns whatever `f`
    /// returns.
    pub fn with_session<R>(&self, session_id: &str, f: impl FnOnce(&mut ConversationSession) -> R) -> R {
        let entry = self.entry(session_id);
        let mut guard = entry.lock().expect("session entry mutex poisoned");
        guard.touched_at = Instant::now();
        f(&mut guard.session)
    }

    /// A read-only copy of the session, or `None` if it has never been seen.
    pub fn get(&self, session_id: &str) -> Option<ConversationSession> {
        let entries = self.entries.lock().expect("session store mutex poisoned");
        entries
            .get(session_id)
            .map(|e| e.lock().expect("session entry mutex poisoned").session.clone())
    }

    pub fn active_count(&self) -> usize {
        self.entries.lock().expect("session store mutex poisoned").len()
    }

    /// Remove every session whose entry has been untouched for longer than
    /// the configured TTL. Intended to be called periodically by a sweeper
    /// task (see [`spawn_sweeper`]).
    pub fn sweep_expired(&self) -> usize {
        let mut entries = self.entries.lock().expect("session store mutex poisoned");
        let ttl = self.ttl;
        let before = entries.len();
        entries.retain(|_, entry| {
            let entry = entry.lock().expect("session entry mutex poisoned");
            entry.touched_at.elapsed() < ttl
        });
        before - entries.len()
    }
}

/// Spawn a periodic sweeper that evicts sessions past their TTL. Runs for
/// the lifetime of the returned `JoinHandle`'s owner; abort it on shutdown.
pub fn spawn_sweeper(store: Arc<ConversationStore>, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let evicted = store.sweep_expired();
            if evicted > 0 {
                tracing::debug!(evicted, "swept expired conversation sessions");
            }
        }
    })
}
