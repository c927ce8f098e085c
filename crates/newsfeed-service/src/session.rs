//! Session overlay storage.
//!
//! [`SessionStore`] is the swap point: the service only needs `get`, `set`
//! and `delete` with expiry semantics. [`MemorySessionStore`] is the
//! process-local implementation; it is not shared across processes, so a
//! multi-instance deployment needs a shared implementation of the trait.

use std::{
  collections::HashMap,
  convert::Infallible,
  future::Future,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, TimeDelta, Utc};
use newsfeed_core::session::{SessionOverlay, SessionPreferences};

/// How long an overlay stays readable after it was written.
pub const DEFAULT_SESSION_TTL: TimeDelta = TimeDelta::minutes(60);

/// Source of the current time, injectable for tests.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Key-value storage for session overlays with time-to-live semantics.
pub trait SessionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Returns `None` if the session has no overlay or it has expired.
  fn get<'a>(
    &'a self,
    session_id: &'a str,
  ) -> impl Future<Output = Result<Option<SessionPreferences>, Self::Error>> + Send + 'a;

  /// Store `overlay`, replacing any previous one and restarting its TTL.
  fn set<'a>(
    &'a self,
    session_id: &'a str,
    overlay: SessionOverlay,
  ) -> impl Future<Output = Result<SessionPreferences, Self::Error>> + Send + 'a;

  /// Returns whether an overlay was removed.
  fn delete<'a>(
    &'a self,
    session_id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}

// ─── In-memory implementation ────────────────────────────────────────────────

/// Process-local overlay map. Expired entries are evicted lazily, on the
/// read that finds them.
pub struct MemorySessionStore {
  entries: Mutex<HashMap<String, SessionPreferences>>,
  ttl:     TimeDelta,
  clock:   Clock,
}

impl Default for MemorySessionStore {
  fn default() -> Self { Self::new(DEFAULT_SESSION_TTL) }
}

impl MemorySessionStore {
  pub fn new(ttl: TimeDelta) -> Self { Self::with_clock(ttl, Arc::new(Utc::now)) }

  pub fn with_clock(ttl: TimeDelta, clock: Clock) -> Self {
    Self {
      entries: Mutex::new(HashMap::new()),
      ttl,
      clock,
    }
  }

  /// Number of entries currently held, expired or not.
  pub fn len(&self) -> usize { self.entries().len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  fn entries(&self) -> MutexGuard<'_, HashMap<String, SessionPreferences>> {
    // A panic while holding the lock cannot leave a half-written entry.
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn is_expired(&self, entry: &SessionPreferences, now: DateTime<Utc>) -> bool {
    now - entry.timestamp > self.ttl
  }
}

impl SessionStore for MemorySessionStore {
  type Error = Infallible;

  async fn get(&self, session_id: &str) -> Result<Option<SessionPreferences>, Infallible> {
    let now = (self.clock)();
    let mut entries = self.entries();

    match entries.get(session_id) {
      Some(entry) if self.is_expired(entry, now) => {
        entries.remove(session_id);
        tracing::debug!(session_id, "evicted expired session overlay");
        Ok(None)
      }
      Some(entry) => Ok(Some(entry.clone())),
      None => Ok(None),
    }
  }

  async fn set(
    &self,
    session_id: &str,
    overlay: SessionOverlay,
  ) -> Result<SessionPreferences, Infallible> {
    let stored = SessionPreferences {
      overlay,
      timestamp: (self.clock)(),
    };
    self.entries().insert(session_id.to_owned(), stored.clone());
    Ok(stored)
  }

  async fn delete(&self, session_id: &str) -> Result<bool, Infallible> {
    Ok(self.entries().remove(session_id).is_some())
  }
}
