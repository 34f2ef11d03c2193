//! Session directory.
//!
//! Maps an opaque session key (one per physical table/browser) to its own
//! [`Game`]. The map is sharded so unrelated sessions never contend, and each
//! game sits behind its own mutex so two requests for the same key cannot
//! race on role assignment or a tally.
//!
//! Sessions idle for longer than the configured timeout are dropped by
//! [`SessionDirectory::sweep_expired`], which [`SessionDirectory::spawn_sweeper`]
//! runs periodically in the background.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use super::config::{GameSettings, SessionConfig};
use super::game::Game;

/// One table's game plus bookkeeping.
#[derive(Debug)]
pub struct Session {
    /// Opaque key supplied by the caller
    key: String,

    /// The game, one request at a time
    game: Mutex<Game>,

    /// When the session was created
    created_at: DateTime<Utc>,

    /// Last access, epoch milliseconds
    last_accessed_ms: AtomicI64,
}

impl Session {
    fn new(key: String, settings: GameSettings) -> Self {
        let now = Utc::now();
        Self {
            key,
            game: Mutex::new(Game::new(settings)),
            created_at: now,
            last_accessed_ms: AtomicI64::new(now.timestamp_millis()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_accessed(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.last_accessed_millis()).unwrap_or(self.created_at)
    }

    fn last_accessed_millis(&self) -> i64 {
        self.last_accessed_ms.load(Ordering::Acquire)
    }

    /// Record an access. Never moves the timestamp backwards.
    pub fn touch(&self) {
        self.last_accessed_ms
            .fetch_max(Utc::now().timestamp_millis(), Ordering::AcqRel);
    }

    /// Time since the last access.
    pub fn idle_time(&self) -> chrono::Duration {
        Utc::now() - self.last_accessed()
    }

    /// Lock the game for a sequence of operations.
    pub fn game(&self) -> MutexGuard<'_, Game> {
        self.game.lock()
    }

    /// Run `f` with exclusive access to the game.
    pub fn with_game<R>(&self, f: impl FnOnce(&mut Game) -> R) -> R {
        f(&mut *self.game.lock())
    }

    #[cfg(test)]
    fn backdate(&self, by: std::time::Duration) {
        self.last_accessed_ms
            .fetch_sub(by.as_millis() as i64, Ordering::AcqRel);
    }
}

/// All live sessions.
#[derive(Debug, Default)]
pub struct SessionDirectory {
    /// Sessions by key
    sessions: DashMap<String, Arc<Session>>,

    /// Template cloned into every new session
    default_settings: GameSettings,

    config: SessionConfig,
}

impl SessionDirectory {
    pub fn new(default_settings: GameSettings, config: SessionConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            default_settings,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn default_settings(&self) -> &GameSettings {
        &self.default_settings
    }

    /// Get the session for `key`, creating it on first use.
    ///
    /// Creation is atomic: concurrent callers with the same unseen key all
    /// receive the same session. Every call counts as an access.
    pub fn get_or_create(&self, key: &str) -> Arc<Session> {
        let entry = self.sessions.entry(key.to_string()).or_insert_with(|| {
            info!(session = %key, "Session created");
            Arc::new(Session::new(key.to_string(), self.default_settings.clone()))
        });

        // Touch while the shard is locked so a concurrent sweep sees it
        entry.touch();
        Arc::clone(entry.value())
    }

    /// Create a session under a freshly minted key.
    pub fn create(&self) -> Arc<Session> {
        self.get_or_create(&Uuid::new_v4().to_string())
    }

    /// Get an existing session, counting it as an access.
    pub fn get(&self, key: &str) -> Option<Arc<Session>> {
        self.sessions.get(key).map(|entry| {
            entry.touch();
            Arc::clone(entry.value())
        })
    }

    /// Remove a session. Returns whether it existed.
    pub fn remove(&self, key: &str) -> bool {
        let removed = self.sessions.remove(key).is_some();
        if removed {
            info!(session = %key, "Session removed");
        }
        removed
    }

    /// Count live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Keys of all live sessions.
    pub fn keys(&self) -> Vec<String> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Drop sessions idle for longer than the timeout.
    /// Returns the removed keys.
    pub fn sweep_expired(&self) -> Vec<String> {
        self.sweep_expired_at(Utc::now())
    }

    /// Sweep as if the current time were `now`.
    pub fn sweep_expired_at(&self, now: DateTime<Utc>) -> Vec<String> {
        let timeout_ms = i64::try_from(self.config.idle_timeout().as_millis()).unwrap_or(i64::MAX);
        let cutoff = now.timestamp_millis().saturating_sub(timeout_ms);
        let mut expired = Vec::new();

        // Timestamps are re-read under each shard's write lock, so a session
        // touched after the cutoff was computed is kept
        self.sessions.retain(|key, session| {
            if session.last_accessed_millis() < cutoff {
                expired.push(key.clone());
                false
            } else {
                true
            }
        });

        if expired.is_empty() {
            debug!(active = self.len(), "Session sweep found nothing to remove");
        } else {
            info!(
                expired = expired.len(),
                active = self.len(),
                "Swept idle sessions"
            );
        }

        expired
    }

    /// Start sweeping on the configured interval.
    ///
    /// The task only holds a weak reference, so it stops on its own once the
    /// directory is dropped. Must be called from within a tokio runtime.
    pub fn spawn_sweeper(self: &Arc<Self>) -> SweeperHandle {
        let directory: Weak<Self> = Arc::downgrade(self);
        let period = self.config.sweep_interval();

        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            loop {
                ticker.tick().await;
                let Some(directory) = directory.upgrade() else {
                    debug!("Session directory dropped, sweeper exiting");
                    break;
                };
                directory.sweep_expired();
            }
        });

        SweeperHandle { handle }
    }
}

/// Background sweep task. Aborted when dropped.
#[derive(Debug)]
pub struct SweeperHandle {
    handle: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn abort(self) {
        self.handle.abort();
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn make_directory() -> SessionDirectory {
        SessionDirectory::new(GameSettings::default(), SessionConfig::default())
    }

    #[test]
    fn test_get_or_create_reuses_session() {
        let directory = make_directory();

        let first = directory.get_or_create("table-1");
        let second = directory.get_or_create("table-1");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.key(), "table-1");
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn test_get_only_returns_existing() {
        let directory = make_directory();
        assert!(directory.get("missing").is_none());
        assert!(directory.is_empty());

        directory.get_or_create("table-1");
        assert!(directory.get("table-1").is_some());
    }

    #[test]
    fn test_create_mints_unique_keys() {
        let directory = make_directory();
        let a = directory.create();
        let b = directory.create();

        assert_ne!(a.key(), b.key());
        assert_eq!(directory.len(), 2);
        assert!(Uuid::parse_str(a.key()).is_ok());
    }

    #[test]
    fn test_sessions_are_isolated() {
        let directory = make_directory();
        let one = directory.get_or_create("one");
        let two = directory.get_or_create("two");

        one.with_game(|game| game.register_player("Alice")).unwrap();
        one.game().settings_mut().max_players = 4;

        assert_eq!(one.game().players().count(), 1);
        assert_eq!(two.game().players().count(), 0);
        assert_eq!(two.game().settings().max_players, 20);
        assert_eq!(directory.default_settings().max_players, 20);
    }

    #[test]
    fn test_remove() {
        let directory = make_directory();
        directory.get_or_create("table-1");

        assert!(directory.remove("table-1"));
        assert!(!directory.remove("table-1"));
        assert!(directory.get("table-1").is_none());
    }

    #[test]
    fn test_touch_moves_forward() {
        let directory = make_directory();
        let session = directory.get_or_create("table-1");
        session.backdate(Duration::from_secs(60));
        let before = session.last_accessed();

        directory.get("table-1");

        assert!(session.last_accessed() > before);
        assert!(session.idle_time() < chrono::Duration::seconds(60));
        assert!(session.created_at() >= before);
    }

    #[test]
    fn test_sweep_removes_only_idle_sessions() {
        let directory = make_directory();
        let stale = directory.get_or_create("stale");
        directory.get_or_create("fresh");

        stale.backdate(Duration::from_secs(5 * 60 * 60));

        let expired = directory.sweep_expired();
        assert_eq!(expired, vec!["stale".to_string()]);
        assert_eq!(directory.keys(), vec!["fresh".to_string()]);
    }

    #[test]
    fn test_sweep_keeps_session_touched_after_cutoff() {
        let directory = make_directory();
        let session = directory.get_or_create("table-1");
        session.backdate(Duration::from_secs(5 * 60 * 60));

        // Cutoff is computed from `now`, then the session is used again
        let now = Utc::now();
        directory.get("table-1");

        assert!(directory.sweep_expired_at(now).is_empty());
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn test_sweep_in_the_future_removes_everything() {
        let directory = make_directory();
        directory.get_or_create("a");
        directory.get_or_create("b");

        let later = Utc::now() + chrono::Duration::hours(5);
        let mut expired = directory.sweep_expired_at(later);
        expired.sort();

        assert_eq!(expired, vec!["a".to_string(), "b".to_string()]);
        assert!(directory.is_empty());
    }

    #[test]
    fn test_concurrent_get_or_create() {
        let directory = make_directory();

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let directory = &directory;
                scope.spawn(move || {
                    for i in 0..50 {
                        let shared = directory.get_or_create("shared");
                        shared
                            .with_game(|game| game.register_player(&format!("p{}-{}", worker, i)))
                            .ok();
                        directory.get_or_create(&format!("own-{}", worker));
                    }
                });
            }
        });

        // 8 private sessions plus the shared one
        assert_eq!(directory.len(), 9);
        // Capacity is enforced under the session lock
        let shared = directory.get("shared").unwrap();
        assert_eq!(shared.game().players().count(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_runs_on_interval() {
        let config = SessionConfig {
            idle_timeout_secs: 60,
            sweep_interval_secs: 10,
        };
        let directory = Arc::new(SessionDirectory::new(GameSettings::default(), config));
        directory
            .get_or_create("stale")
            .backdate(Duration::from_secs(120));
        directory.get_or_create("fresh");

        let sweeper = directory.spawn_sweeper();

        // Nothing happens before the first interval elapses
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(directory.len(), 2);

        tokio::time::sleep(Duration::from_secs(6)).await;
        tokio::task::yield_now().await;
        assert_eq!(directory.keys(), vec!["fresh".to_string()]);
        assert!(!sweeper.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_stops_when_directory_dropped() {
        let config = SessionConfig {
            idle_timeout_secs: 60,
            sweep_interval_secs: 10,
        };
        let directory = Arc::new(SessionDirectory::new(GameSettings::default(), config));
        let sweeper = directory.spawn_sweeper();

        drop(directory);
        tokio::time::sleep(Duration::from_secs(11)).await;
        tokio::task::yield_now().await;

        assert!(sweeper.is_finished());
    }
}
