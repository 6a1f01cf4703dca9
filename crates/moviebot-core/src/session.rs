use moviebot_models::{MovieDetail, UserId};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Where a user is in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogState {
    #[default]
    Idle,
    /// A search or trending listing with selectable buttons is on screen
    ResultsShown,
    /// A detail card with watchlist actions is on screen
    DetailShown,
}

/// Per-user scratch state. Lives only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub state: DialogState,
    pub last_query: Option<String>,
    pub last_movie: Option<MovieDetail>,
}

/// In-memory session table, one entry per user, created lazily.
///
/// Each method holds the lock only for the duration of a single read or write,
/// so two events for the same user interleave as last-write-wins.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<UserId, SessionContext>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, SessionContext>> {
        // A panic while holding the lock cannot leave a half-written context behind
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn update<F>(&self, user_id: UserId, f: F)
    where
        F: FnOnce(&mut SessionContext),
    {
        let mut sessions = self.lock();
        f(sessions.entry(user_id).or_default());
    }

    pub fn record_last_movie(&self, user_id: UserId, detail: MovieDetail) {
        self.update(user_id, |ctx| ctx.last_movie = Some(detail));
    }

    pub fn get_last_movie(&self, user_id: UserId) -> Option<MovieDetail> {
        self.lock().get(&user_id).and_then(|ctx| ctx.last_movie.clone())
    }

    pub fn record_query(&self, user_id: UserId, query: &str) {
        self.update(user_id, |ctx| ctx.last_query = Some(query.to_string()));
    }

    pub fn last_query(&self, user_id: UserId) -> Option<String> {
        self.lock().get(&user_id).and_then(|ctx| ctx.last_query.clone())
    }

    pub fn state(&self, user_id: UserId) -> DialogState {
        self.lock().get(&user_id).map(|ctx| ctx.state).unwrap_or_default()
    }

    pub fn set_state(&self, user_id: UserId, state: DialogState) {
        self.update(user_id, |ctx| ctx.state = state);
    }

    /// Number of users with a session, reported when the bot shuts down
    pub fn active_users(&self) -> usize {
        self.lock().len()
    }
}
