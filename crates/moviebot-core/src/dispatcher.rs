use moviebot_models::{MovieId, UserId};
use moviebot_sources::{MetadataSource, UpstreamError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::callback::CallbackAction;
use crate::event::{EventKind, InboundEvent};
use crate::format::{self, MenuButton};
use crate::reply::{Reply, ReplyMarkup};
use crate::session::{DialogState, SessionStore};
use crate::watchlist_store::{StorageError, WatchlistStore};


/// Title stored when an add arrives for a movie that is no longer cached
pub const PLACEHOLDER_TITLE: &str = "Movie";

#[derive(Debug, Error)]
enum DispatchError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

type DispatchResult = Result<Vec<Reply>, DispatchError>;

#[derive(Debug, Clone)]
pub struct DispatcherOptions {
    /// Region whose providers are listed first
    pub default_region: String,
    pub results_limit: usize,
}

impl Default for DispatcherOptions {
    fn default() -> Self {
        Self {
            default_region: format::FALLBACK_REGION.to_string(),
            results_limit: format::DEFAULT_RESULTS_LIMIT,
        }
    }
}

/// Routes inbound events to handlers and turns their results into replies.
///
/// Collaborators are injected so transitions can be exercised without a transport.
pub struct Dispatcher {
    metadata: Arc<dyn MetadataSource>,
    watchlist: Arc<dyn WatchlistStore>,
    sessions: Arc<SessionStore>,
    options: DispatcherOptions,
}

fn main_menu_reply(text: &str) -> Reply {
    Reply::text(text).with_markup(ReplyMarkup::MainMenu)
}

impl Dispatcher {
    pub fn new(
        metadata: Arc<dyn MetadataSource>,
        watchlist: Arc<dyn WatchlistStore>,
        sessions: Arc<SessionStore>,
        options: DispatcherOptions,
    ) -> Self {
        Self {
            metadata,
            watchlist,
            sessions,
            options,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handle one event. Never fails: upstream and storage errors become user-facing replies.
    pub async fn handle(&self, event: &InboundEvent) -> Vec<Reply> {
        let user_id = event.user_id;
        let result = match &event.kind {
            EventKind::Command { name, args } => self.handle_command(user_id, name, args).await,
            EventKind::Text(text) => self.handle_text(user_id, text).await,
            EventKind::Callback(action) => self.handle_callback(user_id, *action).await,
        };

        match result {
            Ok(replies) => replies,
            Err(DispatchError::Upstream(e)) => {
                warn!(
                    user_id = user_id,
                    source = self.metadata.source_name(),
                    error = %e,
                    timeout = e.is_timeout(),
                    "Metadata lookup failed"
                );
                vec![main_menu_reply(format::UPSTREAM_FAILURE_TEXT)]
            }
            Err(DispatchError::Storage(e)) => {
                error!(user_id = user_id, error = %e, "Watchlist storage failed");
                vec![main_menu_reply(format::STORAGE_FAILURE_TEXT)]
            }
        }
    }

    async fn handle_command(&self, user_id: UserId, name: &str, args: &str) -> DispatchResult {
        match name {
            "start" => {
                self.sessions.set_state(user_id, DialogState::Idle);
                Ok(vec![main_menu_reply(format::WELCOME_TEXT)])
            }
            "help" => Ok(self.show_help(user_id)),
            "trending" => self.show_trending(user_id).await,
            "watchlist" => self.show_watchlist(user_id),
            "search" if args.is_empty() => Ok(self.show_search_prompt(user_id)),
            "search" => self.search(user_id, args).await,
            _ => {
                debug!(user_id = user_id, command = name, "Ignoring unknown command");
                Ok(Vec::new())
            }
        }
    }

    async fn handle_text(&self, user_id: UserId, text: &str) -> DispatchResult {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        // Menu labels are commands, never search queries
        match MenuButton::from_label(text) {
            Some(MenuButton::Search) => Ok(self.show_search_prompt(user_id)),
            Some(MenuButton::Trending) => self.show_trending(user_id).await,
            Some(MenuButton::Watchlist) => self.show_watchlist(user_id),
            Some(MenuButton::Help) => Ok(self.show_help(user_id)),
            None => self.search(user_id, text).await,
        }
    }

    async fn handle_callback(&self, user_id: UserId, action: CallbackAction) -> DispatchResult {
        match action {
            CallbackAction::Select(movie_id) => self.show_detail(user_id, movie_id).await,
            CallbackAction::WatchAdd(movie_id) => self.add_to_watchlist(user_id, movie_id),
            CallbackAction::WatchRemove(movie_id) => self.remove_from_watchlist(user_id, movie_id),
            CallbackAction::Cancel => {
                self.sessions.set_state(user_id, DialogState::Idle);
                Ok(vec![main_menu_reply(format::CANCELLED_TEXT)])
            }
            CallbackAction::Menu => {
                self.sessions.set_state(user_id, DialogState::Idle);
                Ok(vec![main_menu_reply(format::MENU_TEXT)])
            }
            CallbackAction::Unknown => {
                debug!(user_id = user_id, "Ignoring unknown callback");
                Ok(Vec::new())
            }
        }
    }

    fn show_help(&self, user_id: UserId) -> Vec<Reply> {
        self.sessions.set_state(user_id, DialogState::Idle);
        vec![main_menu_reply(format::HELP_TEXT)]
    }

    fn show_search_prompt(&self, user_id: UserId) -> Vec<Reply> {
        self.sessions.set_state(user_id, DialogState::Idle);
        vec![main_menu_reply(format::SEARCH_PROMPT_TEXT)]
    }

    async fn search(&self, user_id: UserId, query: &str) -> DispatchResult {
        let results = self.metadata.search_by_title(query).await?;
        info!(
            operation = "search",
            user_id = user_id,
            results = results.len(),
            "Search completed"
        );
        self.sessions.record_query(user_id, query);

        if results.is_empty() {
            self.sessions.set_state(user_id, DialogState::Idle);
            return Ok(vec![main_menu_reply(format::NOTHING_FOUND_TEXT)]);
        }

        self.sessions.set_state(user_id, DialogState::ResultsShown);
        let keyboard = format::search_results_keyboard(&results, self.options.results_limit);
        Ok(vec![Reply::text(format::RESULTS_HEADER_TEXT).with_markup(keyboard)])
    }

    async fn show_trending(&self, user_id: UserId) -> DispatchResult {
        let results = self.metadata.fetch_trending().await?;
        info!(operation = "trending", user_id = user_id, results = results.len(), "Trending loaded");

        if results.is_empty() {
            self.sessions.set_state(user_id, DialogState::Idle);
            return Ok(vec![main_menu_reply(format::NO_TRENDING_TEXT)]);
        }

        let limit = self.options.results_limit;
        self.sessions.set_state(user_id, DialogState::ResultsShown);
        let keyboard = format::listing_keyboard(format::format_search_results(&results, limit));
        Ok(vec![Reply::text(format::format_trending(&results, limit)).with_markup(keyboard)])
    }

    fn show_watchlist(&self, user_id: UserId) -> DispatchResult {
        let entries = self.watchlist.list(user_id)?;
        self.sessions.set_state(user_id, DialogState::Idle);

        if entries.is_empty() {
            return Ok(vec![main_menu_reply(format::EMPTY_WATCHLIST_TEXT)]);
        }

        let (text, keyboard) = format::format_watchlist(&entries);
        Ok(vec![Reply::text(text).with_markup(keyboard)])
    }

    async fn show_detail(&self, user_id: UserId, movie_id: MovieId) -> DispatchResult {
        let detail = self.metadata.fetch_details(movie_id).await?;
        let availability = self.metadata.fetch_availability(movie_id).await?;

        let region = self.options.default_region.as_str();
        let availability_text = format::format_availability(&availability, region);
        let watch_link = format::resolve_region(&availability, region).and_then(|(_, r)| r.link.clone());
        let search_link = format::trailer_search_link(&detail.title, detail.release_year.as_deref());

        let card = format::format_detail_card(&detail, &availability_text);
        let controls = ReplyMarkup::Inline(format::build_action_controls(
            movie_id,
            watch_link.as_deref(),
            Some(search_link.as_str()),
        ));

        let reply = match detail.poster_path.as_deref() {
            Some(poster_path) => Reply::Photo {
                image_url: self.metadata.poster_url(poster_path),
                caption: format::truncate_chars(&card, format::PHOTO_CAPTION_LIMIT),
                markup: Some(controls),
            },
            None => Reply::text(card).with_markup(controls),
        };

        info!(operation = "detail", user_id = user_id, movie_id = movie_id, "Detail shown");
        self.sessions.record_last_movie(user_id, detail);
        self.sessions.set_state(user_id, DialogState::DetailShown);
        Ok(vec![reply])
    }

    fn add_to_watchlist(&self, user_id: UserId, movie_id: MovieId) -> DispatchResult {
        // Buttons may outlive the cached detail; fall back to a placeholder rather than refetching
        let (title, year) = match self.sessions.get_last_movie(user_id) {
            Some(detail) if detail.id == movie_id => (detail.title, detail.release_year.unwrap_or_default()),
            _ => {
                debug!(user_id = user_id, movie_id = movie_id, "No cached detail for watchlist add");
                (PLACEHOLDER_TITLE.to_string(), String::new())
            }
        };

        self.watchlist.add(user_id, movie_id, &title, &year)?;
        info!(operation = "watchlist_add", user_id = user_id, movie_id = movie_id, "Added to watchlist");
        Ok(vec![main_menu_reply(format::ADDED_TEXT)])
    }

    fn remove_from_watchlist(&self, user_id: UserId, movie_id: MovieId) -> DispatchResult {
        self.watchlist.remove(user_id, movie_id)?;
        info!(operation = "watchlist_remove", user_id = user_id, movie_id = movie_id, "Removed from watchlist");
        Ok(vec![main_menu_reply(format::REMOVED_TEXT)])
    }
}
