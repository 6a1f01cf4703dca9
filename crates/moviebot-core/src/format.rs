//! Pure text and keyboard builders. Nothing here touches the network or storage.

use moviebot_models::{AvailabilityInfo, MovieDetail, MovieId, MovieSummary, RegionAvailability, WatchlistEntry};

use crate::callback::CallbackAction;
use crate::reply::{Button, ReplyMarkup};

/// Longest button label the chat client renders without clipping
pub const MAX_LABEL_CHARS: usize = 60;
/// Default number of result buttons
pub const DEFAULT_RESULTS_LIMIT: usize = 5;
/// Photo captions are capped at 1024 by the transport; keep a small margin
pub const PHOTO_CAPTION_LIMIT: usize = 1020;
/// Watchlist listings show this many entries as buttons
pub const WATCHLIST_DISPLAY_LIMIT: usize = 10;
/// Region tried when the preferred one has no data
pub const FALLBACK_REGION: &str = "US";

const PLACEHOLDER: &str = "—";

pub const NOT_AVAILABLE_TEXT: &str = "❌ Not available on official streaming platforms yet.";
pub const WELCOME_TEXT: &str = "🎬 Hello!\n\n\
    Send me a movie title and I'll find it.\n\
    Pick a result to see the poster, plot, rating and where to watch it.\n\n\
    You can also use the buttons below.";
pub const HELP_TEXT: &str = "ℹ️ Help:\n\
    1) Send a movie title (for example: Interstellar)\n\
    2) Pick one of the top 5 matches\n\
    3) The 'Where to watch' section lists official platforms\n\n\
    🔥 Trending — today's popular movies\n\
    ⭐ Watchlist — movies you saved";
pub const SEARCH_PROMPT_TEXT: &str = "Send a movie title (for example: Inception).";
pub const RESULTS_HEADER_TEXT: &str = "Here is what I found (pick one):";
pub const NOTHING_FOUND_TEXT: &str = "Nothing found. Try another title.";
pub const NO_TRENDING_TEXT: &str = "No trending movies right now.";
pub const EMPTY_WATCHLIST_TEXT: &str = "⭐ Your watchlist is empty. Open a movie and press ⭐ to save it.";
pub const ADDED_TEXT: &str = "⭐ Added to your watchlist!";
pub const REMOVED_TEXT: &str = "🗑 Removed from your watchlist.";
pub const CANCELLED_TEXT: &str = "Cancelled.";
pub const MENU_TEXT: &str = "Menu:";
pub const UPSTREAM_FAILURE_TEXT: &str = "⚠️ The movie database is not responding. Please try again in a moment.";
pub const STORAGE_FAILURE_TEXT: &str = "⚠️ Could not update your watchlist. Please try again.";

/// The four persistent main-menu buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuButton {
    Search,
    Trending,
    Watchlist,
    Help,
}

impl MenuButton {
    pub const LAYOUT: [[MenuButton; 2]; 2] = [
        [MenuButton::Search, MenuButton::Trending],
        [MenuButton::Watchlist, MenuButton::Help],
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuButton::Search => "🔎 Search",
            MenuButton::Trending => "🔥 Trending",
            MenuButton::Watchlist => "⭐ Watchlist",
            MenuButton::Help => "ℹ️ Help",
        }
    }

    /// Exact-match a message against the menu labels
    pub fn from_label(text: &str) -> Option<Self> {
        MenuButton::LAYOUT
            .iter()
            .flatten()
            .copied()
            .find(|button| button.label() == text)
    }
}

/// Character-safe truncation
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

fn title_with_year(title: &str, year: Option<&str>) -> String {
    match year.filter(|y| !y.is_empty()) {
        Some(year) => format!("{} ({})", title, year),
        None => title.to_string(),
    }
}

/// Button label and selector for each of the first `limit` results
pub fn format_search_results(summaries: &[MovieSummary], limit: usize) -> Vec<(String, CallbackAction)> {
    summaries
        .iter()
        .take(limit)
        .map(|s| {
            let label = title_with_year(&s.title, s.release_year.as_deref());
            (truncate_chars(&label, MAX_LABEL_CHARS), CallbackAction::Select(s.id))
        })
        .collect()
}

fn selection_rows(pairs: Vec<(String, CallbackAction)>) -> Vec<Vec<Button>> {
    pairs
        .into_iter()
        .map(|(label, action)| vec![Button::callback(label, action)])
        .collect()
}

/// One row per result plus a cancel row
pub fn search_results_keyboard(summaries: &[MovieSummary], limit: usize) -> ReplyMarkup {
    let mut rows = selection_rows(format_search_results(summaries, limit));
    rows.push(vec![Button::callback("❌ Cancel", CallbackAction::Cancel)]);
    ReplyMarkup::Inline(rows)
}

fn menu_row() -> Vec<Button> {
    vec![Button::callback("⬅️ Menu", CallbackAction::Menu)]
}

/// One row per listed item plus a menu row
pub fn listing_keyboard(pairs: Vec<(String, CallbackAction)>) -> ReplyMarkup {
    let mut rows = selection_rows(pairs);
    rows.push(menu_row());
    ReplyMarkup::Inline(rows)
}

pub fn format_trending(summaries: &[MovieSummary], limit: usize) -> String {
    let mut lines = vec!["🔥 Today's top movies:".to_string()];
    for s in summaries.iter().take(limit) {
        lines.push(format!("• {}", title_with_year(&s.title, s.release_year.as_deref())));
    }
    lines.join("\n")
}

/// Listing text and keyboard for the first entries of a watchlist
pub fn format_watchlist(entries: &[WatchlistEntry]) -> (String, ReplyMarkup) {
    let mut lines = vec!["⭐ Watchlist:".to_string()];
    let mut pairs = Vec::new();
    for entry in entries.iter().take(WATCHLIST_DISPLAY_LIMIT) {
        let label = entry.label();
        lines.push(format!("• {}", label));
        pairs.push((truncate_chars(&label, MAX_LABEL_CHARS), CallbackAction::Select(entry.movie_id)));
    }
    (lines.join("\n"), listing_keyboard(pairs))
}

/// The region whose providers are shown: preferred first, then the fixed fallback
pub fn resolve_region<'a>(
    info: &'a AvailabilityInfo,
    preferred_region: &'a str,
) -> Option<(&'a str, &'a RegionAvailability)> {
    info.region(preferred_region)
        .map(|region| (preferred_region, region))
        .or_else(|| info.region(FALLBACK_REGION).map(|region| (FALLBACK_REGION, region)))
}

pub fn format_availability(info: &AvailabilityInfo, preferred_region: &str) -> String {
    let Some((code, region)) = resolve_region(info, preferred_region) else {
        return NOT_AVAILABLE_TEXT.to_string();
    };
    if region.is_empty() {
        return NOT_AVAILABLE_TEXT.to_string();
    }

    let mut lines = vec![format!("🎬 Where to watch ({}):", code)];
    if !region.subscription.is_empty() {
        lines.push(format!("📺 Subscription: {}", region.subscription.join(", ")));
    }
    if !region.rent.is_empty() {
        lines.push(format!("💰 Rent: {}", region.rent.join(", ")));
    }
    if !region.buy.is_empty() {
        lines.push(format!("🛒 Buy: {}", region.buy.join(", ")));
    }
    lines.join("\n")
}

/// Full card text. The caller truncates when it goes out as a photo caption.
pub fn format_detail_card(detail: &MovieDetail, availability_text: &str) -> String {
    let rating = detail
        .rating
        .map(|r| format!("{:.1}", r))
        .unwrap_or_else(|| PLACEHOLDER.to_string());
    let genres = if detail.genres.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        detail.genres.join(", ")
    };

    format!(
        "🎬 {}\n\n⭐ Rating: {}\n🎭 Genres: {}\n\n📖 {}\n\n{}",
        title_with_year(&detail.title, detail.release_year.as_deref()),
        rating,
        genres,
        detail.overview,
        availability_text
    )
}

/// Trailer search URL for the "external search" button
pub fn trailer_search_link(title: &str, year: Option<&str>) -> String {
    let query = match year.filter(|y| !y.is_empty()) {
        Some(year) => format!("{} {} trailer", title, year),
        None => format!("{} trailer", title),
    };
    format!("https://www.youtube.com/results?search_query={}", urlencoding::encode(&query))
}

/// Link row (only when a link exists), watchlist row, menu row
pub fn build_action_controls(
    movie_id: MovieId,
    watch_link: Option<&str>,
    search_link: Option<&str>,
) -> Vec<Vec<Button>> {
    let mut rows = Vec::with_capacity(3);

    let mut links = Vec::new();
    if let Some(url) = watch_link {
        links.push(Button::url("▶️ Where to watch", url));
    }
    if let Some(url) = search_link {
        links.push(Button::url("🔍 Trailer", url));
    }
    if !links.is_empty() {
        rows.push(links);
    }

    rows.push(vec![
        Button::callback("⭐ Add to watchlist", CallbackAction::WatchAdd(movie_id)),
        Button::callback("🗑 Remove", CallbackAction::WatchRemove(movie_id)),
    ]);
    rows.push(menu_row());
    rows
}
