pub mod callback;
pub mod dispatcher;
pub mod event;
pub mod format;
pub mod reply;
pub mod session;
pub mod watchlist_store;

pub use callback::{CallbackAction, MalformedCallback};
pub use dispatcher::{Dispatcher, DispatcherOptions};
pub use event::{EventKind, InboundEvent};
pub use reply::{Button, ButtonAction, Reply, ReplyMarkup};
pub use session::{DialogState, SessionContext, SessionStore};
pub use watchlist_store::{SqliteWatchlistStore, StorageError, WatchlistStore, WATCHLIST_LIMIT};
