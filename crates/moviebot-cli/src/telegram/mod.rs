pub mod api;
pub mod client;
pub mod poller;

pub use client::TelegramClient;
pub use poller::{Poller, PollerOptions};
