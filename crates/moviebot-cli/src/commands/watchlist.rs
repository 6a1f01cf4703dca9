use crate::output::{Output, OutputFormat};
use color_eyre::eyre::Context;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use moviebot_core::{SqliteWatchlistStore, WatchlistStore};
use moviebot_models::UserId;
use serde_json::json;

pub async fn run_watchlist(user_id: UserId, output: &Output) -> Result<()> {
    let (_, settings) = super::load_settings()?;

    if !settings.db_path.exists() {
        output.warn(format!("No watchlist database at {}", settings.db_path.display()));
        return Ok(());
    }

    let store = SqliteWatchlistStore::open(&settings.db_path)
        .with_context(|| format!("Failed to open watchlist database at {}", settings.db_path.display()))?;
    let entries = store.list(user_id)?;
    let total = store.count(user_id)?;

    match output.format() {
        OutputFormat::Human => {
            if output.is_quiet() {
                return Ok(());
            }
            if entries.is_empty() {
                output.info(format!("Watchlist for user {} is empty", user_id));
                return Ok(());
            }

            let mut table = Table::new();
            table.set_header(vec![
                Cell::new("Movie ID").add_attribute(comfy_table::Attribute::Bold),
                Cell::new("Title").add_attribute(comfy_table::Attribute::Bold),
                Cell::new("Year").add_attribute(comfy_table::Attribute::Bold),
                Cell::new("Added").add_attribute(comfy_table::Attribute::Bold),
            ]);
            for entry in &entries {
                table.add_row(vec![
                    Cell::new(entry.movie_id),
                    Cell::new(&entry.title),
                    Cell::new(if entry.year.is_empty() { "-" } else { entry.year.as_str() }),
                    Cell::new(entry.added_at.format("%Y-%m-%d %H:%M UTC").to_string()),
                ]);
            }
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
            println!("{}", table);
            if total > entries.len() {
                output.info(format!("Showing the newest {} of {} entries", entries.len(), total));
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "user_id": user_id,
                "count": entries.len(),
                "total": total,
                "entries": entries,
            }));
        }
    }

    Ok(())
}
