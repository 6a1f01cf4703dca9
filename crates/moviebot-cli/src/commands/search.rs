use crate::output::{Output, OutputFormat};
use color_eyre::Result;
use comfy_table::{Cell, Table};
use moviebot_sources::{MetadataSource, TmdbClient};
use serde_json::json;

pub async fn run_search(query: &str, output: &Output) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        output.warn("Search query is empty");
        return Ok(());
    }

    let (_, settings) = super::load_settings()?;
    let api_key = settings.require_tmdb_api_key()?.to_string();
    let client = TmdbClient::new(api_key, &settings.config.tmdb);

    let results = client
        .search_by_title(query)
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Search for '{}' failed: {}", query, e))?;

    match output.format() {
        OutputFormat::Human => {
            if output.is_quiet() {
                return Ok(());
            }
            if results.is_empty() {
                output.warn(format!("Nothing found for '{}'", query));
                return Ok(());
            }

            let mut table = Table::new();
            table.set_header(vec![
                Cell::new("ID").add_attribute(comfy_table::Attribute::Bold),
                Cell::new("Title").add_attribute(comfy_table::Attribute::Bold),
                Cell::new("Year").add_attribute(comfy_table::Attribute::Bold),
            ]);
            for movie in &results {
                table.add_row(vec![
                    Cell::new(movie.id),
                    Cell::new(&movie.title),
                    Cell::new(movie.release_year.as_deref().unwrap_or("-")),
                ]);
            }
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
            println!("{}", table);
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "query": query,
                "count": results.len(),
                "results": results,
            }));
        }
    }

    Ok(())
}
