use crate::output::{Output, OutputFormat};
use color_eyre::Result;
use comfy_table::{Cell, Table};
use moviebot_config::{CredentialStore, PathManager};
use owo_colors::OwoColorize;
use serde_json::json;

pub async fn run_config(cmd: crate::ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        crate::ConfigCommands::Show { full } => show_config(full, output).await,
        crate::ConfigCommands::SetCredentials { bot_token, tmdb_api_key } => {
            set_credentials(bot_token, tmdb_api_key, output).await
        }
    }
}

async fn set_credentials(bot_token: Option<String>, tmdb_api_key: Option<String>, output: &Output) -> Result<()> {
    if bot_token.is_none() && tmdb_api_key.is_none() {
        output.warn("Nothing to store. Use --bot-token and/or --tmdb-api-key");
        return Ok(());
    }

    let path_manager = PathManager::default();
    let stored = store_credentials(&path_manager, bot_token, tmdb_api_key)?;
    output.success(format!(
        "Stored {} in {}",
        stored.join(" and "),
        path_manager.credentials_file().display()
    ));
    Ok(())
}

/// Merge the given secrets into `credentials.toml`, keeping any existing ones.
/// Returns the names of the values written.
fn store_credentials(
    path_manager: &PathManager,
    bot_token: Option<String>,
    tmdb_api_key: Option<String>,
) -> Result<Vec<&'static str>> {
    path_manager
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create config directories: {}", e))?;

    let mut creds = CredentialStore::new(path_manager.credentials_file());
    creds
        .load()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load credentials: {}", e))?;

    let mut stored = Vec::new();
    if let Some(token) = bot_token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
        creds.set_bot_token(token);
        stored.push("bot token");
    }
    if let Some(key) = tmdb_api_key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()) {
        creds.set_tmdb_api_key(key);
        stored.push("TMDB API key");
    }
    if stored.is_empty() {
        return Err(color_eyre::eyre::eyre!("Credentials must not be empty"));
    }

    creds
        .save()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save credentials: {}", e))?;
    Ok(stored)
}

async fn show_config(full: bool, output: &Output) -> Result<()> {
    let (paths, settings) = super::load_settings()?;
    let config_file = paths.config_file();
    let config = &settings.config;

    let secret = |value: &Option<String>| match value {
        Some(v) if full => v.clone(),
        Some(v) => mask_string(v),
        None => mask_string(""),
    };

    match output.format() {
        OutputFormat::Human => {
            if output.is_quiet() {
                return Ok(());
            }

            if !config_file.exists() {
                output.warn(format!(
                    "No config file at {}; showing defaults",
                    config_file.display()
                ));
            }

            println!("\n{}", "Configuration".bright_cyan().bold());
            println!();

            let mut info_table = Table::new();
            info_table.set_header(vec![
                Cell::new("Config File").add_attribute(comfy_table::Attribute::Bold),
                Cell::new(config_file.display().to_string()),
            ]);
            info_table.add_row(vec![
                Cell::new("Credentials File"),
                Cell::new(paths.credentials_file().display().to_string()),
            ]);
            info_table.add_row(vec![
                Cell::new("Database"),
                Cell::new(settings.db_path.display().to_string()),
            ]);
            info_table.load_preset(comfy_table::presets::UTF8_FULL);
            info_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
            println!("{}", info_table);
            println!();

            let mut tmdb_table = Table::new();
            tmdb_table.set_header(vec![
                Cell::new("TMDB").fg(comfy_table::Color::Cyan).add_attribute(comfy_table::Attribute::Bold),
            ]);
            tmdb_table.add_row(vec![Cell::new("API Key"), Cell::new(secret(&settings.tmdb_api_key))]);
            tmdb_table.add_row(vec![Cell::new("Base URL"), Cell::new(&config.tmdb.base_url)]);
            tmdb_table.add_row(vec![Cell::new("Image Base URL"), Cell::new(&config.tmdb.image_base_url)]);
            tmdb_table.add_row(vec![Cell::new("Language"), Cell::new(&config.tmdb.language)]);
            tmdb_table.add_row(vec![
                Cell::new("Timeout"),
                Cell::new(format!("{}s", config.tmdb.timeout_secs)),
            ]);
            tmdb_table.load_preset(comfy_table::presets::UTF8_FULL);
            tmdb_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
            println!("{}", tmdb_table);
            println!();

            let mut bot_table = Table::new();
            bot_table.set_header(vec![
                Cell::new("Bot").fg(comfy_table::Color::Cyan).add_attribute(comfy_table::Attribute::Bold),
            ]);
            bot_table.add_row(vec![Cell::new("Token"), Cell::new(secret(&settings.bot_token))]);
            bot_table.add_row(vec![Cell::new("Default Region"), Cell::new(&config.bot.default_region)]);
            bot_table.add_row(vec![Cell::new("Results Limit"), Cell::new(config.bot.results_limit)]);
            bot_table.add_row(vec![
                Cell::new("Poll Timeout"),
                Cell::new(format!("{}s", config.bot.poll_timeout_secs)),
            ]);
            bot_table.add_row(vec![
                Cell::new("Max Concurrent Updates"),
                Cell::new(config.bot.max_concurrent_updates),
            ]);
            bot_table.load_preset(comfy_table::presets::UTF8_FULL);
            bot_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
            println!("{}", bot_table);
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "config_file": config_file.display().to_string(),
                "credentials_file": paths.credentials_file().display().to_string(),
                "db_path": settings.db_path.display().to_string(),
                "tmdb": {
                    "api_key": secret(&settings.tmdb_api_key),
                    "base_url": config.tmdb.base_url,
                    "image_base_url": config.tmdb.image_base_url,
                    "language": config.tmdb.language,
                    "timeout_secs": config.tmdb.timeout_secs,
                },
                "bot": {
                    "token": secret(&settings.bot_token),
                    "default_region": config.bot.default_region,
                    "results_limit": config.bot.results_limit,
                    "poll_timeout_secs": config.bot.poll_timeout_secs,
                    "max_concurrent_updates": config.bot.max_concurrent_updates,
                },
            }));
        }
    }

    Ok(())
}

fn mask_string(s: &str) -> String {
    if s.is_empty() {
        return "<not set>".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_credentials_merges_with_existing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathManager::with_base(dir.path().join("moviebot"));

        let stored = store_credentials(&paths, Some("123:abc".to_string()), None).unwrap();
        assert_eq!(stored, vec!["bot token"]);

        let stored = store_credentials(&paths, None, Some(" tmdb-key ".to_string())).unwrap();
        assert_eq!(stored, vec!["TMDB API key"]);

        let mut creds = CredentialStore::new(paths.credentials_file());
        creds.load().unwrap();
        assert_eq!(creds.get_bot_token(), Some(&"123:abc".to_string()));
        assert_eq!(creds.get_tmdb_api_key(), Some(&"tmdb-key".to_string()));
        assert!(paths.data_dir().is_dir());
        assert!(paths.log_dir().is_dir());
    }

    #[test]
    fn test_store_credentials_rejects_blank_values() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathManager::with_base(dir.path().join("moviebot"));

        assert!(store_credentials(&paths, Some("  ".to_string()), None).is_err());
        assert!(!paths.credentials_file().exists());
    }

    #[test]
    fn test_mask_string() {
        assert_eq!(mask_string(""), "<not set>");
        assert_eq!(mask_string("abcd"), "****");
        assert_eq!(mask_string("123456:ABCDEF"), "12***EF");
    }
}
