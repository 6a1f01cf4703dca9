use clap::{ArgAction, Parser, Subcommand};
use commands::{config, run, search, watchlist};
use moviebot_config::PathManager;
use std::path::PathBuf;

mod commands;
mod logging;
mod output;
mod telegram;

#[derive(Parser)]
#[command(name = "moviebot")]
#[command(about = "Movie bot - search films, see where to stream them, keep a watchlist")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Write logs to a daily-rotated file instead of stderr.
    /// Without a value the file goes to the default log directory: --log-file or --log-file=PATH
    #[arg(long, global = true, value_name = "PATH", num_args = 0..=1, require_equals = true)]
    log_file: Option<Option<PathBuf>>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot (Telegram long polling)
    #[command(long_about = "Start the bot. Requires a TMDB API key and a Telegram bot token, from credentials.toml or the TMDB_API_KEY and BOT_TOKEN environment variables.")]
    Run,

    /// Search TMDB by title and print the results
    Search {
        /// Movie title to look up
        query: String,
    },

    /// Print a user's saved watchlist
    Watchlist {
        /// Telegram user id
        #[arg(long, value_name = "ID", allow_negative_numbers = true)]
        user: i64,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show effective configuration (masks secrets)
    #[command(long_about = "Display the effective configuration after environment overrides. Secrets are masked unless --full is given.")]
    Show {
        /// Show secrets unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },

    /// Store secrets in credentials.toml
    #[command(long_about = "Write the Telegram bot token and/or TMDB API key to credentials.toml. Values already stored are kept unless replaced. Environment variables still take precedence at runtime.")]
    SetCredentials {
        /// Telegram bot token from @BotFather
        #[arg(long)]
        bot_token: Option<String>,

        /// TMDB API key (v3)
        #[arg(long)]
        tmdb_api_key: Option<String>,
    },
}

/// `--log-file` without a value resolves to the default bot log file
fn resolve_log_file(arg: Option<Option<PathBuf>>) -> Option<PathBuf> {
    arg.map(|path| path.unwrap_or_else(|| PathManager::default().bot_log_file()))
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let log_file = resolve_log_file(cli.log_file);
    logging::init_logging(cli.verbose, cli.quiet, log_file.as_deref())
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Run => run::run_bot(&output).await,
        Commands::Search { query } => search::run_search(&query, &output).await,
        Commands::Watchlist { user } => watchlist::run_watchlist(user, &output).await,
        Commands::Config { cmd } => config::run_config(cmd, &output).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_log_file_flag_uses_default_path() {
        let cli = Cli::try_parse_from(["moviebot", "--log-file", "run"]).unwrap();
        assert!(matches!(cli.command, Commands::Run));
        assert_eq!(cli.log_file, Some(None));

        let resolved = resolve_log_file(cli.log_file).unwrap();
        assert_eq!(resolved, PathManager::default().bot_log_file());
    }

    #[test]
    fn test_log_file_with_explicit_path() {
        let cli = Cli::try_parse_from(["moviebot", "run", "--log-file=/tmp/bot/moviebot.log"]).unwrap();
        assert_eq!(
            resolve_log_file(cli.log_file),
            Some(PathBuf::from("/tmp/bot/moviebot.log"))
        );

        let cli = Cli::try_parse_from(["moviebot", "search", "Alien"]).unwrap();
        assert_eq!(resolve_log_file(cli.log_file), None);
    }

    #[test]
    fn test_set_credentials_arguments() {
        let cli = Cli::try_parse_from(["moviebot", "config", "set-credentials", "--tmdb-api-key", "abc"]).unwrap();
        match cli.command {
            Commands::Config {
                cmd: ConfigCommands::SetCredentials { bot_token, tmdb_api_key },
            } => {
                assert!(bot_token.is_none());
                assert_eq!(tmdb_api_key.as_deref(), Some("abc"));
            }
            _ => panic!("expected config set-credentials"),
        }
    }
}
