use anyhow::Result;
use std::io;
use std::io::IsTerminal;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, time::ChronoUtc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Filter directive for a verbosity level.
/// 0 = info, 1 = debug with noisy HTTP internals held at warn, 2+ = trace
fn filter_directive(verbose_level: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose_level {
        0 => "info",
        1 => "debug,hyper::proto::h1=warn,hyper::client::pool=warn,rustls=warn",
        _ => "trace",
    }
}

/// Rotation prefix for a log file name: "moviebot" from "moviebot.log"
fn rotation_prefix(file_name: &str) -> &str {
    file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .filter(|stem| !stem.is_empty())
        .unwrap_or(file_name)
}

pub fn init_logging(verbose_level: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = if quiet {
        EnvFilter::new(filter_directive(verbose_level, quiet))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directive(verbose_level, quiet)))
    };

    // Containers capture stdout without a TTY; emit JSON there unless told otherwise
    let json = std::env::var("RUST_LOG_JSON")
        .map(|v| v == "true")
        .unwrap_or_else(|_| !io::stdout().is_terminal());

    let registry = Registry::default().with(filter);

    let Some(log_path) = log_file else {
        if json {
            let json_layer = fmt::layer()
                .json()
                .with_timer(ChronoUtc::rfc_3339())
                .with_writer(io::stderr);
            registry.with(json_layer).init();
        } else {
            let fmt_layer = fmt::layer()
                .with_timer(ChronoUtc::rfc_3339())
                .with_writer(io::stderr);
            registry.with(fmt_layer).init();
        }
        return Ok(());
    };

    let log_dir = log_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Log file path has no parent directory"))?;
    std::fs::create_dir_all(log_dir)?;
    let log_filename = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid log filename"))?;

    // moviebot.log, moviebot.2026-01-17, ...
    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, rotation_prefix(log_filename));

    if json {
        let json_layer = fmt::layer()
            .json()
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(file_appender);
        registry.with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer()
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(false)
            .with_writer(file_appender);
        registry.with(fmt_layer).init();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive_levels() {
        assert_eq!(filter_directive(0, false), "info");
        assert!(filter_directive(1, false).starts_with("debug"));
        assert_eq!(filter_directive(3, false), "trace");
        assert_eq!(filter_directive(2, true), "error");
    }

    #[test]
    fn test_rotation_prefix() {
        assert_eq!(rotation_prefix("moviebot.log"), "moviebot");
        assert_eq!(rotation_prefix("bot.debug.log"), "bot.debug");
        assert_eq!(rotation_prefix("moviebot"), "moviebot");
        assert_eq!(rotation_prefix(".log"), ".log");
    }
}
