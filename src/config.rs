//! Configuration for Herald
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;

/// Herald - Telegram notification gateway for examination results
#[derive(Parser, Debug, Clone)]
#[command(name = "herald")]
#[command(about = "Notifies registered students when their examination result is published")]
pub struct Args {
    /// Telegram bot token from @BotFather
    #[arg(long, env = "BOT_TOKEN")]
    pub bot_token: Option<String>,

    /// Base URL of the Telegram Bot API (override for tests or a local proxy)
    #[arg(long, env = "TELEGRAM_API_URL", default_value = "https://api.telegram.org")]
    pub telegram_api_url: String,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "herald")]
    pub mongodb_db: String,

    /// Result watching strategy: "poll" enumerates the store on an interval,
    /// "feed" consumes the MongoDB change stream
    #[arg(long, env = "WATCH_MODE", value_enum, default_value = "poll")]
    pub watch_mode: WatchMode,

    /// Polling interval in seconds (poll mode)
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value = "2")]
    pub poll_interval_secs: u64,

    /// Path to a flat JSON snapshot file of results
    /// When set, results are read from this file instead of MongoDB (poll mode only)
    #[arg(long, env = "SNAPSHOT_FILE")]
    pub snapshot_file: Option<String>,

    /// Path to a flat JSON snapshot file of the student directory
    /// When set, directory lookups read from this file instead of MongoDB
    #[arg(long, env = "DIRECTORY_SNAPSHOT_FILE")]
    pub directory_snapshot_file: Option<String>,

    /// Long-poll timeout in seconds for Telegram getUpdates
    #[arg(long, env = "UPDATES_TIMEOUT_SECS", default_value = "30")]
    pub updates_timeout_secs: u64,

    /// Capacity of the change-feed channel (feed mode)
    #[arg(long, env = "FEED_CHANNEL_CAPACITY", default_value = "256")]
    pub feed_channel_capacity: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// How the watcher discovers newly published results
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchMode {
    /// Enumerate the full result set on a fixed interval
    Poll,
    /// Consume a push-based change feed from the result store
    Feed,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.bot_token.as_deref().map_or(true, |t| t.is_empty()) {
            return Err("BOT_TOKEN is required".to_string());
        }

        if self.poll_interval_secs == 0 {
            return Err("POLL_INTERVAL_SECS must be at least 1".to_string());
        }

        if self.watch_mode == WatchMode::Feed && self.snapshot_file.is_some() {
            return Err(
                "WATCH_MODE=feed requires MongoDB results (the snapshot store has no change feed)"
                    .to_string(),
            );
        }

        Ok(())
    }

    /// Get the bot token (call after validate)
    pub fn bot_token(&self) -> &str {
        self.bot_token.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args::parse_from(["herald", "--bot-token", "123:abc"])
    }

    #[test]
    fn test_valid_defaults() {
        let args = base_args();
        assert!(args.validate().is_ok());
        assert_eq!(args.poll_interval_secs, 2);
        assert_eq!(args.watch_mode, WatchMode::Poll);
    }

    #[test]
    fn test_missing_token_rejected() {
        let args = Args::parse_from(["herald"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut args = base_args();
        args.poll_interval_secs = 0;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_feed_with_snapshot_rejected() {
        let mut args = base_args();
        args.watch_mode = WatchMode::Feed;
        args.snapshot_file = Some("results.json".to_string());
        assert!(args.validate().is_err());
    }
}
