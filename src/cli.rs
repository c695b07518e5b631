//! Command-line interface for ollama-relay
//!
//! Provides argument parsing and subcommand handling for the relay binary.

use crate::session::StreamOverride;
use clap::{Parser, Subcommand};

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Local ollama-compatible endpoint backed by a hosted model service
#[derive(Parser)]
#[command(name = "ollama-relay")]
#[command(version)]
#[command(about = "Local ollama-compatible endpoint backed by a hosted model service")]
#[command(
    long_about = "ollama-relay answers the ollama HTTP API on localhost and forwards each \
    request to one hosted upstream service, translating payloads, replies and failures \
    so ollama clients keep working unchanged."
)]
pub struct Cli {
    /// Path to configuration file (defaults to ./config.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Streaming mode for every request: on, off, or ask (follow each request)
    #[arg(long, value_enum)]
    pub stream: Option<StreamOverride>,

    /// Trim long conversations to fit the limit instead of rejecting them
    #[arg(long, conflicts_with = "no_trim")]
    pub trim: bool,

    /// Reject long conversations instead of trimming them
    #[arg(long)]
    pub no_trim: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Trim toggle given on the command line, if any
    pub fn trim_flag(&self) -> Option<bool> {
        match (self.trim, self.no_trim) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# ollama-relay configuration
# ==========================
#
# Every value below is the built-in default. Delete what you don't change.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER
# ─────────────────────────────────────────────────────────────────────────────

[server]
# Address to bind. ollama clients expect 127.0.0.1:11434.
host = "127.0.0.1"
port = 11434

# ─────────────────────────────────────────────────────────────────────────────
# UPSTREAM SERVICE
# ─────────────────────────────────────────────────────────────────────────────

[upstream]
# Base URL; route paths such as /v2/chat/completions are appended to it
base_url = "https://pfuner.xyz"

# Deadline for one upstream call, in seconds (1-300). Never retried.
request_timeout_seconds = 60

# Idle pooled connections kept per upstream host
pool_max_idle_per_host = 10

# Open a pooled connection in the background at startup
prewarm = true

# ─────────────────────────────────────────────────────────────────────────────
# LENGTH LIMITS (characters)
# ─────────────────────────────────────────────────────────────────────────────

[limits]
# Whole conversation, gpt-4o / gpt-4.1 family
chat_max_chars = 8000
# Whole conversation, any other model name
legacy_chat_max_chars = 2000
# Last message, dall-e-3 and base64
image_max_chars = 1000
# Last message, tts
speech_max_chars = 500

# ─────────────────────────────────────────────────────────────────────────────
# STREAMING
# ─────────────────────────────────────────────────────────────────────────────

[streaming]
# Characters per streamed frame
chunk_chars = 10
# Pause between streamed frames, in milliseconds (0-1000)
frame_delay_ms = 10

# ─────────────────────────────────────────────────────────────────────────────
# SESSION TOGGLES
# ─────────────────────────────────────────────────────────────────────────────
#
# Leave a toggle commented out to be asked at startup (when run from a
# terminal). Command-line flags override both.

[session]
# "on": always stream, "off": never stream, "ask": follow each request
# stream = "ask"

# Trim long conversations instead of rejecting them
# trim = false

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error"
log_level = "info"

# Prometheus metrics are served at /metrics on the server port
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_leave_everything_unset() {
        let cli = Cli::parse_from(["ollama-relay"]);
        assert!(cli.config.is_none());
        assert!(cli.stream.is_none());
        assert_eq!(cli.trim_flag(), None);
        assert!(cli.command.is_none());
    }

    #[test]
    fn custom_config_path() {
        let cli = Cli::parse_from(["ollama-relay", "--config", "custom.toml"]);
        assert_eq!(cli.config.as_deref(), Some("custom.toml"));
    }

    #[test]
    fn stream_values() {
        let on = Cli::parse_from(["ollama-relay", "--stream", "on"]);
        assert_eq!(on.stream, Some(StreamOverride::AlwaysOn));
        let off = Cli::parse_from(["ollama-relay", "--stream", "off"]);
        assert_eq!(off.stream, Some(StreamOverride::AlwaysOff));
        let ask = Cli::parse_from(["ollama-relay", "--stream", "ask"]);
        assert_eq!(ask.stream, Some(StreamOverride::PerRequest));
        assert!(Cli::try_parse_from(["ollama-relay", "--stream", "maybe"]).is_err());
    }

    #[test]
    fn trim_flags() {
        assert_eq!(
            Cli::parse_from(["ollama-relay", "--trim"]).trim_flag(),
            Some(true)
        );
        assert_eq!(
            Cli::parse_from(["ollama-relay", "--no-trim"]).trim_flag(),
            Some(false)
        );
        assert!(Cli::try_parse_from(["ollama-relay", "--trim", "--no-trim"]).is_err());
    }

    #[test]
    fn config_subcommand_with_output() {
        let cli = Cli::parse_from(["ollama-relay", "config", "-o", "relay.toml"]);
        assert!(matches!(
            cli.command,
            Some(Command::Config { output: Some(ref path) }) if path == "relay.toml"
        ));
    }

    #[test]
    fn template_loads_as_default_config() {
        let config: Config = generate_config_template()
            .parse()
            .expect("template should be a valid config");
        assert_eq!(config.server.port, 11434);
        assert_eq!(config.upstream.base_url(), "https://pfuner.xyz");
        assert_eq!(config.limits.chat_max_chars, 8000);
        assert_eq!(config.streaming.chunk_chars, 10);
        assert!(config.session.stream.is_none());
        assert!(config.session.trim.is_none());
    }

    #[test]
    fn template_has_all_sections() {
        let template = generate_config_template();
        for section in [
            "[server]",
            "[upstream]",
            "[limits]",
            "[streaming]",
            "[session]",
            "[observability]",
        ] {
            assert!(template.contains(section), "missing {}", section);
        }
    }
}
