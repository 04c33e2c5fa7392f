//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for turn results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Only the primary answer
    Text,
    /// Both channels plus processor outcomes
    Full,
    /// JSON output
    Json,
}

/// CLI arguments for dual-relay
#[derive(Parser, Debug)]
#[command(name = "dual-relay")]
#[command(author, version, about = "Send one chat turn to a primary and an auxiliary streaming endpoint")]
#[command(long_about = r#"
dual-relay submits a chat turn to a primary chat-message endpoint and,
when configured, a silent auxiliary query to a second endpoint. Both
answers stream concurrently; the auxiliary result is handed to result
processors (address recognition by default).

Configuration files are loaded from (in priority order):
1. RELAY_* environment variables   e.g. RELAY_PRIMARY__API_KEY
2. --config <path>                 Explicit config file
3. ./relay.toml                    Project-level config
4. ~/.config/dual-relay/config.toml   Global config

Example:
  dual-relay "Where is the West Lake museum?"
  dual-relay --aux-query "Extract the address" "Where should we meet?"
  dual-relay --batch "Hangzhou?" --batch "Shanghai?" --output json
"#)]
pub struct Cli {
    /// The message to send (not required with --batch or --show-config)
    pub query: Option<String>,

    /// Explicit auxiliary query (default: prefixed primary query)
    #[arg(long, value_name = "TEXT")]
    pub aux_query: Option<String>,

    /// Continue an existing upstream conversation
    #[arg(long, value_name = "ID")]
    pub conversation_id: Option<String>,

    /// App input variable (can be specified multiple times)
    #[arg(short, long, value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub input: Vec<(String, String)>,

    /// Attach a remote image by URL (can be specified multiple times)
    #[arg(long, value_name = "URL")]
    pub image_url: Vec<String>,

    /// Run auxiliary-only queries sequentially instead of a turn
    #[arg(long, value_name = "TEXT")]
    pub batch: Vec<String>,

    /// Do not issue the auxiliary channel even if configured
    #[arg(long)]
    pub no_auxiliary: bool,

    /// Override the idle timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Do not stream the primary answer and do not announce auxiliary
    /// results on stderr
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the auxiliary results recorded during this run
    #[arg(long)]
    pub history: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}
