//! Command-line argument model.

use std::path::PathBuf;

use clap::Parser;
use clap_complete::Shell;

use profile_probe::{ClientConfig, Credentials, ProbeError, ProfileEndpoint};

#[derive(Parser, Debug)]
#[command(
    name = "profile-probe",
    about = "Fetch a profile with an existing session cookie and print its fields",
    version,
    override_usage = "profile-probe [OPTIONS] <SESSION_ID> [CSRF_TOKEN] <USERNAME>\n       profile-probe [OPTIONS] --interactive",
    after_help = "Without CSRF_TOKEN the token is discovered from the web root."
)]
pub struct Cli {
    /// SESSION_ID, optional CSRF_TOKEN, then USERNAME.
    #[arg(
        value_name = "ARGS",
        num_args = 2..=3,
        required_unless_present_any = ["interactive", "completions"],
        conflicts_with = "interactive"
    )]
    pub args: Vec<String>,

    /// Prompt for credentials and pick an action from a menu.
    #[arg(short, long)]
    pub interactive: bool,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Path to a JSON config file (default: ./profile-probe.json if present).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Profile endpoint: "api" (JSON web API) or "page" (HTML profile page).
    #[arg(long, value_parser = parse_endpoint)]
    pub endpoint: Option<ProfileEndpoint>,

    /// Per-request timeout in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Number of followers/following to list.
    #[arg(long)]
    pub limit: Option<u32>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub log_json: bool,

    /// Print a shell completion script and exit.
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

fn parse_endpoint(raw: &str) -> Result<ProfileEndpoint, String> {
    raw.parse::<ProfileEndpoint>().map_err(|e: ProbeError| e.to_string())
}

/// Who to look up, and with which session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub credentials: Credentials,
    pub username: String,
}

impl Cli {
    /// Split the positional arguments into credentials and username.
    pub fn target(&self) -> Option<Target> {
        let (session_id, csrf_token, username) = match self.args.as_slice() {
            [session_id, username] => (session_id, None, username),
            [session_id, csrf_token, username] => (session_id, Some(csrf_token.clone()), username),
            _ => return None,
        };
        Some(Target {
            credentials: Credentials::new(session_id.as_str(), csrf_token),
            username: username.trim().to_string(),
        })
    }

    /// Apply flag overrides on top of the file/default configuration.
    pub fn apply_overrides(&self, config: &mut ClientConfig) {
        if let Some(endpoint) = self.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.request_timeout_ms = timeout_ms;
        }
        if let Some(limit) = self.limit {
            config.connection_limit = limit;
        }
        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }
        if self.log_json {
            config.log.json = true;
        }
    }
}
