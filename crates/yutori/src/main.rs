//! Command-line interface for the Yutori API.
//!
//! Reads the API key from `YUTORI_API_KEY` or `~/.yutori/config.json`.
//!
//! # Examples
//!
//! ```sh
//! # Store a key and check it
//! yutori auth set-key yt-...
//! yutori auth status
//!
//! # Usage statistics
//! yutori usage
//!
//! # Inspect and trim a saved n1 conversation
//! yutori n1 size history.json
//! yutori n1 trim history.json --max-bytes 5000000 --output trimmed.json
//!
//! # Run one agent step on a saved conversation
//! yutori n1 chat history.json --output history.json
//! ```

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::debug;
use yutori::auth::{CredentialStore, KeySource, auth_status};
use yutori::client::YutoriClient;
use yutori::config::{ClientConfig, DEFAULT_BASE_URL};
use yutori::n1::{
    DEFAULT_KEEP_RECENT_SCREENSHOTS, DEFAULT_MAX_REQUEST_BYTES, TrimConfig, estimate_size,
    locate_image_indices, trim_to_fit,
};
use yutori::{DEFAULT_N1_MODEL, Message, Result};

/// Yutori CLI: manage credentials, check usage, and work with n1 conversations.
#[derive(Parser)]
#[command(name = "yutori")]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the CLI version
    Version,
    /// Show API usage statistics
    Usage,
    /// Manage authentication
    #[command(subcommand)]
    Auth(AuthCommand),
    /// n1 conversation utilities
    #[command(subcommand)]
    N1(N1Command),
}

#[derive(Subcommand)]
enum AuthCommand {
    /// Show current authentication status
    Status,
    /// Remove stored credentials
    Logout,
    /// Store an API key in ~/.yutori/config.json
    SetKey {
        /// The API key (starts with "yt-")
        key: String,
    },
}

/// Payload limits shared by `n1 trim` and `n1 chat`.
#[derive(clap::Args)]
struct TrimArgs {
    /// Max payload size in bytes before trimming old screenshots
    #[arg(long, default_value_t = DEFAULT_MAX_REQUEST_BYTES)]
    max_bytes: usize,

    /// Number of recent screenshots to protect from trimming
    #[arg(long, default_value_t = DEFAULT_KEEP_RECENT_SCREENSHOTS)]
    keep_recent: usize,
}

impl TrimArgs {
    fn config(&self) -> TrimConfig {
        TrimConfig::new()
            .with_max_bytes(self.max_bytes)
            .with_keep_recent(self.keep_recent)
    }
}

#[derive(Subcommand)]
enum N1Command {
    /// Report the serialized size of a message history
    Size {
        /// JSON array of messages ("-" for stdin)
        file: PathBuf,
    },
    /// Drop old screenshots until the history fits the size limit
    Trim {
        /// JSON array of messages ("-" for stdin)
        file: PathBuf,

        #[command(flatten)]
        limits: TrimArgs,

        /// Write the trimmed history here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run one agent step: trim the history and ask n1 for the next action
    Chat {
        /// JSON array of messages ("-" for stdin)
        file: PathBuf,

        #[command(flatten)]
        limits: TrimArgs,

        /// n1 model
        #[arg(long, default_value = DEFAULT_N1_MODEL)]
        model: String,

        /// Sampling temperature
        #[arg(long, default_value_t = 0.3)]
        temperature: f32,

        /// API key (default: YUTORI_API_KEY or stored credentials)
        #[arg(long)]
        api_key: Option<String>,

        /// API base URL
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        base_url: String,

        /// Write the trimmed history plus the assistant turn here
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

// ── Helpers ────────────────────────────────────────────────────────

fn read_messages(path: &Path) -> Result<Vec<Message>> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&text)?)
}

fn write_messages(messages: &[Message], output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string(messages)?;
    match output {
        Some(path) => std::fs::write(path, json)?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

// ── Commands ───────────────────────────────────────────────────────

async fn usage() -> Result<ExitCode> {
    let client = YutoriClient::new(ClientConfig::default())?;
    let data = client.usage().await?;

    println!("\nUsage Statistics\n");
    if let Some(user_id) = data.get("user_id").and_then(|v| v.as_str()) {
        println!("  User ID: {user_id}");
    }
    if let Some(key_id) = data.get("api_key_id").and_then(|v| v.as_str()) {
        println!("  API Key ID: {key_id}");
    }

    let scouts = data
        .get("scouts")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    if scouts.is_empty() {
        println!("\n  No scouts yet.");
        return Ok(ExitCode::SUCCESS);
    }

    println!("\n  Scouts: {}\n", scouts.len());
    for scout in scouts.iter().take(10) {
        let field = |name: &str| scout.get(name).and_then(|v| v.as_str()).unwrap_or("");
        let runs = scout.get("run_count").and_then(|v| v.as_u64()).unwrap_or(0);
        println!(
            "  {:<11}  {:<40}  {:<10}  {runs}",
            truncate_chars(field("id"), 8),
            truncate_chars(field("query"), 37),
            field("status"),
        );
    }
    if scouts.len() > 10 {
        println!("  ... and {} more", scouts.len() - 10);
    }
    Ok(ExitCode::SUCCESS)
}

fn auth(command: &AuthCommand) -> Result<ExitCode> {
    let store = CredentialStore::default_location()?;
    match command {
        AuthCommand::Status => {
            let status = auth_status(&store);
            if !status.authenticated {
                println!("Not authenticated.");
                println!("Run `yutori auth set-key <KEY>` or set YUTORI_API_KEY.");
                return Ok(ExitCode::FAILURE);
            }
            println!("Authenticated");
            println!("  API Key: {}", status.masked_key.unwrap_or_default());
            match status.source {
                Some(KeySource::ConfigFile) => println!("  Source: {}", status.config_path),
                Some(KeySource::EnvVar) => {
                    println!("  Source: YUTORI_API_KEY environment variable")
                }
                None => {}
            }
        }
        AuthCommand::Logout => {
            if store.api_key().is_some() && store.clear()? {
                println!("Successfully logged out.");
            } else {
                println!("No credentials found.");
            }
        }
        AuthCommand::SetKey { key } => {
            if !yutori::auth::is_real_key(Some(key.as_str())) {
                eprintln!("Error: refusing to store an empty or placeholder key");
                return Ok(ExitCode::FAILURE);
            }
            store.save(key.trim())?;
            println!("API key saved to {}", store.path().display());
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn n1(command: N1Command) -> Result<ExitCode> {
    match command {
        N1Command::Size { file } => {
            let messages = read_messages(&file)?;
            let images = locate_image_indices(&messages);
            println!("messages:        {}", messages.len());
            println!("with screenshot: {}", images.len());
            println!("payload bytes:   {}", estimate_size(&messages));
        }
        N1Command::Trim {
            file,
            limits,
            output,
        } => {
            let mut messages = read_messages(&file)?;
            let outcome = trim_to_fit(&mut messages, &limits.config());
            eprintln!("  {outcome}");
            if !outcome.fits(limits.max_bytes) {
                eprintln!("  Warning: still over the {}-byte limit", limits.max_bytes);
            }
            write_messages(&messages, output.as_deref())?;
        }
        N1Command::Chat {
            file,
            limits,
            model,
            temperature,
            api_key,
            base_url,
            output,
        } => {
            let mut messages = read_messages(&file)?;
            let mut config = ClientConfig::new().with_base_url(&base_url);
            if let Some(key) = api_key {
                config = config.with_api_key(key);
            }
            let n1 = YutoriClient::new(config)?.n1()?.with_trim(limits.config());
            debug!("Loaded {} message(s) from {}", messages.len(), file.display());

            let completion = n1.step(&mut messages, &model, Some(temperature)).await?;

            if completion.tool_calls.is_empty() {
                println!("{}", completion.content.as_deref().unwrap_or_default());
            } else {
                let json = serde_json::to_string_pretty(&completion.tool_calls)?;
                println!("[tool_calls]\n{json}");
            }

            if let Some(path) = output {
                let mut history = messages;
                history.push(completion.to_message());
                write_messages(&history, Some(&path))?;
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Version => {
            println!("yutori {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
        Command::Usage => usage().await,
        Command::Auth(command) => auth(&command),
        Command::N1(command) => n1(command).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    yutori::logging::init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
