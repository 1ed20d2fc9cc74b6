pub mod repl;

use clap::{ Parser, Subcommand };
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the chat proxy that holds the upstream credential.
    Serve(ServeArgs),
    /// Chat with a running proxy from the terminal.
    Chat(ChatArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    // --- Upstream Args ---
    /// Credential for the upstream chat-completion API. Never sent to clients.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the upstream API (e.g., https://api.openai.com)
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let the client pick one
    pub chat_base_url: Option<String>,

    /// Model name for chat completion (e.g., gpt-3.5-turbo, gpt-4o)
    #[arg(long, env = "CHAT_MODEL")]
    pub chat_model: Option<String>,

    /// Seconds to wait for the upstream before giving up. Unset waits indefinitely.
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS")]
    pub upstream_timeout_secs: Option<u64>,

    /// Path to a text file holding the persona instruction. Defaults to the built-in persona.
    #[arg(long, env = "PERSONA_PATH")]
    pub persona_path: Option<String>,

    // --- Server Args ---
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:3000")]
    pub server_addr: String,

    /// Largest accepted request body, in bytes.
    #[arg(long, env = "MAX_BODY_BYTES", default_value = "65536")]
    pub max_body_bytes: usize,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

impl ServeArgs {
    pub fn upstream_timeout(&self) -> Option<Duration> {
        self.upstream_timeout_secs.filter(|s| *s > 0).map(Duration::from_secs)
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct ChatArgs {
    /// Chat proxy endpoint to talk to.
    #[arg(long, env = "CHAT_ENDPOINT", default_value = "http://127.0.0.1:3000/api/chat")]
    pub endpoint: String,

    /// Seconds to wait for a reply before showing a transport error. Unset waits indefinitely.
    #[arg(long, env = "REPLY_TIMEOUT_SECS")]
    pub reply_timeout_secs: Option<u64>,
}

impl ChatArgs {
    pub fn reply_timeout(&self) -> Option<Duration> {
        self.reply_timeout_secs.filter(|s| *s > 0).map(Duration::from_secs)
    }
}
